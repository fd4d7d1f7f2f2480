use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

/// A synthetic braid in the data-source wire shape.
///
/// Both sides of every link are recorded unless a generator deliberately
/// breaks that (see [`crate::window`]).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimBraid {
    pub parents: BTreeMap<u64, Vec<u64>>,
    pub children: BTreeMap<u64, Vec<u64>>,
    pub work: BTreeMap<u64, f64>,
    pub cohorts: Option<Vec<Vec<u64>>>,
}

impl SimBraid {
    /// Register a bead with no links.
    pub fn add_bead(&mut self, id: u64, work: f64) {
        self.parents.entry(id).or_default();
        self.children.entry(id).or_default();
        self.work.insert(id, work);
    }

    /// Record `parent → child` on both sides. Repeated links are ignored.
    pub fn link(&mut self, parent: u64, child: u64) {
        let parents = self.parents.entry(child).or_default();
        if parents.contains(&parent) {
            return;
        }
        parents.push(parent);
        self.children.entry(parent).or_default().push(child);
        self.parents.entry(parent).or_default();
        self.children.entry(child).or_default();
    }

    /// Every id that appears as a key on either side.
    #[must_use]
    pub fn ids(&self) -> BTreeSet<u64> {
        self.parents.keys().chain(self.children.keys()).copied().collect()
    }

    #[must_use]
    pub fn bead_count(&self) -> usize {
        self.ids().len()
    }

    /// Number of declared child-side links.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.children.values().map(Vec::len).sum()
    }

    /// Beads with no declared children.
    #[must_use]
    pub fn tips(&self) -> Vec<u64> {
        self.ids()
            .into_iter()
            .filter(|id| self.children.get(id).is_none_or(Vec::is_empty))
            .collect()
    }

    /// Beads with no declared parents.
    #[must_use]
    pub fn roots(&self) -> Vec<u64> {
        self.ids()
            .into_iter()
            .filter(|id| self.parents.get(id).is_none_or(Vec::is_empty))
            .collect()
    }

    /// Render as a fixture payload: `parents`, `children`, `work` and,
    /// when set, `cohorts`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut root = Map::new();
        root.insert("parents".into(), adjacency(&self.parents));
        root.insert("children".into(), adjacency(&self.children));
        root.insert(
            "work".into(),
            Value::Object(
                self.work
                    .iter()
                    .map(|(id, w)| (id.to_string(), Value::from(*w)))
                    .collect(),
            ),
        );
        if let Some(cohorts) = &self.cohorts {
            root.insert(
                "cohorts".into(),
                Value::Array(cohorts.iter().map(|c| Value::from(c.clone())).collect()),
            );
        }
        Value::Object(root)
    }

    /// Pretty-printed fixture JSON.
    #[must_use]
    pub fn to_json_pretty(&self) -> String {
        format!("{:#}", self.to_json())
    }
}

fn adjacency(map: &BTreeMap<u64, Vec<u64>>) -> Value {
    Value::Object(
        map.iter()
            .map(|(id, list)| (id.to_string(), Value::from(list.clone())))
            .collect(),
    )
}
