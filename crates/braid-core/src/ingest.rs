//! Schema-validated ingestion of adjacency payloads.
//!
//! # Payload
//!
//! ```json
//! {
//!   "parents":  { "2": [1], "3": [1], "4": [2, 3] },
//!   "children": { "1": [2, 3], "2": [4], "3": [4] },
//!   "work":     { "4": 12.5 },
//!   "cohorts":  [[1], [2, 3], [4]]
//! }
//! ```
//!
//! `parents` and `children` are required and must be objects whose values
//! are arrays of ids (non-negative integers or strings). `work` and
//! `cohorts` are optional. This is the only place a
//! [`BraidError::MalformedInput`] can originate; everything downstream works
//! on the typed [`RawBraid`].
//!
//! Shape is checked strictly, content leniently: a `null` list is read as
//! empty and unusable work values (negative, non-finite) are clamped to 0,
//! because partial windows from the data source routinely contain both.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::BraidError;
use crate::id::BeadId;

/// Ordered id → id-list adjacency.
pub type AdjacencyMap = BTreeMap<BeadId, Vec<BeadId>>;

/// Per-bead work. Absent beads have work 0.
pub type WorkMap = BTreeMap<BeadId, f64>;

/// Typed adjacency as delivered by a data source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBraid {
    pub parents: AdjacencyMap,
    pub children: AdjacencyMap,
    pub work: WorkMap,
    /// Cohorts precomputed by the source, used only when consistent.
    pub cohorts: Option<Vec<Vec<BeadId>>>,
}

impl RawBraid {
    /// Parse and validate a JSON payload.
    ///
    /// # Errors
    ///
    /// [`BraidError::Json`] if `text` is not JSON, otherwise see
    /// [`RawBraid::from_json_value`].
    pub fn from_json_str(text: &str) -> Result<Self, BraidError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json_value(&value)
    }

    /// Validate an already-parsed JSON payload.
    ///
    /// # Errors
    ///
    /// [`BraidError::MalformedInput`] when the payload or one of its fields
    /// is not shaped as documented in the module docs.
    pub fn from_json_value(value: &Value) -> Result<Self, BraidError> {
        let Value::Object(root) = value else {
            return Err(BraidError::malformed(
                "$",
                format!("expected an object, found {}", kind_of(value)),
            ));
        };

        let parents = read_adjacency(root, "parents")?;
        let children = read_adjacency(root, "children")?;
        let work = match root.get("work") {
            None | Some(Value::Null) => WorkMap::new(),
            Some(v) => read_work(v)?,
        };
        let cohorts = match root.get("cohorts") {
            None | Some(Value::Null) => None,
            Some(v) => Some(read_cohorts(v)?),
        };

        Ok(Self {
            parents,
            children,
            work,
            cohorts,
        })
    }

    /// Serialize back into the payload format.
    #[must_use]
    pub fn to_json_value(&self) -> Value {
        let adjacency = |map: &AdjacencyMap| -> Value {
            Value::Object(
                map.iter()
                    .map(|(id, ids)| (id.to_string(), serde_json::json!(ids)))
                    .collect(),
            )
        };

        let mut root = Map::new();
        root.insert("parents".to_string(), adjacency(&self.parents));
        root.insert("children".to_string(), adjacency(&self.children));
        if !self.work.is_empty() {
            root.insert(
                "work".to_string(),
                Value::Object(
                    self.work
                        .iter()
                        .map(|(id, w)| (id.to_string(), serde_json::json!(w)))
                        .collect(),
                ),
            );
        }
        if let Some(cohorts) = &self.cohorts {
            root.insert("cohorts".to_string(), serde_json::json!(cohorts));
        }
        Value::Object(root)
    }

    /// `true` when neither adjacency map has any key.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty() && self.children.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Field readers
// ---------------------------------------------------------------------------

fn read_adjacency(root: &Map<String, Value>, field: &str) -> Result<AdjacencyMap, BraidError> {
    let value = root
        .get(field)
        .ok_or_else(|| BraidError::malformed(field, "missing required field"))?;
    let Value::Object(entries) = value else {
        return Err(BraidError::malformed(
            field,
            format!("expected an object keyed by id, found {}", kind_of(value)),
        ));
    };

    let mut map = AdjacencyMap::new();
    for (key, list) in entries {
        let path = format!("{field}.{key}");
        let ids = match list {
            Value::Null => Vec::new(),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| read_id(item, &format!("{path}[{i}]")))
                .collect::<Result<Vec<_>, _>>()?,
            other => {
                return Err(BraidError::malformed(
                    path,
                    format!("expected an array of ids, found {}", kind_of(other)),
                ));
            }
        };
        map.entry(BeadId::parse(key)).or_default().extend(ids);
    }
    Ok(map)
}

fn read_id(value: &Value, path: &str) -> Result<BeadId, BraidError> {
    match value {
        Value::String(s) => Ok(BeadId::parse(s)),
        Value::Number(n) => n.as_u64().map(BeadId::Num).ok_or_else(|| {
            BraidError::malformed(path, format!("id must be a non-negative integer, got {n}"))
        }),
        other => Err(BraidError::malformed(
            path,
            format!("expected an id, found {}", kind_of(other)),
        )),
    }
}

fn read_work(value: &Value) -> Result<WorkMap, BraidError> {
    let Value::Object(entries) = value else {
        return Err(BraidError::malformed(
            "work",
            format!("expected an object keyed by id, found {}", kind_of(value)),
        ));
    };

    let mut work = WorkMap::new();
    for (key, w) in entries {
        let amount = match w {
            Value::Null => 0.0,
            Value::Number(n) => sanitize_work(n.as_f64().unwrap_or(0.0)),
            other => {
                return Err(BraidError::malformed(
                    format!("work.{key}"),
                    format!("expected a number, found {}", kind_of(other)),
                ));
            }
        };
        work.insert(BeadId::parse(key), amount);
    }
    Ok(work)
}

fn read_cohorts(value: &Value) -> Result<Vec<Vec<BeadId>>, BraidError> {
    let Value::Array(layers) = value else {
        return Err(BraidError::malformed(
            "cohorts",
            format!("expected an array of arrays, found {}", kind_of(value)),
        ));
    };

    layers
        .iter()
        .enumerate()
        .map(|(i, layer)| {
            let path = format!("cohorts[{i}]");
            let Value::Array(items) = layer else {
                return Err(BraidError::malformed(
                    path,
                    format!("expected an array of ids, found {}", kind_of(layer)),
                ));
            };
            items
                .iter()
                .enumerate()
                .map(|(j, item)| read_id(item, &format!("{path}[{j}]")))
                .collect()
        })
        .collect()
}

/// Work is a non-negative finite weight; anything else counts as none.
#[must_use]
pub fn sanitize_work(w: f64) -> f64 {
    if w.is_finite() && w > 0.0 { w } else { 0.0 }
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde_json::json;

    fn field_of(err: &BraidError) -> &str {
        match err {
            BraidError::MalformedInput { field, .. } => field,
            other => panic!("expected MalformedInput, got {other:?}"),
        }
    }

    #[test]
    fn parses_numeric_and_string_ids() {
        let raw = RawBraid::from_json_value(&json!({
            "parents": { "1": [], "2": [1], "b": ["2"] },
            "children": { "1": ["2"], "2": ["b"] },
        }))
        .expect("valid payload");

        assert_eq!(raw.parents[&BeadId::from(2)], vec![BeadId::from(1)]);
        assert_eq!(raw.parents[&BeadId::from("b")], vec![BeadId::from(2)]);
        assert_eq!(raw.children[&BeadId::from(1)], vec![BeadId::from(2)]);
        assert!(raw.work.is_empty());
        assert!(raw.cohorts.is_none());
    }

    #[test]
    fn empty_maps_are_valid() {
        let raw = RawBraid::from_json_value(&json!({ "parents": {}, "children": {} }))
            .expect("empty is fine");
        assert!(raw.is_empty());
    }

    #[test]
    fn non_object_payload_is_malformed() {
        let err = RawBraid::from_json_value(&json!([1, 2, 3])).expect_err("array payload");
        assert_eq!(err.code(), ErrorCode::MalformedInput);
        assert_eq!(field_of(&err), "$");
    }

    #[test]
    fn missing_children_is_malformed() {
        let err = RawBraid::from_json_value(&json!({ "parents": {} })).expect_err("missing");
        assert_eq!(field_of(&err), "children");
    }

    #[test]
    fn adjacency_that_is_not_a_map_is_malformed() {
        let err = RawBraid::from_json_value(&json!({ "parents": [[1, 2]], "children": {} }))
            .expect_err("array instead of map");
        assert_eq!(field_of(&err), "parents");
    }

    #[test]
    fn list_value_that_is_not_an_array_is_malformed() {
        let err = RawBraid::from_json_value(&json!({ "parents": { "1": 5 }, "children": {} }))
            .expect_err("scalar list");
        assert_eq!(field_of(&err), "parents.1");
    }

    #[test]
    fn bad_list_element_reports_its_position() {
        let err = RawBraid::from_json_value(&json!({
            "parents": {},
            "children": { "1": [2, { "id": 3 }] },
        }))
        .expect_err("object element");
        assert_eq!(field_of(&err), "children.1[1]");

        let err = RawBraid::from_json_value(&json!({
            "parents": { "1": [-4] },
            "children": {},
        }))
        .expect_err("negative id");
        assert_eq!(field_of(&err), "parents.1[0]");
    }

    #[test]
    fn null_lists_read_as_empty() {
        let raw = RawBraid::from_json_value(&json!({
            "parents": { "1": null },
            "children": { "1": null },
        }))
        .expect("nulls tolerated");
        assert!(raw.parents[&BeadId::from(1)].is_empty());
    }

    #[test]
    fn work_is_clamped_and_optional_fields_parse() {
        let raw = RawBraid::from_json_value(&json!({
            "parents": { "1": [], "2": [1] },
            "children": { "1": [2] },
            "work": { "1": 3.5, "2": -1.0, "3": null },
            "cohorts": [[1], ["2"]],
        }))
        .expect("valid payload");

        assert!((raw.work[&BeadId::from(1)] - 3.5).abs() < f64::EPSILON);
        assert!(raw.work[&BeadId::from(2)].abs() < f64::EPSILON);
        assert!(raw.work[&BeadId::from(3)].abs() < f64::EPSILON);
        assert_eq!(
            raw.cohorts,
            Some(vec![vec![BeadId::from(1)], vec![BeadId::from(2)]])
        );
    }

    #[test]
    fn non_numeric_work_is_malformed() {
        let err = RawBraid::from_json_value(&json!({
            "parents": {},
            "children": {},
            "work": { "1": "lots" },
        }))
        .expect_err("string work");
        assert_eq!(field_of(&err), "work.1");
    }

    #[test]
    fn invalid_json_text_is_a_json_error() {
        let err = RawBraid::from_json_str("{ not json").expect_err("syntax error");
        assert_eq!(err.code(), ErrorCode::InvalidJson);
    }

    #[test]
    fn round_trips_through_payload_format() {
        let original = RawBraid::from_json_value(&json!({
            "parents": { "2": [1] },
            "children": { "1": [2] },
            "work": { "2": 4.0 },
            "cohorts": [[1], [2]],
        }))
        .expect("valid payload");

        let again = RawBraid::from_json_value(&original.to_json_value()).expect("re-parse");
        assert_eq!(original, again);
    }
}
