//! Truncated windows, the way a live source serves only recent beads.

use crate::braid::SimBraid;

/// Keep the `keep` highest-id beads.
///
/// Lists are left as they were, so beads at the old edge still name
/// parents that are no longer in the window: dangling references.
#[must_use]
pub fn window(braid: &SimBraid, keep: usize) -> SimBraid {
    let ids = braid.ids();
    let Some(&cutoff) = ids.iter().rev().take(keep).last() else {
        return SimBraid::default();
    };
    let retain = |id: &u64| *id >= cutoff;

    SimBraid {
        parents: braid
            .parents
            .iter()
            .filter(|(id, _)| retain(id))
            .map(|(id, list)| (*id, list.clone()))
            .collect(),
        children: braid
            .children
            .iter()
            .filter(|(id, _)| retain(id))
            .map(|(id, list)| (*id, list.clone()))
            .collect(),
        work: braid
            .work
            .iter()
            .filter(|(id, _)| retain(id))
            .map(|(id, w)| (*id, *w))
            .collect(),
        cohorts: None,
    }
}

/// Drop the child-side declaration of every `every`-th link, leaving it
/// declared by the child only.
#[must_use]
pub fn one_sided(braid: &SimBraid, every: usize) -> SimBraid {
    let mut out = braid.clone();
    if every == 0 {
        return out;
    }
    let mut n = 0usize;
    for list in out.children.values_mut() {
        list.retain(|_| {
            n += 1;
            n % every != 0
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::linear_chain;

    #[test]
    fn window_keeps_newest_and_leaves_dangling_parent() {
        let w = window(&linear_chain(10), 3);
        assert_eq!(w.ids().into_iter().collect::<Vec<_>>(), vec![8, 9, 10]);
        assert_eq!(w.parents[&8], vec![7], "7 is outside the window");
    }

    #[test]
    fn window_larger_than_braid_is_identity_minus_cohorts() {
        let b = linear_chain(4);
        assert_eq!(window(&b, 100), b);
        assert_eq!(window(&b, 0), SimBraid::default());
    }

    #[test]
    fn one_sided_drops_child_declarations() {
        let b = one_sided(&linear_chain(5), 2);
        assert_eq!(b.link_count(), 2);
        assert_eq!(b.parents[&5], vec![4], "parent side untouched");
    }
}
