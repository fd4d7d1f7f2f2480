//! `proptest` strategies for braids.

use proptest::prelude::*;
use proptest::sample::Index;

use crate::braid::SimBraid;

/// Well-formed DAGs of 1..=`max_beads` beads with ids `1..=n`, every link
/// declared on both sides and pointing from a lower to a higher id.
pub fn arb_dag(max_beads: usize) -> impl Strategy<Value = SimBraid> {
    (1..=max_beads.max(1))
        .prop_flat_map(|n| {
            (
                prop::collection::vec(prop::collection::vec(any::<Index>(), 0..=3), n),
                prop::collection::vec(0.0f64..10.0, n),
            )
        })
        .prop_map(|(picks, works)| {
            let mut braid = SimBraid::default();
            for (i, (parents, work)) in picks.iter().zip(&works).enumerate() {
                let id = i as u64 + 1;
                braid.add_bead(id, *work);
                if i == 0 {
                    continue;
                }
                for pick in parents {
                    braid.link(pick.index(i) as u64 + 1, id);
                }
            }
            braid
        })
}

/// Arbitrary adjacency: ids drawn from twice the key range so lists name
/// missing beads, parent and child maps generated independently so they
/// disagree, and cycles and self references allowed.
pub fn arb_messy_braid(max_beads: usize) -> impl Strategy<Value = SimBraid> {
    let max_beads = max_beads.max(1);
    let id = 0..(max_beads as u64 * 2);
    (
        prop::collection::btree_map(
            id.clone(),
            prop::collection::vec(id.clone(), 0..4),
            0..=max_beads,
        ),
        prop::collection::btree_map(
            id.clone(),
            prop::collection::vec(id.clone(), 0..4),
            0..=max_beads,
        ),
        prop::collection::btree_map(id, 0.0f64..5.0, 0..=max_beads),
    )
        .prop_map(|(parents, children, work)| SimBraid {
            parents,
            children,
            work,
            cohorts: None,
        })
}
