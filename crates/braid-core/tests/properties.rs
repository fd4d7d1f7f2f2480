//! Property tests over generated adjacency, including dangling ids,
//! one-sided links and cyclic residue.

use std::collections::BTreeSet;

use proptest::prelude::*;

use braid_core::{
    BeadId, BraidGraph, LayoutMode, LayoutParams, PathStrategy, RawBraid, layout, partition,
    select_path, select_path_with,
};
use braid_sim::SimBraid;
use braid_sim::strategy::{arb_dag, arb_messy_braid};

fn graph_of(sim: &SimBraid) -> BraidGraph {
    let raw = RawBraid::from_json_value(&sim.to_json()).expect("generated payload");
    BraidGraph::from_raw(&raw)
}

fn arb_mode() -> impl Strategy<Value = LayoutMode> {
    prop_oneof![
        Just(LayoutMode::Columnar),
        Just(LayoutMode::Grid),
        Just(LayoutMode::ExternalRefined),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn partition_covers_every_bead_exactly_once(sim in arb_messy_braid(40)) {
        let graph = graph_of(&sim);
        let p = partition(&graph);

        let mut seen = BTreeSet::new();
        for cohort in p.to_ids(&graph) {
            prop_assert!(!cohort.is_empty());
            for id in cohort {
                prop_assert!(seen.insert(id.clone()), "{} repeated", id);
            }
        }
        let all: BTreeSet<BeadId> = graph.beads().map(|b| b.id.clone()).collect();
        prop_assert_eq!(seen, all);
        prop_assert!(p.len() <= graph.node_count());
    }

    #[test]
    fn non_fallback_cohorts_respect_parents(sim in arb_messy_braid(40)) {
        let graph = graph_of(&sim);
        let p = partition(&graph);
        for (level, members) in p.cohorts().iter().enumerate() {
            if p.is_fallback(level) {
                continue;
            }
            for &m in members {
                for &parent in graph.parents_of(m) {
                    let pc = p.cohort_of(parent).expect("parent assigned");
                    prop_assert!(pc < level, "parent cohort {} >= {}", pc, level);
                }
            }
        }
    }

    #[test]
    fn dags_never_need_fallback(sim in arb_dag(60)) {
        let graph = graph_of(&sim);
        let p = partition(&graph);
        prop_assert!(p.fallback_cohorts().is_empty());
    }

    #[test]
    fn pipeline_stages_are_deterministic(sim in arb_messy_braid(30)) {
        let a = graph_of(&sim);
        let b = graph_of(&sim);
        prop_assert_eq!(a.content_hash(), b.content_hash());
        let (pa, pb) = (partition(&a), partition(&b));
        prop_assert_eq!(&pa, &pb);
        prop_assert_eq!(
            select_path(&a, &a.work_map()),
            select_path(&b, &b.work_map())
        );
        let params = LayoutParams::default();
        prop_assert_eq!(layout(&a, &pa, &params), layout(&b, &pb, &params));
    }

    #[test]
    fn layout_is_total_finite_and_bounded(
        sim in arb_messy_braid(40),
        mode in arb_mode(),
        width in 1.0f64..2000.0,
        height in 1.0f64..2000.0,
        zoom in 0.0f64..3.0,
    ) {
        let graph = graph_of(&sim);
        let p = partition(&graph);
        let params = LayoutParams::new(width, height, zoom, mode);
        let positions = layout(&graph, &p, &params);

        prop_assert_eq!(positions.len(), graph.node_count());
        for (id, pos) in &positions {
            prop_assert!(pos.x.is_finite() && pos.y.is_finite(), "{} not finite", id);
            prop_assert!((0.0..=width).contains(&pos.x), "{} x={} of {}", id, pos.x, width);
            prop_assert!((0.0..=height).contains(&pos.y), "{} y={} of {}", id, pos.y, height);
        }
    }

    #[test]
    fn greedy_path_is_a_valid_walk(sim in arb_messy_braid(40)) {
        let graph = graph_of(&sim);
        let path = select_path(&graph, &graph.work_map());

        if graph.tips().is_empty() {
            prop_assert!(path.is_empty());
            return Ok(());
        }
        let tip = path.tip().expect("tips exist");
        prop_assert!(graph.get(tip).expect("tip in graph").is_tip());

        let unique: BTreeSet<&BeadId> = path.beads.iter().collect();
        prop_assert_eq!(unique.len(), path.len(), "no bead repeated");
        for (parent, child) in &path.edges {
            let child_idx = graph.node_index(child).expect("child in graph");
            let parent_idx = graph.node_index(parent).expect("parent in graph");
            prop_assert!(graph.parents_of(child_idx).contains(&parent_idx));
        }
    }

    #[test]
    fn cumulative_path_never_loses_to_greedy(sim in arb_dag(40)) {
        let graph = graph_of(&sim);
        let p = partition(&graph);
        let work = graph.work_map();
        let greedy = select_path_with(&graph, &work, PathStrategy::Greedy, &p);
        let cumulative = select_path_with(&graph, &work, PathStrategy::Cumulative, &p);
        prop_assert!(cumulative.total_work + 1e-9 >= greedy.total_work);
        let first = cumulative.beads.first().expect("dag has a root");
        prop_assert!(graph.get(first).expect("in graph").is_root());
    }
}
