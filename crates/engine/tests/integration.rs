//! Cross-module behavior of the analysis engine

use bankr_engine::scenarios::Scenario;
use bankr_engine::{
    evaluate, need_matrix, resolve, simulate, AllocationGraph, ResolveOutcome, ResourceRequest,
    SafetyStepper, SystemState,
};
use proptest::prelude::*;

/// Snapshots with `max_need >= allocation` everywhere
fn state_strategy() -> impl Strategy<Value = SystemState> {
    (1usize..=5, 1usize..=4).prop_flat_map(|(processes, resources)| {
        (
            prop::collection::vec(0u32..6, resources),
            prop::collection::vec(
                prop::collection::vec((0u32..5, 0u32..4), resources),
                processes,
            ),
        )
            .prop_map(|(available, cells)| {
                let allocation = cells
                    .iter()
                    .map(|row| row.iter().map(|&(held, _)| held).collect())
                    .collect();
                let max_need = cells
                    .iter()
                    .map(|row| row.iter().map(|&(held, extra)| held + extra).collect())
                    .collect();
                SystemState {
                    available,
                    allocation,
                    max_need,
                }
            })
    })
}

fn column_totals(state: &SystemState) -> Vec<u64> {
    (0..state.num_resources())
        .map(|r| state.total_units(r))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    #[test]
    fn verdict_partitions_processes(state in state_strategy()) {
        let result = evaluate(&state).unwrap();
        let mut covered: Vec<usize> = result
            .safe_sequence
            .iter()
            .chain(&result.deadlocked_processes)
            .copied()
            .collect();
        covered.sort_unstable();
        prop_assert_eq!(covered, (0..state.num_processes()).collect::<Vec<_>>());
        prop_assert_eq!(result.is_deadlocked, !result.deadlocked_processes.is_empty());
    }

    #[test]
    fn evaluation_is_deterministic(state in state_strategy()) {
        prop_assert_eq!(evaluate(&state).unwrap(), evaluate(&state).unwrap());
    }

    #[test]
    fn stepper_matches_evaluate(state in state_strategy()) {
        let stepped = SafetyStepper::new(&state).unwrap().into_result();
        prop_assert_eq!(stepped, evaluate(&state).unwrap());
    }

    #[test]
    fn simulate_leaves_state_untouched(
        state in state_strategy(),
        process in 0usize..6,
        resource in 0usize..5,
        amount in 0u32..4,
    ) {
        let mut working = state.clone();
        let outcome = simulate(&mut working, &ResourceRequest::new(process, resource, amount)).unwrap();
        prop_assert_eq!(&working, &state);
        if let Some(trial) = outcome.trial() {
            prop_assert_eq!(outcome.granted(), trial.is_safe());
        }
    }

    #[test]
    fn resolve_conserves_units(state in state_strategy()) {
        let result = evaluate(&state).unwrap();
        match resolve(&state, &result, None).unwrap() {
            ResolveOutcome::NotApplicable => prop_assert!(result.is_safe()),
            ResolveOutcome::Resolved(resolution) => {
                prop_assert!(result.is_deadlocked_process(resolution.victim));
                prop_assert_eq!(column_totals(&resolution.state), column_totals(&state));
                prop_assert!(resolution.state.allocation[resolution.victim].iter().all(|&u| u == 0));
                prop_assert!(resolution.state.max_need[resolution.victim].iter().all(|&u| u == 0));
                prop_assert_eq!(&resolution.result, &evaluate(&resolution.state).unwrap());
            }
        }
    }

    #[test]
    fn need_is_max_minus_allocation(state in state_strategy()) {
        let need = need_matrix(&state).unwrap();
        for (p, row) in need.iter().enumerate() {
            for (r, &units) in row.iter().enumerate() {
                prop_assert_eq!(units + state.allocation[p][r], state.max_need[p][r]);
            }
        }
    }
}

#[test]
fn safe_scenario_end_to_end() {
    let state = Scenario::Safe.state();
    let result = evaluate(&state).unwrap();
    assert!(result.is_safe());
    assert_eq!(result.safe_sequence, vec![1, 3, 4, 0, 2]);

    let graph = AllocationGraph::build(&state).unwrap();
    assert_eq!(graph.node_count(), 8);
    assert!(matches!(
        resolve(&state, &result, None).unwrap(),
        ResolveOutcome::NotApplicable
    ));
}

#[test]
fn deadlock_scenario_end_to_end() {
    let state = Scenario::Deadlock.state();
    let result = evaluate(&state).unwrap();
    assert_eq!(result.deadlocked_processes, vec![0, 1, 2, 3]);
    assert!(result.safe_sequence.is_empty());
    assert!(AllocationGraph::build(&state).unwrap().has_cycle());

    let ResolveOutcome::Resolved(resolution) = resolve(&state, &result, None).unwrap() else {
        panic!("deadlocked scenario was not resolved");
    };
    assert_eq!(resolution.victim, 3);
    assert_eq!(resolution.state.available, vec![1, 0, 0]);
    // The victim's zeroed claim lets it finish first; the rest stay stuck.
    assert_eq!(resolution.result.safe_sequence, vec![3]);
    assert_eq!(resolution.result.deadlocked_processes, vec![0, 1, 2]);
}
