//! Banker's safety algorithm

use bankr_errors::AnalysisError;
use bankr_types::{DetectionResult, SystemState};
use tracing::{debug, info, warn};

/// `need[p][r] = max_need[p][r] - allocation[p][r]`
pub type NeedMatrix = Vec<Vec<u32>>;

/// Compute the need matrix for `state`.
///
/// # Errors
///
/// Returns [`AnalysisError::NeedUnderflow`] for the first cell where the
/// allocation exceeds the declared maximum.
pub fn need_matrix(state: &SystemState) -> Result<NeedMatrix, AnalysisError> {
    state
        .allocation
        .iter()
        .zip(&state.max_need)
        .enumerate()
        .map(|(p, (held, max))| {
            held.iter()
                .zip(max)
                .enumerate()
                .map(|(r, (&allocation, &max_need))| {
                    max_need.checked_sub(allocation).ok_or_else(|| {
                        warn!(
                            process = p,
                            resource = r,
                            allocation,
                            max_need,
                            "allocation exceeds declared maximum"
                        );
                        AnalysisError::NeedUnderflow {
                            process: p,
                            resource: r,
                            allocation,
                            max_need,
                        }
                    })
                })
                .collect::<Result<Vec<u32>, _>>()
        })
        .collect()
}

/// True when every entry of `need` fits in `work`
#[must_use]
pub fn can_satisfy(need: &[u32], work: &[u64]) -> bool {
    need.iter()
        .zip(work)
        .all(|(&need, &work)| u64::from(need) <= work)
}

/// Initial work vector: a widened copy of `available`
pub(crate) fn work_vector(state: &SystemState) -> Vec<u64> {
    state.available.iter().map(|&units| u64::from(units)).collect()
}

/// Return a discharged process's allocation to the work vector
pub(crate) fn release(work: &mut [u64], allocation: &[u32]) {
    for (slot, &units) in work.iter_mut().zip(allocation) {
        *slot = slot.saturating_add(u64::from(units));
    }
}

/// Run the safety algorithm over `state`.
///
/// Full passes are made over the unfinished processes in ascending index
/// order; a process whose need fits the work vector is discharged on the
/// spot and the pass carries on from the next index. Passes repeat until one
/// discharges nothing. The result is a pure function of `state`.
///
/// # Errors
///
/// Returns [`AnalysisError::NeedUnderflow`] if any allocation exceeds its
/// declared maximum.
pub fn evaluate(state: &SystemState) -> Result<DetectionResult, AnalysisError> {
    let need = need_matrix(state)?;
    let num_processes = state.num_processes();

    let mut work = work_vector(state);
    let mut finish = vec![false; num_processes];
    let mut safe_sequence = Vec::with_capacity(num_processes);
    let mut passes = 0usize;

    loop {
        passes += 1;
        let mut progressed = false;
        for p in 0..num_processes {
            if finish[p] || !can_satisfy(&need[p], &work) {
                continue;
            }
            release(&mut work, &state.allocation[p]);
            finish[p] = true;
            safe_sequence.push(p);
            progressed = true;
            debug!(process = p, work = ?work, "process discharged");
        }
        if !progressed {
            break;
        }
    }

    let deadlocked = finish
        .iter()
        .enumerate()
        .filter_map(|(p, &done)| (!done).then_some(p))
        .collect();
    let result = DetectionResult::new(safe_sequence, deadlocked);

    info!(
        processes = num_processes,
        passes,
        deadlocked = ?result.deadlocked_processes,
        safe_sequence = ?result.safe_sequence,
        "safety evaluation complete"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::Scenario;

    #[test]
    fn test_need_matrix() {
        let state = Scenario::Safe.state();
        let need = need_matrix(&state).unwrap();
        assert_eq!(need[0], vec![7, 4, 3]);
        assert_eq!(need[1], vec![1, 2, 2]);
        assert_eq!(need[4], vec![4, 3, 1]);
    }

    #[test]
    fn test_need_underflow_is_reported() {
        let mut state = Scenario::Safe.state();
        state.max_need[2][1] = 0;
        state.allocation[2][1] = 1;
        let err = evaluate(&state).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::NeedUnderflow {
                process: 2,
                resource: 1,
                allocation: 1,
                max_need: 0,
            }
        );
    }

    #[test]
    fn test_can_satisfy() {
        assert!(can_satisfy(&[1, 2], &[1, 2]));
        assert!(!can_satisfy(&[1, 3], &[1, 2]));
        assert!(can_satisfy(&[], &[]));
    }

    #[test]
    fn test_release_saturates() {
        let mut work = vec![u64::MAX, 1];
        release(&mut work, &[5, 2]);
        assert_eq!(work, vec![u64::MAX, 3]);
    }

    #[test]
    fn test_safe_scenario_sequence() {
        let result = evaluate(&Scenario::Safe.state()).unwrap();
        assert!(!result.is_deadlocked);
        assert!(result.deadlocked_processes.is_empty());
        assert_eq!(result.safe_sequence, vec![1, 3, 4, 0, 2]);
    }

    #[test]
    fn test_deadlock_scenario() {
        let result = evaluate(&Scenario::Deadlock.state()).unwrap();
        assert!(result.is_deadlocked);
        assert_eq!(result.deadlocked_processes, vec![0, 1, 2, 3]);
        assert!(result.safe_sequence.is_empty());
    }

    #[test]
    fn test_partial_sequence() {
        // P0 can finish on its own; P1 and P2 wait on each other.
        let state = SystemState::new(
            vec![1, 0],
            vec![vec![0, 0], vec![1, 0], vec![0, 1]],
            vec![vec![1, 0], vec![1, 2], vec![3, 1]],
        )
        .unwrap();
        let result = evaluate(&state).unwrap();
        assert_eq!(result.safe_sequence, vec![0]);
        assert_eq!(result.deadlocked_processes, vec![1, 2]);
    }

    #[test]
    fn test_no_processes_is_safe() {
        let state = SystemState::zeroed(0, 2);
        let result = evaluate(&state).unwrap();
        assert!(result.is_safe());
        assert_eq!(result.num_processes(), 0);
    }
}
