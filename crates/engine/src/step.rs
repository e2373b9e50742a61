//! Resumable, one-discharge-at-a-time safety run

use bankr_errors::{AnalysisError, InputError};
use bankr_types::{DetectionResult, SystemState};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::safety::{can_satisfy, need_matrix, release, work_vector, NeedMatrix};

/// Snapshot of a suspended safety run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepState {
    pub work: Vec<u64>,
    pub finish: Vec<bool>,
    pub safe_sequence: Vec<usize>,
    /// Index the next scan starts from
    #[serde(default)]
    pub cursor: usize,
}

impl StepState {
    /// Starting point for `state`: work = available, nothing finished
    #[must_use]
    pub fn initial(state: &SystemState) -> Self {
        Self {
            work: work_vector(state),
            finish: vec![false; state.num_processes()],
            safe_sequence: Vec::new(),
            cursor: 0,
        }
    }

    fn check_against(&self, state: &SystemState) -> Result<(), InputError> {
        let mismatch = |message: String| InputError::StepStateMismatch { message };
        if self.work.len() != state.num_resources() {
            return Err(mismatch(format!(
                "work has {} entries, expected {}",
                self.work.len(),
                state.num_resources()
            )));
        }
        if self.finish.len() != state.num_processes() {
            return Err(mismatch(format!(
                "finish has {} entries, expected {}",
                self.finish.len(),
                state.num_processes()
            )));
        }
        if self.cursor > state.num_processes() {
            return Err(mismatch(format!("cursor {} out of range", self.cursor)));
        }

        // Replay the discharges to rebuild the finished set and work vector.
        let mut seen = vec![false; state.num_processes()];
        let mut expected_work = work_vector(state);
        for &p in &self.safe_sequence {
            if !self.finish.get(p).copied().unwrap_or(false) {
                return Err(mismatch(format!(
                    "process {p} is in the safe sequence but not finished"
                )));
            }
            if seen[p] {
                return Err(mismatch(format!(
                    "process {p} appears more than once in the safe sequence"
                )));
            }
            seen[p] = true;
            release(&mut expected_work, &state.allocation[p]);
        }
        if seen != self.finish {
            return Err(mismatch(
                "finished processes missing from the safe sequence".to_string(),
            ));
        }
        if expected_work != self.work {
            return Err(mismatch(format!(
                "work {:?} does not match available plus released allocations {expected_work:?}",
                self.work
            )));
        }
        Ok(())
    }

    fn unfinished(&self) -> Vec<usize> {
        self.finish
            .iter()
            .enumerate()
            .filter_map(|(p, &done)| (!done).then_some(p))
            .collect()
    }

    /// Verdict implied by this state, meaningful once the run is terminal
    #[must_use]
    pub fn to_result(&self) -> DetectionResult {
        DetectionResult::new(self.safe_sequence.clone(), self.unfinished())
    }
}

/// What a single step did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepStatus {
    /// `process` fit the work vector and released its allocation
    Found {
        process: usize,
        need: Vec<u32>,
        work_before: Vec<u64>,
        work_after: Vec<u64>,
    },
    /// Every process has been discharged
    Done,
    /// Nothing left fits; the remaining processes are deadlocked
    Deadlock { deadlocked: Vec<usize> },
}

impl StepStatus {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Found { .. })
    }
}

/// Result of [`step`]: what happened plus the state to resume from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    #[serde(flatten)]
    pub status: StepStatus,
    pub step_state: StepState,
}

/// Advance `run` by at most one discharge.
///
/// The scan starts at `run.cursor` and wraps around, which visits processes
/// in the same order as the full-pass loop in [`crate::evaluate`].
fn advance(need: &NeedMatrix, allocation: &[Vec<u32>], run: &mut StepState) -> StepStatus {
    let num_processes = run.finish.len();
    let candidate = (run.cursor..num_processes)
        .chain(0..run.cursor)
        .find(|&p| !run.finish[p] && can_satisfy(&need[p], &run.work));

    match candidate {
        Some(p) => {
            let work_before = run.work.clone();
            release(&mut run.work, &allocation[p]);
            run.finish[p] = true;
            run.safe_sequence.push(p);
            run.cursor = p + 1;
            debug!(process = p, work = ?run.work, "step discharged process");
            StepStatus::Found {
                process: p,
                need: need[p].clone(),
                work_before,
                work_after: run.work.clone(),
            }
        }
        None => {
            let deadlocked = run.unfinished();
            if deadlocked.is_empty() {
                StepStatus::Done
            } else {
                StepStatus::Deadlock { deadlocked }
            }
        }
    }
}

/// Execute one iteration of the safety loop, resuming from `previous` or
/// starting fresh when it is `None`.
///
/// # Errors
///
/// Returns an input error when `previous` does not fit the dimensions of
/// `state`, and an analysis error when `state` has a negative need.
pub fn step(state: &SystemState, previous: Option<StepState>) -> bankr_errors::Result<StepReport> {
    let need = need_matrix(state)?;
    let mut run = match previous {
        Some(run) => {
            run.check_against(state)?;
            run
        }
        None => StepState::initial(state),
    };
    let status = advance(&need, &state.allocation, &mut run);
    Ok(StepReport {
        status,
        step_state: run,
    })
}

/// Iterator over the steps of one safety run.
///
/// Yields every [`StepStatus::Found`] in order, then exactly one terminal
/// status, then `None`.
#[derive(Debug)]
pub struct SafetyStepper<'a> {
    state: &'a SystemState,
    need: NeedMatrix,
    run: StepState,
    finished: bool,
}

impl<'a> SafetyStepper<'a> {
    /// # Errors
    ///
    /// Returns [`AnalysisError::NeedUnderflow`] if `state` has a negative need.
    pub fn new(state: &'a SystemState) -> Result<Self, AnalysisError> {
        Ok(Self {
            need: need_matrix(state)?,
            run: StepState::initial(state),
            state,
            finished: false,
        })
    }

    /// Current run state
    #[must_use]
    pub fn step_state(&self) -> &StepState {
        &self.run
    }

    /// Drive the run to completion and return the verdict
    #[must_use]
    pub fn into_result(mut self) -> DetectionResult {
        while self.next().is_some() {}
        self.run.to_result()
    }
}

impl Iterator for SafetyStepper<'_> {
    type Item = StepStatus;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let status = advance(&self.need, &self.state.allocation, &mut self.run);
        self.finished = status.is_terminal();
        Some(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::Scenario;

    #[test]
    fn test_first_step_from_scratch() {
        let state = Scenario::Safe.state();
        let report = step(&state, None).unwrap();
        assert_eq!(
            report.status,
            StepStatus::Found {
                process: 1,
                need: vec![1, 2, 2],
                work_before: vec![3, 3, 2],
                work_after: vec![5, 3, 2],
            }
        );
        assert_eq!(report.step_state.safe_sequence, vec![1]);
        assert_eq!(report.step_state.cursor, 2);
    }

    #[test]
    fn test_resumed_steps_follow_pass_order() {
        let state = Scenario::Safe.state();
        let mut run = None;
        let mut order = Vec::new();
        loop {
            let report = step(&state, run.take()).unwrap();
            match report.status {
                StepStatus::Found { process, .. } => order.push(process),
                StepStatus::Done => break,
                StepStatus::Deadlock { .. } => panic!("safe scenario reported deadlock"),
            }
            run = Some(report.step_state);
        }
        assert_eq!(order, vec![1, 3, 4, 0, 2]);
    }

    #[test]
    fn test_stepper_reports_deadlock_once() {
        let state = Scenario::Deadlock.state();
        let statuses: Vec<_> = SafetyStepper::new(&state).unwrap().collect();
        assert_eq!(
            statuses,
            vec![StepStatus::Deadlock {
                deadlocked: vec![0, 1, 2, 3]
            }]
        );
    }

    #[test]
    fn test_mismatched_step_state_rejected() {
        let state = Scenario::Safe.state();
        let mut run = StepState::initial(&state);
        run.work.pop();
        assert!(step(&state, Some(run)).is_err());

        let mut run = StepState::initial(&state);
        run.safe_sequence.push(0);
        assert!(step(&state, Some(run)).is_err());
    }

    #[test]
    fn test_repeated_process_in_sequence_rejected() {
        let state = Scenario::Safe.state();
        let run = StepState {
            work: work_vector(&state),
            finish: vec![true, true, false, false, false],
            safe_sequence: vec![0, 0],
            cursor: 1,
        };
        let err = step(&state, Some(run)).unwrap_err();
        assert!(matches!(
            err,
            bankr_errors::Error::Input(InputError::StepStateMismatch { .. })
        ));
    }

    #[test]
    fn test_work_must_match_released_allocations() {
        let state = Scenario::Safe.state();
        let first = step(&state, None).unwrap().step_state;

        let mut tampered = first.clone();
        tampered.work = vec![u64::MAX; 3];
        assert!(matches!(
            step(&state, Some(tampered)),
            Err(bankr_errors::Error::Input(InputError::StepStateMismatch { .. }))
        ));

        let mut tampered = first.clone();
        tampered.work[0] += 1;
        assert!(step(&state, Some(tampered)).is_err());

        // The untouched state resumes normally.
        let report = step(&state, Some(first)).unwrap();
        assert!(matches!(report.status, StepStatus::Found { process: 3, .. }));
    }

    #[test]
    fn test_report_serializes_status_tag() {
        let state = Scenario::Deadlock.state();
        let report = step(&state, None).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "deadlock");
        assert_eq!(json["deadlocked"], serde_json::json!([0, 1, 2, 3]));
        assert_eq!(json["step_state"]["cursor"], 0);
    }
}
