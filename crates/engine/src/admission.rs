//! Admission control: would granting a request keep the system safe?

use bankr_errors::AnalysisError;
use bankr_types::{DetectionResult, SystemState};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use crate::safety::evaluate;

/// Hypothetical request for `amount` more units of one resource
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub process: usize,
    pub resource: usize,
    pub amount: u32,
}

impl ResourceRequest {
    #[must_use]
    pub fn new(process: usize, resource: usize, amount: u32) -> Self {
        Self {
            process,
            resource,
            amount,
        }
    }
}

/// Why a request was not granted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Zero amount or an index out of range
    Malformed,
    ExceedsAvailable,
    ExceedsNeed,
    /// The trial allocation leaves some process unable to finish
    Unsafe,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Malformed => "Invalid process_index, resource_index, or amount.",
            Self::ExceedsAvailable => "Request exceeds available resources.",
            Self::ExceedsNeed => "Request exceeds remaining need.",
            Self::Unsafe => "Granting would lead to unsafe state.",
        })
    }
}

/// Decision for one simulated request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimulationOutcome {
    Granted {
        /// Verdict on the trial state
        trial: DetectionResult,
    },
    Rejected {
        reason: RejectReason,
        /// Verdict on the trial state, when one was evaluated
        trial: Option<DetectionResult>,
    },
}

impl SimulationOutcome {
    fn rejected(reason: RejectReason) -> Self {
        Self::Rejected {
            reason,
            trial: None,
        }
    }

    #[must_use]
    pub fn granted(&self) -> bool {
        matches!(self, Self::Granted { .. })
    }

    /// Mirrors [`Self::granted`]: a request is granted exactly when the
    /// trial state is safe.
    #[must_use]
    pub fn is_safe(&self) -> bool {
        self.granted()
    }

    #[must_use]
    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            Self::Granted { .. } => None,
            Self::Rejected { reason, .. } => Some(*reason),
        }
    }

    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Granted { .. } => "Granting would keep the system safe.".to_string(),
            Self::Rejected { reason, .. } => reason.to_string(),
        }
    }

    #[must_use]
    pub fn trial(&self) -> Option<&DetectionResult> {
        match self {
            Self::Granted { trial } => Some(trial),
            Self::Rejected { trial, .. } => trial.as_ref(),
        }
    }
}

/// Decide whether `request` can be granted.
///
/// Checks run in order and stop at the first failure: well-formedness,
/// availability, remaining need. A request that passes is applied to
/// `state`, the safety algorithm runs on the result, and the trial
/// allocation is rolled back on every exit path. `state` is identical
/// before and after the call.
///
/// # Errors
///
/// Returns [`AnalysisError::NeedUnderflow`] if `state` has a negative need.
pub fn simulate(
    state: &mut SystemState,
    request: &ResourceRequest,
) -> Result<SimulationOutcome, AnalysisError> {
    let ResourceRequest {
        process,
        resource,
        amount,
    } = *request;

    if amount == 0 || process >= state.num_processes() || resource >= state.num_resources() {
        return Ok(SimulationOutcome::rejected(RejectReason::Malformed));
    }
    if amount > state.available[resource] {
        return Ok(SimulationOutcome::rejected(RejectReason::ExceedsAvailable));
    }
    let held = state.allocation[process][resource];
    let max_need = state.max_need[process][resource];
    let need = max_need
        .checked_sub(held)
        .ok_or(AnalysisError::NeedUnderflow {
            process,
            resource,
            allocation: held,
            max_need,
        })?;
    if amount > need {
        return Ok(SimulationOutcome::rejected(RejectReason::ExceedsNeed));
    }

    let trial = {
        let mut trial_state = scopeguard::guard(&mut *state, move |state| {
            state.available[resource] += amount;
            state.allocation[process][resource] -= amount;
        });
        trial_state.available[resource] -= amount;
        trial_state.allocation[process][resource] += amount;
        debug!(process, resource, amount, "evaluating trial allocation");
        evaluate(&trial_state)?
    };

    let outcome = if trial.is_deadlocked {
        SimulationOutcome::Rejected {
            reason: RejectReason::Unsafe,
            trial: Some(trial),
        }
    } else {
        SimulationOutcome::Granted { trial }
    };
    info!(
        process,
        resource,
        amount,
        granted = outcome.granted(),
        "request simulated"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::Scenario;

    #[test]
    fn test_grant_keeps_safe_state() {
        let mut state = Scenario::Safe.state();
        let before = state.clone();
        // P1 asks for one more R0: the textbook request that is granted.
        let outcome = simulate(&mut state, &ResourceRequest::new(1, 0, 1)).unwrap();
        assert!(outcome.granted());
        assert!(outcome.is_safe());
        assert_eq!(outcome.message(), "Granting would keep the system safe.");
        assert_eq!(state, before);
    }

    #[test]
    fn test_unsafe_request_rejected_and_reverted() {
        let mut state = Scenario::Safe.state();
        let before = state.clone();
        // P0 taking both spare R2 leaves [3,3,0] and no remaining need fits.
        let outcome = simulate(&mut state, &ResourceRequest::new(0, 2, 2)).unwrap();
        assert_eq!(outcome.reason(), Some(RejectReason::Unsafe));
        assert!(outcome.trial().is_some_and(|trial| trial.is_deadlocked));
        assert_eq!(state, before);
    }

    #[test]
    fn test_validation_order() {
        let mut state = Scenario::Safe.state();
        let cases = [
            (ResourceRequest::new(0, 0, 0), RejectReason::Malformed),
            (ResourceRequest::new(5, 0, 1), RejectReason::Malformed),
            (ResourceRequest::new(0, 3, 1), RejectReason::Malformed),
            (ResourceRequest::new(0, 0, 4), RejectReason::ExceedsAvailable),
            // P3 needs only [0,1,1]
            (ResourceRequest::new(3, 0, 1), RejectReason::ExceedsNeed),
        ];
        for (request, expected) in cases {
            let outcome = simulate(&mut state, &request).unwrap();
            assert_eq!(outcome.reason(), Some(expected), "{request:?}");
            assert!(outcome.trial().is_none());
        }
        assert_eq!(state, Scenario::Safe.state());
    }

    #[test]
    fn test_exceeds_available_checked_before_need() {
        let mut state = Scenario::Deadlock.state();
        let outcome = simulate(&mut state, &ResourceRequest::new(0, 0, 5)).unwrap();
        assert_eq!(outcome.reason(), Some(RejectReason::ExceedsAvailable));
    }

    #[test]
    fn test_state_restored_when_evaluation_fails() {
        let mut state = Scenario::Safe.state();
        state.allocation[4][0] = 5; // max_need[4][0] is 4
        let before = state.clone();
        let err = simulate(&mut state, &ResourceRequest::new(1, 0, 1)).unwrap_err();
        assert!(matches!(err, AnalysisError::NeedUnderflow { process: 4, .. }));
        assert_eq!(state, before);
    }
}
