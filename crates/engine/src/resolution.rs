//! Deadlock resolution by process termination

use bankr_errors::AnalysisError;
use bankr_types::{DetectionResult, SystemState};
use tracing::{info, warn};

use crate::safety::evaluate;

/// One applied termination
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Terminated process
    pub victim: usize,
    /// Units returned to `available`, per resource
    pub released: Vec<u32>,
    /// Snapshot after the termination
    pub state: SystemState,
    /// Verdict on `state`
    pub result: DetectionResult,
}

/// Outcome of [`resolve`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// The state was not deadlocked; nothing was changed
    NotApplicable,
    Resolved(Resolution),
}

impl ResolveOutcome {
    #[must_use]
    pub fn resolution(&self) -> Option<&Resolution> {
        match self {
            Self::NotApplicable => None,
            Self::Resolved(resolution) => Some(resolution),
        }
    }
}

/// Pick the deadlocked process holding the fewest units in total, lowest
/// index first on ties. `None` when nothing is deadlocked.
#[must_use]
pub fn select_victim(state: &SystemState, result: &DetectionResult) -> Option<usize> {
    result
        .deadlocked_processes
        .iter()
        .copied()
        .min_by_key(|&p| (state.allocated_total(p), p))
}

/// Terminate one deadlocked process and re-evaluate.
///
/// `result` must be the verdict for `state`. With `victim` set, that
/// process is terminated; otherwise [`select_victim`] chooses. The victim's
/// allocation is returned to `available` and both its allocation and
/// max_need rows are zeroed. Exactly one process is terminated per call;
/// `state` itself is left untouched.
///
/// # Errors
///
/// Returns [`AnalysisError::VictimNotDeadlocked`] when `victim` is not in
/// the deadlocked set, [`AnalysisError::StaleResult`] when `result` does not
/// describe a snapshot of this size, and propagates evaluation errors.
pub fn resolve(
    state: &SystemState,
    result: &DetectionResult,
    victim: Option<usize>,
) -> Result<ResolveOutcome, AnalysisError> {
    if result.num_processes() != state.num_processes() {
        return Err(AnalysisError::StaleResult {
            result: result.num_processes(),
            state: state.num_processes(),
        });
    }
    if !result.is_deadlocked {
        info!("state is not deadlocked; resolution not applicable");
        return Ok(ResolveOutcome::NotApplicable);
    }

    let victim = match victim {
        Some(victim) if result.is_deadlocked_process(victim) => victim,
        Some(victim) => {
            warn!(victim, deadlocked = ?result.deadlocked_processes, "rejected victim");
            return Err(AnalysisError::VictimNotDeadlocked {
                victim,
                deadlocked: result.deadlocked_processes.clone(),
            });
        }
        None => match select_victim(state, result) {
            Some(victim) => victim,
            None => return Ok(ResolveOutcome::NotApplicable),
        },
    };

    let (new_state, released) = terminate(state, victim)?;
    let new_result = evaluate(&new_state)?;
    info!(
        victim,
        released = ?released,
        still_deadlocked = new_result.is_deadlocked,
        "terminated process"
    );

    Ok(ResolveOutcome::Resolved(Resolution {
        victim,
        released,
        state: new_state,
        result: new_result,
    }))
}

fn terminate(state: &SystemState, victim: usize) -> Result<(SystemState, Vec<u32>), AnalysisError> {
    let mut next = state.clone();
    let released = std::mem::take(&mut next.allocation[victim]);
    for (resource, (slot, &units)) in next.available.iter_mut().zip(&released).enumerate() {
        *slot = slot
            .checked_add(units)
            .ok_or(AnalysisError::Overflow { resource })?;
    }
    next.allocation[victim] = vec![0; state.num_resources()];
    next.max_need[victim] = vec![0; state.num_resources()];
    Ok((next, released))
}

/// Terminate processes one at a time, always with automatic victim
/// selection, until the state is safe. Returns every applied resolution in
/// order; empty when the state was already safe.
///
/// Each termination zeroes a deadlocked process's claim, which lets it
/// finish on the next evaluation, so at most `num_processes` rounds run.
///
/// # Errors
///
/// Propagates errors from [`evaluate`] and [`resolve`].
pub fn resolve_all(state: &SystemState) -> Result<Vec<Resolution>, AnalysisError> {
    let mut resolutions: Vec<Resolution> = Vec::new();
    let mut result = evaluate(state)?;

    for _ in 0..state.num_processes() {
        let current = resolutions.last().map_or(state, |last| &last.state);
        match resolve(current, &result, None)? {
            ResolveOutcome::NotApplicable => break,
            ResolveOutcome::Resolved(resolution) => {
                result = resolution.result.clone();
                resolutions.push(resolution);
            }
        }
    }

    Ok(resolutions)
}
