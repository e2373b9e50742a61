//! Command execution shared by the subcommands and the worker

use bankr_engine::{
    evaluate, need_matrix, resolve_all, simulate, step, AllocationGraph, RejectReason,
    ResolveOutcome, ResourceRequest, SafetyStepper, StepState, SystemState,
};
use bankr_errors::{AnalysisError, Error};
use tracing::debug;

use crate::protocol::{Command, Job, RequestArg};
use crate::report::{CommandOutput, DetectionReport, ResolveReport, SimulationReport, StepLog};

pub fn show_state(state: SystemState) -> Result<CommandOutput, Error> {
    let need = need_matrix(&state)?;
    Ok(CommandOutput::State { state, need })
}

pub fn detect(state: &SystemState) -> Result<CommandOutput, Error> {
    Ok(CommandOutput::Detection(evaluate(state)?))
}

pub fn rag(state: &SystemState) -> Result<CommandOutput, Error> {
    Ok(CommandOutput::Graph(AllocationGraph::build(state)?))
}

/// Terminate one deadlocked process.
///
/// A safe state and a victim outside the deadlocked set are reported as
/// [`CommandOutput::Unresolved`] rather than as errors.
pub fn resolve(state: &SystemState, victim: Option<usize>) -> Result<CommandOutput, Error> {
    let result = evaluate(state)?;
    match bankr_engine::resolve(state, &result, victim) {
        Ok(ResolveOutcome::Resolved(resolution)) => Ok(CommandOutput::Resolution(resolution)),
        Ok(ResolveOutcome::NotApplicable) => {
            Ok(CommandOutput::Unresolved(ResolveReport::NOT_DEADLOCKED))
        }
        Err(AnalysisError::VictimNotDeadlocked { .. }) => {
            Ok(CommandOutput::Unresolved(ResolveReport::INVALID_VICTIM))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn resolve_until_safe(state: &SystemState) -> Result<CommandOutput, Error> {
    Ok(CommandOutput::Resolutions(resolve_all(state)?))
}

pub fn simulate_request(
    state: &mut SystemState,
    request: RequestArg,
) -> Result<CommandOutput, Error> {
    let request = match request {
        RequestArg::Request(request) => request,
        RequestArg::Missing => {
            return Ok(simulation(None, SimulationReport::rejected(SimulationReport::MISSING_REQUEST)));
        }
        RequestArg::OutOfRange => {
            return Ok(simulation(
                None,
                SimulationReport::rejected(RejectReason::Malformed.to_string()),
            ));
        }
    };
    let outcome = simulate(state, &request)?;
    Ok(simulation(Some(request), SimulationReport::from(&outcome)))
}

fn simulation(request: Option<ResourceRequest>, report: SimulationReport) -> CommandOutput {
    CommandOutput::Simulation { request, report }
}

/// Run the safety algorithm to completion, recording every step
pub fn step_log(state: &SystemState) -> Result<CommandOutput, Error> {
    let mut stepper = SafetyStepper::new(state)?;
    let steps: Vec<_> = stepper.by_ref().collect();
    let result = stepper.into_result();
    debug!(steps = steps.len(), "recorded step log");
    Ok(CommandOutput::Steps(StepLog {
        steps,
        result: DetectionReport::from(&result),
    }))
}

/// Advance a suspended run by a single step
pub fn step_once(state: &SystemState, resume: Option<StepState>) -> Result<CommandOutput, Error> {
    Ok(CommandOutput::Step(step(state, resume)?))
}

/// Execute one parsed worker job
pub fn run_job(job: Job) -> Result<CommandOutput, Error> {
    let Job {
        command,
        mut state,
        victim,
        request,
    } = job;
    debug!(command = command.keyword(), "running worker job");
    match command {
        Command::Detect => detect(&state),
        Command::Rag => rag(&state),
        Command::Resolve => resolve(&state, victim),
        Command::Simulate => simulate_request(&mut state, request.unwrap_or(RequestArg::Missing)),
        Command::Step => step_log(&state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::parse_job;
    use bankr_engine::scenarios::Scenario;
    use bankr_types::StateLimits;
    use serde_json::{json, Value};

    const DEADLOCK: &str = "4 3  0 0 0  1 0 1  1 1 0  0 1 1  1 0 0  2 1 2  2 2 1  1 2 2  2 1 1";

    fn run(input: &str) -> Value {
        let job = parse_job(input, &StateLimits::default()).unwrap();
        let line = run_job(job).unwrap().to_json().unwrap();
        serde_json::from_str(&line).unwrap()
    }

    #[test]
    fn test_worker_detect() {
        let value = run(&format!("DETECT {DEADLOCK}"));
        assert_eq!(value["is_deadlocked"], true);
        assert_eq!(value["deadlocked_processes"], json!([0, 1, 2, 3]));
        assert_eq!(value["safe_sequence_length"], 0);
    }

    #[test]
    fn test_worker_resolve_auto_and_invalid() {
        let value = run(&format!("RESOLVE {DEADLOCK} -1"));
        assert_eq!(value["victim_process"], 3);
        assert_eq!(value["state"]["available"], json!([1, 0, 0]));

        let safe = "1 1 1 0 1";
        let value = run(&format!("RESOLVE {safe}"));
        assert_eq!(value["error"], ResolveReport::NOT_DEADLOCKED);

        let value = run(&format!("RESOLVE {DEADLOCK} 7"));
        assert_eq!(value["error"], ResolveReport::INVALID_VICTIM);
    }

    #[test]
    fn test_worker_simulate() {
        let value = run(&format!("SIMULATE {DEADLOCK}"));
        assert_eq!(value["granted"], false);
        assert_eq!(value["message"], SimulationReport::MISSING_REQUEST);

        let value = run(&format!("SIMULATE {DEADLOCK} 0 0 1"));
        assert_eq!(value["message"], "Request exceeds available resources.");

        let value = run(&format!("SIMULATE {DEADLOCK} -1 0 1"));
        assert_eq!(value["message"], "Invalid process_index, resource_index, or amount.");
    }

    #[test]
    fn test_worker_step_log() {
        let value = run(&format!("STEP {DEADLOCK}"));
        assert_eq!(value["steps"], json!([{"status": "deadlock", "deadlocked": [0, 1, 2, 3]}]));
        assert_eq!(value["result"]["is_deadlocked"], true);
    }

    #[test]
    fn test_worker_rag() {
        let value = run(&format!("RAG {DEADLOCK}"));
        assert_eq!(value["nodes"].as_array().unwrap().len(), 7);
        assert_eq!(value["has_cycle"], true);
    }

    #[test]
    fn test_step_log_matches_detection() {
        let state = Scenario::Safe.state();
        let CommandOutput::Steps(log) = step_log(&state).unwrap() else {
            panic!("expected a step log");
        };
        assert_eq!(log.steps.len(), 6);
        assert_eq!(log.result.safe_sequence, vec![1, 3, 4, 0, 2]);
    }

    #[test]
    fn test_resolve_until_safe() {
        let CommandOutput::Resolutions(resolutions) =
            resolve_until_safe(&Scenario::Deadlock.state()).unwrap()
        else {
            panic!("expected resolutions");
        };
        assert_eq!(resolutions.first().map(|r| r.victim), Some(3));
        assert!(resolutions.last().is_some_and(|r| r.result.is_safe()));
    }
}
