//! JSON response shapes
//!
//! Each worker job and each `--json` subcommand prints exactly one of these
//! as a single line.

use bankr_engine::{
    AllocationGraph, DetectionResult, Edge, NeedMatrix, NodeKind, Resolution, ResourceRequest,
    SimulationOutcome, StepReport, StepStatus, SystemState,
};
use serde::Serialize;

/// Result of one command, rendered as a table or serialized to JSON
#[derive(Debug, Clone)]
pub enum CommandOutput {
    State {
        state: SystemState,
        need: NeedMatrix,
    },
    Detection(DetectionResult),
    Graph(AllocationGraph),
    Resolution(Resolution),
    /// Every termination applied by `resolve --all`, in order
    Resolutions(Vec<Resolution>),
    /// Resolution was refused; the message is reported as `{"error": ...}`
    Unresolved(&'static str),
    Simulation {
        request: Option<ResourceRequest>,
        report: SimulationReport,
    },
    Steps(StepLog),
    Step(StepReport),
}

impl CommandOutput {
    /// Single-line JSON form of this output
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        match self {
            Self::State { state, need } => serde_json::to_string(&StateReport {
                need: Some(need.clone()),
                ..StateReport::from(state)
            }),
            Self::Detection(result) => serde_json::to_string(&DetectionReport::from(result)),
            Self::Graph(graph) => serde_json::to_string(&RagReport::from(graph)),
            Self::Resolution(resolution) => {
                serde_json::to_string(&ResolveReport::from(resolution))
            }
            Self::Resolutions(resolutions) => serde_json::to_string(
                &resolutions
                    .iter()
                    .map(ResolveReport::from)
                    .collect::<Vec<_>>(),
            ),
            Self::Unresolved(message) => serde_json::to_string(&ResolveReport::error(*message)),
            Self::Simulation { report, .. } => serde_json::to_string(report),
            Self::Steps(log) => serde_json::to_string(log),
            Self::Step(report) => serde_json::to_string(report),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionReport {
    pub is_deadlocked: bool,
    pub deadlocked_processes: Vec<usize>,
    pub safe_sequence: Vec<usize>,
    pub safe_sequence_length: usize,
}

impl From<&DetectionResult> for DetectionReport {
    fn from(result: &DetectionResult) -> Self {
        Self {
            is_deadlocked: result.is_deadlocked,
            deadlocked_processes: result.deadlocked_processes.clone(),
            safe_sequence: result.safe_sequence.clone(),
            safe_sequence_length: result.safe_sequence_length(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateReport {
    pub num_processes: usize,
    pub num_resources: usize,
    pub available: Vec<u32>,
    pub allocation: Vec<Vec<u32>>,
    pub max_need: Vec<Vec<u32>>,
    /// Only included by the `state` subcommand
    #[serde(skip_serializing_if = "Option::is_none")]
    pub need: Option<Vec<Vec<u32>>>,
}

impl From<&SystemState> for StateReport {
    fn from(state: &SystemState) -> Self {
        Self {
            num_processes: state.num_processes(),
            num_resources: state.num_resources(),
            available: state.available.clone(),
            allocation: state.allocation.clone(),
            max_need: state.max_need.clone(),
            need: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeReport {
    pub id: usize,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RagReport {
    pub nodes: Vec<NodeReport>,
    pub edges: Vec<Edge>,
    pub has_cycle: bool,
}

impl From<&AllocationGraph> for RagReport {
    fn from(graph: &AllocationGraph) -> Self {
        Self {
            nodes: graph
                .nodes()
                .map(|node| NodeReport {
                    id: node.id,
                    label: node.label(),
                    kind: node.kind,
                })
                .collect(),
            edges: graph.edges().to_vec(),
            has_cycle: graph.has_cycle(),
        }
    }
}

/// RESOLVE response: either the new state or an error message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResolveReport {
    Resolved {
        state: StateReport,
        result: DetectionReport,
        victim_process: usize,
    },
    Error {
        error: String,
    },
}

impl ResolveReport {
    pub const NOT_DEADLOCKED: &'static str = "State is not deadlocked; resolution not applicable.";
    pub const INVALID_VICTIM: &'static str = "Invalid or non-deadlocked victim_process_index.";

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }
}

impl From<&Resolution> for ResolveReport {
    fn from(resolution: &Resolution) -> Self {
        Self::Resolved {
            state: StateReport::from(&resolution.state),
            result: DetectionReport::from(&resolution.result),
            victim_process: resolution.victim,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    pub granted: bool,
    pub is_safe: bool,
    pub message: String,
}

impl SimulationReport {
    pub const MISSING_REQUEST: &'static str = "Missing process_index resource_index amount.";

    /// Response for a request that could not be evaluated at all
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            granted: false,
            is_safe: false,
            message: message.into(),
        }
    }
}

impl From<&SimulationOutcome> for SimulationReport {
    fn from(outcome: &SimulationOutcome) -> Self {
        Self {
            granted: outcome.granted(),
            is_safe: outcome.is_safe(),
            message: outcome.message(),
        }
    }
}

/// STEP response: every step of a full run, then the verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepLog {
    pub steps: Vec<StepStatus>,
    pub result: DetectionReport,
}
