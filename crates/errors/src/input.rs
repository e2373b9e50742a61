//! Snapshot and protocol input error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum InputError {
    #[error("{field} must be between 1 and {max}, got {value}")]
    InvalidDimension {
        field: String,
        value: usize,
        max: usize,
    },

    #[error("{field} must have {expected} entries, got {actual}")]
    ShapeMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("allocation[{process}][{resource}] = {allocation} exceeds max_need = {max_need}")]
    AllocationExceedsMax {
        process: usize,
        resource: usize,
        allocation: u32,
        max_need: u32,
    },

    #[error("parse error at token {position}: expected {expected}, found {found:?}")]
    Parse {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("unexpected end of input: expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("missing command")]
    MissingCommand,

    #[error("unknown command: {command}")]
    UnknownCommand { command: String },

    #[error("step state does not match snapshot: {message}")]
    StepStateMismatch { message: String },

    #[error("unknown scenario: {name}")]
    UnknownScenario { name: String },
}

impl UserFacingError for InputError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidDimension { .. } => Some(
                "Reduce the number of processes or resources, or raise the limits in the config file.",
            ),
            Self::ShapeMismatch { .. } | Self::UnexpectedEof { .. } => Some(
                "Provide `available`, then one allocation row and one max row per process.",
            ),
            Self::AllocationExceedsMax { .. } => {
                Some("A process can never hold more units than its declared maximum.")
            }
            Self::Parse { .. } => Some("Quantities must be non-negative integers."),
            Self::MissingCommand | Self::UnknownCommand { .. } => {
                Some("The first token must be one of DETECT, RAG, RESOLVE, SIMULATE, STEP.")
            }
            Self::UnknownScenario { .. } => Some("Available scenarios: safe, deadlock."),
            Self::StepStateMismatch { .. } => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::InvalidDimension { .. } => "input.invalid_dimension",
            Self::ShapeMismatch { .. } => "input.shape_mismatch",
            Self::AllocationExceedsMax { .. } => "input.allocation_exceeds_max",
            Self::Parse { .. } => "input.parse",
            Self::UnexpectedEof { .. } => "input.unexpected_eof",
            Self::MissingCommand => "input.missing_command",
            Self::UnknownCommand { .. } => "input.unknown_command",
            Self::StepStateMismatch { .. } => "input.step_state_mismatch",
            Self::UnknownScenario { .. } => "input.unknown_scenario",
        })
    }
}
