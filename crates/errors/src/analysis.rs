//! Analysis engine error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum AnalysisError {
    /// `max_need < allocation` for some cell; need would be negative.
    #[error(
        "negative need for process {process}, resource {resource}: max_need {max_need} < allocation {allocation}"
    )]
    NeedUnderflow {
        process: usize,
        resource: usize,
        allocation: u32,
        max_need: u32,
    },

    #[error("process {victim} is not deadlocked (deadlocked: {deadlocked:?})")]
    VictimNotDeadlocked {
        victim: usize,
        deadlocked: Vec<usize>,
    },

    #[error("detection result covers {result} processes but the state has {state}")]
    StaleResult { result: usize, state: usize },

    #[error("unit count overflow for resource {resource}")]
    Overflow { resource: usize },
}

impl UserFacingError for AnalysisError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NeedUnderflow { .. } => {
                Some("Fix the snapshot so that every allocation is within its max_need.")
            }
            Self::VictimNotDeadlocked { .. } => {
                Some("Pick one of the listed deadlocked processes, or omit the victim.")
            }
            Self::StaleResult { .. } => Some("Re-run detection on the current state first."),
            Self::Overflow { .. } => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::NeedUnderflow { .. } => "analysis.need_underflow",
            Self::VictimNotDeadlocked { .. } => "analysis.victim_not_deadlocked",
            Self::StaleResult { .. } => "analysis.stale_result",
            Self::Overflow { .. } => "analysis.overflow",
        })
    }
}
