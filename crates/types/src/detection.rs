//! Safety verdict for a snapshot

use serde::{Deserialize, Serialize};

/// Outcome of running the safety algorithm over a [`crate::SystemState`].
///
/// `deadlocked_processes` and `safe_sequence` together cover every process
/// index exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DetectionResult {
    pub is_deadlocked: bool,
    /// Processes that could not be discharged, ascending
    pub deadlocked_processes: Vec<usize>,
    /// Discharge order actually achieved; partial when deadlocked
    pub safe_sequence: Vec<usize>,
}

impl DetectionResult {
    /// Build a result from the discharge order and the stuck processes
    #[must_use]
    pub fn new(safe_sequence: Vec<usize>, mut deadlocked_processes: Vec<usize>) -> Self {
        deadlocked_processes.sort_unstable();
        Self {
            is_deadlocked: !deadlocked_processes.is_empty(),
            deadlocked_processes,
            safe_sequence,
        }
    }

    #[must_use]
    pub fn safe_sequence_length(&self) -> usize {
        self.safe_sequence.len()
    }

    #[must_use]
    pub fn is_safe(&self) -> bool {
        !self.is_deadlocked
    }

    /// Number of processes covered by this result
    #[must_use]
    pub fn num_processes(&self) -> usize {
        self.safe_sequence.len() + self.deadlocked_processes.len()
    }

    #[must_use]
    pub fn is_deadlocked_process(&self, process: usize) -> bool {
        self.deadlocked_processes.binary_search(&process).is_ok()
    }
}
