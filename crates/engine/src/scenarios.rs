//! Built-in sample snapshots

use bankr_errors::InputError;
use bankr_types::SystemState;

/// Named sample snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Classic Banker's example, 5 processes and 3 resource types.
    /// Safe sequence: P1, P3, P4, P0, P2.
    Safe,
    /// Circular wait with nothing available, 4 processes and 3 resource types
    Deadlock,
}

impl Scenario {
    pub const ALL: [Scenario; 2] = [Scenario::Safe, Scenario::Deadlock];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Deadlock => "deadlock",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Safe => "Classic Banker's safe example (5 processes, 3 resources)",
            Self::Deadlock => "Circular wait deadlock (4 processes, 3 resources, 0 available)",
        }
    }

    /// Snapshot for this scenario
    #[must_use]
    pub fn state(self) -> SystemState {
        match self {
            Self::Safe => SystemState {
                available: vec![3, 3, 2],
                allocation: vec![
                    vec![0, 1, 0],
                    vec![2, 0, 0],
                    vec![3, 0, 2],
                    vec![2, 1, 1],
                    vec![0, 0, 2],
                ],
                max_need: vec![
                    vec![7, 5, 3],
                    vec![3, 2, 2],
                    vec![9, 0, 2],
                    vec![2, 2, 2],
                    vec![4, 3, 3],
                ],
            },
            Self::Deadlock => SystemState {
                available: vec![0, 0, 0],
                allocation: vec![
                    vec![1, 0, 1],
                    vec![1, 1, 0],
                    vec![0, 1, 1],
                    vec![1, 0, 0],
                ],
                max_need: vec![
                    vec![2, 1, 2],
                    vec![2, 2, 1],
                    vec![1, 2, 2],
                    vec![2, 1, 1],
                ],
            },
        }
    }
}

impl std::str::FromStr for Scenario {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|scenario| scenario.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| InputError::UnknownScenario {
                name: s.to_string(),
            })
    }
}
