//! Resource-allocation snapshot

use bankr_errors::InputError;
use serde::{Deserialize, Serialize};

/// Upper bounds on snapshot dimensions, checked at the input boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateLimits {
    pub max_processes: usize,
    pub max_resources: usize,
}

impl StateLimits {
    /// Limits used when nothing else is configured
    pub const DEFAULT_MAX: usize = 10;

    #[must_use]
    pub fn new(max_processes: usize, max_resources: usize) -> Self {
        Self {
            max_processes,
            max_resources,
        }
    }
}

impl Default for StateLimits {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX, Self::DEFAULT_MAX)
    }
}

/// One snapshot of a multi-instance resource system.
///
/// Processes are the rows of `allocation` and `max_need`, resources are the
/// columns and the entries of `available`. Need is never stored: it is
/// derived as `max_need - allocation` by whoever consumes the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemState {
    /// Units of each resource type not held by any process
    pub available: Vec<u32>,
    /// `allocation[p][r]`: units of resource `r` held by process `p`
    pub allocation: Vec<Vec<u32>>,
    /// `max_need[p][r]`: maximum units of resource `r` process `p` may claim
    pub max_need: Vec<Vec<u32>>,
}

impl SystemState {
    /// Build a snapshot, checking that every row matches `available`.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::ShapeMismatch`] when the matrices disagree on
    /// the number of processes or a row has the wrong number of resources.
    pub fn new(
        available: Vec<u32>,
        allocation: Vec<Vec<u32>>,
        max_need: Vec<Vec<u32>>,
    ) -> Result<Self, InputError> {
        let num_resources = available.len();
        if max_need.len() != allocation.len() {
            return Err(InputError::ShapeMismatch {
                field: "max_need".to_string(),
                expected: allocation.len(),
                actual: max_need.len(),
            });
        }
        for (name, matrix) in [("allocation", &allocation), ("max_need", &max_need)] {
            for (p, row) in matrix.iter().enumerate() {
                if row.len() != num_resources {
                    return Err(InputError::ShapeMismatch {
                        field: format!("{name}[{p}]"),
                        expected: num_resources,
                        actual: row.len(),
                    });
                }
            }
        }
        Ok(Self {
            available,
            allocation,
            max_need,
        })
    }

    /// All-zero snapshot of the given dimensions
    #[must_use]
    pub fn zeroed(num_processes: usize, num_resources: usize) -> Self {
        Self {
            available: vec![0; num_resources],
            allocation: vec![vec![0; num_resources]; num_processes],
            max_need: vec![vec![0; num_resources]; num_processes],
        }
    }

    #[must_use]
    pub fn num_processes(&self) -> usize {
        self.allocation.len()
    }

    #[must_use]
    pub fn num_resources(&self) -> usize {
        self.available.len()
    }

    /// Total units currently held by `process` across all resource types
    #[must_use]
    pub fn allocated_total(&self, process: usize) -> u64 {
        self.allocation
            .get(process)
            .map_or(0, |row| row.iter().map(|&units| u64::from(units)).sum())
    }

    /// Units of `resource` in the system: available plus everything allocated
    #[must_use]
    pub fn total_units(&self, resource: usize) -> u64 {
        let held: u64 = self
            .allocation
            .iter()
            .map(|row| u64::from(row[resource]))
            .sum();
        u64::from(self.available[resource]) + held
    }

    /// Check dimensions against `limits` and the `allocation <= max_need`
    /// invariant, reporting the first violation found.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidDimension`] for empty or oversized
    /// snapshots and [`InputError::AllocationExceedsMax`] for the first cell
    /// whose allocation exceeds its declared maximum.
    pub fn validate(&self, limits: &StateLimits) -> Result<(), InputError> {
        check_dimension("num_processes", self.num_processes(), limits.max_processes)?;
        check_dimension("num_resources", self.num_resources(), limits.max_resources)?;

        for (p, (held, max)) in self.allocation.iter().zip(&self.max_need).enumerate() {
            for (r, (&allocation, &max_need)) in held.iter().zip(max).enumerate() {
                if allocation > max_need {
                    return Err(InputError::AllocationExceedsMax {
                        process: p,
                        resource: r,
                        allocation,
                        max_need,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Reject a process or resource count of zero or above `max`
pub fn check_dimension(field: &str, value: usize, max: usize) -> Result<(), InputError> {
    if value == 0 || value > max {
        return Err(InputError::InvalidDimension {
            field: field.to_string(),
            value,
            max,
        });
    }
    Ok(())
}
