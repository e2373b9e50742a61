#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Deadlock analysis engine for bankr
//!
//! Every entry point takes one [`SystemState`] snapshot owned by the caller
//! and is a bounded, synchronous computation over it:
//!
//! - [`evaluate`] runs the Banker's safety algorithm and reports the safe
//!   sequence and the deadlocked set.
//! - [`AllocationGraph`] derives the resource-allocation graph and checks it
//!   for cycles, as a structural cross-check of the verdict.
//! - [`simulate`] answers "would granting this request keep the system
//!   safe?" without leaking the trial allocation.
//! - [`resolve`] terminates one deadlocked process and re-evaluates.
//!
//! The deadlock verdict is the Banker's *safety* check: a process counts as
//! deadlocked when its remaining claim (`max_need - allocation`) can never
//! be covered. This is only equivalent to true deadlock when `max_need`
//! really bounds what a process will request.

mod admission;
mod graph;
mod resolution;
mod safety;
pub mod scenarios;
mod step;

pub use admission::{simulate, RejectReason, ResourceRequest, SimulationOutcome};
pub use graph::{AllocationGraph, Edge, EdgeKind, Node, NodeKind};
pub use resolution::{resolve, resolve_all, select_victim, Resolution, ResolveOutcome};
pub use safety::{can_satisfy, evaluate, need_matrix, NeedMatrix};
pub use step::{step, SafetyStepper, StepReport, StepState, StepStatus};

pub use bankr_types::{DetectionResult, SystemState};
