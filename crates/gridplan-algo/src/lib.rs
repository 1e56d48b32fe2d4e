//! # gridplan-algo: planning models and their solution
//!
//! Builds the constraint systems of a multi-year expansion plan from a
//! [`gridplan_core::Network`], solves them by Benders decomposition or as
//! one monolithic problem, scores the plan against contingency events and
//! writes the results.
//!
//! ```text
//! Network ──ModelBuilder──► PlanModels ──DecompositionEngine──► PlanSolution
//!                              │  ▲                                  │
//!                      save_dir│  │load_dir                 report::write_*
//! ```

pub mod benders;
pub mod error;
pub mod index;
pub mod model;
pub mod report;

pub use benders::{DecompositionEngine, PlanSolution, ResilienceReport, Termination};
pub use error::{EngineError, EngineResult};
pub use index::{IndexRegistry, SolutionIndex, VariableFamily};
pub use model::{EventTable, ModelBuilder, PlanModels};
