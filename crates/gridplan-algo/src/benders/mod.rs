//! Benders decomposition of the planning problem.
//!
//! The master chooses capacities and investments and carries one cost
//! estimate per year; each year's subproblem operates the system with the
//! master's capacities as fixed bounds. Subproblem duals turn into
//! optimality cuts (the estimate was too low) or feasibility cuts (the
//! capacities cannot serve the year) until no cut is needed.
//!
//! ```text
//!   master ──capacities──► sub_y1 .. sub_yN
//!     ▲                          │
//!     └──── Cut_y<n>_iter<k> ◄───┘
//! ```

mod cut;
mod engine;
mod outcome;
mod resilience;

pub use cut::{needs_optimality_cut, CapacityLink, CapacityLinks, Cut, CutKind};
pub use engine::{assemble_solution, DecompositionEngine};
pub use outcome::{PlanSolution, ResilienceReport, Termination};
