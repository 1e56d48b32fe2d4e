//! Core data model for multi-year energy network expansion planning.
//!
//! A study is a set of [`Arc`]s (generation, conversion, transmission,
//! storage and transport links) and [`Node`]s (demand points), each
//! parameterized per [`Step`] of a hierarchical [`Horizon`]. Arcs and nodes
//! describe their share of the planning LP as MPS-style [`records`]; the
//! solver and algorithm crates assemble those records into constraint
//! systems.

pub mod arc;
pub mod code;
pub mod config;
pub mod error;
pub mod network;
pub mod node;
pub mod records;
pub mod step;

pub use arc::{Arc, ArcAttribute, CapacityPart, ReserveService};
pub use code::NodeCode;
pub use config::{
    AggregateLoad, DecompositionConfig, EventSpec, HorizonConfig, ModelContext, PlanConfig,
    ReserveCalibration, ResponseSpeed,
};
pub use error::{GridplanError, GridplanResult};
pub use network::{Adjustment, AdjustmentTarget, ArcRecord, Network, NetworkDocument, NodeRecord};
pub use node::{MarginKind, Node, NodeAttribute};
pub use records::{BoundEntry, BoundKind, Entry, RhsEntry, RowDecl, RowSense, OBJECTIVE_ROW};
pub use step::{Horizon, Level, Step};
