//! Extraction pipeline - the core of the engine.
//!
//! The pipeline orchestrates:
//! - Hierarchy construction (flat chunks -> chapters/sections)
//! - Chunk combination under per-level token budgets
//! - Extraction dispatch per (entity, extraction type) pair
//! - Deterministic aggregation with a run manifest

pub mod combine;
pub mod hierarchy;
pub mod orchestrator;

pub use combine::{combine_chunks, Combiner};
pub use hierarchy::build_hierarchy;
pub use orchestrator::Orchestrator;
