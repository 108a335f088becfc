//! Hierarchical Document Knowledge Extraction Engine
//!
//! Different kinds of knowledge span very different amounts of text: a
//! warning is a paragraph, a methodology is a chapter. This engine takes
//! the flat chunk stream a document parser produces and runs extraction
//! at the right granularity for each target:
//!
//! - reassembles chunks into a chapter -> section -> chunk hierarchy
//!   from their position metadata,
//! - combines each entity's chunks into one text blob under the level's
//!   token budget, and
//! - dispatches one extractor call per (entity, extraction type) pair,
//!   tagging every record with its hierarchy context for traceability.
//!
//! The engine does not parse files, call any language model, or store
//! anything. Parsing happens upstream; the LLM sits behind the
//! [`Extractor`] trait; the returned records go to whatever store the
//! caller uses.
//!
//! # Usage
//!
//! ```rust,ignore
//! use hierarchical_extraction::{Orchestrator, OrchestratorConfig};
//!
//! let orchestrator = Orchestrator::new(my_extractor)
//!     .with_config(OrchestratorConfig::new().with_concurrency(8));
//!
//! let run = orchestrator.extract_document(chunks, "handbook-2024").await?;
//! println!(
//!     "{} records, {} failed",
//!     run.records.len(),
//!     run.manifest.total_failed()
//! );
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Collaborator abstractions (Extractor, Summarizer)
//! - [`types`] - Chunks, hierarchy nodes, levels, records
//! - [`pipeline`] - Hierarchy builder, combiner, orchestrator
//! - [`testing`] - Mock extractor for driving the pipeline in tests

pub mod error;
pub mod pipeline;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{ExtractionError, Result};
pub use traits::{
    extractor::{ExtractionContext, Extractor},
    summarizer::Summarizer,
};
pub use types::{
    chunk::{Chunk, ChunkPosition},
    combined::CombinedContent,
    config::OrchestratorConfig,
    hierarchy::{stable_node_id, ChapterNode, DocumentHierarchy, SectionNode},
    level::{CombinationStrategy, ExtractionLevel, LevelConfig, LevelRegistry},
    record::{ExtractionRecord, ExtractionRun, ManifestEntry, RecordStatus, RunManifest},
};

// Re-export pipeline components
pub use pipeline::{build_hierarchy, combine_chunks, Combiner, Orchestrator};

// Re-export testing utilities
pub use testing::{ExtractorCall, MockExtractor};
