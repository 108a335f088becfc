//! Typed errors for the extraction engine.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.
//!
//! Note what is deliberately *not* an error here: missing position metadata
//! routes a chunk to an uncategorized bucket, and a combination exceeding
//! its token budget surfaces as the `truncated` flag on the combined
//! content. Both are normal data conditions.

use thiserror::Error;

/// Errors that can occur during extraction operations.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The external extractor call failed for one (entity, type) pair.
    ///
    /// The orchestrator never propagates this variant out of a document
    /// run - it is captured as a failed record for that entity/type only.
    #[error("extractor error: {0}")]
    Extractor(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A pluggable summarizer failed to reduce over-budget content.
    #[error("summarizer error: {0}")]
    Summarizer(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// An extraction type was requested that no registry level declares.
    ///
    /// This indicates a programming/configuration defect rather than a
    /// data condition, so it is raised immediately at dispatch time.
    #[error("no extraction level registered for type: {extraction_type}")]
    UnknownExtractionType { extraction_type: String },

    /// Operation was cancelled.
    #[error("operation cancelled")]
    Cancelled,
}

impl ExtractionError {
    /// Wrap an arbitrary extractor failure.
    pub fn extractor(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Extractor(Box::new(err))
    }

    /// Wrap an extractor failure described only by a message.
    pub fn extractor_msg(msg: impl Into<String>) -> Self {
        Self::Extractor(msg.into().into())
    }
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;
