//! Extractor trait - the external knowledge-extraction collaborator.
//!
//! The contract is deliberately narrow: text in, structured payload or
//! explicit failure out. Implementations wrap specific LLM providers and
//! own their prompting, parsing, retries, and timeouts; the engine's only
//! responsibility is to hand over correctly-sized text and to isolate
//! failures per (entity, extraction type) pair.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::types::level::ExtractionLevel;

/// Traceability context handed to the extractor alongside the text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionContext {
    /// Source document the text was drawn from.
    pub source_id: String,

    /// Hierarchy level the text was combined at.
    pub level: ExtractionLevel,

    /// Id of the hierarchy entity (chapter id, section id, or chunk id).
    pub context_id: String,

    /// Ids of the chunks included in the text.
    pub chunk_ids: Vec<String>,
}

/// External extractor turning combined text into structured knowledge.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extract one kind of knowledge from the given text.
    ///
    /// The returned payload is opaque to the engine: it is tagged with the
    /// context and handed downstream without inspection of its fields.
    async fn extract(
        &self,
        text: &str,
        extraction_type: &str,
        context: &ExtractionContext,
    ) -> Result<Value>;
}
