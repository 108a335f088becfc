//! Summarizer trait - pluggable reduction for over-budget combinations.
//!
//! The `summary_if_exceeded` strategy is a known incomplete feature: the
//! shipped behavior is a one-time warning plus truncation. This trait is
//! the seam where a real summarization backend can be installed later
//! without changing the combiner's contract.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::chunk::Chunk;

/// Reduces a chunk set to at most `max_tokens` worth of text.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize the chunks' combined text down to the token budget.
    ///
    /// Called only when the full combination exceeds the budget under the
    /// `summary_if_exceeded` strategy. On error the combiner falls back
    /// to truncation rather than failing the dispatch.
    async fn summarize(&self, chunks: &[&Chunk], max_tokens: usize) -> Result<String>;
}
