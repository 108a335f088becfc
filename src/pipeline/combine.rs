//! Chunk combiner - assemble chunks into one budgeted text blob.
//!
//! Combination is pure and synchronous: sort into document-flow order,
//! join, and apply the level's budget policy. The only async path is the
//! optional pluggable [`Summarizer`], which exists so real summarization
//! can replace the `summary_if_exceeded` fallback later without changing
//! this contract.

use std::sync::{Arc, Once};
use tracing::warn;

use crate::traits::summarizer::Summarizer;
use crate::types::chunk::Chunk;
use crate::types::combined::CombinedContent;
use crate::types::level::CombinationStrategy;

/// Separator between chunk contents in a combination.
const CHUNK_SEPARATOR: &str = "\n\n";

static SUMMARY_FALLBACK_WARNING: Once = Once::new();

/// Combine chunks into a single text blob under a token budget.
///
/// Chunks are stable-sorted by `chunk_index` ascending; chunks without an
/// index keep their relative input order and sort after indexed ones.
/// Token counts are the upstream tokenizer's, summed and trusted as-is.
///
/// Budget policy:
/// - [`CombinationStrategy::None`], or a total within budget: the full
///   combination, `truncated = false`.
/// - [`CombinationStrategy::Truncate`]: the longest document-order prefix
///   that fits. A first chunk that alone exceeds the budget is excluded
///   too, which can legitimately yield an empty combination with
///   `truncated = true`.
/// - [`CombinationStrategy::SummaryIfExceeded`]: not implemented as
///   summarization here; warns once per process and truncates. Install a
///   [`Summarizer`] on a [`Combiner`] to change that.
pub fn combine_chunks(
    chunks: &[&Chunk],
    max_tokens: usize,
    strategy: CombinationStrategy,
) -> CombinedContent {
    if chunks.is_empty() {
        return CombinedContent::empty();
    }

    let ordered = sort_by_document_flow(chunks);
    let total_tokens: usize = ordered.iter().map(|c| c.token_count).sum();

    if strategy == CombinationStrategy::None || total_tokens <= max_tokens {
        return full_combination(&ordered, total_tokens);
    }

    if strategy == CombinationStrategy::SummaryIfExceeded {
        SUMMARY_FALLBACK_WARNING.call_once(|| {
            warn!(
                "summary_if_exceeded strategy has no summarizer installed; \
                 falling back to truncation"
            );
        });
    }

    truncate_to_budget(&ordered, max_tokens)
}

/// Stable-sort chunk refs by `chunk_index`, indexless chunks last.
fn sort_by_document_flow<'a>(chunks: &[&'a Chunk]) -> Vec<&'a Chunk> {
    let mut ordered = chunks.to_vec();
    ordered.sort_by_key(|c| c.chunk_index().unwrap_or(usize::MAX));
    ordered
}

fn full_combination(ordered: &[&Chunk], total_tokens: usize) -> CombinedContent {
    CombinedContent {
        content: join_contents(ordered),
        chunk_ids: ordered.iter().map(|c| c.id.clone()).collect(),
        total_tokens,
        truncated: false,
    }
}

/// Greedy prefix walk: stop at the first chunk that would exceed the budget.
fn truncate_to_budget(ordered: &[&Chunk], max_tokens: usize) -> CombinedContent {
    let mut included: Vec<&Chunk> = Vec::new();
    let mut used_tokens = 0usize;

    for &chunk in ordered {
        if used_tokens + chunk.token_count > max_tokens {
            break;
        }
        used_tokens += chunk.token_count;
        included.push(chunk);
    }

    CombinedContent {
        content: join_contents(&included),
        chunk_ids: included.iter().map(|c| c.id.clone()).collect(),
        total_tokens: used_tokens,
        truncated: included.len() < ordered.len(),
    }
}

fn join_contents(chunks: &[&Chunk]) -> String {
    chunks
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join(CHUNK_SEPARATOR)
}

/// Combiner with an optional pluggable summarizer.
///
/// Without a summarizer this is a thin async wrapper over
/// [`combine_chunks`]. With one installed, an over-budget combination
/// under [`CombinationStrategy::SummaryIfExceeded`] is summarized instead
/// of truncated: the result cites every input chunk and is flagged
/// `truncated = true` since the full text did not fit verbatim. If the
/// summarizer itself fails, the combiner falls back to truncation rather
/// than failing the dispatch.
#[derive(Clone, Default)]
pub struct Combiner {
    summarizer: Option<Arc<dyn Summarizer>>,
}

impl Combiner {
    /// Create a combiner with no summarizer (fallback behavior).
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a summarizer for the `summary_if_exceeded` strategy.
    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Combine chunks under a token budget.
    pub async fn combine(
        &self,
        chunks: &[&Chunk],
        max_tokens: usize,
        strategy: CombinationStrategy,
    ) -> CombinedContent {
        if strategy == CombinationStrategy::SummaryIfExceeded {
            if let Some(summarizer) = &self.summarizer {
                let ordered = sort_by_document_flow(chunks);
                let total_tokens: usize = ordered.iter().map(|c| c.token_count).sum();

                if !ordered.is_empty() && total_tokens > max_tokens {
                    match summarizer.summarize(&ordered, max_tokens).await {
                        Ok(summary) => {
                            return CombinedContent {
                                content: summary,
                                chunk_ids: ordered.iter().map(|c| c.id.clone()).collect(),
                                total_tokens,
                                truncated: true,
                            };
                        }
                        Err(e) => {
                            warn!(error = %e, "Summarizer failed; falling back to truncation");
                            return truncate_to_budget(&ordered, max_tokens);
                        }
                    }
                }
            }
        }

        combine_chunks(chunks, max_tokens, strategy)
    }
}
