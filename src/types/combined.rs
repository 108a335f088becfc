//! Combined content - the transient output of the chunk combiner.

use serde::{Deserialize, Serialize};

/// A single text blob assembled from one or more chunks.
///
/// Produced by the combiner, handed straight to the extractor, then
/// dropped. `chunk_ids` lists the chunks whose text actually made it in,
/// which is what extraction records cite for traceability - after
/// truncation it can be a strict prefix of the input set, or empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedContent {
    /// The combined text, chunks joined by blank lines.
    pub content: String,

    /// Ids of the chunks included in `content`, in document-flow order.
    pub chunk_ids: Vec<String>,

    /// Sum of `token_count` over the included chunks.
    pub total_tokens: usize,

    /// Whether any input chunk was left out to fit the token budget.
    pub truncated: bool,
}

impl CombinedContent {
    /// An empty combination (no input chunks).
    pub fn empty() -> Self {
        Self {
            content: String::new(),
            chunk_ids: Vec::new(),
            total_tokens: 0,
            truncated: false,
        }
    }

    /// Whether the combination carries any text.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Number of chunks included.
    pub fn chunk_count(&self) -> usize {
        self.chunk_ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let combined = CombinedContent::empty();
        assert!(combined.is_empty());
        assert_eq!(combined.total_tokens, 0);
        assert!(!combined.truncated);
    }
}
