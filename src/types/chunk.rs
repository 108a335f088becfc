//! Chunk types - the unit of input to the extraction engine.
//!
//! Chunks are produced by an upstream document adapter and consumed
//! read-only here. The adapter also computes `token_count` with its own
//! tokenizer; the engine trusts that value and never recomputes it.

use serde::{Deserialize, Serialize};

/// Positional metadata for a chunk within its source document.
///
/// Every field is optional. Poorly structured sources routinely produce
/// chunks with no chapter or section at all, and the hierarchy builder
/// treats that as a normal case, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkPosition {
    /// Chapter title this chunk was parsed under.
    pub chapter: Option<String>,

    /// Section title this chunk was parsed under.
    pub section: Option<String>,

    /// Page number in the source document.
    pub page: Option<u32>,

    /// Position of this chunk in the document's flat chunk sequence.
    ///
    /// Used by the combiner to restore document-flow order regardless
    /// of how a caller collected the chunks.
    pub chunk_index: Option<usize>,

    /// Full heading path down to this chunk, outermost first.
    #[serde(default)]
    pub headings: Vec<String>,
}

impl ChunkPosition {
    /// Create an empty position (no structure information).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chapter title.
    pub fn with_chapter(mut self, chapter: impl Into<String>) -> Self {
        self.chapter = Some(chapter.into());
        self
    }

    /// Set the section title.
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    /// Set the page number.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Set the flat-sequence index.
    pub fn with_chunk_index(mut self, index: usize) -> Self {
        self.chunk_index = Some(index);
        self
    }

    /// Set the heading path.
    pub fn with_headings(mut self, headings: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.headings = headings.into_iter().map(|h| h.into()).collect();
        self
    }
}

/// A fixed-size fragment of parsed document text.
///
/// Immutable once produced by the chunking adapter; the engine only ever
/// reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Adapter-assigned chunk identifier.
    pub id: String,

    /// Identifier of the source document this chunk came from.
    pub source_id: String,

    /// The chunk text.
    pub content: String,

    /// Where in the document this chunk came from, if known.
    pub position: Option<ChunkPosition>,

    /// Token count as computed by the upstream tokenizer.
    pub token_count: usize,
}

impl Chunk {
    /// Create a new chunk.
    pub fn new(
        id: impl Into<String>,
        source_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_id: source_id.into(),
            content: content.into(),
            position: None,
            token_count: 0,
        }
    }

    /// Attach positional metadata.
    pub fn with_position(mut self, position: ChunkPosition) -> Self {
        self.position = Some(position);
        self
    }

    /// Set the precomputed token count.
    pub fn with_token_count(mut self, token_count: usize) -> Self {
        self.token_count = token_count;
        self
    }

    /// Chapter title from position metadata, if any.
    pub fn chapter(&self) -> Option<&str> {
        self.position.as_ref()?.chapter.as_deref()
    }

    /// Section title from position metadata, if any.
    pub fn section(&self) -> Option<&str> {
        self.position.as_ref()?.section.as_deref()
    }

    /// Flat-sequence index from position metadata, if any.
    pub fn chunk_index(&self) -> Option<usize> {
        self.position.as_ref()?.chunk_index
    }
}
