//! Hierarchy types - chapters and sections reassembled from flat chunks.
//!
//! Node identities are derived, not random: `chapter_id` and `section_id`
//! are pure functions of `(source_id, kind, name[, chapter_name])`, so
//! rebuilding the hierarchy from the same chunk set always yields the same
//! ids. That makes re-ingestion idempotent with respect to stored records.
//!
//! Chapter and section maps are insertion-ordered (`IndexMap`), keyed by
//! name in first-seen order. Iteration order is therefore the document's
//! own order, which is what makes downstream dispatch deterministic.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::chunk::Chunk;

/// Length of the hex node ids derived from [`stable_node_id`].
const NODE_ID_LEN: usize = 16;

/// Derive a stable, order-independent node identity.
///
/// Hashes a length-delimited encoding of the parts so that
/// `("ab", "c")` and `("a", "bc")` can never collide.
pub fn stable_node_id(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    let mut id = format!("{:x}", hasher.finalize());
    id.truncate(NODE_ID_LEN);
    id
}

/// A section within a chapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionNode {
    /// Stable derived identity, scoped to `(source, chapter, section)`.
    pub section_id: String,

    /// Section title as it appeared in position metadata.
    pub section_name: String,

    /// Name of the owning chapter (back-reference, not ownership).
    pub chapter_name: String,

    /// Chunks categorized under this section, in arrival order.
    pub chunks: Vec<Chunk>,
}

impl SectionNode {
    /// Create an empty section under a chapter.
    pub fn new(
        source_id: &str,
        chapter_name: impl Into<String>,
        section_name: impl Into<String>,
    ) -> Self {
        let chapter_name = chapter_name.into();
        let section_name = section_name.into();
        // Scope the id to chapter:section so identical section names under
        // different chapters never collide.
        let section_id = stable_node_id(&[source_id, "section", &chapter_name, &section_name]);

        Self {
            section_id,
            section_name,
            chapter_name,
            chunks: Vec::new(),
        }
    }

    /// Number of chunks in this section.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

/// A chapter with its sections and directly-attached chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterNode {
    /// Stable derived identity, scoped to `(source, chapter)`.
    pub chapter_id: String,

    /// Chapter title as it appeared in position metadata.
    pub chapter_name: String,

    /// Sections keyed by name, in first-seen order.
    pub sections: IndexMap<String, SectionNode>,

    /// Chunks with a chapter but no section, in arrival order.
    pub uncategorized_chunks: Vec<Chunk>,
}

impl ChapterNode {
    /// Create an empty chapter.
    pub fn new(source_id: &str, chapter_name: impl Into<String>) -> Self {
        let chapter_name = chapter_name.into();
        let chapter_id = stable_node_id(&[source_id, "chapter", &chapter_name]);

        Self {
            chapter_id,
            chapter_name,
            sections: IndexMap::new(),
            uncategorized_chunks: Vec::new(),
        }
    }

    /// All chunks under this chapter: its own uncategorized chunks, then
    /// every section's chunks in section order.
    ///
    /// This is the pool the chapter-level combiner runs over.
    pub fn pooled_chunks(&self) -> Vec<&Chunk> {
        let mut pooled: Vec<&Chunk> = self.uncategorized_chunks.iter().collect();
        for section in self.sections.values() {
            pooled.extend(section.chunks.iter());
        }
        pooled
    }

    /// Total chunks under this chapter (uncategorized + all sections).
    pub fn chunk_count(&self) -> usize {
        self.uncategorized_chunks.len()
            + self.sections.values().map(SectionNode::chunk_count).sum::<usize>()
    }

    /// Number of sections in this chapter.
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }
}

/// The reassembled chapter -> section -> chunk view of one source document.
///
/// Built fresh for each extraction pass and discarded afterwards; it is
/// never mutated incrementally across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentHierarchy {
    /// Identifier of the source document.
    pub source_id: String,

    /// Chapters keyed by name, in first-seen order.
    pub chapters: IndexMap<String, ChapterNode>,

    /// Chunks with no chapter metadata at all, in arrival order.
    ///
    /// These participate only in chunk-level extraction - they are never
    /// eligible for chapter- or section-scoped extraction types. This is
    /// an accepted gap for sources with poor structure metadata, carried
    /// through deliberately rather than papered over with a synthetic
    /// catch-all chapter.
    pub uncategorized_chunks: Vec<Chunk>,
}

impl DocumentHierarchy {
    /// Create an empty hierarchy for a source document.
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            chapters: IndexMap::new(),
            uncategorized_chunks: Vec::new(),
        }
    }

    /// Every chunk in the document in deterministic traversal order:
    /// chapters in first-seen order (chapter-level uncategorized chunks,
    /// then each section's chunks), then top-level uncategorized chunks.
    pub fn all_chunks(&self) -> Vec<&Chunk> {
        let mut chunks = Vec::with_capacity(self.total_chunks());
        for chapter in self.chapters.values() {
            chunks.extend(chapter.pooled_chunks());
        }
        chunks.extend(self.uncategorized_chunks.iter());
        chunks
    }

    /// Total number of chunks across all buckets.
    pub fn total_chunks(&self) -> usize {
        self.uncategorized_chunks.len()
            + self.chapters.values().map(ChapterNode::chunk_count).sum::<usize>()
    }

    /// Number of chapters.
    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    /// Number of sections across all chapters.
    pub fn section_count(&self) -> usize {
        self.chapters.values().map(ChapterNode::section_count).sum()
    }

    /// Iterate sections across all chapters in deterministic order.
    pub fn sections(&self) -> impl Iterator<Item = &SectionNode> {
        self.chapters.values().flat_map(|c| c.sections.values())
    }
}
