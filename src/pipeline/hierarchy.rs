//! Hierarchy builder - reassemble flat chunks into chapters and sections.
//!
//! A single O(n) pass over the chunks in the order supplied. Original
//! document order is preserved; nothing is sorted by content. Missing or
//! partial position metadata routes a chunk to the nearest uncategorized
//! bucket - no chunk ever triggers an error, and no chunk is dropped.

use tracing::debug;

use crate::types::chunk::Chunk;
use crate::types::hierarchy::{ChapterNode, DocumentHierarchy, SectionNode};

/// Group chunks into a chapter -> section -> chunk hierarchy.
///
/// Routing per chunk:
/// - no chapter metadata: top-level uncategorized bucket
/// - chapter only: that chapter's uncategorized bucket
/// - chapter and section: that section's chunk list
///
/// Chapters and sections are created on first sight with stable derived
/// ids, so rebuilding from the same chunk set yields identical identities.
pub fn build_hierarchy(chunks: Vec<Chunk>, source_id: &str) -> DocumentHierarchy {
    let mut hierarchy = DocumentHierarchy::new(source_id);

    for chunk in chunks {
        let chapter_name = chunk.chapter().map(str::to_string);
        let section_name = chunk.section().map(str::to_string);

        let Some(chapter_name) = chapter_name else {
            hierarchy.uncategorized_chunks.push(chunk);
            continue;
        };

        let chapter = hierarchy
            .chapters
            .entry(chapter_name.clone())
            .or_insert_with(|| ChapterNode::new(source_id, chapter_name.as_str()));

        let Some(section_name) = section_name else {
            chapter.uncategorized_chunks.push(chunk);
            continue;
        };

        let section = chapter
            .sections
            .entry(section_name.clone())
            .or_insert_with(|| {
                SectionNode::new(source_id, chapter_name.as_str(), section_name.as_str())
            });
        section.chunks.push(chunk);
    }

    debug!(
        source_id = %hierarchy.source_id,
        chapters = hierarchy.chapter_count(),
        sections = hierarchy.section_count(),
        chunks = hierarchy.total_chunks(),
        uncategorized = hierarchy.uncategorized_chunks.len(),
        "Built document hierarchy"
    );

    hierarchy
}
