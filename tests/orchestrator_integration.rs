//! Integration tests for the hierarchical extraction orchestrator.
//!
//! These tests drive the full pipeline: flat chunks in, hierarchy built,
//! per-level combination, dispatch to a mock extractor, and the aggregated
//! record list plus manifest out.

use futures::StreamExt;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use hierarchical_extraction::{
    stable_node_id, Chunk, ChunkPosition, CombinationStrategy, Combiner, ExtractionError,
    ExtractionLevel, LevelConfig, LevelRegistry, MockExtractor, Orchestrator, OrchestratorConfig,
    RecordStatus, Summarizer,
};

/// Helper to create a positioned chunk.
fn chunk(
    id: &str,
    chapter: Option<&str>,
    section: Option<&str>,
    index: usize,
    tokens: usize,
) -> Chunk {
    let mut position = ChunkPosition::new().with_chunk_index(index);
    if let Some(c) = chapter {
        position = position.with_chapter(c);
    }
    if let Some(s) = section {
        position = position.with_section(s);
    }
    Chunk::new(id, "doc-1", format!("content of {id}"))
        .with_token_count(tokens)
        .with_position(position)
}

/// A 2-chapter document: chapter A has 5 sections, chapter B has 3, with
/// one loose chunk per chapter - 40 chunks total.
fn forty_chunk_document() -> Vec<Chunk> {
    fn push(chunks: &mut Vec<Chunk>, chapter: &str, section: Option<&str>) {
        let index = chunks.len();
        let id = format!("c{index:02}");
        chunks.push(chunk(&id, Some(chapter), section, index, 100));
    }

    let mut chunks = Vec::new();
    for s in 0..5 {
        let section = format!("A.{s}");
        for _ in 0..4 {
            push(&mut chunks, "A", Some(&section));
        }
    }
    push(&mut chunks, "A", None);

    for s in 0..3 {
        let section = format!("B.{s}");
        for _ in 0..6 {
            push(&mut chunks, "B", Some(&section));
        }
    }
    push(&mut chunks, "B", None);

    assert_eq!(chunks.len(), 40);
    chunks
}

#[tokio::test]
async fn test_dispatch_counts() {
    let orchestrator = Orchestrator::new(MockExtractor::new());
    let run = orchestrator
        .extract_document(forty_chunk_document(), "doc-1")
        .await
        .unwrap();

    let count = |level: ExtractionLevel, extraction_type: &str| {
        run.records
            .iter()
            .filter(|r| r.context_level == level && r.extraction_type == extraction_type)
            .count()
    };

    // 2 chapters, per chapter-scoped type.
    assert_eq!(count(ExtractionLevel::Chapter, "methodology"), 2);
    assert_eq!(count(ExtractionLevel::Chapter, "workflow"), 2);

    // 5 + 3 sections, per section-scoped type.
    for section_type in ["decision", "pattern", "checklist", "persona"] {
        assert_eq!(count(ExtractionLevel::Section, section_type), 8);
    }

    // Every one of the 40 chunks, for the chunk-scoped type.
    assert_eq!(count(ExtractionLevel::Chunk, "warning"), 40);

    assert_eq!(run.records.len(), 2 * 2 + 8 * 4 + 40);

    // The extractor saw exactly the same dispatches.
    let mock = orchestrator.extractor();
    assert_eq!(mock.call_count_at_level(ExtractionLevel::Chapter), 4);
    assert_eq!(mock.call_count_at_level(ExtractionLevel::Section), 32);
    assert_eq!(mock.call_count_at_level(ExtractionLevel::Chunk), 40);
}

#[tokio::test]
async fn test_record_order_is_pass_then_hierarchy_then_type() {
    let orchestrator = Orchestrator::new(MockExtractor::new());
    let run = orchestrator
        .extract_document(forty_chunk_document(), "doc-1")
        .await
        .unwrap();

    let levels: Vec<ExtractionLevel> = run.records.iter().map(|r| r.context_level).collect();

    // Chapter pass, then section pass, then chunk pass.
    assert!(levels[..4]
        .iter()
        .all(|l| *l == ExtractionLevel::Chapter));
    assert!(levels[4..36]
        .iter()
        .all(|l| *l == ExtractionLevel::Section));
    assert!(levels[36..].iter().all(|l| *l == ExtractionLevel::Chunk));

    // Within the chapter pass: chapter A's types, then chapter B's.
    let chapter_a = stable_node_id(&["doc-1", "chapter", "A"]);
    let chapter_b = stable_node_id(&["doc-1", "chapter", "B"]);
    let chapter_records: Vec<(&str, &str)> = run.records[..4]
        .iter()
        .map(|r| (r.context_id.as_str(), r.extraction_type.as_str()))
        .collect();
    assert_eq!(
        chapter_records,
        vec![
            (chapter_a.as_str(), "methodology"),
            (chapter_a.as_str(), "workflow"),
            (chapter_b.as_str(), "methodology"),
            (chapter_b.as_str(), "workflow"),
        ]
    );
}

#[tokio::test]
async fn test_deterministic_order_under_high_concurrency() {
    let config = OrchestratorConfig::new().with_concurrency(16);

    let first = Orchestrator::new(MockExtractor::new()).with_config(config.clone());
    let second = Orchestrator::new(MockExtractor::new()).with_config(config);

    let a = first
        .extract_document(forty_chunk_document(), "doc-1")
        .await
        .unwrap();
    let b = second
        .extract_document(forty_chunk_document(), "doc-1")
        .await
        .unwrap();

    let project = |run: &hierarchical_extraction::ExtractionRun| -> Vec<(ExtractionLevel, String, String)> {
        run.records
            .iter()
            .map(|r| {
                (
                    r.context_level,
                    r.context_id.clone(),
                    r.extraction_type.clone(),
                )
            })
            .collect()
    };
    assert_eq!(project(&a), project(&b));
}

#[tokio::test]
async fn test_partial_failure_isolates_one_dispatch() {
    let failing_section = stable_node_id(&["doc-1", "section", "A", "A.2"]);
    let mock = MockExtractor::new().with_failure(failing_section.clone(), "decision");

    let orchestrator = Orchestrator::new(mock);
    let run = orchestrator
        .extract_document(forty_chunk_document(), "doc-1")
        .await
        .unwrap();

    // Nothing was aborted: the full record set is present.
    assert_eq!(run.records.len(), 76);

    let failed: Vec<_> = run
        .records
        .iter()
        .filter(|r| r.status == RecordStatus::Failed)
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].context_id, failing_section);
    assert_eq!(failed[0].extraction_type, "decision");
    assert!(failed[0].payload.is_none());
    assert!(failed[0].error.as_deref().unwrap().contains("mock failure"));

    // The same section's other types still succeeded.
    let sibling_ok = run
        .records
        .iter()
        .filter(|r| r.context_id == failing_section && r.extraction_type != "decision")
        .all(|r| r.is_success());
    assert!(sibling_ok);

    assert_eq!(run.manifest.total_failed(), 1);
    assert_eq!(run.manifest.total_succeeded(), 75);
    assert!(!run.manifest.is_success());
}

#[tokio::test]
async fn test_uncategorized_chunks_only_get_chunk_pass() {
    // No chapter metadata at all: chapter- and section-scoped types never
    // see these chunks, even though their content might warrant it.
    let chunks = vec![
        Chunk::new("u0", "doc-1", "loose text").with_token_count(50),
        Chunk::new("u1", "doc-1", "more loose text").with_token_count(50),
    ];

    let orchestrator = Orchestrator::new(MockExtractor::new());
    let run = orchestrator.extract_document(chunks, "doc-1").await.unwrap();

    assert_eq!(run.records.len(), 2);
    assert!(run
        .records
        .iter()
        .all(|r| r.context_level == ExtractionLevel::Chunk));
    assert_eq!(run.manifest.chapters, 0);
    assert_eq!(run.manifest.sections, 0);
    assert_eq!(run.manifest.chunks, 2);
}

#[tokio::test]
async fn test_manifest_entries_cover_every_type() {
    let orchestrator = Orchestrator::new(MockExtractor::new());
    let run = orchestrator
        .extract_document(forty_chunk_document(), "doc-1")
        .await
        .unwrap();

    let manifest = &run.manifest;
    assert_eq!(manifest.chapters, 2);
    assert_eq!(manifest.sections, 8);
    assert_eq!(manifest.chunks, 40);
    assert_eq!(manifest.entries.len(), 7);

    let entry = |t: &str| manifest.entries.iter().find(|e| e.extraction_type == t).unwrap();
    assert_eq!(entry("methodology").succeeded, 2);
    assert_eq!(entry("persona").succeeded, 8);
    assert_eq!(entry("warning").succeeded, 40);
    assert!(manifest.is_success());
    assert!(manifest.finished_at >= manifest.started_at);
}

#[tokio::test]
async fn test_unknown_extraction_type_fails_before_any_dispatch() {
    let orchestrator = Orchestrator::new(MockExtractor::new()).with_config(
        OrchestratorConfig::new().with_extraction_types(["warning", "horoscope"]),
    );

    let err = orchestrator
        .extract_document(forty_chunk_document(), "doc-1")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ExtractionError::UnknownExtractionType { extraction_type } if extraction_type == "horoscope"
    ));

    // Validation happens before any extractor call.
    assert!(orchestrator.extractor().calls().is_empty());
}

#[tokio::test]
async fn test_allow_list_restricts_dispatch() {
    let orchestrator = Orchestrator::new(MockExtractor::new())
        .with_config(OrchestratorConfig::new().with_extraction_types(["warning"]));

    let run = orchestrator
        .extract_document(forty_chunk_document(), "doc-1")
        .await
        .unwrap();

    assert_eq!(run.records.len(), 40);
    assert!(run
        .records
        .iter()
        .all(|r| r.extraction_type == "warning"));
    assert_eq!(run.manifest.entries.len(), 1);
}

#[tokio::test]
async fn test_cancellation() {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let orchestrator = Orchestrator::new(MockExtractor::new());
    let err = orchestrator
        .extract_document_with_cancel(forty_chunk_document(), "doc-1", cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractionError::Cancelled));
}

#[tokio::test]
async fn test_stream_yields_same_order_as_aggregate() {
    let aggregate = Orchestrator::new(MockExtractor::new())
        .extract_document(forty_chunk_document(), "doc-1")
        .await
        .unwrap();

    let streaming = Orchestrator::new(MockExtractor::new());
    let streamed: Vec<_> = streaming
        .extract_stream(forty_chunk_document(), "doc-1")
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    let project = |records: &[hierarchical_extraction::ExtractionRecord]| -> Vec<(ExtractionLevel, String, String)> {
        records
            .iter()
            .map(|r| {
                (
                    r.context_level,
                    r.context_id.clone(),
                    r.extraction_type.clone(),
                )
            })
            .collect()
    };

    assert_eq!(project(&aggregate.records), project(&streamed));
}

#[tokio::test]
async fn test_truncation_reflected_in_record_chunk_ids() {
    // One section holding 3 x 2000 tokens: the 4000-token section budget
    // keeps only the first two; the 8000-token chapter budget keeps all.
    let chunks = vec![
        chunk("c0", Some("A"), Some("A.0"), 0, 2000),
        chunk("c1", Some("A"), Some("A.0"), 1, 2000),
        chunk("c2", Some("A"), Some("A.0"), 2, 2000),
    ];

    let orchestrator = Orchestrator::new(MockExtractor::new());
    let run = orchestrator.extract_document(chunks, "doc-1").await.unwrap();

    let section_record = run
        .records
        .iter()
        .find(|r| r.context_level == ExtractionLevel::Section)
        .unwrap();
    assert_eq!(section_record.chunk_ids, vec!["c0", "c1"]);

    let chapter_record = run
        .records
        .iter()
        .find(|r| r.context_level == ExtractionLevel::Chapter)
        .unwrap();
    assert_eq!(chapter_record.chunk_ids, vec!["c0", "c1", "c2"]);
}

#[tokio::test]
async fn test_oversized_single_chunk_dispatches_empty_text() {
    // A single 5000-token chunk cannot fit the 4000-token section budget,
    // so the section-level dispatch carries empty content and cites no
    // chunks - the accepted edge case, not an error.
    let chunks = vec![chunk("big", Some("A"), Some("A.0"), 0, 5000)];

    let mock = MockExtractor::new();
    let orchestrator = Orchestrator::new(mock);
    let run = orchestrator.extract_document(chunks, "doc-1").await.unwrap();

    let section_record = run
        .records
        .iter()
        .find(|r| r.context_level == ExtractionLevel::Section)
        .unwrap();
    assert!(section_record.chunk_ids.is_empty());
    assert!(section_record.is_success());
}

struct DigestSummarizer;

#[async_trait::async_trait]
impl Summarizer for DigestSummarizer {
    async fn summarize(
        &self,
        _chunks: &[&Chunk],
        _max_tokens: usize,
    ) -> hierarchical_extraction::Result<String> {
        Ok("digest".to_string())
    }
}

#[tokio::test]
async fn test_installed_summarizer_handles_oversized_chapters() {
    // Chapter pool of 3 x 3000 tokens exceeds the 8000-token chapter
    // budget; with a summarizer installed the chapter dispatch gets the
    // summary and still cites every pooled chunk.
    let chunks = vec![
        chunk("c0", Some("A"), Some("A.0"), 0, 3000),
        chunk("c1", Some("A"), Some("A.0"), 1, 3000),
        chunk("c2", Some("A"), Some("A.1"), 2, 3000),
    ];

    let orchestrator = Orchestrator::new(MockExtractor::new())
        .with_combiner(Combiner::new().with_summarizer(Arc::new(DigestSummarizer)));
    let run = orchestrator.extract_document(chunks, "doc-1").await.unwrap();

    let chapter_record = run
        .records
        .iter()
        .find(|r| r.context_level == ExtractionLevel::Chapter)
        .unwrap();
    assert_eq!(chapter_record.chunk_ids, vec!["c0", "c1", "c2"]);

    // The section pass is untouched: 3000 tokens fit the section budget.
    let section_records = run
        .records
        .iter()
        .filter(|r| r.context_level == ExtractionLevel::Section)
        .count();
    assert_eq!(section_records, 2 * 4);
}

#[tokio::test]
async fn test_custom_registry_drives_dispatch() {
    // A registry with only a chunk row runs only the chunk pass.
    let registry = LevelRegistry::empty().with_level(LevelConfig::new(
        ExtractionLevel::Chunk,
        ["warning"],
        512,
        CombinationStrategy::None,
    ));

    let orchestrator = Orchestrator::new(MockExtractor::new()).with_registry(registry);
    let run = orchestrator
        .extract_document(forty_chunk_document(), "doc-1")
        .await
        .unwrap();

    assert_eq!(run.records.len(), 40);
    assert!(run
        .records
        .iter()
        .all(|r| r.context_level == ExtractionLevel::Chunk));
}

#[tokio::test]
async fn test_scripted_payload_lands_in_record() {
    let mock = MockExtractor::new().with_response(
        "warning",
        json!({"warnings": [{"severity": "high", "text": "do not mix"}]}),
    );

    let orchestrator = Orchestrator::new(mock);
    let chunks = vec![Chunk::new("u0", "doc-1", "never mix the two").with_token_count(10)];
    let run = orchestrator.extract_document(chunks, "doc-1").await.unwrap();

    assert_eq!(run.records.len(), 1);
    let record = &run.records[0];
    assert_eq!(record.source_id, "doc-1");
    assert_eq!(record.context_id, "u0");
    assert_eq!(record.chunk_ids, vec!["u0"]);
    assert_eq!(
        record.payload.as_ref().unwrap()["warnings"][0]["severity"],
        "high"
    );
}
