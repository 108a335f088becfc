//! Hierarchical extraction orchestrator.
//!
//! Walks a document hierarchy level by level - chapters, then sections,
//! then individual chunks - combining text under each level's budget and
//! dispatching one extractor call per (entity, extraction type) pair.
//!
//! Dispatches are mutually independent, so they fan out through a bounded
//! worker pool. The plan is laid out in deterministic order before any
//! call starts, and `join_all` returns results in plan order, so the
//! aggregate record list never depends on completion timing.
//!
//! One extractor failure becomes one failed record; it never aborts the
//! rest of the document. A run's terminal state is therefore a manifest
//! with per-(level, type) success/failure tallies, where partial success
//! is normal.

use async_stream::stream;
use chrono::Utc;
use futures::future::join_all;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ExtractionError, Result};
use crate::pipeline::combine::Combiner;
use crate::pipeline::hierarchy::build_hierarchy;
use crate::traits::extractor::{ExtractionContext, Extractor};
use crate::types::chunk::Chunk;
use crate::types::config::OrchestratorConfig;
use crate::types::hierarchy::DocumentHierarchy;
use crate::types::level::{ExtractionLevel, LevelRegistry};
use crate::types::record::{
    ExtractionRecord, ExtractionRun, ManifestEntry, RecordStatus, RunManifest,
};

/// One planned (entity, extraction type) dispatch.
struct PlannedDispatch {
    source_id: String,
    level: ExtractionLevel,
    context_id: String,
    extraction_type: String,
    text: String,
    chunk_ids: Vec<String>,
}

/// The hierarchical extraction orchestrator.
///
/// # Example
///
/// ```rust,ignore
/// let orchestrator = Orchestrator::new(extractor);
/// let run = orchestrator.extract_document(chunks, "doc-1").await?;
///
/// for record in &run.records {
///     store.persist(record).await?;
/// }
/// println!("{} ok, {} failed", run.manifest.total_succeeded(), run.manifest.total_failed());
/// ```
pub struct Orchestrator<E: Extractor> {
    extractor: E,
    registry: LevelRegistry,
    combiner: Combiner,
    config: OrchestratorConfig,
}

impl<E: Extractor> Orchestrator<E> {
    /// Create an orchestrator with the standard level registry.
    pub fn new(extractor: E) -> Self {
        Self {
            extractor,
            registry: LevelRegistry::default(),
            combiner: Combiner::new(),
            config: OrchestratorConfig::default(),
        }
    }

    /// Replace the level registry.
    pub fn with_registry(mut self, registry: LevelRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the combiner (e.g. to install a summarizer).
    pub fn with_combiner(mut self, combiner: Combiner) -> Self {
        self.combiner = combiner;
        self
    }

    /// Replace the run configuration.
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Get a reference to the level registry.
    pub fn registry(&self) -> &LevelRegistry {
        &self.registry
    }

    /// Get a reference to the extractor.
    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// Run the full hierarchical extraction over one document's chunks.
    ///
    /// Records come back in deterministic order: the chapter pass, then
    /// the section pass, then the chunk pass; within each pass, hierarchy
    /// insertion order crossed with registry type order.
    pub async fn extract_document(
        &self,
        chunks: Vec<Chunk>,
        source_id: &str,
    ) -> Result<ExtractionRun> {
        self.validate_requested_types()?;

        let started_at = Utc::now();
        let hierarchy = build_hierarchy(chunks, source_id);
        info!(
            source_id = %source_id,
            chapters = hierarchy.chapter_count(),
            sections = hierarchy.section_count(),
            chunks = hierarchy.total_chunks(),
            "Starting document extraction"
        );

        let plan = self.plan_dispatches(&hierarchy).await;
        let planned = plan.len();

        // Fan out through a bounded pool; join_all preserves plan order,
        // so completion timing never reaches the aggregate.
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let records: Vec<ExtractionRecord> = join_all(plan.into_iter().map(|dispatch| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                let _permit = semaphore.acquire().await.unwrap();
                self.dispatch(dispatch).await
            }
        }))
        .await;

        let manifest = self.build_manifest(&hierarchy, &records, started_at);
        info!(
            source_id = %source_id,
            dispatched = planned,
            succeeded = manifest.total_succeeded(),
            failed = manifest.total_failed(),
            "Document extraction complete"
        );

        Ok(ExtractionRun { records, manifest })
    }

    /// Run the extraction with cooperative cancellation.
    ///
    /// No rollback is needed on cancellation: the hierarchy and combined
    /// content are transient, and no record has been handed downstream.
    pub async fn extract_document_with_cancel(
        &self,
        chunks: Vec<Chunk>,
        source_id: &str,
        cancel: CancellationToken,
    ) -> Result<ExtractionRun> {
        tokio::select! {
            result = self.extract_document(chunks, source_id) => result,
            _ = cancel.cancelled() => Err(ExtractionError::Cancelled),
        }
    }

    /// Stream records one at a time in deterministic order.
    ///
    /// Processes dispatches sequentially - for callers that want each
    /// record as it lands rather than the aggregated run. The order is
    /// identical to [`extract_document`](Self::extract_document).
    pub fn extract_stream(
        &self,
        chunks: Vec<Chunk>,
        source_id: &str,
    ) -> Pin<Box<dyn Stream<Item = Result<ExtractionRecord>> + Send + '_>> {
        let source_id = source_id.to_string();
        Box::pin(stream! {
            if let Err(e) = self.validate_requested_types() {
                yield Err(e);
                return;
            }

            let hierarchy = build_hierarchy(chunks, &source_id);
            let plan = self.plan_dispatches(&hierarchy).await;

            for dispatch in plan {
                yield Ok(self.dispatch(dispatch).await);
            }
        })
    }

    // =========================================================================
    // Planning
    // =========================================================================

    /// Fail fast on allow-listed types the registry does not know.
    fn validate_requested_types(&self) -> Result<()> {
        if let Some(types) = &self.config.extraction_types {
            for extraction_type in types {
                self.registry.level_for_type(extraction_type)?;
            }
        }
        Ok(())
    }

    /// Lay out every dispatch for the document in deterministic order.
    async fn plan_dispatches(&self, hierarchy: &DocumentHierarchy) -> Vec<PlannedDispatch> {
        let mut plan = Vec::new();

        // Chapter pass: pool each chapter's own loose chunks plus every
        // section's chunks, combined under the chapter budget.
        if let Some(config) = self.registry.config_for(ExtractionLevel::Chapter) {
            for chapter in hierarchy.chapters.values() {
                let pooled = chapter.pooled_chunks();
                let combined = self
                    .combiner
                    .combine(&pooled, config.max_tokens, config.strategy)
                    .await;
                debug!(
                    chapter = %chapter.chapter_name,
                    included = combined.chunk_count(),
                    pooled = pooled.len(),
                    truncated = combined.truncated,
                    "Combined chapter content"
                );

                for extraction_type in &config.extraction_types {
                    if !self.config.allows(extraction_type) {
                        continue;
                    }
                    plan.push(PlannedDispatch {
                        source_id: hierarchy.source_id.clone(),
                        level: ExtractionLevel::Chapter,
                        context_id: chapter.chapter_id.clone(),
                        extraction_type: extraction_type.clone(),
                        text: combined.content.clone(),
                        chunk_ids: combined.chunk_ids.clone(),
                    });
                }
            }
        }

        // Section pass: each section's own chunks under the section budget.
        if let Some(config) = self.registry.config_for(ExtractionLevel::Section) {
            for section in hierarchy.sections() {
                let chunks: Vec<&Chunk> = section.chunks.iter().collect();
                let combined = self
                    .combiner
                    .combine(&chunks, config.max_tokens, config.strategy)
                    .await;

                for extraction_type in &config.extraction_types {
                    if !self.config.allows(extraction_type) {
                        continue;
                    }
                    plan.push(PlannedDispatch {
                        source_id: hierarchy.source_id.clone(),
                        level: ExtractionLevel::Section,
                        context_id: section.section_id.clone(),
                        extraction_type: extraction_type.clone(),
                        text: combined.content.clone(),
                        chunk_ids: combined.chunk_ids.clone(),
                    });
                }
            }
        }

        // Chunk pass: every chunk in the document on its own, no
        // combination. This is the only pass top-level uncategorized
        // chunks participate in.
        if let Some(config) = self.registry.config_for(ExtractionLevel::Chunk) {
            for chunk in hierarchy.all_chunks() {
                for extraction_type in &config.extraction_types {
                    if !self.config.allows(extraction_type) {
                        continue;
                    }
                    plan.push(PlannedDispatch {
                        source_id: hierarchy.source_id.clone(),
                        level: ExtractionLevel::Chunk,
                        context_id: chunk.id.clone(),
                        extraction_type: extraction_type.clone(),
                        text: chunk.content.clone(),
                        chunk_ids: vec![chunk.id.clone()],
                    });
                }
            }
        }

        plan
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Run one extractor call and capture its outcome as a record.
    async fn dispatch(&self, dispatch: PlannedDispatch) -> ExtractionRecord {
        let context = ExtractionContext {
            source_id: dispatch.source_id.clone(),
            level: dispatch.level,
            context_id: dispatch.context_id.clone(),
            chunk_ids: dispatch.chunk_ids.clone(),
        };

        let outcome = self
            .extractor
            .extract(&dispatch.text, &dispatch.extraction_type, &context)
            .await;

        let (status, payload, error) = match outcome {
            Ok(payload) => (RecordStatus::Success, Some(payload), None),
            Err(e) => {
                warn!(
                    level = %dispatch.level,
                    context_id = %dispatch.context_id,
                    extraction_type = %dispatch.extraction_type,
                    error = %e,
                    "Extractor call failed; recording and continuing"
                );
                (RecordStatus::Failed, None, Some(e.to_string()))
            }
        };

        ExtractionRecord {
            id: Uuid::new_v4(),
            source_id: dispatch.source_id,
            context_level: dispatch.level,
            context_id: dispatch.context_id,
            chunk_ids: dispatch.chunk_ids,
            extraction_type: dispatch.extraction_type,
            status,
            payload,
            error,
            extracted_at: Utc::now(),
        }
    }

    // =========================================================================
    // Aggregation
    // =========================================================================

    /// Tally records per (level, type) in registry order.
    fn build_manifest(
        &self,
        hierarchy: &DocumentHierarchy,
        records: &[ExtractionRecord],
        started_at: chrono::DateTime<Utc>,
    ) -> RunManifest {
        let mut entries = Vec::new();

        for config in self.registry.levels() {
            for extraction_type in &config.extraction_types {
                if !self.config.allows(extraction_type) {
                    continue;
                }

                let mut succeeded = 0;
                let mut failed = 0;
                for record in records {
                    if record.context_level == config.level
                        && record.extraction_type == *extraction_type
                    {
                        match record.status {
                            RecordStatus::Success => succeeded += 1,
                            RecordStatus::Failed => failed += 1,
                        }
                    }
                }

                entries.push(ManifestEntry {
                    level: config.level,
                    extraction_type: extraction_type.clone(),
                    succeeded,
                    failed,
                });
            }
        }

        RunManifest {
            source_id: hierarchy.source_id.clone(),
            chapters: hierarchy.chapter_count(),
            sections: hierarchy.section_count(),
            chunks: hierarchy.total_chunks(),
            entries,
            started_at,
            finished_at: Utc::now(),
        }
    }
}
