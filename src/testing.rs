//! Testing utilities including a mock extractor.
//!
//! Useful for testing applications that drive the orchestrator without
//! making real LLM calls.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::error::{ExtractionError, Result};
use crate::traits::extractor::{ExtractionContext, Extractor};
use crate::types::level::ExtractionLevel;

/// Record of a call made to the mock extractor.
#[derive(Debug, Clone)]
pub struct ExtractorCall {
    /// Extraction type that was requested.
    pub extraction_type: String,

    /// Hierarchy level of the dispatch.
    pub level: ExtractionLevel,

    /// Entity id of the dispatch.
    pub context_id: String,

    /// Chunk ids cited by the dispatch.
    pub chunk_ids: Vec<String>,

    /// Length of the text handed over.
    pub text_len: usize,
}

/// A mock extractor with scripted responses and failure injection.
///
/// Returns a deterministic default payload unless a response is scripted
/// for the extraction type. Records every call for dispatch-count
/// assertions.
#[derive(Default)]
pub struct MockExtractor {
    /// Scripted payloads by extraction type.
    responses: Arc<RwLock<HashMap<String, Value>>>,

    /// (context_id, extraction_type) pairs that fail.
    failures: Arc<RwLock<HashSet<(String, String)>>>,

    /// Extraction types that always fail.
    failing_types: Arc<RwLock<HashSet<String>>>,

    /// Call tracking for assertions.
    calls: Arc<RwLock<Vec<ExtractorCall>>>,
}

impl MockExtractor {
    /// Create a mock extractor with default behavior.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a payload for an extraction type.
    pub fn with_response(self, extraction_type: impl Into<String>, payload: Value) -> Self {
        self.responses
            .write()
            .unwrap()
            .insert(extraction_type.into(), payload);
        self
    }

    /// Fail calls for one (entity, extraction type) pair.
    pub fn with_failure(
        self,
        context_id: impl Into<String>,
        extraction_type: impl Into<String>,
    ) -> Self {
        self.failures
            .write()
            .unwrap()
            .insert((context_id.into(), extraction_type.into()));
        self
    }

    /// Fail every call for an extraction type.
    pub fn with_failing_type(self, extraction_type: impl Into<String>) -> Self {
        self.failing_types
            .write()
            .unwrap()
            .insert(extraction_type.into());
        self
    }

    /// All calls made to this mock, in call order.
    pub fn calls(&self) -> Vec<ExtractorCall> {
        self.calls.read().unwrap().clone()
    }

    /// Number of calls made for one extraction type.
    pub fn call_count_for_type(&self, extraction_type: &str) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|c| c.extraction_type == extraction_type)
            .count()
    }

    /// Number of calls made at one level.
    pub fn call_count_at_level(&self, level: ExtractionLevel) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|c| c.level == level)
            .count()
    }

    /// Clear call history.
    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }
}

#[async_trait]
impl Extractor for MockExtractor {
    async fn extract(
        &self,
        text: &str,
        extraction_type: &str,
        context: &ExtractionContext,
    ) -> Result<Value> {
        self.calls.write().unwrap().push(ExtractorCall {
            extraction_type: extraction_type.to_string(),
            level: context.level,
            context_id: context.context_id.clone(),
            chunk_ids: context.chunk_ids.clone(),
            text_len: text.len(),
        });

        let type_fails = self
            .failing_types
            .read()
            .unwrap()
            .contains(extraction_type);
        let pair_fails = self.failures.read().unwrap().contains(&(
            context.context_id.clone(),
            extraction_type.to_string(),
        ));
        if type_fails || pair_fails {
            return Err(ExtractionError::extractor_msg(format!(
                "mock failure for {extraction_type} on {}",
                context.context_id
            )));
        }

        if let Some(payload) = self.responses.read().unwrap().get(extraction_type) {
            return Ok(payload.clone());
        }

        Ok(json!({
            "extraction_type": extraction_type,
            "context_id": context.context_id,
            "characters": text.len(),
        }))
    }
}
