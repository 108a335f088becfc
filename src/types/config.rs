//! Configuration for the extraction orchestrator.

use serde::{Deserialize, Serialize};

/// Configuration for a document extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum extractor calls in flight at once.
    ///
    /// Extraction dispatches are mutually independent, so they fan out
    /// through a bounded worker pool; the bound exists to respect the
    /// external extractor's rate limits. Default: 5.
    pub concurrency: usize,

    /// Optional allow-list of extraction types to run.
    ///
    /// `None` runs every type the registry declares. Each listed type is
    /// validated against the registry before the run starts; an unknown
    /// type fails the run immediately.
    pub extraction_types: Option<Vec<String>>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            extraction_types: None,
        }
    }
}

impl OrchestratorConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker-pool bound.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Restrict the run to specific extraction types.
    pub fn with_extraction_types(
        mut self,
        types: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.extraction_types = Some(types.into_iter().map(|t| t.into()).collect());
        self
    }

    /// Whether an extraction type passes the allow-list.
    pub fn allows(&self, extraction_type: &str) -> bool {
        match &self.extraction_types {
            None => true,
            Some(types) => types.iter().any(|t| t == extraction_type),
        }
    }
}
