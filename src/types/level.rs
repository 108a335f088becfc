//! Extraction levels and the level registry.
//!
//! The registry is configuration-as-data: an insertion-ordered map from
//! level to `(extraction types, token budget, combination strategy)`.
//! Neither the combiner nor the orchestrator branches on level names, so
//! adding a level or an extraction type is an additive change here.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ExtractionError, Result};

/// Granularity at which an extraction runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionLevel {
    /// Whole chapter: its loose chunks plus every section's chunks.
    Chapter,

    /// A single section's chunks.
    Section,

    /// One chunk on its own, no combination.
    Chunk,
}

impl fmt::Display for ExtractionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chapter => write!(f, "chapter"),
            Self::Section => write!(f, "section"),
            Self::Chunk => write!(f, "chunk"),
        }
    }
}

/// Policy for a chunk set whose combined size exceeds the level budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinationStrategy {
    /// Always return the full combination, budget ignored.
    None,

    /// Greedily keep a document-order prefix that fits the budget.
    Truncate,

    /// Summarize down to the budget when exceeded.
    ///
    /// Without a summarizer installed this falls back to [`Truncate`]
    /// behavior with a one-time warning; see the combiner.
    ///
    /// [`Truncate`]: CombinationStrategy::Truncate
    SummaryIfExceeded,
}

/// One registry row: what runs at a level, under what budget and policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelConfig {
    /// The level this row configures.
    pub level: ExtractionLevel,

    /// Extraction types dispatched at this level, in dispatch order.
    pub extraction_types: Vec<String>,

    /// Token budget for the combined text at this level.
    pub max_tokens: usize,

    /// What to do when the combination exceeds the budget.
    pub strategy: CombinationStrategy,
}

impl LevelConfig {
    /// Create a registry row.
    pub fn new(
        level: ExtractionLevel,
        extraction_types: impl IntoIterator<Item = impl Into<String>>,
        max_tokens: usize,
        strategy: CombinationStrategy,
    ) -> Self {
        Self {
            level,
            extraction_types: extraction_types.into_iter().map(|t| t.into()).collect(),
            max_tokens,
            strategy,
        }
    }
}

/// The static table mapping levels to their extraction configuration.
///
/// `Default` builds the standard three-row table:
///
/// | Level   | Budget | Extraction types                     | Strategy            |
/// |---------|--------|--------------------------------------|---------------------|
/// | chapter | 8000   | methodology, workflow                | summary_if_exceeded |
/// | section | 4000   | decision, pattern, checklist, persona| truncate            |
/// | chunk   | 512    | warning                              | none                |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelRegistry {
    levels: IndexMap<ExtractionLevel, LevelConfig>,
}

impl Default for LevelRegistry {
    fn default() -> Self {
        Self::empty()
            .with_level(LevelConfig::new(
                ExtractionLevel::Chapter,
                ["methodology", "workflow"],
                8000,
                CombinationStrategy::SummaryIfExceeded,
            ))
            .with_level(LevelConfig::new(
                ExtractionLevel::Section,
                ["decision", "pattern", "checklist", "persona"],
                4000,
                CombinationStrategy::Truncate,
            ))
            .with_level(LevelConfig::new(
                ExtractionLevel::Chunk,
                ["warning"],
                512,
                CombinationStrategy::None,
            ))
    }
}

impl LevelRegistry {
    /// Create the standard registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with no rows.
    pub fn empty() -> Self {
        Self {
            levels: IndexMap::new(),
        }
    }

    /// Add or replace a level row.
    pub fn with_level(mut self, config: LevelConfig) -> Self {
        self.levels.insert(config.level, config);
        self
    }

    /// Configuration for a level, if registered.
    pub fn config_for(&self, level: ExtractionLevel) -> Option<&LevelConfig> {
        self.levels.get(&level)
    }

    /// Resolve which level an extraction type runs at.
    ///
    /// Unknown types are a configuration defect and fail immediately.
    pub fn level_for_type(&self, extraction_type: &str) -> Result<ExtractionLevel> {
        self.levels
            .values()
            .find(|config| {
                config
                    .extraction_types
                    .iter()
                    .any(|t| t == extraction_type)
            })
            .map(|config| config.level)
            .ok_or_else(|| ExtractionError::UnknownExtractionType {
                extraction_type: extraction_type.to_string(),
            })
    }

    /// All registered levels in registry order.
    pub fn levels(&self) -> impl Iterator<Item = &LevelConfig> {
        self.levels.values()
    }

    /// All extraction types across all levels, in registry order.
    pub fn extraction_types(&self) -> impl Iterator<Item = &str> {
        self.levels
            .values()
            .flat_map(|config| config.extraction_types.iter().map(String::as_str))
    }
}
