//! Codesteps Progress Reports
//!
//! This crate turns a catalog and the learner's unlock state into a
//! [`ProgressReport`], which can be serialized to JSON for tooling or rendered
//! to Markdown for people.
//!
//! # Types
//!
//! - [`ProgressReport`] - The complete report
//! - [`ProgressTotals`] - Catalog-wide solved/total counts
//! - [`ModuleReport`] - One module with the state of each exercise
//! - [`NextUp`] - The exercise the learner should open next
//!
//! # Generators
//!
//! - [`ReportGenerator`] - Builds a [`ProgressReport`]
//! - [`json::JsonGenerator`] - Compact or pretty JSON
//! - [`MarkdownGenerator`] - Human-readable Markdown
//!
//! # Example
//!
//! ```rust
//! use codesteps_core::{Catalog, SolvedSet, UnlockModel};
//! use codesteps_report::{MarkdownGenerator, ReportGenerator};
//!
//! let catalog = Catalog::from_json_str(
//!     r#"[{ "id": 1, "title": "HTML", "exercises": [{ "id": 1, "title": "Tags" }] }]"#,
//!     "inline",
//! )
//! .unwrap();
//! let model = UnlockModel::compute(&catalog, &SolvedSet::new());
//!
//! let report = ReportGenerator::new(&catalog, &model).generate();
//! assert_eq!(report.totals.total, 1);
//!
//! let markdown = MarkdownGenerator::new(&report).generate();
//! assert!(markdown.contains("# Codesteps Progress Report"));
//! ```

pub mod json;
mod markdown;

pub use markdown::MarkdownGenerator;

use chrono::{DateTime, Utc};
use codesteps_core::{
    Catalog, ExerciseId, ExerciseKind, ExerciseState, ModuleId, ProgressSummary, UnlockModel,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name of the Markdown report.
pub const MARKDOWN_REPORT_FILE: &str = "codesteps-progress.md";

/// File name of the JSON report.
pub const JSON_REPORT_FILE: &str = "codesteps-progress.json";

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Failed to serialize the report to JSON.
    #[error("failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to write report files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

// ============================================================================
// Report
// ============================================================================

/// A snapshot of the learner's progress through the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,

    /// Catalog-wide counts.
    pub totals: ProgressTotals,

    /// Modules in catalog order.
    pub modules: Vec<ModuleReport>,

    /// The earliest open exercise, if any.
    pub next_up: Option<NextUp>,
}

impl ProgressReport {
    /// Returns `true` once every exercise is solved.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.totals.total > 0 && self.totals.solved == self.totals.total
    }

    /// Serializes the report to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Catalog-wide solved/total counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressTotals {
    /// Solved exercises that exist in the catalog.
    pub solved: usize,

    /// Exercises in the catalog.
    pub total: usize,

    /// `solved / total` as a percentage.
    pub percent: f64,
}

/// One module of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleReport {
    /// Module id.
    pub module_id: ModuleId,

    /// Module title.
    pub title: String,

    /// Module description.
    pub description: String,

    /// Solved exercises in this module.
    pub solved: usize,

    /// Exercises in this module.
    pub total: usize,

    /// Exercises in module order.
    pub exercises: Vec<ExerciseReport>,
}

/// One exercise of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseReport {
    /// Exercise id.
    pub exercise_id: ExerciseId,

    /// Exercise title.
    pub title: String,

    /// Puzzle or block-based.
    pub kind: ExerciseKind,

    /// Locked, open or solved.
    pub state: ExerciseState,
}

/// The exercise the learner should work on next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextUp {
    /// Exercise id.
    pub exercise_id: ExerciseId,

    /// Id of the module holding it.
    pub module_id: ModuleId,

    /// Exercise title.
    pub title: String,
}

// ============================================================================
// Report Generator
// ============================================================================

/// Builds a [`ProgressReport`] from a catalog and an unlock model.
pub struct ReportGenerator<'a> {
    catalog: &'a Catalog,
    model: &'a UnlockModel,
}

impl<'a> ReportGenerator<'a> {
    /// Creates a generator.
    #[must_use]
    pub const fn new(catalog: &'a Catalog, model: &'a UnlockModel) -> Self {
        Self { catalog, model }
    }

    /// Generates the report, stamped with the current time.
    #[must_use]
    pub fn generate(&self) -> ProgressReport {
        self.generate_at(Utc::now())
    }

    /// Generates the report with a fixed timestamp.
    #[must_use]
    pub fn generate_at(&self, generated_at: DateTime<Utc>) -> ProgressReport {
        let summary = ProgressSummary::compute(self.catalog, self.model);

        let modules = self
            .catalog
            .modules()
            .iter()
            .zip(&summary.modules)
            .map(|(module, counts)| ModuleReport {
                module_id: module.id,
                title: module.title.clone(),
                description: module.description.clone(),
                solved: counts.solved,
                total: counts.total,
                exercises: module
                    .exercises
                    .iter()
                    .map(|exercise| ExerciseReport {
                        exercise_id: exercise.id,
                        title: exercise.title.clone(),
                        kind: exercise.kind,
                        state: self.model.state_of(exercise.id),
                    })
                    .collect(),
            })
            .collect();

        let next_up = self
            .catalog
            .ordered_exercises()
            .into_iter()
            .find(|e| self.model.state_of(e.id) == ExerciseState::Open)
            .map(|e| NextUp {
                exercise_id: e.id,
                module_id: e.module_id,
                title: e.title.clone(),
            });

        ProgressReport {
            generated_at,
            totals: ProgressTotals {
                solved: summary.solved,
                total: summary.total,
                percent: summary.percent(),
            },
            modules,
            next_up,
        }
    }
}
