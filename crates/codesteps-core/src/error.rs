//! Error types for the Codesteps core.
//!
//! This module defines the error hierarchy for configuration loading,
//! catalog acquisition, exercise access and progress persistence.
//! Field-level decoding problems never show up here: they degrade to
//! defaults inside the decoders.

use std::path::PathBuf;

use crate::catalog::{ExerciseId, ModuleId};

/// A specialized `Result` type for Codesteps operations.
pub type Result<T> = std::result::Result<T, CodestepsError>;

/// Errors that can occur while running a Codesteps session.
///
/// Error variants are organized by subsystem and include actionable suggestions
/// where possible to help users resolve issues.
#[derive(Debug, thiserror::Error)]
pub enum CodestepsError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your codesteps.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Catalog Errors
    // ========================================================================
    /// The lesson catalog could not be obtained or has an unusable shape.
    ///
    /// This is the only condition that prevents a session from starting.
    #[error("Catalog unavailable ({source_name}): {message}\n\nSuggestion: Check the 'catalog' path in codesteps.json and that the file holds a module array")]
    CatalogUnavailable {
        /// Where the catalog was expected to come from.
        source_name: String,
        /// Description of the failure.
        message: String,
    },

    /// Two exercises in the catalog share an id.
    #[error("Duplicate exercise id {id} in modules {first_module} and {second_module}\n\nSuggestion: Exercise ids must be unique across the whole catalog")]
    DuplicateExerciseId {
        /// The repeated exercise id.
        id: ExerciseId,
        /// Module holding the first occurrence.
        first_module: ModuleId,
        /// Module holding the repeated occurrence.
        second_module: ModuleId,
    },

    // ========================================================================
    // Exercise Access Errors
    // ========================================================================
    /// No exercise with this id exists in the catalog.
    #[error("Unknown exercise: {id}\n\nSuggestion: Run 'codesteps list' to see the available exercise ids")]
    UnknownExercise {
        /// The requested exercise id.
        id: ExerciseId,
    },

    /// The exercise exists but is not unlocked yet.
    #[error("Exercise {id} is locked\n\nSuggestion: Solve the previous exercise first")]
    ExerciseLocked {
        /// The requested exercise id.
        id: ExerciseId,
    },

    /// The exercise is block-based and has no fragments to arrange.
    #[error("Exercise {id} is not a fragment puzzle\n\nSuggestion: Block-based exercises are completed in the block editor")]
    NotAPuzzle {
        /// The requested exercise id.
        id: ExerciseId,
    },

    // ========================================================================
    // Progress Persistence Errors
    // ========================================================================
    /// Failed to persist the solved set.
    #[error("Failed to write progress to '{path}': {message}\n\nSuggestion: Check write permissions on the data directory")]
    ProgressWrite {
        /// Path of the record that could not be written.
        path: PathBuf,
        /// Description of the write failure.
        message: String,
    },

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CodestepsError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `CatalogUnavailable` error.
    #[must_use]
    pub fn catalog_unavailable(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CatalogUnavailable {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Creates a new `DuplicateExerciseId` error.
    #[must_use]
    pub const fn duplicate_exercise(
        id: ExerciseId,
        first_module: ModuleId,
        second_module: ModuleId,
    ) -> Self {
        Self::DuplicateExerciseId {
            id,
            first_module,
            second_module,
        }
    }

    /// Creates a new `UnknownExercise` error.
    #[must_use]
    pub const fn unknown_exercise(id: ExerciseId) -> Self {
        Self::UnknownExercise { id }
    }

    /// Creates a new `ExerciseLocked` error.
    #[must_use]
    pub const fn exercise_locked(id: ExerciseId) -> Self {
        Self::ExerciseLocked { id }
    }

    /// Creates a new `NotAPuzzle` error.
    #[must_use]
    pub const fn not_a_puzzle(id: ExerciseId) -> Self {
        Self::NotAPuzzle { id }
    }

    /// Creates a new `ProgressWrite` error.
    #[must_use]
    pub fn progress_write(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ProgressWrite {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if this error prevents a session from starting.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigParseError { .. }
                | Self::ConfigValidationError { .. }
                | Self::CatalogUnavailable { .. }
                | Self::DuplicateExerciseId { .. }
        )
    }
}
