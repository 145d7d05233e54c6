//! Codesteps core
//!
//! Lesson catalog, exercise gating, fragment puzzles and local progress.

pub mod arranger;
pub mod catalog;
pub mod config;
pub mod error;
pub mod input;
pub mod navigation;
pub mod progress;
pub mod puzzle;
pub mod session;
pub mod unlock;

pub use arranger::{shuffle_fragments, TileArranger};
pub use catalog::{Catalog, Exercise, ExerciseId, ExerciseKind, Module, ModuleId, MAX_CATALOG_SIZE};
pub use config::{Config, CONFIG_FILE_NAME};
pub use error::{CodestepsError, Result};
pub use input::{DragAdapter, Key, KeyOutcome, KeyboardAdapter, StepButtons};
pub use navigation::{
    can_advance, next_exercise, previous_exercise, resolve_selection, ModuleProgress,
    ProgressSummary, Selection,
};
pub use progress::{
    FileBackend, MemoryBackend, ProgressBackend, ProgressStore, SolvedSet, SOLVED_KEY,
};
pub use puzzle::{arrange, check, normalize};
pub use session::{playable_exercise, PuzzleSession, Verdict};
pub use unlock::{compute_unlocked, ExerciseState, UnlockModel};
