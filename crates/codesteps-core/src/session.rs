//! One open fragment puzzle.
//!
//! A [`PuzzleSession`] binds an exercise to a [`TileArranger`] and the last
//! check verdict. Reordering resets the verdict; a successful
//! [`PuzzleSession::submit`] records the exercise as solved.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::arranger::TileArranger;
use crate::catalog::{Catalog, Exercise, ExerciseId, ExerciseKind};
use crate::error::{CodestepsError, Result};
use crate::input::{DragAdapter, Key, KeyOutcome, KeyboardAdapter, StepButtons};
use crate::progress::{ProgressBackend, ProgressStore};
use crate::unlock::UnlockModel;

/// Result of the last check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Not checked since the last change.
    #[default]
    Idle,
    /// The arrangement matched the canonical answer.
    Correct,
    /// The arrangement did not match.
    Wrong,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Correct => write!(f, "correct"),
            Self::Wrong => write!(f, "wrong"),
        }
    }
}

/// Looks up a fragment puzzle the learner may currently play.
///
/// # Errors
///
/// - `UnknownExercise` if the id is not in the catalog
/// - `ExerciseLocked` if it is neither unlocked nor solved
/// - `NotAPuzzle` if it is block-based
pub fn playable_exercise<'c>(
    catalog: &'c Catalog,
    model: &UnlockModel,
    id: ExerciseId,
) -> Result<&'c Exercise> {
    let exercise = catalog
        .exercise(id)
        .ok_or_else(|| CodestepsError::unknown_exercise(id))?;
    if !(model.is_unlocked(id) || model.is_solved(id)) {
        return Err(CodestepsError::exercise_locked(id));
    }
    if exercise.kind == ExerciseKind::BlockBased {
        return Err(CodestepsError::not_a_puzzle(id));
    }
    Ok(exercise)
}

/// Interactive state of one puzzle exercise.
#[derive(Debug, Clone)]
pub struct PuzzleSession {
    exercise_id: ExerciseId,
    canonical_answer: String,
    arranger: TileArranger,
    drag: DragAdapter,
    verdict: Verdict,
}

impl PuzzleSession {
    /// Opens exercise `id` if the learner may access it.
    ///
    /// # Errors
    ///
    /// - `UnknownExercise` if the id is not in the catalog
    /// - `ExerciseLocked` if it is neither unlocked nor solved
    /// - `NotAPuzzle` if it is block-based
    pub fn open<R: Rng + ?Sized>(
        catalog: &Catalog,
        model: &UnlockModel,
        id: ExerciseId,
        rng: &mut R,
    ) -> Result<Self> {
        Self::from_exercise(playable_exercise(catalog, model, id)?, rng)
    }

    /// Starts a session on `exercise` with a shuffled board, skipping gating.
    ///
    /// # Errors
    ///
    /// Returns `NotAPuzzle` for block-based exercises.
    pub fn from_exercise<R: Rng + ?Sized>(exercise: &Exercise, rng: &mut R) -> Result<Self> {
        if exercise.kind == ExerciseKind::BlockBased {
            return Err(CodestepsError::not_a_puzzle(exercise.id));
        }

        tracing::debug!(
            exercise_id = exercise.id,
            tiles = exercise.code_parts.len(),
            "Opening puzzle session"
        );

        Ok(Self {
            exercise_id: exercise.id,
            canonical_answer: exercise.canonical_answer.clone(),
            arranger: TileArranger::new(&exercise.code_parts, rng),
            drag: DragAdapter::new(),
            verdict: Verdict::Idle,
        })
    }

    /// Id of the exercise being played.
    #[must_use]
    pub const fn exercise_id(&self) -> ExerciseId {
        self.exercise_id
    }

    /// Board state.
    #[must_use]
    pub const fn arranger(&self) -> &TileArranger {
        &self.arranger
    }

    /// Verdict of the last check.
    #[must_use]
    pub const fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// Drag state.
    #[must_use]
    pub const fn drag(&self) -> &DragAdapter {
        &self.drag
    }

    /// Moves a tile. See [`TileArranger::move_tile`].
    pub fn move_tile(&mut self, from: usize, to: usize) -> bool {
        let moved = self.arranger.move_tile(from, to);
        self.touch(moved);
        moved
    }

    /// Selects a tile.
    pub fn select(&mut self, idx: usize) -> bool {
        self.arranger.select(idx)
    }

    /// Clears the selection.
    pub fn deselect(&mut self) {
        self.arranger.deselect();
    }

    /// Presses the left step button of tile `idx`.
    pub fn press_left(&mut self, idx: usize) -> bool {
        let moved = StepButtons::left(&mut self.arranger, idx);
        self.touch(moved);
        moved
    }

    /// Presses the right step button of tile `idx`.
    pub fn press_right(&mut self, idx: usize) -> bool {
        let moved = StepButtons::right(&mut self.arranger, idx);
        self.touch(moved);
        moved
    }

    /// Starts dragging tile `idx`.
    pub fn drag_start(&mut self, idx: usize) {
        self.drag.start(&mut self.arranger, idx);
        self.verdict = Verdict::Idle;
    }

    /// Hovers tile `idx` during a drag.
    pub fn drag_enter(&mut self, idx: usize) {
        self.drag.enter(idx);
    }

    /// Drops the dragged tile on `idx`.
    pub fn drag_drop(&mut self, idx: usize) -> bool {
        let moved = self.drag.drop_on(&mut self.arranger, idx);
        self.touch(moved);
        moved
    }

    /// Cancels a drag.
    pub fn drag_end(&mut self) {
        self.drag.end();
    }

    /// Applies a key press.
    ///
    /// `Enter` only reports [`KeyOutcome::CheckRequested`]; the caller decides
    /// whether to [`submit`](Self::submit).
    pub fn handle_key(&mut self, key: Key) -> KeyOutcome {
        let outcome = KeyboardAdapter::handle(&mut self.arranger, key);
        self.touch(matches!(outcome, KeyOutcome::Moved { .. }));
        outcome
    }

    /// Deals a fresh permutation of the fragments.
    pub fn reshuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.arranger.shuffle(rng);
        self.drag.end();
        self.verdict = Verdict::Idle;
    }

    /// Checks the board without recording anything.
    pub fn evaluate(&mut self) -> Verdict {
        self.verdict = if self.arranger.check(&self.canonical_answer) {
            Verdict::Correct
        } else {
            Verdict::Wrong
        };
        self.verdict
    }

    /// Checks the board and marks the exercise solved on success.
    ///
    /// # Errors
    ///
    /// Returns an error if the progress store cannot persist the result.
    pub fn submit<B: ProgressBackend>(&mut self, store: &mut ProgressStore<B>) -> Result<Verdict> {
        let verdict = self.evaluate();
        tracing::info!(exercise_id = self.exercise_id, verdict = %verdict, "Puzzle checked");

        if verdict == Verdict::Correct {
            store.mark_solved(self.exercise_id)?;
        }
        Ok(verdict)
    }

    fn touch(&mut self, moved: bool) {
        if moved {
            self.verdict = Verdict::Idle;
        }
    }
}
