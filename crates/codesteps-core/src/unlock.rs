//! Exercise gating.
//!
//! Reachability is derived on demand from the catalog and the solved set and
//! is never persisted. An exercise is unlocked iff:
//!
//! - (a) it is solved;
//! - (b) it is the first exercise in the catalog-wide total order;
//! - (c) the exercise right before it in the same module is solved;
//! - (d) it opens its module and the last exercise of the previous module
//!   (by module order) is solved.
//!
//! A module without exercises has no last exercise, so the module after it can
//! never open through rule (d).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, ExerciseId};
use crate::progress::SolvedSet;

/// Computes the set of exercise ids the learner may currently open.
///
/// Pure and deterministic: identical inputs always give an identical set.
/// The result only contains ids present in `catalog`.
///
/// # Examples
///
/// ```
/// use codesteps_core::{compute_unlocked, Catalog, SolvedSet};
///
/// let catalog = Catalog::from_json_str(
///     r#"[{ "id": 1, "exercises": [{ "id": 1, "orderIndex": 1 }, { "id": 2, "orderIndex": 2 }] }]"#,
///     "inline",
/// )
/// .unwrap();
///
/// let unlocked = compute_unlocked(&catalog, &SolvedSet::new());
/// assert!(unlocked.contains(&1));
/// assert!(!unlocked.contains(&2));
/// ```
#[must_use]
pub fn compute_unlocked(catalog: &Catalog, solved: &SolvedSet) -> BTreeSet<ExerciseId> {
    let first_in_order = catalog.ordered_exercises().first().map(|e| e.id);
    let modules = catalog.modules();
    let mut unlocked = BTreeSet::new();

    for (mi, module) in modules.iter().enumerate() {
        for (ei, exercise) in module.exercises.iter().enumerate() {
            let previous_in_module_solved =
                ei > 0 && solved.contains(module.exercises[ei - 1].id);

            let previous_module_finished = ei == 0
                && mi > 0
                && modules[mi - 1]
                    .last_exercise()
                    .is_some_and(|last| solved.contains(last.id));

            if solved.contains(exercise.id)
                || first_in_order == Some(exercise.id)
                || previous_in_module_solved
                || previous_module_finished
            {
                unlocked.insert(exercise.id);
            }
        }
    }

    tracing::debug!(
        solved = solved.len(),
        unlocked = unlocked.len(),
        total = catalog.exercise_count(),
        "Computed unlocked exercises"
    );

    unlocked
}

/// How an exercise presents to the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseState {
    /// Not reachable yet.
    Locked,
    /// Reachable, not solved.
    Open,
    /// Already solved.
    Solved,
}

impl std::fmt::Display for ExerciseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Locked => write!(f, "locked"),
            Self::Open => write!(f, "open"),
            Self::Solved => write!(f, "solved"),
        }
    }
}

/// Derived reachability for one (catalog, solved set) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnlockModel {
    /// Every solved id as loaded, including ids no longer in the catalog.
    pub solved_ids: BTreeSet<ExerciseId>,

    /// Ids of catalog exercises the learner may open.
    pub unlocked_ids: BTreeSet<ExerciseId>,
}

impl UnlockModel {
    /// Derives the model. Recompute after every progress change.
    #[must_use]
    pub fn compute(catalog: &Catalog, solved: &SolvedSet) -> Self {
        Self {
            solved_ids: solved.iter().collect(),
            unlocked_ids: compute_unlocked(catalog, solved),
        }
    }

    /// Returns `true` if the exercise is solved.
    #[must_use]
    pub fn is_solved(&self, id: ExerciseId) -> bool {
        self.solved_ids.contains(&id)
    }

    /// Returns `true` if the exercise may be opened.
    #[must_use]
    pub fn is_unlocked(&self, id: ExerciseId) -> bool {
        self.unlocked_ids.contains(&id)
    }

    /// Returns the learner-facing state of an exercise.
    #[must_use]
    pub fn state_of(&self, id: ExerciseId) -> ExerciseState {
        if self.is_solved(id) {
            ExerciseState::Solved
        } else if self.is_unlocked(id) {
            ExerciseState::Open
        } else {
            ExerciseState::Locked
        }
    }

    /// Number of solved ids that still exist in `catalog`.
    #[must_use]
    pub fn solved_in_catalog(&self, catalog: &Catalog) -> usize {
        self.solved_ids
            .iter()
            .filter(|id| catalog.contains_exercise(**id))
            .count()
    }
}
