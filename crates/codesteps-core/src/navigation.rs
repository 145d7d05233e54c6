//! Moving between exercises and summarizing progress.

use serde::Serialize;

use crate::catalog::{Catalog, Exercise, ExerciseId, ModuleId};
use crate::unlock::UnlockModel;

/// Returns the exercise before `current` in the total order.
#[must_use]
pub fn previous_exercise(catalog: &Catalog, current: ExerciseId) -> Option<&Exercise> {
    let ordered = catalog.ordered_exercises();
    let idx = ordered.iter().position(|e| e.id == current)?;
    idx.checked_sub(1).map(|prev| ordered[prev])
}

/// Returns the exercise after `current` in the total order, locked or not.
#[must_use]
pub fn next_exercise(catalog: &Catalog, current: ExerciseId) -> Option<&Exercise> {
    let ordered = catalog.ordered_exercises();
    let idx = ordered.iter().position(|e| e.id == current)?;
    ordered.get(idx + 1).copied()
}

/// Returns `true` if the learner may move on from `current` to the next exercise.
#[must_use]
pub fn can_advance(catalog: &Catalog, model: &UnlockModel, current: ExerciseId) -> bool {
    next_exercise(catalog, current).is_some_and(|next| model.is_unlocked(next.id) || model.is_solved(next.id))
}

/// A (module, exercise) pair chosen in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    /// Selected module.
    pub module_id: ModuleId,
    /// Selected exercise, if the module has any.
    pub exercise_id: Option<ExerciseId>,
}

/// Repairs a possibly stale selection against the catalog.
///
/// An unknown module falls back to the first module and its first exercise.
/// A known module with an unknown exercise falls back to that module's first
/// exercise. Returns `None` only for a catalog without modules.
#[must_use]
pub fn resolve_selection(
    catalog: &Catalog,
    module_id: Option<ModuleId>,
    exercise_id: Option<ExerciseId>,
) -> Option<Selection> {
    let first_of = |module: &crate::catalog::Module| Selection {
        module_id: module.id,
        exercise_id: module.exercises.first().map(|e| e.id),
    };

    let Some(module) = module_id.and_then(|id| catalog.module(id)) else {
        return catalog.modules().first().map(first_of);
    };

    match exercise_id {
        Some(id) if catalog.contains_exercise(id) => Some(Selection {
            module_id: module.id,
            exercise_id: Some(id),
        }),
        _ => Some(first_of(module)),
    }
}

/// Solved/total counts for one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleProgress {
    /// Module id.
    pub module_id: ModuleId,
    /// Module title.
    pub title: String,
    /// Solved exercises in this module.
    pub solved: usize,
    /// Exercises in this module.
    pub total: usize,
}

/// Global and per-module progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    /// Solved exercises that exist in the catalog.
    pub solved: usize,
    /// Exercises in the catalog.
    pub total: usize,
    /// One entry per module, in module order.
    pub modules: Vec<ModuleProgress>,
}

impl ProgressSummary {
    /// Counts progress. Solved ids missing from the catalog are not counted.
    #[must_use]
    pub fn compute(catalog: &Catalog, model: &UnlockModel) -> Self {
        let modules = catalog
            .modules()
            .iter()
            .map(|module| ModuleProgress {
                module_id: module.id,
                title: module.title.clone(),
                solved: module
                    .exercises
                    .iter()
                    .filter(|e| model.is_solved(e.id))
                    .count(),
                total: module.exercises.len(),
            })
            .collect();

        Self {
            solved: model.solved_in_catalog(catalog),
            total: catalog.exercise_count(),
            modules,
        }
    }

    /// Completion percentage, `0.0` for an empty catalog.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self) -> f64 {
        (self.solved as f64 / self.total.max(1) as f64) * 100.0
    }

    /// Returns `true` once every exercise is solved.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.total > 0 && self.solved == self.total
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::progress::SolvedSet;

    fn catalog() -> Catalog {
        // M1(e10, e11), M2(), M3(e30)
        Catalog::from_json_str(
            r#"[
                { "id": 1, "orderIndex": 1, "title": "HTML", "exercises": [
                    { "id": 11, "orderIndex": 2 }, { "id": 10, "orderIndex": 1 }
                ]},
                { "id": 2, "orderIndex": 2, "title": "Empty", "exercises": [] },
                { "id": 3, "orderIndex": 3, "title": "CSS", "exercises": [{ "id": 30, "orderIndex": 1 }] }
            ]"#,
            "test",
        )
        .unwrap()
    }

    fn model(catalog: &Catalog, ids: &[ExerciseId]) -> UnlockModel {
        let solved: SolvedSet = ids.iter().copied().collect();
        UnlockModel::compute(catalog, &solved)
    }

    #[test]
    fn test_previous_and_next() {
        let catalog = catalog();
        assert!(previous_exercise(&catalog, 10).is_none());
        assert_eq!(previous_exercise(&catalog, 11).unwrap().id, 10);
        assert_eq!(previous_exercise(&catalog, 30).unwrap().id, 11);

        assert_eq!(next_exercise(&catalog, 10).unwrap().id, 11);
        assert_eq!(next_exercise(&catalog, 11).unwrap().id, 30);
        assert!(next_exercise(&catalog, 30).is_none());
        assert!(next_exercise(&catalog, 99).is_none());
    }

    #[test]
    fn test_can_advance_requires_unlocked_next() {
        let catalog = catalog();
        assert!(!can_advance(&catalog, &model(&catalog, &[]), 10));
        assert!(can_advance(&catalog, &model(&catalog, &[10]), 10));
        // Module 2 is empty, so e30 stays locked after finishing module 1.
        assert!(!can_advance(&catalog, &model(&catalog, &[10, 11]), 11));
        // A solved next exercise is always reachable.
        assert!(can_advance(&catalog, &model(&catalog, &[10, 30]), 11));
        assert!(!can_advance(&catalog, &model(&catalog, &[10, 11, 30]), 30));
    }

    #[test]
    fn test_navigation_with_unordered_modules() {
        // Modules without orderIndex keep their exercises together
        let catalog = Catalog::from_json_str(
            r#"[
                { "id": 1, "exercises": [{ "id": 10, "orderIndex": 2 }, { "id": 11, "orderIndex": 3 }] },
                { "id": 2, "exercises": [{ "id": 20, "orderIndex": 1 }] }
            ]"#,
            "test",
        )
        .unwrap();

        assert_eq!(next_exercise(&catalog, 10).unwrap().id, 11);
        assert_eq!(next_exercise(&catalog, 11).unwrap().id, 20);
        assert!(previous_exercise(&catalog, 10).is_none());
        assert!(can_advance(&catalog, &model(&catalog, &[10]), 10));
        assert!(can_advance(&catalog, &model(&catalog, &[10, 11]), 11));
    }

    #[test]
    fn test_resolve_selection() {
        let catalog = catalog();

        assert_eq!(
            resolve_selection(&catalog, Some(1), Some(11)),
            Some(Selection { module_id: 1, exercise_id: Some(11) })
        );
        assert_eq!(
            resolve_selection(&catalog, Some(3), Some(99)),
            Some(Selection { module_id: 3, exercise_id: Some(30) })
        );
        assert_eq!(
            resolve_selection(&catalog, Some(42), Some(30)),
            Some(Selection { module_id: 1, exercise_id: Some(10) })
        );
        assert_eq!(
            resolve_selection(&catalog, None, None),
            Some(Selection { module_id: 1, exercise_id: Some(10) })
        );
        assert_eq!(
            resolve_selection(&catalog, Some(2), None),
            Some(Selection { module_id: 2, exercise_id: None })
        );
        assert!(resolve_selection(&Catalog::default(), Some(1), Some(1)).is_none());
    }

    #[test]
    fn test_progress_summary() {
        let catalog = catalog();
        let summary = ProgressSummary::compute(&catalog, &model(&catalog, &[10, 30, 77]));

        assert_eq!(summary.solved, 2);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.modules.len(), 3);
        assert_eq!(summary.modules[0].solved, 1);
        assert_eq!(summary.modules[0].total, 2);
        assert_eq!(summary.modules[1].total, 0);
        assert_eq!(summary.modules[2].solved, 1);
        assert!(!summary.is_complete());
        assert!((summary.percent() - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_progress_summary_empty_catalog() {
        let catalog = Catalog::default();
        let summary = ProgressSummary::compute(&catalog, &model(&catalog, &[1]));
        assert_eq!(summary.solved, 0);
        assert!(summary.percent().abs() < f64::EPSILON);
        assert!(!summary.is_complete());
    }
}
