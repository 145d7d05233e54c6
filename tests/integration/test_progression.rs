//! End-to-end tests for a learner working through the sample catalog.
//!
//! Progress is persisted through the file backend in a scratch directory,
//! so every test reloads state the way a fresh process would.

use std::path::PathBuf;

use codesteps_core::{
    can_advance, next_exercise, Catalog, CodestepsError, ExerciseState, FileBackend,
    ProgressStore, ProgressSummary, PuzzleSession, UnlockModel, Verdict, SOLVED_KEY,
};
use codesteps_report::{json::JsonGenerator, MarkdownGenerator, ReportGenerator};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Path to a file under the fixtures directory.
fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
}

/// Fresh, empty progress directory unique to one test.
fn scratch_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "codesteps-it-{}-{test}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

async fn sample_catalog() -> Catalog {
    Catalog::load(fixture_path("modules.json"))
        .await
        .expect("Failed to load catalog fixture")
}

fn model_for(catalog: &Catalog, store: &ProgressStore<FileBackend>) -> UnlockModel {
    UnlockModel::compute(catalog, &store.load())
}

/// Rearranges the session's tiles into the exercise's authored order.
fn arrange_in_authored_order(session: &mut PuzzleSession, parts: &[String]) {
    for (target, part) in parts.iter().enumerate() {
        let from = session.arranger().tiles()[target..]
            .iter()
            .position(|tile| tile == part)
            .map(|offset| offset + target)
            .expect("Fragment missing from board");
        session.move_tile(from, target);
    }
}

/// Opens, solves and submits one exercise, returning the verdict.
fn solve(
    catalog: &Catalog,
    store: &mut ProgressStore<FileBackend>,
    exercise_id: u64,
    seed: u64,
) -> Verdict {
    let model = model_for(catalog, store);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut session =
        PuzzleSession::open(catalog, &model, exercise_id, &mut rng).expect("Exercise not playable");

    let parts = &catalog.exercise(exercise_id).expect("Unknown exercise").code_parts;
    arrange_in_authored_order(&mut session, parts);
    session.submit(store).expect("Failed to submit")
}

#[tokio::test]
async fn test_catalog_fixture_is_ordered() {
    let catalog = sample_catalog().await;

    let order: Vec<u64> = catalog.ordered_exercises().iter().map(|e| e.id).collect();
    assert_eq!(order, vec![11, 12, 21, 22]);
    assert_eq!(catalog.modules()[0].title, "HTML basics");
}

#[tokio::test]
async fn test_fresh_learner_sees_only_first_exercise() {
    let catalog = sample_catalog().await;
    let store = ProgressStore::open(scratch_dir("fresh"));
    let model = model_for(&catalog, &store);

    assert_eq!(model.state_of(11), ExerciseState::Open);
    assert_eq!(model.state_of(12), ExerciseState::Locked);
    assert_eq!(model.state_of(21), ExerciseState::Locked);
    assert!(!can_advance(&catalog, &model, 11));

    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let err = PuzzleSession::open(&catalog, &model, 12, &mut rng).unwrap_err();
    assert!(matches!(err, CodestepsError::ExerciseLocked { .. }));
}

#[tokio::test]
async fn test_solving_unlocks_next_and_persists() {
    let catalog = sample_catalog().await;
    let dir = scratch_dir("persist");
    let mut store = ProgressStore::open(&dir);

    assert_eq!(solve(&catalog, &mut store, 11, 7), Verdict::Correct);

    // A new store over the same directory sees the saved progress
    let reopened = ProgressStore::open(&dir);
    let model = model_for(&catalog, &reopened);
    assert_eq!(model.state_of(11), ExerciseState::Solved);
    assert_eq!(model.state_of(12), ExerciseState::Open);
    assert!(can_advance(&catalog, &model, 11));
    assert_eq!(next_exercise(&catalog, 11).map(|e| e.id), Some(12));

    let raw = std::fs::read_to_string(dir.join(format!("{SOLVED_KEY}.json"))).unwrap();
    assert_eq!(raw, "[11]");

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_entities_and_whitespace_are_ignored() {
    let catalog = sample_catalog().await;
    let mut store = ProgressStore::open(scratch_dir("entities"));

    assert_eq!(solve(&catalog, &mut store, 11, 3), Verdict::Correct);
    // "Hello &amp; welcome" must match the literal "Hello & welcome"
    assert_eq!(solve(&catalog, &mut store, 12, 3), Verdict::Correct);

    let model = model_for(&catalog, &store);
    assert_eq!(model.state_of(21), ExerciseState::Open);

    let _ = std::fs::remove_dir_all(store.backend().dir());
}

#[tokio::test]
async fn test_wrong_arrangement_does_not_save() {
    let catalog = sample_catalog().await;
    let mut store = ProgressStore::open(scratch_dir("wrong"));
    let model = model_for(&catalog, &store);

    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut session = PuzzleSession::open(&catalog, &model, 11, &mut rng).unwrap();
    let mut reversed = catalog.exercise(11).unwrap().code_parts.clone();
    reversed.reverse();
    arrange_in_authored_order(&mut session, &reversed);

    assert_eq!(session.submit(&mut store).unwrap(), Verdict::Wrong);
    assert!(store.load().is_empty());

    // Any move clears the verdict
    session.move_tile(0, 2);
    assert_eq!(session.verdict(), Verdict::Idle);
}

#[tokio::test]
async fn test_block_exercise_is_not_a_puzzle() {
    let catalog = sample_catalog().await;
    let mut store = ProgressStore::open(scratch_dir("blocks"));

    for id in [11, 12, 21] {
        assert_eq!(solve(&catalog, &mut store, id, id), Verdict::Correct);
    }

    let model = model_for(&catalog, &store);
    assert_eq!(model.state_of(22), ExerciseState::Open);

    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let err = PuzzleSession::open(&catalog, &model, 22, &mut rng).unwrap_err();
    assert!(matches!(err, CodestepsError::NotAPuzzle { .. }));

    let _ = std::fs::remove_dir_all(store.backend().dir());
}

#[tokio::test]
async fn test_reset_relocks_everything() {
    let catalog = sample_catalog().await;
    let mut store = ProgressStore::open(scratch_dir("reset"));

    solve(&catalog, &mut store, 11, 9);
    solve(&catalog, &mut store, 12, 9);
    assert_eq!(store.load().len(), 2);

    store.reset().unwrap();
    // Resetting twice is fine
    store.reset().unwrap();

    let model = model_for(&catalog, &store);
    assert_eq!(model.state_of(11), ExerciseState::Open);
    assert_eq!(model.state_of(12), ExerciseState::Locked);
}

#[tokio::test]
async fn test_corrupt_progress_file_starts_over() {
    let catalog = sample_catalog().await;
    let dir = scratch_dir("corrupt");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(format!("{SOLVED_KEY}.json")), "{ not json").unwrap();

    let store = ProgressStore::open(&dir);
    assert!(store.load().is_empty());
    assert_eq!(model_for(&catalog, &store).state_of(11), ExerciseState::Open);

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_progress_report_after_two_solves() {
    let catalog = sample_catalog().await;
    let mut store = ProgressStore::open(scratch_dir("report"));
    solve(&catalog, &mut store, 11, 2);
    solve(&catalog, &mut store, 12, 2);

    let model = model_for(&catalog, &store);
    let summary = ProgressSummary::compute(&catalog, &model);
    assert_eq!((summary.solved, summary.total), (2, 4));
    assert!((summary.percent() - 50.0).abs() < f64::EPSILON);

    let report = ReportGenerator::new(&catalog, &model).generate();
    assert_eq!(report.totals.solved, 2);
    assert_eq!(report.next_up.as_ref().map(|n| n.exercise_id), Some(21));
    assert!(!report.is_complete());

    let markdown = MarkdownGenerator::new(&report).generate();
    assert!(markdown.contains("## HTML basics (2/2)"));
    assert!(markdown.contains("## Lists (0/2)"));
    assert!(markdown.contains("| Next Up | A bullet list (#21) |"));

    let json = JsonGenerator::new(&report).generate().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["modules"][1]["exercises"][1]["state"], "locked");

    let _ = std::fs::remove_dir_all(store.backend().dir());
}
