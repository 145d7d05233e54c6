//! Tests for converting a database table dump into a catalog file.

use std::path::PathBuf;

use codesteps_core::{Catalog, ExerciseKind};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
}

fn load_dump() -> Catalog {
    let text = std::fs::read_to_string(fixture_path("table_dump.json"))
        .expect("Failed to read dump fixture");
    let value: serde_json::Value = serde_json::from_str(&text).expect("Dump is not JSON");
    Catalog::from_table_dump(&value, "table_dump.json").expect("Failed to import dump")
}

#[test]
fn test_dump_groups_exercises_by_module() {
    let catalog = load_dump();

    assert_eq!(catalog.modules().len(), 2);
    assert_eq!(catalog.modules()[0].exercises.len(), 1);
    assert_eq!(catalog.modules()[1].exercises.len(), 1);
    // The row pointing at module 7 has no home
    assert!(!catalog.contains_exercise(99));
}

#[test]
fn test_dump_coerces_string_columns() {
    let catalog = load_dump();
    let exercise = catalog.exercise(11).expect("Exercise 11 missing");

    assert_eq!(exercise.module_id, 1);
    assert_eq!(exercise.order_index, 1);
    assert_eq!(exercise.kind, ExerciseKind::PuzzleFragment);
    assert_eq!(exercise.code_parts, vec!["<h1>", "Hi", "</h1>"]);
    assert_eq!(exercise.canonical_answer, "<h1>Hi</h1>");
    assert_eq!(catalog.modules()[1].description, "");
}

#[tokio::test]
async fn test_imported_catalog_loads_back() {
    let catalog = load_dump();
    let out = std::env::temp_dir().join(format!(
        "codesteps-it-{}-import.json",
        std::process::id()
    ));

    tokio::fs::write(&out, catalog.to_json_pretty().unwrap())
        .await
        .unwrap();
    let reloaded = Catalog::load(&out).await.expect("Imported catalog should load");

    assert_eq!(reloaded, catalog);

    let _ = tokio::fs::remove_file(&out).await;
}

#[test]
fn test_dump_without_tables_is_empty() {
    let value = serde_json::json!([{ "type": "header", "version": "5.2.1" }]);
    let catalog = Catalog::from_table_dump(&value, "inline").unwrap();
    assert!(catalog.is_empty());
}

#[test]
fn test_dump_must_be_an_array() {
    let value = serde_json::json!({ "modules": [] });
    assert!(Catalog::from_table_dump(&value, "inline").is_err());
}
