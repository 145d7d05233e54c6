//! Lesson catalog model, defensive decoding and loading.
//!
//! The catalog comes from an untrusted JSON source. Decoding never fails on
//! individual fields: numbers fall back to `0`, strings to empty, fragment
//! lists to an empty sequence. Only an unusable overall shape (no module
//! array) or duplicate exercise ids reject the catalog.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CodestepsError, Result};

/// Maximum accepted catalog file size in bytes (8MB).
pub const MAX_CATALOG_SIZE: u64 = 8 * 1024 * 1024;

/// Identifier of an exercise, unique across the whole catalog.
pub type ExerciseId = u64;

/// Identifier of a module.
pub type ModuleId = u64;

/// The kind of task an exercise asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExerciseKind {
    /// Reorder shuffled code fragments into the canonical answer.
    #[default]
    #[serde(rename = "puzzle", alias = "puzzle-fragment")]
    PuzzleFragment,
    /// Build code in the external block editor.
    #[serde(rename = "blockly", alias = "block-based", alias = "block_based")]
    BlockBased,
}

impl ExerciseKind {
    /// Interprets a raw kind tag. Anything not recognised as block-based is a puzzle.
    fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "blockly" | "block-based" | "block_based" => Self::BlockBased,
            _ => Self::PuzzleFragment,
        }
    }
}

impl std::fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PuzzleFragment => write!(f, "puzzle"),
            Self::BlockBased => write!(f, "blockly"),
        }
    }
}

/// A single gated learning unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    /// Catalog-wide unique id.
    pub id: ExerciseId,

    /// Id of the module this exercise belongs to.
    pub module_id: ModuleId,

    /// Display title.
    pub title: String,

    /// Instructions payload, passed through untouched.
    pub instructions: String,

    /// What the learner has to do.
    pub kind: ExerciseKind,

    /// Fragments in their authored order.
    pub code_parts: Vec<String>,

    /// The correct concatenation of the fragments.
    pub canonical_answer: String,

    /// Sibling order within the module.
    pub order_index: i64,
}

/// An ordered grouping of exercises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    /// Module id.
    pub id: ModuleId,

    /// Display title.
    pub title: String,

    /// Short description.
    pub description: String,

    /// Sibling order among modules. Need not be contiguous.
    pub order_index: i64,

    /// Exercises, kept sorted by `(order_index, id)` inside a [`Catalog`].
    pub exercises: Vec<Exercise>,
}

impl Module {
    /// Returns the last exercise of the module, if any.
    #[must_use]
    pub fn last_exercise(&self) -> Option<&Exercise> {
        self.exercises.last()
    }
}

/// The normalized lesson catalog.
///
/// Construct with [`Catalog::new`] or one of the decoders; both sort modules
/// and exercises and reject duplicate exercise ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Catalog {
    modules: Vec<Module>,
}

impl Catalog {
    /// Builds a catalog, sorting modules and exercises by `(order_index, id)`.
    ///
    /// # Errors
    ///
    /// Returns `CodestepsError::DuplicateExerciseId` if two exercises share an id.
    pub fn new(mut modules: Vec<Module>) -> Result<Self> {
        modules.sort_by_key(|m| (m.order_index, m.id));
        for module in &mut modules {
            module.exercises.sort_by_key(|e| (e.order_index, e.id));
        }

        let mut owners: HashMap<ExerciseId, ModuleId> = HashMap::new();
        for module in &modules {
            for exercise in &module.exercises {
                if let Some(first) = owners.insert(exercise.id, module.id) {
                    return Err(CodestepsError::duplicate_exercise(
                        exercise.id,
                        first,
                        module.id,
                    ));
                }
            }
        }

        // An empty module still gates the module that follows it.
        for pair in modules.windows(2) {
            if pair[0].exercises.is_empty() && !pair[1].exercises.is_empty() {
                tracing::warn!(
                    empty_module = pair[0].id,
                    blocked_module = pair[1].id,
                    "Empty module precedes a non-empty module; its first exercise cannot unlock through module order"
                );
            }
        }

        Ok(Self { modules })
    }

    /// Returns the modules in sibling order.
    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Returns `true` if the catalog has no exercises at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exercise_count() == 0
    }

    /// Total number of exercises across all modules.
    #[must_use]
    pub fn exercise_count(&self) -> usize {
        self.modules.iter().map(|m| m.exercises.len()).sum()
    }

    /// Looks up a module by id.
    #[must_use]
    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == id)
    }

    /// Looks up an exercise by id.
    #[must_use]
    pub fn exercise(&self, id: ExerciseId) -> Option<&Exercise> {
        self.modules
            .iter()
            .flat_map(|m| m.exercises.iter())
            .find(|e| e.id == id)
    }

    /// Returns `true` if an exercise with this id exists.
    #[must_use]
    pub fn contains_exercise(&self, id: ExerciseId) -> bool {
        self.exercise(id).is_some()
    }

    /// Returns every exercise in the catalog-wide total order.
    ///
    /// Modules are walked in their sorted order and exercises in module order,
    /// so the key is `(module.order_index, module.id, exercise.order_index,
    /// exercise.id)`. Gating, navigation and reports all follow this order.
    #[must_use]
    pub fn ordered_exercises(&self) -> Vec<&Exercise> {
        self.modules
            .iter()
            .flat_map(|m| m.exercises.iter())
            .collect()
    }

    /// Decodes a catalog from JSON text.
    ///
    /// Accepts either a bare module array or an object with a `modules` array.
    ///
    /// # Errors
    ///
    /// Returns `CodestepsError::CatalogUnavailable` if the text is not JSON or
    /// has no module array, and `CodestepsError::DuplicateExerciseId` for
    /// duplicate exercise ids.
    pub fn from_json_str(text: &str, source_name: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| CodestepsError::catalog_unavailable(source_name, e.to_string()))?;
        Self::from_value(&value, source_name)
    }

    /// Decodes a catalog from an already parsed JSON value.
    ///
    /// # Errors
    ///
    /// Same as [`Catalog::from_json_str`], minus JSON syntax errors.
    pub fn from_value(value: &Value, source_name: &str) -> Result<Self> {
        let records = match value {
            Value::Array(records) => records,
            Value::Object(map) => match map.get("modules") {
                Some(Value::Array(records)) => records,
                _ => {
                    return Err(CodestepsError::catalog_unavailable(
                        source_name,
                        "expected an array of modules or an object with a 'modules' array",
                    ))
                }
            },
            _ => {
                return Err(CodestepsError::catalog_unavailable(
                    source_name,
                    "expected an array of modules or an object with a 'modules' array",
                ))
            }
        };

        let modules = records
            .iter()
            .filter_map(|record| {
                let Some(record) = record.as_object() else {
                    tracing::warn!(source = source_name, "Skipping non-object module record");
                    return None;
                };
                let exercises: Vec<&Value> = match record.get("exercises") {
                    Some(Value::Array(rows)) => rows.iter().collect(),
                    _ => Vec::new(),
                };
                Some(decode_module(record, &exercises))
            })
            .collect();

        Self::new(modules)
    }

    /// Decodes a catalog from a phpMyAdmin-style JSON table export.
    ///
    /// The export is an array of entries; the `modules` and `exercises` tables
    /// are picked by name and exercise rows are grouped by their `module_id`.
    ///
    /// # Errors
    ///
    /// Returns `CodestepsError::CatalogUnavailable` if the dump is not an array,
    /// and `CodestepsError::DuplicateExerciseId` for duplicate exercise ids.
    pub fn from_table_dump(dump: &Value, source_name: &str) -> Result<Self> {
        let Value::Array(entries) = dump else {
            return Err(CodestepsError::catalog_unavailable(
                source_name,
                "table dump must be a JSON array",
            ));
        };

        let module_rows = pick_table(entries, "modules");
        let exercise_rows = pick_table(entries, "exercises");

        let mut by_module: HashMap<ModuleId, Vec<&Value>> = HashMap::new();
        for row in exercise_rows {
            let module_id = row
                .as_object()
                .map_or(0, |r| coerce_id(field(r, &["module_id", "moduleId"])));
            by_module.entry(module_id).or_default().push(row);
        }

        let modules = module_rows
            .iter()
            .filter_map(Value::as_object)
            .map(|record| {
                let id = coerce_id(field(record, &["id"]));
                let rows = by_module.remove(&id).unwrap_or_default();
                decode_module(record, &rows)
            })
            .collect();

        if !by_module.is_empty() {
            tracing::warn!(
                orphan_groups = by_module.len(),
                "Dropping exercise rows whose module_id matches no module"
            );
        }

        Self::new(modules)
    }

    /// Reads and decodes a catalog file.
    ///
    /// This is the one-shot startup acquisition: no retries, no caching.
    ///
    /// # Errors
    ///
    /// Returns `CodestepsError::CatalogUnavailable` if the file is missing,
    /// unreadable, larger than [`MAX_CATALOG_SIZE`], or not a catalog.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source_name = path.display().to_string();

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| CodestepsError::catalog_unavailable(&source_name, e.to_string()))?;
        if metadata.len() > MAX_CATALOG_SIZE {
            return Err(CodestepsError::catalog_unavailable(
                &source_name,
                format!("file is {}KB, limit is 8MB", metadata.len() / 1024),
            ));
        }

        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CodestepsError::catalog_unavailable(&source_name, e.to_string()))?;

        let catalog = Self::from_json_str(&text, &source_name)?;
        tracing::info!(
            source = %source_name,
            modules = catalog.modules.len(),
            exercises = catalog.exercise_count(),
            "Catalog loaded"
        );
        Ok(catalog)
    }

    /// Serializes the normalized catalog as `{ "modules": [...] }`.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Returns the `data` rows of the named table, or nothing.
fn pick_table<'a>(entries: &'a [Value], name: &str) -> &'a [Value] {
    entries
        .iter()
        .find(|entry| {
            entry.get("type").and_then(Value::as_str) == Some("table")
                && entry.get("name").and_then(Value::as_str) == Some(name)
        })
        .and_then(|table| table.get("data"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn decode_module(record: &Map<String, Value>, exercise_rows: &[&Value]) -> Module {
    let id = coerce_id(field(record, &["id"]));
    let exercises = exercise_rows
        .iter()
        .filter_map(|row| row.as_object())
        .map(|row| decode_exercise(row, id))
        .collect();

    Module {
        id,
        title: coerce_string(field(record, &["title"])),
        description: coerce_string(field(record, &["description"])),
        order_index: coerce_int(field(record, &["orderIndex", "order_index"])),
        exercises,
    }
}

fn decode_exercise(record: &Map<String, Value>, parent_id: ModuleId) -> Exercise {
    let module_id = match field(record, &["moduleId", "module_id"]) {
        Some(value) => coerce_id(Some(value)),
        None => parent_id,
    };

    Exercise {
        id: coerce_id(field(record, &["id"])),
        module_id,
        title: coerce_string(field(record, &["title"])),
        instructions: coerce_string(field(
            record,
            &["instructionsHtml", "instructions_html", "instructions"],
        )),
        kind: field(record, &["kind"])
            .and_then(Value::as_str)
            .map_or(ExerciseKind::PuzzleFragment, ExerciseKind::from_tag),
        code_parts: coerce_fragments(field(
            record,
            &["codeParts", "code_parts", "code_parts_json"],
        )),
        canonical_answer: coerce_string(field(
            record,
            &[
                "canonicalAnswer",
                "canonical_answer",
                "orderedCode",
                "ordered_code",
            ],
        )),
        order_index: coerce_int(field(record, &["orderIndex", "order_index"])),
    }
}

/// Returns the first non-null value among the given keys.
fn field<'a>(record: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .find_map(|key| record.get(*key).filter(|v| !v.is_null()))
}

/// Coerces a JSON value to an integer, falling back to `0`.
///
/// Accepts integers, integral floats and strings holding either.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn coerce_int(value: Option<&Value>) -> i64 {
    let from_float = |f: f64| {
        if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 {
            f as i64
        } else {
            0
        }
    };

    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(from_float))
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(from_float))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

/// Coerces a JSON value to an id. Negative or malformed values become `0`.
pub(crate) fn coerce_id(value: Option<&Value>) -> u64 {
    u64::try_from(coerce_int(value)).unwrap_or(0)
}

fn coerce_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => v.to_string(),
        _ => String::new(),
    }
}

fn coerce_fragments(value: Option<&Value>) -> Vec<String> {
    let fragment_text = |v: &Value| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    match value {
        Some(Value::Array(items)) => items.iter().map(fragment_text).collect(),
        Some(Value::String(encoded)) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Array(items)) => items.iter().map(fragment_text).collect(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}
