//! Markdown rendering of progress reports.
//!
//! The document has a summary table followed by one section per module
//! listing every exercise with its state.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use codesteps_core::ExerciseState;

use crate::{ModuleReport, ProgressReport};

/// Generates Markdown from a [`ProgressReport`].
pub struct MarkdownGenerator<'a> {
    report: &'a ProgressReport,
}

impl<'a> MarkdownGenerator<'a> {
    /// Creates a new Markdown generator for the given report.
    #[must_use]
    pub const fn new(report: &'a ProgressReport) -> Self {
        Self { report }
    }

    /// Generates the complete Markdown document.
    #[must_use]
    pub fn generate(&self) -> String {
        let mut output = String::new();

        Self::write_title(&mut output);
        self.write_summary(&mut output);
        for module in &self.report.modules {
            Self::write_module(&mut output, module);
        }
        self.write_footer(&mut output);

        output
    }

    fn write_title(output: &mut String) {
        let _ = writeln!(output, "# Codesteps Progress Report\n");
    }

    /// Writes the summary section with metrics table.
    fn write_summary(&self, output: &mut String) {
        let totals = &self.report.totals;
        let next_up = self.report.next_up.as_ref().map_or_else(
            || {
                if self.report.is_complete() {
                    "All exercises solved".to_string()
                } else {
                    "None".to_string()
                }
            },
            |next| format!("{} (#{})", escape_markdown(&next.title), next.exercise_id),
        );

        let _ = writeln!(output, "## Summary\n");
        let _ = writeln!(output, "| Metric | Value |");
        let _ = writeln!(output, "|--------|-------|");
        let _ = writeln!(output, "| Solved | {} / {} |", totals.solved, totals.total);
        let _ = writeln!(output, "| Completion | {:.1}% |", totals.percent);
        let _ = writeln!(output, "| Modules | {} |", self.report.modules.len());
        let _ = writeln!(output, "| Next Up | {next_up} |");
        let _ = writeln!(output);
    }

    fn write_module(output: &mut String, module: &ModuleReport) {
        let title = if module.title.is_empty() {
            format!("Module {}", module.module_id)
        } else {
            escape_markdown(&module.title)
        };
        let _ = writeln!(output, "## {title} ({}/{})\n", module.solved, module.total);

        if !module.description.trim().is_empty() {
            let _ = writeln!(output, "{}\n", escape_markdown(module.description.trim()));
        }

        if module.exercises.is_empty() {
            let _ = writeln!(output, "*No exercises.*\n");
            return;
        }

        let _ = writeln!(output, "| # | Exercise | Kind | State |");
        let _ = writeln!(output, "|---|----------|------|-------|");
        for exercise in &module.exercises {
            let title = if exercise.title.is_empty() {
                format!("Exercise {}", exercise.exercise_id)
            } else {
                escape_markdown(&exercise.title)
            };
            let _ = writeln!(
                output,
                "| {} | {title} | {} | {} {} |",
                exercise.exercise_id,
                exercise.kind,
                state_icon(exercise.state),
                exercise.state
            );
        }
        let _ = writeln!(output);
    }

    fn write_footer(&self, output: &mut String) {
        let _ = writeln!(output, "---");
        let _ = writeln!(
            output,
            "*Generated by Codesteps at {}*",
            format_timestamp(&self.report.generated_at)
        );
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Format: "YYYY-MM-DD HH:MM:SS UTC"
fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// HTML entity for the state marker, for cross-platform rendering.
const fn state_icon(state: ExerciseState) -> &'static str {
    match state {
        ExerciseState::Solved => "&#9989;",
        ExerciseState::Open => "&#128275;",
        ExerciseState::Locked => "&#128274;",
    }
}

/// Escapes special Markdown characters in text.
///
/// Keeps catalog titles from being read as Markdown formatting or breaking
/// table cells.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for ch in text.chars() {
        match ch {
            '*' | '_' | '`' | '#' | '[' | ']' | '(' | ')' | '!' | '\\' | '<' | '>' | '|' => {
                result.push('\\');
                result.push(ch);
            }
            '\n' => result.push_str("<br>"),
            _ => result.push(ch),
        }
    }

    result
}
