//! Codesteps CLI
//!
//! Terminal front end for browsing lessons, playing fragment puzzles and
//! managing local progress.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use codesteps_core::{
    arrange, can_advance, check, next_exercise, playable_exercise, Catalog, Config, ExerciseState,
    FileBackend, Key, KeyOutcome, ProgressStore, ProgressSummary, PuzzleSession, UnlockModel,
    Verdict,
};
use codesteps_report::{
    json::JsonGenerator, MarkdownGenerator, ReportGenerator, JSON_REPORT_FILE,
    MARKDOWN_REPORT_FILE,
};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Codesteps - guided coding lessons
///
/// Work through ordered lesson modules by reassembling shuffled code
/// fragments. Each exercise unlocks once the one before it is solved.
#[derive(Parser, Debug)]
#[command(name = "codesteps")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: codesteps.json in current directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Catalog file, overriding the config
    #[arg(long, value_name = "FILE", global = true)]
    catalog: Option<String>,

    /// Progress data directory, overriding the config
    #[arg(long, value_name = "DIR", global = true)]
    data_dir: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List modules and the state of every exercise
    List,

    /// Play a fragment puzzle interactively
    Play {
        /// Exercise id
        exercise: u64,

        /// Seed for a reproducible shuffle
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Check an arrangement given as fragment indices in authored order
    Check {
        /// Exercise id
        exercise: u64,

        /// Fragment indices, each used once, in the order to assemble them
        #[arg(required = true, num_args = 1..)]
        order: Vec<usize>,
    },

    /// Clear all progress
    Reset,

    /// Write Markdown and JSON progress reports
    Report {
        /// Output directory for reports
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<String>,
    },

    /// Convert a database table dump into a catalog file
    ImportDump {
        /// Table dump (JSON export with `modules` and `exercises` tables)
        dump: PathBuf,

        /// Catalog file to write
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(config = ?args.config, command = ?args.command, "Starting");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;

    if let Some(ref catalog) = args.catalog {
        config.catalog.clone_from(catalog);
    }
    if let Some(ref data_dir) = args.data_dir {
        config.data_dir.clone_from(data_dir);
    }
    if let Command::Report {
        output_dir: Some(ref output_dir),
    } = args.command
    {
        config.report_dir.clone_from(output_dir);
    }

    // Re-validate after overrides
    config.validate()?;

    match args.command {
        Command::ImportDump { dump, out } => import_dump(&dump, &out).await,
        Command::Reset => {
            let mut store = ProgressStore::open(&config.data_dir);
            store.reset()?;
            println!("Progress cleared.");
            Ok(())
        }
        Command::List => {
            let catalog = Catalog::load(&config.catalog).await?;
            let store = ProgressStore::open(&config.data_dir);
            print_catalog(&catalog, &UnlockModel::compute(&catalog, &store.load()));
            Ok(())
        }
        Command::Check { exercise, order } => {
            let catalog = Catalog::load(&config.catalog).await?;
            let mut store = ProgressStore::open(&config.data_dir);
            check_order(&catalog, &mut store, exercise, &order)
        }
        Command::Play { exercise, seed } => {
            let catalog = Catalog::load(&config.catalog).await?;
            let mut store = ProgressStore::open(&config.data_dir);
            play(&catalog, &mut store, exercise, seed.or(config.shuffle_seed)).await
        }
        Command::Report { .. } => {
            let catalog = Catalog::load(&config.catalog).await?;
            let store = ProgressStore::open(&config.data_dir);
            let model = UnlockModel::compute(&catalog, &store.load());
            generate_reports(&catalog, &model, Path::new(&config.report_dir))
        }
    }
}

/// Loads configuration from the specified path or default location.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

/// Prints every module with per-exercise state and progress counts.
fn print_catalog(catalog: &Catalog, model: &UnlockModel) {
    let summary = ProgressSummary::compute(catalog, model);

    println!(
        "Progress: {} / {} ({:.0}%)",
        summary.solved,
        summary.total,
        summary.percent()
    );

    for (module, counts) in catalog.modules().iter().zip(&summary.modules) {
        println!();
        println!("{} ({}/{})", module.title, counts.solved, counts.total);

        for exercise in &module.exercises {
            let marker = match model.state_of(exercise.id) {
                ExerciseState::Solved => "[x]",
                ExerciseState::Open => "[ ]",
                ExerciseState::Locked => "[-]",
            };
            println!(
                "  {marker} {:>4}  {} ({})",
                exercise.id, exercise.title, exercise.kind
            );
        }
    }
}

/// Checks a one-shot arrangement of fragment indices.
fn check_order(
    catalog: &Catalog,
    store: &mut ProgressStore<FileBackend>,
    exercise_id: u64,
    order: &[usize],
) -> anyhow::Result<()> {
    let model = UnlockModel::compute(catalog, &store.load());
    let exercise = playable_exercise(catalog, &model, exercise_id)?;

    let count = exercise.code_parts.len();
    let Some(parts) = arrange(&exercise.code_parts, order) else {
        anyhow::bail!(
            "Fragment order must use each index from 0 to {} exactly once\n\nSuggestion: Exercise {exercise_id} has {count} fragments; list every index once, e.g. 'codesteps check {exercise_id} {}'",
            count.saturating_sub(1),
            (0..count).map(|i| i.to_string()).collect::<Vec<_>>().join(" ")
        );
    };

    if check(&parts, &exercise.canonical_answer) {
        store.mark_solved(exercise_id)?;
        println!("Correct! Exercise {exercise_id} solved.");
        print_next(catalog, store, exercise_id);
    } else {
        println!("Not yet. Keep rearranging.");
    }
    Ok(())
}

/// Runs a line-driven puzzle session on stdin.
async fn play(
    catalog: &Catalog,
    store: &mut ProgressStore<FileBackend>,
    exercise_id: u64,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    let mut rng: Box<dyn RngCore> = match seed {
        Some(seed) => Box::new(ChaCha8Rng::seed_from_u64(seed)),
        None => Box::new(rand::thread_rng()),
    };

    let model = UnlockModel::compute(catalog, &store.load());
    let mut session = PuzzleSession::open(catalog, &model, exercise_id, &mut *rng)?;

    if let Some(exercise) = catalog.exercise(exercise_id) {
        println!("{}", exercise.title);
        if !exercise.instructions.is_empty() {
            println!("{}", exercise.instructions);
        }
    }
    print_help();
    print_board(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let words: Vec<&str> = line.split_whitespace().collect();

        match words.as_slice() {
            [] => continue,
            ["quit" | "q" | "exit"] => break,
            ["help" | "?"] => print_help(),
            ["shuffle"] => session.reshuffle(&mut *rng),
            ["select", idx] => {
                if let Ok(idx) = idx.parse() {
                    session.select(idx);
                }
            }
            ["drag", from, to] => match (from.parse(), to.parse()) {
                (Ok(from), Ok(to)) => {
                    session.drag_start(from);
                    session.drag_enter(to);
                    session.drag_drop(to);
                }
                _ => println!("Usage: drag <from> <to>"),
            },
            ["left", idx] => {
                if let Ok(idx) = idx.parse() {
                    session.press_left(idx);
                }
            }
            ["right", idx] => {
                if let Ok(idx) = idx.parse() {
                    session.press_right(idx);
                }
            }
            [word] => match word.parse::<Key>() {
                Ok(key) => {
                    if session.handle_key(key) == KeyOutcome::CheckRequested {
                        match session.submit(store)? {
                            Verdict::Correct => {
                                println!("Correct! Exercise {exercise_id} solved.");
                                print_next(catalog, store, exercise_id);
                                return Ok(());
                            }
                            Verdict::Wrong | Verdict::Idle => println!("Not yet. Keep rearranging."),
                        }
                    }
                }
                Err(e) => println!("{e} (type 'help')"),
            },
            _ => println!("Unknown command (type 'help')"),
        }

        print_board(&session);
    }

    Ok(())
}

fn print_help() {
    println!();
    println!("Commands:");
    println!("  up / down          move the selection");
    println!("  left / right       move the selected fragment");
    println!("  left N / right N   move fragment N one step");
    println!("  select N           select fragment N");
    println!("  drag A B           drag fragment A onto position B");
    println!("  esc                clear the selection");
    println!("  enter              check the arrangement");
    println!("  shuffle            deal the fragments again");
    println!("  quit               leave without checking");
}

fn print_board(session: &PuzzleSession) {
    let arranger = session.arranger();
    println!();
    for (idx, tile) in arranger.tiles().iter().enumerate() {
        let cursor = if arranger.active() == Some(idx) { '>' } else { ' ' };
        println!("{cursor} {idx:>2}  {tile}");
    }
}

/// Tells the learner whether the next exercise is now reachable.
fn print_next(catalog: &Catalog, store: &ProgressStore<FileBackend>, current: u64) {
    let model = UnlockModel::compute(catalog, &store.load());
    match next_exercise(catalog, current) {
        Some(next) if can_advance(catalog, &model, current) => {
            println!("Next up: {} (codesteps play {})", next.title, next.id);
        }
        Some(_) => println!("The next exercise is still locked."),
        None => println!("That was the last exercise. Well done!"),
    }
}

/// Generates reports from the current progress.
///
/// Creates both Markdown and JSON reports in the output directory.
fn generate_reports(catalog: &Catalog, model: &UnlockModel, output_dir: &Path) -> anyhow::Result<()> {
    println!("Generating reports...");

    let report = ReportGenerator::new(catalog, model).generate();

    // Ensure output directory exists
    std::fs::create_dir_all(output_dir)?;

    let md_path = output_dir.join(MARKDOWN_REPORT_FILE);
    std::fs::write(&md_path, MarkdownGenerator::new(&report).generate())?;
    println!("  Markdown report: {}", md_path.display());

    let json_path = output_dir.join(JSON_REPORT_FILE);
    JsonGenerator::new(&report).write_to_file(&json_path, true)?;
    println!("  JSON report: {}", json_path.display());

    println!();
    println!(
        "Solved {} of {} exercises ({:.0}%)",
        report.totals.solved, report.totals.total, report.totals.percent
    );

    Ok(())
}

/// Converts a table dump into a normalized catalog file.
async fn import_dump(dump: &Path, out: &Path) -> anyhow::Result<()> {
    let source_name = dump.display().to_string();
    let text = tokio::fs::read_to_string(dump).await.map_err(|e| {
        anyhow::anyhow!("Failed to read dump '{source_name}': {e}")
    })?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| anyhow::anyhow!("Dump '{source_name}' is not valid JSON: {e}"))?;

    let catalog = Catalog::from_table_dump(&value, &source_name)?;

    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(out, catalog.to_json_pretty()?).await?;

    tracing::info!(
        out = %out.display(),
        modules = catalog.modules().len(),
        exercises = catalog.exercise_count(),
        "Catalog written"
    );
    println!(
        "Wrote {} modules and {} exercises to {}",
        catalog.modules().len(),
        catalog.exercise_count(),
        out.display()
    );
    Ok(())
}
