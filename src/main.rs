use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use futures_util::StreamExt;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use renumber::rename_engine::{
    BatchReport, ConfigBuilder, Dispatch, FileMutationPort, FileRef, LocalFsPort, MemoryPort,
    PreviewItem, PreviewSummary, ProgressStatus, RenameConfig, RenameExecutor, SortStrategy,
    build_preview, summarize,
};
use renumber::{scan, tui};

#[derive(Debug, Parser)]
#[command(name = "renumber", version, about = "Rename a batch of files to <prefix><number>[.ext]")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Write logs to this file instead of the default location
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the planned renames without touching any file
    Preview {
        dir: PathBuf,
        #[command(flatten)]
        pattern: PatternArgs,
        /// Print items and summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rename the files in a directory
    Apply {
        dir: PathBuf,
        #[command(flatten)]
        pattern: PatternArgs,
        /// Do not ask for confirmation
        #[arg(long, short)]
        yes: bool,
        /// Refuse to run if any new name already exists on disk
        #[arg(long)]
        strict: bool,
        /// Run against an in-memory copy of the directory listing
        #[arg(long)]
        simulate: bool,
    },
    /// Interactive mode (default). Accepts a directory or a list of files.
    Tui { paths: Vec<PathBuf> },
}

#[derive(Debug, Args)]
struct PatternArgs {
    #[arg(long)]
    prefix: String,
    #[arg(long, default_value_t = 1)]
    start: u64,
    #[arg(long, default_value_t = 3)]
    digits: u8,
    /// Drop the original extension
    #[arg(long)]
    no_extension: bool,
    #[arg(long, value_enum, default_value_t = SortStrategy::Natural)]
    sort: SortStrategy,
}

impl PatternArgs {
    fn config(&self) -> Result<RenameConfig> {
        let config = ConfigBuilder::new()
            .prefix(self.prefix.clone())
            .start_number(self.start)
            .digit_count(self.digits)
            .preserve_extension(!self.no_extension)
            .sort_strategy(self.sort)
            .build()?;
        Ok(config)
    }
}

fn init_logging(to_file: Option<PathBuf>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("renumber=info"));

    match to_file {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("Cannot create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_ansi(false)
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Tui { paths: Vec::new() });

    // Interactive mode never logs to the terminal.
    let log_target = match (&command, cli.log_file) {
        (Commands::Tui { .. }, None) => Some(std::env::temp_dir().join("renumber.log")),
        (_, explicit) => explicit,
    };
    init_logging(log_target)?;

    match command {
        Commands::Preview { dir, pattern, json } => run_preview(&dir, &pattern, json),
        Commands::Apply {
            dir,
            pattern,
            yes,
            strict,
            simulate,
        } => run_apply(&dir, &pattern, yes, strict, simulate).await,
        Commands::Tui { paths } => run_interactive(paths).await,
    }
}

#[derive(Serialize)]
struct PreviewOutput<'a> {
    items: &'a [PreviewItem],
    summary: PreviewSummary,
}

fn load(dir: &Path, pattern: &PatternArgs) -> Result<(Vec<FileRef>, RenameConfig, Vec<PreviewItem>)> {
    let files = scan::scan_directory(dir).with_context(|| format!("Cannot read {}", dir.display()))?;
    let config = pattern.config()?;
    let items = build_preview(&files, &config);
    Ok((files, config, items))
}

fn print_preview(items: &[PreviewItem], summary: &PreviewSummary) {
    let width = items.iter().map(|item| item.original.name.chars().count()).max().unwrap_or(0);
    for item in items {
        let marker = if item.has_conflict {
            "!"
        } else if item.is_changed() {
            " "
        } else {
            "="
        };
        println!("{marker} {:<width$}  ->  {}", item.original.name, item.preview_name);
        if let Some(reason) = &item.conflict_reason {
            println!("    {reason}");
        }
    }
    println!(
        "\n{} files: {} to rename, {} conflicts, {} unchanged",
        summary.total_files, summary.valid_renames, summary.conflicts, summary.unchanged
    );
}

fn run_preview(dir: &Path, pattern: &PatternArgs, json: bool) -> Result<()> {
    let (_, _, items) = load(dir, pattern)?;
    let summary = summarize(&items);

    if json {
        let output = PreviewOutput {
            items: &items,
            summary,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_preview(&items, &summary);
    }
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

async fn run_apply(dir: &Path, pattern: &PatternArgs, yes: bool, strict: bool, simulate: bool) -> Result<()> {
    let (files, config, items) = load(dir, pattern)?;

    if simulate {
        let port = MemoryPort::with_files(&files);
        let report = apply_with(Arc::new(port), &files, &config, items, yes, strict).await?;
        println!("(simulated, no files were changed)");
        finish(report)
    } else {
        let report = apply_with(Arc::new(LocalFsPort), &files, &config, items, yes, strict).await?;
        finish(report)
    }
}

async fn apply_with<P: FileMutationPort + 'static>(
    port: Arc<P>,
    files: &[FileRef],
    config: &RenameConfig,
    mut items: Vec<PreviewItem>,
    yes: bool,
    strict: bool,
) -> Result<BatchReport> {
    let executor = RenameExecutor::new(port, Dispatch::Current);

    if strict {
        items = executor.preflight(&items).await;
    }
    let summary = summarize(&items);
    print_preview(&items, &summary);

    if !summary.can_proceed() {
        bail!(
            "Refusing to rename: {} conflict(s), {} file(s) to rename",
            summary.conflicts,
            summary.valid_renames
        );
    }
    if !yes && !confirm(&format!("Rename {} files?", summary.valid_renames))? {
        bail!("Aborted");
    }

    let mut report = BatchReport::default();
    let mut progress = std::pin::pin!(executor.execute(files, config));
    while let Some(event) = progress.next().await {
        report.record(&event);
        let Some(file) = &event.current_file else {
            continue;
        };
        let position = format!("[{}/{}]", event.current_index + 1, event.total);
        let new_name = event.new_name.as_deref().unwrap_or("");
        match event.status {
            ProgressStatus::Processing => {}
            ProgressStatus::Success => println!("{position} {} -> {new_name}", file.name),
            ProgressStatus::Skipped => println!(
                "{position} skipped {}: {}",
                file.name,
                event.message.as_deref().unwrap_or("")
            ),
            ProgressStatus::Failed => eprintln!(
                "{position} FAILED {}: {}",
                file.name,
                event.message.as_deref().unwrap_or("")
            ),
        }
    }
    Ok(report)
}

fn finish(report: BatchReport) -> Result<()> {
    if let Some(error) = &report.batch_error {
        bail!("{error}");
    }
    println!(
        "\n{} renamed, {} failed, {} skipped",
        report.succeeded, report.failed, report.skipped
    );
    info!(
        succeeded = report.succeeded,
        failed = report.failed,
        skipped = report.skipped,
        "batch finished"
    );
    if report.failed > 0 {
        for file in report.failed_files() {
            warn!(file = %file.name, "rename failed");
        }
        bail!("{} file(s) could not be renamed", report.failed);
    }
    Ok(())
}

async fn run_interactive(paths: Vec<PathBuf>) -> Result<()> {
    match paths.as_slice() {
        [] => tui::run_tui(None, Vec::new()).await,
        [single] if single.is_dir() => tui::run_tui(Some(single.to_string_lossy().into_owned()), Vec::new()).await,
        _ => tui::run_tui(None, paths).await,
    }
}
