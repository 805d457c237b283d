//! Watermark removal CLI.
//!
//! This binary is the presentation layer over the library: it collects
//! files, regions, text and exclusions, starts a batch run and prints the
//! worker's events as they arrive.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use watermark_remover::batch::{LogLevel, RunEvent};
use watermark_remover::domain::files::{collect_pdfs_in_dir, push_unique, validate_pdf_file};
use watermark_remover::domain::{
    applicable_regions, collect_text_targets, format_page_range, parse_page_range,
    resolve_output_path, targets_for, ExcludedPages, FileEntry, FillMode, PageSet, Region,
};
use watermark_remover::{AppConfig, BatchRunner, MupdfBackend, RunControl, RunRequest};

/// PDF Watermark Removal Tool
///
/// Removes user-selected regions and text from PDF files and writes
/// cleaned copies next to the originals.
#[derive(Parser)]
#[command(name = "watermark-remover")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean every listed PDF and write the copies
    Process(JobArgs),

    /// Show which pages each file would have regions removed from, without writing
    Plan(JobArgs),

    /// Normalize a page range string
    Pages {
        /// Ranges such as "1-5, 10, 15-20"
        ranges: String,
    },

    /// Extract text from a PDF (for checking a cleaned copy)
    Extract {
        /// Input PDF file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output text file (optional, defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct JobArgs {
    /// PDF files to process
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Add every PDF directly inside this directory
    #[arg(short, long, value_name = "DIR")]
    dir: Vec<PathBuf>,

    /// Region to remove: PAGE:X0,Y0,X1,Y1[:SCOPE[:FILE]] (scope: current, all-pages, all-files)
    #[arg(short, long, value_name = "SPEC")]
    region: Vec<Region>,

    /// JSON file holding a list of regions
    #[arg(long, value_name = "FILE")]
    regions_file: Option<PathBuf>,

    /// Text to remove from every page of every file (can be specified multiple times)
    #[arg(short, long, value_name = "TEXT")]
    text: Vec<String>,

    /// Pages exempt from region removal, e.g. "1, 3-5"
    #[arg(short, long, value_name = "RANGES")]
    exclude: Option<String>,

    /// Fill for removed regions: transparent or white
    #[arg(long, value_name = "MODE")]
    fill: Option<FillMode>,

    /// Suffix added to output file names
    #[arg(long, value_name = "SUFFIX")]
    suffix: Option<String>,

    /// Read p (pause), r (resume) and s (stop) commands from stdin
    #[arg(long)]
    interactive: bool,

    /// Remember these options as the new defaults
    #[arg(long)]
    save_settings: bool,
}

/// Inputs of a job after merging the command line over saved settings.
struct Job {
    files: Vec<FileEntry>,
    regions: Vec<Region>,
    texts: Vec<String>,
    excluded: String,
    fill: FillMode,
    suffix: String,
}

impl Job {
    fn from_args(args: &JobArgs, config: &AppConfig) -> Result<Self> {
        let mut paths = Vec::new();
        push_unique(&mut paths, args.files.iter().cloned());
        for dir in &args.dir {
            let found = collect_pdfs_in_dir(dir)
                .with_context(|| format!("Failed to read directory {}", dir.display()))?;
            if found.is_empty() {
                eprintln!("⚠ No PDF files in {}", dir.display());
            }
            push_unique(&mut paths, found);
        }

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let pages = validate_pdf_file(&path)
                .with_context(|| format!("Cannot add {}", path.display()))?;
            files.push(FileEntry::new(path, pages));
        }

        let mut regions = args.region.clone();
        if let Some(path) = &args.regions_file {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let from_file: Vec<Region> = serde_json::from_str(&raw)
                .with_context(|| format!("Invalid regions in {}", path.display()))?;
            regions.extend(from_file);
        }

        Ok(Self {
            files,
            regions,
            texts: args.text.clone(),
            excluded: args
                .exclude
                .clone()
                .unwrap_or_else(|| config.excluded_pages.clone()),
            fill: args.fill.unwrap_or(config.region_fill_mode),
            suffix: args
                .suffix
                .clone()
                .unwrap_or_else(|| config.output_suffix.clone()),
        })
    }

    fn request(&self) -> RunRequest {
        RunRequest::new(self.files.clone())
            .with_regions(self.regions.clone())
            .with_texts(collect_text_targets(&self.texts))
            .with_excluded_pages(self.excluded.clone())
            .with_fill_mode(self.fill)
            .with_output_suffix(self.suffix.clone())
    }

    fn remember(&self, config: &mut AppConfig) {
        config.excluded_pages = self.excluded.clone();
        config.region_fill_mode = self.fill;
        config.output_suffix = self.suffix.clone();
        let paths: Vec<PathBuf> = self.files.iter().map(|f| f.path.clone()).collect();
        config.remember_files(&paths);
    }
}

/// Runs a batch and prints its events; returns the number of failed files.
fn process(job: &Job, interactive: bool) -> Result<usize> {
    let request = job.request();
    let runner = BatchRunner::new(Arc::new(MupdfBackend::new()));
    let handle = runner.start(request).context("Cannot start processing")?;

    if interactive {
        spawn_stdin_controls(handle.control().clone());
    }

    let mut files = job.files.clone();
    let drain = handle.drain();
    while let Some(batch) = drain.next_batch() {
        for event in &batch {
            event.apply_to(&mut files);
            print_event(event, &files);
        }
        if batch.iter().any(RunEvent::is_finished) {
            break;
        }
    }

    let summary = handle.join()?;
    println!();
    println!(
        "Summary: {} succeeded, {} failed, {} not processed{}",
        summary.stats.success,
        summary.stats.failed,
        summary.stats.waiting,
        if summary.stopped { " (stopped)" } else { "" }
    );
    if let Some(dir) = &summary.output_dir {
        println!("Output folder: {}", dir.display());
    }

    Ok(summary.stats.failed)
}

fn print_event(event: &RunEvent, files: &[FileEntry]) {
    match event {
        RunEvent::Log {
            index,
            level,
            message,
        } => {
            let marker = match level {
                LogLevel::Info => "•",
                LogLevel::Success => "✓",
                LogLevel::Warning => "⚠",
                LogLevel::Error => "✗",
            };
            match index {
                Some(_) => println!("   {} {}", marker, message),
                None => println!("{} {}", marker, message),
            }
        }
        RunEvent::Status { index, status } => {
            if let Some(entry) = files.get(*index) {
                tracing::debug!(file = %entry.display_name, %status, "status changed");
            }
        }
        RunEvent::Progress { completed, total } => {
            tracing::debug!(completed, total, "progress");
        }
        RunEvent::Stats(_) | RunEvent::Finished(_) => {}
    }
}

/// What a line typed during an interactive run asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlCommand {
    TogglePause,
    Resume,
    Stop,
}

impl ControlCommand {
    fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "p" => Some(Self::TogglePause),
            "r" => Some(Self::Resume),
            "s" => Some(Self::Stop),
            _ => None,
        }
    }

    /// Applies the command and returns the message to show.
    fn apply(self, control: &RunControl) -> &'static str {
        match self {
            Self::TogglePause => {
                if control.toggle_pause() {
                    "⏸ Paused"
                } else {
                    "▶ Resumed"
                }
            }
            Self::Resume => {
                control.resume();
                "▶ Resumed"
            }
            Self::Stop => {
                control.stop();
                "⏹ Stopping after the current file"
            }
        }
    }
}

/// Forwards p/r/s lines from stdin to the run's control flags.
fn spawn_stdin_controls(control: RunControl) {
    println!("Commands: p = pause/resume, r = resume, s = stop");
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let Some(command) = ControlCommand::parse(&line) else {
                continue;
            };
            println!("{}", command.apply(&control));
            if command == ControlCommand::Stop {
                break;
            }
        }
    });
}

/// Prints the region plan for each file without touching anything.
fn plan(job: &Job) -> Result<()> {
    job.request().validate().context("Nothing to do")?;

    let excluded = ExcludedPages::parse(&job.excluded);
    if !excluded.is_empty() {
        println!("Excluded pages: {}", excluded.to_range_string());
    }

    for (index, entry) in job.files.iter().enumerate() {
        println!("{} ({} pages)", entry.display_name, entry.page_count);

        for (number, region) in job.regions.iter().enumerate() {
            let pages = targets_for(region, index, entry.page_count);
            if !pages.is_empty() {
                let one_based: PageSet = pages.iter().map(|p| p + 1).collect();
                println!(
                    "   region {} ({}): {} on pages {}",
                    number + 1,
                    region.scope.label(),
                    region.rect,
                    format_page_range(&one_based)
                );
            }
        }

        let page_rects = applicable_regions(&job.regions, &excluded, index, entry.page_count);
        let touched: PageSet = page_rects.keys().map(|p| p + 1).collect();
        if touched.is_empty() {
            println!("   no region removal");
        } else {
            println!("   region removal on pages {}", format_page_range(&touched));
        }

        let texts = collect_text_targets(&job.texts);
        if !texts.is_empty() {
            let list: Vec<String> = texts.iter().map(|t| format!("\"{}\"", t)).collect();
            println!("   text removal on all pages: {}", list.join(", "));
        }

        println!(
            "   → {}",
            resolve_output_path(&entry.path, &job.suffix).display()
        );
    }

    Ok(())
}

fn extract(input: &Path, output: Option<&Path>) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }

    let text = watermark_remover::extract_text(input).with_context(|| "Text extraction failed")?;

    if let Some(output_path) = output {
        std::fs::write(output_path, &text)
            .with_context(|| format!("Failed to write to {}", output_path.display()))?;
        println!(
            "✓ Extracted {} characters → {}",
            text.len(),
            output_path.display()
        );
    } else {
        println!("{}", text);
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn run_job(args: &JobArgs, dry_run: bool) -> Result<()> {
    let config_path = AppConfig::default_path();
    let mut config = config_path
        .as_deref()
        .map(AppConfig::load_or_default)
        .unwrap_or_default();

    let job = Job::from_args(args, &config)?;

    if args.save_settings {
        job.remember(&mut config);
        if let Some(path) = &config_path {
            config
                .save(path)
                .with_context(|| format!("Failed to save settings to {}", path.display()))?;
        }
    }

    if dry_run {
        return plan(&job);
    }

    let failed = process(&job, args.interactive)?;
    if failed > 0 {
        anyhow::bail!("{} file(s) failed", failed);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Process(args) => run_job(args, false)?,
        Commands::Plan(args) => run_job(args, true)?,
        Commands::Pages { ranges } => {
            println!("{}", format_page_range(&parse_page_range(ranges)));
        }
        Commands::Extract { input, output } => extract(input, output.as_deref())?,
    }

    Ok(())
}
