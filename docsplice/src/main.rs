//! docsplice: insert generated JSDoc comments into TypeScript sources.
//!
//! Reads a proposal batch written by a comment generator and splices each
//! proposal above the declaration it describes:
//!
//! - `docsplice -p docs.json` processes every file named in the batch
//! - `docsplice -p docs.json src/ 'lib/**/*.ts'` restricts to the given files

mod report;

use anyhow::{Context, Result};
use clap::Parser;
use docsplice::{process_files, FileJob, PipelineOptions, ProposalBatch, RenderOptions};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "docsplice",
    about = "Insert generated JSDoc comments into TypeScript sources"
)]
struct Cli {
    /// Input files, directories or glob patterns. Defaults to every file in the batch.
    files: Vec<String>,

    /// Proposal batch (JSON) produced by the comment generator
    #[arg(short = 'p', long)]
    proposals: PathBuf,

    /// Report what would change without writing any file
    #[arg(long)]
    dry_run: bool,

    /// Number of files processed in parallel (default: available cores)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Report format: text (default), json
    #[arg(short = 'f', long, default_value = "text")]
    format: String,

    /// Skip paths matching this regex. Can be specified multiple times.
    #[arg(long)]
    exclude: Vec<String>,

    /// Also process test files (*.test.ts, *.spec.ts, __tests__/)
    #[arg(long)]
    include_tests: bool,

    /// Wrap summaries at this many characters
    #[arg(long)]
    wrap: Option<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let renderer = report::create_renderer(&cli.format)?;
    let batch = ProposalBatch::load(&cli.proposals)?;

    let files = if cli.files.is_empty() {
        batch.paths()
    } else {
        expand_globs(&cli.files)?
    };
    let exclusions = build_exclusions(&cli.exclude, cli.include_tests)?;
    let jobs: Vec<FileJob> = files
        .into_iter()
        .filter(|path| !is_excluded(path, &exclusions))
        .map(|path| FileJob::from_source(path, &batch))
        .collect();
    if jobs.is_empty() {
        log::warn!("no files to process");
    }

    let options = PipelineOptions {
        dialect: None,
        render: RenderOptions {
            wrap_width: cli.wrap,
        },
        dry_run: cli.dry_run,
    };
    let concurrency = cli.jobs.unwrap_or_else(default_jobs);
    let results =
        process_files(&jobs, &options, concurrency).context("failed to start worker pool")?;

    let report = report::Report::from_results(results);
    print!("{}", renderer.render(&report));

    let failed = report.totals().failed;
    if failed > 0 {
        anyhow::bail!("{} of {} files failed", failed, report.files.len());
    }
    Ok(())
}

fn default_jobs() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

/// File extensions recognized as TypeScript sources.
const SUPPORTED_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts"];

/// `*.test.ts`, `*.spec.tsx`, anything under `__tests__/`.
const TEST_FILE_PATTERN: &str = r"(^|/)__tests__/|\.(test|spec)\.[cm]?tsx?$";

/// Resolve command-line inputs to TypeScript files.
///
/// An input is a file, a directory (its direct TypeScript children) or a
/// glob pattern. The result is sorted and free of duplicates.
fn expand_globs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_file() {
            files.push(path.to_path_buf());
        } else if path.is_dir() {
            files.extend(typescript_children(path)?);
        } else {
            files.extend(glob_files(pattern)?);
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// TypeScript files directly inside `dir`; subdirectories are not entered.
fn typescript_children(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?;
    Ok(entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && has_supported_extension(p))
        .collect())
}

fn glob_files(pattern: &str) -> Result<Vec<PathBuf>> {
    let matches: Vec<PathBuf> = glob::glob(pattern)
        .with_context(|| format!("invalid glob pattern: {}", pattern))?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();
    if matches.is_empty() {
        log::warn!("no files matched: {}", pattern);
    }
    Ok(matches)
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext))
}

fn build_exclusions(patterns: &[String], include_tests: bool) -> Result<Vec<Regex>> {
    let mut exclusions = Vec::new();
    if !include_tests {
        exclusions.push(Regex::new(TEST_FILE_PATTERN)?);
    }
    for pattern in patterns {
        let re = Regex::new(pattern)
            .with_context(|| format!("invalid exclude pattern: {}", pattern))?;
        exclusions.push(re);
    }
    Ok(exclusions)
}

fn is_excluded(path: &Path, exclusions: &[Regex]) -> bool {
    let text = path.to_string_lossy().replace('\\', "/");
    let excluded = exclusions.iter().any(|re| re.is_match(&text));
    if excluded {
        log::debug!("excluded {}", path.display());
    }
    excluded
}
