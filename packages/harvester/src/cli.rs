//! Command-line interface for the harvester.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::bold::{bold_dir, check_quality};
use crate::branches::{scan_snapshots, write_branch_links};
use crate::config::{
    FetchConfig, WorkspaceLayout, DEFAULT_RETRIES, DEFAULT_WORKERS, RETRY_DELAY_MS,
};
use crate::convert::convert_all;
use crate::error::Result;
use crate::fetch::{download_cards_with_progress, missing_ids, FetchReport, MissingSource};
use crate::lines::{read_id_list, read_lines, write_lines, write_lines_with_header};
use crate::links::extract_links_file;
use crate::master::{write_master_index, MasterIndexOutcome};
use crate::progress::{self, find_duplicates, ids_in_dir, json_progress, master_ids, md_progress};
use crate::reorder::reorder_dir;

/// Zettel Harvester - Collect the Luhmann card archive into ordered Markdown.
#[derive(Parser)]
#[command(name = "zettel-harvester")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Workspace directory holding all inputs and outputs
    #[arg(short, long, global = true, default_value = ".")]
    pub root: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract branch links from the saved index page (index.txt).
    ExtractLinks,

    /// Extract card links from branch view snapshots.
    BranchLinks,

    /// Order every branch link file into archive order.
    Reorder,

    /// Build master_index.txt from the reordered link files.
    MasterIndex {
        /// Rebuild even when the index already exists
        #[arg(long)]
        regenerate: bool,
    },

    /// Download card records from the archive API.
    Download {
        /// Number of concurrent downloads
        #[arg(short, long, default_value_t = DEFAULT_WORKERS)]
        workers: usize,

        /// Attempts per card
        #[arg(long, default_value_t = DEFAULT_RETRIES)]
        retries: u32,

        /// Delay before the first retry, doubled on each further attempt
        #[arg(long, default_value_t = RETRY_DELAY_MS)]
        retry_delay_ms: u64,

        /// Which cards: master, missing, failed, or a path to an ID list
        #[arg(short, long, default_value = "master")]
        source: String,

        /// Record endpoint, card ID is appended
        #[arg(long)]
        api_url: Option<String>,
    },

    /// Convert saved records into Markdown.
    Convert {
        /// Leave existing Markdown files untouched
        #[arg(long)]
        missing_only: bool,

        /// Convert only the IDs listed in this file
        #[arg(long)]
        ids: Option<PathBuf>,
    },

    /// Report download and conversion progress, writing the missing lists.
    Progress,

    /// List master index cards without a Markdown file.
    Missing,

    /// List cards that occur more than once in the master index.
    Duplicates,

    /// Bold the first word of every Markdown file.
    Bold,

    /// Check that every Markdown file opens with a bolded word.
    CheckBold,
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let layout = WorkspaceLayout::new(&cli.root);

    match cli.command {
        Commands::ExtractLinks => extract_links_command(&layout),
        Commands::BranchLinks => branch_links_command(&layout),
        Commands::Reorder => reorder_command(&layout),
        Commands::MasterIndex { regenerate } => master_index_command(&layout, regenerate),
        Commands::Download {
            workers,
            retries,
            retry_delay_ms,
            source,
            api_url,
        } => {
            let mut config = FetchConfig::default()
                .with_workers(workers)
                .with_retries(retries)
                .with_retry_delay(Duration::from_millis(retry_delay_ms));
            if let Some(url) = api_url {
                config = config.with_api_base_url(url);
            }
            download_command(&layout, &config, &resolve_source(&layout, &source))
        }
        Commands::Convert { missing_only, ids } => {
            convert_command(&layout, missing_only, ids.as_deref())
        }
        Commands::Progress => progress_command(&layout),
        Commands::Missing => missing_command(&layout),
        Commands::Duplicates => duplicates_command(&layout),
        Commands::Bold => bold_command(&layout),
        Commands::CheckBold => check_bold_command(&layout),
    }
}

/// Map the `--source` value to the list of cards it names.
fn resolve_source(layout: &WorkspaceLayout, source: &str) -> MissingSource {
    match source {
        "master" => MissingSource::MasterIndex,
        "missing" => MissingSource::List(layout.missing_jsons()),
        "failed" => MissingSource::List(layout.failed_downloads()),
        path => MissingSource::List(PathBuf::from(path)),
    }
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .expect("valid template")
            .progress_chars("=> "),
    );
    pb
}

fn saved(path: &Path) {
    println!("{} {}", style("Saved to:").green().bold(), path.display());
}

fn extract_links_command(layout: &WorkspaceLayout) -> Result<()> {
    let count = extract_links_file(&layout.index_html(), &layout.parent_links())?;
    println!("Extracted {} branch links", style(count).cyan());
    saved(&layout.parent_links());
    Ok(())
}

fn branch_links_command(layout: &WorkspaceLayout) -> Result<()> {
    let scan = scan_snapshots(&layout.snapshots_dir())?;
    let written = write_branch_links(&scan, &layout.links_dir())?;
    println!("Wrote {} branch link files", style(written.len()).cyan());

    if !scan.anomalies.is_empty() {
        println!(
            "{} {} snapshots with more than one SVG:",
            style("Warning:").yellow().bold(),
            scan.anomalies.len()
        );
        for (name, svgs) in &scan.anomalies {
            println!("  {name} ({svgs} SVGs)");
        }
    }
    Ok(())
}

fn reorder_command(layout: &WorkspaceLayout) -> Result<()> {
    let results = reorder_dir(&layout.links_dir(), &layout.reordered_links_dir())?;
    let total: usize = results.iter().map(|(_, count)| count).sum();
    println!(
        "Reordered {} links in {} files",
        style(total).cyan(),
        style(results.len()).cyan()
    );
    saved(&layout.reordered_links_dir());
    Ok(())
}

fn master_index_command(layout: &WorkspaceLayout, regenerate: bool) -> Result<()> {
    match write_master_index(layout, regenerate)? {
        MasterIndexOutcome::Written(count) => {
            println!("Master index holds {} links", style(count).cyan());
            saved(&layout.master_index());
        }
        MasterIndexOutcome::Kept => {
            println!(
                "{} exists, pass --regenerate to rebuild it",
                layout.master_index().display()
            );
        }
    }
    Ok(())
}

fn download_command(
    layout: &WorkspaceLayout,
    config: &FetchConfig,
    source: &MissingSource,
) -> Result<()> {
    let ids = missing_ids(layout, source)?;
    if ids.is_empty() {
        println!("{}", style("Nothing to download").green());
        return Ok(());
    }

    println!(
        "{} {} cards with {} workers",
        style("Downloading").bold(),
        style(ids.len()).cyan(),
        config.workers
    );

    let pb = progress_bar(ids.len());
    let report = match download_cards_with_progress(&ids, &layout.json_dir(), config, &pb) {
        Ok(report) => report,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };
    pb.finish_and_clear();

    println!("  Saved: {}", style(report.succeeded.len()).green());

    let retryable = report.retryable_ids();
    if retryable.is_empty() {
        remove_stale(&layout.failed_downloads())?;
    } else {
        println!("  Failed, retryable: {}", style(retryable.len()).yellow().bold());
        write_lines(&layout.failed_downloads(), &retryable)?;
        println!(
            "Retry with {}",
            style("zettel-harvester download --source failed").cyan()
        );
        saved(&layout.failed_downloads());
    }

    let fatal = report.fatal_ids();
    if !fatal.is_empty() {
        println!("  Failed permanently: {}", style(fatal.len()).red().bold());
        for (id, error) in report.failed.iter().filter(|(_, e)| !e.is_retryable()) {
            println!("    {id}: {error}");
        }
    }
    let known_fatal = merge_fatal(layout, &report)?;
    if known_fatal.is_empty() {
        remove_stale(&layout.fatal_downloads())?;
    } else {
        write_lines(&layout.fatal_downloads(), &known_fatal)?;
        saved(&layout.fatal_downloads());
    }
    Ok(())
}

/// Permanent failures of earlier runs plus this one, minus cards that have
/// since been fetched or now fail in a retryable way.
fn merge_fatal(layout: &WorkspaceLayout, report: &FetchReport) -> Result<Vec<String>> {
    let path = layout.fatal_downloads();
    let earlier = if path.exists() {
        read_id_list(&path)?
    } else {
        Vec::new()
    };
    let resolved: HashSet<&str> = report
        .succeeded
        .iter()
        .map(String::as_str)
        .chain(report.retryable_ids())
        .collect();

    let mut merged: Vec<String> = Vec::new();
    for id in earlier.iter().map(String::as_str).chain(report.fatal_ids()) {
        if !resolved.contains(id) && !merged.iter().any(|m| m == id) {
            merged.push(id.to_string());
        }
    }
    Ok(merged)
}

/// Delete a failure list left over from an earlier run.
fn remove_stale(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
        tracing::info!(path = %path.display(), "Removed stale failure list");
    }
    Ok(())
}

fn convert_command(layout: &WorkspaceLayout, missing_only: bool, ids: Option<&Path>) -> Result<()> {
    let ids = match ids {
        Some(path) => read_id_list(path)?,
        None => master_ids(layout)?,
    };

    let pb = progress_bar(ids.len());
    let report = match convert_all(layout, &ids, missing_only, &pb) {
        Ok(report) => report,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };
    pb.finish_and_clear();

    println!("  Converted: {}", style(report.converted).green());
    if report.skipped > 0 {
        println!("  Already present: {}", report.skipped);
    }
    if !report.not_ready.is_empty() {
        println!("  Not ready for publication: {}", style(report.not_ready.len()).yellow());
    }
    if !report.missing_json.is_empty() {
        println!("  No saved record: {}", style(report.missing_json.len()).yellow());
    }
    for (id, error) in &report.failed {
        println!("  {} {id}: {error}", style("Failed").red().bold());
    }
    Ok(())
}

fn progress_command(layout: &WorkspaceLayout) -> Result<()> {
    let json = json_progress(layout)?;
    println!(
        "Records:  {}/{} ({:.2}%)",
        style(json.existing).cyan(),
        json.total,
        json.completion()
    );
    write_lines(&layout.missing_jsons(), &json.missing)?;

    let md = md_progress(layout)?;
    println!(
        "Markdown: {}/{} ({:.2}%)",
        style(md.existing).cyan(),
        md.total,
        md.completion()
    );
    println!("  Convertible now: {}", md.missing_md.len());
    println!("  Needing download: {}", md.missing_json.len());
    let missing_md: Vec<&String> = md.missing_md.iter().chain(&md.missing_json).collect();
    write_lines(&layout.missing_mds(), missing_md)?;

    saved(&layout.missing_jsons());
    saved(&layout.missing_mds());
    Ok(())
}

fn missing_command(layout: &WorkspaceLayout) -> Result<()> {
    let expected = master_ids(layout)?;
    let present = ids_in_dir(&layout.md_dir(), "txt")?;
    let missing = progress::missing_ids(&expected, &present);

    println!(
        "{} of {} master index cards have no Markdown file",
        style(missing.len()).cyan(),
        expected.len()
    );
    write_lines_with_header(
        &layout.missing_specific_ids(),
        "IDs present in master_index.txt but missing in index_full_mds",
        &missing,
    )?;
    saved(&layout.missing_specific_ids());
    Ok(())
}

fn duplicates_command(layout: &WorkspaceLayout) -> Result<()> {
    let links = read_lines(&layout.master_index())?;
    let duplicates = find_duplicates(&links);
    if duplicates.is_empty() {
        println!("{}", style("No duplicate cards").green());
        return Ok(());
    }

    println!("{} duplicated cards", style(duplicates.len()).yellow().bold());
    let lines: Vec<String> = duplicates
        .iter()
        .map(|(id, count)| format!("{id}: {count}"))
        .collect();
    write_lines(&layout.duplicates(), &lines)?;
    saved(&layout.duplicates());
    Ok(())
}

fn bold_command(layout: &WorkspaceLayout) -> Result<()> {
    let report = bold_dir(&layout.md_dir())?;
    println!("  Fixed double bolding: {}", report.fixed_double);
    println!("  Already bolded: {}", report.already_bolded);
    println!("  Newly bolded: {}", style(report.bolded).green());
    println!("  Empty: {}", report.empty);
    if !report.too_long.is_empty() {
        println!(
            "  First word too long: {}",
            style(report.too_long.len()).yellow()
        );
    }
    Ok(())
}

fn check_bold_command(layout: &WorkspaceLayout) -> Result<()> {
    let report = check_quality(&layout.md_dir())?;
    println!("Files analyzed: {}", report.total);
    if report.total == 0 {
        return Ok(());
    }
    for (stars, files) in &report.distribution {
        println!(
            "  {stars} asterisks: {files} files ({:.2}%)",
            *files as f64 / report.total as f64 * 100.0
        );
    }

    if report.issues.is_empty() {
        println!("{}", style("All files are bolded correctly").green());
        return Ok(());
    }

    println!(
        "{} files without proper bolding",
        style(report.issues.len()).yellow().bold()
    );
    let issues: Vec<String> = report
        .issues
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    write_lines_with_header(
        &layout.bolding_issues(),
        "Files without proper bolding (should start with ** and have closing **)",
        &issues,
    )?;
    saved(&layout.bolding_issues());
    Ok(())
}
