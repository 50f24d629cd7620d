//! Main entry point for the zipcat CLI application.
//!
//! Opens the archive from a local path, an HTTP URL or stdin, runs the
//! extraction pipeline and writes the resulting report.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use zipcat::{
    Cli, EntryOutcome, ExtensionRegistry, ExtractError, ExtractionResult, HttpRangeReader,
    LocalFileReader, MemoryReader, Progress, ReadAt, RunObserver, ZipArchive, ZipFileEntry, run,
};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(&cli);

    if !cli.has_zip_name() {
        eprintln!(
            "{} does not look like a ZIP archive (use --force to read it anyway)",
            cli.archive_name()
        );
        return Ok(ExitCode::FAILURE);
    }

    if cli.is_http_url() {
        let reader = Arc::new(HttpRangeReader::new(cli.file.clone()).await?);
        let code = process_zip(reader.clone(), &cli).await?;

        if !cli.is_quiet() {
            eprintln!(
                "\nTotal bytes transferred: {}",
                format_size(reader.transferred_bytes())
            );
        }
        Ok(code)
    } else if cli.is_stdin() {
        let mut data = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut data)
            .await
            .context("Failed to read archive from stdin")?;
        process_zip(Arc::new(MemoryReader::new(data)), &cli).await
    } else {
        let reader = Arc::new(LocalFileReader::new(Path::new(&cli.file))?);
        process_zip(reader, &cli).await
    }
}

/// `RUST_LOG` wins; otherwise warnings, or errors only with `-qq`.
fn init_logging(cli: &Cli) {
    let default = if cli.is_very_quiet() { "error" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

/// Open the archive and either list it or extract its code files into a report.
async fn process_zip<R: ReadAt + 'static>(reader: Arc<R>, cli: &Cli) -> Result<ExitCode> {
    let archive = match ZipArchive::open(reader).await {
        Ok(archive) => archive,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Make sure the file is a complete, undamaged ZIP archive.");
            return Ok(ExitCode::FAILURE);
        }
    };

    if cli.list || cli.verbose {
        list_files(&archive, cli.verbose);
        return Ok(ExitCode::SUCCESS);
    }

    let mut console = ConsoleProgress { quiet: cli.is_quiet() };
    let result = match run(&archive, &mut console).await {
        Ok(result) => result,
        Err(e @ ExtractError::NoCodeFilesFound { .. }) => {
            eprintln!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    if !result.has_content() {
        eprintln!(
            "None of the {} code files could be read, nothing to write",
            result.entries.len()
        );
        return Ok(ExitCode::FAILURE);
    }

    write_report(&result, cli).await?;
    Ok(ExitCode::SUCCESS)
}

/// Per-entry status lines with the running percentage, on stderr.
struct ConsoleProgress {
    quiet: bool,
}

impl RunObserver for ConsoleProgress {
    fn on_start(&mut self, total_entries: usize, candidates: usize) {
        if !self.quiet {
            eprintln!(
                "Found {} code files out of {} entries",
                candidates, total_entries
            );
        }
    }

    fn on_entry(&mut self, outcome: &EntryOutcome, progress: Progress) {
        if self.quiet {
            return;
        }
        let status = match outcome.error {
            None => format!("✓ {}", outcome.path),
            Some(ref reason) => format!("✗ {} ({})", outcome.path, reason),
        };
        eprintln!(
            "{:>4}% ({} of {})  {}",
            progress.percentage(),
            progress.processed,
            progress.total,
            status
        );
    }
}

/// Write the report to stdout in pipe mode, or to its output file.
async fn write_report(result: &ExtractionResult, cli: &Cli) -> Result<()> {
    if cli.pipe {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(result.aggregated_text.as_bytes()).await?;
        stdout.flush().await?;
        return Ok(());
    }

    let output_path = cli.output_path(chrono::Utc::now());
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    tokio::fs::write(&output_path, result.aggregated_text.as_bytes())
        .await
        .with_context(|| format!("Failed to write {}", output_path.display()))?;
    log::info!("Report written to {}", output_path.display());

    if !cli.is_very_quiet() {
        eprintln!(
            "\nExtracted {} of {} code files into {} ({})",
            result.succeeded_count(),
            result.entries.len(),
            output_path.display(),
            format_size(result.aggregated_text.len() as u64)
        );
    }
    Ok(())
}

/// List the archive.
///
/// - Simple format (`-l`): code file names, one per line
/// - Verbose format (`-v`): every entry with size, ratio, timestamp and language
fn list_files<R: ReadAt>(archive: &ZipArchive<R>, verbose: bool) {
    let registry = ExtensionRegistry::builtin();

    if !verbose {
        for entry in archive.entries() {
            if !entry.is_directory && registry.classify(&entry.file_name).is_some() {
                println!("{}", entry.file_name);
            }
        }
        return;
    }

    println!(
        "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  {:<12}  Name",
        "Length", "Size", "Cmpr", "Date", "Time", "Language"
    );
    println!("{}", "-".repeat(84));

    let mut totals = ListingTotals::default();

    for entry in archive.entries() {
        let (year, month, day) = entry.mod_date();
        let (hour, minute, _second) = entry.mod_time();
        let language = if entry.is_directory {
            None
        } else {
            registry.classify(&entry.file_name)
        };

        println!(
            "{:>10}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {:<12}  {}",
            entry.uncompressed_size,
            entry.compressed_size,
            ratio(entry.compressed_size, entry.uncompressed_size),
            year,
            month,
            day,
            hour,
            minute,
            language.unwrap_or("-"),
            entry.file_name
        );

        if language.is_some() {
            totals.add(entry);
        }
    }

    println!("{}", "-".repeat(84));
    println!(
        "{:>10}  {:>10}  {}  {:>31}  {} code files",
        totals.uncompressed,
        totals.compressed,
        ratio(totals.compressed, totals.uncompressed),
        "",
        totals.code_files
    );
}

/// Running sums for the `-v` summary line.
///
/// Sizes come straight from the Central Directory, so they saturate
/// instead of overflowing.
#[derive(Debug, Default)]
struct ListingTotals {
    uncompressed: u64,
    compressed: u64,
    code_files: usize,
}

impl ListingTotals {
    fn add(&mut self, entry: &ZipFileEntry) {
        self.uncompressed = self.uncompressed.saturating_add(entry.uncompressed_size);
        self.compressed = self.compressed.saturating_add(entry.compressed_size);
        self.code_files += 1;
    }
}

/// Percentage saved by compression, as a fixed-width column.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed > 0 {
        let kept = i64::try_from(compressed.saturating_mul(100) / uncompressed).unwrap_or(i64::MAX);
        let saved = 100i64.saturating_sub(kept);
        format!("{:>4}%", saved)
    } else {
        "  0%".to_string()
    }
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
