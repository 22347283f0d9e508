//! CLI tool for redacting sensitive text from PowerPoint files.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use redact_core::{parse_detection_map, report_path_for, Redactor, SanitizationReport};
use redact_pptx::PptxDocument;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Replace sensitive text in PowerPoint decks while keeping their formatting.
#[derive(Parser, Debug)]
#[command(name = "pptx-redact")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print each slide's text and element counts as JSON
    Extract {
        /// Input PowerPoint file (.pptx)
        input: PathBuf,
    },

    /// Apply detections to a deck and write the sanitized copy and a report
    Redact {
        /// Input PowerPoint file (.pptx)
        input: PathBuf,

        /// JSON file of detections keyed by slide number
        #[arg(short, long)]
        detections: PathBuf,

        /// Sanitized output file (default: <input>_sanitized.pptx)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Report file (default: output with a .json extension)
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Do not print the summary
        #[arg(short, long)]
        quiet: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    match args.command {
        Command::Extract { input } => extract(&input),
        Command::Redact {
            input,
            detections,
            output,
            report,
            quiet,
        } => {
            let output = output.unwrap_or_else(|| sanitized_path_for(&input));
            let report = report.unwrap_or_else(|| report_path_for(&output));
            redact(&input, &detections, &output, &report, quiet)
        }
    }
}

/// Print the extracted slide data of a deck.
fn extract(input: &Path) -> Result<()> {
    let document = PptxDocument::open(input)
        .with_context(|| format!("Failed to open {}", input.display()))?;

    let json = serde_json::to_string_pretty(&document.slide_data())
        .context("Failed to serialize slide data")?;
    println!("{}", json);

    Ok(())
}

/// Apply detections, save the sanitized deck, and write the report.
fn redact(
    input: &Path,
    detections_path: &Path,
    output: &Path,
    report_path: &Path,
    quiet: bool,
) -> Result<()> {
    let detections_json = std::fs::read_to_string(detections_path)
        .with_context(|| format!("Failed to read {}", detections_path.display()))?;
    let detections = parse_detection_map(&detections_json)
        .with_context(|| format!("Failed to parse {}", detections_path.display()))?;

    let mut document = PptxDocument::open(input)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    document.set_output_path(output);

    let summary = Redactor::new().apply_to_deck(&mut document, &detections);
    if !summary.success {
        bail!(
            "Replacement failed: {}",
            summary.error.as_deref().unwrap_or("unknown error")
        );
    }

    let report = SanitizationReport::new(
        input.display().to_string(),
        output.display().to_string(),
        document.slide_count(),
        &detections,
        summary.total_replacements,
    );
    write_output(report_path, &report.to_json()?)?;
    log::info!("Report saved: {}", report_path.display());

    if !quiet {
        for line in report.summary_lines() {
            println!("{}", line);
        }
    }

    Ok(())
}

/// Default sanitized output path: `<stem>_sanitized.<ext>` next to the input.
fn sanitized_path_for(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("pptx");

    input.with_file_name(format!("{}_sanitized.{}", stem, extension))
}

/// Write output to a file.
fn write_output(path: &Path, content: &str) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}
