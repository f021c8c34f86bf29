//! PDF Normalizer CLI tool
//!
//! A command-line tool for bringing PDF pages to one consistent geometry.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use glob::glob;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use pdf_normalizer::batch::{run_batch, BatchOperation, BatchOptions, BatchOutcome};
use pdf_normalizer::pdf::{
    add_print_marks, analyze_box_consistency, insert_overlay_page, normalize_document,
    rotate_all_pages, unify_boxes_only, DocumentOptions, MarkOptions, OverlayOptions,
    RotateOutcome,
};

/// PDF Normalizer - Bring every page of a PDF to one consistent geometry
#[derive(Parser)]
#[command(name = "pdf-normalizer")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Scale every page into the document's most common page size
    pdf-normalizer normalize scan.pdf -o normalized.pdf

    # Normalize many files in place, four at a time
    pdf-normalizer normalize --jobs 4 \"orders/*.pdf\"

    # Insert a separator page before the first page
    pdf-normalizer insert order.pdf --text \"Order 42\" --position 0

    # Rotate every page a quarter turn counter-clockwise
    pdf-normalizer rotate order.pdf -- -90

    # Report box problems as JSON
    pdf-normalizer analyze scan.pdf --json")]
struct Cli {
    /// Log debug details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scale and center every page into the dominant page size
    Normalize {
        /// Input PDF files. Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output PDF file path (single input only; default: replace the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Documents processed at the same time
        #[arg(short, long, default_value_t = 4)]
        jobs: usize,
    },

    /// Rewrite all page boxes to the dominant box without moving content
    Unify {
        /// Input PDF files. Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output PDF file path (single input only; default: replace the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Documents processed at the same time
        #[arg(short, long, default_value_t = 4)]
        jobs: usize,
    },

    /// Insert pages with centered text
    Insert {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file path (default: replace the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Text to place on the new pages (empty for blank pages)
        #[arg(long, default_value = "")]
        text: String,

        /// Font size in points
        #[arg(long, default_value_t = 12.0)]
        font_size: f64,

        /// Margin in points
        #[arg(long, default_value_t = 10.0)]
        margin: f64,

        /// 0 = before the first page, -1 = after the last, N = after page N
        #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
        position: i64,

        /// Number of pages to insert
        #[arg(long, default_value_t = 1)]
        count: usize,
    },

    /// Rotate every page clockwise by a multiple of 90 degrees
    Rotate {
        /// Input PDF file
        input: PathBuf,

        /// Degrees, clockwise; negative values turn counter-clockwise
        #[arg(allow_hyphen_values = true)]
        degrees: i64,

        /// Output PDF file path (default: replace the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Draw bleed/trim guides and registration marks on every page
    Marks {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file path (default: replace the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the bleed box outline
        #[arg(long)]
        no_bleed: bool,

        /// Skip the trim box outline
        #[arg(long)]
        no_trim: bool,

        /// Skip the corner registration marks
        #[arg(long)]
        no_registration: bool,
    },

    /// Report page box problems
    Analyze {
        /// PDF file to inspect
        input: PathBuf,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Normalize { inputs, output, jobs } => {
            cmd_batch(inputs, output, jobs, BatchOperation::Normalize)
        }
        Commands::Unify { inputs, output, jobs } => {
            cmd_batch(inputs, output, jobs, BatchOperation::UnifyBoxes)
        }
        Commands::Insert { input, output, text, font_size, margin, position, count } => {
            cmd_insert(input, output, text, font_size, margin, position, count)
        }
        Commands::Rotate { input, degrees, output } => {
            cmd_rotate(input, degrees, output)
        }
        Commands::Marks { input, output, no_bleed, no_trim, no_registration } => {
            cmd_marks(input, output, no_bleed, no_trim, no_registration)
        }
        Commands::Analyze { input, json } => {
            cmd_analyze(input, json)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Log to stderr, filtered by RUST_LOG when it is set
fn init_tracing(verbose: bool) {
    let default = if verbose { "pdf_normalizer=debug" } else { "pdf_normalizer=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Expand glob patterns in input paths
fn expand_globs(patterns: Vec<String>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        // Check if pattern contains glob characters
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let mut matched = false;
            for entry in glob(&pattern).with_context(|| format!("Invalid pattern: {}", pattern))? {
                match entry {
                    Ok(path) => {
                        paths.push(path);
                        matched = true;
                    }
                    Err(e) => tracing::warn!("glob error for {}: {}", pattern, e),
                }
            }
            if !matched {
                bail!("No files matched pattern: {}", pattern);
            }
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }

    // Sort paths for consistent ordering
    paths.sort();
    paths.dedup();

    Ok(paths)
}

fn document_options(output: Option<PathBuf>) -> DocumentOptions {
    DocumentOptions {
        output_path: output,
        ..Default::default()
    }
}

/// Normalize or unify one document, or many on a thread pool
fn cmd_batch(inputs: Vec<String>, output: Option<PathBuf>, jobs: usize, operation: BatchOperation) -> Result<()> {
    let inputs = expand_globs(inputs)?;

    if inputs.len() == 1 {
        let input = &inputs[0];
        let options = document_options(output);
        match operation {
            BatchOperation::Normalize => {
                let report = normalize_document(input, &options)
                    .with_context(|| format!("Failed to normalize {}", input.display()))?;
                println!(
                    "{}: {} pages, {} x {} pt, {} projected, {} skipped",
                    report.output.display(),
                    report.page_count,
                    report.container.width,
                    report.container.height,
                    report.projected_count(),
                    report.skipped.len()
                );
            }
            BatchOperation::UnifyBoxes => {
                let report = unify_boxes_only(input, &options)
                    .with_context(|| format!("Failed to unify {}", input.display()))?;
                println!(
                    "{}: {} pages, boxes {} x {} pt",
                    report.output.display(),
                    report.page_count,
                    report.unified_box.width(),
                    report.unified_box.height()
                );
            }
        }
        return Ok(());
    }

    if output.is_some() {
        bail!("--output can only be used with a single input");
    }

    let options = BatchOptions {
        jobs,
        operation,
        document: DocumentOptions::default(),
    };
    let results = run_batch(&inputs, &options)?;

    let mut failed = 0;
    for (path, result) in &results {
        match result {
            Ok(BatchOutcome::Normalized(report)) => {
                println!("{}: {} pages normalized", path.display(), report.page_count)
            }
            Ok(BatchOutcome::Unified(report)) => {
                println!("{}: {} pages unified", path.display(), report.page_count)
            }
            Err(e) => {
                failed += 1;
                println!("{}: failed: {}", path.display(), e);
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} documents failed", failed, results.len());
    }
    Ok(())
}

fn cmd_insert(
    input: PathBuf,
    output: Option<PathBuf>,
    text: String,
    font_size: f64,
    margin: f64,
    position: i64,
    count: usize,
) -> Result<()> {
    let overlay = OverlayOptions {
        text,
        font_size,
        margin,
        position,
        page_count: count,
    };
    let report = insert_overlay_page(&input, &overlay, &document_options(output))
        .with_context(|| format!("Failed to insert pages into {}", input.display()))?;

    println!(
        "{}: inserted page(s) {:?}, now {} pages{}",
        report.output.display(),
        report.inserted_pages,
        report.page_count,
        if report.truncated { " (text truncated)" } else { "" }
    );
    Ok(())
}

fn cmd_rotate(input: PathBuf, degrees: i64, output: Option<PathBuf>) -> Result<()> {
    let outcome = rotate_all_pages(&input, degrees, &document_options(output))
        .with_context(|| format!("Failed to rotate {}", input.display()))?;

    match outcome {
        RotateOutcome::Unchanged => println!("{}: unchanged", input.display()),
        RotateOutcome::Rotated { output, pages, by } => {
            println!("{}: {} pages rotated by {}", output.display(), pages, by.degrees())
        }
    }
    Ok(())
}

fn cmd_marks(input: PathBuf, output: Option<PathBuf>, no_bleed: bool, no_trim: bool, no_registration: bool) -> Result<()> {
    let marks = MarkOptions {
        bleed_guides: !no_bleed,
        trim_guides: !no_trim,
        registration: !no_registration,
        ..Default::default()
    };
    let report = add_print_marks(&input, &marks, &document_options(output))
        .with_context(|| format!("Failed to add marks to {}", input.display()))?;

    println!("{}: marks added to {} pages", report.output.display(), report.page_count);
    Ok(())
}

/// Show the box problems of a PDF
fn cmd_analyze(input: PathBuf, json: bool) -> Result<()> {
    let report = analyze_box_consistency(&input)
        .with_context(|| format!("Failed to analyze {}", input.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("File: {}", input.display());
    println!("Pages: {}", report.page_count);
    match &report.container {
        Some(container) => println!("Dominant size: {} x {} pt", container.width, container.height),
        None => println!("Dominant size: none (no valid page box)"),
    }

    if report.is_consistent() {
        println!("No problems found");
    } else {
        for error in &report.errors {
            println!(
                "  page {}: {:?} {:?}: {}",
                error.page_index + 1,
                error.box_type,
                error.kind,
                error.message
            );
        }
    }
    Ok(())
}
