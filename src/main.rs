// src/main.rs
use clap::{Parser, Subcommand};
use image_labeler::document::DocxDocument;
use image_labeler::extractors::collect_images;
use image_labeler::matcher::{self, RenameMapping, RenamePlan};
use image_labeler::storage::naming::{self, NamingConfig};
use image_labeler::storage::{
    save_report, ExtractionReport, ItemFailure, PreviewReport, StorageManager,
};
use image_labeler::utils::{self, AppError};
use std::path::{Path, PathBuf};

/// Labels images inside DOCX files by chapter / exercise / figure
/// and renames them from a metadata list
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Debug-level logging (RUST_LOG still takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the name every image would get, without writing anything
    Preview {
        /// DOCX file to inspect
        docx: PathBuf,

        /// Literal appended to the trimmed document name
        #[arg(long, env = "IMAGE_LABELER_MARKER", default_value = naming::DEFAULT_MARKER)]
        marker: String,

        /// Write a JSON run report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Extract every embedded image under its labeled name
    Extract {
        /// DOCX file to extract from
        docx: PathBuf,

        /// Output directory for extracted images
        #[arg(short, long, env = "IMAGE_LABELER_OUTPUT", default_value = "images")]
        output_dir: PathBuf,

        /// Literal appended to the trimmed document name
        #[arg(long, env = "IMAGE_LABELER_MARKER", default_value = naming::DEFAULT_MARKER)]
        marker: String,

        /// Write a JSON run report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Rename extracted images to the names listed in a JSON metadata file
    Rename {
        /// Folder holding the extracted images
        images_dir: PathBuf,

        /// JSON array of objects with a "filename" field
        metadata: PathBuf,

        /// Only print what would be renamed
        #[arg(long)]
        dry_run: bool,

        /// Write a JSON run report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

fn main() -> Result<(), AppError> {
    // 1. Parse CLI Arguments
    let args = Args::parse();

    // 2. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging(if args.verbose { "debug" } else { "info" });
    tracing::debug!("Starting with args: {:?}", args);

    match args.command {
        Command::Preview { docx, marker, report } => {
            run_preview(&docx, &naming_config(marker), report.as_deref())
        }
        Command::Extract { docx, output_dir, marker, report } => {
            run_extract(&docx, &output_dir, &naming_config(marker), report.as_deref())
        }
        Command::Rename { images_dir, metadata, dry_run, report } => {
            run_rename(&images_dir, &metadata, dry_run, report.as_deref())
        }
    }
}

fn naming_config(marker: String) -> NamingConfig {
    NamingConfig { marker, ..NamingConfig::default() }
}

fn run_preview(
    docx: &Path,
    config: &NamingConfig,
    report_path: Option<&Path>,
) -> Result<(), AppError> {
    let document = DocxDocument::open(docx)?;
    let collection = collect_images(&document);
    let base_name = naming::base_name(document.path(), config);
    let preview = PreviewReport::from_collection(&collection, &base_name, config);

    println!("Document: {}", docx.display());
    for image in &preview.images {
        println!("{}", image.file_name);
        if image.context.trim().is_empty() {
            println!("    Context: [image-only paragraph]");
        } else {
            println!("    Context: {}", image.context);
        }
    }
    for failure in &preview.unresolved {
        println!("UNRESOLVED {}: {}", failure.item, failure.reason);
    }
    for skipped in &preview.skipped {
        println!("SKIPPED {}: {}", skipped.item, skipped.reason);
    }
    println!(
        "Total: {} image(s) would be extracted, {} unresolved, {} skipped",
        preview.images.len(),
        preview.unresolved.len(),
        preview.skipped.len()
    );

    if let Some(path) = report_path {
        save_report(path, "preview", &preview)?;
    }
    Ok(())
}

fn run_extract(
    docx: &Path,
    output_dir: &Path,
    config: &NamingConfig,
    report_path: Option<&Path>,
) -> Result<(), AppError> {
    // 3. Open the document; failure here aborts before any image is touched
    let document = DocxDocument::open(docx)?;
    let base_name = naming::base_name(document.path(), config);
    tracing::info!("Base name: '{}'", base_name);

    // 4. Labeling pass (strictly sequential)
    let collection = collect_images(&document);
    if collection.images.is_empty() && collection.failures.is_empty() {
        tracing::warn!("No images found to save.");
        if let Some(path) = report_path {
            let report = ExtractionReport {
                base_name,
                skipped: collection.skipped.iter().map(ItemFailure::from).collect(),
                ..ExtractionReport::default()
            };
            save_report(path, "extract", &report)?;
        }
        return Ok(());
    }

    // 5. Write images
    let storage = StorageManager::new(output_dir)?;
    let report = storage.save_images(&collection, &base_name, config);

    log_failures("Not saved", &report.failures);
    log_failures("Skipped", &report.skipped);
    tracing::info!(
        "Saved {}/{} image(s) to '{}'",
        report.saved.len(),
        report.total,
        storage.base_dir().display()
    );
    tracing::info!("Labels used: {:?}", report.labels_used);

    if let Some(path) = report_path {
        save_report(path, "extract", &report)?;
    }

    if report.saved.is_empty() {
        return Err(AppError::Processing(format!(
            "Failed to save any of {} image(s) from {}",
            report.total,
            docx.display()
        )));
    }
    Ok(())
}

fn run_rename(
    images_dir: &Path,
    metadata_path: &Path,
    dry_run: bool,
    report_path: Option<&Path>,
) -> Result<(), AppError> {
    if !images_dir.is_dir() {
        return Err(AppError::Config(format!(
            "Image folder does not exist: {}",
            images_dir.display()
        )));
    }

    // Metadata must parse before any file is considered
    let entries = matcher::load_metadata(metadata_path)?;
    let mapping = RenameMapping::from_metadata(&entries);

    let files = matcher::list_image_files(images_dir)?;
    tracing::info!("Found {} image file(s) in {}", files.len(), images_dir.display());

    let plans = matcher::plan_renames(&files, &mapping);

    let report = if dry_run {
        print_plan(&plans);
        matcher::dry_run_report(&plans)
    } else {
        let storage = StorageManager::new(images_dir)?;
        matcher::apply_renames(&plans, &storage)
    };

    log_failures("Unmatched", &report.unmatched);
    log_failures("Rename failed", &report.failed);
    tracing::info!(
        "{}: {}, already named: {}, unmatched: {}, failed: {}, total: {}",
        if report.dry_run { "Would rename" } else { "Renamed" },
        report.renamed.len(),
        report.already_named.len(),
        report.unmatched.len(),
        report.failed.len(),
        report.total
    );

    if let Some(path) = report_path {
        save_report(path, "rename", &report)?;
    }
    Ok(())
}

fn print_plan(plans: &[RenamePlan]) {
    let mut will_rename = 0;
    let mut not_found = 0;
    let mut rejected = 0;
    for plan in plans {
        match plan {
            RenamePlan::Rename { old, new, key } => {
                will_rename += 1;
                println!("{}\n    -> {}\n    key: '{}'", old, new, key);
            }
            RenamePlan::AlreadyNamed { name, key } => {
                println!("{} (already named, key '{}')", name, key);
            }
            RenamePlan::Unmatched { name, key: Some(key) } => {
                not_found += 1;
                println!("{}\n    key '{}' not in mapping", name, key);
            }
            RenamePlan::Unmatched { name, key: None } => {
                not_found += 1;
                println!("{}\n    no key extracted", name);
            }
            RenamePlan::Rejected { name, target, key } => {
                rejected += 1;
                println!("{}\n    refused: '{}' (key '{}') leaves the folder", name, target, key);
            }
        }
    }
    println!(
        "Would rename: {}, unmatched: {}, refused: {}, total: {}",
        will_rename,
        not_found,
        rejected,
        plans.len()
    );
}

fn log_failures(what: &str, failures: &[ItemFailure]) {
    for failure in failures {
        tracing::warn!("{}: {} ({})", what, failure.item, failure.reason);
    }
}
