//! Batch processing command for multiple invoice files.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, warn};

use schet_core::{
    InvoiceExtractionResult, Pipeline, SourceDocument, YandexVisionClient, YandexVisionConfig,
};

use super::{load_config, load_rules, media_type_for};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory for per-file JSON results
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct FileResult {
    path: PathBuf,
    result: Option<InvoiceExtractionResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(
    args: BatchArgs,
    config_path: Option<&str>,
    rules_path: Option<&str>,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    // Fail fast on a broken rule file, but re-read it per document below
    // so operator edits take effect mid-batch.
    let rules = load_rules(rules_path)?;
    let rules_path: Option<String> = rules_path.map(str::to_string);

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| media_type_for(p).is_ok())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    let continue_on_error = args.continue_on_error;
    let worker_pb = pb.clone();
    let results = tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<FileResult>> {
        let ocr = YandexVisionClient::new(YandexVisionConfig::from_env())?;
        let pipeline = Pipeline::with_rules(config, Box::new(ocr), rules);

        let mut results = Vec::with_capacity(files.len());
        for path in files {
            let file_start = Instant::now();
            let outcome = process_single_file(&path, &pipeline, rules_path.as_deref());
            let processing_time_ms = file_start.elapsed().as_millis() as u64;

            match outcome {
                Ok(result) => {
                    results.push(FileResult {
                        path,
                        result: Some(result),
                        error: None,
                        processing_time_ms,
                    });
                }
                Err(e) => {
                    let error_msg = e.to_string();
                    if continue_on_error {
                        warn!("Failed to process {}: {}", path.display(), error_msg);
                        results.push(FileResult {
                            path,
                            result: None,
                            error: Some(error_msg),
                            processing_time_ms,
                        });
                    } else {
                        error!("Failed to process {}: {}", path.display(), error_msg);
                        anyhow::bail!("Processing failed: {}", error_msg);
                    }
                }
            }
            worker_pb.inc(1);
        }
        Ok(results)
    })
    .await??;

    pb.finish_with_message("Complete");

    let succeeded = results.iter().filter(|r| r.result.is_some()).count();
    let failed = results.len() - succeeded;

    if let Some(ref output_dir) = args.output_dir {
        for file_result in &results {
            if let Some(ref result) = file_result.result {
                let stem = file_result
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("invoice");
                let out_path = output_dir.join(format!("{stem}.json"));
                fs::write(&out_path, serde_json::to_string_pretty(result)?)?;
            }
        }
    }

    if let Some(ref summary_path) = args.summary {
        write_summary_csv(summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!(
        "{} Processed {} files: {} succeeded, {} failed",
        style("✓").green(),
        results.len(),
        succeeded,
        failed
    );

    Ok(())
}

fn process_single_file(
    path: &PathBuf,
    pipeline: &Pipeline,
    rules_path: Option<&str>,
) -> anyhow::Result<InvoiceExtractionResult> {
    // Fresh rule-set per document; an edited file applies to the next one.
    let rules = load_rules(rules_path)?;
    let media_type = media_type_for(path)?;
    let bytes = fs::read(path)?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document")
        .to_string();
    let document = SourceDocument::new(bytes, media_type, file_name);
    Ok(pipeline.run_with_rules(&document, &rules)?)
}

/// One row per file: resolved fields flattened, empty cells for misses.
fn write_summary_csv(path: &PathBuf, results: &[FileResult]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "file",
        "invoice_number",
        "invoice_date",
        "due_date",
        "total_amount",
        "vat_amount",
        "contractor_name",
        "contractor_tax_id",
        "resolved",
        "time_ms",
        "error",
    ])?;

    for file_result in results {
        let file = file_result.path.display().to_string();
        let time_ms = file_result.processing_time_ms.to_string();

        match (&file_result.result, &file_result.error) {
            (Some(result), _) => {
                writer.write_record([
                    file.as_str(),
                    result.invoice_number.as_deref().unwrap_or(""),
                    &result
                        .invoice_date
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_default(),
                    &result
                        .due_date
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_default(),
                    &result
                        .total_amount
                        .map(|a| a.to_string())
                        .unwrap_or_default(),
                    &result.vat_amount.map(|a| a.to_string()).unwrap_or_default(),
                    result.contractor_name.as_deref().unwrap_or(""),
                    result.contractor_tax_id.as_deref().unwrap_or(""),
                    &result.resolved_count().to_string(),
                    &time_ms,
                    "",
                ])?;
            }
            (None, error) => {
                writer.write_record([
                    file.as_str(),
                    "",
                    "",
                    "",
                    "",
                    "",
                    "",
                    "",
                    "0",
                    &time_ms,
                    error.as_deref().unwrap_or("unknown"),
                ])?;
            }
        }
    }

    writer.flush()?;
    Ok(())
}
