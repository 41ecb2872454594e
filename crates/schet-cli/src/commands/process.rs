//! Process command - extract fields from a single invoice file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use schet_core::{
    FieldStatus, InvoiceExtractionResult, Pipeline, SourceDocument, YandexVisionClient,
    YandexVisionConfig,
};

use super::{load_config, load_rules, media_type_for};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or image)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Include rejected candidates in the text summary
    #[arg(long)]
    show_rejected: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Full result as JSON, diagnostics included
    Json,
    /// Human-readable field summary
    Text,
}

pub async fn run(
    args: ProcessArgs,
    config_path: Option<&str>,
    rules_path: Option<&str>,
) -> anyhow::Result<()> {
    let start = Instant::now();

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let config = load_config(config_path)?;
    let rules = load_rules(rules_path)?;
    let media_type = media_type_for(&args.input)?;

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {msg}")
            .unwrap()
            .progress_chars("##-"),
    );

    pb.set_message("Loading document...");
    pb.set_position(10);

    let bytes = fs::read(&args.input)?;
    let file_name = args
        .input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document")
        .to_string();
    let document = SourceDocument::new(bytes, media_type, file_name);

    pb.set_message("Running pipeline...");
    pb.set_position(40);

    // The OCR client is blocking; keep it off the async runtime.
    let result = tokio::task::spawn_blocking(move || {
        let ocr = YandexVisionClient::new(YandexVisionConfig::from_env())?;
        let pipeline = Pipeline::with_rules(config, Box::new(ocr), rules);
        pipeline.run(&document)
    })
    .await??;

    pb.set_position(100);
    pb.finish_with_message("Done");

    let output = format_result(&result, args.format, args.show_rejected)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Render a result in the requested format.
pub fn format_result(
    result: &InvoiceExtractionResult,
    format: OutputFormat,
    show_rejected: bool,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Text => Ok(format_text(result, show_rejected)),
    }
}

fn format_text(result: &InvoiceExtractionResult, show_rejected: bool) -> String {
    let mut out = String::new();

    for record in &result.diagnostics.per_field {
        let value = match record.status {
            FieldStatus::Resolved => record.value.as_deref().unwrap_or(""),
            FieldStatus::Unresolved => "(unresolved)",
        };
        out.push_str(&format!("{:16} {}\n", record.field.as_str(), value));

        if show_rejected {
            for rejected in &record.rejected_candidates {
                out.push_str(&format!(
                    "{:16}   rejected {:?} ({})\n",
                    "", rejected.raw, rejected.reason
                ));
            }
        }
    }

    out.push_str(&format!(
        "\nresolved {}/{} via {} / {}\n",
        result.resolved_count(),
        result.diagnostics.per_field.len(),
        result.diagnostics.rasterization_strategy_used,
        result.diagnostics.transcription_method_used,
    ));

    out
}
