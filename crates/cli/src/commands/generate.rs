use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use idbgen_core::model::{Outcome, ToolVariant};
use idbgen_core::services::{ArtifactPipeline, PipelineReport};
use serde::Serialize;

use crate::canonicalize_or_current;
use crate::commands::load_generator_config;

/// Options for `idbgen generate`, as parsed by the CLI.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub config: Option<String>,
    pub out: Option<String>,
    pub tool_dir: Option<String>,
    /// Appended after the configured scripts.
    pub scripts: Vec<String>,
    /// `None` lets the detector decide.
    pub variant: Option<ToolVariant>,
    pub json: bool,
}

/// JSON payload printed by `generate --json`.
#[derive(Debug, Serialize)]
pub struct GenerateSummary {
    #[serde(flatten)]
    pub report: PipelineReport,
    pub exit_code: i32,
    pub started_at: String,
    pub finished_at: String,
}

/// Parse a `--variant` value.
pub fn parse_variant(value: &str) -> Result<Option<ToolVariant>> {
    match value {
        "auto" => Ok(None),
        "default" | "32" => Ok(Some(ToolVariant::Default)),
        "wide" | "64" => Ok(Some(ToolVariant::Wide)),
        other => {
            Err(anyhow!("Invalid variant '{}'. Allowed: auto, default (32), wide (64)", other))
        }
    }
}

/// Run the artifact pipeline for one target and return the process exit code.
///
/// Precondition failures (missing target, unusable output dir) are errors;
/// a failing tool is not, its exit code is returned instead.
pub fn generate_command(target: &str, options: &GenerateOptions) -> Result<i32> {
    let target_path = canonicalize_or_current(target)?;
    if !target_path.is_file() {
        return Err(anyhow!("Target file does not exist: {}", target_path.display()));
    }

    let mut config = load_generator_config(
        options.config.as_deref(),
        options.tool_dir.as_deref(),
        options.out.as_deref(),
    )?;
    for script in &options.scripts {
        config.scripts.push(canonicalize_or_current(script)?);
    }

    let started_at = Utc::now().to_rfc3339();
    let pipeline = ArtifactPipeline::new(config).with_variant(options.variant);
    let report = pipeline
        .run(&target_path)
        .with_context(|| format!("Failed to generate database for {}", target_path.display()))?;
    let finished_at = Utc::now().to_rfc3339();
    let exit_code = report.exit_code();

    if options.json {
        let summary = GenerateSummary { report, exit_code, started_at, finished_at };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(exit_code);
    }

    print_report(&report);
    Ok(exit_code)
}

fn print_report(report: &PipelineReport) {
    let status = match report.outcome {
        Outcome::Cached => "cached (tool not launched)".to_string(),
        Outcome::Succeeded => "succeeded".to_string(),
        Outcome::Failed { code } => format!("failed (exit code {code})"),
    };
    println!("Database generation {}:", status);
    println!("  Target: {}", report.target.path.display());
    println!("  Hash: {}", report.target.hash);
    println!("  Tool: {} [{}]", report.tool.path.display(), report.tool.variant.as_str());
    println!("  Artifact: {}", display_if_exists(&report.artifacts.artifact));
    if let Outcome::Failed { .. } = report.outcome {
        println!("  Log: {}", display_if_exists(&report.artifacts.log));
    }
    if report.artifacts.export.exists() {
        println!("  Export: {}", report.artifacts.export.display());
    }
}

fn display_if_exists(path: &Path) -> String {
    if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (missing)", path.display())
    }
}
