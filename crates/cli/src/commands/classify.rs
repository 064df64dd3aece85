use anyhow::{anyhow, Result};
use idbgen_core::model::ToolDescriptor;
use idbgen_core::services::{ArchDetector, ContentClassifier};
use serde::Serialize;

use crate::canonicalize_or_current;

#[derive(Debug, Serialize)]
pub struct ClassifyInfo {
    pub path: String,
    /// `None` when the header could not be read or parsed.
    pub description: Option<String>,
    pub variant: String,
    pub launcher: String,
    pub artifact_extension: String,
}

/// Show which tool variant a target would be analyzed with.
pub fn classify_command(target: &str, json: bool) -> Result<()> {
    let path = canonicalize_or_current(target)?;
    if !path.is_file() {
        return Err(anyhow!("Target file does not exist: {}", path.display()));
    }

    let detector = ArchDetector::default();
    let description = detector.classifier().describe(&path).ok();
    let variant = detector.detect(&path);
    let tool = ToolDescriptor::resolve("", variant);

    let info = ClassifyInfo {
        path: path.display().to_string(),
        description,
        variant: variant.as_str().to_string(),
        launcher: tool.path.display().to_string(),
        artifact_extension: variant.artifact_extension().to_string(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{}", info.path);
    println!("  Type: {}", info.description.as_deref().unwrap_or("(unrecognized)"));
    println!("  Variant: {} ({}, {})", info.variant, info.launcher, info.artifact_extension);
    Ok(())
}
