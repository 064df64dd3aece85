//! Core data model shared by the pipeline components.
//!
//! - `ToolVariant` / `ToolDescriptor`: which analysis tool build runs a target.
//! - `TargetFile`: the read-only input binary.
//! - `Outcome`: terminal result of one pipeline run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Architecture variant of the external analysis tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolVariant {
    /// 32-bit launcher (`ida`), writes `.idb` databases.
    Default,
    /// 64-bit launcher (`ida64`), writes `.i64` databases.
    Wide,
}

impl ToolVariant {
    /// Platform-specific launcher file name.
    pub fn binary_name(self) -> &'static str {
        match (self, cfg!(windows)) {
            (ToolVariant::Default, false) => "ida",
            (ToolVariant::Default, true) => "ida.exe",
            (ToolVariant::Wide, false) => "ida64",
            (ToolVariant::Wide, true) => "ida64.exe",
        }
    }

    /// Extension (with leading dot) of the database the launcher produces.
    pub fn artifact_extension(self) -> &'static str {
        match self {
            ToolVariant::Default => ".idb",
            ToolVariant::Wide => ".i64",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ToolVariant::Default => "default",
            ToolVariant::Wide => "wide",
        }
    }
}

/// Resolved analysis tool for one target. Selected once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub path: PathBuf,
    pub variant: ToolVariant,
}

impl ToolDescriptor {
    /// Join the variant's launcher name onto the tool installation directory.
    pub fn resolve(tool_dir: impl AsRef<Path>, variant: ToolVariant) -> Self {
        Self { path: tool_dir.as_ref().join(variant.binary_name()), variant }
    }

    pub fn artifact_extension(&self) -> &'static str {
        self.variant.artifact_extension()
    }
}

/// Input binary identity: where it lives and what its bytes hash to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetFile {
    pub path: PathBuf,
    pub hash: String,
}

/// Terminal status of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The hash-qualified artifact already existed; the tool was not launched.
    Cached,
    /// The tool exited with 0.
    Succeeded,
    /// The tool exited non-zero; `code` is its exit code verbatim.
    Failed { code: i32 },
}

impl Outcome {
    /// Process-style status: 0 for cached/succeeded, the tool's code otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Cached | Outcome::Succeeded => 0,
            Outcome::Failed { code } => *code,
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code() == 0
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Cached => "cached",
            Outcome::Succeeded => "succeeded",
            Outcome::Failed { .. } => "failed",
        }
    }
}
