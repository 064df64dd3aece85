//! Generator configuration.
//!
//! The configuration is the only input the pipeline takes besides the target
//! path: where the analysis tool lives, where artifacts go, which scripts the
//! tool loads, and the advisory cleanup allow-list.
//!
//! - `GeneratorConfig`: serializable top-level config.
//! - `CleanupRules`: glob allow-list of tool byproducts removed after a run.
//! - `HashAlgorithm`: digest used for hash-qualified names.
//! - `ExportEnv`: names of the environment overrides handed to the tool.
//! - `load_config` / `save_config`: JSON or YAML persistence.

mod load;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use load::{load_config, save_config, ConfigError, ConfigFormat};

/// Current config format version.
pub const CONFIG_VERSION: &str = "0.1.0";

/// Byproducts the analysis tool is known to leave in the output directory.
pub const DEFAULT_CLEANUP_PATTERNS: [&str; 2] = ["pingme.txt", "*.pdb"];

/// Type-description substrings that select the 64-bit tool variant.
pub const DEFAULT_ARCH_MARKERS: [&str; 2] = ["x86-64", "x86_64"];

/// Digest used to content-address artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// 40 hex chars; matches names produced by earlier batch runs.
    #[default]
    Sha1,
    /// 64 hex chars.
    Sha256,
}

impl HashAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
        }
    }

    /// Parse a user-supplied algorithm name (case-insensitive).
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sha1" | "sha-1" => Some(HashAlgorithm::Sha1),
            "sha256" | "sha-256" => Some(HashAlgorithm::Sha256),
            _ => None,
        }
    }
}

/// Advisory cleanup allow-list.
///
/// Each pattern is matched inside the output directory only. Matching
/// directories are removed recursively, matching files are unlinked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupRules {
    pub patterns: Vec<String>,
}

impl Default for CleanupRules {
    fn default() -> Self {
        Self { patterns: DEFAULT_CLEANUP_PATTERNS.iter().map(|p| p.to_string()).collect() }
    }
}

impl CleanupRules {
    pub fn none() -> Self {
        Self { patterns: Vec::new() }
    }
}

/// Environment variables that put the tool's export script into automated mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportEnv {
    /// Set to `"1"` for every invocation.
    pub auto_var: String,
    /// Set to the hash-qualified export file path.
    pub export_file_var: String,
}

impl Default for ExportEnv {
    fn default() -> Self {
        Self {
            auto_var: "DIAPHORA_AUTO".to_string(),
            export_file_var: "DIAPHORA_EXPORT_FILE".to_string(),
        }
    }
}

fn default_arch_markers() -> Vec<String> {
    DEFAULT_ARCH_MARKERS.iter().map(|m| m.to_string()).collect()
}

fn default_export_extension() -> String {
    ".sqlite".to_string()
}

fn default_config_version() -> String {
    CONFIG_VERSION.to_string()
}

/// Serializable configuration for the artifact pipeline.
///
/// Paths are expected to be absolute; the pipeline does not resolve them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Schema/config version. This is about the config format, not the tool version.
    #[serde(default = "default_config_version")]
    pub config_version: String,
    /// Analysis tool installation directory (holds `ida` and `ida64`).
    pub tool_dir: PathBuf,
    /// Directory receiving working copies and every artifact set.
    pub output_dir: PathBuf,
    /// Post-processing scripts, loaded by the tool in this order.
    #[serde(default)]
    pub scripts: Vec<PathBuf>,
    #[serde(default)]
    pub cleanup: CleanupRules,
    #[serde(default)]
    pub hash: HashAlgorithm,
    #[serde(default = "default_arch_markers")]
    pub arch_markers: Vec<String>,
    #[serde(default)]
    pub export_env: ExportEnv,
    /// Extension (with leading dot) of the structured export file.
    #[serde(default = "default_export_extension")]
    pub export_extension: String,
}

impl GeneratorConfig {
    /// Create a config with default cleanup, hashing and export settings.
    pub fn new(tool_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_version: default_config_version(),
            tool_dir: tool_dir.into(),
            output_dir: output_dir.into(),
            scripts: Vec::new(),
            cleanup: CleanupRules::default(),
            hash: HashAlgorithm::default(),
            arch_markers: default_arch_markers(),
            export_env: ExportEnv::default(),
            export_extension: default_export_extension(),
        }
    }

    pub fn with_scripts(mut self, scripts: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.scripts = scripts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cleanup(mut self, cleanup: CleanupRules) -> Self {
        self.cleanup = cleanup;
        self
    }

    pub fn with_hash(mut self, hash: HashAlgorithm) -> Self {
        self.hash = hash;
        self
    }

    /// Reject configs the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tool_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("tool_dir is required".into()));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("output_dir is required".into()));
        }
        if !self.export_extension.is_empty() && !self.export_extension.starts_with('.') {
            return Err(ConfigError::Invalid(format!(
                "export_extension must start with '.', got '{}'",
                self.export_extension
            )));
        }
        for pattern in &self.cleanup.patterns {
            if pattern.contains('/') || pattern.contains('\\') {
                return Err(ConfigError::Invalid(format!(
                    "cleanup pattern '{pattern}' must not contain path separators"
                )));
            }
            glob::Pattern::new(pattern).map_err(|e| {
                ConfigError::Invalid(format!("cleanup pattern '{pattern}' is malformed: {e}"))
            })?;
        }
        Ok(())
    }
}
