use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use idbgen_core::config::{load_config, save_config, GeneratorConfig};

use crate::{canonicalize_or_current, default_config_path, CONFIG_ENV};

/// Where a config was (or would be) read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// `--config` on the command line.
    Explicit(PathBuf),
    /// The `IDBGEN_CONFIG` environment variable.
    Env(PathBuf),
    /// `<home>/.idbgen/config.json`.
    Home(PathBuf),
}

impl ConfigSource {
    pub fn path(&self) -> &Path {
        match self {
            ConfigSource::Explicit(p) | ConfigSource::Env(p) | ConfigSource::Home(p) => p,
        }
    }
}

/// Pick the config location: `--config`, then `$IDBGEN_CONFIG`, then the home default.
pub fn resolve_config_source(explicit: Option<&str>) -> Option<ConfigSource> {
    if let Some(path) = explicit {
        return Some(ConfigSource::Explicit(PathBuf::from(path)));
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
        return Some(ConfigSource::Env(PathBuf::from(path)));
    }
    default_config_path().map(ConfigSource::Home)
}

/// Load the generator config, letting `--tool-dir`/`--out` stand in for a
/// missing default config file.
///
/// An explicitly named config (flag or env) must exist.
pub fn load_generator_config(
    explicit: Option<&str>,
    tool_dir: Option<&str>,
    out: Option<&str>,
) -> Result<GeneratorConfig> {
    let loaded = match resolve_config_source(explicit) {
        Some(ConfigSource::Home(path)) if !path.is_file() => None,
        Some(source) => Some(
            load_config(source.path())
                .with_context(|| format!("Failed to load config {}", source.path().display()))?,
        ),
        None => None,
    };

    let mut config = match (loaded, tool_dir, out) {
        (Some(cfg), _, _) => cfg,
        (None, Some(dir), Some(out_dir)) => GeneratorConfig::new(dir, out_dir),
        (None, _, _) => {
            return Err(anyhow!(
                "No config found. Pass --config, set {CONFIG_ENV}, run `idbgen init-config`, \
                 or give both --tool-dir and --out"
            ))
        }
    };
    if let Some(dir) = tool_dir {
        config.tool_dir = canonicalize_or_current(dir)?;
    }
    if let Some(dir) = out {
        config.output_dir = canonicalize_or_current(dir)?;
    }

    config.validate().context("Invalid generator config")?;
    Ok(config)
}

/// Write a template config. Refuses to overwrite unless `force` is set.
pub fn init_config_command(
    path: Option<&str>,
    tool_dir: Option<String>,
    out: Option<String>,
    force: bool,
) -> Result<PathBuf> {
    let target = match path {
        Some(p) => canonicalize_or_current(p)?,
        None => default_config_path()
            .ok_or_else(|| anyhow!("Could not determine home directory; pass --path"))?,
    };
    if target.exists() && !force {
        return Err(anyhow!(
            "Config already exists at {} (use --force to overwrite)",
            target.display()
        ));
    }

    let tool_dir = match tool_dir {
        Some(dir) => canonicalize_or_current(&dir)?,
        None => PathBuf::from(if cfg!(windows) { r"C:\Program Files\IDA" } else { "/opt/ida" }),
    };
    let output_dir = match out {
        Some(dir) => canonicalize_or_current(&dir)?,
        None => std::env::temp_dir().join("idbgen"),
    };
    let config = GeneratorConfig::new(tool_dir, output_dir);

    save_config(&target, &config)
        .with_context(|| format!("Failed to write config {}", target.display()))?;

    println!("Wrote idbgen config:");
    println!("  Path: {}", target.display());
    println!("  Tool dir: {}", config.tool_dir.display());
    println!("  Output dir: {}", config.output_dir.display());
    println!("Edit `scripts` to add post-processing scripts.");

    Ok(target)
}

/// Print the resolved configuration.
pub fn show_config_command(explicit: Option<&str>, json: bool) -> Result<()> {
    let source = resolve_config_source(explicit)
        .ok_or_else(|| anyhow!("No config location; pass --config or set {CONFIG_ENV}"))?;
    let config = load_config(source.path())
        .with_context(|| format!("Failed to load config {}", source.path().display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("idbgen config");
    println!("=============");
    println!("Config file: {}", source.path().display());
    println!("Config version: {}", config.config_version);
    print_dir_status("Tool dir", &config.tool_dir);
    print_dir_status("Output dir", &config.output_dir);
    println!("Hash: {}", config.hash.as_str());
    println!("Export env: {} / {}", config.export_env.auto_var, config.export_env.export_file_var);
    println!("Scripts ({}):", config.scripts.len());
    if config.scripts.is_empty() {
        println!("  (none)");
    }
    for script in &config.scripts {
        let status = if script.is_file() { "OK" } else { "MISSING" };
        println!("  - {} [{}]", script.display(), status);
    }
    println!("Cleanup patterns: {}", config.cleanup.patterns.join(", "));

    Ok(())
}

/// Helper to print whether a directory exists.
pub fn print_dir_status(label: &str, path: &Path) {
    let exists = path.is_dir();
    println!("{label}: {} ({})", path.display(), if exists { "OK" } else { "MISSING" });
}
