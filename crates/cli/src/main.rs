use anyhow::Result;
use clap::{Parser, Subcommand};
use idbgen::commands::{
    classify_command, generate_command, hash_command, init_config_command, parse_variant,
    show_config_command, GenerateOptions,
};
use idbgen::logging::init_tracing;

/// Content-addressed batch generator for disassembler analysis databases.
///
/// This CLI is a thin wrapper around `idbgen-core` (exposed in code as
/// `idbgen_core`). All substantive logic lives in the library.
#[derive(Parser, Debug)]
#[command(
    name = "idbgen",
    version,
    about = "Generate cached IDA databases for a binary",
    long_about = None
)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate (or reuse) the hash-qualified database for a target binary.
    ///
    /// Exits with the analysis tool's exit code when it fails.
    Generate {
        /// Binary to analyze.
        target: String,

        /// Output directory (overrides config `output_dir`).
        #[arg(long)]
        out: Option<String>,

        /// Config file. Defaults to $IDBGEN_CONFIG, then ~/.idbgen/config.json.
        #[arg(long)]
        config: Option<String>,

        /// Tool installation directory (overrides config `tool_dir`).
        #[arg(long)]
        tool_dir: Option<String>,

        /// Extra post-processing script; repeat to add several (kept in order).
        #[arg(long = "script")]
        scripts: Vec<String>,

        /// Tool variant: auto, default (32-bit) or wide (64-bit).
        #[arg(long, default_value = "auto")]
        variant: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show the detected type of a binary and the tool variant it selects.
    Classify {
        target: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Print the content digest used for artifact names.
    Hash {
        target: String,

        /// sha1 or sha256.
        #[arg(long, default_value = "sha1")]
        algorithm: String,
    },

    /// Write a template config file.
    InitConfig {
        /// Destination. Defaults to ~/.idbgen/config.json.
        #[arg(long)]
        path: Option<String>,

        #[arg(long)]
        tool_dir: Option<String>,

        #[arg(long)]
        out: Option<String>,

        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Show the resolved config.
    ShowConfig {
        #[arg(long)]
        config: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    match cli.command {
        Command::Generate { target, out, config, tool_dir, scripts, variant, json } => {
            let options = GenerateOptions {
                config,
                out,
                tool_dir,
                scripts,
                variant: parse_variant(&variant)?,
                json,
            };
            let code = generate_command(&target, &options)?;
            if code != 0 {
                std::process::exit(code);
            }
        }
        Command::Classify { target, json } => classify_command(&target, json)?,
        Command::Hash { target, algorithm } => {
            hash_command(&target, &algorithm)?;
        }
        Command::InitConfig { path, tool_dir, out, force } => {
            init_config_command(path.as_deref(), tool_dir, out, force)?;
        }
        Command::ShowConfig { config, json } => show_config_command(config.as_deref(), json)?,
    }

    Ok(())
}
