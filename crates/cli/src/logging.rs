//! Tracing bootstrap for the CLI.
//!
//! Logs go to stderr so `--json` output on stdout stays machine-readable.
//! `RUST_LOG` wins over the level picked from `--verbose`.

use std::sync::Once;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Install the global subscriber. Subsequent calls are ignored.
pub fn init_tracing(verbose: bool, json: bool) {
    INIT.call_once(|| {
        let default_level = if verbose { "debug" } else { "info" };
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

        if json {
            let fmt_layer = fmt::layer().json().with_target(true).with_writer(std::io::stderr);
            tracing_subscriber::registry().with(env_filter).with(fmt_layer).try_init().ok();
        } else {
            let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
            tracing_subscriber::registry().with(env_filter).with(fmt_layer).try_init().ok();
        }
    });
}
