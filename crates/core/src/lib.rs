//! idbgen-core
//!
//! Core library for content-addressed generation of disassembler analysis
//! databases (IDB/I64).
//!
//! This crate owns the whole artifact pipeline: architecture detection, hash
//! qualified naming, the cache gate, tool invocation and post-run
//! reconciliation. Frontends (the `idbgen` CLI) only resolve configuration and
//! hand a target path to [`services::pipeline::ArtifactPipeline`].

pub mod config;
pub mod model;
pub mod services;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
