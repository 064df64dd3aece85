//! Idempotent artifact pipeline.
//!
//! `Init -> Copied -> Hashed -> (CacheHit -> Done) | (Invoked -> Reconciled -> Done)`
//!
//! Every transition goes through [`StateTracker::advance`], so a run that
//! stops early (spawn failure, missing database) leaves its last reached
//! state observable to the caller.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, info_span};

use crate::config::GeneratorConfig;
use crate::model::{Outcome, TargetFile, ToolDescriptor, ToolVariant};
use crate::services::arch::{ArchDetector, ContentClassifier, HeaderClassifier};
use crate::services::cache::CacheCheck;
use crate::services::invoker::{Invocation, ProcessRunner, ToolRunner};
use crate::services::naming::{hash_file, ArtifactNamer, ArtifactSet};
use crate::services::reconcile::{remove_advisory, Reconciler, Reconciliation};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Target not readable at {path}: {source}")]
    TargetUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Target path has no usable file name: {0}")]
    InvalidTarget(PathBuf),

    /// Copying would overwrite the target with itself.
    #[error("Target {0} already sits at its working-copy path in the output directory")]
    TargetInOutputDir(PathBuf),

    #[error("Output directory not writable at {path}: {source}")]
    OutputDirUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create working copy at {path}: {source}")]
    WorkingCopy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to launch analysis tool {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move {from} to {to}: {source}")]
    Finalize {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Analysis tool exited with 0 but produced no database at {0}")]
    MissingArtifact(PathBuf),

    #[error("Invalid pipeline transition from {from:?} to {to:?}")]
    InvalidTransition { from: PipelineState, to: PipelineState },
}

/// Pipeline progress for one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Init,
    Copied,
    Hashed,
    CacheHit,
    Invoked,
    Reconciled,
    Done,
}

impl PipelineState {
    pub fn can_advance_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Init, Copied)
                | (Copied, Hashed)
                | (Hashed, CacheHit)
                | (Hashed, Invoked)
                | (CacheHit, Done)
                | (Invoked, Reconciled)
                | (Reconciled, Done)
        )
    }
}

/// Guarded state holder with the full transition history.
#[derive(Debug, Clone)]
pub struct StateTracker {
    history: Vec<PipelineState>,
}

impl Default for StateTracker {
    fn default() -> Self {
        Self { history: vec![PipelineState::Init] }
    }
}

impl StateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> PipelineState {
        self.history.last().copied().unwrap_or(PipelineState::Init)
    }

    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    pub fn advance(&mut self, next: PipelineState) -> Result<(), PipelineError> {
        let from = self.current();
        if !from.can_advance_to(next) {
            return Err(PipelineError::InvalidTransition { from, to: next });
        }
        self.history.push(next);
        Ok(())
    }
}

/// Everything a finished run produced or decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub target: TargetFile,
    pub tool: ToolDescriptor,
    pub artifacts: ArtifactSet,
    pub outcome: Outcome,
    pub states: Vec<PipelineState>,
    /// Absent on a cache hit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_line: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconciliation: Option<Reconciliation>,
}

impl PipelineReport {
    pub fn exit_code(&self) -> i32 {
        self.outcome.exit_code()
    }
}

/// Runs the external tool at most once per distinct target content.
///
/// Callers must serialize runs on the same source file; nothing here locks
/// the output directory.
pub struct ArtifactPipeline<R = ProcessRunner, C = HeaderClassifier> {
    config: GeneratorConfig,
    runner: R,
    detector: ArchDetector<C>,
    variant_override: Option<ToolVariant>,
    cache: CacheCheck,
}

impl ArtifactPipeline<ProcessRunner, HeaderClassifier> {
    pub fn new(config: GeneratorConfig) -> Self {
        let detector = ArchDetector::new(config.arch_markers.clone());
        Self {
            config,
            runner: ProcessRunner,
            detector,
            variant_override: None,
            cache: CacheCheck,
        }
    }
}

impl<R: ToolRunner, C: ContentClassifier> ArtifactPipeline<R, C> {
    pub fn with_runner<R2: ToolRunner>(self, runner: R2) -> ArtifactPipeline<R2, C> {
        ArtifactPipeline {
            config: self.config,
            runner,
            detector: self.detector,
            variant_override: self.variant_override,
            cache: self.cache,
        }
    }

    pub fn with_classifier<C2: ContentClassifier>(self, classifier: C2) -> ArtifactPipeline<R, C2> {
        let markers = self.config.arch_markers.clone();
        ArtifactPipeline {
            config: self.config,
            runner: self.runner,
            detector: ArchDetector::with_classifier(classifier, markers),
            variant_override: self.variant_override,
            cache: self.cache,
        }
    }

    /// Skip detection and always use `variant` (or detect again with `None`).
    pub fn with_variant(mut self, variant: Option<ToolVariant>) -> Self {
        self.variant_override = variant;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn namer(&self) -> ArtifactNamer {
        ArtifactNamer::new(&self.config.output_dir, self.config.export_extension.clone())
    }

    /// Resolve the tool launcher for `target`.
    pub fn select_tool(&self, target: &Path) -> ToolDescriptor {
        let variant = self.variant_override.unwrap_or_else(|| self.detector.detect(target));
        ToolDescriptor::resolve(&self.config.tool_dir, variant)
    }

    pub fn run(&self, target: &Path) -> Result<PipelineReport, PipelineError> {
        let mut tracker = StateTracker::new();
        self.run_tracked(target, &mut tracker)
    }

    /// Same as [`run`](Self::run) but leaves the reached state in `tracker`
    /// when an error cuts the run short.
    pub fn run_tracked(
        &self,
        target: &Path,
        tracker: &mut StateTracker,
    ) -> Result<PipelineReport, PipelineError> {
        let span = info_span!("generate", file = %target.display());
        let _guard = span.enter();

        let file_name = target
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| PipelineError::InvalidTarget(target.to_path_buf()))?
            .to_string();
        fs::File::open(target).map_err(|source| PipelineError::TargetUnreadable {
            path: target.to_path_buf(),
            source,
        })?;

        let tool = self.select_tool(target);
        let output_dir = &self.config.output_dir;
        let namer = self.namer();

        fs::create_dir_all(output_dir).map_err(|source| PipelineError::OutputDirUnwritable {
            path: output_dir.clone(),
            source,
        })?;

        let working_copy = namer.working_copy_path(&file_name);
        if same_file(target, &working_copy) {
            return Err(PipelineError::TargetInOutputDir(target.to_path_buf()));
        }

        info!(
            "Generating {} file from '{}' in '{}'...",
            tool.artifact_extension().trim_start_matches('.').to_uppercase(),
            target.display(),
            output_dir.display()
        );

        fs::copy(target, &working_copy).map_err(|source| PipelineError::WorkingCopy {
            path: working_copy.clone(),
            source,
        })?;
        tracker.advance(PipelineState::Copied)?;

        // Digest the original, not the copy.
        let hash = match hash_file(target, self.config.hash) {
            Ok(hash) => hash,
            Err(source) => {
                remove_advisory(&working_copy);
                return Err(PipelineError::TargetUnreadable { path: target.to_path_buf(), source });
            }
        };
        let artifacts = namer.name(&file_name, tool.variant, &hash);
        tracker.advance(PipelineState::Hashed)?;

        let target_file = TargetFile { path: target.to_path_buf(), hash };

        if self.cache.is_cached(&artifacts) {
            info!("Database '{}' already exists", artifacts.artifact.display());
            tracker.advance(PipelineState::CacheHit)?;
            remove_advisory(&artifacts.working_copy);
            tracker.advance(PipelineState::Done)?;
            return Ok(PipelineReport {
                target: target_file,
                tool,
                artifacts,
                outcome: Outcome::Cached,
                states: tracker.history().to_vec(),
                command_line: None,
                reconciliation: None,
            });
        }

        let invocation =
            Invocation::compose(&tool, &artifacts, &self.config.scripts, &self.config.export_env);
        let exit_code = match self.runner.run(&invocation) {
            Ok(code) => code,
            Err(source) => {
                remove_advisory(&artifacts.working_copy);
                return Err(PipelineError::Spawn { path: tool.path.clone(), source });
            }
        };
        tracker.advance(PipelineState::Invoked)?;

        let reconciliation =
            Reconciler::new(output_dir, &self.config.cleanup).reconcile(&artifacts, exit_code)?;
        tracker.advance(PipelineState::Reconciled)?;

        let outcome = match (exit_code, reconciliation.artifact_present) {
            (0, true) => {
                info!("Success");
                Outcome::Succeeded
            }
            (0, false) => {
                return Err(PipelineError::MissingArtifact(artifacts.native_artifact.clone()))
            }
            (code, _) => {
                error!(
                    retcode = code,
                    log = %artifacts.log.display(),
                    "An error occurred, retcode={}",
                    code
                );
                Outcome::Failed { code }
            }
        };
        tracker.advance(PipelineState::Done)?;

        Ok(PipelineReport {
            target: target_file,
            tool,
            artifacts,
            outcome,
            states: tracker.history().to_vec(),
            command_line: Some(
                std::iter::once(invocation.program.to_string_lossy().to_string())
                    .chain(invocation.display_args())
                    .collect(),
            ),
            reconciliation: Some(reconciliation),
        })
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
