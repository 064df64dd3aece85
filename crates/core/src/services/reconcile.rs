use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::CleanupRules;
use crate::services::naming::ArtifactSet;
use crate::services::pipeline::PipelineError;

/// What the post-run step found and did.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Reconciliation {
    /// The tool's database now sits at the hash-qualified name.
    pub artifact_present: bool,
    pub working_copy_removed: bool,
    /// Byproducts removed by the cleanup allow-list.
    pub removed: Vec<PathBuf>,
    pub log_retained: bool,
    /// The run did not yield a usable database and was marked failed.
    pub marked_failed: bool,
}

/// Finalizes the output directory after the tool exits.
pub struct Reconciler<'a> {
    output_dir: &'a Path,
    cleanup: &'a CleanupRules,
}

impl<'a> Reconciler<'a> {
    pub fn new(output_dir: &'a Path, cleanup: &'a CleanupRules) -> Self {
        Self { output_dir, cleanup }
    }

    /// Rename, clean up, then keep or drop the log depending on `exit_code`.
    ///
    /// The rename runs regardless of exit code so a partial database is kept
    /// under its hash-qualified name. Cleanup always runs, even when the rename
    /// fails; that failure is reported afterwards, and only for a zero exit code.
    ///
    /// Any run that does not end with exit code 0 and a database leaves the
    /// failure marker behind, whether or not the tool wrote a log.
    pub fn reconcile(
        &self,
        artifacts: &ArtifactSet,
        exit_code: i32,
    ) -> Result<Reconciliation, PipelineError> {
        let mut outcome = Reconciliation::default();

        let finalize = match fs::rename(&artifacts.native_artifact, &artifacts.artifact) {
            Ok(()) => {
                outcome.artifact_present = true;
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    expected = %artifacts.native_artifact.display(),
                    "analysis tool left no database behind"
                );
                Ok(())
            }
            Err(source) => Err(PipelineError::Finalize {
                from: artifacts.native_artifact.clone(),
                to: artifacts.artifact.clone(),
                source,
            }),
        };

        info!("Cleanup");
        outcome.working_copy_removed = remove_advisory(&artifacts.working_copy);
        outcome.removed = self.remove_byproducts(artifacts);

        if exit_code == 0 && outcome.artifact_present {
            remove_advisory(&artifacts.log);
            remove_advisory(&artifacts.failure_marker);
            outcome.log_retained = false;
        } else {
            outcome.log_retained = artifacts.log.exists();
            outcome.marked_failed = true;
            mark_failed(artifacts, exit_code);
        }

        match finalize {
            // A failed run already reports its own exit code; don't mask it.
            Err(err) if exit_code != 0 => {
                warn!(error = %err, "could not keep partial database");
                Ok(outcome)
            }
            other => other.map(|()| outcome),
        }
    }

    /// Remove every allow-listed byproduct in the output directory, skipping
    /// members of the artifact set. Failures are logged, never returned.
    pub fn remove_byproducts(&self, artifacts: &ArtifactSet) -> Vec<PathBuf> {
        let protected =
            [&artifacts.artifact, &artifacts.log, &artifacts.export, &artifacts.failure_marker];
        let base = glob::Pattern::escape(&self.output_dir.to_string_lossy());
        let mut removed = Vec::new();

        for pattern in &self.cleanup.patterns {
            let full = Path::new(&base).join(pattern);
            let paths = match glob::glob(&full.to_string_lossy()) {
                Ok(paths) => paths,
                Err(e) => {
                    warn!(%pattern, error = %e, "skipping malformed cleanup pattern");
                    continue;
                }
            };
            for entry in paths {
                match entry {
                    Ok(path) if protected.iter().any(|p| **p == path) => {
                        debug!(path = %path.display(), "cleanup pattern matched an artifact, kept");
                    }
                    Ok(path) => {
                        if remove_advisory(&path) {
                            removed.push(path);
                        }
                    }
                    Err(e) => debug!(error = %e, "cleanup entry unreadable"),
                }
            }
        }
        removed
    }
}

/// Record the failure next to the artifact. When the marker cannot be written
/// the hash-qualified artifact is dropped instead, so it is never served as cached.
fn mark_failed(artifacts: &ArtifactSet, exit_code: i32) {
    if let Err(e) = fs::write(&artifacts.failure_marker, format!("{exit_code}\n")) {
        warn!(
            path = %artifacts.failure_marker.display(),
            error = %e,
            "could not write failure marker, discarding partial database"
        );
        remove_advisory(&artifacts.artifact);
    }
}

/// Best-effort delete of a file or directory tree.
///
/// Missing paths and permission problems are expected here and logged at
/// debug level; anything else is a warning. Never fails the caller.
pub fn remove_advisory(path: &Path) -> bool {
    let result = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => {
            debug!(path = %path.display(), "removed");
            true
        }
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
            debug!(path = %path.display(), error = %e, "advisory cleanup skipped");
            false
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "advisory cleanup failed");
            false
        }
    }
}
