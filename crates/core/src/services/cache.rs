use std::fs::File;
use std::path::Path;

use crate::services::naming::ArtifactSet;

/// Gate deciding whether the tool needs to run at all.
///
/// The hash-qualified artifact name is the whole cache key: a changed target
/// hashes differently and can never hit a stale entry. The reconciler's
/// failure marker flags an artifact left by a failed run, which is not a hit.
#[derive(Debug, Default, Clone, Copy)]
pub struct CacheCheck;

impl CacheCheck {
    /// True when the hash-qualified artifact is readable and not marked failed.
    pub fn is_cached(&self, artifacts: &ArtifactSet) -> bool {
        is_readable_file(&artifacts.artifact) && !artifacts.failure_marker.exists()
    }
}

fn is_readable_file(path: &Path) -> bool {
    path.is_file() && File::open(path).is_ok()
}
