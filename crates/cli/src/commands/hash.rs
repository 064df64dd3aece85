use anyhow::{anyhow, Context, Result};
use idbgen_core::config::HashAlgorithm;
use idbgen_core::services::hash_file;

use crate::canonicalize_or_current;

/// Print the content digest used in hash-qualified artifact names.
pub fn hash_command(target: &str, algorithm: &str) -> Result<String> {
    let algorithm = HashAlgorithm::parse(algorithm).ok_or_else(|| {
        anyhow!("Unsupported hash algorithm '{}'. Allowed: sha1, sha256", algorithm)
    })?;
    let path = canonicalize_or_current(target)?;
    let digest = hash_file(&path, algorithm)
        .with_context(|| format!("Failed to hash {}", path.display()))?;
    println!("{}  {}", digest, path.display());
    Ok(digest)
}
