use std::fs;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::config::HashAlgorithm;
use crate::model::ToolVariant;

/// Hash the full contents of a file and return the lowercase hex digest.
pub fn hash_file(path: &Path, algorithm: HashAlgorithm) -> io::Result<String> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    match algorithm {
        HashAlgorithm::Sha1 => digest_reader::<Sha1, _>(reader),
        HashAlgorithm::Sha256 => digest_reader::<Sha256, _>(reader),
    }
}

/// Hash an in-memory buffer.
pub fn hash_bytes(bytes: &[u8], algorithm: HashAlgorithm) -> String {
    match algorithm {
        HashAlgorithm::Sha1 => format!("{:x}", Sha1::digest(bytes)),
        HashAlgorithm::Sha256 => format!("{:x}", Sha256::digest(bytes)),
    }
}

fn digest_reader<D: Digest, R: Read>(mut reader: R) -> io::Result<String>
where
    sha2::digest::Output<D>: std::fmt::LowerHex,
{
    let mut hasher = D::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Insert `-{hash}` before the first occurrence of `ext` in `file_name`.
///
/// An empty or absent extension gets the suffix appended instead, so two
/// different hashes never map to the same name.
pub fn hash_qualify(file_name: &str, ext: &str, hash: &str) -> String {
    match (ext.is_empty(), file_name.find(ext)) {
        (false, Some(idx)) => format!("{}-{}{}", &file_name[..idx], hash, &file_name[idx..]),
        _ => format!("{file_name}-{hash}"),
    }
}

/// Split a file name into stem and extension (with leading dot, or empty).
pub fn split_extension(file_name: &str) -> (String, String) {
    let path = Path::new(file_name);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(file_name).to_string();
    let ext =
        path.extension().and_then(|e| e.to_str()).map(|e| format!(".{e}")).unwrap_or_default();
    (stem, ext)
}

/// Every path one invocation touches. All hash-qualified members share `hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSet {
    pub hash: String,
    /// `{outdir}/{name}{ext}`: the copy handed to the tool.
    pub working_copy: PathBuf,
    /// Database as the tool names it, beside the working copy.
    pub native_artifact: PathBuf,
    /// `{outdir}/{name}-{hash}{.idb|.i64}`: the cache key.
    pub artifact: PathBuf,
    pub log: PathBuf,
    pub export: PathBuf,
    /// Present while the artifact is the leftover of a failed run.
    pub failure_marker: PathBuf,
}

/// Derives deterministic artifact paths inside one output directory.
#[derive(Debug, Clone)]
pub struct ArtifactNamer {
    output_dir: PathBuf,
    export_extension: String,
}

impl ArtifactNamer {
    pub fn new(output_dir: impl Into<PathBuf>, export_extension: impl Into<String>) -> Self {
        Self { output_dir: output_dir.into(), export_extension: export_extension.into() }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn working_copy_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }

    /// Compose the full artifact set for `file_name` analyzed by `variant`.
    pub fn name(&self, file_name: &str, variant: ToolVariant, hash: &str) -> ArtifactSet {
        let (stem, _) = split_extension(file_name);
        let tool_ext = variant.artifact_extension();
        let native = format!("{stem}{tool_ext}");

        ArtifactSet {
            hash: hash.to_string(),
            working_copy: self.working_copy_path(file_name),
            artifact: self.output_dir.join(hash_qualify(&native, tool_ext, hash)),
            native_artifact: self.output_dir.join(native),
            log: self.output_dir.join(hash_qualify(&format!("{stem}.log"), ".log", hash)),
            export: self.output_dir.join(hash_qualify(
                &format!("{stem}{}", self.export_extension),
                &self.export_extension,
                hash,
            )),
            failure_marker: self
                .output_dir
                .join(hash_qualify(&format!("{stem}.failed"), ".failed", hash)),
        }
    }
}
