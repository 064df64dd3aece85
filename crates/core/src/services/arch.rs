use std::fs;
use std::path::{Path, PathBuf};

use goblin::elf::header as elf_header;
use goblin::mach::{cputype, Mach};
use goblin::pe::header as pe_header;
use goblin::Object;
use thiserror::Error;
use tracing::debug;

use crate::config::DEFAULT_ARCH_MARKERS;
use crate::model::ToolVariant;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse header: {0}")]
    Parse(String),
}

/// File-type inspection returning a human-readable description
/// (in the style of `file(1)`).
pub trait ContentClassifier {
    fn describe(&self, path: &Path) -> Result<String, ClassifyError>;
}

/// Header-based classifier for ELF, PE and Mach-O images.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderClassifier;

impl ContentClassifier for HeaderClassifier {
    fn describe(&self, path: &Path) -> Result<String, ClassifyError> {
        let bytes = fs::read(path)
            .map_err(|source| ClassifyError::Io { path: path.to_path_buf(), source })?;
        describe_bytes(&bytes)
    }
}

/// Describe an in-memory image. Unrecognized content is `"data"`.
pub fn describe_bytes(bytes: &[u8]) -> Result<String, ClassifyError> {
    if bytes.is_empty() {
        return Ok("empty".to_string());
    }
    let object = Object::parse(bytes).map_err(|e| ClassifyError::Parse(e.to_string()))?;
    let description = match object {
        Object::Elf(elf) => {
            let kind = match elf.header.e_type {
                elf_header::ET_EXEC => "executable",
                elf_header::ET_DYN => "shared object",
                elf_header::ET_REL => "relocatable",
                elf_header::ET_CORE => "core file",
                _ => "file",
            };
            format!(
                "ELF {}-bit {} {}, {}",
                if elf.is_64 { 64 } else { 32 },
                if elf.little_endian { "LSB" } else { "MSB" },
                kind,
                elf_machine_name(elf.header.e_machine)
            )
        }
        Object::PE(pe) => format!(
            "{} executable ({}) {}, for MS Windows",
            if pe.is_64 { "PE32+" } else { "PE32" },
            if pe.is_lib { "DLL" } else { "EXE" },
            pe_machine_name(pe.header.coff_header.machine)
        ),
        Object::Mach(Mach::Binary(macho)) => {
            let kind = match macho.header.filetype {
                goblin::mach::header::MH_EXECUTE => "executable",
                goblin::mach::header::MH_DYLIB => "dynamically linked shared library",
                goblin::mach::header::MH_OBJECT => "object",
                _ => "file",
            };
            format!(
                "Mach-O {}-bit {} {}",
                if macho.is_64 { 64 } else { 32 },
                macho_cpu_name(macho.header.cputype),
                kind
            )
        }
        Object::Mach(Mach::Fat(fat)) => {
            format!("Mach-O universal binary with {} architectures", fat.narches)
        }
        Object::Archive(_) => "current ar archive".to_string(),
        _ => "data".to_string(),
    };
    Ok(description)
}

fn elf_machine_name(machine: u16) -> String {
    match machine {
        elf_header::EM_X86_64 => "x86-64".to_string(),
        elf_header::EM_386 => "Intel 80386".to_string(),
        elf_header::EM_AARCH64 => "ARM aarch64".to_string(),
        elf_header::EM_ARM => "ARM".to_string(),
        other => elf_header::machine_to_str(other).to_string(),
    }
}

fn pe_machine_name(machine: u16) -> String {
    match machine {
        pe_header::COFF_MACHINE_X86_64 => "x86-64".to_string(),
        pe_header::COFF_MACHINE_X86 => "Intel 80386".to_string(),
        pe_header::COFF_MACHINE_ARM64 => "Aarch64".to_string(),
        other => format!("machine 0x{other:04x}"),
    }
}

fn macho_cpu_name(cpu: u32) -> String {
    match cpu {
        cputype::CPU_TYPE_X86_64 => "x86_64".to_string(),
        cputype::CPU_TYPE_X86 => "i386".to_string(),
        cputype::CPU_TYPE_ARM64 => "arm64".to_string(),
        cputype::CPU_TYPE_ARM => "arm".to_string(),
        other => format!("cpu 0x{other:x}"),
    }
}

/// Picks the tool variant for a target from its type description.
///
/// Selection is advisory: any inspection failure yields [`ToolVariant::Default`].
pub struct ArchDetector<C = HeaderClassifier> {
    classifier: C,
    markers: Vec<String>,
}

impl Default for ArchDetector<HeaderClassifier> {
    fn default() -> Self {
        Self::new(DEFAULT_ARCH_MARKERS.iter().map(|m| m.to_string()).collect())
    }
}

impl ArchDetector<HeaderClassifier> {
    pub fn new(markers: Vec<String>) -> Self {
        Self { classifier: HeaderClassifier, markers }
    }
}

impl<C: ContentClassifier> ArchDetector<C> {
    pub fn with_classifier(classifier: C, markers: Vec<String>) -> Self {
        Self { classifier, markers }
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Classify `path`; never fails.
    pub fn detect(&self, path: &Path) -> ToolVariant {
        match self.classifier.describe(path) {
            Ok(description) => {
                let variant = self.variant_for_description(&description);
                debug!(
                    file = %path.display(),
                    %description,
                    variant = variant.as_str(),
                    "classified target"
                );
                variant
            }
            Err(err) => {
                debug!(
                    file = %path.display(),
                    error = %err,
                    "classification failed, using default variant"
                );
                ToolVariant::Default
            }
        }
    }

    /// `Wide` when the description contains any configured marker.
    pub fn variant_for_description(&self, description: &str) -> ToolVariant {
        if self.markers.iter().any(|m| !m.is_empty() && description.contains(m.as_str())) {
            ToolVariant::Wide
        } else {
            ToolVariant::Default
        }
    }
}
