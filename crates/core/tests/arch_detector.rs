mod support;

use std::path::Path;

use idbgen_core::model::ToolVariant;
use idbgen_core::services::arch::{describe_bytes, ClassifyError};
use idbgen_core::services::{ArchDetector, ContentClassifier, HeaderClassifier};
use object::Architecture;

struct FixedDescription(&'static str);

impl ContentClassifier for FixedDescription {
    fn describe(&self, _path: &Path) -> Result<String, ClassifyError> {
        Ok(self.0.to_string())
    }
}

struct Broken;

impl ContentClassifier for Broken {
    fn describe(&self, _path: &Path) -> Result<String, ClassifyError> {
        Err(ClassifyError::Parse("boom".into()))
    }
}

fn markers() -> Vec<String> {
    vec!["x86-64".into(), "x86_64".into()]
}

#[test]
fn elf64_x86_64_selects_wide_variant() {
    let ws = support::Workspace::new();
    let target = ws.target("sample64.elf", &support::elf_bytes(Architecture::X86_64));

    let description = HeaderClassifier.describe(&target).expect("describe");
    assert!(description.starts_with("ELF 64-bit LSB"), "{description}");
    assert!(description.contains("x86-64"), "{description}");
    assert_eq!(ArchDetector::default().detect(&target), ToolVariant::Wide);
}

#[test]
fn elf32_i386_selects_default_variant() {
    let ws = support::Workspace::new();
    let target = ws.target("sample32.elf", &support::elf_bytes(Architecture::I386));

    let description = HeaderClassifier.describe(&target).expect("describe");
    assert!(description.starts_with("ELF 32-bit"), "{description}");
    assert_eq!(ArchDetector::default().detect(&target), ToolVariant::Default);
}

#[test]
fn unreadable_or_unknown_content_falls_back_to_default() {
    let ws = support::Workspace::new();
    let detector = ArchDetector::default();
    assert_eq!(detector.detect(&ws.input_dir.join("missing.bin")), ToolVariant::Default);

    let text = ws.target("notes.txt", b"just some text that is not an executable image");
    assert_eq!(detector.detect(&text), ToolVariant::Default);

    let truncated = ws.target("trunc.elf", b"\x7fELF\x02");
    assert_eq!(detector.detect(&truncated), ToolVariant::Default);
}

#[test]
fn classifier_errors_never_escape_the_detector() {
    let detector = ArchDetector::with_classifier(Broken, markers());
    assert_eq!(detector.detect(Path::new("whatever")), ToolVariant::Default);
}

#[test]
fn any_configured_marker_selects_wide() {
    let detector =
        ArchDetector::with_classifier(FixedDescription("PE32+ executable (EXE) x86-64"), markers());
    assert_eq!(detector.detect(Path::new("a.exe")), ToolVariant::Wide);

    let macho = ArchDetector::with_classifier(
        FixedDescription("Mach-O 64-bit x86_64 executable"),
        markers(),
    );
    assert_eq!(macho.detect(Path::new("a")), ToolVariant::Wide);

    let none = ArchDetector::with_classifier(FixedDescription("ELF 64-bit LSB executable"), vec![]);
    assert_eq!(none.detect(Path::new("a")), ToolVariant::Default);
}

#[test]
fn empty_input_is_described_as_empty() {
    assert_eq!(describe_bytes(b"").unwrap(), "empty");
}
