#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use idbgen_core::config::{CleanupRules, GeneratorConfig};
use idbgen_core::services::{Invocation, ToolRunner};

/// Stand-in for the analysis tool: writes a log and (optionally) a database
/// beside the target, then returns a fixed exit code.
pub struct FakeTool {
    pub code: i32,
    pub write_db: bool,
    /// `None` means the tool dies before opening its log.
    pub log_text: Option<&'static str>,
    pub calls: Cell<usize>,
    pub seen: RefCell<Vec<Invocation>>,
}

impl FakeTool {
    pub fn succeeding() -> Self {
        Self::new(0, true, "analysis complete\n")
    }

    pub fn failing(code: i32) -> Self {
        Self::new(code, false, "fatal: bad input file\n")
    }

    /// Killed mid-analysis: a partial database, no log.
    pub fn crashing(code: i32) -> Self {
        Self { log_text: None, ..Self::new(code, true, "") }
    }

    pub fn new(code: i32, write_db: bool, log_text: &'static str) -> Self {
        Self {
            code,
            write_db,
            log_text: Some(log_text),
            calls: Cell::new(0),
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl ToolRunner for FakeTool {
    fn run(&self, invocation: &Invocation) -> io::Result<i32> {
        self.calls.set(self.calls.get() + 1);
        self.seen.borrow_mut().push(invocation.clone());

        let argv = invocation.argv();
        let target = PathBuf::from(argv.last().expect("target argument"));
        let log = argv
            .iter()
            .find_map(|a| a.to_str().and_then(|s| s.strip_prefix("-L")))
            .map(PathBuf::from)
            .expect("log flag");
        if let Some(text) = self.log_text {
            fs::write(&log, text)?;
        }

        if self.write_db {
            let wide = invocation
                .program
                .file_stem()
                .map(|s| s.to_string_lossy().ends_with("64"))
                .unwrap_or(false);
            let db = target.with_extension(if wide { "i64" } else { "idb" });
            fs::write(db, b"IDA database")?;
        }
        Ok(self.code)
    }
}

/// Runner whose tool binary cannot be started.
pub struct MissingTool;

impl ToolRunner for MissingTool {
    fn run(&self, _invocation: &Invocation) -> io::Result<i32> {
        Err(io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }
}

/// Layout used by pipeline tests: `<tmp>/in/<name>`, `<tmp>/out`, `<tmp>/ida`.
pub struct Workspace {
    pub dir: tempfile::TempDir,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub tool_dir: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let input_dir = dir.path().join("in");
        let output_dir = dir.path().join("out");
        let tool_dir = dir.path().join("ida");
        fs::create_dir_all(&input_dir).unwrap();
        fs::create_dir_all(&tool_dir).unwrap();
        Self { dir, input_dir, output_dir, tool_dir }
    }

    pub fn target(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.input_dir.join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    pub fn config(&self) -> GeneratorConfig {
        GeneratorConfig::new(&self.tool_dir, &self.output_dir)
    }

    pub fn config_without_cleanup(&self) -> GeneratorConfig {
        self.config().with_cleanup(CleanupRules::none())
    }
}

pub fn out_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map(|rd| {
            rd.filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

/// Minimal relocatable ELF for the given architecture.
pub fn elf_bytes(arch: object::Architecture) -> Vec<u8> {
    use object::write::Object;
    use object::{BinaryFormat, Endianness, SectionKind};

    let mut obj = Object::new(BinaryFormat::Elf, arch, Endianness::Little);
    let text = obj.add_section(Vec::new(), b".text".to_vec(), SectionKind::Text);
    obj.section_mut(text).set_data(vec![0xC3u8], 1);
    obj.write().expect("write elf")
}
