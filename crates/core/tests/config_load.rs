use std::fs;
use std::path::PathBuf;

use idbgen_core::config::{
    load_config, save_config, ConfigError, ConfigFormat, GeneratorConfig, HashAlgorithm,
};
use tempfile::tempdir;

#[test]
fn json_config_fills_defaults() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("config.json");
    fs::write(&path, r#"{"tool_dir": "/opt/ida", "output_dir": "/srv/idb"}"#).unwrap();

    let cfg = load_config(&path).expect("load json");
    assert_eq!(cfg.tool_dir, PathBuf::from("/opt/ida"));
    assert_eq!(cfg.output_dir, PathBuf::from("/srv/idb"));
    assert!(cfg.scripts.is_empty());
    assert_eq!(cfg.cleanup.patterns, vec!["pingme.txt".to_string(), "*.pdb".to_string()]);
    assert_eq!(cfg.hash, HashAlgorithm::Sha1);
    assert_eq!(cfg.export_env.auto_var, "DIAPHORA_AUTO");
    assert_eq!(cfg.export_env.export_file_var, "DIAPHORA_EXPORT_FILE");
    assert_eq!(cfg.export_extension, ".sqlite");
    assert!(cfg.arch_markers.iter().any(|m| m == "x86-64"));
}

#[test]
fn yaml_config_keeps_script_order() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("config.yaml");
    fs::write(
        &path,
        "tool_dir: /opt/ida\noutput_dir: /srv/idb\nscripts:\n  - /s/diaphora.py\n  - /s/export.py\n\
         hash: sha256\ncleanup:\n  patterns: []\n",
    )
    .unwrap();

    let cfg = load_config(&path).expect("load yaml");
    assert_eq!(cfg.scripts, vec![PathBuf::from("/s/diaphora.py"), PathBuf::from("/s/export.py")]);
    assert_eq!(cfg.hash, HashAlgorithm::Sha256);
    assert!(cfg.cleanup.patterns.is_empty());
}

#[test]
fn save_then_load_preserves_config() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("nested").join("config.json");
    let cfg = GeneratorConfig::new("/opt/ida", "/srv/idb").with_scripts(["/s/a.py"]);
    save_config(&path, &cfg).expect("save");
    assert_eq!(load_config(&path).expect("reload"), cfg);
}

#[test]
fn missing_config_reports_read_error() {
    let temp = tempdir().unwrap();
    let err = load_config(&temp.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
    assert!(err.to_string().contains("Failed to read config"));
}

#[test]
fn corrupt_json_reports_parse_error() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("config.json");
    fs::write(&path, "not-json").unwrap();
    let err = load_config(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config JSON"));
}

#[test]
fn validate_rejects_empty_paths_and_bad_patterns() {
    let err = GeneratorConfig::new("", "/srv/idb").validate().unwrap_err();
    assert!(err.to_string().contains("tool_dir is required"));

    let mut cfg = GeneratorConfig::new("/opt/ida", "/srv/idb");
    cfg.cleanup.patterns = vec!["[unclosed".into()];
    assert!(cfg.validate().unwrap_err().to_string().contains("malformed"));

    cfg.cleanup.patterns = vec!["../escape/*".into()];
    assert!(cfg.validate().unwrap_err().to_string().contains("path separators"));

    let mut cfg = GeneratorConfig::new("/opt/ida", "/srv/idb");
    cfg.export_extension = "sqlite".into();
    assert!(cfg.validate().is_err());
}

#[test]
fn format_follows_extension() {
    assert_eq!(ConfigFormat::from_path(std::path::Path::new("a.yml")), ConfigFormat::Yaml);
    assert_eq!(ConfigFormat::from_path(std::path::Path::new("a.YAML")), ConfigFormat::Yaml);
    assert_eq!(ConfigFormat::from_path(std::path::Path::new("a.json")), ConfigFormat::Json);
    assert_eq!(HashAlgorithm::parse("SHA-256"), Some(HashAlgorithm::Sha256));
    assert_eq!(HashAlgorithm::parse("md5"), None);
}
