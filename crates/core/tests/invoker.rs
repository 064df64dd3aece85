use std::ffi::OsString;
use std::path::PathBuf;

use idbgen_core::config::ExportEnv;
use idbgen_core::model::{ToolDescriptor, ToolVariant};
use idbgen_core::services::{ArtifactNamer, ArtifactSet, Invocation, LaunchArg};

fn sample_artifacts() -> ArtifactSet {
    ArtifactNamer::new("/out", ".sqlite").name("sample.bin", ToolVariant::Default, "abc123")
}

fn sample_invocation(scripts: &[PathBuf]) -> Invocation {
    let tool = ToolDescriptor::resolve("/opt/ida", ToolVariant::Default);
    Invocation::compose(&tool, &sample_artifacts(), scripts, &ExportEnv::default())
}

fn script_flag(path: &str) -> OsString {
    OsString::from(format!("-S\"{path}\""))
}

#[test]
fn command_line_orders_batch_scripts_log_then_target() {
    let scripts = vec![PathBuf::from("/s/first.py"), PathBuf::from("/s/second.py")];
    let inv = sample_invocation(&scripts);

    let artifacts = sample_artifacts();
    let mut log_flag = OsString::from("-L");
    log_flag.push(&artifacts.log);

    assert_eq!(
        inv.argv(),
        vec![
            OsString::from("-B"),
            script_flag("/s/first.py"),
            script_flag("/s/second.py"),
            log_flag,
            artifacts.working_copy.into_os_string(),
        ]
    );
    assert!(matches!(inv.args[1], LaunchArg::Script(_)));
}

#[test]
fn no_scripts_means_no_script_flags() {
    let inv = sample_invocation(&[]);
    assert_eq!(inv.args.len(), 3);
    assert!(inv.display_args().iter().all(|a| !a.starts_with("-S")));
}

#[test]
fn environment_is_a_per_invocation_map() {
    let inv = sample_invocation(&[]);
    assert_eq!(inv.env.len(), 2);
    assert_eq!(inv.env.get("DIAPHORA_AUTO"), Some(&OsString::from("1")));
    assert_eq!(
        inv.env.get("DIAPHORA_EXPORT_FILE"),
        Some(&sample_artifacts().export.into_os_string())
    );
    // Composing must not leak into the parent process.
    assert!(std::env::var_os("DIAPHORA_EXPORT_FILE").is_none());

    let cmd = inv.to_command();
    let envs: Vec<_> = cmd.get_envs().collect();
    assert_eq!(envs.len(), 2);
}

#[test]
fn custom_export_variable_names_are_honored() {
    let tool = ToolDescriptor::resolve("/opt/ida", ToolVariant::Wide);
    let artifacts = ArtifactNamer::new("/out", ".db").name("x.so", ToolVariant::Wide, "h");
    let export = ExportEnv { auto_var: "AUTO".into(), export_file_var: "EXPORT_TO".into() };
    let inv = Invocation::compose(&tool, &artifacts, &[], &export);

    assert_eq!(inv.program, tool.path);
    assert_eq!(inv.env.get("EXPORT_TO"), Some(&artifacts.export.clone().into_os_string()));
    assert!(artifacts.export.ends_with("x-h.db"));
    assert!(inv.env.contains_key("AUTO"));
}

#[test]
fn script_path_with_spaces_stays_one_quoted_token() {
    let inv = sample_invocation(&[PathBuf::from("/s/my script.py")]);
    assert_eq!(inv.argv()[1], OsString::from("-S\"/s/my script.py\""));

    let cmd = inv.to_command();
    let args: Vec<_> = cmd.get_args().collect();
    assert_eq!(args.len(), 4);
    assert_eq!(args[1], std::ffi::OsStr::new("-S\"/s/my script.py\""));
}
