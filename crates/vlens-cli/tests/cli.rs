use pretty_assertions::assert_eq;
use std::io::Write;
use std::process::{Command, Output};
use tempfile::NamedTempFile;
use vlens_core::SliceConfig;
use vlens_test_utils::{slice_source, DIAMOND, POINT};

fn source_file(source: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".py").tempfile().unwrap();
    file.write_all(source.as_bytes()).unwrap();
    file
}

fn vlens(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_vlens"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(out: &Output) -> String {
    String::from_utf8(out.stdout.clone()).unwrap()
}

#[test]
fn lists_versions_in_declaration_order() {
    let file = source_file(POINT);
    let out = vlens(&["--input", file.path().to_str().unwrap(), "--list"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "1\n2\n");
}

#[test]
fn prints_the_slice_for_a_target() {
    let file = source_file(POINT);
    let out = vlens(&["--input", file.path().to_str().unwrap(), "--target", "2"]);
    assert!(out.status.success());
    assert_eq!(
        stdout(&out),
        slice_source(POINT, "2", &SliceConfig::default()).unwrap()
    );
}

#[test]
fn unknown_target_fails_naming_it() {
    let file = source_file(POINT);
    let out = vlens(&["--input", file.path().to_str().unwrap(), "--target", "9"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("unknown target version 9"));
}

#[test]
fn check_reports_and_fails() {
    let file = source_file(DIAMOND);
    let out = vlens(&["--input", file.path().to_str().unwrap(), "--check"]);
    assert!(!out.status.success());
    let report = stdout(&out);
    assert_eq!(report.lines().count(), 1);
    assert!(report.starts_with("error[ambiguous-resolution]:"));
}

#[test]
fn check_passes_on_a_clean_module() {
    let file = source_file(POINT);
    let out = vlens(&["--input", file.path().to_str().unwrap(), "--check"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "");
}

#[test]
fn config_file_changes_emitted_names() {
    let file = source_file(POINT);
    let mut config = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(config, "lens_prefix = \"_conv\"").unwrap();

    let out = vlens(&[
        "--input",
        file.path().to_str().unwrap(),
        "--target",
        "2",
        "--config",
        config.path().to_str().unwrap(),
    ]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("def _conv_get_x_2_1(self):"));
}

#[test]
fn invalid_config_is_rejected() {
    let file = source_file(POINT);
    let mut config = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(config, "max_lens_hops = 0").unwrap();

    let out = vlens(&[
        "--input",
        file.path().to_str().unwrap(),
        "--list",
        "--config",
        config.path().to_str().unwrap(),
    ]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("max_lens_hops"));
}

#[test]
fn missing_input_is_an_error() {
    let out = vlens(&["--input", "/nonexistent/module.py", "--list"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("reading /nonexistent/module.py"));
}

#[test]
fn verbose_flag_logs_the_mode() {
    let file = source_file(POINT);
    let quiet = vlens(&["--input", file.path().to_str().unwrap(), "--target", "2"]);
    assert!(!String::from_utf8_lossy(&quiet.stderr).contains("slicing"));

    let loud = vlens(&["--input", file.path().to_str().unwrap(), "--target", "2", "-v"]);
    assert!(loud.status.success());
    assert!(String::from_utf8_lossy(&loud.stderr).contains("slicing"));
}
