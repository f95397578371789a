use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

fn strata(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_strata"))
        .args(args)
        .env_remove("STRATA_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run strata")
}

fn strata_with_config_env(args: &[&str], config: &str) -> Output {
    Command::new(env!("CARGO_BIN_EXE_strata"))
        .args(args)
        .env("STRATA_CONFIG", config)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run strata")
}

fn strata_stdin(args: &[&str], input: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_strata"))
        .args(args)
        .env_remove("STRATA_CONFIG")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to start strata");
    child.stdin.take().unwrap().write_all(input.as_bytes()).unwrap();
    child.wait_with_output().unwrap()
}

fn write_file(dir: &Path, name: &str, contents: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path.to_str().unwrap().to_string()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

const VALID: &str = r#"
ROCK R1 [ name: "Sandstone"; type: sedimentary; age: 100Ma ]
DEPOSITION D1 [ rock: R1; time: 90Ma ]
EROSION E1 [ time: 40Ma; after: D1 ]
"#;

#[test]
fn test_validate_valid_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "valid.strata", VALID);

    let output = strata(&["validate", &file]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("valid (1 rocks, 1 depositions, 1 erosions, 0 intrusions"));
}

#[test]
fn test_validate_json_output() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "bad.strata", "DEPOSITION D1 [ rock: R9; time: 10Ma ]\n");

    let output = strata(&["validate", "--format", "json", &file]);
    assert_eq!(output.status.code(), Some(1));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["is_valid"], false);
    assert_eq!(json["depositions_count"], 1);
    let errors = json["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["kind"], "resolution");
    assert_eq!(errors[0]["line"], 1);
    assert!(errors[0]["message"].as_str().unwrap().contains("R9"));
}

#[test]
fn test_validate_human_renders_diagnostics() {
    let output = strata_stdin(&["validate", "-"], "EROSION A [ after: B ]\nEROSION B [ after: A ]\n");
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Circular dependency detected: A -> B -> A"));
    assert!(stdout(&output).contains("<stdin>: invalid"));
}

#[test]
fn test_config_file_is_applied() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "extra.strata", "EROSION E1 [ depth: 5 ]\n");
    let config = write_file(dir.path(), "strata.toml", "strict_fields = true\n");

    assert!(strata(&["validate", &file]).status.success());
    let strict = strata(&["--config", &config, "validate", &file]);
    assert_eq!(strict.status.code(), Some(1));
}

#[test]
fn test_config_from_environment() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "extra.strata", "EROSION E1 [ depth: 5 ]\n");
    let config = write_file(dir.path(), "strata.toml", "strict_fields = true\n");

    let output = strata_with_config_env(&["validate", &file], &config);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("invalid"));
}

#[test]
fn test_empty_config_environment_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "extra.strata", "EROSION E1 [ depth: 5 ]\n");

    let output = strata_with_config_env(&["validate", &file], "");
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("valid (0 rocks, 0 depositions, 1 erosions"));
}

#[test]
fn test_config_flag_overrides_environment() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "extra.strata", "EROSION E1 [ depth: 5 ]\n");
    let strict = write_file(dir.path(), "strict.toml", "strict_fields = true\n");
    let lenient = write_file(dir.path(), "lenient.json", r#"{"strict_fields": false}"#);

    let output = strata_with_config_env(&["--config", &lenient, "validate", &file], &strict);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
}

#[test]
fn test_bad_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "valid.strata", VALID);
    let config = write_file(dir.path(), "strata.toml", "no_such_option = 1\n");

    let output = strata(&["--config", &config, "validate", &file]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to load configuration"));
}

#[test]
fn test_parse_prints_document() {
    let output = strata_stdin(&["parse", "-"], VALID);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["statements"].as_array().unwrap().len(), 3);
}

#[test]
fn test_fmt_write() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(
        dir.path(),
        "messy.strata",
        "EROSION   E1 [after:D1;time:40Ma;]\nDEPOSITION D1 [ time: 90Ma; rock: R1 ]\n",
    );

    let output = strata(&["fmt", "--write", &file]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        std::fs::read_to_string(&file).unwrap(),
        "EROSION E1 [ time: 40Ma; after: D1 ]\nDEPOSITION D1 [ rock: R1; time: 90Ma ]\n"
    );
}

#[test]
fn test_fmt_write_keeps_lossy_file() {
    let dir = tempfile::tempdir().unwrap();
    let source = "# basin history\nEROSION E1 [ depth: 5; time: 1Ma ]\n";
    let file = write_file(dir.path(), "lossy.strata", source);

    let output = strata(&["fmt", "--write", &file]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("unknown field 'depth'"));
    assert!(stderr(&output).contains("--force"));
    assert_eq!(std::fs::read_to_string(&file).unwrap(), source);
}

#[test]
fn test_fmt_write_force() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "lossy.strata", "# basin history\nEROSION E1 [ depth: 5; time: 1Ma ]\n");

    let output = strata(&["fmt", "--write", "--force", &file]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(std::fs::read_to_string(&file).unwrap(), "EROSION E1 [ time: 1Ma ]\n");
}

#[test]
fn test_fmt_stdout_reports_dropped_fields() {
    let output = strata_stdin(&["fmt", "-"], "EROSION E1 [ depth: 5 ]\n");
    assert!(output.status.success());
    assert_eq!(stdout(&output), "EROSION E1 [ ]\n");
    assert!(stderr(&output).contains("unknown field 'depth'"));
}

#[test]
fn test_fmt_refuses_broken_input() {
    let output = strata_stdin(&["fmt", "-"], "ROCK R1 [ name: ]\n");
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_order() {
    let output = strata_stdin(&["order", "-"], VALID);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "D1\t90Ma\nE1\t40Ma\n");
}

#[test]
fn test_missing_file() {
    let output = strata(&["validate", "/nonexistent/file.strata"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to read"));
}

#[test]
fn test_version() {
    let output = strata(&["version"]);
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("strata "));
}
