use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_plugstore"))
}

/// Command with a clean environment: no inherited storage path or config,
/// and XDG config pointed at the temp dir.
fn plugstore(home: &Path) -> Command {
    let mut cmd = Command::new(bin());
    cmd.env_remove("PLUGSTORE_PATH")
        .env_remove("PLUGSTORE_CONFIG")
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("RUST_LOG", "off");
    cmd
}

fn run_with_path(home: &Path, db: &Path, args: &[&str]) -> Output {
    plugstore(home)
        .arg("--path")
        .arg(db)
        .args(args)
        .output()
        .expect("run plugstore")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_cli_set_get_keys_count_remove_flow() {
    let home = TempDir::new().unwrap();
    let db = home.path().join("store.db");

    let output = run_with_path(home.path(), &db, &["set", "weather", "foo", "\"bar\""]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Stored foo in weather"));

    let output = run_with_path(home.path(), &db, &["set", "weather", "zap", "{\"n\": 3}"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let output = run_with_path(home.path(), &db, &["get", "weather", "foo"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "\"bar\"");

    let output = run_with_path(home.path(), &db, &["keys", "weather"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "foo\nzap\n");

    let output = run_with_path(home.path(), &db, &["count", "weather"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "2");

    let output = run_with_path(home.path(), &db, &["--quiet", "remove", "weather", "foo"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).is_empty());

    let output = run_with_path(home.path(), &db, &["keys", "weather"]);
    assert_eq!(stdout(&output), "zap\n");
}

#[test]
fn test_cli_string_flag_stores_text_verbatim() {
    let home = TempDir::new().unwrap();
    let db = home.path().join("store.db");

    let output = run_with_path(home.path(), &db, &["set", "--string", "notes", "greeting", "hello there"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let output = run_with_path(home.path(), &db, &["get", "notes", "greeting"]);
    assert_eq!(stdout(&output).trim(), "\"hello there\"");
}

#[test]
fn test_cli_json_output() {
    let home = TempDir::new().unwrap();
    let db = home.path().join("store.db");

    run_with_path(home.path(), &db, &["set", "weather", "foo", "[1, 2]"]);

    let output = run_with_path(home.path(), &db, &["--json", "get", "weather", "foo"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let parsed: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(parsed["namespace"], "weather");
    assert_eq!(parsed["key"], "foo");
    assert_eq!(parsed["value"], serde_json::json!([1, 2]));

    let output = run_with_path(home.path(), &db, &["--json", "count", "weather"]);
    let parsed: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(parsed["count"], 1);
}

#[test]
fn test_cli_namespaces_lists_provisioned_tables() {
    let home = TempDir::new().unwrap();
    let db = home.path().join("store.db");

    run_with_path(home.path(), &db, &["set", "weather", "foo", "1"]);
    run_with_path(home.path(), &db, &["set", "karma", "ann", "3"]);

    let output = run_with_path(home.path(), &db, &["--json", "namespaces"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let mut names: Vec<String> = serde_json::from_str(&stdout(&output)).unwrap();
    names.sort();
    assert_eq!(names, vec!["karma".to_string(), "weather".to_string()]);
}

#[test]
fn test_cli_read_commands_do_not_create_namespaces() {
    let home = TempDir::new().unwrap();
    let db = home.path().join("store.db");

    run_with_path(home.path(), &db, &["set", "weather", "foo", "1"]);

    let output = run_with_path(home.path(), &db, &["keys", "wether"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).is_empty());

    let output = run_with_path(home.path(), &db, &["count", "wether"]);
    assert_eq!(stdout(&output).trim(), "0");

    let output = run_with_path(home.path(), &db, &["get", "wether", "foo"]);
    assert_eq!(output.status.code(), Some(3));

    let output = run_with_path(home.path(), &db, &["namespaces"]);
    assert_eq!(stdout(&output), "weather\n");
}

#[test]
fn test_cli_missing_key_exits_not_found() {
    let home = TempDir::new().unwrap();
    let db = home.path().join("store.db");

    let output = run_with_path(home.path(), &db, &["get", "weather", "nope"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("nope doesn't exist"));

    let output = run_with_path(home.path(), &db, &["remove", "weather", "nope"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_cli_without_path_exits_not_found() {
    let home = TempDir::new().unwrap();

    let output = plugstore(home.path())
        .args(["keys", "weather"])
        .output()
        .expect("run plugstore");
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("No storage path configured"));
}

#[test]
fn test_cli_invalid_json_exits_invalid_input() {
    let home = TempDir::new().unwrap();
    let db = home.path().join("store.db");

    let output = run_with_path(home.path(), &db, &["set", "weather", "foo", "not json"]);
    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("--string"));
}

#[test]
fn test_cli_reads_storage_from_default_config_file() {
    let home = TempDir::new().unwrap();
    let db = home.path().join("from_config.db");
    let config_dir = home.path().join("config").join("plugstore");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        format!(
            "[storage]\npath = \"{}\"\ndatabase = \"bots\"\n",
            db.to_string_lossy()
        ),
    )
    .unwrap();

    let output = plugstore(home.path())
        .args(["set", "weather", "foo", "true"])
        .output()
        .expect("run plugstore");
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(db.exists());

    let output = plugstore(home.path())
        .args(["get", "weather", "foo"])
        .output()
        .expect("run plugstore");
    assert_eq!(stdout(&output).trim(), "true");
}

#[test]
fn test_cli_explicit_config_must_exist() {
    let home = TempDir::new().unwrap();

    let output = plugstore(home.path())
        .args(["--config", "/nonexistent/plugstore.toml", "keys", "weather"])
        .output()
        .expect("run plugstore");
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_cli_completions_need_no_storage() {
    let home = TempDir::new().unwrap();

    let output = plugstore(home.path())
        .args(["completions", "bash"])
        .output()
        .expect("run plugstore");
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("plugstore"));
}
