use assert_cmd::Command;
use assert_fs::prelude::*;
use predicates::prelude::*;

fn analytics_cli(home: &assert_fs::TempDir) -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("analytics-cli")?;
    cmd.env("ANALYTICS_HOME", home.path()).env("NO_COLOR", "1");
    Ok(cmd)
}

#[test]
fn cannot_run_cli_parse_without_args() -> Result<(), Box<dyn std::error::Error>> {
    let home = assert_fs::TempDir::new()?;

    analytics_cli(&home)?
        .arg("parse")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "the following required arguments were not provided:",
        ));

    Ok(())
}

#[test]
fn parse_prints_summary() -> Result<(), Box<dyn std::error::Error>> {
    let home = assert_fs::TempDir::new()?;

    analytics_cli(&home)?
        .arg("parse")
        .arg("tests/fixtures/page_views.sql")
        .assert()
        .success()
        .stdout(predicate::str::contains("engine: ReplacingMergeTree"))
        .stdout(predicate::str::contains("version column: _peerdb_version"))
        .stdout(predicate::str::contains("soft delete column: _peerdb_is_deleted"))
        .stdout(predicate::str::contains("Parsed 7 columns"));

    // First run writes the default config
    home.child("config.toml").assert(predicate::path::exists());

    Ok(())
}

#[test]
fn parse_prints_json() -> Result<(), Box<dyn std::error::Error>> {
    let home = assert_fs::TempDir::new()?;

    let output = analytics_cli(&home)?
        .arg("parse")
        .arg("tests/fixtures/page_views.sql")
        .arg("--json")
        .output()?;
    assert!(output.status.success());

    let schema: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(schema["engine"], "ReplacingMergeTree");
    assert_eq!(schema["table"]["database"], "analytics");
    assert_eq!(schema["primary_key"], serde_json::json!(["id"]));
    assert_eq!(schema["settings"]["index_granularity"], "8192");
    assert_eq!(schema["columns"][2]["is_nullable"], true);
    assert_eq!(schema["columns"][4]["mapped_runtime_type"], "uuid");

    Ok(())
}

#[test]
fn parse_reads_stdin() -> Result<(), Box<dyn std::error::Error>> {
    let home = assert_fs::TempDir::new()?;

    analytics_cli(&home)?
        .arg("parse")
        .arg("-")
        .write_stdin("CREATE TABLE t (id UInt64) ENGINE = MergeTree ORDER BY id")
        .assert()
        .success()
        .stdout(predicate::str::contains("order by: (id)"));

    Ok(())
}

#[test]
fn parse_rejects_invalid_statement() -> Result<(), Box<dyn std::error::Error>> {
    let home = assert_fs::TempDir::new()?;
    let ddl = home.child("broken.sql");
    ddl.write_str("CREATE TABLE t (id UInt64,")?;

    analytics_cli(&home)?
        .arg("parse")
        .arg(ddl.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Parse"));

    Ok(())
}
