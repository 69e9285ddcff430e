use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn convert_swagger_to_raml_by_default() {
    let mut cmd = cargo_bin_cmd!("apiconv");
    cmd.arg("convert").arg(fixture_path("pets.oas20.yaml"));

    let output = predicate::str::starts_with("#%RAML 1.0\n")
        .and(predicate::str::contains("title: Pet Store"))
        .and(predicate::str::contains("/pets:"));
    cmd.assert().success().stdout(output);
}

#[test]
fn convert_raml_to_openapi_3_as_json() {
    let mut cmd = cargo_bin_cmd!("apiconv");
    cmd.arg("convert")
        .arg(fixture_path("pets.raml10.yaml"))
        .args(["--from", "raml10", "--to", "oas30", "--format", "json"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"openapi\": \"3.0.0\""));
}

#[test]
fn output_file_extension_picks_json() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("pets.json");
    let mut cmd = cargo_bin_cmd!("apiconv");
    cmd.arg("convert")
        .arg(fixture_path("pets.raml10.yaml"))
        .args(["--from", "raml", "--to", "swagger", "--validate", "true"])
        .arg("--output")
        .arg(&target);
    cmd.assert().success().stdout(predicate::str::is_empty());

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&target).unwrap()).unwrap();
    assert_eq!(written["swagger"], "2.0");
    assert_eq!(written["info"]["title"], "Pet Store");
}

#[test]
fn several_files_convert_in_order() {
    let mut cmd = cargo_bin_cmd!("apiconv");
    cmd.arg("convert")
        .arg(fixture_path("pets.oas20.yaml"))
        .arg(fixture_path("pets.oas20.yaml"))
        .args(["--format", "json"]);
    let assert = cmd.assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert_eq!(stdout.matches("\"title\": \"Pet Store\"").count(), 2);
}

#[test]
fn config_file_sets_the_dialects() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("apiconv.toml");
    fs::write(&config, "[convert]\nfrom = \"raml10\"\nto = \"oas20\"\n").unwrap();

    let mut cmd = cargo_bin_cmd!("apiconv");
    cmd.arg("convert")
        .arg(fixture_path("pets.raml10.yaml"))
        .arg("--config")
        .arg(&config);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("swagger: '2.0'"));
}

#[test]
fn project_file_in_the_working_directory_is_read() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("apiconv.toml"),
        "[convert]\nfrom = \"raml10\"\nto = \"oas30\"\n",
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("apiconv");
    cmd.current_dir(dir.path())
        .arg("convert")
        .arg(fixture_path("pets.raml10.yaml"))
        .args(["--to", "oas20"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("swagger: '2.0'"));
}

#[test]
fn unknown_output_format_is_a_configuration_error() {
    let mut cmd = cargo_bin_cmd!("apiconv");
    cmd.arg("convert")
        .arg(fixture_path("pets.oas20.yaml"))
        .args(["--format", "xml"]);
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("unknown output format"));
}

#[test]
fn missing_file_exits_with_status_one() {
    let mut cmd = cargo_bin_cmd!("apiconv");
    cmd.arg("convert").arg(fixture_path("nope.yaml"));
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn malformed_document_reports_the_location() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("broken.yaml");
    fs::write(&input, "swagger: \"2.0\"\npaths: {}\n").unwrap();

    let mut cmd = cargo_bin_cmd!("apiconv");
    cmd.arg("convert").arg(&input);
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("malformed input"));
}

#[test]
fn openapi_3_is_not_a_source() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("v3.yaml");
    fs::write(&input, "openapi: 3.0.0\ninfo: {title: A, version: '1'}\npaths: {}\n").unwrap();

    let mut cmd = cargo_bin_cmd!("apiconv");
    cmd.arg("convert").arg(&input).args(["--from", "oas30"]);
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("does not support import"));
}

#[test]
fn parse_prints_the_document_model() {
    let mut cmd = cargo_bin_cmd!("apiconv");
    cmd.arg("parse")
        .arg(fixture_path("pets.raml10.yaml"))
        .args(["--dialect", "raml10"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"title\": \"Pet Store\""));
}

#[test]
fn list_shows_capabilities() {
    let mut cmd = cargo_bin_cmd!("apiconv");
    cmd.arg("list");
    cmd.assert().success().stdout(
        predicate::str::contains("raml08")
            .and(predicate::str::contains("oas30"))
            .and(predicate::str::contains("(export)")),
    );
}
