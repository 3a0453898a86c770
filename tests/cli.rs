// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn nodeflow() -> Command {
    let mut cmd = Command::cargo_bin("nodeflow").unwrap();
    cmd.env_remove("NODEFLOW_CONFIG")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_run_prints_message() {
    nodeflow()
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Hello, AIMedic!"));
}

#[test]
fn test_run_with_seeded_greeting() {
    nodeflow()
        .args(["run", "--seed", "greeting_words=Hi", "--from-inputs", "greeting_words"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hi, AIMedic!"));
}

#[test]
fn test_run_json_output() {
    let output = nodeflow()
        .args(["run", "--format", "json", "--output", "greeting_words"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["message"], "Hello, AIMedic!");
    assert_eq!(value["greeting_words"], "Hello");
}

#[test]
fn test_run_missing_input_fails() {
    nodeflow()
        .args(["run", "--node", "introduce"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("greeting_words"));
}

#[test]
fn test_run_with_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[seeds]\ngreeting_words = \"Howdy\"").unwrap();

    nodeflow()
        .arg("run")
        .arg("--config")
        .arg(file.path())
        .args(["--node", "introduce"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Howdy, AIMedic!"));
}

#[test]
fn test_describe_lists_nodes_in_order() {
    nodeflow()
        .arg("describe")
        .assert()
        .success()
        .stdout(predicate::str::contains("1. greeting"))
        .stdout(predicate::str::contains("2. introduce"));
}

#[test]
fn test_unknown_node_is_reported() {
    nodeflow()
        .args(["describe", "--node", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope"));
}

#[test]
fn test_verbose_describe_lists_tags() {
    nodeflow()
        .args(["describe", "--verbose"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tags:"))
        .stdout(predicate::str::contains("greeting: -"));
}
