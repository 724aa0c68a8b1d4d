// Copyright (c) The quyz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino_tempfile::Utf8TempDir;
use indoc::indoc;
use pretty_assertions::assert_eq;
use quyz::{ExpectedError, PartialConfig, Quyz, QuyzExitCode};
use std::sync::{Arc, Mutex};
use test_case::test_case;

fn harness() -> Quyz {
    Quyz::new()
        .file("tests/math.rs", |s| {
            s.describe("math", |s| {
                s.it("adds", || assert_eq!(2 + 2, 4));
                s.it("multiplies", || assert_eq!(2 * 3, 6));
            });
        })
        .file("tests/strings.rs", |s| {
            s.it("concatenates", || assert_eq!(format!("{}{}", "a", "b"), "ab"));
        })
        .file("tests/flaky.rs", |s| {
            s.it("fails", || -> Result<(), String> { Err("expected failure".to_owned()) });
        })
}

fn exec(quyz: &Quyz, args: &[&str]) -> (Result<i32, ExpectedError>, String) {
    let mut out = Vec::new();
    let args = ["quyz", "--color", "never"].iter().chain(args);
    let result = quyz.exec(args, &mut out);
    let out = String::from_utf8(out).expect("output is UTF-8");
    (result, out)
}

#[test_case(&["--ignore", "tests/flaky.rs"], QuyzExitCode::OK; "all passing")]
#[test_case(&[], QuyzExitCode::TEST_RUN_FAILED; "one failing")]
#[test_case(&["--match", "nothing/**"], QuyzExitCode::NO_TESTS_RUN; "nothing selected")]
fn exit_codes(args: &[&str], expected: i32) {
    let (result, _) = exec(&harness(), args);
    assert_eq!(result.expect("run completes"), expected);
}

#[test]
fn report_lists_results() {
    let (result, out) = exec(&harness(), &["--print-file-names"]);
    assert_eq!(result.expect("run completes"), QuyzExitCode::TEST_RUN_FAILED);

    let lines: Vec<_> = out.lines().collect();
    assert_eq!(lines[0], "tests/math.rs");
    assert!(lines[1].starts_with("PASSED:  adds ("), "{out}");
    assert!(lines[2].starts_with("PASSED:  multiplies ("), "{out}");
    assert_eq!(lines[3], "tests/strings.rs");
    assert!(lines[4].starts_with("PASSED:  concatenates ("), "{out}");
    assert_eq!(lines[5], "tests/flaky.rs");
    assert!(lines[6].starts_with("FAILED:  fails ("), "{out}");
    assert!(
        out.contains("Summary: 4 tests run: 3 passed, 1 failed"),
        "{out}"
    );
    assert!(out.contains("  - fails: test failed"), "{out}");
}

#[test]
fn silent_volume_prints_nothing() {
    let (result, out) = exec(&harness(), &["--volume", "0"]);
    assert_eq!(result.expect("run completes"), QuyzExitCode::TEST_RUN_FAILED);
    assert_eq!(out, "");
}

#[test]
fn configure_changes_the_report() {
    let quyz = Quyz::new()
        .file("tests/quiet.rs", |s| {
            s.configure(PartialConfig {
                volume: Some(0),
                print_file_names: Some(true),
                ..PartialConfig::default()
            });
            s.it("hidden", || ());
        })
        .file("tests/loud.rs", |s| {
            s.configure(PartialConfig {
                volume: Some(2),
                ..PartialConfig::default()
            });
            s.it("shown", || ());
        })
        .file("tests/plain.rs", |s| {
            s.it("also shown", || ());
        });

    let (result, out) = exec(&quyz, &[]);
    assert_eq!(result.expect("run completes"), QuyzExitCode::OK);
    assert!(!out.contains("hidden"), "{out}");

    let lines: Vec<_> = out.lines().collect();
    assert!(lines[0].starts_with("PASSED:  shown ("), "{out}");
    assert_eq!(lines[1], "tests/plain.rs");
    assert!(lines[2].starts_with("PASSED:  also shown ("), "{out}");
    assert!(out.contains("Summary: 3 tests run: 3 passed"), "{out}");
}

#[test_case(&["--volume", "9"]; "volume out of range")]
#[test_case(&["--no-such-flag"]; "unknown flag")]
#[test_case(&["--match", "[unclosed"]; "invalid glob")]
#[test_case(&["--config-file", "does/not/exist.toml"]; "missing config file")]
#[test_case(&["--dev"]; "dev mode without a sequence")]
#[test_case(&["--dev", "--sequence", "tests/unknown.rs"]; "unknown sequence file")]
fn setup_errors(args: &[&str]) {
    let (result, out) = exec(&harness(), args);
    let error = result.expect_err("setup fails");
    assert_eq!(error.process_exit_code(), QuyzExitCode::SETUP_ERROR);
    assert_eq!(out, "");
}

#[test]
fn failing_global_setup_aborts() {
    let ran = Arc::new(Mutex::new(Vec::new()));
    let setup_ran = ran.clone();
    let test_ran = ran.clone();
    let quyz = Quyz::new()
        .setup(move |s| {
            let teardown_ran = setup_ran.clone();
            s.global_setup(|| -> Result<(), String> { Err("no database".to_owned()) });
            s.global_teardown(move || teardown_ran.lock().unwrap().push("teardown"));
        })
        .file("tests/db.rs", move |s| {
            let test_ran = test_ran.clone();
            s.it("queries", move || test_ran.lock().unwrap().push("queries"));
        });

    let (result, _) = exec(&quyz, &[]);
    match result {
        Err(error @ ExpectedError::RunAborted { .. }) => {
            assert_eq!(error.process_exit_code(), QuyzExitCode::RUN_ABORTED);
        }
        other => panic!("expected an aborted run, got {other:?}"),
    }
    assert_eq!(*ran.lock().unwrap(), ["teardown"]);
}

#[test]
fn config_file_selects_the_dev_sequence() {
    let dir = Utf8TempDir::new().expect("created temp dir");
    let config_file = dir.path().join("quyz.toml");
    std::fs::write(
        &config_file,
        indoc! {r#"
            dev = true
            print-file-names = true

            [collector]
            sequence = ["tests/strings.rs", "tests/math.rs"]
        "#},
    )
    .expect("wrote config");

    let (result, out) = exec(&harness(), &["--config-file", config_file.as_str()]);
    assert_eq!(result.expect("run completes"), QuyzExitCode::OK);
    let files: Vec<_> = out.lines().filter(|line| line.starts_with("tests/")).collect();
    assert_eq!(files, ["tests/strings.rs", "tests/math.rs"]);
}

#[test]
fn command_line_overrides_the_config_file() {
    let dir = Utf8TempDir::new().expect("created temp dir");
    let config_file = dir.path().join("quyz.toml");
    std::fs::write(&config_file, "volume = 0\n").expect("wrote config");

    let (result, out) = exec(
        &harness(),
        &["--config-file", config_file.as_str(), "--volume", "1"],
    );
    assert_eq!(result.expect("run completes"), QuyzExitCode::TEST_RUN_FAILED);
    assert!(!out.contains("PASSED:"), "{out}");
    assert!(out.contains("FAILED:  fails"), "{out}");
}
