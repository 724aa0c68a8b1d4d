// Copyright (c) The quyz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use camino_tempfile::Utf8TempDir;
use color_eyre::eyre::Result;
use indoc::indoc;
use pretty_assertions::assert_eq;
use quyz_runner::{
    collector::{Collector, TestFile, TestRegistry},
    config::QuyzConfig,
    errors::RecordError,
};

fn registry(log: &Log) -> TestRegistry {
    let mut registry = TestRegistry::new();
    let setup_log = log.clone();
    registry.add_setup(move |s| {
        s.global_setup(setup_log.entry("globalSetup"));
        s.global_teardown(setup_log.entry("globalTeardown"));
    });

    let math_log = log.clone();
    registry.add_file(TestFile::new("tests/math.rs", move |s| {
        let log = math_log.clone();
        s.do_once(log.entry("connect"));
        s.describe("math", |s| {
            s.it("adds", log.entry("adds"));
        });
    }));

    let strings_log = log.clone();
    registry.add_file(TestFile::new("tests/strings.rs", move |s| {
        s.it("concatenates", strings_log.entry("concatenates"));
    }));

    registry.add_file(TestFile::new("tests/broken.rs", |s| {
        s.it("never runs", || -> Result<(), String> { panic!("must not run") });
        s.describe("group", |_| ());
        s.global_teardown(|| ());
    }));
    registry
}

#[test]
fn dev_sequence_replays_files_but_not_one_shots() -> Result<()> {
    test_init();
    let dir = Utf8TempDir::new()?;
    std::fs::write(
        dir.path().join(QuyzConfig::CONFIG_PATH),
        indoc! {r#"
            dev = true

            [collector]
            sequence = ["tests/math.rs", "tests/strings.rs", "tests/math.rs"]
        "#},
    )?;
    let config = QuyzConfig::from_sources(dir.path(), None)?;

    let log = Log::new();
    let registry = registry(&log);
    let collection = Collector::new(&registry, &config).collect()?;
    assert_eq!(
        collection.files,
        ["tests/math.rs", "tests/strings.rs", "tests/math.rs"]
    );

    let outcome = run_with(&collection.actions, config);
    assert_eq!(outcome.context().passed(), 3);
    assert_eq!(
        log.entries(),
        [
            "globalSetup",
            "connect",
            "adds",
            "concatenates",
            "adds",
            "globalTeardown"
        ]
    );
    Ok(())
}

#[test]
fn broken_files_are_skipped() -> Result<()> {
    test_init();
    let log = Log::new();
    let registry = registry(&log);
    let config = QuyzConfig::default();
    let collection = Collector::new(&registry, &config).collect()?;

    assert_eq!(collection.files, ["tests/math.rs", "tests/strings.rs"]);
    assert_eq!(collection.skipped.len(), 1);
    let (path, error) = &collection.skipped[0];
    assert_eq!(path, "tests/broken.rs");
    assert!(matches!(
        error,
        RecordError::GlobalInsideScope {
            name: "globalTeardown"
        }
    ));

    let outcome = run_with(&collection.actions, config);
    let context = outcome.context();
    assert_eq!((context.passed(), context.failed()), (2, 0));
    assert!(context.is_success());
    Ok(())
}
