// Copyright (c) The quyz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use color_eyre::eyre::Result;
use pretty_assertions::assert_eq;
use quyz_runner::{
    action::HookKind,
    config::{PartialConfig, QuyzConfig},
    errors::{RunAbortedError, TestFailure},
    recorder::Recorder,
};
use test_case::test_case;

#[test]
fn before_all_fires_once_per_scope() -> Result<()> {
    test_init();
    let log = Log::new();
    let actions = Recorder::record_file("a.rs", |s| {
        s.describe("group", |s| {
            s.before_all(log.entry("beforeAll"));
            s.after_all(log.entry("afterAll"));
            s.it("t1", log.entry("t1"));
            s.it("t2", log.entry("t2"));
            s.it("t3", log.entry("t3"));
        });
    })?;

    let outcome = run(&actions);
    assert_eq!(outcome.context().passed(), 3);
    assert_eq!(
        log.entries(),
        ["beforeAll", "t1", "t2", "t3", "afterAll"]
    );
    Ok(())
}

#[test]
fn after_all_requires_an_entered_scope() -> Result<()> {
    test_init();
    let log = Log::new();
    let actions = Recorder::record_file("a.rs", |s| {
        s.describe("empty", |s| {
            s.before_all(log.entry("empty beforeAll"));
            s.after_all(log.entry("empty afterAll"));
        });
        s.describe("outer", |s| {
            s.after_all(log.entry("outer afterAll"));
            s.describe("inner", |s| {
                s.after_all(log.entry("inner afterAll"));
                s.it("t", log.entry("t"));
            });
        });
    })?;

    run(&actions).context();
    assert_eq!(log.entries(), ["t", "inner afterAll", "outer afterAll"]);
    Ok(())
}

#[test]
fn each_hooks_bubble_in_ancestor_order() -> Result<()> {
    test_init();
    let log = Log::new();
    let actions = Recorder::record_file("a.rs", |s| {
        s.before_each(log.entry("file beforeEach"));
        s.after_each(log.entry("file afterEach"));
        s.describe("outer", |s| {
            s.before_each(log.entry("outer beforeEach"));
            s.after_each(log.entry("outer afterEach"));
            s.describe("inner", |s| {
                s.before_each(log.entry("inner beforeEach"));
                s.after_each(log.entry("inner afterEach"));
                s.it("t", log.entry("body"));
            });
        });
    })?;

    run(&actions).context();
    assert_eq!(
        log.entries(),
        [
            "file beforeEach",
            "outer beforeEach",
            "inner beforeEach",
            "body",
            "inner afterEach",
            "outer afterEach",
            "file afterEach",
        ]
    );
    Ok(())
}

#[test]
fn disabling_bubbling_keeps_only_the_innermost_scope() -> Result<()> {
    test_init();
    let log = Log::new();
    let actions = Recorder::record_file("a.rs", |s| {
        s.before_all(log.entry("file beforeAll"));
        s.after_all(log.entry("file afterAll"));
        s.before_each(log.entry("file beforeEach"));
        s.describe("inner", |s| {
            s.before_all(log.entry("inner beforeAll"));
            s.before_each(log.entry("inner beforeEach"));
            s.after_each(log.entry("inner afterEach"));
            s.it("t", log.entry("body"));
        });
    })?;

    let config = QuyzConfig {
        bubble_hooks: false,
        ..QuyzConfig::default()
    };
    run_with(&actions, config).context();
    assert_eq!(
        log.entries(),
        [
            "inner beforeAll",
            "inner beforeEach",
            "body",
            "inner afterEach"
        ]
    );
    Ok(())
}

#[test]
fn configure_applies_to_later_tests_only() -> Result<()> {
    test_init();
    let log = Log::new();
    let actions = Recorder::record_file("a.rs", |s| {
        s.before_each(log.entry("file beforeEach"));
        s.describe("first", |s| s.it("t1", log.entry("t1")));
        s.configure(PartialConfig {
            bubble_hooks: Some(false),
            ..PartialConfig::default()
        });
        s.describe("second", |s| s.it("t2", log.entry("t2")));
    })?;

    let outcome = run(&actions);
    assert!(outcome.events.contains(&"config-changed".to_owned()));
    assert_eq!(log.entries(), ["file beforeEach", "t1", "t2"]);
    Ok(())
}

#[test]
fn before_each_failure_skips_the_body() -> Result<()> {
    test_init();
    let log = Log::new();
    let actions = Recorder::record_file("a.rs", |s| {
        s.before_each(log.entry("file beforeEach"));
        s.after_each(log.entry("file afterEach"));
        s.describe("group", |s| {
            s.before_each(log.failing("group beforeEach"));
            s.after_each(log.entry("group afterEach"));
            s.it("t", log.entry("body"));
        });
    })?;

    let outcome = run(&actions);
    let context = outcome.context();
    assert_eq!((context.passed(), context.failed()), (0, 1));
    assert!(matches!(
        &context.errors()[0].0,
        TestFailure::Hook {
            kind: HookKind::BeforeEach,
            scope,
            ..
        } if scope == "group"
    ));
    // Only scopes whose beforeEach chain completed are torn down.
    assert_eq!(
        log.entries(),
        ["file beforeEach", "group beforeEach", "file afterEach"]
    );
    Ok(())
}

#[test]
fn after_each_can_be_skipped_after_setup_failure() -> Result<()> {
    test_init();
    let log = Log::new();
    let actions = Recorder::record_file("a.rs", |s| {
        s.before_each(log.entry("beforeEach"));
        s.before_each(log.failing("failing beforeEach"));
        s.after_each(log.entry("afterEach"));
        s.it("t", log.entry("body"));
    })?;

    let config = QuyzConfig {
        after_each_on_setup_failure: false,
        ..QuyzConfig::default()
    };
    let outcome = run_with(&actions, config);
    assert_eq!(outcome.context().failed(), 1);
    assert_eq!(log.entries(), ["beforeEach", "failing beforeEach"]);
    Ok(())
}

#[test_case(false, "afterEach"; "after a passing body")]
#[test_case(true, "body"; "after a failing body")]
fn after_each_failure(body_fails: bool, expected_source: &str) -> Result<()> {
    test_init();
    let log = Log::new();
    let actions = Recorder::record_file("a.rs", |s| {
        s.after_each(log.failing("afterEach"));
        s.after_each(log.entry("second afterEach"));
        if body_fails {
            s.it("t", log.failing("body"));
        } else {
            s.it("t", log.entry("body"));
        }
    })?;

    let outcome = run(&actions);
    let context = outcome.context();
    assert_eq!(context.failed(), 1);
    assert_eq!(context.errors().len(), 1);
    let source = match &context.errors()[0].0 {
        TestFailure::Body(_) => "body",
        TestFailure::Hook {
            kind: HookKind::AfterEach,
            ..
        } => "afterEach",
        other => panic!("unexpected failure: {other}"),
    };
    assert_eq!(source, expected_source);
    // The rest of the chain still runs.
    assert_eq!(log.count("second afterEach"), 1);
    Ok(())
}

#[test]
fn after_all_failure_is_a_scope_error() -> Result<()> {
    test_init();
    let log = Log::new();
    let actions = Recorder::record_file("a.rs", |s| {
        s.describe("group", |s| {
            s.after_all(log.failing("afterAll"));
            s.it("t", log.entry("t"));
        });
    })?;

    let outcome = run(&actions);
    let context = outcome.context();
    assert_eq!((context.passed(), context.failed()), (1, 0));
    assert_eq!(context.errors().len(), 1);
    assert_eq!(context.errors()[0].1, "group");
    assert!(!context.is_success());
    assert!(
        outcome
            .events
            .contains(&"scope-hook-failed:group".to_owned())
    );
    Ok(())
}

#[test]
fn hook_failures_can_abort_the_run() -> Result<()> {
    test_init();
    let log = Log::new();
    let actions = Recorder::record_file("a.rs", |s| {
        s.describe("group", |s| {
            s.before_each(log.failing("beforeEach"));
            s.it("t1", log.entry("t1"));
        });
        s.it("t2", log.entry("t2"));
    })?;

    let config = QuyzConfig {
        abort_on_hook_failure: true,
        ..QuyzConfig::default()
    };
    let outcome = run_with(&actions, config);
    match outcome.result {
        Err(RunAbortedError::HookFailed { kind, scope, .. }) => {
            assert_eq!(kind, HookKind::BeforeEach);
            assert_eq!(scope, "group");
        }
        other => panic!("expected a hook abort, got {other:?}"),
    }
    assert_eq!(log.entries(), ["beforeEach"]);
    Ok(())
}
