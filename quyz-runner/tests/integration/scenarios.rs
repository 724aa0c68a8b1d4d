// Copyright (c) The quyz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use color_eyre::eyre::Result;
use pretty_assertions::assert_eq;
use quyz_runner::{
    action::{Action, HookKind, Title},
    errors::TestFailure,
    recorder::Recorder,
};

#[test]
fn before_each_guards_every_test() -> Result<()> {
    test_init();
    let log = Log::new();
    let actions = Recorder::record_file("a.rs", |s| {
        s.describe("A", |s| {
            s.before_each(log.entry("setup"));
            s.it("t1", log.entry("t1"));
            s.it("t2", log.entry("t2"));
        });
    })?;

    let outcome = run(&actions);
    let context = outcome.context();
    assert_eq!(context.passed() + context.failed(), 2);
    assert_eq!(log.count("setup"), 2);
    assert_eq!(log.entries(), ["setup", "t1", "setup", "t2"]);
    Ok(())
}

#[test]
fn templated_title_is_resolved() -> Result<()> {
    test_init();
    let actions = Recorder::record_file("a.rs", |s| {
        s.it_with(Title::template(|n: &i32| format!("case {n}")), 5, |n| {
            assert_eq!(*n, 5);
        });
    })?;

    let titles: Vec<_> = actions
        .iter()
        .filter_map(|action| match action {
            Action::Test(test) => Some(test.title.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(titles, ["case 5"]);

    let outcome = run(&actions);
    assert_eq!(outcome.context().passed(), 1);
    Ok(())
}

#[test]
fn failing_before_all_fails_the_whole_group() -> Result<()> {
    test_init();
    let log = Log::new();
    let actions = Recorder::record_file("a.rs", |s| {
        s.describe("group", |s| {
            s.before_all(log.failing("beforeAll"));
            s.before_each(log.entry("beforeEach"));
            s.it("t1", log.entry("t1"));
            s.describe("nested", |s| {
                s.before_all(log.entry("nested beforeAll"));
                s.it("t2", log.entry("t2"));
            });
            s.it("t3", log.entry("t3"));
        });
        s.it("outside", log.entry("outside"));
    })?;

    let outcome = run(&actions);
    let context = outcome.context();
    assert_eq!((context.passed(), context.failed()), (1, 3));
    assert_eq!(log.entries(), ["beforeAll", "outside"]);

    let failures: Vec<_> = context
        .errors()
        .iter()
        .map(|(failure, title)| (title.as_str(), failure))
        .collect();
    assert_eq!(failures.len(), 3);
    assert!(matches!(
        failures[0],
        ("t1", TestFailure::Hook { kind: HookKind::BeforeAll, scope, .. }) if scope == "group"
    ));
    for (index, title) in [(1, "t2"), (2, "t3")] {
        assert!(
            matches!(
                failures[index],
                (actual, TestFailure::SetupFailed { scope }) if actual == title && scope == "group"
            ),
            "unexpected failure: {:?}",
            failures[index]
        );
    }
    Ok(())
}

#[test]
fn do_once_runs_once_per_run() -> Result<()> {
    test_init();
    let log = Log::new();
    let define = |s: &mut Recorder| {
        s.do_once(log.entry("once"));
        s.it("t", log.entry("t"));
    };
    let mut actions = Recorder::record_file("a.rs", define)?;
    actions.extend(Recorder::record_file("a.rs", define)?);

    let outcome = run(&actions);
    assert_eq!(outcome.context().passed(), 2);
    assert_eq!(log.entries(), ["once", "t", "t"]);
    assert_eq!(
        outcome
            .events
            .iter()
            .filter(|event| *event == "one-shot-skipped")
            .count(),
        1
    );

    // A new run starts with a clean slate.
    run(&actions).context();
    assert_eq!(log.count("once"), 2);
    Ok(())
}

#[test]
fn failures_do_not_stop_later_tests() -> Result<()> {
    test_init();
    let log = Log::new();
    let actions = Recorder::record_file("a.rs", |s| {
        s.it("first", log.failing("first"));
        s.it("panics", || -> Result<(), String> { panic!("boom") });
        s.it("last", log.entry("last"));
    })?;

    let outcome = run(&actions);
    let context = outcome.context();
    assert_eq!((context.passed(), context.failed()), (1, 2));
    let titles: Vec<_> = context
        .errors()
        .iter()
        .map(|(_, title)| title.as_str())
        .collect();
    assert_eq!(titles, ["first", "panics"]);
    assert_eq!(log.entries(), ["first", "last"]);
    Ok(())
}
