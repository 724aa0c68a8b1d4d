// Copyright (c) The quyz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The test runner.
//!
//! The main structure in this module is [`TestRunner`], which replays an
//! action list against a stack of open scopes.

mod imp;
mod scope;

pub use imp::*;
