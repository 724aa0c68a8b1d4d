// Copyright (c) The quyz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for quyz.
//!
//! The resolved configuration is a [`QuyzConfig`], loaded from the embedded
//! defaults layered with an optional `quyz.toml`. A [`PartialConfig`] holds a
//! subset of options and is merged on top, either from the command line or from
//! a `configure` call in a test file.

mod elements;
mod imp;

pub use elements::*;
pub use imp::*;
