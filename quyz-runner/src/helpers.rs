// Copyright (c) The quyz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! General support code for quyz-runner.

use std::{fmt, time::Duration};

/// Utilities for pluralizing various words based on count or plurality.
pub(crate) mod plural {
    /// Returns "test" if `count` is 1, otherwise "tests".
    pub(crate) fn tests_str(count: usize) -> &'static str {
        if count == 1 { "test" } else { "tests" }
    }

    /// Returns "file" if `count` is 1, otherwise "files".
    pub(crate) fn files_str(count: usize) -> &'static str {
        if count == 1 { "file" } else { "files" }
    }

    /// Returns "error" if `count` is 1, otherwise "errors".
    pub(crate) fn errors_str(count: usize) -> &'static str {
        if count == 1 { "error" } else { "errors" }
    }
}

/// Displays a duration as whole milliseconds, e.g. `12ms`.
pub(crate) struct DisplayMillis(pub(crate) Duration);

impl fmt::Display for DisplayMillis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0.as_millis())
    }
}
