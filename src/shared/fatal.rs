// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Final error reporting for a command invocation

use colored::Colorize;
use std::io::Write;

/// Decides how a terminal error is printed and which exit code it maps to.
///
/// One value is built in `main` from the global flags and handed to every
/// command through its execution context.
#[derive(Debug, Clone, Copy)]
pub struct ErrorStrategy {
    color: bool,
}

impl Default for ErrorStrategy {
    fn default() -> Self {
        Self { color: true }
    }
}

impl ErrorStrategy {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    pub fn color_enabled(&self) -> bool {
        self.color
    }

    /// Render the error message the way it is shown to the user.
    pub fn format(&self, err: &anyhow::Error) -> String {
        let mut message = err.to_string();
        // anyhow chains are flattened so context added by callers is not lost
        for cause in err.chain().skip(1) {
            let cause = cause.to_string();
            if !message.contains(&cause) {
                message.push_str(": ");
                message.push_str(&cause);
            }
        }
        let line = format!("error: {}", message);
        if self.color {
            line.red().to_string()
        } else {
            line
        }
    }

    /// Write the error and return the process exit code.
    pub fn report(&self, err: &anyhow::Error, w: &mut dyn Write) -> i32 {
        let _ = writeln!(w, "{}", self.format(err));
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_format() {
        let strategy = ErrorStrategy::plain();
        let err = anyhow::anyhow!("missing cluster name");
        assert_eq!(strategy.format(&err), "error: missing cluster name");
    }

    #[test]
    fn test_report_exit_code() {
        let strategy = ErrorStrategy::plain();
        let mut buf = Vec::new();
        let code = strategy.report(&anyhow::anyhow!("boom"), &mut buf);
        assert_eq!(code, 1);
        assert_eq!(String::from_utf8(buf).unwrap(), "error: boom\n");
    }

    #[test]
    fn test_context_chain_flattened() {
        let strategy = ErrorStrategy::plain();
        let err = anyhow::anyhow!("inner").context("outer");
        assert_eq!(strategy.format(&err), "error: outer: inner");
    }
}
