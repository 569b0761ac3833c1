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

//! Launching the user's editor on a temporary file.

use crate::infrastructure::constants::{DEFAULT_EDITOR, EDITOR_ENV_VARS};
use crate::shared::error::{KbError, Result};
use std::io::Write;
use std::process::Command;
use tracing::debug;

pub trait Editor: Send + Sync {
    /// Open `content` in an editor and return the edited text with comment
    /// lines removed. An empty result is an error.
    fn edit(&self, prefix: &str, content: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct ExternalEditor {
    command: String,
}

impl ExternalEditor {
    /// `KUBE_EDITOR`, then `EDITOR`, then the configured editor, then `vi`.
    pub fn resolve(configured: Option<String>) -> Self {
        let command = EDITOR_ENV_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .chain(configured)
            .find(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_EDITOR.to_string());
        Self { command }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

impl Editor for ExternalEditor {
    fn edit(&self, prefix: &str, content: &str) -> Result<String> {
        let mut file = tempfile::Builder::new().prefix(prefix).tempfile()?;
        file.write_all(content.as_bytes())?;
        file.flush()?;

        let mut parts = self.command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| KbError::Editor("no editor configured".to_string()))?;
        debug!(editor = %self.command, file = %file.path().display(), "launching editor");
        let status = Command::new(program)
            .args(parts)
            .arg(file.path())
            .status()
            .map_err(|e| KbError::Editor(format!("failed to launch {}: {}", program, e)))?;
        if !status.success() {
            return Err(KbError::Editor(format!("{} exited with {}", program, status)));
        }

        let edited = std::fs::read_to_string(file.path())?;
        strip_comments(&edited)
    }
}

/// Drop `#` lines; fail if nothing else is left.
pub fn strip_comments(text: &str) -> Result<String> {
    let kept: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim_start().starts_with('#'))
        .collect();
    if kept.iter().all(|l| l.trim().is_empty()) {
        return Err(KbError::validation(
            "Edit cancelled, no valid changes were saved.",
        ));
    }
    Ok(kept.join("\n"))
}
