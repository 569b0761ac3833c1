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

//! Generic delete flow with typed-name confirmation

use crate::cli::action::CommandContext;
use crate::infrastructure::kubernetes::client::ListSelector;
use crate::infrastructure::kubernetes::gvr::Gvr;
use crate::shared::error::{KbError, Result};
use std::collections::HashSet;
use tracing::info;

/// Asks the user to confirm destructive actions.
pub trait Prompt: Send + Sync {
    /// Ask the user to type `names` again; fails unless they match.
    fn confirm_names(&self, names: &[String]) -> Result<()>;
}

/// Reads the confirmation from the terminal.
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn confirm_names(&self, names: &[String]) -> Result<()> {
        let typed: String = dialoguer::Input::new()
            .with_prompt("Please type the name again(separate with white space when more than one)")
            .allow_empty(true)
            .interact_text()
            .map_err(|e| KbError::validation(format!("failed to read confirmation: {}", e)))?;
        check_confirmation(names, &typed)
    }
}

/// `typed` must list exactly `names`, in any order.
pub fn check_confirmation(names: &[String], typed: &str) -> Result<()> {
    let expected: HashSet<&str> = names.iter().map(String::as_str).collect();
    let got: HashSet<&str> = typed.split_whitespace().collect();
    if expected == got {
        return Ok(());
    }
    Err(KbError::validation(format!(
        "typed \"{}\" does not match \"{}\"",
        typed.trim(),
        names.join(" ")
    )))
}

#[derive(Debug, Clone)]
pub struct DeleteOptions {
    pub gvr: Gvr,
    pub names: Vec<String>,
    /// Used to find targets when `force` is set and no names are given.
    pub label_selector: String,
    /// Delete without naming each object, and without confirmation.
    pub force: bool,
    pub auto_approve: bool,
    /// Names the calling command already confirmed.
    pub confirmed_names: Vec<String>,
    pub namespace: String,
}

impl DeleteOptions {
    pub fn new(gvr: Gvr) -> Self {
        Self {
            gvr,
            names: Vec::new(),
            label_selector: String::new(),
            force: false,
            auto_approve: false,
            confirmed_names: Vec::new(),
            namespace: String::new(),
        }
    }

    pub fn complete(&mut self, ctx: &CommandContext) {
        self.namespace = ctx.factory.namespace();
    }

    pub fn validate(&self) -> Result<()> {
        if self.names.is_empty() && !self.force {
            return Err(KbError::validation(format!("missing {} name", self.gvr.resource)));
        }
        if self.names.is_empty() && self.label_selector.is_empty() {
            return Err(KbError::validation("no name was specified"));
        }
        Ok(())
    }

    async fn targets(&self, ctx: &CommandContext) -> Result<Vec<String>> {
        if !self.names.is_empty() {
            return Ok(self.names.clone());
        }
        let client = ctx.factory.client().await?;
        let objs = client
            .list(
                &self.gvr,
                Some(&self.namespace),
                &ListSelector::labels(self.label_selector.clone()),
            )
            .await?;
        Ok(objs.into_iter().filter_map(|o| o.metadata.name).collect())
    }

    /// Delete every target in order, stopping at the first failure.
    pub async fn run(&self, ctx: &mut CommandContext) -> Result<()> {
        let targets = self.targets(ctx).await?;
        if targets.is_empty() {
            writeln!(ctx.out(), "No {} found", self.gvr.resource)?;
            return Ok(());
        }

        if !self.auto_approve && !self.force {
            let unconfirmed: Vec<String> = targets
                .iter()
                .filter(|n| !self.confirmed_names.contains(n))
                .cloned()
                .collect();
            if !unconfirmed.is_empty() {
                ctx.prompt.confirm_names(&unconfirmed)?;
            }
        }

        let client = ctx.factory.client().await?;
        for name in &targets {
            client.delete(&self.gvr, &self.namespace, name).await?;
            info!(resource = %self.gvr, name = %name, "deleted");
            writeln!(ctx.out(), "{} {} deleted", self.gvr.resource, name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_confirmation() {
        let names = vec!["a".to_string(), "b".to_string()];
        assert!(check_confirmation(&names, "b a").is_ok());
        assert!(check_confirmation(&names, "  a   b ").is_ok());
        let err = check_confirmation(&names, "a").unwrap_err();
        assert_eq!(err.to_string(), "typed \"a\" does not match \"a b\"");
    }

    #[test]
    fn test_validate_requires_name_without_force() {
        let opts = DeleteOptions::new(Gvr::backup());
        assert_eq!(opts.validate().unwrap_err().to_string(), "missing backups name");
    }

    #[test]
    fn test_validate_force_needs_selector() {
        let mut opts = DeleteOptions::new(Gvr::backup());
        opts.force = true;
        assert!(opts.validate().is_err());
        opts.label_selector = "app.kubernetes.io/instance in (c1)".to_string();
        assert!(opts.validate().is_ok());
    }
}
