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

//! Generic list flow shared by the list commands

use crate::cli::action::CommandContext;
use crate::cli::display::output::{as_list, OutputFormat};
use crate::infrastructure::constants::LABEL_APP_INSTANCE;
use crate::infrastructure::kubernetes::client::ListSelector;
use crate::infrastructure::kubernetes::gvr::Gvr;
use crate::shared::error::Result;
use kube::api::DynamicObject;
use std::collections::HashSet;
use std::io::Write;

/// `app.kubernetes.io/instance in (a,b)` appended to `selector`.
pub fn build_label_selector_by_names(selector: &str, names: &[String]) -> String {
    if names.is_empty() {
        return selector.to_string();
    }
    let label = format!("{} in ({})", LABEL_APP_INSTANCE, names.join(","));
    if selector.is_empty() {
        label
    } else {
        format!("{},{}", selector, label)
    }
}

/// Oldest first; objects without a timestamp sort first.
pub fn sort_by_creation(items: &mut [DynamicObject]) {
    items.sort_by_key(|o| o.metadata.creation_timestamp.as_ref().map(|t| t.0));
}

/// Flags shared by every list command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ListFlags {
    /// Output format
    #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// List across all namespaces
    #[arg(long, short = 'A')]
    pub all_namespaces: bool,

    /// Label selector to filter on
    #[arg(long, short = 'l', default_value = "")]
    pub selector: String,

    /// Field selector to filter on, e.g. metadata.name=backup-1
    #[arg(long)]
    pub field_selector: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ListOptions {
    pub gvr: Gvr,
    /// Only these object names are shown, when set.
    pub names: Vec<String>,
    pub label_selector: String,
    pub field_selector: Option<String>,
    pub all_namespaces: bool,
    pub format: OutputFormat,
    pub namespace: String,
}

impl ListOptions {
    pub fn new(gvr: Gvr) -> Self {
        Self {
            gvr,
            names: Vec::new(),
            label_selector: String::new(),
            field_selector: None,
            all_namespaces: false,
            format: OutputFormat::Table,
            namespace: String::new(),
        }
    }

    pub fn from_flags(gvr: Gvr, flags: &ListFlags) -> Self {
        Self {
            label_selector: flags.selector.clone(),
            field_selector: flags.field_selector.clone(),
            all_namespaces: flags.all_namespaces,
            format: flags.output,
            ..Self::new(gvr)
        }
    }

    pub fn complete(&mut self, ctx: &CommandContext) {
        self.namespace = ctx.factory.namespace();
    }

    fn scope(&self) -> Option<&str> {
        if self.all_namespaces || !self.gvr.namespaced {
            None
        } else {
            Some(&self.namespace)
        }
    }

    pub fn includes(&self, name: &str) -> bool {
        self.names.is_empty() || self.names.iter().any(|n| n == name)
    }

    /// Fetch matching objects in API order.
    pub async fn fetch(&self, ctx: &CommandContext) -> Result<Vec<DynamicObject>> {
        let client = ctx.factory.client().await?;
        let mut selector = ListSelector::labels(self.label_selector.clone());
        if let Some(fields) = &self.field_selector {
            selector = selector.with_fields(fields.clone());
        }
        client.list(&self.gvr, self.scope(), &selector).await
    }

    /// Structured output: the fetched list as is, narrowed to `names`.
    pub async fn print_structured(&self, ctx: &mut CommandContext) -> Result<()> {
        let items: Vec<DynamicObject> = self
            .fetch(ctx)
            .await?
            .into_iter()
            .filter(|o| self.includes(o.metadata.name.as_deref().unwrap_or_default()))
            .collect();
        self.format.write(ctx.out(), &as_list(&items))
    }

    /// Fetch for table output: sorted oldest first and narrowed to `names`.
    /// An empty result prints the not-found line and yields `None`.
    pub async fn fetch_for_table(
        &self,
        ctx: &mut CommandContext,
    ) -> Result<Option<Vec<DynamicObject>>> {
        let mut items = self.fetch(ctx).await?;
        if items.is_empty() {
            self.print_not_found(ctx.out())?;
            return Ok(None);
        }
        sort_by_creation(&mut items);
        let names: HashSet<&str> = self.names.iter().map(String::as_str).collect();
        let items = items
            .into_iter()
            .filter(|o| {
                names.is_empty() || names.contains(o.metadata.name.as_deref().unwrap_or_default())
            })
            .collect();
        Ok(Some(items))
    }

    pub fn print_not_found(&self, out: &mut dyn Write) -> Result<()> {
        if self.scope().is_none() {
            writeln!(out, "No {} found", self.gvr.resource)?;
        } else {
            writeln!(
                out,
                "No {} found in {} namespace.",
                self.gvr.resource, self.namespace
            )?;
        }
        Ok(())
    }
}
