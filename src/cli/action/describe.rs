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

//! Generic describe flow: fetch named objects as typed values

use crate::cli::action::CommandContext;
use crate::cli::display::table::print_warning_events;
use crate::domain::from_dynamic;
use crate::infrastructure::kubernetes::gvr::Gvr;
use crate::shared::error::{KbError, Result};
use serde::de::DeserializeOwned;

#[derive(Debug, Clone)]
pub struct DescribeOptions {
    pub gvr: Gvr,
    pub names: Vec<String>,
    pub namespace: String,
}

impl DescribeOptions {
    pub fn new(gvr: Gvr, names: Vec<String>) -> Self {
        Self {
            gvr,
            names,
            namespace: String::new(),
        }
    }

    pub fn complete(&mut self, ctx: &CommandContext) -> Result<()> {
        if self.names.is_empty() {
            return Err(KbError::validation(format!(
                "{} name should be specified",
                self.gvr.kind.to_lowercase()
            )));
        }
        self.namespace = ctx.factory.namespace();
        Ok(())
    }

    /// Fetch one object and convert it.
    pub async fn fetch<T: DeserializeOwned>(&self, ctx: &CommandContext, name: &str) -> Result<T> {
        let client = ctx.factory.client().await?;
        let obj = client.get(&self.gvr, &self.namespace, name).await?;
        from_dynamic(&obj)
    }

    /// Print Warning events whose involved object is `kind/name`.
    pub async fn print_events(&self, ctx: &mut CommandContext, name: &str) -> Result<()> {
        let client = ctx.factory.client().await?;
        let events = client
            .list_events(&self.namespace, self.gvr.kind, name)
            .await?;
        print_warning_events(ctx.out(), &events)?;
        Ok(())
    }
}
