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

//! `kbcli class list`

use super::action::{execute, CommandContext, Lifecycle};
use crate::domain::class::{ClassCatalog, ComponentClassDefinition};
use crate::domain::from_dynamic;
use crate::infrastructure::constants::LABEL_CLUSTER_DEF;
use crate::infrastructure::kubernetes::client::ListSelector;
use crate::infrastructure::kubernetes::gvr::Gvr;
use crate::shared::error::{KbError, Result};
use clap::Parser;

#[derive(clap::Subcommand, Debug)]
pub enum ClassCommand {
    /// List classes
    List(ClassListCommand),
}

impl ClassCommand {
    pub async fn execute(self, ctx: &mut CommandContext) -> Result<()> {
        match self {
            ClassCommand::List(mut cmd) => execute(&mut cmd, ctx).await,
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct ClassListCommand {
    /// Specify cluster definition, run "kbcli clusterdefinition list" to show all available cluster definitions
    #[arg(long)]
    pub cluster_definition: String,
}

impl ClassListCommand {
    async fn catalog(&self, ctx: &CommandContext) -> Result<ClassCatalog> {
        let client = ctx.factory.client().await?;
        let selector = ListSelector::labels(format!("{}={}", LABEL_CLUSTER_DEF, self.cluster_definition));
        let objs = client
            .list(&Gvr::component_class_definition(), None, &selector)
            .await?;

        let mut catalog = ClassCatalog::default();
        for obj in &objs {
            let def: ComponentClassDefinition = from_dynamic(obj)?;
            catalog.add(def.component(), def.classes());
        }
        Ok(catalog)
    }
}

#[async_trait::async_trait]
impl Lifecycle for ClassListCommand {
    async fn complete(&mut self, _ctx: &CommandContext) -> Result<()> {
        Ok(())
    }

    async fn validate(&self, _ctx: &CommandContext) -> Result<()> {
        if self.cluster_definition.is_empty() {
            return Err(KbError::validation("cluster definition should be specified"));
        }
        Ok(())
    }

    async fn run(&mut self, ctx: &mut CommandContext) -> Result<()> {
        let catalog = self.catalog(ctx).await?;
        if catalog.is_empty() {
            writeln!(
                ctx.out(),
                "No class found for cluster definition {}",
                self.cluster_definition
            )?;
            return Ok(());
        }
        for (component, classes) in catalog.into_sorted() {
            let mut tbl = ctx.table();
            tbl.set_header(&["COMPONENT", "CLASS", "CPU", "MEMORY"]);
            for class in &classes {
                tbl.add_row(vec![
                    component.clone(),
                    class.name.clone(),
                    class.cpu.clone(),
                    class.memory_display(),
                ]);
            }
            tbl.print(ctx.out())?;
        }
        Ok(())
    }
}
