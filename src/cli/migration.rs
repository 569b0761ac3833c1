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

//! `kbcli migration`: list and terminate migration tasks

use super::action::delete::DeleteOptions;
use super::action::list::{ListFlags, ListOptions};
use super::action::{execute, CommandContext, Lifecycle};
use super::display::format::time_format;
use super::display::ColorTheme;
use crate::domain::from_dynamic;
use crate::domain::migration::MigrationTask;
use crate::infrastructure::constants::MIGRATION_TASK_CRD;
use crate::infrastructure::kubernetes::client::KbClient;
use crate::infrastructure::kubernetes::gvr::Gvr;
use crate::shared::error::{KbError, Result};
use clap::Parser;
use comfy_table::Cell;

#[derive(clap::Subcommand, Debug)]
pub enum MigrationCommand {
    /// Delete migration task.
    Terminate(TerminateCommand),

    /// List migration tasks.
    #[command(visible_alias = "ls")]
    List(MigrationListCommand),
}

impl MigrationCommand {
    pub async fn execute(self, ctx: &mut CommandContext) -> Result<()> {
        match self {
            MigrationCommand::Terminate(mut cmd) => execute(&mut cmd, ctx).await,
            MigrationCommand::List(mut cmd) => execute(&mut cmd, ctx).await,
        }
    }
}

/// Fails unless the migration task CRD is installed.
pub async fn ensure_migration_crd(client: &dyn KbClient) -> Result<()> {
    match client.get(&Gvr::crd(), "", MIGRATION_TASK_CRD).await {
        Ok(_) => Ok(()),
        Err(e) if e.is_not_found() => Err(KbError::precondition(
            "datamigration crd is not installed",
        )),
        Err(e) => Err(e),
    }
}

#[derive(Parser, Debug, Clone)]
pub struct TerminateCommand {
    /// Migration task names
    pub names: Vec<String>,

    /// Skip interactive approval before deleting
    #[arg(long)]
    pub auto_approve: bool,
}

#[async_trait::async_trait]
impl Lifecycle for TerminateCommand {
    async fn complete(&mut self, ctx: &CommandContext) -> Result<()> {
        let client = ctx.factory.client().await?;
        ensure_migration_crd(client.as_ref()).await
    }

    async fn validate(&self, _ctx: &CommandContext) -> Result<()> {
        if self.names.is_empty() {
            return Err(KbError::validation("missing migration task name"));
        }
        Ok(())
    }

    async fn run(&mut self, ctx: &mut CommandContext) -> Result<()> {
        let mut opts = DeleteOptions::new(Gvr::migration_task());
        opts.names = self.names.clone();
        opts.auto_approve = self.auto_approve;
        opts.complete(ctx);
        opts.validate()?;
        opts.run(ctx).await
    }
}

#[derive(Parser, Debug, Clone)]
pub struct MigrationListCommand {
    /// Only show these migration tasks
    pub names: Vec<String>,

    #[command(flatten)]
    pub flags: ListFlags,
}

#[async_trait::async_trait]
impl Lifecycle for MigrationListCommand {
    async fn complete(&mut self, ctx: &CommandContext) -> Result<()> {
        let client = ctx.factory.client().await?;
        ensure_migration_crd(client.as_ref()).await
    }

    async fn validate(&self, _ctx: &CommandContext) -> Result<()> {
        Ok(())
    }

    async fn run(&mut self, ctx: &mut CommandContext) -> Result<()> {
        let mut opts = ListOptions::from_flags(Gvr::migration_task(), &self.flags);
        opts.names = self.names.clone();
        opts.complete(ctx);
        if opts.format.is_structured() {
            return opts.print_structured(ctx).await;
        }
        let Some(items) = opts.fetch_for_table(ctx).await? else {
            return Ok(());
        };

        let theme = ColorTheme::default();
        let mut tbl = ctx.table();
        tbl.set_header(&["NAME", "NAMESPACE", "SOURCE", "SINK", "STATUS", "CREATED-TIME"]);
        for obj in &items {
            let task: MigrationTask = from_dynamic(obj)?;
            let status = task.status.task_status.clone();
            tbl.add_row(vec![
                Cell::new(task.metadata.name.clone().unwrap_or_default()),
                Cell::new(task.metadata.namespace.clone().unwrap_or_default()),
                Cell::new(task.spec.source_endpoint.display()),
                Cell::new(task.spec.sink_endpoint.display()),
                Cell::new(&status).fg(theme.phase_color(&status)),
                Cell::new(time_format(task.metadata.creation_timestamp.as_ref())),
            ]);
        }
        tbl.print(ctx.out())?;
        Ok(())
    }
}
