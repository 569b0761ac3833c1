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

//! Generic create flow: render, dependencies, pre-create, submit.

use crate::cli::action::CommandContext;
use crate::cli::display::output::OutputFormat;
use crate::infrastructure::kubernetes::client::KbClient;
use crate::infrastructure::kubernetes::gvr::Gvr;
use crate::shared::error::{KbError, Result};
use kube::api::DynamicObject;
use std::io::Write;
use tracing::{debug, warn};

/// Points where a create command can hook into [`run_create`]. Every hook
/// except `render` defaults to a no-op.
#[async_trait::async_trait]
pub trait CreateHooks: Send + Sync {
    fn gvr(&self) -> Gvr;

    /// Build the object body to submit.
    fn render(&self, namespace: &str) -> Result<serde_json::Value>;

    /// Create objects the main object relies on. Skipped on dry runs.
    async fn create_dependencies(&self, _client: &dyn KbClient, _namespace: &str) -> Result<()> {
        Ok(())
    }

    /// Adjust the rendered object right before submission.
    async fn pre_create(&self, _obj: &mut DynamicObject) -> Result<()> {
        Ok(())
    }

    /// Undo `create_dependencies` after a failed submission.
    async fn clean_up(&self, _client: &dyn KbClient, _namespace: &str) -> Result<()> {
        Ok(())
    }

    fn custom_output(&self, out: &mut dyn Write, created: &DynamicObject) -> Result<()> {
        writeln!(
            out,
            "{} {} created",
            self.gvr().kind.to_lowercase(),
            created.metadata.name.as_deref().unwrap_or_default()
        )?;
        Ok(())
    }
}

/// Flags shared by every create command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CreateOptions {
    /// Print the object that would be created without submitting it
    #[arg(long)]
    pub dry_run: bool,

    /// Output format used with --dry-run
    #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Yaml)]
    pub output: OutputFormat,

    #[arg(skip)]
    pub namespace: String,
}

impl CreateOptions {
    pub fn complete(&mut self, ctx: &CommandContext) {
        self.namespace = ctx.factory.namespace();
    }
}

/// Drive one creation through the hooks.
///
/// When submission fails `clean_up` runs and the submission error is
/// returned unchanged; a failing clean-up is only logged.
pub async fn run_create<H: CreateHooks + ?Sized>(
    hooks: &H,
    opts: &CreateOptions,
    ctx: &mut CommandContext,
) -> Result<()> {
    let gvr = hooks.gvr();
    let body = hooks.render(&opts.namespace)?;
    let mut obj: DynamicObject = serde_json::from_value(body)
        .map_err(|e| KbError::InvalidResource(format!("failed to render {}: {}", gvr.kind, e)))?;

    if opts.dry_run {
        hooks.pre_create(&mut obj).await?;
        let format = if opts.output.is_structured() {
            opts.output
        } else {
            OutputFormat::Yaml
        };
        return format.write(ctx.out(), &obj);
    }

    let client = ctx.factory.client().await?;
    hooks
        .create_dependencies(client.as_ref(), &opts.namespace)
        .await?;
    hooks.pre_create(&mut obj).await?;

    debug!(resource = %gvr, namespace = %opts.namespace, "submitting object");
    let created = match client.create(&gvr, &opts.namespace, &obj).await {
        Ok(created) => created,
        Err(err) => {
            if let Err(cleanup_err) = hooks.clean_up(client.as_ref(), &opts.namespace).await {
                warn!(error = %cleanup_err, "clean up after failed create");
            }
            return Err(err);
        }
    };

    hooks.custom_output(ctx.out(), &created)
}
