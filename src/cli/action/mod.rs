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

//! The complete/validate/run protocol every command follows.
//!
//! A command is a value implementing [`Lifecycle`]; [`execute`] is the only
//! way to drive it, so `validate` never sees an incomplete command and `run`
//! is never reached after a validation error. The generic flows in the
//! submodules are building blocks that command `run` bodies call into.

pub mod create;
pub mod delete;
pub mod describe;
pub mod edit;
pub mod list;

use crate::cli::display::TablePrinter;
use crate::infrastructure::constants::DEFAULT_NAMESPACE;
use crate::infrastructure::editor::{Editor, ExternalEditor};
use crate::infrastructure::kubernetes::client::{KbClient, KbClientImpl};
use crate::shared::error::{KbError, Result};
use crate::shared::fatal::ErrorStrategy;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

pub use delete::{Prompt, TerminalPrompt};

#[async_trait::async_trait]
pub trait Lifecycle: Send {
    /// Resolve values that depend on the environment (namespace, defaults,
    /// remote lookups). Read-only towards the cluster.
    async fn complete(&mut self, ctx: &CommandContext) -> Result<()>;

    /// Check preconditions over the completed state. No writes.
    async fn validate(&self, ctx: &CommandContext) -> Result<()>;

    async fn run(&mut self, ctx: &mut CommandContext) -> Result<()>;
}

pub async fn execute<C: Lifecycle + ?Sized>(cmd: &mut C, ctx: &mut CommandContext) -> Result<()> {
    cmd.complete(ctx).await?;
    cmd.validate(ctx).await?;
    cmd.run(ctx).await
}

/// Output streams of a command.
pub struct IoStreams {
    pub out: Box<dyn Write + Send + Sync>,
    pub err: Box<dyn Write + Send + Sync>,
}

impl IoStreams {
    pub fn stdio() -> Self {
        Self {
            out: Box::new(std::io::stdout()),
            err: Box::new(std::io::stderr()),
        }
    }

    pub fn new(out: Box<dyn Write + Send + Sync>, err: Box<dyn Write + Send + Sync>) -> Self {
        Self { out, err }
    }
}

/// Connection settings and the lazily built Kubernetes client.
pub struct Factory {
    kubeconfig: Option<String>,
    context: Option<String>,
    namespace: Option<String>,
    client: OnceCell<Arc<dyn KbClient>>,
}

impl Factory {
    pub fn new(
        kubeconfig: Option<String>,
        context: Option<String>,
        namespace: Option<String>,
    ) -> Self {
        Self {
            kubeconfig,
            context,
            namespace,
            client: OnceCell::new(),
        }
    }

    /// A factory over an existing client, pinned to `namespace`.
    pub fn with_client(client: Arc<dyn KbClient>, namespace: &str) -> Self {
        Self {
            kubeconfig: None,
            context: None,
            namespace: Some(namespace.to_string()),
            client: OnceCell::new_with(Some(client)),
        }
    }

    pub async fn client(&self) -> Result<Arc<dyn KbClient>> {
        let client = self
            .client
            .get_or_try_init(|| async {
                let client =
                    KbClientImpl::new_with_config(self.kubeconfig.clone(), self.context.clone())
                        .await?;
                Ok::<Arc<dyn KbClient>, KbError>(Arc::new(client))
            })
            .await?;
        Ok(Arc::clone(client))
    }

    /// Explicit namespace, else the kubeconfig context's namespace, else
    /// `default`.
    pub fn namespace(&self) -> String {
        if let Some(ns) = self.namespace.as_deref().filter(|ns| !ns.is_empty()) {
            return ns.to_string();
        }
        self.kubeconfig_namespace()
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string())
    }

    fn kubeconfig_namespace(&self) -> Option<String> {
        use kube::config::Kubeconfig;

        let kubeconfig = match self.kubeconfig.as_deref() {
            Some(path) => Kubeconfig::read_from(path),
            None => Kubeconfig::read(),
        };
        let kubeconfig = match kubeconfig {
            Ok(k) => k,
            Err(e) => {
                debug!(error = %e, "kubeconfig not readable, using default namespace");
                return None;
            }
        };
        let context_name = self
            .context
            .clone()
            .or_else(|| kubeconfig.current_context.clone())?;
        kubeconfig
            .contexts
            .iter()
            .find(|c| c.name == context_name)
            .and_then(|c| c.context.as_ref())
            .and_then(|c| c.namespace.clone())
            .filter(|ns| !ns.is_empty())
    }
}

/// Everything a command needs besides its own options.
pub struct CommandContext {
    pub factory: Factory,
    pub streams: IoStreams,
    pub errors: ErrorStrategy,
    pub prompt: Box<dyn Prompt>,
    pub editor: Box<dyn Editor>,
}

impl CommandContext {
    pub fn new(factory: Factory, errors: ErrorStrategy, editor_override: Option<String>) -> Self {
        Self {
            factory,
            streams: IoStreams::stdio(),
            errors,
            prompt: Box::new(TerminalPrompt),
            editor: Box::new(ExternalEditor::resolve(editor_override)),
        }
    }

    pub fn out(&mut self) -> &mut dyn Write {
        &mut *self.streams.out
    }

    /// Borderless list table, colored unless color is off.
    pub fn table(&self) -> TablePrinter {
        self.styled(TablePrinter::new())
    }

    pub fn boxed_table(&self) -> TablePrinter {
        self.styled(TablePrinter::boxed())
    }

    fn styled(&self, table: TablePrinter) -> TablePrinter {
        if self.errors.color_enabled() {
            table
        } else {
            table.without_color()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeClient;

    struct Recorder {
        calls: Vec<&'static str>,
        fail_validate: bool,
    }

    #[async_trait::async_trait]
    impl Lifecycle for Recorder {
        async fn complete(&mut self, _ctx: &CommandContext) -> Result<()> {
            self.calls.push("complete");
            Ok(())
        }

        async fn validate(&self, _ctx: &CommandContext) -> Result<()> {
            if self.fail_validate {
                return Err(KbError::validation("invalid"));
            }
            Ok(())
        }

        async fn run(&mut self, _ctx: &mut CommandContext) -> Result<()> {
            self.calls.push("run");
            Ok(())
        }
    }

    fn context() -> CommandContext {
        let factory = Factory::with_client(Arc::new(FakeClient::new()), "test");
        crate::testing::context(factory).0
    }

    #[tokio::test]
    async fn test_execute_order() {
        let mut ctx = context();
        let mut cmd = Recorder { calls: vec![], fail_validate: false };
        execute(&mut cmd, &mut ctx).await.unwrap();
        assert_eq!(cmd.calls, vec!["complete", "run"]);
    }

    #[tokio::test]
    async fn test_run_not_reached_after_validate_error() {
        let mut ctx = context();
        let mut cmd = Recorder { calls: vec![], fail_validate: true };
        assert!(execute(&mut cmd, &mut ctx).await.is_err());
        assert_eq!(cmd.calls, vec!["complete"]);
    }

    #[test]
    fn test_explicit_namespace_wins() {
        let factory = Factory::new(None, None, Some("demo".to_string()));
        assert_eq!(factory.namespace(), "demo");
    }
}
