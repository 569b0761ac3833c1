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

// CLI command definitions

use super::action::{execute, CommandContext};
use super::class::ClassCommand;
use super::cluster::ClusterCommand;
use super::migration::MigrationCommand;
use super::version::VersionCommand;
use crate::shared::error::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "kbcli",
    version,
    about = "Command line interface for KubeBlocks",
    long_about = "Manage KubeBlocks database clusters: create, back up, restore, accounts and more"
)]
pub struct CliArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags accepted by every subcommand.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Path to kubeconfig file
    /// If not specified, uses default kubeconfig resolution (KUBECONFIG env or ~/.kube/config)
    #[arg(long, global = true)]
    pub kubeconfig: Option<String>,

    /// Kubernetes context to use
    #[arg(long, global = true)]
    pub context: Option<String>,

    /// Namespace of the objects
    #[arg(long, short = 'n', global = true)]
    pub namespace: Option<String>,

    /// Print debug logs
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Cluster command
    #[command(subcommand)]
    Cluster(ClusterCommand),

    /// Data migration between two data sources
    #[command(subcommand)]
    Migration(MigrationCommand),

    /// Manage classes
    #[command(subcommand)]
    Class(ClassCommand),

    /// Print the version information, include kubernetes, KubeBlocks and kbcli version
    Version(VersionCommand),
}

impl Commands {
    pub async fn execute(self, ctx: &mut CommandContext) -> Result<()> {
        match self {
            Commands::Cluster(cmd) => cmd.execute(ctx).await,
            Commands::Migration(cmd) => cmd.execute(ctx).await,
            Commands::Class(cmd) => cmd.execute(ctx).await,
            Commands::Version(mut cmd) => execute(&mut cmd, ctx).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = CliArgs::parse_from(["kbcli", "cluster", "list-backups", "-n", "demo", "-v"]);
        assert_eq!(args.global.namespace.as_deref(), Some("demo"));
        assert!(args.global.verbose);
    }
}
