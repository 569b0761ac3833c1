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

pub mod accounts;
pub mod backup;
pub mod backup_policy;
pub mod create;

use crate::cli::action::{execute, CommandContext};
use crate::shared::error::Result;
use accounts::{
    CreateAccountCommand, DeleteAccountCommand, DescribeAccountCommand, ListAccountsCommand,
    RoleCommand,
};
use backup::{
    BackupCommand, DeleteBackupCommand, DescribeBackupCommand, ListBackupsCommand, RestoreCommand,
};
use backup_policy::{
    DescribeBackupPolicyCommand, EditBackupPolicyCommand, ListBackupPolicyCommand,
};
use create::ClusterCreateCommand;

#[derive(clap::Subcommand, Debug)]
pub enum ClusterCommand {
    /// Create a cluster.
    Create(ClusterCreateCommand),

    /// Create a backup for the cluster.
    Backup(BackupCommand),

    /// List backups.
    #[command(visible_alias = "ls-backups")]
    ListBackups(ListBackupsCommand),

    /// Describe a backup.
    #[command(visible_alias = "desc-backup")]
    DescribeBackup(DescribeBackupCommand),

    /// Delete a backup.
    DeleteBackup(DeleteBackupCommand),

    /// Restore a new cluster from backup.
    Restore(RestoreCommand),

    /// List backup policies.
    #[command(visible_alias = "list-bp")]
    ListBackupPolicy(ListBackupPolicyCommand),

    /// Describe backup policy.
    #[command(visible_alias = "desc-backup-policy")]
    DescribeBackupPolicy(DescribeBackupPolicyCommand),

    /// Edit backup policy.
    #[command(visible_alias = "edit-bp")]
    EditBackupPolicy(EditBackupPolicyCommand),

    /// Create account for a cluster.
    CreateAccount(CreateAccountCommand),

    /// Delete account for a cluster.
    DeleteAccount(DeleteAccountCommand),

    /// Describe account roles and related information.
    DescribeAccount(DescribeAccountCommand),

    /// List accounts for a cluster.
    #[command(visible_alias = "ls-accounts")]
    ListAccounts(ListAccountsCommand),

    /// Grant role to account.
    #[command(visible_aliases = ["grant", "gr"])]
    GrantRole(RoleCommand),

    /// Revoke role from account.
    #[command(visible_aliases = ["revoke", "rv"])]
    RevokeRole(RoleCommand),
}

impl ClusterCommand {
    pub async fn execute(self, ctx: &mut CommandContext) -> Result<()> {
        match self {
            ClusterCommand::Create(mut cmd) => execute(&mut cmd, ctx).await,
            ClusterCommand::Backup(mut cmd) => execute(&mut cmd, ctx).await,
            ClusterCommand::ListBackups(mut cmd) => execute(&mut cmd, ctx).await,
            ClusterCommand::DescribeBackup(mut cmd) => execute(&mut cmd, ctx).await,
            ClusterCommand::DeleteBackup(mut cmd) => execute(&mut cmd, ctx).await,
            ClusterCommand::Restore(mut cmd) => execute(&mut cmd, ctx).await,
            ClusterCommand::ListBackupPolicy(mut cmd) => execute(&mut cmd, ctx).await,
            ClusterCommand::DescribeBackupPolicy(mut cmd) => execute(&mut cmd, ctx).await,
            ClusterCommand::EditBackupPolicy(mut cmd) => execute(&mut cmd, ctx).await,
            ClusterCommand::CreateAccount(mut cmd) => execute(&mut cmd, ctx).await,
            ClusterCommand::DeleteAccount(mut cmd) => execute(&mut cmd, ctx).await,
            ClusterCommand::DescribeAccount(mut cmd) => execute(&mut cmd, ctx).await,
            ClusterCommand::ListAccounts(mut cmd) => execute(&mut cmd, ctx).await,
            ClusterCommand::GrantRole(mut cmd) => execute(&mut cmd, ctx).await,
            ClusterCommand::RevokeRole(cmd) => execute(&mut cmd.revoking(), ctx).await,
        }
    }
}
