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

//! Backup policy commands: list-backup-policy, describe-backup-policy and
//! edit-backup-policy.

use crate::cli::action::edit::{
    split_set_values, EditOutcome, EditableField, FieldEditor, EDIT_HEADER,
};
use crate::cli::action::list::{build_label_selector_by_names, ListFlags, ListOptions};
use crate::cli::action::{CommandContext, Lifecycle};
use crate::cli::display::format::time_format;
use crate::cli::display::table::print_pair;
use crate::cli::display::ColorTheme;
use crate::domain::backup::BackupPolicy;
use crate::domain::{annotation, from_dynamic, label, to_dynamic};
use crate::infrastructure::constants::{ANNOTATION_DEFAULT_BACKUP_POLICY, LABEL_APP_INSTANCE};
use crate::infrastructure::kubernetes::client::{KbClient, ListSelector};
use crate::infrastructure::kubernetes::gvr::Gvr;
use crate::shared::error::{KbError, Result};
use clap::Parser;
use comfy_table::Cell;
use tracing::info;

#[derive(Parser, Debug, Clone, Default)]
pub struct ListBackupPolicyCommand {
    /// Only list policies of these clusters
    pub clusters: Vec<String>,

    #[command(flatten)]
    pub flags: ListFlags,

    #[arg(skip)]
    namespace: String,
}

#[async_trait::async_trait]
impl Lifecycle for ListBackupPolicyCommand {
    async fn complete(&mut self, ctx: &CommandContext) -> Result<()> {
        self.namespace = ctx.factory.namespace();
        Ok(())
    }

    async fn validate(&self, _ctx: &CommandContext) -> Result<()> {
        Ok(())
    }

    async fn run(&mut self, ctx: &mut CommandContext) -> Result<()> {
        let mut opts = ListOptions::from_flags(Gvr::backup_policy(), &self.flags);
        opts.label_selector = build_label_selector_by_names(&self.flags.selector, &self.clusters);
        opts.namespace = self.namespace.clone();
        if opts.format.is_structured() {
            return opts.print_structured(ctx).await;
        }

        // API order, no sorting
        let items = opts.fetch(ctx).await?;
        if items.is_empty() {
            return opts.print_not_found(ctx.out());
        }

        let theme = ColorTheme::default();
        let mut tbl = ctx.table();
        tbl.set_header(&["NAME", "NAMESPACE", "DEFAULT", "CLUSTER", "CREATE-TIME", "STATUS"]);
        for obj in &items {
            let policy: BackupPolicy = from_dynamic(obj)?;
            let default = annotation(obj, ANNOTATION_DEFAULT_BACKUP_POLICY).unwrap_or("false");
            tbl.add_row(vec![
                Cell::new(policy.name()),
                Cell::new(policy.namespace()),
                Cell::new(default),
                Cell::new(label(obj, LABEL_APP_INSTANCE).unwrap_or_default()),
                Cell::new(time_format(policy.metadata.creation_timestamp.as_ref())),
                Cell::new(policy.phase()).fg(theme.phase_color(policy.phase())),
            ]);
        }
        tbl.print(ctx.out())?;
        Ok(())
    }
}

#[derive(Parser, Debug, Clone, Default)]
pub struct DescribeBackupPolicyCommand {
    /// Cluster names
    pub clusters: Vec<String>,

    /// Backup policy name
    #[arg(long = "name", value_delimiter = ',')]
    pub names: Vec<String>,

    #[arg(skip)]
    namespace: String,
}

impl DescribeBackupPolicyCommand {
    /// Named policies when `--name` is given, else only default ones.
    fn selected(&self, policy: &BackupPolicy) -> bool {
        if self.names.is_empty() {
            policy.is_default()
        } else {
            self.names.iter().any(|n| n == policy.name())
        }
    }
}

fn print_backup_policy(ctx: &mut CommandContext, policy: &BackupPolicy) -> Result<()> {
    let out = ctx.out();
    writeln!(out, "Summary:")?;
    print_pair(out, "Name", policy.name())?;
    print_pair(out, "Cluster", policy.cluster())?;
    print_pair(out, "Namespace", policy.namespace())?;
    print_pair(out, "Default", &policy.is_default().to_string())?;
    if let Some(repo) = &policy.spec.backup_repo_name {
        print_pair(out, "Backup Repo Name", repo)?;
    }

    writeln!(out, "\nBackup Methods:")?;
    let mut tbl = ctx.table();
    tbl.set_header(&["Name", "ActionSet", "snapshot-volumes"]);
    for m in &policy.spec.backup_methods {
        tbl.add_row(vec![
            m.name.clone(),
            m.action_set_name.clone(),
            m.snapshot_volumes.unwrap_or(false).to_string(),
        ]);
    }
    tbl.print(ctx.out())?;
    Ok(())
}

#[async_trait::async_trait]
impl Lifecycle for DescribeBackupPolicyCommand {
    async fn complete(&mut self, ctx: &CommandContext) -> Result<()> {
        self.namespace = ctx.factory.namespace();
        Ok(())
    }

    async fn validate(&self, _ctx: &CommandContext) -> Result<()> {
        if self.clusters.is_empty() && self.names.is_empty() {
            return Err(KbError::validation(
                "missing cluster name or backup policy name",
            ));
        }
        Ok(())
    }

    async fn run(&mut self, ctx: &mut CommandContext) -> Result<()> {
        let client = ctx.factory.client().await?;
        let selector = build_label_selector_by_names("", &self.clusters);
        let objs = client
            .list(
                &Gvr::backup_policy(),
                Some(&self.namespace),
                &ListSelector::labels(selector),
            )
            .await?;
        if objs.is_empty() {
            writeln!(ctx.out(), "No backup policy found")?;
            return Ok(());
        }
        for obj in &objs {
            let policy: BackupPolicy = from_dynamic(obj)?;
            if self.selected(&policy) {
                print_backup_policy(ctx, &policy)?;
            }
        }
        Ok(())
    }
}

/// Keys editable through `edit-backup-policy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupPolicyField {
    BackupRepoName,
    PathPrefix,
    BackoffLimit,
}

#[async_trait::async_trait]
impl EditableField for BackupPolicyField {
    type Target = BackupPolicy;

    fn all() -> &'static [Self] {
        &[
            BackupPolicyField::BackupRepoName,
            BackupPolicyField::PathPrefix,
            BackupPolicyField::BackoffLimit,
        ]
    }

    fn key(&self) -> &'static str {
        match self {
            BackupPolicyField::BackupRepoName => "backupRepoName",
            BackupPolicyField::PathPrefix => "pathPrefix",
            BackupPolicyField::BackoffLimit => "backoffLimit",
        }
    }

    fn get(&self, policy: &BackupPolicy) -> Option<String> {
        match self {
            BackupPolicyField::BackupRepoName => policy.spec.backup_repo_name.clone(),
            BackupPolicyField::PathPrefix => policy.spec.path_prefix.clone(),
            BackupPolicyField::BackoffLimit => policy.spec.backoff_limit.map(|v| v.to_string()),
        }
    }

    async fn set(&self, policy: &mut BackupPolicy, value: &str, client: &dyn KbClient) -> Result<()> {
        let value = Some(value.to_string()).filter(|v| !v.is_empty());
        match self {
            BackupPolicyField::BackupRepoName => {
                // the repo must exist before a policy can point at it
                if let Some(repo) = value.as_deref() {
                    client.get(&Gvr::backup_repo(), "", repo).await?;
                }
                policy.spec.backup_repo_name = value;
            }
            BackupPolicyField::PathPrefix => policy.spec.path_prefix = value,
            BackupPolicyField::BackoffLimit => {
                policy.spec.backoff_limit = value
                    .map(|v| {
                        v.parse::<i32>().map_err(|_| {
                            KbError::validation(format!(
                                "invalid backoffLimit: {}, should be an integer",
                                v
                            ))
                        })
                    })
                    .transpose()?;
            }
        }
        Ok(())
    }
}

#[derive(Parser, Debug, Clone, Default)]
pub struct EditBackupPolicyCommand {
    /// Backup policy name
    pub names: Vec<String>,

    /// set values on the command line (can specify multiple or separate values with commas: key1=val1,key2=val2)
    #[arg(long = "set")]
    pub values: Vec<String>,

    #[arg(skip)]
    namespace: String,
}

impl EditBackupPolicyCommand {
    fn name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Lifecycle for EditBackupPolicyCommand {
    async fn complete(&mut self, ctx: &CommandContext) -> Result<()> {
        if self.names.is_empty() {
            return Err(KbError::validation("missing backupPolicy name"));
        }
        if self.names.len() > 1 {
            return Err(KbError::validation(
                "only support to update one backupPolicy or quote cronExpression",
            ));
        }
        self.namespace = ctx.factory.namespace();
        Ok(())
    }

    async fn validate(&self, _ctx: &CommandContext) -> Result<()> {
        Ok(())
    }

    async fn run(&mut self, ctx: &mut CommandContext) -> Result<()> {
        let client = ctx.factory.client().await?;
        let gvr = Gvr::backup_policy();
        let obj = client.get(&gvr, &self.namespace, self.name()).await?;
        let mut policy: BackupPolicy = from_dynamic(&obj)?;

        let mut editor = FieldEditor::<BackupPolicyField>::new();
        let content = editor.render(&policy);
        let rows = if self.values.is_empty() {
            let edited = ctx.editor.edit(
                &format!("{}-edit-", policy.name()),
                &format!("{}{}\n", EDIT_HEADER, content),
            )?;
            edited.lines().map(str::to_string).collect()
        } else {
            split_set_values(&self.values)
        };

        match editor.apply(&mut policy, &rows, client.as_ref()).await? {
            EditOutcome::Unchanged => {
                writeln!(ctx.out(), "updated (no change)")?;
            }
            EditOutcome::Changed => {
                let updated = to_dynamic(&policy)?;
                let result = client.update(&gvr, policy.namespace(), &updated).await;
                editor.finish(result)?;
                info!(policy = policy.name(), "backup policy updated");
                writeln!(ctx.out(), "updated")?;
            }
        }
        Ok(())
    }
}
