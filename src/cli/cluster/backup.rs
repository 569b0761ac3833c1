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

//! Backup and restore commands: backup, list-backups, describe-backup,
//! delete-backup and restore.

use crate::cli::action::create::{run_create, CreateHooks, CreateOptions};
use crate::cli::action::delete::DeleteOptions;
use crate::cli::action::describe::DescribeOptions;
use crate::cli::action::list::{build_label_selector_by_names, ListFlags, ListOptions};
use crate::cli::action::{CommandContext, Lifecycle};
use crate::cli::display::format::{human_go_duration, time_format};
use crate::cli::display::table::{print_line_with_tabs, print_pair, print_pair_if_set};
use crate::cli::display::ColorTheme;
use crate::domain::backup::{Backup, BackupPolicy, DELETION_POLICIES};
use crate::domain::cluster::random_cluster_name;
use crate::domain::opsrequest::{
    self, generate_backup_name, BackupOpsSpec, OpsType, RestoreOpsSpec, VOLUME_RESTORE_POLICIES,
};
use crate::domain::retention::RetentionPeriod;
use crate::domain::from_dynamic;
use crate::infrastructure::constants::{
    FAILED_JOB_LOG_TAIL_LINES, LABEL_APP_INSTANCE, LABEL_BACKUP_NAME, LABEL_CONTROLLER_UID,
};
use crate::infrastructure::kubernetes::client::{KbClient, ListSelector};
use crate::infrastructure::kubernetes::gvr::Gvr;
use crate::shared::error::{KbError, Result};
use chrono::Local;
use clap::Parser;
use comfy_table::Cell;
use kube::api::DynamicObject;
use std::io::Write;
use tracing::debug;

const MAX_NAME_ATTEMPTS: usize = 10;

/// Name of the cluster's default backup policy.
pub async fn default_backup_policy(
    client: &dyn KbClient,
    namespace: &str,
    cluster: &str,
) -> Result<String> {
    let cluster_obj = client.get(&Gvr::cluster(), namespace, cluster).await?;
    let cluster_name = cluster_obj.metadata.name.as_deref().unwrap_or(cluster);
    let selector = ListSelector::labels(format!("{}={}", LABEL_APP_INSTANCE, cluster_name));
    let objs = client
        .list(&Gvr::backup_policy(), Some(namespace), &selector)
        .await?;
    if objs.is_empty() {
        return Err(KbError::precondition(format!(
            "not found any backup policy for cluster \"{}\"",
            cluster
        )));
    }

    let mut defaults = Vec::new();
    for obj in &objs {
        let policy: BackupPolicy = from_dynamic(obj)?;
        if policy.is_default() {
            defaults.push(policy.name().to_string());
        }
    }
    match defaults.len() {
        0 => Err(KbError::precondition(format!(
            "not found any default backup policy for cluster \"{}\"",
            cluster
        ))),
        1 => Ok(defaults.remove(0)),
        _ => Err(KbError::precondition(format!(
            "cluster \"{}\" has multiple default backup policies",
            cluster
        ))),
    }
}

#[derive(Parser, Debug, Clone, Default)]
pub struct BackupCommand {
    /// Cluster name
    pub cluster: Option<String>,

    /// Backup methods are defined in backup policy, if only one backup method in backup policy, use it as default backup method, if multiple backup methods in backup policy, use method which volume snapshot is true as default backup method
    #[arg(long, default_value = "")]
    pub method: String,

    /// Backup name
    #[arg(long, default_value = "")]
    pub name: String,

    /// Backup policy name, if not specified, use the cluster default backup policy
    #[arg(long, default_value = "")]
    pub policy: String,

    /// Deletion policy for backup, determine whether the backup content in backup repo will be deleted after the backup is deleted, supported values: [Delete, Retain]
    #[arg(long, default_value = "Delete")]
    pub deletion_policy: String,

    /// Retention period for backup, supported values: [1y, 1mo, 1d, 1h, 1m] or combine them [1y1mo1d1h1m], if not specified, the backup will not be automatically deleted, you need to manually delete it.
    #[arg(long, default_value = "")]
    pub retention_period: String,

    /// Parent backup name, used for incremental backup
    #[arg(long, default_value = "")]
    pub parent_backup: String,

    #[command(flatten)]
    pub create: CreateOptions,

    #[arg(skip)]
    resolved_policy: Option<BackupPolicy>,
}

impl BackupCommand {
    fn cluster_name(&self) -> &str {
        self.cluster.as_deref().unwrap_or_default()
    }

    pub fn ops_spec(&self) -> BackupOpsSpec {
        BackupOpsSpec {
            backup_name: self.name.clone(),
            backup_policy_name: self.policy.clone(),
            backup_method: self.method.clone(),
            deletion_policy: self.deletion_policy.clone(),
            retention_period: self.retention_period.clone(),
            parent_backup_name: self.parent_backup.clone(),
        }
    }

    async fn validate_parent(&self, client: &dyn KbClient) -> Result<()> {
        let obj = client
            .get(&Gvr::backup(), &self.create.namespace, &self.parent_backup)
            .await?;
        let parent: Backup = from_dynamic(&obj)?;
        if !parent.is_completed() {
            return Err(KbError::precondition(format!(
                "parent backup {} is not completed",
                self.parent_backup
            )));
        }
        if parent.source_cluster() != self.cluster_name() {
            return Err(KbError::precondition(format!(
                "parent backup {} is not belong to cluster {}",
                self.parent_backup,
                self.cluster_name()
            )));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Lifecycle for BackupCommand {
    async fn complete(&mut self, ctx: &CommandContext) -> Result<()> {
        self.create.complete(ctx);
        if self.cluster_name().is_empty() {
            return Ok(());
        }
        if self.name.is_empty() {
            self.name = generate_backup_name(&self.create.namespace, self.cluster_name(), Local::now());
        }

        let client = ctx.factory.client().await?;
        if self.policy.is_empty() {
            self.policy =
                default_backup_policy(client.as_ref(), &self.create.namespace, self.cluster_name())
                    .await?;
        }
        let obj = client
            .get(&Gvr::backup_policy(), &self.create.namespace, &self.policy)
            .await?;
        let policy: BackupPolicy = from_dynamic(&obj)?;
        if self.method.is_empty() {
            if let Some(method) = policy.default_method() {
                debug!(method, policy = %self.policy, "using default backup method");
                self.method = method.to_string();
            }
        }
        self.resolved_policy = Some(policy);
        Ok(())
    }

    async fn validate(&self, ctx: &CommandContext) -> Result<()> {
        if self.cluster_name().is_empty() {
            return Err(KbError::validation("missing cluster name"));
        }
        if self.method.is_empty() {
            return Err(KbError::validation(
                "backup method can not be empty, you can specify it by --method",
            ));
        }
        if let Some(policy) = &self.resolved_policy {
            if !policy.has_method(&self.method) {
                return Err(KbError::validation(format!(
                    "backup method \"{}\" is not defined in backup policy \"{}\"",
                    self.method, self.policy
                )));
            }
        }
        if !DELETION_POLICIES.contains(&self.deletion_policy.as_str()) {
            return Err(KbError::validation(format!(
                "invalid deletion policy \"{}\", supported values: [{}]",
                self.deletion_policy,
                DELETION_POLICIES.join(", ")
            )));
        }
        if !self.retention_period.is_empty() {
            RetentionPeriod::parse(&self.retention_period)?;
        }
        if !self.parent_backup.is_empty() {
            let client = ctx.factory.client().await?;
            self.validate_parent(client.as_ref()).await?;
        }
        Ok(())
    }

    async fn run(&mut self, ctx: &mut CommandContext) -> Result<()> {
        run_create(&*self, &self.create, ctx).await
    }
}

#[async_trait::async_trait]
impl CreateHooks for BackupCommand {
    fn gvr(&self) -> Gvr {
        Gvr::ops_request()
    }

    fn render(&self, namespace: &str) -> Result<serde_json::Value> {
        Ok(opsrequest::render(
            &self.name,
            namespace,
            self.cluster_name(),
            OpsType::Backup,
            serde_json::to_value(self.ops_spec())?,
        ))
    }

    fn custom_output(&self, out: &mut dyn Write, _created: &DynamicObject) -> Result<()> {
        writeln!(
            out,
            "Backup {} created successfully, you can view the progress:",
            self.name
        )?;
        writeln!(
            out,
            "\tkbcli cluster list-backups --name={} -n {}",
            self.name, self.create.namespace
        )?;
        Ok(())
    }
}

#[derive(Parser, Debug, Clone, Default)]
pub struct ListBackupsCommand {
    /// Only list backups of these clusters
    pub clusters: Vec<String>,

    /// The backup name to get the details.
    #[arg(long)]
    pub name: Option<String>,

    #[command(flatten)]
    pub flags: ListFlags,

    #[arg(skip)]
    namespace: String,
}

impl ListBackupsCommand {
    fn options(&self) -> ListOptions {
        let mut opts = ListOptions::from_flags(Gvr::backup(), &self.flags);
        opts.label_selector = build_label_selector_by_names(&self.flags.selector, &self.clusters);
        opts.names = self.name.iter().cloned().collect();
        opts.namespace = self.namespace.clone();
        opts
    }
}

#[async_trait::async_trait]
impl Lifecycle for ListBackupsCommand {
    async fn complete(&mut self, ctx: &CommandContext) -> Result<()> {
        self.namespace = ctx.factory.namespace();
        Ok(())
    }

    async fn validate(&self, _ctx: &CommandContext) -> Result<()> {
        Ok(())
    }

    async fn run(&mut self, ctx: &mut CommandContext) -> Result<()> {
        let opts = self.options();
        if opts.format.is_structured() {
            return opts.print_structured(ctx).await;
        }
        let Some(items) = opts.fetch_for_table(ctx).await? else {
            return Ok(());
        };

        let theme = ColorTheme::default();
        let mut tbl = ctx.table();
        tbl.set_header(&[
            "NAME",
            "NAMESPACE",
            "SOURCE-CLUSTER",
            "METHOD",
            "STATUS",
            "TOTAL-SIZE",
            "DURATION",
            "CREATE-TIME",
            "COMPLETION-TIME",
            "EXPIRATION",
        ]);
        for obj in &items {
            let backup: Backup = from_dynamic(obj)?;
            let status = backup.status_display();
            let duration = backup
                .status
                .duration
                .as_deref()
                .map(human_go_duration)
                .unwrap_or_default();
            tbl.add_row(vec![
                Cell::new(backup.name()),
                Cell::new(backup.namespace()),
                Cell::new(backup.source_cluster()),
                Cell::new(&backup.spec.backup_method),
                Cell::new(&status).fg(theme.phase_color(&status)),
                Cell::new(&backup.status.total_size),
                Cell::new(duration),
                Cell::new(time_format(backup.metadata.creation_timestamp.as_ref())),
                Cell::new(time_format(backup.status.completion_timestamp.as_ref())),
                Cell::new(time_format(backup.status.expiration.as_ref())),
            ]);
        }
        tbl.print(ctx.out())?;
        Ok(())
    }
}

#[derive(Parser, Debug, Clone, Default)]
pub struct DescribeBackupCommand {
    /// Backup names
    pub names: Vec<String>,

    #[arg(skip)]
    opts: Option<DescribeOptions>,
}

impl DescribeBackupCommand {
    fn describe(&self) -> Result<&DescribeOptions> {
        self.opts
            .as_ref()
            .ok_or_else(|| KbError::validation("backup name should be specified"))
    }
}

/// Failure reason plus the log tail of the first failed job's pod, when
/// the logs can be fetched.
pub async fn failure_reason_with_logs(
    client: &dyn KbClient,
    backup_name: &str,
    reason: &str,
) -> Result<String> {
    let jobs = client
        .list_jobs(None, &format!("{}={}", LABEL_BACKUP_NAME, backup_name))
        .await?;
    let Some(job) = jobs
        .iter()
        .find(|j| j.status.as_ref().and_then(|s| s.failed).unwrap_or(0) > 0)
    else {
        return Ok(reason.to_string());
    };
    let uid = job.metadata.uid.as_deref().unwrap_or_default();
    let namespace = job.metadata.namespace.as_deref().unwrap_or_default();
    let pods = client
        .list_pods(namespace, &format!("{}={}", LABEL_CONTROLLER_UID, uid))
        .await?;
    let Some(pod) = pods.first() else {
        return Ok(reason.to_string());
    };
    let pod_name = pod.metadata.name.as_deref().unwrap_or_default();
    let pod_ns = pod.metadata.namespace.as_deref().unwrap_or(namespace);
    let logs = client
        .pod_logs(pod_ns, pod_name, FAILED_JOB_LOG_TAIL_LINES)
        .await?;
    Ok(format!("{}\n pod {} error logs:\n{}", reason, pod_name, logs))
}

async fn print_backup(
    ctx: &mut CommandContext,
    client: &dyn KbClient,
    backup: &Backup,
) -> Result<()> {
    let out = ctx.out();
    print_line_with_tabs(
        out,
        &[
            ("Name", backup.name()),
            ("Cluster", backup.source_cluster()),
            ("Namespace", backup.namespace()),
        ],
    )?;

    writeln!(out, "\nSpec:")?;
    print_pair_if_set(out, "Method", &backup.spec.backup_method)?;
    print_pair_if_set(out, "Policy Name", &backup.spec.backup_policy_name)?;

    let status = &backup.status;
    writeln!(out, "\nStatus:")?;
    print_pair_if_set(out, "Phase", &status.phase)?;
    print_pair_if_set(out, "Total Size", &status.total_size)?;
    if let Some(method) = &status.backup_method {
        print_pair_if_set(out, "ActionSet Name", &method.action_set_name)?;
    }
    print_pair_if_set(out, "Repository", &status.backup_repo_name)?;
    print_pair_if_set(out, "PVC Name", &status.persistent_volume_claim_name)?;
    if let Some(d) = status.duration.as_deref() {
        print_pair_if_set(out, "Duration", &human_go_duration(d))?;
    }
    print_pair_if_set(out, "Expiration Time", &time_format(status.expiration.as_ref()))?;
    print_pair_if_set(out, "Start Time", &time_format(status.start_timestamp.as_ref()))?;
    print_pair_if_set(
        out,
        "Completion Time",
        &time_format(status.completion_timestamp.as_ref()),
    )?;

    if !status.failure_reason.is_empty() {
        let reason = match failure_reason_with_logs(client, backup.name(), &status.failure_reason).await {
            Ok(reason) => reason,
            Err(e) => {
                debug!(error = %e, backup = backup.name(), "backup job logs unavailable");
                status.failure_reason.clone()
            }
        };
        print_pair(ctx.out(), "Failure Reason", &reason)?;
    }

    let out = ctx.out();
    print_pair_if_set(out, "Path", &status.path)?;
    if let Some(range) = &status.time_range {
        print_pair_if_set(out, "Time Range Start", &time_format(range.start.as_ref()))?;
        print_pair_if_set(out, "Time Range End", &time_format(range.end.as_ref()))?;
    }

    if !status.volume_snapshots.is_empty() {
        writeln!(out, "\nVolume Snapshots:")?;
        for v in &status.volume_snapshots {
            print_pair_if_set(out, "Name", &v.name)?;
            print_pair_if_set(out, "Content Name", &v.content_name)?;
            print_pair_if_set(out, "Volume Name:", &v.volume_name)?;
            print_pair_if_set(out, "Size", &v.size)?;
        }
    }
    Ok(())
}

#[async_trait::async_trait]
impl Lifecycle for DescribeBackupCommand {
    async fn complete(&mut self, ctx: &CommandContext) -> Result<()> {
        let mut opts = DescribeOptions::new(Gvr::backup(), self.names.clone());
        opts.complete(ctx)?;
        self.opts = Some(opts);
        Ok(())
    }

    async fn validate(&self, _ctx: &CommandContext) -> Result<()> {
        self.describe().map(|_| ())
    }

    async fn run(&mut self, ctx: &mut CommandContext) -> Result<()> {
        let opts = self.describe()?;
        let client = ctx.factory.client().await?;
        for name in &opts.names {
            let backup: Backup = opts.fetch(ctx, name).await?;
            print_backup(ctx, client.as_ref(), &backup).await?;
            opts.print_events(ctx, name).await?;
        }
        Ok(())
    }
}

#[derive(Parser, Debug, Clone, Default)]
pub struct DeleteBackupCommand {
    /// Cluster name
    pub clusters: Vec<String>,

    /// Backup names
    #[arg(long = "name", value_delimiter = ',')]
    pub names: Vec<String>,

    /// Delete every backup of the cluster when no --name is given, without confirmation
    #[arg(long)]
    pub force: bool,

    /// Skip interactive approval before deleting
    #[arg(long)]
    pub auto_approve: bool,

    #[arg(skip)]
    label_selector: String,

    #[arg(skip)]
    namespace: String,
}

impl DeleteBackupCommand {
    fn options(&self) -> DeleteOptions {
        let mut opts = DeleteOptions::new(Gvr::backup());
        opts.names = self.names.clone();
        opts.label_selector = self.label_selector.clone();
        opts.force = self.force;
        opts.auto_approve = self.auto_approve;
        // names given with --name were typed once already
        opts.confirmed_names = self.names.clone();
        opts.namespace = self.namespace.clone();
        opts
    }
}

#[async_trait::async_trait]
impl Lifecycle for DeleteBackupCommand {
    async fn complete(&mut self, ctx: &CommandContext) -> Result<()> {
        if self.clusters.is_empty() {
            return Err(KbError::validation("Missing cluster name"));
        }
        if self.clusters.len() > 1 {
            return Err(KbError::validation(
                "Only supported delete the Backup of one cluster",
            ));
        }
        if !self.force && self.names.is_empty() {
            return Err(KbError::validation("Missing --name as backup name."));
        }
        if self.force && self.names.is_empty() {
            self.label_selector = build_label_selector_by_names("", &self.clusters);
        }
        self.namespace = ctx.factory.namespace();
        Ok(())
    }

    async fn validate(&self, _ctx: &CommandContext) -> Result<()> {
        self.options().validate()
    }

    async fn run(&mut self, ctx: &mut CommandContext) -> Result<()> {
        self.options().run(ctx).await
    }
}

#[derive(Parser, Debug, Clone, Default)]
pub struct RestoreCommand {
    /// Name of the new cluster, generated when omitted
    pub name: Option<String>,

    /// Backup name
    #[arg(long, default_value = "")]
    pub backup: String,

    /// point in time recovery(PITR)
    #[arg(long, default_value = "")]
    pub restore_to_time: String,

    /// the volume claim restore policy, supported values: [Serial, Parallel]
    #[arg(long, default_value = "Parallel")]
    pub volume_restore_policy: String,

    #[command(flatten)]
    pub create: CreateOptions,
}

impl RestoreCommand {
    fn cluster_name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn ops_spec(&self) -> RestoreOpsSpec {
        RestoreOpsSpec {
            backup_name: self.backup.clone(),
            restore_time_str: self.restore_to_time.clone(),
            volume_restore_policy: self.volume_restore_policy.clone(),
        }
    }
}

/// A random cluster name not used in `namespace` yet.
pub async fn unused_cluster_name(client: &dyn KbClient, namespace: &str) -> Result<String> {
    for _ in 0..MAX_NAME_ATTEMPTS {
        let name = random_cluster_name();
        match client.get(&Gvr::cluster(), namespace, &name).await {
            Err(e) if e.is_not_found() => return Ok(name),
            Err(e) => return Err(e),
            Ok(_) => continue,
        }
    }
    Err(KbError::precondition("failed to generate a random cluster name"))
}

#[async_trait::async_trait]
impl Lifecycle for RestoreCommand {
    async fn complete(&mut self, ctx: &CommandContext) -> Result<()> {
        self.create.complete(ctx);
        if self.cluster_name().is_empty() {
            let client = ctx.factory.client().await?;
            self.name = Some(unused_cluster_name(client.as_ref(), &self.create.namespace).await?);
        }
        Ok(())
    }

    async fn validate(&self, ctx: &CommandContext) -> Result<()> {
        if self.backup.is_empty() {
            return Err(KbError::validation("must be specified one of the --backup"));
        }
        if !VOLUME_RESTORE_POLICIES.contains(&self.volume_restore_policy.as_str()) {
            return Err(KbError::validation(format!(
                "invalid volume restore policy \"{}\", supported values: [{}]",
                self.volume_restore_policy,
                VOLUME_RESTORE_POLICIES.join(", ")
            )));
        }
        let client = ctx.factory.client().await?;
        let obj = client
            .get(&Gvr::backup(), &self.create.namespace, &self.backup)
            .await?;
        let backup: Backup = from_dynamic(&obj)?;
        if !backup.is_completed() {
            return Err(KbError::precondition(format!(
                "backup {} is not completed",
                self.backup
            )));
        }
        Ok(())
    }

    async fn run(&mut self, ctx: &mut CommandContext) -> Result<()> {
        run_create(&*self, &self.create, ctx).await
    }
}

#[async_trait::async_trait]
impl CreateHooks for RestoreCommand {
    fn gvr(&self) -> Gvr {
        Gvr::ops_request()
    }

    fn render(&self, namespace: &str) -> Result<serde_json::Value> {
        Ok(opsrequest::render(
            self.cluster_name(),
            namespace,
            self.cluster_name(),
            OpsType::Restore,
            serde_json::to_value(self.ops_spec())?,
        ))
    }

    fn custom_output(&self, out: &mut dyn Write, _created: &DynamicObject) -> Result<()> {
        writeln!(out, "Cluster {} created", self.cluster_name())?;
        Ok(())
    }
}
