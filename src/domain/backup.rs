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

//! Data protection resources: Backup and BackupPolicy

use crate::infrastructure::constants::{ANNOTATION_DEFAULT_BACKUP_POLICY, LABEL_APP_INSTANCE};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const BACKUP_PHASE_COMPLETED: &str = "Completed";
pub const ACTION_TYPE_STATEFULSET: &str = "StatefulSet";

pub const DELETION_POLICIES: [&str; 2] = ["Delete", "Retain"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Backup {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: BackupSpec,
    #[serde(default)]
    pub status: BackupStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSpec {
    #[serde(default)]
    pub backup_policy_name: String,
    #[serde(default)]
    pub backup_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_backup_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupStatus {
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub total_size: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_method: Option<BackupMethod>,
    #[serde(default)]
    pub backup_repo_name: String,
    #[serde(default)]
    pub persistent_volume_claim_name: String,
    /// Go duration string as written by the controller, e.g. `1m30s`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<Time>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_timestamp: Option<Time>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_timestamp: Option<Time>,
    #[serde(default)]
    pub failure_reason: String,
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
    #[serde(default)]
    pub volume_snapshots: Vec<VolumeSnapshotStatus>,
    #[serde(default)]
    pub actions: Vec<ActionStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Time>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Time>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSnapshotStatus {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content_name: String,
    #[serde(default)]
    pub volume_name: String,
    #[serde(default)]
    pub size: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionStatus {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub action_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_replicas: Option<i32>,
}

impl Backup {
    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> &str {
        self.metadata.namespace.as_deref().unwrap_or_default()
    }

    /// Cluster the backup was taken from.
    pub fn source_cluster(&self) -> &str {
        self.metadata
            .labels
            .as_ref()
            .and_then(|l| l.get(LABEL_APP_INSTANCE))
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn is_completed(&self) -> bool {
        self.status.phase == BACKUP_PHASE_COMPLETED
    }

    /// Phase with the StatefulSet action's available pods appended, if any.
    pub fn status_display(&self) -> String {
        let available = self
            .status
            .actions
            .iter()
            .find(|a| a.action_type == ACTION_TYPE_STATEFULSET)
            .and_then(|a| a.available_replicas);
        match available {
            Some(n) => format!("{}(AvailablePods: {})", self.status.phase, n),
            None => self.status.phase.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupPolicy {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: BackupPolicySpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<serde_json::Value>,
    /// `apiVersion`, `kind` and anything else at the top level.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Fields the CLI reads or edits. Unknown fields are kept in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupPolicySpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_repo_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_limit: Option<i32>,
    #[serde(default)]
    pub backup_methods: Vec<BackupMethod>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupMethod {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub action_set_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_volumes: Option<bool>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl BackupPolicy {
    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> &str {
        self.metadata.namespace.as_deref().unwrap_or_default()
    }

    pub fn cluster(&self) -> &str {
        self.metadata
            .labels
            .as_ref()
            .and_then(|l| l.get(LABEL_APP_INSTANCE))
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn is_default(&self) -> bool {
        self.metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get(ANNOTATION_DEFAULT_BACKUP_POLICY))
            .map(|v| v == "true")
            .unwrap_or(false)
    }

    pub fn phase(&self) -> &str {
        self.status
            .as_ref()
            .and_then(|s| s.get("phase"))
            .and_then(|p| p.as_str())
            .unwrap_or_default()
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.spec.backup_methods.iter().any(|m| m.name == name)
    }

    /// The method used when `--method` is omitted: the only method, or else
    /// the only one that snapshots volumes.
    pub fn default_method(&self) -> Option<&str> {
        let methods = &self.spec.backup_methods;
        if methods.len() == 1 {
            return Some(&methods[0].name);
        }
        let mut snapshots = methods
            .iter()
            .filter(|m| m.snapshot_volumes.unwrap_or(false));
        match (snapshots.next(), snapshots.next()) {
            (Some(m), None) => Some(&m.name),
            _ => None,
        }
    }
}
