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

//! OpsRequest bodies for backup and restore

use crate::infrastructure::constants::{
    APPS_API_GROUP, APPS_API_VERSION, LABEL_APP_INSTANCE, LABEL_APP_MANAGED_BY,
    MANAGED_BY_KUBEBLOCKS,
};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const VOLUME_RESTORE_POLICIES: [&str; 2] = ["Serial", "Parallel"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpsType {
    Backup,
    Restore,
}

impl OpsType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpsType::Backup => "Backup",
            OpsType::Restore => "Restore",
        }
    }
}

/// `backup-<namespace>-<cluster>-<yyyymmddHHMMSS>`
pub fn generate_backup_name(namespace: &str, cluster: &str, now: DateTime<Local>) -> String {
    format!(
        "backup-{}-{}-{}",
        namespace,
        cluster,
        now.format("%Y%m%d%H%M%S")
    )
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupOpsSpec {
    pub backup_name: String,
    pub backup_policy_name: String,
    pub backup_method: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub deletion_policy: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub retention_period: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub parent_backup_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreOpsSpec {
    pub backup_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub restore_time_str: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub volume_restore_policy: String,
}

/// Render an OpsRequest named `name` against `cluster_ref`.
pub fn render(
    name: &str,
    namespace: &str,
    cluster_ref: &str,
    ops_type: OpsType,
    ops_spec: serde_json::Value,
) -> serde_json::Value {
    let mut spec = json!({
        "clusterRef": cluster_ref,
        "type": ops_type.as_str(),
    });
    let key = match ops_type {
        OpsType::Backup => "backupSpec",
        OpsType::Restore => "restoreSpec",
    };
    spec[key] = ops_spec;

    json!({
        "apiVersion": format!("{}/{}", APPS_API_GROUP, APPS_API_VERSION),
        "kind": "OpsRequest",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "labels": {
                LABEL_APP_INSTANCE: cluster_ref,
                LABEL_APP_MANAGED_BY: MANAGED_BY_KUBEBLOCKS,
            }
        },
        "spec": spec,
    })
}
