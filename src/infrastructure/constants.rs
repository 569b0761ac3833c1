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

/// API groups and versions
pub const APPS_API_GROUP: &str = "apps.kubeblocks.io";
pub const APPS_API_VERSION: &str = "v1alpha1";
pub const DP_API_GROUP: &str = "dataprotection.kubeblocks.io";
pub const DP_API_VERSION: &str = "v1alpha1";
pub const MIGRATION_API_GROUP: &str = "datamigration.apecloud.io";
pub const MIGRATION_API_VERSION: &str = "v1alpha1";
pub const APIEXT_API_GROUP: &str = "apiextensions.k8s.io";

/// Resource labels
pub const LABEL_APP_INSTANCE: &str = "app.kubernetes.io/instance";
pub const LABEL_APP_NAME: &str = "app.kubernetes.io/name";
pub const LABEL_APP_COMPONENT: &str = "app.kubernetes.io/component";
pub const LABEL_APP_VERSION: &str = "app.kubernetes.io/version";
pub const LABEL_APP_MANAGED_BY: &str = "app.kubernetes.io/managed-by";
pub const LABEL_COMPONENT_NAME: &str = "apps.kubeblocks.io/component-name";
pub const LABEL_COMPONENT_DEF_REF: &str = "apps.kubeblocks.io/component-def-ref";
pub const LABEL_CLUSTER_DEF: &str = "clusterdefinition.kubeblocks.io/name";
pub const LABEL_CLUSTER_VERSION: &str = "clusterversion.kubeblocks.io/name";
pub const LABEL_ROLE: &str = "kubeblocks.io/role";
pub const LABEL_BACKUP_NAME: &str = "dataprotection.kubeblocks.io/backup-name";
pub const LABEL_CONTROLLER_UID: &str = "controller-uid";

pub const MANAGED_BY_KUBEBLOCKS: &str = "kubeblocks";

/// Annotations
pub const ANNOTATION_DEFAULT_BACKUP_POLICY: &str = "dataprotection.kubeblocks.io/is-default-policy";

/// KubeBlocks deployment discovery
pub const KUBEBLOCKS_CHART_NAME: &str = "kubeblocks";
pub const KUBEBLOCKS_APP_COMPONENT: &str = "apps";

/// CRD names
pub const MIGRATION_TASK_CRD: &str = "migrationtasks.datamigration.apecloud.io";

/// Lorry sidecar
pub const LORRY_HTTP_PORT: i32 = 3501;
pub const LORRY_BINDINGS_PATH: &str = "v1.0/bindings";

/// Leader-like roles, preferred when picking the pod to talk to
pub const LEADER_ROLES: &[&str] = &["leader", "primary", "master"];

/// Service account created for every new cluster
pub const CLUSTER_SERVICE_ACCOUNT_PREFIX: &str = "kb-";

/// Editor resolution order
pub const EDITOR_ENV_VARS: &[&str] = &["KUBE_EDITOR", "EDITOR"];
pub const DEFAULT_EDITOR: &str = "vi";

/// Config file
pub const CONFIG_ENV_VAR: &str = "KBCLI_CONFIG";
pub const CONFIG_DIR: &str = ".kbcli";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DEFAULT_NAMESPACE: &str = "default";

/// Backup logs shown next to a failure reason
pub const FAILED_JOB_LOG_TAIL_LINES: i64 = 5;
