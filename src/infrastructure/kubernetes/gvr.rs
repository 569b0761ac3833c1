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

//! Resource descriptors for every object type the CLI manipulates

use crate::infrastructure::constants::*;
use kube::api::ApiResource;
use std::fmt;

/// Group/version/resource triple plus the kind used in object bodies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Gvr {
    pub group: &'static str,
    pub version: &'static str,
    pub resource: &'static str,
    pub kind: &'static str,
    pub namespaced: bool,
}

impl Gvr {
    const fn new(
        group: &'static str,
        version: &'static str,
        resource: &'static str,
        kind: &'static str,
        namespaced: bool,
    ) -> Self {
        Self {
            group,
            version,
            resource,
            kind,
            namespaced,
        }
    }

    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.to_string()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    pub fn api_resource(&self) -> ApiResource {
        ApiResource {
            group: self.group.to_string(),
            version: self.version.to_string(),
            api_version: self.api_version(),
            kind: self.kind.to_string(),
            plural: self.resource.to_string(),
        }
    }

    pub fn cluster() -> Self {
        Self::new(APPS_API_GROUP, APPS_API_VERSION, "clusters", "Cluster", true)
    }

    pub fn cluster_definition() -> Self {
        Self::new(
            APPS_API_GROUP,
            APPS_API_VERSION,
            "clusterdefinitions",
            "ClusterDefinition",
            false,
        )
    }

    pub fn component_class_definition() -> Self {
        Self::new(
            APPS_API_GROUP,
            APPS_API_VERSION,
            "componentclassdefinitions",
            "ComponentClassDefinition",
            false,
        )
    }

    pub fn ops_request() -> Self {
        Self::new(APPS_API_GROUP, APPS_API_VERSION, "opsrequests", "OpsRequest", true)
    }

    pub fn backup() -> Self {
        Self::new(DP_API_GROUP, DP_API_VERSION, "backups", "Backup", true)
    }

    pub fn backup_policy() -> Self {
        Self::new(DP_API_GROUP, DP_API_VERSION, "backuppolicies", "BackupPolicy", true)
    }

    pub fn backup_repo() -> Self {
        Self::new(DP_API_GROUP, DP_API_VERSION, "backuprepos", "BackupRepo", false)
    }

    pub fn migration_task() -> Self {
        Self::new(
            MIGRATION_API_GROUP,
            MIGRATION_API_VERSION,
            "migrationtasks",
            "MigrationTask",
            true,
        )
    }

    pub fn crd() -> Self {
        Self::new(
            APIEXT_API_GROUP,
            "v1",
            "customresourcedefinitions",
            "CustomResourceDefinition",
            false,
        )
    }

    pub fn service_account() -> Self {
        Self::new("", "v1", "serviceaccounts", "ServiceAccount", true)
    }
}

impl fmt::Display for Gvr {
    /// `resource.group` as kubectl prints it, e.g. `backups.dataprotection.kubeblocks.io`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}", self.resource)
        } else {
            write!(f, "{}.{}", self.resource, self.group)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_version() {
        assert_eq!(Gvr::backup().api_version(), "dataprotection.kubeblocks.io/v1alpha1");
        assert_eq!(Gvr::service_account().api_version(), "v1");
    }

    #[test]
    fn test_display() {
        assert_eq!(Gvr::ops_request().to_string(), "opsrequests.apps.kubeblocks.io");
        assert_eq!(Gvr::service_account().to_string(), "serviceaccounts");
    }

    #[test]
    fn test_api_resource() {
        let ar = Gvr::backup_policy().api_resource();
        assert_eq!(ar.kind, "BackupPolicy");
        assert_eq!(ar.plural, "backuppolicies");
        assert_eq!(ar.api_version, "dataprotection.kubeblocks.io/v1alpha1");
    }
}
