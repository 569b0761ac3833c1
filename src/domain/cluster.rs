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

//! Cluster, ClusterDefinition and the values used to render a new Cluster

use crate::infrastructure::constants::{
    APPS_API_GROUP, APPS_API_VERSION, LABEL_CLUSTER_DEF, LABEL_CLUSTER_VERSION,
};
use crate::shared::error::{KbError, Result};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::LazyLock;

pub const TERMINATION_POLICIES: [&str; 4] = ["DoNotTerminate", "Halt", "Delete", "WipeOut"];

static DNS1035_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]([-a-z0-9]*[a-z0-9])?$").unwrap());

const DNS1035_MAX_LENGTH: usize = 63;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cluster {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: ClusterSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    #[serde(default)]
    pub cluster_definition_ref: String,
    #[serde(default)]
    pub cluster_version_ref: String,
    #[serde(default)]
    pub termination_policy: String,
    #[serde(default)]
    pub component_specs: Vec<ComponentSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub component_def_ref: String,
}

impl Cluster {
    /// Component spec by name, or the first one when no name is given.
    pub fn component(&self, name: Option<&str>) -> Option<&ComponentSpec> {
        match name.filter(|n| !n.is_empty()) {
            Some(n) => self.spec.component_specs.iter().find(|c| c.name == n),
            None => self.spec.component_specs.first(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterDefinition {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: ClusterDefinitionSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDefinitionSpec {
    #[serde(default)]
    pub component_defs: Vec<ComponentDef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub character_type: String,
}

impl ClusterDefinition {
    pub fn component_def(&self, name: &str) -> Option<&ComponentDef> {
        self.spec.component_defs.iter().find(|d| d.name == name)
    }
}

/// Resources applied to every component of a new cluster (`--set`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterValues {
    pub cpu: String,
    pub memory: String,
    pub storage: String,
    pub replicas: i32,
}

impl Default for ClusterValues {
    fn default() -> Self {
        Self {
            cpu: "1".to_string(),
            memory: "1Gi".to_string(),
            storage: "20Gi".to_string(),
            replicas: 1,
        }
    }
}

impl ClusterValues {
    /// Parse `key=value` entries, each possibly holding several comma
    /// separated pairs.
    pub fn parse(entries: &[String]) -> Result<Self> {
        let mut values = Self::default();
        for pair in entries.iter().flat_map(|e| e.split(',')) {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                KbError::validation(format!("invalid value \"{}\", should be key=value", pair))
            })?;
            let value = value.trim();
            match key.trim() {
                "cpu" => values.cpu = value.to_string(),
                "memory" => values.memory = value.to_string(),
                "storage" => values.storage = value.to_string(),
                "replicas" => {
                    values.replicas = value.parse().map_err(|_| {
                        KbError::validation(format!("replicas should be an integer, got \"{}\"", value))
                    })?
                }
                other => {
                    return Err(KbError::validation(format!(
                        "unknown set key \"{}\", supported keys: cpu, memory, storage, replicas",
                        other
                    )))
                }
            }
        }
        if values.replicas < 0 {
            return Err(KbError::validation("replicas can not be negative"));
        }
        Ok(values)
    }
}

/// Check a name against RFC 1035 label rules, as clusters become DNS names.
pub fn validate_cluster_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(KbError::validation("missing cluster name"));
    }
    if name.len() > DNS1035_MAX_LENGTH || !DNS1035_REGEX.is_match(name) {
        return Err(KbError::validation(format!(
            "invalid cluster name \"{}\": must consist of lower case alphanumeric characters or '-', \
             start with an alphabetic character, end with an alphanumeric character, \
             and be at most {} characters",
            name, DNS1035_MAX_LENGTH
        )));
    }
    Ok(())
}

pub fn validate_termination_policy(policy: &str) -> Result<()> {
    if TERMINATION_POLICIES.contains(&policy) {
        return Ok(());
    }
    Err(KbError::validation(format!(
        "invalid termination policy \"{}\", supported values: [{}]",
        policy,
        TERMINATION_POLICIES.join(", ")
    )))
}

/// A random DNS-1035 compliant cluster name.
pub fn random_cluster_name() -> String {
    const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
    const ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    let first = LETTERS[rng.gen_range(0..LETTERS.len())] as char;
    let rest: String = (0..5)
        .map(|_| ALPHANUMERIC[rng.gen_range(0..ALPHANUMERIC.len())] as char)
        .collect();
    format!("cluster-{}{}", first, rest)
}

/// Parameters for rendering a Cluster object.
#[derive(Debug, Clone)]
pub struct ClusterTemplate<'a> {
    pub name: &'a str,
    pub namespace: &'a str,
    pub cluster_definition: &'a str,
    pub cluster_version: Option<&'a str>,
    pub termination_policy: &'a str,
    pub components: &'a [ComponentDef],
    pub values: &'a ClusterValues,
    pub service_account: &'a str,
}

impl ClusterTemplate<'_> {
    pub fn render(&self) -> serde_json::Value {
        let v = self.values;
        let components: Vec<serde_json::Value> = self
            .components
            .iter()
            .map(|def| {
                json!({
                    "name": def.name,
                    "componentDefRef": def.name,
                    "replicas": v.replicas,
                    "serviceAccountName": self.service_account,
                    "resources": {
                        "requests": {"cpu": v.cpu, "memory": v.memory},
                        "limits": {"cpu": v.cpu, "memory": v.memory}
                    },
                    "volumeClaimTemplates": [{
                        "name": "data",
                        "spec": {
                            "accessModes": ["ReadWriteOnce"],
                            "resources": {"requests": {"storage": v.storage}}
                        }
                    }]
                })
            })
            .collect();

        let mut spec = json!({
            "clusterDefinitionRef": self.cluster_definition,
            "terminationPolicy": self.termination_policy,
            "componentSpecs": components,
        });
        if let Some(version) = self.cluster_version.filter(|v| !v.is_empty()) {
            spec["clusterVersionRef"] = json!(version);
        }

        json!({
            "apiVersion": format!("{}/{}", APPS_API_GROUP, APPS_API_VERSION),
            "kind": "Cluster",
            "metadata": {
                "name": self.name,
                "namespace": self.namespace,
            },
            "spec": spec,
        })
    }
}

/// Labels stamped on a cluster before it is submitted.
pub fn definition_labels(
    cluster_definition: &str,
    cluster_version: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut labels = vec![(LABEL_CLUSTER_DEF, cluster_definition.to_string())];
    if let Some(version) = cluster_version.filter(|v| !v.is_empty()) {
        labels.push((LABEL_CLUSTER_VERSION, version.to_string()));
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_cluster_name() {
        assert!(validate_cluster_name("mycluster").is_ok());
        assert!(validate_cluster_name("my-cluster-1").is_ok());
        assert!(validate_cluster_name("").is_err());
        assert!(validate_cluster_name("1cluster").is_err());
        assert!(validate_cluster_name("My-Cluster").is_err());
        assert!(validate_cluster_name("cluster-").is_err());
        assert!(validate_cluster_name(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_random_cluster_name_is_valid() {
        for _ in 0..20 {
            let name = random_cluster_name();
            assert!(validate_cluster_name(&name).is_ok(), "{}", name);
        }
    }

    #[test]
    fn test_values_parse() {
        let values = ClusterValues::parse(&[
            "cpu=2,memory=4Gi".to_string(),
            "replicas=3".to_string(),
        ])
        .unwrap();
        assert_eq!(values.cpu, "2");
        assert_eq!(values.memory, "4Gi");
        assert_eq!(values.storage, "20Gi");
        assert_eq!(values.replicas, 3);
    }

    #[test]
    fn test_values_parse_errors() {
        assert!(ClusterValues::parse(&["gpu=1".to_string()]).is_err());
        assert!(ClusterValues::parse(&["replicas=x".to_string()]).is_err());
        assert!(ClusterValues::parse(&["cpu".to_string()]).is_err());
    }

    #[test]
    fn test_termination_policy() {
        assert!(validate_termination_policy("WipeOut").is_ok());
        assert!(validate_termination_policy("Destroy").is_err());
    }

    #[test]
    fn test_render_cluster() {
        let values = ClusterValues::default();
        let components = vec![ComponentDef {
            name: "mysql".to_string(),
            character_type: "mysql".to_string(),
        }];
        let body = ClusterTemplate {
            name: "mycluster",
            namespace: "default",
            cluster_definition: "apecloud-mysql",
            cluster_version: Some("ac-mysql-8.0.30"),
            termination_policy: "Delete",
            components: &components,
            values: &values,
            service_account: "kb-mycluster",
        }
        .render();
        assert_eq!(body["kind"], "Cluster");
        assert_eq!(body["spec"]["clusterVersionRef"], "ac-mysql-8.0.30");
        assert_eq!(body["spec"]["componentSpecs"][0]["componentDefRef"], "mysql");
        assert_eq!(
            body["spec"]["componentSpecs"][0]["volumeClaimTemplates"][0]["spec"]["resources"]["requests"]["storage"],
            "20Gi"
        );
    }
}
