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

//! Component classes published by ComponentClassDefinition objects

use crate::domain::quantity::{normalize_memory, parse_quantity};
use crate::infrastructure::constants::LABEL_COMPONENT_DEF_REF;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentClass {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cpu: String,
    #[serde(default)]
    pub memory: String,
}

impl ComponentClass {
    fn cpu_value(&self) -> f64 {
        parse_quantity(&self.cpu).unwrap_or(0.0)
    }

    fn memory_value(&self) -> f64 {
        parse_quantity(&self.memory).unwrap_or(0.0)
    }

    pub fn memory_display(&self) -> String {
        normalize_memory(&self.memory)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComponentClassDefinition {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: ClassDefinitionSpec,
    #[serde(default)]
    pub status: ClassDefinitionStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassDefinitionSpec {
    #[serde(default)]
    pub groups: Vec<ClassGroup>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassGroup {
    #[serde(default)]
    pub series: Vec<ClassSeries>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassSeries {
    #[serde(default)]
    pub classes: Vec<ComponentClass>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassDefinitionStatus {
    #[serde(default)]
    pub classes: Vec<ComponentClass>,
}

impl ComponentClassDefinition {
    /// Component definition the classes apply to.
    pub fn component(&self) -> &str {
        self.metadata
            .labels
            .as_ref()
            .and_then(|l| l.get(LABEL_COMPONENT_DEF_REF))
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Resolved classes from the status, else the ones listed in the spec.
    pub fn classes(&self) -> Vec<ComponentClass> {
        if !self.status.classes.is_empty() {
            return self.status.classes.clone();
        }
        self.spec
            .groups
            .iter()
            .flat_map(|g| g.series.iter())
            .flat_map(|s| s.classes.iter().cloned())
            .collect()
    }
}

/// Order by CPU, then by memory.
pub fn compare_by_resource(a: &ComponentClass, b: &ComponentClass) -> Ordering {
    a.cpu_value()
        .partial_cmp(&b.cpu_value())
        .unwrap_or(Ordering::Equal)
        .then_with(|| {
            a.memory_value()
                .partial_cmp(&b.memory_value())
                .unwrap_or(Ordering::Equal)
        })
}

/// Classes grouped by component definition, each group sorted.
#[derive(Debug, Default)]
pub struct ClassCatalog {
    by_component: BTreeMap<String, Vec<ComponentClass>>,
}

impl ClassCatalog {
    pub fn add(&mut self, component: &str, classes: impl IntoIterator<Item = ComponentClass>) {
        self.by_component
            .entry(component.to_string())
            .or_default()
            .extend(classes);
    }

    pub fn is_empty(&self) -> bool {
        self.by_component.is_empty()
    }

    pub fn into_sorted(self) -> Vec<(String, Vec<ComponentClass>)> {
        self.by_component
            .into_iter()
            .map(|(component, mut classes)| {
                classes.sort_by(compare_by_resource);
                (component, classes)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str, cpu: &str, memory: &str) -> ComponentClass {
        ComponentClass {
            name: name.to_string(),
            cpu: cpu.to_string(),
            memory: memory.to_string(),
        }
    }

    #[test]
    fn test_classes_from_spec_groups() {
        let def: ComponentClassDefinition = serde_json::from_value(serde_json::json!({
            "metadata": {
                "name": "custom",
                "labels": {"apps.kubeblocks.io/component-def-ref": "mysql"}
            },
            "spec": {"groups": [{"series": [{"classes": [
                {"name": "small", "cpu": "1", "memory": "1Gi"}
            ]}]}]}
        }))
        .unwrap();
        assert_eq!(def.component(), "mysql");
        assert_eq!(def.classes()[0].name, "small");
    }

    #[test]
    fn test_sort_by_cpu_then_memory() {
        let mut catalog = ClassCatalog::default();
        catalog.add(
            "mysql",
            vec![
                class("general-2c4g", "2", "4Gi"),
                class("general-1c4g", "1", "4Gi"),
                class("general-1c1g", "1", "1Gi"),
                class("general-500m", "500m", "512Mi"),
            ],
        );
        let sorted = catalog.into_sorted();
        let names: Vec<&str> = sorted[0].1.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["general-500m", "general-1c1g", "general-1c4g", "general-2c4g"]
        );
    }
}
