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

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationTask {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: MigrationTaskSpec,
    #[serde(default)]
    pub status: MigrationTaskStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationTaskSpec {
    #[serde(default)]
    pub source_endpoint: Endpoint,
    #[serde(default)]
    pub sink_endpoint: Endpoint,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    #[serde(default)]
    pub endpoint_type: String,
    #[serde(default)]
    pub address: String,
}

impl Endpoint {
    /// `type(address)`, or whichever part is set.
    pub fn display(&self) -> String {
        match (self.endpoint_type.is_empty(), self.address.is_empty()) {
            (false, false) => format!("{}({})", self.endpoint_type, self.address),
            (false, true) => self.endpoint_type.clone(),
            _ => self.address.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationTaskStatus {
    #[serde(default)]
    pub task_status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_display() {
        let e = Endpoint {
            endpoint_type: "MySQL".to_string(),
            address: "10.0.0.1:3306".to_string(),
        };
        assert_eq!(e.display(), "MySQL(10.0.0.1:3306)");
        assert_eq!(Endpoint::default().display(), "");
    }
}
