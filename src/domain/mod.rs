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

//! Typed views over the KubeBlocks custom resources

pub mod backup;
pub mod class;
pub mod cluster;
pub mod config;
pub mod migration;
pub mod opsrequest;
pub mod quantity;
pub mod retention;

use crate::shared::error::{KbError, Result};
use kube::api::DynamicObject;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Convert an object returned by the dynamic client into its typed form.
pub fn from_dynamic<T: DeserializeOwned>(obj: &DynamicObject) -> Result<T> {
    let value = serde_json::to_value(obj)?;
    serde_json::from_value(value).map_err(|e| {
        KbError::InvalidResource(format!(
            "failed to convert {}: {}",
            obj.metadata.name.as_deref().unwrap_or("<unnamed>"),
            e
        ))
    })
}

/// Convert a typed object back into the dynamic form accepted by the client.
pub fn to_dynamic<T: Serialize>(obj: &T) -> Result<DynamicObject> {
    let value = serde_json::to_value(obj)?;
    Ok(serde_json::from_value(value)?)
}

/// Read a string at a dotted path inside the object's body.
pub fn string_at<'a>(obj: &'a DynamicObject, path: &[&str]) -> Option<&'a str> {
    let mut cur = &obj.data;
    for key in path {
        cur = cur.get(key)?;
    }
    cur.as_str()
}

pub fn label<'a>(obj: &'a DynamicObject, key: &str) -> Option<&'a str> {
    obj.metadata
        .labels
        .as_ref()
        .and_then(|l| l.get(key))
        .map(String::as_str)
}

pub fn annotation<'a>(obj: &'a DynamicObject, key: &str) -> Option<&'a str> {
    obj.metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(key))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::object;
    use serde_json::json;

    #[test]
    fn test_string_at_nested() {
        let obj = object(json!({
            "apiVersion": "v1",
            "kind": "Thing",
            "metadata": {"name": "a", "labels": {"x": "y"}},
            "status": {"phase": "Running"}
        }));
        assert_eq!(string_at(&obj, &["status", "phase"]), Some("Running"));
        assert_eq!(string_at(&obj, &["status", "missing"]), None);
        assert_eq!(label(&obj, "x"), Some("y"));
        assert_eq!(annotation(&obj, "x"), None);
    }
}
