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

use crate::shared::error::{KbError, Result};
use kube::api::DynamicObject;
use serde::Serialize;
use std::io::Write;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn is_structured(&self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Yaml)
    }

    /// Serialize `value` in this format; tables have no serialized form.
    pub fn write<T: Serialize + ?Sized>(&self, out: &mut dyn Write, value: &T) -> Result<()> {
        match self {
            OutputFormat::Json => {
                let text = serde_json::to_string_pretty(value)?;
                writeln!(out, "{}", text)?;
            }
            OutputFormat::Yaml => {
                let text = serde_yaml::to_string(value)?;
                write!(out, "{}", text)?;
            }
            OutputFormat::Table => {
                return Err(KbError::validation("table output has no serialized form"))
            }
        }
        Ok(())
    }
}

impl FromStr for OutputFormat {
    type Err = KbError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            other => Err(KbError::validation(format!(
                "unknown output format \"{}\", supported: table, json, yaml",
                other
            ))),
        }
    }
}

/// Wrap objects in a `v1/List` the way `kubectl get -o` does.
pub fn as_list(items: &[DynamicObject]) -> serde_json::Value {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "List",
        "items": items,
        "metadata": {"resourceVersion": ""},
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::object;
    use serde_json::json;

    #[test]
    fn test_parse() {
        assert_eq!("YAML".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert!("wide".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_write_json_list() {
        let items = vec![object(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {"name": "a"}
        }))];
        let mut buf = Vec::new();
        OutputFormat::Json.write(&mut buf, &as_list(&items)).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed["kind"], "List");
        assert_eq!(parsed["items"][0]["metadata"]["name"], "a");
    }
}
