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

//! Optional user configuration file

use crate::infrastructure::constants::{CONFIG_DIR, CONFIG_ENV_VAR, CONFIG_FILE_NAME};
use crate::shared::error::{KbError, Result};
use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Defaults applied when the matching command line flag is absent.
///
/// ```toml
/// namespace = "demo"
/// context = "kind-kubeblocks"
/// no_color = false
/// editor = "nano"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KbcliConfig {
    pub namespace: Option<String>,
    pub context: Option<String>,
    pub kubeconfig: Option<String>,
    pub no_color: bool,
    pub editor: Option<String>,
}

impl KbcliConfig {
    /// Load configuration from a TOML file
    pub fn from<T: AsRef<Path>>(path: T) -> Result<Self> {
        let path = path.as_ref();
        let content = read_to_string(path).map_err(|e| {
            KbError::config_error(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// `$KBCLI_CONFIG`, else `$HOME/.kbcli/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.is_empty() {
                return Some(PathBuf::from(path));
            }
        }
        std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(CONFIG_DIR).join(CONFIG_FILE_NAME))
    }

    /// Load the default file; a missing file yields the empty configuration.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => {
                debug!(path = %path.display(), "loading config");
                Self::from(path)
            }
            _ => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "namespace = \"demo\"\neditor = \"nano\"\nno_color = true").unwrap();
        let conf = KbcliConfig::from(file.path()).unwrap();
        assert_eq!(conf.namespace.as_deref(), Some("demo"));
        assert!(conf.no_color);
        assert_eq!(conf.editor.as_deref(), Some("nano"));
        assert_eq!(conf.context, None);
    }

    #[test]
    fn test_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "namespace = ").unwrap();
        assert!(matches!(
            KbcliConfig::from(file.path()),
            Err(KbError::TomlParse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = KbcliConfig::from("/nonexistent/kbcli.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
