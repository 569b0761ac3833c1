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

use thiserror::Error;
pub type Result<T> = std::result::Result<T, KbError>;

#[derive(Error, Debug)]
pub enum KbError {
    #[error("Kubernetes API error: {0}")]
    Api(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{resource_type} \"{name}\" not found in namespace \"{namespace}\"")]
    NotFound {
        resource_type: String,
        name: String,
        namespace: String,
    },

    #[error("{resource_type} \"{name}\" already exists in namespace \"{namespace}\"")]
    AlreadyExists {
        resource_type: String,
        name: String,
        namespace: String,
    },

    /// Missing or inconsistent command line input.
    #[error("{0}")]
    Validation(String),

    /// Remote object exists but is not in a state the operation accepts.
    #[error("{0}")]
    Precondition(String),

    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    #[error("Editor error: {0}")]
    Editor(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl From<kube::Error> for KbError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(ae) => KbError::Api(ae.message),
            other => KbError::Api(other.to_string()),
        }
    }
}

impl KbError {
    pub fn config_error(context: impl Into<String>) -> Self {
        Self::ConfigError(context.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    pub fn not_found(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    pub fn already_exists(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self::AlreadyExists {
            resource_type: resource_type.into(),
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Map a `kube::Error` into a typed error, keeping the resource context.
    pub fn from_kube(err: kube::Error, resource_type: &str, name: &str, namespace: &str) -> Self {
        match err {
            kube::Error::Api(ae) if ae.code == 404 => Self::not_found(resource_type, name, namespace),
            kube::Error::Api(ae) if ae.code == 409 => {
                Self::already_exists(resource_type, name, namespace)
            }
            other => other.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
