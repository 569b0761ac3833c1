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

//! Account operations through the lorry sidecar's binding API.
//!
//! Requests are POSTed to `/v1.0/bindings/<characterType>` on the lorry port
//! of the target pod, reached through the API server pod proxy.

use crate::infrastructure::constants::{LORRY_BINDINGS_PATH, LORRY_HTTP_PORT};
use crate::infrastructure::kubernetes::client::KbClient;
use crate::shared::error::{KbError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

pub const EVENT_SUCCESS: &str = "Success";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountOp {
    CreateUser,
    DeleteUser,
    DescribeUser,
    ListUsers,
    GrantUserRole,
    RevokeUserRole,
}

impl AccountOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountOp::CreateUser => "createUser",
            AccountOp::DeleteUser => "deleteUser",
            AccountOp::DescribeUser => "describeUser",
            AccountOp::ListUsers => "listUsers",
            AccountOp::GrantUserRole => "grantUserRole",
            AccountOp::RevokeUserRole => "revokeUserRole",
        }
    }
}

impl fmt::Display for AccountOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleName {
    Superuser,
    ReadWrite,
    ReadOnly,
}

impl RoleName {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::Superuser => "superuser",
            RoleName::ReadWrite => "readwrite",
            RoleName::ReadOnly => "readonly",
        }
    }
}

impl FromStr for RoleName {
    type Err = KbError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "SUPERUSER" => Ok(RoleName::Superuser),
            "READWRITE" => Ok(RoleName::ReadWrite),
            "READONLY" => Ok(RoleName::ReadOnly),
            _ => Err(KbError::validation(
                "invalid role name, should be one of [SUPERUSER, READWRITE, READONLY] ",
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LorryRequest {
    pub operation: String,
    pub metadata: Map<String, Value>,
    pub data: Map<String, Value>,
}

impl LorryRequest {
    pub fn new(op: AccountOp) -> Self {
        Self {
            operation: op.as_str().to_string(),
            metadata: Map::new(),
            data: Map::new(),
        }
    }

    pub fn with_data(mut self, key: &str, value: impl Into<String>) -> Self {
        self.data.insert(key.to_string(), Value::String(value.into()));
        self
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LorryResponse {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub message: Value,
}

impl LorryResponse {
    pub fn is_success(&self) -> bool {
        self.event == EVENT_SUCCESS
    }

    pub fn message_text(&self) -> String {
        match &self.message {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// The user records in the message. The sidecar sends them either as
    /// JSON or as a JSON-encoded string, holding one user or a list.
    pub fn users(&self) -> Result<Vec<UserInfo>> {
        let value = match &self.message {
            Value::String(s) if s.trim().is_empty() => return Ok(Vec::new()),
            Value::String(s) => serde_json::from_str(s)?,
            Value::Null => return Ok(Vec::new()),
            other => other.clone(),
        };
        match value {
            Value::Array(_) => Ok(serde_json::from_value(value)?),
            Value::Object(_) => Ok(vec![serde_json::from_value(value)?]),
            other => Err(KbError::InvalidResource(format!(
                "unexpected account payload: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub expired: Value,
    #[serde(default)]
    pub role_name: String,
}

impl UserInfo {
    pub fn expired_display(&self) -> String {
        match &self.expired {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Talks to the lorry sidecar of one pod.
pub struct LorryClient<'a> {
    client: &'a dyn KbClient,
    namespace: String,
    pod: String,
    character_type: String,
}

impl<'a> LorryClient<'a> {
    pub fn new(client: &'a dyn KbClient, namespace: &str, pod: &str, character_type: &str) -> Self {
        Self {
            client,
            namespace: namespace.to_string(),
            pod: pod.to_string(),
            character_type: character_type.to_string(),
        }
    }

    pub fn path(&self) -> String {
        format!("{}/{}", LORRY_BINDINGS_PATH, self.character_type)
    }

    pub async fn call(&self, request: &LorryRequest) -> Result<LorryResponse> {
        if self.character_type.is_empty() {
            return Err(KbError::precondition(
                "the component has no character type, account operations are not supported",
            ));
        }
        info!(
            operation = %request.operation,
            pod = %self.pod,
            namespace = %self.namespace,
            "calling lorry"
        );
        let body = serde_json::to_value(request)?;
        let raw = self
            .client
            .pod_proxy_post(&self.namespace, &self.pod, LORRY_HTTP_PORT, &self.path(), &body)
            .await?;
        debug!(response = %raw, "lorry response");
        let response: LorryResponse = serde_json::from_value(raw)?;
        if !response.is_success() {
            return Err(KbError::Api(format!(
                "{} failed: {}",
                request.operation,
                response.message_text()
            )));
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_name_case_insensitive() {
        assert_eq!("ReadOnly".parse::<RoleName>().unwrap(), RoleName::ReadOnly);
        assert_eq!("superuser".parse::<RoleName>().unwrap(), RoleName::Superuser);
        let err = "bar".parse::<RoleName>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid role name, should be one of [SUPERUSER, READWRITE, READONLY] "
        );
    }

    #[test]
    fn test_request_body() {
        let req = LorryRequest::new(AccountOp::GrantUserRole)
            .with_data("userName", "alice")
            .with_data("roleName", RoleName::ReadOnly.as_str());
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "operation": "grantUserRole",
                "metadata": {},
                "data": {"userName": "alice", "roleName": "readonly"}
            })
        );
    }

    #[test]
    fn test_users_from_encoded_string() {
        let resp: LorryResponse = serde_json::from_value(json!({
            "event": "Success",
            "message": "[{\"userName\":\"alice\",\"expired\":\"F\"}]"
        }))
        .unwrap();
        let users = resp.users().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].user_name, "alice");
        assert_eq!(users[0].expired_display(), "F");
    }

    #[test]
    fn test_single_user_object() {
        let resp: LorryResponse = serde_json::from_value(json!({
            "event": "Success",
            "message": {"userName": "bob", "roleName": "readwrite"}
        }))
        .unwrap();
        let users = resp.users().unwrap();
        assert_eq!(users[0].role_name, "readwrite");
    }
}
