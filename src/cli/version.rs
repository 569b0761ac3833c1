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

//! `kbcli version`

use super::action::{CommandContext, Lifecycle};
use crate::infrastructure::constants::{
    KUBEBLOCKS_APP_COMPONENT, KUBEBLOCKS_CHART_NAME, LABEL_APP_COMPONENT, LABEL_APP_NAME,
    LABEL_APP_VERSION,
};
use crate::infrastructure::kubernetes::client::KbClient;
use crate::shared::error::{KbError, Result};
use clap::Parser;
use std::io::Write;
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionInfo {
    pub kubernetes: String,
    pub kubeblocks: String,
    pub cli: String,
}

impl VersionInfo {
    pub fn write(&self, out: &mut dyn Write) -> Result<()> {
        if !self.kubernetes.is_empty() {
            writeln!(out, "Kubernetes: {}", self.kubernetes)?;
        }
        if !self.kubeblocks.is_empty() {
            writeln!(out, "KubeBlocks: {}", self.kubeblocks)?;
        }
        writeln!(out, "kbcli: {}", self.cli)?;
        Ok(())
    }
}

pub fn kubeblocks_selector() -> String {
    format!(
        "{}={},{}={}",
        LABEL_APP_NAME, KUBEBLOCKS_CHART_NAME, LABEL_APP_COMPONENT, KUBEBLOCKS_APP_COMPONENT
    )
}

/// Version label of the KubeBlocks deployment; empty when KubeBlocks is not
/// installed. Only one installation per Kubernetes cluster is supported.
pub async fn kubeblocks_version(client: &dyn KbClient) -> Result<String> {
    let deploys = client
        .list_deployments(None, &kubeblocks_selector())
        .await?;
    match deploys.as_slice() {
        [] => Ok(String::new()),
        [deploy] => deploy
            .metadata
            .labels
            .as_ref()
            .and_then(|l| l.get(LABEL_APP_VERSION))
            .cloned()
            .ok_or_else(|| KbError::precondition("KubeBlocks deployment has no version label")),
        _ => Err(KbError::precondition(
            "found multiple KubeBlocks deployments, please check your cluster",
        )),
    }
}

pub async fn version_info(client: &dyn KbClient) -> Result<VersionInfo> {
    Ok(VersionInfo {
        kubernetes: client.server_version().await?,
        kubeblocks: kubeblocks_version(client).await?,
        cli: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Parser, Debug, Clone, Default)]
pub struct VersionCommand {}

#[async_trait::async_trait]
impl Lifecycle for VersionCommand {
    async fn complete(&mut self, _ctx: &CommandContext) -> Result<()> {
        Ok(())
    }

    async fn validate(&self, _ctx: &CommandContext) -> Result<()> {
        Ok(())
    }

    async fn run(&mut self, ctx: &mut CommandContext) -> Result<()> {
        let info = match ctx.factory.client().await {
            Ok(client) => version_info(client.as_ref()).await?,
            Err(e) => {
                warn!(error = %e, "no Kubernetes cluster reachable");
                VersionInfo {
                    cli: env!("CARGO_PKG_VERSION").to_string(),
                    ..Default::default()
                }
            }
        };
        info.write(ctx.out())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_skips_unknown_versions() {
        let info = VersionInfo {
            kubernetes: "v1.30.0".to_string(),
            kubeblocks: String::new(),
            cli: "0.7.0".to_string(),
        };
        let mut out = Vec::new();
        info.write(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Kubernetes: v1.30.0\nkbcli: 0.7.0\n"
        );
    }

    #[test]
    fn test_selector() {
        assert_eq!(
            kubeblocks_selector(),
            "app.kubernetes.io/name=kubeblocks,app.kubernetes.io/component=apps"
        );
    }
}
