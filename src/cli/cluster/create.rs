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

use crate::cli::action::create::{run_create, CreateHooks, CreateOptions};
use crate::cli::action::{CommandContext, Lifecycle};
use crate::domain::cluster::{
    definition_labels, random_cluster_name, validate_cluster_name, validate_termination_policy,
    ClusterDefinition, ClusterTemplate, ClusterValues, ComponentDef,
};
use crate::domain::from_dynamic;
use crate::infrastructure::constants::{
    CLUSTER_SERVICE_ACCOUNT_PREFIX, LABEL_APP_INSTANCE, LABEL_APP_MANAGED_BY, MANAGED_BY_KUBEBLOCKS,
};
use crate::infrastructure::kubernetes::client::KbClient;
use crate::infrastructure::kubernetes::gvr::Gvr;
use crate::shared::error::{KbError, Result};
use clap::Parser;
use kube::api::DynamicObject;
use serde_json::json;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser, Debug, Clone, Default)]
pub struct ClusterCreateCommand {
    /// Cluster name, a random one is generated when omitted
    #[arg(default_value = "")]
    pub name: String,

    /// Specify cluster definition, run "kbcli clusterdefinition list" to show all available cluster definitions
    #[arg(long, default_value = "")]
    pub cluster_definition: String,

    /// Specify cluster version, run "kbcli clusterversion list" to show all available cluster versions
    #[arg(long)]
    pub cluster_version: Option<String>,

    /// Termination policy, one of: (DoNotTerminate, Halt, Delete, WipeOut)
    #[arg(long, default_value = "Delete")]
    pub termination_policy: String,

    /// Set the cluster resource including cpu, memory, replicas and storage, e.g. --set cpu=1,memory=1Gi,replicas=3,storage=20Gi
    #[arg(long = "set")]
    pub values: Vec<String>,

    #[command(flatten)]
    pub create: CreateOptions,

    #[arg(skip)]
    components: Vec<ComponentDef>,

    #[arg(skip)]
    parsed_values: ClusterValues,

    /// Set once the service account was created by this command.
    #[arg(skip)]
    created_service_account: Arc<AtomicBool>,
}

impl ClusterCreateCommand {
    fn service_account(&self) -> String {
        format!("{}{}", CLUSTER_SERVICE_ACCOUNT_PREFIX, self.name)
    }
}

#[async_trait::async_trait]
impl Lifecycle for ClusterCreateCommand {
    async fn complete(&mut self, ctx: &CommandContext) -> Result<()> {
        self.create.complete(ctx);
        if self.name.is_empty() {
            self.name = random_cluster_name();
        }
        if self.cluster_definition.is_empty() {
            return Err(KbError::validation(
                "a valid cluster definition is needed, use --cluster-definition to specify one",
            ));
        }
        self.parsed_values = ClusterValues::parse(&self.values)?;

        let client = ctx.factory.client().await?;
        let obj = client
            .get(&Gvr::cluster_definition(), "", &self.cluster_definition)
            .await?;
        let definition: ClusterDefinition = from_dynamic(&obj)?;
        self.components = definition.spec.component_defs;
        Ok(())
    }

    async fn validate(&self, _ctx: &CommandContext) -> Result<()> {
        validate_cluster_name(&self.name)?;
        validate_termination_policy(&self.termination_policy)?;
        if self.components.is_empty() {
            return Err(KbError::precondition(format!(
                "cluster definition \"{}\" has no component definitions",
                self.cluster_definition
            )));
        }
        Ok(())
    }

    async fn run(&mut self, ctx: &mut CommandContext) -> Result<()> {
        let opts = self.create.clone();
        run_create(&*self, &opts, ctx).await
    }
}

#[async_trait::async_trait]
impl CreateHooks for ClusterCreateCommand {
    fn gvr(&self) -> Gvr {
        Gvr::cluster()
    }

    fn render(&self, namespace: &str) -> Result<serde_json::Value> {
        let service_account = self.service_account();
        Ok(ClusterTemplate {
            name: &self.name,
            namespace,
            cluster_definition: &self.cluster_definition,
            cluster_version: self.cluster_version.as_deref(),
            termination_policy: &self.termination_policy,
            components: &self.components,
            values: &self.parsed_values,
            service_account: &service_account,
        }
        .render())
    }

    async fn create_dependencies(&self, client: &dyn KbClient, namespace: &str) -> Result<()> {
        let name = self.service_account();
        let body = json!({
            "apiVersion": "v1",
            "kind": "ServiceAccount",
            "metadata": {
                "name": name,
                "namespace": namespace,
                "labels": {
                    LABEL_APP_INSTANCE: self.name,
                    LABEL_APP_MANAGED_BY: MANAGED_BY_KUBEBLOCKS,
                }
            }
        });
        let sa: DynamicObject = serde_json::from_value(body)?;
        match client.create(&Gvr::service_account(), namespace, &sa).await {
            Ok(_) => {
                info!(service_account = %name, "created service account");
                self.created_service_account.store(true, Ordering::SeqCst);
                Ok(())
            }
            Err(KbError::AlreadyExists { .. }) => {
                debug!(service_account = %name, "service account already exists");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn pre_create(&self, obj: &mut DynamicObject) -> Result<()> {
        let labels = obj.metadata.labels.get_or_insert_with(Default::default);
        for (key, value) in definition_labels(&self.cluster_definition, self.cluster_version.as_deref()) {
            labels.insert(key.to_string(), value);
        }
        Ok(())
    }

    async fn clean_up(&self, client: &dyn KbClient, namespace: &str) -> Result<()> {
        if !self.created_service_account.load(Ordering::SeqCst) {
            debug!(service_account = %self.service_account(), "keeping pre-existing service account");
            return Ok(());
        }
        match client
            .delete(&Gvr::service_account(), namespace, &self.service_account())
            .await
        {
            Err(e) if !e.is_not_found() => Err(e),
            _ => Ok(()),
        }
    }

    fn custom_output(&self, out: &mut dyn Write, _created: &DynamicObject) -> Result<()> {
        writeln!(out, "Cluster {} created", self.name)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> ClusterCreateCommand {
        ClusterCreateCommand {
            name: "mycluster".to_string(),
            cluster_definition: "apecloud-mysql".to_string(),
            cluster_version: Some("ac-mysql-8.0.30".to_string()),
            termination_policy: "Delete".to_string(),
            components: vec![ComponentDef {
                name: "mysql".to_string(),
                character_type: "mysql".to_string(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_render_uses_service_account() {
        let body = command().render("default").unwrap();
        assert_eq!(body["metadata"]["name"], "mycluster");
        assert_eq!(body["spec"]["clusterVersionRef"], "ac-mysql-8.0.30");
        assert_eq!(
            body["spec"]["componentSpecs"][0]["serviceAccountName"],
            "kb-mycluster"
        );
    }

    #[tokio::test]
    async fn test_pre_create_labels() {
        let cmd = command();
        let mut obj: DynamicObject =
            serde_json::from_value(cmd.render("default").unwrap()).unwrap();
        cmd.pre_create(&mut obj).await.unwrap();
        let labels = obj.metadata.labels.unwrap();
        assert_eq!(labels["clusterdefinition.kubeblocks.io/name"], "apecloud-mysql");
        assert_eq!(labels["clusterversion.kubeblocks.io/name"], "ac-mysql-8.0.30");
    }
}
