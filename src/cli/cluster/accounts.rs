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

//! Account management through the lorry sidecar of a database pod.

use crate::cli::action::{CommandContext, Lifecycle};
use crate::domain::cluster::{Cluster, ClusterDefinition};
use crate::domain::from_dynamic;
use crate::infrastructure::constants::{
    LABEL_APP_INSTANCE, LABEL_COMPONENT_NAME, LABEL_ROLE, LEADER_ROLES,
};
use crate::infrastructure::kubernetes::client::KbClient;
use crate::infrastructure::kubernetes::gvr::Gvr;
use crate::infrastructure::lorry::{
    AccountOp, LorryClient, LorryRequest, LorryResponse, RoleName, UserInfo,
};
use crate::shared::error::{KbError, Result};
use clap::Parser;
use k8s_openapi::api::core::v1::Pod;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::debug;

const GENERATED_PASSWORD_LEN: usize = 16;

fn pod_label<'a>(pod: &'a Pod, key: &str) -> &'a str {
    pod.metadata
        .labels
        .as_ref()
        .and_then(|l| l.get(key))
        .map(String::as_str)
        .unwrap_or_default()
}

/// Leader-like pods first, in the order of [`LEADER_ROLES`], then the rest.
pub fn pick_pod(pods: &[Pod]) -> Option<&Pod> {
    LEADER_ROLES
        .iter()
        .find_map(|role| pods.iter().find(|p| pod_label(p, LABEL_ROLE) == *role))
        .or_else(|| pods.first())
}

pub fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

/// Where an account command runs: one cluster component, or one instance.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct AccountTarget {
    /// Cluster name
    pub clusters: Vec<String>,

    /// Specify the name of component to be connected. If not specified, pick the first one.
    #[arg(long, default_value = "")]
    pub component: String,

    /// Specify the name of instance to be connected.
    #[arg(long, short = 'i', default_value = "")]
    pub instance: String,

    #[arg(skip)]
    pub namespace: String,

    #[arg(skip)]
    pub cluster: String,

    #[arg(skip)]
    pub character_type: String,
}

impl AccountTarget {
    /// Argument combinations, checked before anything is fetched.
    pub fn check_args(&self) -> Result<()> {
        if self.clusters.len() > 1 {
            return Err(KbError::validation(
                "please specify ONE cluster-name at a time",
            ));
        }
        if !self.instance.is_empty() {
            if !self.component.is_empty() {
                return Err(KbError::validation(
                    "please specify either --component or --instance, they are exclusive",
                ));
            }
            if !self.clusters.is_empty() {
                return Err(KbError::validation(
                    "specify either cluster name or --instance",
                ));
            }
        } else if self.clusters.is_empty() {
            return Err(KbError::validation(
                "specify either cluster name or --instance",
            ));
        }
        Ok(())
    }

    /// Fill in cluster, component, character type and instance.
    pub async fn resolve(&mut self, ctx: &CommandContext) -> Result<()> {
        self.check_args()?;
        self.namespace = ctx.factory.namespace();
        let client = ctx.factory.client().await?;

        if !self.instance.is_empty() {
            let pod = client.get_pod(&self.namespace, &self.instance).await?;
            self.cluster = pod_label(&pod, LABEL_APP_INSTANCE).to_string();
            self.component = pod_label(&pod, LABEL_COMPONENT_NAME).to_string();
        } else {
            self.cluster = self.clusters[0].clone();
        }

        let obj = client.get(&Gvr::cluster(), &self.namespace, &self.cluster).await?;
        let cluster: Cluster = from_dynamic(&obj)?;
        let component = cluster
            .component(Some(&self.component))
            .ok_or_else(|| {
                KbError::not_found("component", &self.component, &self.namespace)
            })?;
        self.component = component.name.clone();

        let obj = client
            .get(
                &Gvr::cluster_definition(),
                "",
                &cluster.spec.cluster_definition_ref,
            )
            .await?;
        let definition: ClusterDefinition = from_dynamic(&obj)?;
        self.character_type = definition
            .component_def(&component.component_def_ref)
            .map(|d| d.character_type.clone())
            .unwrap_or_default();

        if self.instance.is_empty() {
            self.instance = self.infer_instance(client.as_ref()).await?;
        }
        debug!(
            cluster = %self.cluster,
            component = %self.component,
            instance = %self.instance,
            character_type = %self.character_type,
            "resolved account target"
        );
        Ok(())
    }

    async fn infer_instance(&self, client: &dyn KbClient) -> Result<String> {
        let selector = format!(
            "{}={},{}={}",
            LABEL_APP_INSTANCE, self.cluster, LABEL_COMPONENT_NAME, self.component
        );
        let pods = client.list_pods(&self.namespace, &selector).await?;
        pick_pod(&pods)
            .and_then(|p| p.metadata.name.clone())
            .ok_or_else(|| {
                KbError::precondition(format!(
                    "failed to find the instance of component \"{}\" in cluster \"{}\"",
                    self.component, self.cluster
                ))
            })
    }

    pub async fn call(&self, ctx: &CommandContext, request: &LorryRequest) -> Result<LorryResponse> {
        let client = ctx.factory.client().await?;
        LorryClient::new(
            client.as_ref(),
            &self.namespace,
            &self.instance,
            &self.character_type,
        )
        .call(request)
        .await
    }
}

fn print_general_info(ctx: &mut CommandContext, response: &LorryResponse) -> Result<()> {
    let mut tbl = ctx.boxed_table();
    tbl.set_header(&["RESULT", "MESSAGE"]);
    tbl.add_row(vec![response.event.clone(), response.message_text()]);
    tbl.print(ctx.out())?;
    Ok(())
}

fn print_user_info(ctx: &mut CommandContext, users: &[UserInfo]) -> Result<()> {
    let mut tbl = ctx.boxed_table();
    tbl.set_header(&["USERNAME", "EXPIRED"]);
    for user in users {
        tbl.add_row(vec![user.user_name.clone(), user.expired_display()]);
    }
    tbl.print(ctx.out())?;
    Ok(())
}

fn print_role_info(ctx: &mut CommandContext, users: &[UserInfo]) -> Result<()> {
    let mut tbl = ctx.boxed_table();
    tbl.set_header(&["USERNAME", "ROLE"]);
    for user in users {
        tbl.add_row(vec![user.user_name.clone(), user.role_name.clone()]);
    }
    tbl.print(ctx.out())?;
    Ok(())
}

fn require_username(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(KbError::validation("please specify username"));
    }
    Ok(())
}

fn require_role(role: &str) -> Result<RoleName> {
    if role.is_empty() {
        return Err(KbError::validation("please specify at least ONE role name"));
    }
    role.parse()
}

#[derive(Parser, Debug, Clone, Default)]
pub struct CreateAccountCommand {
    #[command(flatten)]
    pub target: AccountTarget,

    /// Required. Specify the name of user, which must be unique.
    #[arg(long, default_value = "")]
    pub name: String,

    /// Optional. Specify the password of user. The default value is empty, which means a random password will be generated.
    #[arg(long, short = 'p', default_value = "")]
    pub password: String,
}

#[async_trait::async_trait]
impl Lifecycle for CreateAccountCommand {
    async fn complete(&mut self, ctx: &CommandContext) -> Result<()> {
        require_username(&self.name)?;
        self.target.resolve(ctx).await?;
        if self.password.is_empty() {
            self.password = generate_password();
        }
        Ok(())
    }

    async fn validate(&self, _ctx: &CommandContext) -> Result<()> {
        Ok(())
    }

    async fn run(&mut self, ctx: &mut CommandContext) -> Result<()> {
        let request = LorryRequest::new(AccountOp::CreateUser)
            .with_data("userName", self.name.as_str())
            .with_data("password", self.password.as_str());
        let response = self.target.call(ctx, &request).await?;
        print_general_info(ctx, &response)
    }
}

#[derive(Parser, Debug, Clone, Default)]
pub struct DeleteAccountCommand {
    #[command(flatten)]
    pub target: AccountTarget,

    /// Required user name, please specify it
    #[arg(long, default_value = "")]
    pub name: String,

    /// Skip interactive approval before deleting account
    #[arg(long)]
    pub auto_approve: bool,
}

#[async_trait::async_trait]
impl Lifecycle for DeleteAccountCommand {
    async fn complete(&mut self, ctx: &CommandContext) -> Result<()> {
        require_username(&self.name)?;
        self.target.resolve(ctx).await
    }

    async fn validate(&self, _ctx: &CommandContext) -> Result<()> {
        Ok(())
    }

    async fn run(&mut self, ctx: &mut CommandContext) -> Result<()> {
        if !self.auto_approve {
            ctx.prompt.confirm_names(&[self.name.clone()])?;
        }
        let request = LorryRequest::new(AccountOp::DeleteUser).with_data("userName", self.name.as_str());
        let response = self.target.call(ctx, &request).await?;
        print_general_info(ctx, &response)
    }
}

#[derive(Parser, Debug, Clone, Default)]
pub struct DescribeAccountCommand {
    #[command(flatten)]
    pub target: AccountTarget,

    /// Required user name, please specify it
    #[arg(long, default_value = "")]
    pub name: String,
}

#[async_trait::async_trait]
impl Lifecycle for DescribeAccountCommand {
    async fn complete(&mut self, ctx: &CommandContext) -> Result<()> {
        require_username(&self.name)?;
        self.target.resolve(ctx).await
    }

    async fn validate(&self, _ctx: &CommandContext) -> Result<()> {
        Ok(())
    }

    async fn run(&mut self, ctx: &mut CommandContext) -> Result<()> {
        let request =
            LorryRequest::new(AccountOp::DescribeUser).with_data("userName", self.name.as_str());
        let response = self.target.call(ctx, &request).await?;
        print_role_info(ctx, &response.users()?)
    }
}

#[derive(Parser, Debug, Clone, Default)]
pub struct ListAccountsCommand {
    #[command(flatten)]
    pub target: AccountTarget,
}

#[async_trait::async_trait]
impl Lifecycle for ListAccountsCommand {
    async fn complete(&mut self, ctx: &CommandContext) -> Result<()> {
        self.target.resolve(ctx).await
    }

    async fn validate(&self, _ctx: &CommandContext) -> Result<()> {
        Ok(())
    }

    async fn run(&mut self, ctx: &mut CommandContext) -> Result<()> {
        let request = LorryRequest::new(AccountOp::ListUsers);
        let response = self.target.call(ctx, &request).await?;
        print_user_info(ctx, &response.users()?)
    }
}

/// Shared by grant-role and revoke-role.
#[derive(Parser, Debug, Clone, Default)]
pub struct RoleCommand {
    #[command(flatten)]
    pub target: AccountTarget,

    /// Required user name, please specify it.
    #[arg(long, default_value = "")]
    pub name: String,

    /// Role name should be one of [SUPERUSER, READWRITE, READONLY]
    #[arg(long, short = 'r', default_value = "")]
    pub role: String,

    #[arg(skip)]
    revoke: bool,
}

impl RoleCommand {
    pub fn revoking(mut self) -> Self {
        self.revoke = true;
        self
    }

    fn op(&self) -> AccountOp {
        if self.revoke {
            AccountOp::RevokeUserRole
        } else {
            AccountOp::GrantUserRole
        }
    }
}

#[async_trait::async_trait]
impl Lifecycle for RoleCommand {
    async fn complete(&mut self, ctx: &CommandContext) -> Result<()> {
        require_username(&self.name)?;
        require_role(&self.role)?;
        self.target.resolve(ctx).await
    }

    async fn validate(&self, _ctx: &CommandContext) -> Result<()> {
        Ok(())
    }

    async fn run(&mut self, ctx: &mut CommandContext) -> Result<()> {
        let role = require_role(&self.role)?;
        let request = LorryRequest::new(self.op())
            .with_data("userName", self.name.as_str())
            .with_data("roleName", role.as_str());
        let response = self.target.call(ctx, &request).await?;
        print_general_info(ctx, &response)
    }
}
