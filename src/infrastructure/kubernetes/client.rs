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

use crate::infrastructure::kubernetes::gvr::Gvr;
use crate::shared::error::KbError;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{Event, Pod};
use kube::api::{DeleteParams, DynamicObject, ListParams, LogParams, PostParams};
use kube::{Api, Client};
use tracing::debug;

/// Label and field selectors for list calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListSelector {
    pub labels: Option<String>,
    pub fields: Option<String>,
}

impl ListSelector {
    pub fn labels(selector: impl Into<String>) -> Self {
        Self {
            labels: Some(selector.into()),
            fields: None,
        }
    }

    pub fn with_fields(mut self, selector: impl Into<String>) -> Self {
        self.fields = Some(selector.into());
        self
    }

    fn to_params(&self) -> ListParams {
        let mut lp = ListParams::default();
        if let Some(labels) = self.labels.as_deref().filter(|s| !s.is_empty()) {
            lp = lp.labels(labels);
        }
        if let Some(fields) = self.fields.as_deref().filter(|s| !s.is_empty()) {
            lp = lp.fields(fields);
        }
        lp
    }
}

/// Everything the commands need from the API server.
///
/// Custom resources go through the dynamic methods keyed by [`Gvr`]; core
/// objects the commands inspect field by field use the typed methods.
#[async_trait::async_trait]
pub trait KbClient: Send + Sync {
    async fn get(&self, gvr: &Gvr, namespace: &str, name: &str) -> Result<DynamicObject, KbError>;

    /// `namespace = None` lists across all namespaces.
    async fn list(
        &self,
        gvr: &Gvr,
        namespace: Option<&str>,
        selector: &ListSelector,
    ) -> Result<Vec<DynamicObject>, KbError>;

    async fn create(
        &self,
        gvr: &Gvr,
        namespace: &str,
        obj: &DynamicObject,
    ) -> Result<DynamicObject, KbError>;

    async fn update(
        &self,
        gvr: &Gvr,
        namespace: &str,
        obj: &DynamicObject,
    ) -> Result<DynamicObject, KbError>;

    async fn delete(&self, gvr: &Gvr, namespace: &str, name: &str) -> Result<(), KbError>;

    async fn list_events(
        &self,
        namespace: &str,
        kind: &str,
        name: &str,
    ) -> Result<Vec<Event>, KbError>;

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Pod, KbError>;

    async fn list_pods(&self, namespace: &str, label_selector: &str) -> Result<Vec<Pod>, KbError>;

    async fn list_jobs(
        &self,
        namespace: Option<&str>,
        label_selector: &str,
    ) -> Result<Vec<Job>, KbError>;

    async fn pod_logs(&self, namespace: &str, name: &str, tail_lines: i64)
        -> Result<String, KbError>;

    async fn list_deployments(
        &self,
        namespace: Option<&str>,
        label_selector: &str,
    ) -> Result<Vec<Deployment>, KbError>;

    async fn server_version(&self) -> Result<String, KbError>;

    /// POST a JSON body to a pod port through the API server proxy.
    async fn pod_proxy_post(
        &self,
        namespace: &str,
        pod: &str,
        port: i32,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, KbError>;
}

pub struct KbClientImpl {
    client: Client,
}

impl KbClientImpl {
    pub async fn new() -> Result<Self, KbError> {
        let client = Client::try_default().await.map_err(|e| {
            KbError::ConfigError(format!("Failed to create Kubernetes client: {}", e))
        })?;

        Ok(Self { client })
    }

    pub async fn new_with_config(
        kubeconfig_path: Option<String>,
        context: Option<String>,
    ) -> Result<Self, KbError> {
        use kube::config::{KubeConfigOptions, Kubeconfig};

        if kubeconfig_path.is_none() && context.is_none() {
            return Self::new().await;
        }

        let kubeconfig = if let Some(path) = kubeconfig_path {
            Kubeconfig::read_from(path)
                .map_err(|e| KbError::ConfigError(format!("Failed to load kubeconfig: {}", e)))?
        } else {
            Kubeconfig::read()
                .map_err(|e| KbError::ConfigError(format!("Failed to load kubeconfig: {}", e)))?
        };

        let config_options = KubeConfigOptions {
            context,
            cluster: None,
            user: None,
        };

        let config = kube::Config::from_custom_kubeconfig(kubeconfig, &config_options)
            .await
            .map_err(|e| {
                KbError::ConfigError(format!("Failed to create Kubernetes config: {}", e))
            })?;

        let client = Client::try_from(config).map_err(|e| {
            KbError::ConfigError(format!("Failed to create Kubernetes client: {}", e))
        })?;

        Ok(Self { client })
    }

    fn dynamic_api(&self, gvr: &Gvr, namespace: Option<&str>) -> Api<DynamicObject> {
        let ar = gvr.api_resource();
        match namespace {
            Some(ns) if gvr.namespaced => Api::namespaced_with(self.client.clone(), ns, &ar),
            _ => Api::all_with(self.client.clone(), &ar),
        }
    }
}

fn object_name(obj: &DynamicObject) -> Result<&str, KbError> {
    obj.metadata
        .name
        .as_deref()
        .ok_or_else(|| KbError::InvalidResource("object name is required".to_string()))
}

#[async_trait::async_trait]
impl KbClient for KbClientImpl {
    async fn get(&self, gvr: &Gvr, namespace: &str, name: &str) -> Result<DynamicObject, KbError> {
        debug!(resource = %gvr, namespace, name, "get");
        self.dynamic_api(gvr, Some(namespace))
            .get(name)
            .await
            .map_err(|e| KbError::from_kube(e, gvr.kind, name, namespace))
    }

    async fn list(
        &self,
        gvr: &Gvr,
        namespace: Option<&str>,
        selector: &ListSelector,
    ) -> Result<Vec<DynamicObject>, KbError> {
        debug!(resource = %gvr, ?namespace, ?selector, "list");
        let list = self
            .dynamic_api(gvr, namespace)
            .list(&selector.to_params())
            .await?;
        Ok(list.items)
    }

    async fn create(
        &self,
        gvr: &Gvr,
        namespace: &str,
        obj: &DynamicObject,
    ) -> Result<DynamicObject, KbError> {
        let name = object_name(obj)?;
        debug!(resource = %gvr, namespace, name, "create");
        self.dynamic_api(gvr, Some(namespace))
            .create(&PostParams::default(), obj)
            .await
            .map_err(|e| KbError::from_kube(e, gvr.kind, name, namespace))
    }

    async fn update(
        &self,
        gvr: &Gvr,
        namespace: &str,
        obj: &DynamicObject,
    ) -> Result<DynamicObject, KbError> {
        let name = object_name(obj)?;
        debug!(resource = %gvr, namespace, name, "update");
        self.dynamic_api(gvr, Some(namespace))
            .replace(name, &PostParams::default(), obj)
            .await
            .map_err(|e| KbError::from_kube(e, gvr.kind, name, namespace))
    }

    async fn delete(&self, gvr: &Gvr, namespace: &str, name: &str) -> Result<(), KbError> {
        debug!(resource = %gvr, namespace, name, "delete");
        self.dynamic_api(gvr, Some(namespace))
            .delete(name, &DeleteParams::default())
            .await
            .map_err(|e| KbError::from_kube(e, gvr.kind, name, namespace))?;
        Ok(())
    }

    async fn list_events(
        &self,
        namespace: &str,
        kind: &str,
        name: &str,
    ) -> Result<Vec<Event>, KbError> {
        let api: Api<Event> = Api::namespaced(self.client.clone(), namespace);
        let fields = format!(
            "involvedObject.kind={},involvedObject.name={},involvedObject.namespace={}",
            kind, name, namespace
        );
        debug!(namespace, fields = %fields, "list events");
        let lp = ListParams::default().fields(&fields);
        Ok(api.list(&lp).await?.items)
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Pod, KbError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        api.get(name)
            .await
            .map_err(|e| KbError::from_kube(e, "Pod", name, namespace))
    }

    async fn list_pods(&self, namespace: &str, label_selector: &str) -> Result<Vec<Pod>, KbError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let lp = ListParams::default().labels(label_selector);
        Ok(api.list(&lp).await?.items)
    }

    async fn list_jobs(
        &self,
        namespace: Option<&str>,
        label_selector: &str,
    ) -> Result<Vec<Job>, KbError> {
        let api: Api<Job> = match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };
        let lp = ListParams::default().labels(label_selector);
        Ok(api.list(&lp).await?.items)
    }

    async fn pod_logs(
        &self,
        namespace: &str,
        name: &str,
        tail_lines: i64,
    ) -> Result<String, KbError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let lp = LogParams {
            tail_lines: Some(tail_lines),
            ..Default::default()
        };
        Ok(api.logs(name, &lp).await?)
    }

    async fn list_deployments(
        &self,
        namespace: Option<&str>,
        label_selector: &str,
    ) -> Result<Vec<Deployment>, KbError> {
        let api: Api<Deployment> = match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };
        let lp = ListParams::default().labels(label_selector);
        Ok(api.list(&lp).await?.items)
    }

    async fn server_version(&self) -> Result<String, KbError> {
        let info = self.client.apiserver_version().await?;
        Ok(info.git_version)
    }

    async fn pod_proxy_post(
        &self,
        namespace: &str,
        pod: &str,
        port: i32,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, KbError> {
        let uri = format!(
            "/api/v1/namespaces/{}/pods/{}:{}/proxy/{}",
            namespace,
            pod,
            port,
            path.trim_start_matches('/')
        );
        debug!(uri = %uri, "pod proxy request");
        let request = http::Request::builder()
            .method(http::Method::POST)
            .uri(uri)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(body)?)
            .map_err(|e| KbError::Api(e.to_string()))?;

        Ok(self.client.request::<serde_json::Value>(request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_params() {
        let lp = ListSelector::labels("").to_params();
        assert_eq!(lp.label_selector, None);
        assert_eq!(lp.field_selector, None);

        let lp = ListSelector::labels("app=mysql")
            .with_fields("metadata.name=b1")
            .to_params();
        assert_eq!(lp.label_selector.as_deref(), Some("app=mysql"));
        assert_eq!(lp.field_selector.as_deref(), Some("metadata.name=b1"));
    }
}
