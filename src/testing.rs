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

//! In-memory doubles for driving commands in tests

use crate::cli::action::delete::check_confirmation;
use crate::cli::action::{CommandContext, Factory, IoStreams, Prompt};
use crate::infrastructure::editor::{strip_comments, Editor};
use crate::infrastructure::kubernetes::client::{KbClient, ListSelector};
use crate::infrastructure::kubernetes::gvr::Gvr;
use crate::shared::error::KbError;
use crate::shared::fatal::ErrorStrategy;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{Event, Pod};
use kube::api::DynamicObject;
use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Build a dynamic object from a JSON literal.
pub fn object(value: serde_json::Value) -> DynamicObject {
    serde_json::from_value(value).expect("valid object literal")
}

/// Shared in-memory writer standing in for stdout.
#[derive(Clone, Default)]
pub struct TestBuffer(Arc<Mutex<Vec<u8>>>);

impl TestBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
    }
}

impl Write for TestBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// A [`Prompt`] answering with a fixed string, recording what it was asked.
#[derive(Clone, Default)]
pub struct ScriptedPrompt {
    answer: Option<String>,
    asked: Arc<Mutex<Vec<Vec<String>>>>,
}

impl ScriptedPrompt {
    /// Types exactly the requested names.
    pub fn approving() -> Self {
        Self::default()
    }

    pub fn typing(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
            asked: Arc::default(),
        }
    }

    pub fn asked(&self) -> Vec<Vec<String>> {
        self.asked.lock().unwrap().clone()
    }
}

impl Prompt for ScriptedPrompt {
    fn confirm_names(&self, names: &[String]) -> Result<(), KbError> {
        self.asked.lock().unwrap().push(names.to_vec());
        let typed = self.answer.clone().unwrap_or_else(|| names.join(" "));
        check_confirmation(names, &typed)
    }
}

/// An [`Editor`] that replaces the buffer with preset text.
#[derive(Clone, Default)]
pub struct FakeEditor {
    result: String,
    shown: Arc<Mutex<Vec<String>>>,
}

impl FakeEditor {
    pub fn returning(result: &str) -> Self {
        Self {
            result: result.to_string(),
            shown: Arc::default(),
        }
    }

    /// Buffers the editor was opened with.
    pub fn shown(&self) -> Vec<String> {
        self.shown.lock().unwrap().clone()
    }
}

impl Editor for FakeEditor {
    fn edit(&self, _prefix: &str, content: &str) -> Result<String, KbError> {
        self.shown.lock().unwrap().push(content.to_string());
        strip_comments(&self.result)
    }
}

/// A context writing to an in-memory buffer, approving every prompt.
pub fn context(factory: Factory) -> (CommandContext, TestBuffer) {
    context_with(factory, ScriptedPrompt::approving(), FakeEditor::default())
}

pub fn context_with(
    factory: Factory,
    prompt: ScriptedPrompt,
    editor: FakeEditor,
) -> (CommandContext, TestBuffer) {
    let out = TestBuffer::new();
    let ctx = CommandContext {
        factory,
        streams: IoStreams::new(Box::new(out.clone()), Box::new(std::io::sink())),
        errors: ErrorStrategy::plain(),
        prompt: Box::new(prompt),
        editor: Box::new(editor),
    };
    (ctx, out)
}

#[derive(Default)]
struct State {
    objects: Vec<(&'static str, DynamicObject)>,
    events: Vec<Event>,
    pods: Vec<Pod>,
    jobs: Vec<Job>,
    deployments: Vec<Deployment>,
    logs: BTreeMap<String, String>,
    proxy_responses: Vec<serde_json::Value>,
    proxy_requests: Vec<(String, serde_json::Value)>,
    calls: Vec<String>,
    fail_create: HashSet<&'static str>,
}

/// A [`KbClient`] backed by vectors, recording every call it serves.
#[derive(Default, Clone)]
pub struct FakeClient {
    state: Arc<Mutex<State>>,
    version: String,
}

impl FakeClient {
    pub fn new() -> Self {
        Self {
            state: Arc::default(),
            version: "v1.30.0".to_string(),
        }
    }

    pub fn with_object(self, gvr: &Gvr, obj: DynamicObject) -> Self {
        self.state.lock().unwrap().objects.push((gvr.resource, obj));
        self
    }

    pub fn with_event(self, event: Event) -> Self {
        self.state.lock().unwrap().events.push(event);
        self
    }

    pub fn with_pod(self, pod: Pod) -> Self {
        self.state.lock().unwrap().pods.push(pod);
        self
    }

    pub fn with_job(self, job: Job) -> Self {
        self.state.lock().unwrap().jobs.push(job);
        self
    }

    pub fn with_logs(self, pod: &str, logs: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .logs
            .insert(pod.to_string(), logs.to_string());
        self
    }

    pub fn with_deployment(self, deployment: Deployment) -> Self {
        self.state.lock().unwrap().deployments.push(deployment);
        self
    }

    pub fn with_proxy_response(self, response: serde_json::Value) -> Self {
        self.state.lock().unwrap().proxy_responses.push(response);
        self
    }

    /// Make every create of `gvr` fail with an API error.
    pub fn failing_create(self, gvr: &Gvr) -> Self {
        self.state.lock().unwrap().fail_create.insert(gvr.resource);
        self
    }

    /// Calls served so far, e.g. `create opsrequests default/backup-1`.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Only the calls that change remote state.
    pub fn writes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| {
                c.starts_with("create ") || c.starts_with("update ") || c.starts_with("delete ")
            })
            .collect()
    }

    pub fn proxy_requests(&self) -> Vec<(String, serde_json::Value)> {
        self.state.lock().unwrap().proxy_requests.clone()
    }

    pub fn stored(&self, gvr: &Gvr, namespace: &str, name: &str) -> Option<DynamicObject> {
        let state = self.state.lock().unwrap();
        state
            .objects
            .iter()
            .find(|(res, o)| *res == gvr.resource && matches(o, gvr, namespace, name))
            .map(|(_, o)| o.clone())
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

fn matches(obj: &DynamicObject, gvr: &Gvr, namespace: &str, name: &str) -> bool {
    let same_ns = !gvr.namespaced || obj.metadata.namespace.as_deref() == Some(namespace);
    same_ns && obj.metadata.name.as_deref() == Some(name)
}

/// Evaluate the subset of label selector syntax the CLI produces:
/// `k=v`, `k!=v`, `k in (a,b)` and bare `k`, joined with commas.
pub fn selector_matches(selector: &str, labels: &BTreeMap<String, String>) -> bool {
    split_requirements(selector).iter().all(|req| {
        let req = req.trim();
        if req.is_empty() {
            return true;
        }
        if let Some((key, rest)) = req.split_once(" in ") {
            let values = rest.trim().trim_start_matches('(').trim_end_matches(')');
            let values: Vec<&str> = values.split(',').map(str::trim).collect();
            return labels
                .get(key.trim())
                .map(|v| values.contains(&v.as_str()))
                .unwrap_or(false);
        }
        if let Some((key, value)) = req.split_once("!=") {
            return labels.get(key.trim()).map(String::as_str) != Some(value.trim());
        }
        if let Some((key, value)) = req.split_once('=') {
            return labels.get(key.trim()).map(String::as_str) == Some(value.trim());
        }
        labels.contains_key(req)
    })
}

fn split_requirements(selector: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0;
    let mut current = String::new();
    for c in selector.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    parts.push(current);
    parts
}

fn label_selector_matches(selector: Option<&str>, labels: Option<&BTreeMap<String, String>>) -> bool {
    match selector {
        None => true,
        Some(s) => selector_matches(s, labels.unwrap_or(&BTreeMap::new())),
    }
}

/// Only `metadata.name` and `metadata.namespace` equality are understood.
fn field_selector_matches(selector: Option<&str>, obj: &DynamicObject) -> bool {
    let Some(selector) = selector else {
        return true;
    };
    selector.split(',').all(|req| match req.split_once('=') {
        Some(("metadata.name", v)) => obj.metadata.name.as_deref() == Some(v.trim()),
        Some(("metadata.namespace", v)) => obj.metadata.namespace.as_deref() == Some(v.trim()),
        _ => true,
    })
}

#[async_trait::async_trait]
impl KbClient for FakeClient {
    async fn get(&self, gvr: &Gvr, namespace: &str, name: &str) -> Result<DynamicObject, KbError> {
        self.record(format!("get {} {}/{}", gvr.resource, namespace, name));
        self.stored(gvr, namespace, name)
            .ok_or_else(|| KbError::not_found(gvr.kind, name, namespace))
    }

    async fn list(
        &self,
        gvr: &Gvr,
        namespace: Option<&str>,
        selector: &ListSelector,
    ) -> Result<Vec<DynamicObject>, KbError> {
        self.record(format!("list {} {}", gvr.resource, namespace.unwrap_or("*")));
        let state = self.state.lock().unwrap();
        Ok(state
            .objects
            .iter()
            .filter(|(res, _)| *res == gvr.resource)
            .map(|(_, o)| o)
            .filter(|o| match namespace {
                Some(ns) if gvr.namespaced => o.metadata.namespace.as_deref() == Some(ns),
                _ => true,
            })
            .filter(|o| label_selector_matches(selector.labels.as_deref(), o.metadata.labels.as_ref()))
            .filter(|o| field_selector_matches(selector.fields.as_deref(), o))
            .cloned()
            .collect())
    }

    async fn create(
        &self,
        gvr: &Gvr,
        namespace: &str,
        obj: &DynamicObject,
    ) -> Result<DynamicObject, KbError> {
        let name = obj.metadata.name.clone().unwrap_or_default();
        self.record(format!("create {} {}/{}", gvr.resource, namespace, name));
        if self.state.lock().unwrap().fail_create.contains(gvr.resource) {
            return Err(KbError::Api(format!("admission webhook denied {}", name)));
        }
        if self.stored(gvr, namespace, &name).is_some() {
            return Err(KbError::already_exists(gvr.kind, name, namespace));
        }
        let mut created = obj.clone();
        created.metadata.namespace = Some(namespace.to_string());
        self.state
            .lock()
            .unwrap()
            .objects
            .push((gvr.resource, created.clone()));
        Ok(created)
    }

    async fn update(
        &self,
        gvr: &Gvr,
        namespace: &str,
        obj: &DynamicObject,
    ) -> Result<DynamicObject, KbError> {
        let name = obj.metadata.name.clone().unwrap_or_default();
        self.record(format!("update {} {}/{}", gvr.resource, namespace, name));
        let mut state = self.state.lock().unwrap();
        let slot = state
            .objects
            .iter_mut()
            .find(|(res, o)| *res == gvr.resource && matches(o, gvr, namespace, &name))
            .ok_or_else(|| KbError::not_found(gvr.kind, &name, namespace))?;
        slot.1 = obj.clone();
        Ok(obj.clone())
    }

    async fn delete(&self, gvr: &Gvr, namespace: &str, name: &str) -> Result<(), KbError> {
        self.record(format!("delete {} {}/{}", gvr.resource, namespace, name));
        let mut state = self.state.lock().unwrap();
        let before = state.objects.len();
        state
            .objects
            .retain(|(res, o)| !(*res == gvr.resource && matches(o, gvr, namespace, name)));
        if state.objects.len() == before {
            return Err(KbError::not_found(gvr.kind, name, namespace));
        }
        Ok(())
    }

    async fn list_events(
        &self,
        namespace: &str,
        kind: &str,
        name: &str,
    ) -> Result<Vec<Event>, KbError> {
        self.record(format!("list events {}/{}", namespace, name));
        let state = self.state.lock().unwrap();
        Ok(state
            .events
            .iter()
            .filter(|e| {
                e.involved_object.kind.as_deref() == Some(kind)
                    && e.involved_object.name.as_deref() == Some(name)
            })
            .cloned()
            .collect())
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Pod, KbError> {
        self.record(format!("get pods {}/{}", namespace, name));
        let state = self.state.lock().unwrap();
        state
            .pods
            .iter()
            .find(|p| {
                p.metadata.name.as_deref() == Some(name)
                    && p.metadata.namespace.as_deref() == Some(namespace)
            })
            .cloned()
            .ok_or_else(|| KbError::not_found("Pod", name, namespace))
    }

    async fn list_pods(&self, namespace: &str, label_selector: &str) -> Result<Vec<Pod>, KbError> {
        self.record(format!("list pods {}", namespace));
        let state = self.state.lock().unwrap();
        Ok(state
            .pods
            .iter()
            .filter(|p| p.metadata.namespace.as_deref() == Some(namespace))
            .filter(|p| label_selector_matches(Some(label_selector), p.metadata.labels.as_ref()))
            .cloned()
            .collect())
    }

    async fn list_jobs(
        &self,
        _namespace: Option<&str>,
        label_selector: &str,
    ) -> Result<Vec<Job>, KbError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .jobs
            .iter()
            .filter(|j| label_selector_matches(Some(label_selector), j.metadata.labels.as_ref()))
            .cloned()
            .collect())
    }

    async fn pod_logs(
        &self,
        _namespace: &str,
        name: &str,
        _tail_lines: i64,
    ) -> Result<String, KbError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .logs
            .get(name)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_deployments(
        &self,
        _namespace: Option<&str>,
        label_selector: &str,
    ) -> Result<Vec<Deployment>, KbError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .deployments
            .iter()
            .filter(|d| label_selector_matches(Some(label_selector), d.metadata.labels.as_ref()))
            .cloned()
            .collect())
    }

    async fn server_version(&self) -> Result<String, KbError> {
        Ok(self.version.clone())
    }

    async fn pod_proxy_post(
        &self,
        namespace: &str,
        pod: &str,
        port: i32,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, KbError> {
        let mut state = self.state.lock().unwrap();
        state
            .proxy_requests
            .push((format!("{}/{}:{}/{}", namespace, pod, port, path), body.clone()));
        if state.proxy_responses.is_empty() {
            return Err(KbError::Api("no proxy response configured".to_string()));
        }
        Ok(state.proxy_responses.remove(0))
    }
}
