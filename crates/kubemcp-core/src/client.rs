use std::path::Path;

use anyhow::Result;
use k8s_openapi::api::core::v1::{ConfigMap, Event, Node, Pod};
use kube::api::{ListParams, LogParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config};

use crate::cache::{ClientKind, ClientTarget};
use crate::error::ConnectionError;
use crate::manager::ClientFactory;
use crate::resources::{ConfigMapSummary, NodeSummary, PodSummary};
use crate::workload::WorkloadClient;

/// Loads `path` and builds a client config pinned to `context`.
pub(crate) async fn config_for(path: &Path, context: &str) -> Result<Config> {
    let kubeconfig = Kubeconfig::read_from(path)?;
    let opts = KubeConfigOptions { context: Some(context.to_string()), ..Default::default() };
    Ok(Config::from_custom_kubeconfig(kubeconfig, &opts).await?)
}

fn list_params(label_selector: Option<&str>) -> ListParams {
    match label_selector.filter(|s| !s.is_empty()) {
        Some(selector) => ListParams::default().labels(selector),
        None => ListParams::default(),
    }
}

#[derive(Clone)]
pub struct KubeClient {
    client: Client,
    current_namespace: String,
    current_context: String,
}

impl KubeClient {
    pub async fn from_config(path: &Path, context: &str) -> Result<Self> {
        let config = config_for(path, context).await?;
        let default_ns = config.default_namespace.clone();
        let client = Client::try_from(config)?;

        Ok(Self { client, current_namespace: default_ns, current_context: context.to_string() })
    }

    pub fn context(&self) -> &str {
        &self.current_context
    }

    pub fn namespace(&self) -> &str {
        &self.current_namespace
    }

    pub fn inner_client(&self) -> Client {
        self.client.clone()
    }

    /// `None` lists across all namespaces.
    pub async fn list_pods(&self, namespace: Option<&str>, label_selector: Option<&str>) -> Result<Vec<PodSummary>> {
        let api: Api<Pod> = match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };
        let list = api.list(&list_params(label_selector)).await?;
        Ok(list.items.iter().map(PodSummary::from).collect())
    }

    pub async fn get_pod(&self, namespace: &str, name: &str) -> Result<Pod> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get(name).await?)
    }

    pub async fn pod_events(&self, namespace: &str, name: &str) -> Result<Vec<Event>> {
        let api: Api<Event> = Api::namespaced(self.client.clone(), namespace);
        let lp = ListParams::default().fields(&format!("involvedObject.name={name},involvedObject.kind=Pod"));
        let mut events = api.list(&lp).await?.items;
        events.sort_by(|a, b| a.last_timestamp.as_ref().map(|t| t.0).cmp(&b.last_timestamp.as_ref().map(|t| t.0)));
        Ok(events)
    }

    /// The pod and its events, fetched concurrently.
    pub async fn pod_with_events(&self, namespace: &str, name: &str) -> Result<(Pod, Vec<Event>)> {
        futures::try_join!(self.get_pod(namespace, name), self.pod_events(namespace, name))
    }

    /// Without an explicit container the pod's last container is used.
    pub async fn pod_logs(&self, namespace: &str, name: &str, container: Option<&str>) -> Result<String> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);

        let container = match container.filter(|c| !c.is_empty()) {
            Some(c) => c.to_string(),
            None => {
                let pod = api.get(name).await?;
                pod.spec
                    .as_ref()
                    .and_then(|s| s.containers.last())
                    .map(|c| c.name.clone())
                    .ok_or_else(|| anyhow::anyhow!("no containers found in pod {namespace}/{name}"))?
            }
        };

        let lp = LogParams { container: Some(container), ..Default::default() };
        Ok(api.logs(name, &lp).await?)
    }

    pub async fn list_nodes(&self, label_selector: Option<&str>) -> Result<Vec<NodeSummary>> {
        let api: Api<Node> = Api::all(self.client.clone());
        let list = api.list(&list_params(label_selector)).await?;
        Ok(list.items.iter().map(NodeSummary::from).collect())
    }

    pub async fn get_node(&self, name: &str) -> Result<Node> {
        let api: Api<Node> = Api::all(self.client.clone());
        Ok(api.get(name).await?)
    }

    /// `None` lists across all namespaces.
    pub async fn list_configmaps(&self, namespace: Option<&str>) -> Result<Vec<ConfigMapSummary>> {
        let api: Api<ConfigMap> = match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };
        let list = api.list(&ListParams::default()).await?;
        Ok(list.items.iter().map(ConfigMapSummary::from).collect())
    }

    pub async fn get_configmap(&self, namespace: &str, name: &str) -> Result<ConfigMap> {
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get(name).await?)
    }
}

/// Builds real clients from the kubeconfig on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct KubeClientFactory;

impl ClientFactory for KubeClientFactory {
    type Core = KubeClient;
    type Workload = WorkloadClient;

    async fn build_core(&self, target: &ClientTarget) -> crate::error::Result<KubeClient> {
        KubeClient::from_config(&target.path, &target.context)
            .await
            .map_err(|e| ConnectionError::construction(ClientKind::Core.as_str(), &target.context, format!("{e:#}")))
    }

    async fn build_workload(&self, target: &ClientTarget) -> crate::error::Result<WorkloadClient> {
        WorkloadClient::from_config(&target.path, &target.context)
            .await
            .map_err(|e| ConnectionError::construction(ClientKind::Workload.as_str(), &target.context, format!("{e:#}")))
    }
}
