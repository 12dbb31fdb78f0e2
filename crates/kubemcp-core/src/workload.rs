use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::Result;
use kube::api::{ListParams, Patch, PatchParams};
use kube::core::{ApiResource, DynamicObject, GroupVersionKind};
use kube::{Api, Client};

use crate::client::config_for;
use crate::resources::WorkloadSummary;

const KRUISE_GROUP: &str = "apps.kruise.io";

/// OpenKruise controllers reachable through the workload client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkloadKind {
    CloneSet,
    AdvancedStatefulSet,
}

impl WorkloadKind {
    pub fn api_resource(&self) -> ApiResource {
        match self {
            Self::CloneSet => {
                ApiResource::from_gvk_with_plural(&GroupVersionKind::gvk(KRUISE_GROUP, "v1alpha1", "CloneSet"), "clonesets")
            }
            Self::AdvancedStatefulSet => ApiResource::from_gvk_with_plural(
                &GroupVersionKind::gvk(KRUISE_GROUP, "v1beta1", "StatefulSet"),
                "statefulsets",
            ),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::CloneSet => "CloneSet",
            Self::AdvancedStatefulSet => "Advanced StatefulSet",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for WorkloadKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "cloneset" | "clonesets" => Ok(Self::CloneSet),
            "advancedstatefulset" | "advancedstatefulsets" | "asts" => Ok(Self::AdvancedStatefulSet),
            other => anyhow::bail!("unsupported workload type '{other}', expected 'cloneset' or 'advancedstatefulset'"),
        }
    }
}

/// Client for the `apps.kruise.io` API group.
#[derive(Clone)]
pub struct WorkloadClient {
    client: Client,
    current_namespace: String,
    current_context: String,
}

impl WorkloadClient {
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

    fn api(&self, kind: WorkloadKind, namespace: Option<&str>) -> Api<DynamicObject> {
        let ar = kind.api_resource();
        match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &ar),
            None => Api::all_with(self.client.clone(), &ar),
        }
    }

    /// `None` lists across all namespaces.
    pub async fn list(&self, kind: WorkloadKind, namespace: Option<&str>) -> Result<Vec<WorkloadSummary>> {
        let list = self.api(kind, namespace).list(&ListParams::default()).await?;
        Ok(list.items.iter().map(WorkloadSummary::from).collect())
    }

    pub async fn get(&self, kind: WorkloadKind, namespace: &str, name: &str) -> Result<DynamicObject> {
        Ok(self.api(kind, Some(namespace)).get(name).await?)
    }

    pub async fn scale(&self, kind: WorkloadKind, namespace: &str, name: &str, replicas: i32) -> Result<()> {
        anyhow::ensure!(replicas >= 0, "replicas must not be negative, got {replicas}");
        let patch = serde_json::json!({
            "spec": { "replicas": replicas }
        });
        let pp = PatchParams::default();
        self.api(kind, Some(namespace)).patch(name, &pp, &Patch::Merge(&patch)).await?;
        Ok(())
    }
}
