use anyhow::Result;
use k8s_openapi::api::core::v1::{Node, Pod};
use kube::api::{Api, DeleteParams, Patch, PatchParams};
use kube::Client;
use tracing::info;

/// Mutating operations on core resources.
pub struct ActionExecutor {
    client: Client,
}

impl ActionExecutor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// `force` deletes with a zero grace period.
    pub async fn delete_pod(&self, namespace: &str, name: &str, force: bool) -> Result<()> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        api.delete(name, &delete_params(force)).await?;
        info!(namespace, pod = name, force, "pod deleted");
        Ok(())
    }

    /// Cordons (`true`) or uncordons (`false`) a node.
    pub async fn set_unschedulable(&self, name: &str, unschedulable: bool) -> Result<()> {
        let api: Api<Node> = Api::all(self.client.clone());
        api.patch(name, &PatchParams::default(), &Patch::Merge(&unschedulable_patch(unschedulable))).await?;
        info!(node = name, unschedulable, "node scheduling updated");
        Ok(())
    }
}

fn delete_params(force: bool) -> DeleteParams {
    if force {
        DeleteParams { grace_period_seconds: Some(0), ..DeleteParams::default() }
    } else {
        DeleteParams::default()
    }
}

fn unschedulable_patch(unschedulable: bool) -> serde_json::Value {
    serde_json::json!({
        "spec": { "unschedulable": unschedulable }
    })
}
