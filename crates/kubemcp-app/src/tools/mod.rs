//! Tool registry: names, input schemas and dispatch to the handlers.
//!
//! Every handler parses its arguments before touching the cluster, then asks
//! the [`ConnectionManager`] for a client and performs one operation.

mod configmap;
mod context;
mod kruise;
mod node;
mod pod;

use std::sync::Arc;

use anyhow::Result;
use kubemcp_core::{ConnectionManager, KubeClient, KubeClientFactory, WorkloadClient};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

pub type Manager = ConnectionManager<KubeClientFactory>;

const DEFAULT_NAMESPACE: &str = "default";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolDef {
    fn new(name: &str, description: &str, input_schema: Value) -> Self {
        Self { name: name.to_string(), description: description.to_string(), input_schema }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self { content: vec![ToolContent::Text { text: text.into() }], is_error: false }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { content: vec![ToolContent::Text { text: text.into() }], is_error: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

pub struct ToolRegistry {
    manager: Arc<Manager>,
    tools: Vec<ToolDef>,
}

impl ToolRegistry {
    pub fn new(manager: Arc<Manager>) -> Self {
        let mut tools = context::definitions();
        tools.extend(pod::definitions());
        tools.extend(node::definitions());
        tools.extend(configmap::definitions());
        tools.extend(kruise::definitions());
        Self { manager, tools }
    }

    #[cfg(test)]
    pub fn manager(&self) -> &Manager {
        &self.manager
    }

    pub fn list_tools(&self) -> &[ToolDef] {
        &self.tools
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name == name)
    }

    /// Runs a tool. Failures become an `isError` result carrying the message.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> ToolResult {
        debug!(tool = name, "calling tool");
        match self.dispatch(name, arguments).await {
            Ok(text) => ToolResult::text(text),
            Err(e) => {
                warn!(tool = name, error = %format!("{e:#}"), "tool failed");
                ToolResult::error(format!("{e:#}"))
            }
        }
    }

    async fn dispatch(&self, name: &str, args: Value) -> Result<String> {
        let m = &self.manager;
        match name {
            "set_kubeconfig_path" => context::set_kubeconfig_path(m, args).await,
            "get_current_context" => context::get_current_context(m, args).await,
            "list_contexts" => context::list_contexts(m, args).await,
            "switch_context" => context::switch_context(m, args).await,

            "list_pods" => pod::list_pods(m, args).await,
            "describe_pod" => pod::describe_pod(m, args).await,
            "get_pod_logs" => pod::get_pod_logs(m, args).await,
            "delete_pod" => pod::delete_pod(m, args).await,
            "exec_command_in_pod" => pod::exec_command_in_pod(m, args).await,

            "list_nodes" => node::list_nodes(m, args).await,
            "describe_node" => node::describe_node(m, args).await,
            "cordon_node" => node::cordon_node(m, args).await,
            "uncordon_node" => node::uncordon_node(m, args).await,

            "list_configmaps" => configmap::list_configmaps(m, args).await,
            "get_configmap" => configmap::get_configmap(m, args).await,

            "list_clonesets" => kruise::list_clonesets(m, args).await,
            "list_advanced_statefulsets" => kruise::list_advanced_statefulsets(m, args).await,
            "describe_cloneset" => kruise::describe_cloneset(m, args).await,
            "describe_advanced_statefulset" => kruise::describe_advanced_statefulset(m, args).await,
            "scale_kruise_resource" | "scale" => kruise::scale(m, name, args).await,

            _ => anyhow::bail!("unknown tool: {name}"),
        }
    }
}

/// Resolves the context on the blocking pool before asking for a client, so a
/// first resolution never reads or rewrites the kubeconfig on a runtime worker.
async fn core_client(manager: &Arc<Manager>) -> Result<Arc<KubeClient>> {
    context::blocking(manager, |m| Ok(m.current_context()?)).await?;
    Ok(manager.core_client().await?)
}

async fn workload_client(manager: &Arc<Manager>) -> Result<Arc<WorkloadClient>> {
    context::blocking(manager, |m| Ok(m.current_context()?)).await?;
    Ok(manager.workload_client().await?)
}

/// Missing or `null` arguments parse as an empty object.
fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T> {
    let args = if args.is_null() { Value::Object(Default::default()) } else { args };
    serde_json::from_value(args).map_err(|e| anyhow::anyhow!("invalid arguments for {tool}: {e}"))
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str> {
    let value = value.trim();
    anyhow::ensure!(!value.is_empty(), "{field} is required");
    Ok(value)
}

fn namespace_or_default(namespace: &str) -> &str {
    match namespace.trim() {
        "" => DEFAULT_NAMESPACE,
        ns => ns,
    }
}

/// `None` means every namespace.
fn list_scope(namespace: &str, all_namespaces: bool) -> Option<&str> {
    if all_namespaces {
        None
    } else {
        Some(namespace_or_default(namespace))
    }
}

/// Tools that take no arguments.
#[derive(Debug, Deserialize, JsonSchema)]
struct NoArgs {}

/// JSON schema of a tool's argument struct.
fn input_schema<T: JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T)).unwrap_or_default()
}
