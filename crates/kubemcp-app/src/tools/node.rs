use std::sync::Arc;

use anyhow::Result;
use kubemcp_core::resource::render_table;
use kubemcp_core::resources;
use kubemcp_core::ActionExecutor;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::{core_client, input_schema, parse_args, required, Manager, ToolDef};

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
struct ListNodesArgs {
    /// Label selector
    label_selector: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct NodeArgs {
    /// Name of the node
    node_name: String,
}

pub(super) fn definitions() -> Vec<ToolDef> {
    vec![
        ToolDef::new("list_nodes", "List Nodes", input_schema::<ListNodesArgs>()),
        ToolDef::new("describe_node", "Describe a Node", input_schema::<NodeArgs>()),
        ToolDef::new("cordon_node", "Mark a Node as unschedulable", input_schema::<NodeArgs>()),
        ToolDef::new("uncordon_node", "Mark a Node as schedulable", input_schema::<NodeArgs>()),
    ]
}

pub(super) async fn list_nodes(manager: &Arc<Manager>, args: Value) -> Result<String> {
    let args: ListNodesArgs = parse_args("list_nodes", args)?;
    let client = core_client(manager).await?;
    let nodes = client.list_nodes(Some(args.label_selector.as_str())).await?;
    Ok(render_table(&nodes))
}

pub(super) async fn describe_node(manager: &Arc<Manager>, args: Value) -> Result<String> {
    let args: NodeArgs = parse_args("describe_node", args)?;
    let name = required(&args.node_name, "nodeName")?;
    let client = core_client(manager).await?;
    let node = client.get_node(name).await?;
    Ok(resources::describe_node(&node))
}

pub(super) async fn cordon_node(manager: &Arc<Manager>, args: Value) -> Result<String> {
    let args: NodeArgs = parse_args("cordon_node", args)?;
    let name = required(&args.node_name, "nodeName")?;
    let client = core_client(manager).await?;
    ActionExecutor::new(client.inner_client()).set_unschedulable(name, true).await?;
    Ok(format!("Node {name} has been marked as unschedulable"))
}

pub(super) async fn uncordon_node(manager: &Arc<Manager>, args: Value) -> Result<String> {
    let args: NodeArgs = parse_args("uncordon_node", args)?;
    let name = required(&args.node_name, "nodeName")?;
    let client = core_client(manager).await?;
    ActionExecutor::new(client.inner_client()).set_unschedulable(name, false).await?;
    Ok(format!("Node {name} has been marked as schedulable"))
}
