use std::sync::Arc;

use anyhow::Result;
use kubemcp_core::resource::{render_table, NO_RESOURCES};
use kubemcp_core::resources;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::{core_client, input_schema, namespace_or_default, parse_args, required, Manager, ToolDef};

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
struct ListConfigMapsArgs {
    /// Namespace to list, empty for all namespaces
    namespace: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ConfigMapArgs {
    /// Namespace of the ConfigMap, defaults to 'default'
    #[serde(default)]
    namespace: String,
    /// Name of the ConfigMap
    config_map_name: String,
}

pub(super) fn definitions() -> Vec<ToolDef> {
    vec![
        ToolDef::new("list_configmaps", "List ConfigMaps", input_schema::<ListConfigMapsArgs>()),
        ToolDef::new("get_configmap", "Get ConfigMap content", input_schema::<ConfigMapArgs>()),
    ]
}

pub(super) async fn list_configmaps(manager: &Arc<Manager>, args: Value) -> Result<String> {
    let args: ListConfigMapsArgs = parse_args("list_configmaps", args)?;
    let namespace = Some(args.namespace.trim()).filter(|ns| !ns.is_empty());

    let client = core_client(manager).await?;
    let configmaps = client.list_configmaps(namespace).await?;
    if configmaps.is_empty() {
        return Ok(NO_RESOURCES.to_string());
    }

    let heading = match namespace {
        Some(ns) => format!("ConfigMaps in namespace {ns}:"),
        None => "ConfigMaps across all namespaces:".to_string(),
    };
    Ok(format!("{heading}\n\n{}", render_table(&configmaps)))
}

pub(super) async fn get_configmap(manager: &Arc<Manager>, args: Value) -> Result<String> {
    let args: ConfigMapArgs = parse_args("get_configmap", args)?;
    let name = required(&args.config_map_name, "configMapName")?;
    let namespace = namespace_or_default(&args.namespace);

    let client = core_client(manager).await?;
    let cm = client.get_configmap(namespace, name).await?;
    Ok(resources::describe_configmap(&cm))
}
