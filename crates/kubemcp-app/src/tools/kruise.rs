use std::sync::Arc;

use anyhow::Result;
use kubemcp_core::resource::render_table;
use kubemcp_core::resources::describe_workload;
use kubemcp_core::WorkloadKind;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::{input_schema, list_scope, namespace_or_default, parse_args, required, workload_client, Manager, ToolDef};

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
struct NamespaceArgs {
    /// Namespace of the resource, defaults to 'default'
    namespace: String,
    /// Whether to list resources in all namespaces
    all_namespaces: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct DescribeArgs {
    /// Namespace of the resource, defaults to 'default'
    #[serde(default)]
    namespace: String,
    /// Name of the resource
    name: String,
}

/// Clients send the replica count either as a number or as a string.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(untagged)]
enum Replicas {
    Number(i64),
    Text(String),
}

impl Replicas {
    fn value(&self) -> Result<i32> {
        let n = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse().map_err(|_| anyhow::anyhow!("invalid replicas value '{s}'"))?,
        };
        anyhow::ensure!(n >= 0, "replicas must not be negative, got {n}");
        i32::try_from(n).map_err(|_| anyhow::anyhow!("replicas value {n} is out of range"))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ScaleArgs {
    /// Resource type, 'cloneset' or 'advancedstatefulset'
    resource_type: String,
    /// Namespace of the resource, defaults to 'default'
    #[serde(default)]
    namespace: String,
    /// Name of the resource to scale
    resource_name: String,
    /// Number of replicas to scale to
    replicas: Replicas,
}

pub(super) fn definitions() -> Vec<ToolDef> {
    vec![
        ToolDef::new("list_clonesets", "List OpenKruise CloneSets", input_schema::<NamespaceArgs>()),
        ToolDef::new(
            "list_advanced_statefulsets",
            "List OpenKruise Advanced StatefulSets",
            input_schema::<NamespaceArgs>(),
        ),
        ToolDef::new("describe_cloneset", "Describe an OpenKruise CloneSet", input_schema::<DescribeArgs>()),
        ToolDef::new(
            "describe_advanced_statefulset",
            "Describe an OpenKruise Advanced StatefulSet",
            input_schema::<DescribeArgs>(),
        ),
        ToolDef::new("scale_kruise_resource", "Scale OpenKruise Resource Replicas", input_schema::<ScaleArgs>()),
        ToolDef::new("scale", "Scale OpenKruise Resource Replicas", input_schema::<ScaleArgs>()),
    ]
}

async fn list(manager: &Arc<Manager>, kind: WorkloadKind, tool: &str, args: Value) -> Result<String> {
    let args: NamespaceArgs = parse_args(tool, args)?;
    let scope = list_scope(&args.namespace, args.all_namespaces);

    let client = workload_client(manager).await?;
    let items = client.list(kind, scope).await?;
    if items.is_empty() {
        return Ok(match scope {
            Some(ns) => format!("No {kind}s found in namespace {ns}"),
            None => format!("No {kind}s found"),
        });
    }
    Ok(render_table(&items))
}

async fn describe(manager: &Arc<Manager>, kind: WorkloadKind, tool: &str, args: Value) -> Result<String> {
    let args: DescribeArgs = parse_args(tool, args)?;
    let name = required(&args.name, "name")?;
    let namespace = namespace_or_default(&args.namespace);

    let client = workload_client(manager).await?;
    let obj = client.get(kind, namespace, name).await?;
    Ok(describe_workload(kind.display_name(), &obj))
}

pub(super) async fn list_clonesets(manager: &Arc<Manager>, args: Value) -> Result<String> {
    list(manager, WorkloadKind::CloneSet, "list_clonesets", args).await
}

pub(super) async fn list_advanced_statefulsets(manager: &Arc<Manager>, args: Value) -> Result<String> {
    list(manager, WorkloadKind::AdvancedStatefulSet, "list_advanced_statefulsets", args).await
}

pub(super) async fn describe_cloneset(manager: &Arc<Manager>, args: Value) -> Result<String> {
    describe(manager, WorkloadKind::CloneSet, "describe_cloneset", args).await
}

pub(super) async fn describe_advanced_statefulset(manager: &Arc<Manager>, args: Value) -> Result<String> {
    describe(manager, WorkloadKind::AdvancedStatefulSet, "describe_advanced_statefulset", args).await
}

/// Backs both `scale_kruise_resource` and `scale`.
pub(super) async fn scale(manager: &Arc<Manager>, tool: &str, args: Value) -> Result<String> {
    let args: ScaleArgs = parse_args(tool, args)?;
    let kind: WorkloadKind = required(&args.resource_type, "resourceType")?.parse()?;
    let name = required(&args.resource_name, "resourceName")?;
    let namespace = namespace_or_default(&args.namespace);
    let replicas = args.replicas.value()?;

    let client = workload_client(manager).await?;
    client.scale(kind, namespace, name, replicas).await?;
    Ok(format!("Successfully scaled {kind} {name} in namespace {namespace} to {replicas} replicas"))
}
