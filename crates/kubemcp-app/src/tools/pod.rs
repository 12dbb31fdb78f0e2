use std::sync::Arc;

use anyhow::Result;
use kubemcp_core::exec;
use kubemcp_core::resource::render_table;
use kubemcp_core::resources;
use kubemcp_core::ActionExecutor;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::{core_client, input_schema, list_scope, namespace_or_default, parse_args, required, Manager, ToolDef};

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
struct ListPodsArgs {
    /// Namespace to list, defaults to 'default'
    namespace: String,
    /// Label selector, e.g. app=web
    label_selector: String,
    /// List pods in every namespace
    all_namespaces: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct DescribePodArgs {
    /// Namespace of the pod, defaults to 'default'
    #[serde(default)]
    namespace: String,
    /// Name of the pod
    pod_name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct PodLogsArgs {
    /// Namespace of the pod, defaults to 'default'
    #[serde(default)]
    namespace: String,
    /// Name of the pod
    pod_name: String,
    /// Container name, defaults to the pod's last container
    #[serde(default)]
    container: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct DeletePodArgs {
    /// Namespace of the pod, defaults to 'default'
    #[serde(default)]
    namespace: String,
    /// Name of the pod
    pod_name: String,
    /// Delete immediately with a zero grace period
    #[serde(default)]
    force: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ExecArgs {
    /// Namespace of the pod, defaults to 'default'
    #[serde(default)]
    namespace: String,
    /// Name of the pod
    pod_name: String,
    /// Command line passed to /bin/sh -c
    command: String,
}

pub(super) fn definitions() -> Vec<ToolDef> {
    vec![
        ToolDef::new(
            "list_pods",
            "List Pods in a namespace or across all namespaces",
            input_schema::<ListPodsArgs>(),
        ),
        ToolDef::new("describe_pod", "Describe a Pod, including recent events", input_schema::<DescribePodArgs>()),
        ToolDef::new("get_pod_logs", "Get Pod Logs", input_schema::<PodLogsArgs>()),
        ToolDef::new("delete_pod", "Delete a Pod", input_schema::<DeletePodArgs>()),
        ToolDef::new("exec_command_in_pod", "Execute a shell command in a Pod", input_schema::<ExecArgs>()),
    ]
}

pub(super) async fn list_pods(manager: &Arc<Manager>, args: Value) -> Result<String> {
    let args: ListPodsArgs = parse_args("list_pods", args)?;
    let scope = list_scope(&args.namespace, args.all_namespaces);

    let client = core_client(manager).await?;
    let pods = client.list_pods(scope, Some(args.label_selector.as_str())).await?;
    Ok(render_table(&pods))
}

pub(super) async fn describe_pod(manager: &Arc<Manager>, args: Value) -> Result<String> {
    let args: DescribePodArgs = parse_args("describe_pod", args)?;
    let name = required(&args.pod_name, "podName")?;
    let namespace = namespace_or_default(&args.namespace);

    let client = core_client(manager).await?;
    let (pod, events) = client.pod_with_events(namespace, name).await?;
    Ok(resources::describe_pod(&pod, &events))
}

pub(super) async fn get_pod_logs(manager: &Arc<Manager>, args: Value) -> Result<String> {
    let args: PodLogsArgs = parse_args("get_pod_logs", args)?;
    let name = required(&args.pod_name, "podName")?;
    let namespace = namespace_or_default(&args.namespace);

    let client = core_client(manager).await?;
    client.pod_logs(namespace, name, Some(args.container.as_str())).await
}

pub(super) async fn delete_pod(manager: &Arc<Manager>, args: Value) -> Result<String> {
    let args: DeletePodArgs = parse_args("delete_pod", args)?;
    let name = required(&args.pod_name, "podName")?;
    let namespace = namespace_or_default(&args.namespace);

    let client = core_client(manager).await?;
    ActionExecutor::new(client.inner_client()).delete_pod(namespace, name, args.force).await?;
    Ok(format!("Pod {name} in namespace {namespace} successfully deleted"))
}

pub(super) async fn exec_command_in_pod(manager: &Arc<Manager>, args: Value) -> Result<String> {
    let args: ExecArgs = parse_args("exec_command_in_pod", args)?;
    let name = required(&args.pod_name, "podName")?;
    let command = required(&args.command, "command")?;
    let namespace = namespace_or_default(&args.namespace);

    let client = core_client(manager).await?;
    let output = exec::run_command(client.inner_client(), namespace, name, command).await?;
    Ok(output.render())
}
