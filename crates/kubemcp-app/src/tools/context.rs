use std::fmt::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use kubemcp_core::{ConfigLocation, ContextListing};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::{input_schema, parse_args, required, Manager, NoArgs, ToolDef};

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct KubeconfigPathArgs {
    /// Path to the kubeconfig file
    kubeconfig_path: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ContextNameArgs {
    /// Name of the context to switch to
    context_name: String,
}

pub(super) fn definitions() -> Vec<ToolDef> {
    vec![
        ToolDef::new("set_kubeconfig_path", "Set Custom Kubeconfig File Path", input_schema::<KubeconfigPathArgs>()),
        ToolDef::new("get_current_context", "Get Current Kubernetes Context", input_schema::<NoArgs>()),
        ToolDef::new("list_contexts", "List All Available Kubernetes Contexts", input_schema::<NoArgs>()),
        ToolDef::new("switch_context", "Switch to Specified Kubernetes Context", input_schema::<ContextNameArgs>()),
    ]
}

/// Runs `op` on the blocking pool; these paths read and rewrite the kubeconfig.
pub(super) async fn blocking<T, F>(manager: &Arc<Manager>, op: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&Manager) -> Result<T> + Send + 'static,
{
    let manager = Arc::clone(manager);
    tokio::task::spawn_blocking(move || op(&manager)).await?
}

pub(super) async fn set_kubeconfig_path(manager: &Arc<Manager>, args: Value) -> Result<String> {
    let args: KubeconfigPathArgs = parse_args("set_kubeconfig_path", args)?;
    let path = PathBuf::from(required(&args.kubeconfig_path, "kubeconfigPath")?);

    let change = blocking(manager, move |m| Ok(m.set_location(ConfigLocation::Custom(path))?)).await?;
    Ok(format!("Kubeconfig path has been set to {}, current context: {}", change.location, change.context))
}

pub(super) async fn get_current_context(manager: &Arc<Manager>, args: Value) -> Result<String> {
    let _: NoArgs = parse_args("get_current_context", args)?;
    let context = blocking(manager, |m| Ok(m.current_context()?)).await?;
    Ok(format!("Current context: {context}"))
}

pub(super) async fn list_contexts(manager: &Arc<Manager>, args: Value) -> Result<String> {
    let _: NoArgs = parse_args("list_contexts", args)?;
    let listing = blocking(manager, |m| Ok(m.list_contexts()?)).await?;
    Ok(render_listing(&listing))
}

pub(super) async fn switch_context(manager: &Arc<Manager>, args: Value) -> Result<String> {
    let args: ContextNameArgs = parse_args("switch_context", args)?;
    let name = required(&args.context_name, "contextName")?.to_string();
    let outcome = blocking(manager, move |m| Ok(m.switch_to(&name)?)).await?;
    Ok(outcome.to_string())
}

fn render_listing(listing: &ContextListing) -> String {
    let mut out = format!("Available Kubernetes contexts ({}):\n", listing.location);
    out.push_str("----------------------------\n");
    for ctx in &listing.contexts {
        let marker = if ctx.active { '*' } else { ' ' };
        let _ = write!(out, "{marker} {} (cluster: {}, user: {}", ctx.name, ctx.cluster, ctx.user);
        if !ctx.namespace.is_empty() {
            let _ = write!(out, ", namespace: {}", ctx.namespace);
        }
        out.push_str(")\n");
    }
    out
}
