pub mod actions;
pub mod cache;
pub mod client;
pub mod context;
pub mod error;
pub mod exec;
pub mod kubeconfig;
pub mod manager;
pub mod resource;
pub mod resources;
pub mod workload;

#[cfg(test)]
mod test_support;

pub use actions::ActionExecutor;
pub use cache::{ClientCache, ClientKind, ClientTarget};
pub use client::{KubeClient, KubeClientFactory};
pub use context::ContextResolver;
pub use error::ConnectionError;
pub use exec::ExecOutput;
pub use kubeconfig::{ConfigLocation, KubeconfigDocument, KubeconfigStore};
pub use manager::{ClientFactory, ConnectionManager, ContextInfo, ContextListing, LocationChange, SwitchOutcome};
pub use resource::{DetailSection, ResourceSummary};
pub use workload::{WorkloadClient, WorkloadKind};
