mod configmap;
mod node;
mod pod;
mod workload;

pub use configmap::{describe_configmap, ConfigMapSummary};
pub use node::{describe_node, NodeSummary};
pub use pod::{describe_pod, PodPhase, PodSummary};
pub use workload::{describe_workload, WorkloadSummary};
