use std::collections::BTreeMap;
use std::time::Duration;

use k8s_openapi::api::core::v1::Node;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

use crate::resource::{calculate_age, format_duration, map_fields, render_sections, DetailSection, ResourceSummary};

#[derive(Debug, Clone)]
pub struct NodeSummary {
    pub name: String,
    pub status: String,
    pub roles: String,
    pub age: Duration,
    pub version: String,
    pub schedulable: bool,
}

impl ResourceSummary for NodeSummary {
    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> Option<&str> {
        None
    }

    fn columns(&self) -> Vec<(&str, String)> {
        vec![
            ("NAME", self.name.clone()),
            ("STATUS", self.status_display()),
            ("ROLES", self.roles.clone()),
            ("AGE", format_duration(self.age)),
            ("VERSION", self.version.clone()),
        ]
    }

    fn detail_sections(&self) -> Vec<DetailSection> {
        vec![
            DetailSection {
                title: "Metadata".into(),
                fields: vec![
                    ("Name".into(), self.name.clone()),
                    ("Roles".into(), self.roles.clone()),
                    ("Age".into(), format_duration(self.age)),
                ],
            },
            DetailSection {
                title: "Status".into(),
                fields: vec![
                    ("Status".into(), self.status.clone()),
                    ("Schedulable".into(), self.schedulable.to_string()),
                ],
            },
            DetailSection { title: "Info".into(), fields: vec![("Version".into(), self.version.clone())] },
        ]
    }
}

impl NodeSummary {
    /// `Ready,SchedulingDisabled` for cordoned nodes, like kubectl.
    pub fn status_display(&self) -> String {
        if self.schedulable {
            self.status.clone()
        } else {
            format!("{},SchedulingDisabled", self.status)
        }
    }
}

impl From<&Node> for NodeSummary {
    fn from(node: &Node) -> Self {
        let meta = &node.metadata;
        let name = meta.name.clone().unwrap_or_default();

        let status = node
            .status
            .as_ref()
            .and_then(|s| s.conditions.as_ref())
            .and_then(|conditions| {
                conditions.iter().find(|c| c.type_ == "Ready").map(|c| {
                    if c.status == "True" {
                        "Ready".to_string()
                    } else {
                        "NotReady".to_string()
                    }
                })
            })
            .unwrap_or_else(|| "Unknown".into());

        let roles = meta
            .labels
            .as_ref()
            .map(|labels| {
                let mut roles: Vec<&str> =
                    labels.keys().filter_map(|k| k.strip_prefix("node-role.kubernetes.io/")).collect();
                roles.sort();
                if roles.is_empty() {
                    "<none>".to_string()
                } else {
                    roles.join(",")
                }
            })
            .unwrap_or_else(|| "<none>".into());

        let version = node
            .status
            .as_ref()
            .and_then(|s| s.node_info.as_ref())
            .map(|info| info.kubelet_version.clone())
            .unwrap_or_default();

        let age = calculate_age(meta.creation_timestamp.as_ref());
        let schedulable = !node.spec.as_ref().and_then(|s| s.unschedulable).unwrap_or(false);

        Self { name, status, roles, age, version, schedulable }
    }
}

impl From<Node> for NodeSummary {
    fn from(n: Node) -> Self {
        Self::from(&n)
    }
}

pub fn describe_node(node: &Node) -> String {
    let summary = NodeSummary::from(node);
    let mut sections = summary.detail_sections();

    sections.push(DetailSection::new("Labels", map_fields(node.metadata.labels.as_ref())));

    let status = node.status.as_ref();
    let addresses: Vec<(String, String)> = status
        .and_then(|s| s.addresses.as_ref())
        .map(|addrs| addrs.iter().map(|a| (a.type_.clone(), a.address.clone())).collect())
        .unwrap_or_default();
    sections.push(DetailSection::new("Addresses", addresses));

    sections.push(DetailSection::new("Capacity", quantities(status.and_then(|s| s.capacity.as_ref()))));
    sections.push(DetailSection::new("Allocatable", quantities(status.and_then(|s| s.allocatable.as_ref()))));

    let taints: Vec<(String, String)> = node
        .spec
        .as_ref()
        .and_then(|s| s.taints.as_ref())
        .filter(|t| !t.is_empty())
        .map(|taints| {
            taints
                .iter()
                .map(|t| {
                    let value = t.value.as_deref().map(|v| format!("={v}")).unwrap_or_default();
                    (format!("{}{value}", t.key), t.effect.clone())
                })
                .collect()
        })
        .unwrap_or_else(|| vec![("<none>".into(), String::new())]);
    sections.push(DetailSection::new("Taints", taints));

    let conditions: Vec<(String, String)> = status
        .and_then(|s| s.conditions.as_ref())
        .map(|conds| {
            conds
                .iter()
                .map(|c| (c.type_.clone(), format!("{} ({})", c.status, c.reason.clone().unwrap_or_default())))
                .collect()
        })
        .unwrap_or_default();
    sections.push(DetailSection::new("Conditions", conditions));

    if let Some(info) = status.and_then(|s| s.node_info.as_ref()) {
        sections.push(DetailSection::new(
            "System Info",
            vec![
                ("OS Image".into(), info.os_image.clone()),
                ("Kernel Version".into(), info.kernel_version.clone()),
                ("Container Runtime".into(), info.container_runtime_version.clone()),
                ("Kubelet Version".into(), info.kubelet_version.clone()),
                ("Architecture".into(), info.architecture.clone()),
            ],
        ));
    }

    render_sections(&format!("Node {}", summary.name), &sections)
}

fn quantities(map: Option<&BTreeMap<String, Quantity>>) -> Vec<(String, String)> {
    map.map(|m| m.iter().map(|(k, v)| (k.clone(), v.0.clone())).collect()).unwrap_or_default()
}
