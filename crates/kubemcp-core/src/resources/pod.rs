use std::fmt;
use std::time::Duration;

use k8s_openapi::api::core::v1::{Event, Pod};

use crate::resource::{
    calculate_age, format_duration, format_time, map_fields, render_sections, DetailSection, ResourceSummary,
};

#[derive(Debug, Clone, PartialEq)]
pub enum PodPhase {
    Running,
    Pending,
    Succeeded,
    Failed,
    Unknown,
}

impl fmt::Display for PodPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "Running"),
            Self::Pending => write!(f, "Pending"),
            Self::Succeeded => write!(f, "Succeeded"),
            Self::Failed => write!(f, "Failed"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PodSummary {
    pub name: String,
    pub namespace: String,
    pub uid: Option<String>,
    pub status: PodPhase,
    pub ready: String,
    pub restarts: i32,
    pub age: Duration,
    pub node: Option<String>,
}

impl ResourceSummary for PodSummary {
    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> Option<&str> {
        Some(&self.namespace)
    }

    fn columns(&self) -> Vec<(&str, String)> {
        vec![
            ("NAMESPACE", self.namespace.clone()),
            ("NAME", self.name.clone()),
            ("READY", self.ready.clone()),
            ("STATUS", self.status.to_string()),
            ("RESTARTS", self.restarts.to_string()),
            ("AGE", format_duration(self.age)),
            ("NODE", self.node.clone().unwrap_or_else(|| "<none>".into())),
        ]
    }

    fn detail_sections(&self) -> Vec<DetailSection> {
        let mut metadata = vec![
            ("Name".into(), self.name.clone()),
            ("Namespace".into(), self.namespace.clone()),
            ("Status".into(), self.status.to_string()),
            ("Age".into(), format_duration(self.age)),
        ];
        if let Some(node) = &self.node {
            metadata.push(("Node".into(), node.clone()));
        }
        if let Some(uid) = &self.uid {
            metadata.push(("UID".into(), uid.clone()));
        }

        let status_section = vec![("Ready".into(), self.ready.clone()), ("Restarts".into(), self.restarts.to_string())];

        vec![
            DetailSection { title: "Metadata".into(), fields: metadata },
            DetailSection { title: "Status".into(), fields: status_section },
        ]
    }
}

impl From<&Pod> for PodSummary {
    fn from(pod: &Pod) -> Self {
        let metadata = &pod.metadata;
        let name = metadata.name.clone().unwrap_or_default();
        let namespace = metadata.namespace.clone().unwrap_or_else(|| "default".into());
        let uid = metadata.uid.clone();

        let status = pod
            .status
            .as_ref()
            .and_then(|s| s.phase.as_deref())
            .map(|p| match p {
                "Running" => PodPhase::Running,
                "Pending" => PodPhase::Pending,
                "Succeeded" => PodPhase::Succeeded,
                "Failed" => PodPhase::Failed,
                _ => PodPhase::Unknown,
            })
            .unwrap_or(PodPhase::Unknown);

        let container_statuses = pod.status.as_ref().and_then(|s| s.container_statuses.as_ref());

        let (ready_count, total_count) = container_statuses
            .map(|cs| {
                let total = cs.len();
                let ready = cs.iter().filter(|c| c.ready).count();
                (ready, total)
            })
            .unwrap_or((0, 0));
        let ready = format!("{ready_count}/{total_count}");

        let restarts = container_statuses.map(|cs| cs.iter().map(|c| c.restart_count).sum()).unwrap_or(0);

        let age = calculate_age(metadata.creation_timestamp.as_ref());

        let node = pod.spec.as_ref().and_then(|s| s.node_name.clone());

        Self { name, namespace, uid, status, ready, restarts, age, node }
    }
}

impl From<Pod> for PodSummary {
    fn from(pod: Pod) -> Self {
        Self::from(&pod)
    }
}

/// `kubectl describe`-style text for a pod and its events.
pub fn describe_pod(pod: &Pod, events: &[Event]) -> String {
    let summary = PodSummary::from(pod);
    let mut sections = summary.detail_sections();

    sections.push(DetailSection::new("Labels", map_fields(pod.metadata.labels.as_ref())));
    sections.push(DetailSection::new("Annotations", map_fields(pod.metadata.annotations.as_ref())));

    let pod_ip = pod.status.as_ref().and_then(|s| s.pod_ip.clone()).unwrap_or_else(|| "<none>".into());
    sections.push(DetailSection::new(
        "Network",
        vec![("IP".into(), pod_ip), ("Started".into(), format_time(pod.status.as_ref().and_then(|s| s.start_time.as_ref())))],
    ));

    let statuses = pod.status.as_ref().and_then(|s| s.container_statuses.as_ref());
    let containers = pod
        .spec
        .as_ref()
        .map(|spec| {
            spec.containers
                .iter()
                .map(|c| {
                    let status = statuses.and_then(|cs| cs.iter().find(|s| s.name == c.name));
                    let state = status.map(container_state).unwrap_or_else(|| "Unknown".into());
                    let ready = status.map(|s| s.ready).unwrap_or(false);
                    let restarts = status.map(|s| s.restart_count).unwrap_or(0);
                    let image = c.image.clone().unwrap_or_default();
                    (c.name.clone(), format!("{image} ({state}, ready={ready}, restarts={restarts})"))
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    sections.push(DetailSection::new("Containers", containers));

    let conditions: Vec<(String, String)> = pod
        .status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .map(|conds| conds.iter().map(|c| (c.type_.clone(), c.status.clone())).collect())
        .unwrap_or_default();
    sections.push(DetailSection::new("Conditions", conditions));

    let events = if events.is_empty() {
        vec![("<none>".into(), String::new())]
    } else {
        events
            .iter()
            .map(|e| {
                let kind = e.type_.clone().unwrap_or_else(|| "Normal".into());
                let reason = e.reason.clone().unwrap_or_default();
                let age = format_duration(calculate_age(e.last_timestamp.as_ref()));
                (format!("{kind} {reason} ({age} ago)"), e.message.clone().unwrap_or_default())
            })
            .collect()
    };
    sections.push(DetailSection::new("Events", events));

    render_sections(&format!("Pod {}/{}", summary.namespace, summary.name), &sections)
}

fn container_state(status: &k8s_openapi::api::core::v1::ContainerStatus) -> String {
    let Some(state) = status.state.as_ref() else {
        return "Unknown".into();
    };
    if state.running.is_some() {
        "Running".into()
    } else if let Some(waiting) = &state.waiting {
        format!("Waiting: {}", waiting.reason.clone().unwrap_or_default())
    } else if let Some(terminated) = &state.terminated {
        format!("Terminated: {}", terminated.reason.clone().unwrap_or_default())
    } else {
        "Unknown".into()
    }
}
