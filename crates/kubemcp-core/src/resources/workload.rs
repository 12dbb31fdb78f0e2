use std::time::Duration;

use kube::core::DynamicObject;
use serde_json::Value;

use crate::resource::{calculate_age, format_duration, format_time, map_fields, render_sections, DetailSection, ResourceSummary};

/// Replica counts of an OpenKruise CloneSet or Advanced StatefulSet.
#[derive(Debug, Clone)]
pub struct WorkloadSummary {
    pub name: String,
    pub namespace: String,
    pub desired: i64,
    pub current: i64,
    pub ready: i64,
    pub updated: i64,
    pub available: i64,
    pub age: Duration,
}

fn count(obj: &DynamicObject, pointer: &str) -> i64 {
    obj.data.pointer(pointer).and_then(Value::as_i64).unwrap_or(0)
}

impl ResourceSummary for WorkloadSummary {
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
            ("DESIRED", self.desired.to_string()),
            ("CURRENT", self.current.to_string()),
            ("READY", self.ready.to_string()),
            ("UPDATED", self.updated.to_string()),
            ("AVAILABLE", self.available.to_string()),
            ("AGE", format_duration(self.age)),
        ]
    }

    fn detail_sections(&self) -> Vec<DetailSection> {
        vec![
            DetailSection::new(
                "Metadata",
                vec![
                    ("Name".into(), self.name.clone()),
                    ("Namespace".into(), self.namespace.clone()),
                    ("Age".into(), format_duration(self.age)),
                ],
            ),
            DetailSection::new(
                "Replicas",
                vec![
                    ("Desired".into(), self.desired.to_string()),
                    ("Current".into(), self.current.to_string()),
                    ("Ready".into(), self.ready.to_string()),
                    ("Updated".into(), self.updated.to_string()),
                    ("Available".into(), self.available.to_string()),
                ],
            ),
        ]
    }
}

impl From<&DynamicObject> for WorkloadSummary {
    fn from(obj: &DynamicObject) -> Self {
        let meta = &obj.metadata;
        Self {
            name: meta.name.clone().unwrap_or_default(),
            namespace: meta.namespace.clone().unwrap_or_else(|| "default".into()),
            desired: count(obj, "/spec/replicas"),
            current: count(obj, "/status/replicas"),
            ready: count(obj, "/status/readyReplicas"),
            updated: count(obj, "/status/updatedReplicas"),
            available: count(obj, "/status/availableReplicas"),
            age: calculate_age(meta.creation_timestamp.as_ref()),
        }
    }
}

pub fn describe_workload(kind: &str, obj: &DynamicObject) -> String {
    let summary = WorkloadSummary::from(obj);
    let meta = &obj.metadata;
    let mut sections = summary.detail_sections();

    sections[0].fields.push(("Created".into(), format_time(meta.creation_timestamp.as_ref())));
    sections.push(DetailSection::new("Labels", map_fields(meta.labels.as_ref())));

    let selector: Vec<(String, String)> = obj
        .data
        .pointer("/spec/selector/matchLabels")
        .and_then(Value::as_object)
        .filter(|m| !m.is_empty())
        .map(|m| m.iter().map(|(k, v)| (k.clone(), scalar(v))).collect())
        .unwrap_or_else(|| vec![("<none>".into(), String::new())]);
    sections.push(DetailSection::new("Selector", selector));

    let mut strategy = Vec::new();
    if let Some(update) = obj.data.pointer("/spec/updateStrategy").and_then(Value::as_object) {
        flatten("", update, &mut strategy);
    }
    if strategy.is_empty() {
        strategy.push(("<default>".into(), String::new()));
    }
    sections.push(DetailSection::new("Update Strategy", strategy));

    let conditions: Vec<(String, String)> = obj
        .data
        .pointer("/status/conditions")
        .and_then(Value::as_array)
        .map(|conds| {
            conds
                .iter()
                .map(|c| {
                    let field = |key: &str| c.get(key).map(scalar).unwrap_or_default();
                    let reason = field("reason");
                    let status = if reason.is_empty() { field("status") } else { format!("{} ({reason})", field("status")) };
                    (field("type"), status)
                })
                .collect()
        })
        .unwrap_or_default();
    sections.push(DetailSection::new("Conditions", conditions));

    render_sections(&format!("{kind} {}/{}", summary.namespace, summary.name), &sections)
}

fn scalar(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Nested objects become dotted keys: `rollingUpdate.partition`.
fn flatten(prefix: &str, map: &serde_json::Map<String, Value>, out: &mut Vec<(String, String)>) {
    for (key, value) in map {
        let key = if prefix.is_empty() { key.clone() } else { format!("{prefix}.{key}") };
        match value {
            Value::Object(inner) => flatten(&key, inner, out),
            other => out.push((key, scalar(other))),
        }
    }
}
