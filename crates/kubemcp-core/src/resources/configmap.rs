use std::time::Duration;

use k8s_openapi::api::core::v1::ConfigMap;

use crate::resource::{calculate_age, format_duration, format_time, map_fields, DetailSection, ResourceSummary};

#[derive(Debug, Clone)]
pub struct ConfigMapSummary {
    pub name: String,
    pub namespace: String,
    pub data_count: usize,
    pub age: Duration,
}

impl ResourceSummary for ConfigMapSummary {
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
            ("DATA", self.data_count.to_string()),
            ("AGE", format_duration(self.age)),
        ]
    }

    fn detail_sections(&self) -> Vec<DetailSection> {
        vec![
            DetailSection {
                title: "Metadata".into(),
                fields: vec![
                    ("Name".into(), self.name.clone()),
                    ("Namespace".into(), self.namespace.clone()),
                    ("Age".into(), format_duration(self.age)),
                ],
            },
            DetailSection { title: "Data".into(), fields: vec![("Keys".into(), self.data_count.to_string())] },
        ]
    }
}

impl From<&ConfigMap> for ConfigMapSummary {
    fn from(cm: &ConfigMap) -> Self {
        let meta = &cm.metadata;
        let name = meta.name.clone().unwrap_or_default();
        let namespace = meta.namespace.clone().unwrap_or_else(|| "default".into());
        let data_count = cm.data.as_ref().map(|d| d.len()).unwrap_or(0);
        let age = calculate_age(meta.creation_timestamp.as_ref());

        Self { name, namespace, data_count, age }
    }
}

impl From<ConfigMap> for ConfigMapSummary {
    fn from(c: ConfigMap) -> Self {
        Self::from(&c)
    }
}

/// Full content of a ConfigMap, values included.
pub fn describe_configmap(cm: &ConfigMap) -> String {
    let meta = &cm.metadata;
    let mut out = format!(
        "ConfigMap {} details in namespace {}:\nCreation Time: {}\n",
        meta.name.as_deref().unwrap_or_default(),
        meta.namespace.as_deref().unwrap_or("default"),
        format_time(meta.creation_timestamp.as_ref()),
    );

    for (title, map) in [("Labels", meta.labels.as_ref()), ("Annotations", meta.annotations.as_ref())] {
        out.push_str(&format!("\n{title}:\n"));
        for (k, v) in map_fields(map) {
            if v.is_empty() {
                out.push_str(&format!("  {k}\n"));
            } else {
                out.push_str(&format!("  {k}: {v}\n"));
            }
        }
    }

    out.push_str("\nData:");
    match cm.data.as_ref().filter(|d| !d.is_empty()) {
        None => out.push_str(" <none>\n"),
        Some(data) => {
            out.push('\n');
            for (k, v) in data {
                out.push_str(&format!("---\nKey: {k}\nValue:\n{v}\n---\n"));
            }
        }
    }

    if let Some(binary) = cm.binary_data.as_ref().filter(|d| !d.is_empty()) {
        out.push_str("\nBinary Data:\n");
        for k in binary.keys() {
            out.push_str(&format!("  {k}: <binary data>\n"));
        }
    }

    out
}
