use std::collections::BTreeMap;
use std::time::Duration;

use jiff::Timestamp;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

pub const NO_RESOURCES: &str = "No resources found";

#[derive(Debug, Clone)]
pub struct DetailSection {
    pub title: String,
    pub fields: Vec<(String, String)>,
}

impl DetailSection {
    pub fn new(title: impl Into<String>, fields: Vec<(String, String)>) -> Self {
        Self { title: title.into(), fields }
    }
}

pub trait ResourceSummary: Send + Sync {
    fn name(&self) -> &str;
    fn namespace(&self) -> Option<&str>;
    fn columns(&self) -> Vec<(&str, String)>;
    fn detail_sections(&self) -> Vec<DetailSection>;
}

pub fn calculate_age(creation: Option<&Time>) -> Duration {
    creation
        .and_then(|ts| {
            let diff = Timestamp::now().since(ts.0).ok()?;
            Some(Duration::from_secs(diff.get_seconds().unsigned_abs()))
        })
        .unwrap_or_default()
}

pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86400 {
        format!("{}h", secs / 3600)
    } else {
        format!("{}d", secs / 86400)
    }
}

pub fn format_time(time: Option<&Time>) -> String {
    time.map(|t| t.0.strftime("%Y-%m-%d %H:%M:%S").to_string()).unwrap_or_else(|| "<unknown>".into())
}

/// Map entries as detail fields, `<none>` when empty.
pub fn map_fields(map: Option<&BTreeMap<String, String>>) -> Vec<(String, String)> {
    match map {
        Some(m) if !m.is_empty() => m.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        _ => vec![("<none>".into(), String::new())],
    }
}

/// Tab separated table with a header row taken from the first item.
pub fn render_table<S: ResourceSummary>(items: &[S]) -> String {
    let Some(first) = items.first() else {
        return NO_RESOURCES.to_string();
    };

    let header: Vec<String> = first.columns().into_iter().map(|(h, _)| h.to_string()).collect();
    let mut out = header.join("\t");
    out.push('\n');
    for item in items {
        let row: Vec<String> = item.columns().into_iter().map(|(_, v)| v).collect();
        out.push_str(&row.join("\t"));
        out.push('\n');
    }
    out
}

pub fn render_sections(title: &str, sections: &[DetailSection]) -> String {
    let mut out = format!("{title}\n");
    for section in sections {
        out.push_str(&format!("\n{}:\n", section.title));
        for (key, value) in &section.fields {
            if value.is_empty() {
                out.push_str(&format!("  {key}\n"));
            } else {
                out.push_str(&format!("  {key}: {value}\n"));
            }
        }
    }
    out
}
