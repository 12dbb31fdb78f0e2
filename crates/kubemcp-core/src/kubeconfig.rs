use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{ConnectionError, Result};

/// Where the kubeconfig document lives. Process-wide; changes only when the
/// operator sets a new path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigLocation {
    #[default]
    Default,
    Custom(PathBuf),
}

impl ConfigLocation {
    pub fn path(&self) -> PathBuf {
        match self {
            Self::Default => default_kubeconfig_path(),
            Self::Custom(path) => path.clone(),
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl fmt::Display for ConfigLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default kubeconfig path ({})", default_kubeconfig_path().display()),
            Self::Custom(path) => write!(f, "{}", path.display()),
        }
    }
}

/// First non-empty `KUBECONFIG` entry, else `~/.kube/config`.
pub fn default_kubeconfig_path() -> PathBuf {
    if let Some(paths) = std::env::var_os("KUBECONFIG") {
        if let Some(first) = std::env::split_paths(&paths).find(|p| !p.as_os_str().is_empty()) {
            return first;
        }
    }
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/root")).join(".kube").join("config")
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A kubeconfig file. Only the fields this crate reads are typed; everything
/// else is carried in `extra` so a rewrite keeps it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct KubeconfigDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    pub clusters: Vec<NamedEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub users: Vec<NamedEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub contexts: Vec<NamedContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_context: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedEntry {
    pub name: String,
    #[serde(flatten)]
    pub body: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedContext {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub context: ContextFields,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl KubeconfigDocument {
    /// At least one cluster, one context and one user.
    pub fn is_valid(&self) -> bool {
        !self.clusters.is_empty() && !self.contexts.is_empty() && !self.users.is_empty()
    }

    pub fn validate(&self, operation: &'static str, path: &Path) -> Result<()> {
        if self.is_valid() {
            return Ok(());
        }
        Err(ConnectionError::Validation {
            operation,
            path: path.to_path_buf(),
            clusters: self.clusters.len(),
            contexts: self.contexts.len(),
            users: self.users.len(),
        })
    }

    /// The declared current context, treating an empty string as unset.
    pub fn current_context(&self) -> Option<&str> {
        self.current_context.as_deref().filter(|name| !name.is_empty())
    }

    pub fn set_current_context(&mut self, name: &str) {
        self.current_context = Some(name.to_string());
    }

    pub fn context(&self, name: &str) -> Option<&NamedContext> {
        self.contexts.iter().find(|c| c.name == name)
    }

    pub fn has_context(&self, name: &str) -> bool {
        self.context(name).is_some()
    }

    /// Lexicographically smallest context name; stable for a given document.
    pub fn first_context_name(&self) -> Option<&str> {
        self.contexts.iter().map(|c| c.name.as_str()).min()
    }
}

/// Reads and rewrites kubeconfig documents. The read and write counters let
/// callers observe how often the file is touched.
#[derive(Debug, Default)]
pub struct KubeconfigStore {
    reads: AtomicUsize,
    writes: AtomicUsize,
    #[cfg(test)]
    fail_writes: std::sync::atomic::AtomicBool,
}

impl KubeconfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self, operation: &'static str, path: &Path) -> Result<KubeconfigDocument> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        debug!(path = %path.display(), operation, "reading kubeconfig");

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ConnectionError::ConfigNotFound { operation, path: path.to_path_buf() });
            }
            Err(source) => return Err(ConnectionError::Read { operation, path: path.to_path_buf(), source }),
        };

        if contents.trim().is_empty() {
            return Ok(KubeconfigDocument::default());
        }

        serde_yaml::from_str(&contents).map_err(|source| ConnectionError::Parse {
            operation,
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load_valid(&self, operation: &'static str, path: &Path) -> Result<KubeconfigDocument> {
        let doc = self.load(operation, path)?;
        doc.validate(operation, path)?;
        debug!(
            path = %path.display(),
            clusters = doc.clusters.len(),
            contexts = doc.contexts.len(),
            users = doc.users.len(),
            "kubeconfig is valid"
        );
        Ok(doc)
    }

    /// Replaces the file wholesale through a temp file and rename, keeping the
    /// existing permissions. A symlinked path is followed so the rename lands on
    /// the link target and the link itself survives.
    pub fn persist(&self, operation: &'static str, path: &Path, doc: &KubeconfigDocument) -> Result<()> {
        let fail = |message: String| ConnectionError::Persist { operation, path: path.to_path_buf(), message };

        if self.writes_disabled() {
            return Err(fail("writes disabled".into()));
        }

        let target = match fs::canonicalize(path) {
            Ok(resolved) => resolved,
            Err(e) if e.kind() == io::ErrorKind::NotFound => path.to_path_buf(),
            Err(e) => return Err(fail(e.to_string())),
        };

        let contents = serde_yaml::to_string(doc).map_err(|e| fail(e.to_string()))?;
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| fail(e.to_string()))?;
        tmp.write_all(contents.as_bytes()).map_err(|e| fail(e.to_string()))?;
        tmp.as_file().sync_all().map_err(|e| fail(e.to_string()))?;
        if let Ok(meta) = fs::metadata(&target) {
            tmp.as_file().set_permissions(meta.permissions()).map_err(|e| fail(e.to_string()))?;
        }
        tmp.persist(&target).map_err(|e| fail(e.error.to_string()))?;

        self.writes.fetch_add(1, Ordering::Relaxed);
        debug!(path = %path.display(), target = %target.display(), operation, "kubeconfig written");
        Ok(())
    }

    /// Makes every later `persist` fail without touching the file.
    #[cfg(test)]
    pub(crate) fn fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::Relaxed);
    }

    #[cfg(test)]
    fn writes_disabled(&self) -> bool {
        self.fail_writes.load(Ordering::Relaxed)
    }

    #[cfg(not(test))]
    fn writes_disabled(&self) -> bool {
        false
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }
}
