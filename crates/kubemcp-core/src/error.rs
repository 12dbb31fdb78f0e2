use std::path::PathBuf;

use thiserror::Error;

/// Failures of the connection manager. Every message names the operation, the
/// offending path or context and the underlying cause.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("{operation}: kubeconfig file does not exist: {}", path.display())]
    ConfigNotFound { operation: &'static str, path: PathBuf },

    #[error("{operation}: context '{context}' does not exist in kubeconfig {}", path.display())]
    ContextNotFound { operation: &'static str, context: String, path: PathBuf },

    #[error("{operation}: invalid kubeconfig format in {}: {source}", path.display())]
    Parse {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{operation}: unable to read kubeconfig {}: {source}", path.display())]
    Read {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "{operation}: invalid kubeconfig {}, must contain at least one cluster, context, and user \
         (found {clusters} clusters, {contexts} contexts, {users} users)",
        path.display()
    )]
    Validation { operation: &'static str, path: PathBuf, clusters: usize, contexts: usize, users: usize },

    #[error("failed to create {kind} client for context '{context}': {message}")]
    Construction { kind: &'static str, context: String, message: String },

    #[error("{operation}: failed to save kubeconfig {}: {message}", path.display())]
    Persist { operation: &'static str, path: PathBuf, message: String },

    #[error("{operation}: no usable context in kubeconfig {}", path.display())]
    Resolution { operation: &'static str, path: PathBuf },
}

impl ConnectionError {
    pub fn construction(kind: &'static str, context: &str, err: impl std::fmt::Display) -> Self {
        Self::Construction { kind, context: context.to_string(), message: err.to_string() }
    }

    /// True for both a missing kubeconfig file and a missing context entry.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ConfigNotFound { .. } | Self::ContextNotFound { .. })
    }
}

pub type Result<T, E = ConnectionError> = std::result::Result<T, E>;
