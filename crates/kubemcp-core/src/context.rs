use std::path::Path;

use tracing::{debug, info};

use crate::error::{ConnectionError, Result};
use crate::kubeconfig::KubeconfigStore;

const OPERATION: &str = "resolve current context";

/// Memoizes the active context name until it is reset or replaced.
#[derive(Debug, Clone, Default)]
pub struct ContextResolver {
    active: Option<String>,
}

impl ContextResolver {
    pub fn new() -> Self {
        Self { active: None }
    }

    pub fn context_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn is_resolved(&self) -> bool {
        self.active.is_some()
    }

    pub fn set_context(&mut self, name: &str) {
        self.active = Some(name.to_string());
    }

    pub fn reset(&mut self) {
        self.active = None;
    }

    /// Returns the memoized context, or reads the document at `path` and adopts
    /// its current context. A document without one gets its first context (by
    /// name) written back as current before it is adopted.
    pub fn resolve(&mut self, store: &KubeconfigStore, path: &Path) -> Result<String> {
        if let Some(name) = &self.active {
            return Ok(name.clone());
        }

        let mut doc = store.load_valid(OPERATION, path)?;
        debug!(declared = doc.current_context().unwrap_or(""), contexts = doc.contexts.len(), "resolving context");

        let name = match doc.current_context() {
            Some(current) => current.to_string(),
            None => {
                let Some(first) = doc.first_context_name().map(str::to_string) else {
                    return Err(ConnectionError::Resolution { operation: OPERATION, path: path.to_path_buf() });
                };
                doc.set_current_context(&first);
                store.persist(OPERATION, path, &doc)?;
                info!(context = %first, path = %path.display(), "no current context declared, selected first available");
                first
            }
        };

        self.active = Some(name.clone());
        Ok(name)
    }
}

#[cfg(test)]
mod tests;
