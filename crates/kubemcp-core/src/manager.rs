use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info};

use crate::cache::{ClientCache, ClientKind, ClientTarget};
use crate::context::ContextResolver;
use crate::error::{ConnectionError, Result};
use crate::kubeconfig::{ConfigLocation, KubeconfigStore};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds the two client kinds for a resolved target.
pub trait ClientFactory: Send + Sync {
    type Core: Send + Sync;
    type Workload: Send + Sync;

    fn build_core(&self, target: &ClientTarget) -> impl Future<Output = Result<Self::Core>> + Send;

    fn build_workload(&self, target: &ClientTarget) -> impl Future<Output = Result<Self::Workload>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    AlreadyActive(String),
    Switched(String),
}

impl fmt::Display for SwitchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyActive(name) => write!(f, "Already using context '{name}'"),
            Self::Switched(name) => write!(f, "Switched to context '{name}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationChange {
    pub location: ConfigLocation,
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextInfo {
    pub name: String,
    pub cluster: String,
    pub user: String,
    pub namespace: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextListing {
    pub location: ConfigLocation,
    pub contexts: Vec<ContextInfo>,
}

struct ConnectionState {
    location: ConfigLocation,
    resolver: ContextResolver,
}

/// Owns the kubeconfig location, the active context and the cached clients.
/// Location and context change only while the state lock is held, and the
/// cache is invalidated under that same lock, so a client is always built for
/// a (path, context) pair that was current when its build started.
pub struct ConnectionManager<F: ClientFactory> {
    factory: F,
    store: KubeconfigStore,
    state: Mutex<ConnectionState>,
    cache: ClientCache<F::Core, F::Workload>,
    connect_timeout: Duration,
}

impl<F: ClientFactory> ConnectionManager<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            store: KubeconfigStore::new(),
            state: Mutex::new(ConnectionState { location: ConfigLocation::Default, resolver: ContextResolver::new() }),
            cache: ClientCache::new(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_location(self, location: ConfigLocation) -> Self {
        self.lock_state().location = location;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn store(&self) -> &KubeconfigStore {
        &self.store
    }

    pub fn location(&self) -> ConfigLocation {
        self.lock_state().location.clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, ConnectionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The active context name, reading the kubeconfig only on first use.
    pub fn current_context(&self) -> Result<String> {
        let mut state = self.lock_state();
        let path = state.location.path();
        state.resolver.resolve(&self.store, &path)
    }

    fn target(&self) -> Result<ClientTarget> {
        let mut state = self.lock_state();
        let path = state.location.path();
        let context = state.resolver.resolve(&self.store, &path)?;
        Ok(ClientTarget { path, context, epoch: self.cache.epoch() })
    }

    async fn construct<T>(
        &self,
        kind: ClientKind,
        target: &ClientTarget,
        build: impl Future<Output = Result<T>>,
    ) -> Result<(u64, T)> {
        debug!(%kind, context = %target.context, path = %target.path.display(), "building client");
        match tokio::time::timeout(self.connect_timeout, build).await {
            Ok(Ok(client)) => {
                info!(%kind, context = %target.context, "client ready");
                Ok((target.epoch, client))
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ConnectionError::construction(
                kind.as_str(),
                &target.context,
                format!("timed out after {}s", self.connect_timeout.as_secs()),
            )),
        }
    }

    pub async fn core_client(&self) -> Result<Arc<F::Core>> {
        self.cache
            .get_or_build_core(move || async move {
                let target = self.target()?;
                self.construct(ClientKind::Core, &target, self.factory.build_core(&target)).await
            })
            .await
    }

    pub async fn workload_client(&self) -> Result<Arc<F::Workload>> {
        self.cache
            .get_or_build_workload(move || async move {
                let target = self.target()?;
                self.construct(ClientKind::Workload, &target, self.factory.build_workload(&target)).await
            })
            .await
    }

    /// Drops every cached client; the next request rebuilds.
    pub fn invalidate(&self) {
        let _state = self.lock_state();
        self.cache.invalidate();
    }

    /// Forgets the resolved context and drops cached clients.
    pub fn reset(&self) {
        let mut state = self.lock_state();
        state.resolver.reset();
        self.cache.invalidate();
    }

    /// Makes `name` the current context, in the kubeconfig first and in memory
    /// only once the file has been written.
    pub fn switch_to(&self, name: &str) -> Result<SwitchOutcome> {
        const OPERATION: &str = "switch context";

        let mut state = self.lock_state();
        let path = state.location.path();
        let current = state.resolver.resolve(&self.store, &path)?;

        let mut doc = self.store.load_valid(OPERATION, &path)?;
        if !doc.has_context(name) {
            return Err(ConnectionError::ContextNotFound { operation: OPERATION, context: name.to_string(), path });
        }
        if current == name {
            debug!(context = name, "context already active");
            return Ok(SwitchOutcome::AlreadyActive(name.to_string()));
        }

        doc.set_current_context(name);
        self.store.persist(OPERATION, &path, &doc)?;
        state.resolver.set_context(name);
        self.cache.invalidate();

        info!(from = %current, to = name, "switched context");
        Ok(SwitchOutcome::Switched(name.to_string()))
    }

    /// Points the manager at another kubeconfig. The new document must load,
    /// validate and yield a context, otherwise the previous location, context
    /// and clients stay active.
    pub fn set_location(&self, location: ConfigLocation) -> Result<LocationChange> {
        let path = location.path();
        self.store.load_valid("set kubeconfig path", &path)?;

        let mut state = self.lock_state();
        let mut resolver = ContextResolver::new();
        let context = resolver.resolve(&self.store, &path)?;

        state.location = location.clone();
        state.resolver = resolver;
        self.cache.invalidate();

        info!(path = %path.display(), context = %context, "kubeconfig location changed");
        Ok(LocationChange { location, context })
    }

    pub fn list_contexts(&self) -> Result<ContextListing> {
        let mut state = self.lock_state();
        let path = state.location.path();
        let active = state.resolver.resolve(&self.store, &path)?;
        let doc = self.store.load_valid("list contexts", &path)?;

        let mut contexts: Vec<ContextInfo> = doc
            .contexts
            .iter()
            .map(|c| ContextInfo {
                name: c.name.clone(),
                cluster: c.context.cluster.clone().unwrap_or_default(),
                user: c.context.user.clone().unwrap_or_default(),
                namespace: c.context.namespace.clone().unwrap_or_default(),
                active: c.name == active,
            })
            .collect();
        contexts.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(ContextListing { location: state.location.clone(), contexts })
    }
}

#[cfg(test)]
mod tests;
