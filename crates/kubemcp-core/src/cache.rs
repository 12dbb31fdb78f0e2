use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::Mutex;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientKind {
    Core,
    Workload,
}

impl ClientKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Core => "Kubernetes",
            Self::Workload => "OpenKruise",
        }
    }
}

impl fmt::Display for ClientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The (kubeconfig, context) pair a client is built for, stamped with the
/// cache epoch it was resolved in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientTarget {
    pub path: PathBuf,
    pub context: String,
    pub(crate) epoch: u64,
}

impl ClientTarget {
    pub fn new(path: PathBuf, context: impl Into<String>) -> Self {
        Self { path, context: context.into(), epoch: 0 }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// Holds at most one handle. Readers only take the slot's read lock for a
/// pointer clone, so they never wait on a construction in progress.
pub struct ClientSlot<T> {
    handle: RwLock<Option<Arc<T>>>,
    build_gate: Mutex<()>,
}

impl<T> ClientSlot<T> {
    pub fn new() -> Self {
        Self { handle: RwLock::new(None), build_gate: Mutex::new(()) }
    }

    pub fn get(&self) -> Option<Arc<T>> {
        self.handle.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_empty(&self) -> bool {
        self.get().is_none()
    }

    fn clear(&self) {
        *self.handle.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Stores `handle` only if no invalidation happened since `built_in`.
    fn install(&self, current: &AtomicU64, built_in: u64, handle: &Arc<T>) -> bool {
        let mut slot = self.handle.write().unwrap_or_else(PoisonError::into_inner);
        if current.load(Ordering::Acquire) != built_in {
            return false;
        }
        *slot = Some(handle.clone());
        true
    }

    /// Returns the cached handle or builds one. Concurrent misses queue on the
    /// build gate and pick up the first successful result; a failed build
    /// leaves the slot empty so the next caller starts over.
    async fn get_or_build<F, Fut>(&self, current: &AtomicU64, build: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(u64, T)>>,
    {
        if let Some(handle) = self.get() {
            return Ok(handle);
        }

        let _gate = self.build_gate.lock().await;
        if let Some(handle) = self.get() {
            return Ok(handle);
        }

        let (epoch, client) = build().await?;
        let handle = Arc::new(client);
        if !self.install(current, epoch, &handle) {
            tracing::debug!(epoch, "cache invalidated during construction, handle not cached");
        }
        Ok(handle)
    }
}

impl<T> Default for ClientSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// One slot per client kind plus the epoch that every invalidation advances.
pub struct ClientCache<C, W> {
    epoch: AtomicU64,
    core: ClientSlot<C>,
    workload: ClientSlot<W>,
}

impl<C, W> ClientCache<C, W> {
    pub fn new() -> Self {
        Self { epoch: AtomicU64::new(0), core: ClientSlot::new(), workload: ClientSlot::new() }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    pub fn core(&self) -> Option<Arc<C>> {
        self.core.get()
    }

    pub fn workload(&self) -> Option<Arc<W>> {
        self.workload.get()
    }

    pub fn is_empty(&self) -> bool {
        self.core.is_empty() && self.workload.is_empty()
    }

    /// Drops both handles. Builds that started before this call will not be
    /// cached. Handles already given out stay usable.
    pub fn invalidate(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.core.clear();
        self.workload.clear();
        tracing::debug!(epoch = self.epoch(), "client cache cleared");
    }

    pub async fn get_or_build_core<F, Fut>(&self, build: F) -> Result<Arc<C>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(u64, C)>>,
    {
        self.core.get_or_build(&self.epoch, build).await
    }

    pub async fn get_or_build_workload<F, Fut>(&self, build: F) -> Result<Arc<W>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(u64, W)>>,
    {
        self.workload.get_or_build(&self.epoch, build).await
    }
}

impl<C, W> Default for ClientCache<C, W> {
    fn default() -> Self {
        Self::new()
    }
}
