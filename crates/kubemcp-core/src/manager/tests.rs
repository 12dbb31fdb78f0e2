use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::*;
use crate::kubeconfig::KubeconfigDocument;
use crate::test_support::{with_current, write_kubeconfig, TWO_CONTEXTS};

#[derive(Default)]
struct CountingFactory {
    core_builds: AtomicUsize,
    workload_builds: AtomicUsize,
    fail_core: AtomicBool,
    delay: Duration,
}

impl CountingFactory {
    fn slow(delay: Duration) -> Self {
        Self { delay, ..Self::default() }
    }

    fn core_builds(&self) -> usize {
        self.core_builds.load(Ordering::SeqCst)
    }
}

impl ClientFactory for CountingFactory {
    type Core = ClientTarget;
    type Workload = ClientTarget;

    async fn build_core(&self, target: &ClientTarget) -> Result<ClientTarget> {
        self.core_builds.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail_core.load(Ordering::SeqCst) {
            return Err(ConnectionError::construction("Kubernetes", &target.context, "unauthorized"));
        }
        Ok(target.clone())
    }

    async fn build_workload(&self, target: &ClientTarget) -> Result<ClientTarget> {
        self.workload_builds.fetch_add(1, Ordering::SeqCst);
        Ok(target.clone())
    }
}

fn manager_for(path: &std::path::Path, factory: CountingFactory) -> ConnectionManager<CountingFactory> {
    ConnectionManager::new(factory).with_location(ConfigLocation::Custom(path.to_path_buf()))
}

fn declared_context(path: &std::path::Path) -> Option<String> {
    let raw = std::fs::read_to_string(path).unwrap();
    let doc: KubeconfigDocument = serde_yaml::from_str(&raw).unwrap();
    doc.current_context().map(str::to_string)
}

#[test]
fn current_context_is_memoized() {
    let (_dir, path) = write_kubeconfig(&with_current("b"));
    let manager = manager_for(&path, CountingFactory::default());

    assert_eq!(manager.current_context().unwrap(), "b");
    let reads = manager.store().read_count();
    assert_eq!(manager.current_context().unwrap(), "b");
    assert_eq!(manager.store().read_count(), reads);
}

#[test]
fn first_resolution_persists_auto_selected_context() {
    let (_dir, path) = write_kubeconfig(TWO_CONTEXTS);
    let manager = manager_for(&path, CountingFactory::default());

    let chosen = manager.current_context().unwrap();
    assert!(chosen == "a" || chosen == "b");
    assert_eq!(declared_context(&path).as_deref(), Some(chosen.as_str()));

    let reads = manager.store().read_count();
    assert_eq!(manager.current_context().unwrap(), chosen);
    assert_eq!(manager.store().read_count(), reads);
}

#[test]
fn switch_to_unknown_context_changes_nothing() {
    let (_dir, path) = write_kubeconfig(&with_current("a"));
    let manager = manager_for(&path, CountingFactory::default());
    manager.current_context().unwrap();
    let before = std::fs::read_to_string(&path).unwrap();

    let err = manager.switch_to("missing").unwrap_err();
    assert!(matches!(err, ConnectionError::ContextNotFound { .. }));
    assert!(err.to_string().contains("'missing'"));

    assert_eq!(manager.current_context().unwrap(), "a");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    assert_eq!(manager.store().write_count(), 0);
}

#[test]
fn switch_to_active_context_is_a_no_op() {
    let (_dir, path) = write_kubeconfig(&with_current("a"));
    let manager = manager_for(&path, CountingFactory::default());
    manager.current_context().unwrap();

    let outcome = manager.switch_to("a").unwrap();
    assert_eq!(outcome, SwitchOutcome::AlreadyActive("a".into()));
    assert_eq!(outcome.to_string(), "Already using context 'a'");
    assert_eq!(manager.store().write_count(), 0);
}

#[tokio::test]
async fn switch_persists_then_rebinds_clients() {
    let (_dir, path) = write_kubeconfig(&with_current("a"));
    let manager = manager_for(&path, CountingFactory::default());

    let before = manager.core_client().await.unwrap();
    assert_eq!(before.context, "a");

    let outcome = manager.switch_to("b").unwrap();
    assert_eq!(outcome.to_string(), "Switched to context 'b'");
    assert_eq!(declared_context(&path).as_deref(), Some("b"));
    assert_eq!(manager.current_context().unwrap(), "b");

    let after = manager.core_client().await.unwrap();
    assert_eq!(after.context, "b");
    assert_eq!(after.path, path);
    assert_eq!(manager.factory().core_builds(), 2);
    assert_eq!(before.context, "a");
}

#[tokio::test]
async fn invalidate_forces_fresh_construction() {
    let (_dir, path) = write_kubeconfig(&with_current("a"));
    let manager = manager_for(&path, CountingFactory::default());

    manager.core_client().await.unwrap();
    manager.core_client().await.unwrap();
    manager.workload_client().await.unwrap();
    assert_eq!(manager.factory().core_builds(), 1);

    manager.invalidate();
    manager.core_client().await.unwrap();
    manager.workload_client().await.unwrap();
    assert_eq!(manager.factory().core_builds(), 2);
    assert_eq!(manager.factory().workload_builds.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn construction_failure_is_retried_on_next_call() {
    let (_dir, path) = write_kubeconfig(&with_current("a"));
    let factory = CountingFactory::default();
    factory.fail_core.store(true, Ordering::SeqCst);
    let manager = manager_for(&path, factory);

    let err = manager.core_client().await.unwrap_err();
    assert!(matches!(err, ConnectionError::Construction { .. }));
    assert!(err.to_string().contains("context 'a'"));

    manager.factory().fail_core.store(false, Ordering::SeqCst);
    assert_eq!(manager.core_client().await.unwrap().context, "a");
    assert_eq!(manager.factory().core_builds(), 2);
}

#[tokio::test]
async fn slow_construction_times_out() {
    let (_dir, path) = write_kubeconfig(&with_current("a"));
    let manager =
        manager_for(&path, CountingFactory::slow(Duration::from_secs(5))).with_connect_timeout(Duration::from_millis(20));

    let err = manager.core_client().await.unwrap_err();
    assert!(err.to_string().contains("timed out"));
    assert!(manager.cache.core().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_share_one_client() {
    let (_dir, path) = write_kubeconfig(&with_current("b"));
    let manager = Arc::new(manager_for(&path, CountingFactory::slow(Duration::from_millis(20))));

    let mut tasks = Vec::new();
    for _ in 0..12 {
        let manager = manager.clone();
        tasks.push(tokio::spawn(async move { manager.core_client().await }));
    }

    for task in tasks {
        let client = task.await.unwrap().unwrap();
        assert_eq!(client.context, "b");
        assert_eq!(client.path, path);
    }
    assert_eq!(manager.factory().core_builds(), 1);
}

#[tokio::test]
async fn set_location_rejects_invalid_document() {
    let (_dir, path) = write_kubeconfig(&with_current("a"));
    let (_bad_dir, bad_path) = write_kubeconfig("apiVersion: v1\nkind: Config\nclusters: []\n");
    let manager = manager_for(&path, CountingFactory::default());
    manager.core_client().await.unwrap();

    let err = manager.set_location(ConfigLocation::Custom(bad_path)).unwrap_err();
    assert!(matches!(err, ConnectionError::Validation { .. }));
    assert_eq!(manager.location(), ConfigLocation::Custom(path));
    assert!(manager.cache.core().is_some());

    let err = manager.set_location(ConfigLocation::Custom(PathBuf::from("/nonexistent/kubeconfig"))).unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn set_location_resets_context_and_clients() {
    let (_dir, first) = write_kubeconfig(&with_current("b"));
    let (_other, second) = write_kubeconfig(TWO_CONTEXTS);
    let manager = manager_for(&first, CountingFactory::default());
    assert_eq!(manager.core_client().await.unwrap().context, "b");

    let change = manager.set_location(ConfigLocation::Custom(second.clone())).unwrap();
    assert_eq!(change.context, "a");
    assert_eq!(change.location, ConfigLocation::Custom(second.clone()));
    assert_eq!(declared_context(&second).as_deref(), Some("a"));
    assert!(manager.cache.core().is_none());

    let client = manager.core_client().await.unwrap();
    assert_eq!((client.path.clone(), client.context.as_str()), (second, "a"));
}

#[test]
fn list_contexts_marks_active_and_sorts() {
    let (_dir, path) = write_kubeconfig(&with_current("b"));
    let manager = manager_for(&path, CountingFactory::default());

    let listing = manager.list_contexts().unwrap();
    assert_eq!(listing.location, ConfigLocation::Custom(path));
    let names: Vec<_> = listing.contexts.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["a", "b"]);

    let b = &listing.contexts[1];
    assert!(b.active);
    assert_eq!(b.cluster, "beta-cluster");
    assert_eq!(b.user, "beta-admin");
    assert_eq!(b.namespace, "monitoring");
    assert!(!listing.contexts[0].active);
    assert_eq!(listing.contexts[0].namespace, "");
}

#[test]
fn reset_rereads_external_edits() {
    let (_dir, path) = write_kubeconfig(&with_current("a"));
    let manager = manager_for(&path, CountingFactory::default());
    assert_eq!(manager.current_context().unwrap(), "a");

    std::fs::write(&path, with_current("b")).unwrap();
    assert_eq!(manager.current_context().unwrap(), "a");

    manager.reset();
    assert_eq!(manager.current_context().unwrap(), "b");
}

#[tokio::test]
async fn failed_switch_write_keeps_context_and_clients() {
    let (_dir, path) = write_kubeconfig(&with_current("a"));
    let manager = manager_for(&path, CountingFactory::default());
    assert_eq!(manager.core_client().await.unwrap().context, "a");

    manager.store().fail_writes(true);
    let err = manager.switch_to("b").unwrap_err();
    assert!(matches!(err, ConnectionError::Persist { .. }));

    assert_eq!(manager.current_context().unwrap(), "a");
    assert_eq!(declared_context(&path).as_deref(), Some("a"));
    assert!(manager.cache.core().is_some());
    assert_eq!(manager.core_client().await.unwrap().context, "a");
    assert_eq!(manager.factory().core_builds(), 1);
}

#[tokio::test]
async fn failed_auto_selection_keeps_previous_location() {
    let (_dir, first) = write_kubeconfig(&with_current("b"));
    let (_other, second) = write_kubeconfig(TWO_CONTEXTS);
    let manager = manager_for(&first, CountingFactory::default());
    assert_eq!(manager.core_client().await.unwrap().context, "b");

    manager.store().fail_writes(true);
    let err = manager.set_location(ConfigLocation::Custom(second.clone())).unwrap_err();
    assert!(matches!(err, ConnectionError::Persist { .. }));

    assert_eq!(manager.location(), ConfigLocation::Custom(first));
    assert_eq!(manager.current_context().unwrap(), "b");
    assert!(manager.cache.core().is_some());
    assert_eq!(declared_context(&second), None);
}

#[cfg(unix)]
#[test]
fn switch_through_symlinked_kubeconfig_keeps_link() {
    let (dir, real) = write_kubeconfig(&with_current("a"));
    let link = dir.path().join("linked-config");
    std::os::unix::fs::symlink(&real, &link).unwrap();
    let manager = manager_for(&link, CountingFactory::default());

    manager.switch_to("b").unwrap();
    assert!(std::fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    assert_eq!(declared_context(&real).as_deref(), Some("b"));

    manager.reset();
    assert_eq!(manager.current_context().unwrap(), "b");
}
