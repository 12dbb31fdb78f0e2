use std::path::PathBuf;

use tempfile::TempDir;

pub const TWO_CONTEXTS: &str = r#"
apiVersion: v1
kind: Config
preferences:
  colors: true
clusters:
- name: alpha-cluster
  cluster:
    server: https://alpha.example.com:6443
    insecure-skip-tls-verify: true
- name: beta-cluster
  cluster:
    server: https://beta.example.com:6443
users:
- name: alpha-admin
  user:
    token: alpha-token
- name: beta-admin
  user:
    token: beta-token
contexts:
- name: b
  context:
    cluster: beta-cluster
    user: beta-admin
    namespace: monitoring
- name: a
  context:
    cluster: alpha-cluster
    user: alpha-admin
current-context: ""
"#;

pub fn with_current(name: &str) -> String {
    TWO_CONTEXTS.replace("current-context: \"\"", &format!("current-context: {name}"))
}

pub fn write_kubeconfig(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config");
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}
