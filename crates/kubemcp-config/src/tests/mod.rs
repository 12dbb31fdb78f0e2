use super::*;

#[test]
fn section_defaults_match_embedded_file() {
    let empty: AppConfig = toml::from_str("").unwrap();
    assert_eq!(empty, AppConfig::default());
}

#[test]
fn default_config_values() {
    let config = AppConfig::default();
    assert_eq!(config.server.name, "kubemcp");
    assert_eq!(config.kubeconfig.path, None);
    assert_eq!(config.client.connect_timeout_secs, 30);
    assert_eq!(config.connect_timeout(), Duration::from_secs(30));
    assert_eq!(config.logging.filter, "info");
}

#[test]
fn partial_toml_keeps_other_defaults() {
    let raw = r#"
[client]
connect_timeout_secs = 5
"#;
    let config: AppConfig = toml::from_str(raw).unwrap();
    assert_eq!(config.client.connect_timeout_secs, 5);
    assert_eq!(config.logging.filter, "info");
    assert_eq!(config.server.name, "kubemcp");
}

#[test]
fn kebab_case_alias_is_accepted() {
    let config: AppConfig = toml::from_str("[client]\nconnect-timeout-secs = 7\n").unwrap();
    assert_eq!(config.client.connect_timeout_secs, 7);
}

#[test]
fn zero_timeout_is_clamped() {
    let config: AppConfig = toml::from_str("[client]\nconnect_timeout_secs = 0\n").unwrap();
    assert_eq!(config.connect_timeout(), Duration::from_secs(1));
}

#[test]
fn merge_keeps_kubeconfig_path_when_user_omits_it() {
    let mut base = AppConfig::default();
    base.kubeconfig.path = Some(PathBuf::from("/etc/kube/config"));

    let user: AppConfig = toml::from_str("[logging]\nfilter = \"debug\"\n").unwrap();
    base.merge(user);

    assert_eq!(base.logging.filter, "debug");
    assert_eq!(base.kubeconfig.path, Some(PathBuf::from("/etc/kube/config")));
}

#[test]
fn load_from_reads_explicit_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[kubeconfig]\npath = \"/tmp/kind.yaml\"\n\n[server]\nname = \"kruise-tools\"\n").unwrap();

    let config = AppConfig::load_from(&path).unwrap();
    assert_eq!(config.server.name, "kruise-tools");
    assert_eq!(config.kubeconfig_path(), Some(PathBuf::from("/tmp/kind.yaml")));
    assert_eq!(config.client.connect_timeout_secs, 30);
}

#[test]
fn load_from_rejects_invalid_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[client\nconnect_timeout_secs = ").unwrap();
    assert!(AppConfig::load_from(&path).is_err());
}

#[test]
fn load_from_missing_file_fails() {
    assert!(AppConfig::load_from(Path::new("/nonexistent/kubemcp.toml")).is_err());
}

#[test]
fn transport_defaults_to_sse_on_8686() {
    let config = AppConfig::default();
    assert_eq!(config.server.mode, Transport::Sse);
    assert_eq!(config.server.address, ":8686");

    let config: AppConfig = toml::from_str("[server]\nmode = \"stdio\"\n").unwrap();
    assert_eq!(config.server.mode, Transport::Stdio);
    assert_eq!(config.server.address, ":8686");
    assert!(toml::from_str::<AppConfig>("[server]\nmode = \"websocket\"\n").is_err());
}

#[test]
fn transport_parses_from_flag_values() {
    assert_eq!("stdio".parse::<Transport>(), Ok(Transport::Stdio));
    assert_eq!(" SSE ".parse::<Transport>(), Ok(Transport::Sse));
    assert!("grpc".parse::<Transport>().unwrap_err().contains("'grpc'"));
    assert_eq!(Transport::Sse.to_string(), "sse");
}

#[test]
fn home_prefix_is_expanded() {
    let Some(home) = dirs::home_dir() else { return };
    let config: AppConfig = toml::from_str("[kubeconfig]\npath = \"~/.kube/staging\"\n").unwrap();
    assert_eq!(config.kubeconfig_path(), Some(home.join(".kube/staging")));
}

#[test]
fn default_path_ends_with_app_dir() {
    assert!(AppConfig::default_path().ends_with("kubemcp/config.toml"));
}
