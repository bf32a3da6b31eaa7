//! Tests for layered configuration loading.

use super::*;
use memedash_protocol::{PageSize, SortField, SortOrder};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write JSON5 contents to a path, creating parent directories if needed.
fn write_json5(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("dir");
    }
    fs::write(path, contents).expect("write");
}

/// Options that only look at the given temp tree.
fn isolated_options(cwd: &Path) -> LayeredConfigOptions {
    let mut options = LayeredConfigOptions::new(cwd);
    options.system_config_path = None;
    options.user_config_path = None;
    options
}

#[test]
fn parse_minimal_config() {
    let config = MemedashConfig::load_from_str("{}").expect("config");
    assert_eq!(config.api.base_url, "http://localhost:8000");
    assert_eq!(config.top_memes.limit, 20);
    assert_eq!(config.top_memes.refetch_interval_ms, 300_000);
    assert_eq!(config.top_memes.stale_time_ms, 290_000);
    assert_eq!(config.notifications.ttl_ms, 3_000);
    assert_eq!(config.reports.limit, 20);
    assert_eq!(config.history.sort_by, SortField::CreatedAt);
    assert_eq!(config.history.order, SortOrder::Desc);
    assert_eq!(config.history.limit, PageSize::Twenty);
}

#[test]
fn rejects_unknown_top_level_key() {
    let err = MemedashConfig::load_from_str(r#"{ unexpected: true }"#).unwrap_err();
    assert!(format!("{err}").contains("unknown key"));
}

#[test]
fn rejects_unsupported_history_page_size() {
    let err = MemedashConfig::load_from_str(r#"{ history: { limit: 30 } }"#).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("history.limit"), "{msg}");
}

#[test]
fn rejects_unknown_sort_field() {
    let err = MemedashConfig::load_from_str(r#"{ history: { sort_by: "title" } }"#).unwrap_err();
    assert!(format!("{err}").contains("history.sort_by"));
}

#[test]
fn syntax_errors_name_the_origin() {
    let err = MemedashConfig::load_from_str("{ api: ").unwrap_err();
    assert!(matches!(err, ConfigError::Syntax { .. }));
    assert!(format!("{err}").starts_with("<inline>"));
}

#[test]
fn rejects_non_http_base_url() {
    let err = MemedashConfig::load_from_str(r#"{ api: { base_url: "ftp://memes" } }"#).unwrap_err();
    assert!(format!("{err}").contains("api.base_url"));
}

#[test]
fn parses_history_defaults_from_json5() {
    let config = MemedashConfig::load_from_str(
        r#"{
            // comments are allowed
            history: { sort_by: "num_comments", order: "asc", limit: 100 },
        }"#,
    )
    .expect("config");
    assert_eq!(config.history.sort_by, SortField::NumComments);
    assert_eq!(config.history.order, SortOrder::Asc);
    assert_eq!(config.history.limit, PageSize::Hundred);
}

#[test]
fn cwd_layer_overrides_project_layer() {
    let temp = TempDir::new().expect("tmp");
    let project_root = temp.path().join("project");
    fs::create_dir_all(project_root.join(".git")).expect("git");
    let cwd = project_root.join("subdir");
    fs::create_dir_all(&cwd).expect("cwd");

    write_json5(
        &project_root.join(DEFAULT_CONFIG_FILE),
        r#"{ api: { base_url: "http://project:8000", timeout_ms: 500 } }"#,
    );
    write_json5(
        &cwd.join(DEFAULT_CONFIG_FILE),
        r#"{ api: { base_url: "http://cwd:8000" } }"#,
    );

    let layered = MemedashConfig::load_layered_with_options(isolated_options(&cwd)).expect("load");
    assert_eq!(layered.config.api.base_url, "http://cwd:8000");
    assert_eq!(layered.config.api.timeout_ms, Some(500));
    let sources: Vec<_> = layered.layers.iter().map(|layer| layer.source).collect();
    assert_eq!(
        sources,
        vec![ConfigLayerSource::Project, ConfigLayerSource::Cwd]
    );
}

#[test]
fn runtime_override_wins() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let user_config = root.join("user.json5");
    write_json5(&user_config, r#"{ notifications: { ttl_ms: 1000 } }"#);
    let runtime_config = root.join("runtime.json5");
    write_json5(&runtime_config, r#"{ notifications: { ttl_ms: 5000 } }"#);

    let mut options = isolated_options(root).with_runtime_path(&runtime_config);
    options.user_config_path = Some(user_config);

    let layered = MemedashConfig::load_layered_with_options(options).expect("load");
    assert_eq!(layered.config.notifications.ttl_ms, 5000);
    assert_eq!(layered.layers.len(), 2);
}

#[test]
fn missing_runtime_layer_is_an_error() {
    let temp = TempDir::new().expect("tmp");
    let options = isolated_options(temp.path()).with_runtime_path(temp.path().join("nope.json5"));
    let err = MemedashConfig::load_layered_with_options(options).unwrap_err();
    assert!(matches!(err, ConfigError::Unreadable { .. }));
    assert!(format!("{err}").contains("nope.json5"));
}

#[test]
fn schema_errors_name_the_layer() {
    let temp = TempDir::new().expect("tmp");
    let cwd_config = temp.path().join(DEFAULT_CONFIG_FILE);
    write_json5(&cwd_config, r#"{ api: { base_url: 42 } }"#);
    let err = MemedashConfig::load_layered_with_options(isolated_options(temp.path())).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("cwd("), "{msg}");
    assert!(msg.contains("api.base_url"), "{msg}");
}

#[test]
fn env_override_replaces_base_url() {
    let mut config = MemedashConfig::default();
    config
        .apply_overrides_from(|name| {
            (name == API_URL_ENV).then(|| " https://memes.example.com ".to_string())
        })
        .expect("override");
    assert_eq!(config.api.base_url, "https://memes.example.com");
}

#[test]
fn empty_env_override_is_rejected() {
    let mut config = MemedashConfig::default();
    let err = config
        .apply_overrides_from(|_| Some("   ".to_string()))
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnv { .. }));
}

#[test]
fn storage_path_prefers_explicit_value() {
    let config = MemedashConfig::builder()
        .storage_path("/tmp/memedash-storage.json")
        .build();
    assert_eq!(
        config.storage.resolve_path(),
        std::path::PathBuf::from("/tmp/memedash-storage.json")
    );
}
