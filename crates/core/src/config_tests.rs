use super::*;

#[test]
fn default_config_is_self_consistent() {
    let config = Config::default();
    assert_eq!(config.server.port, 8787);
    assert!(config.crawler.max_concurrency >= 1);
    assert!(config.default_job_definitions.is_empty());
}

#[test]
fn database_path_joins_data_dir() {
    let mut server = ServerConfig::default();
    server.data_dir = "/var/lib/quaero".into();
    assert_eq!(server.database_path(), "/var/lib/quaero/quaero.db");
}

#[test]
fn database_path_trims_trailing_slash() {
    let mut server = ServerConfig::default();
    server.data_dir = "/var/lib/quaero/".into();
    assert_eq!(server.database_path(), "/var/lib/quaero/quaero.db");
}

#[test]
fn config_round_trips_through_toml() {
    let config = Config::default();
    let toml_str = toml::to_string(&config).unwrap();
    let back: Config = toml::from_str(&toml_str).unwrap();
    assert_eq!(back, config);
}

#[test]
fn partial_toml_fills_remaining_fields_with_defaults() {
    let partial = r#"
        [server]
        port = 9000
    "#;
    let config: Config = toml::from_str(partial).unwrap();
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.host, ServerConfig::default().host);
    assert_eq!(config.crawler.max_depth, CrawlerDefaults::default().max_depth);
}
