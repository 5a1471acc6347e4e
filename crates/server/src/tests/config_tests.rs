use super::*;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_match_mock_behaviour() {
    let settings = Settings::default();
    assert_eq!(settings.verify_delay(), Duration::from_secs(3));
    assert!(settings.seed_catalog);
    assert_eq!(settings.server_bind, "127.0.0.1:8080");
}

#[test]
fn file_values_accept_strings_numbers_and_booleans() {
    let mut settings = Settings::default();
    apply_file(
        &mut settings,
        r#"
        bind_addr = "0.0.0.0:9000"
        database_url = "sqlite::memory:"
        verify_delay_ms = 250
        seed_catalog = false
        "#,
    );
    assert_eq!(settings.server_bind, "0.0.0.0:9000");
    assert_eq!(settings.database_url, "sqlite::memory:");
    assert_eq!(settings.verify_delay_ms, 250);
    assert!(!settings.seed_catalog);
}

#[test]
fn unparsable_file_leaves_defaults() {
    let mut settings = Settings::default();
    apply_file(&mut settings, "this is = = not toml");
    assert_eq!(settings.verify_delay_ms, 3000);
}

#[test]
fn app_prefixed_environment_wins_over_plain_names() {
    let mut settings = Settings::default();
    apply_env(
        &mut settings,
        env_from(&[
            ("SERVER_BIND", "127.0.0.1:1"),
            ("APP__BIND_ADDR", "127.0.0.1:2"),
            ("DATABASE_URL", "sqlite://a.db"),
            ("APP__VERIFY_DELAY_MS", "0"),
            ("APP__SEED_CATALOG", "off"),
        ]),
    );
    assert_eq!(settings.server_bind, "127.0.0.1:2");
    assert_eq!(settings.database_url, "sqlite://a.db");
    assert_eq!(settings.verify_delay(), Duration::ZERO);
    assert!(!settings.seed_catalog);
}

#[test]
fn invalid_environment_values_are_ignored() {
    let mut settings = Settings::default();
    apply_env(
        &mut settings,
        env_from(&[("APP__VERIFY_DELAY_MS", "soon"), ("APP__SEED_CATALOG", "maybe")]),
    );
    assert_eq!(settings.verify_delay_ms, 3000);
    assert!(settings.seed_catalog);
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(normalize_database_url("sqlite:data/x.db"), "sqlite://data/x.db");
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
    assert_eq!(
        normalize_database_url("   "),
        Settings::default().database_url
    );
}

#[test]
fn normalizing_does_not_touch_the_filesystem() {
    let root = std::env::temp_dir().join(format!(
        "bike_registration_untouched_{}",
        std::process::id()
    ));
    let url = normalize_database_url(&root.join("data").join("x.db").to_string_lossy());
    assert!(url.starts_with("sqlite://"));
    assert!(!root.exists());
}
