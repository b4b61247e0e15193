use clap::Parser;
use hwlock_license::StoreConfig;
use hwlock_server::{Backend, ServerArgs};
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::time::Duration;

fn parse(args: &[&str]) -> ServerArgs {
    let mut argv = vec!["hwlock-server"];
    argv.extend_from_slice(args);
    ServerArgs::try_parse_from(argv).unwrap()
}

#[test]
fn defaults() {
    let args = parse(&["--admin-key", "secret"]);
    assert_eq!(args.port, 5000);
    assert_eq!(args.admin_user, "admin");
    assert_eq!(args.backend, Backend::Sqlite);
    assert_eq!(args.token_prefix, "LIC");
    assert_eq!(args.default_days, 30);

    let config = args.into_config().unwrap();
    assert_eq!(config.listen.port(), 5000);
    assert_eq!(
        config.store,
        StoreConfig::Sqlite {
            path: PathBuf::from("licenses.db"),
            busy_timeout: Duration::from_secs(5),
        }
    );
}

#[test]
fn json_backend_uses_database_path() {
    let config = parse(&[
        "--admin-key",
        "secret",
        "--backend",
        "json",
        "--database",
        "/tmp/licenses.json",
    ])
    .into_config()
    .unwrap();
    assert_eq!(
        config.store,
        StoreConfig::JsonFile {
            path: PathBuf::from("/tmp/licenses.json"),
        }
    );
}

#[test]
fn engine_settings_follow_flags() {
    let config = parse(&[
        "--admin-key",
        "secret",
        "--backend",
        "memory",
        "--token-prefix",
        "ACME",
        "--default-days",
        "90",
    ])
    .into_config()
    .unwrap();
    assert_eq!(config.store, StoreConfig::Memory);
    assert_eq!(config.engine.token_prefix, "ACME");
    assert_eq!(config.engine.default_duration_days, 90);
}

#[test]
fn blank_admin_key_is_rejected() {
    let result = parse(&["--admin-key", "   "]).into_config();
    assert!(result.is_err());
}

#[test]
fn admin_key_is_redacted_in_debug_output() {
    let config = parse(&["--admin-key", "super-secret"]).into_config().unwrap();
    let rendered = format!("{:?}", config.admin);
    assert!(!rendered.contains("super-secret"));
}
