use std::io::Write;

use serial_test::serial;
use tempfile::NamedTempFile;

use super::*;

fn parse(args: &[&str]) -> CliArgs {
    CliArgs::parse_from(args)
}

#[test]
fn defaults_are_valid() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(
        settings.backend.base_url.as_str(),
        "http://127.0.0.1:8000/api/"
    );
    assert_eq!(settings.backend.timeout, Duration::from_secs(10));
    assert_eq!(settings.backend.api_token, None);
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert_eq!(settings.logging.format, LogFormat::Compact);
    assert_eq!(settings.query.retry_count, 1);
    assert_eq!(settings.query.retry_delay, Duration::from_secs(1));
    assert_eq!(settings.query.refetch_interval, None);
    assert!(settings.query.refetch_on_window_focus);
    assert_eq!(settings.session.idle_timeout, Duration::from_secs(1800));
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.backend.base_url = Some("http://file.example/api".to_string());
    raw.logging.level = Some("info".to_string());

    let overrides = GlobalOverrides {
        backend_url: Some("https://cli.example/v2".to_string()),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.backend.base_url.as_str(), "https://cli.example/v2/");
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    raw.apply_overrides(&GlobalOverrides {
        log_json: Some(true),
        ..Default::default()
    });

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.logging.format, LogFormat::Json);
}

#[test]
fn rejects_non_http_backend() {
    let mut raw = RawSettings::default();
    raw.backend.base_url = Some("ftp://files.example".to_string());

    let err = Settings::from_raw(raw).expect_err("invalid scheme");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "backend.base_url",
            ..
        }
    ));
}

#[test]
fn rejects_zero_timeout_and_limits() {
    let mut raw = RawSettings::default();
    raw.backend.timeout_ms = Some(0);
    assert!(matches!(
        Settings::from_raw(raw).expect_err("zero timeout"),
        LoadError::Invalid {
            key: "backend.timeout_ms",
            ..
        }
    ));

    let mut raw = RawSettings::default();
    raw.query.max_idle_entries = Some(0);
    assert!(matches!(
        Settings::from_raw(raw).expect_err("zero idle entries"),
        LoadError::Invalid {
            key: "query.max_idle_entries",
            ..
        }
    ));

    let mut raw = RawSettings::default();
    raw.session.idle_timeout_secs = Some(0);
    assert!(matches!(
        Settings::from_raw(raw).expect_err("zero idle timeout"),
        LoadError::Invalid {
            key: "session.idle_timeout_secs",
            ..
        }
    ));
}

#[test]
fn invalid_log_level_is_reported() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("chatty".to_string());
    assert!(matches!(
        Settings::from_raw(raw).expect_err("bad level"),
        LoadError::Invalid {
            key: "logging.level",
            ..
        }
    ));
}

#[test]
fn zero_interval_disables_periodic_refetch() {
    let mut raw = RawSettings::default();
    raw.query.refetch_interval_ms = Some(0);
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.query.refetch_interval, None);

    let mut raw = RawSettings::default();
    raw.query.refetch_interval_ms = Some(15_000);
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(
        settings.query.refetch_interval,
        Some(Duration::from_secs(15))
    );
}

#[test]
fn blank_token_is_treated_as_absent() {
    let mut raw = RawSettings::default();
    raw.backend.api_token = Some("   ".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.backend.api_token, None);
}

#[test]
#[serial]
fn file_then_env_then_cli() {
    let mut file = NamedTempFile::with_suffix(".toml").expect("tmp file");
    writeln!(
        file,
        "[backend]\nbase_url = \"http://file.example/api\"\ntimeout_ms = 2500\n\n[query]\nretry_count = 3"
    )
    .expect("write config");

    // SAFETY: guarded by #[serial]; no other test reads the environment concurrently.
    unsafe {
        std::env::set_var("LOUMO__QUERY__RETRY_COUNT", "5");
    }

    let args = parse(&[
        "loumo-admin",
        "--config-file",
        file.path().to_str().expect("utf-8 path"),
        "--backend-timeout-ms",
        "4000",
        "agents",
        "list",
    ]);
    let settings = load(&args);

    unsafe {
        std::env::remove_var("LOUMO__QUERY__RETRY_COUNT");
    }

    let settings = settings.expect("valid settings");
    assert_eq!(settings.backend.base_url.as_str(), "http://file.example/api/");
    assert_eq!(settings.query.retry_count, 5);
    assert_eq!(settings.backend.timeout, Duration::from_millis(4000));
}

#[test]
fn parse_bulk_status_arguments() {
    let args = parse(&[
        "loumo-admin",
        "orders",
        "bulk-status",
        "--ids",
        "1,2,3",
        "--status",
        "accepted",
    ]);

    match args.command {
        Command::Orders(OrdersArgs {
            action: OrdersCmd::BulkStatus { ids, status },
        }) => {
            assert_eq!(ids, vec![1, 2, 3]);
            assert_eq!(status, OrderStatusArg::Accepted);
        }
        other => panic!("wrong command parsed: {other:?}"),
    }
}

#[test]
fn parse_global_overrides_after_subcommand() {
    let args = parse(&[
        "loumo-admin",
        "products",
        "delete",
        "--ids",
        "4",
        "--backend-url",
        "http://localhost:9000",
    ]);

    assert_eq!(
        args.overrides.backend_url.as_deref(),
        Some("http://localhost:9000")
    );
    match args.command {
        Command::Products(ProductsArgs {
            action: ProductsCmd::Delete { ids },
        }) => assert_eq!(ids, vec![4]),
        other => panic!("wrong command parsed: {other:?}"),
    }
}

#[test]
fn parse_watch_arguments() {
    let args = parse(&[
        "loumo-admin",
        "watch",
        "orders",
        "--interval-ms",
        "500",
        "--max-updates",
        "2",
    ]);

    match args.command {
        Command::Watch(watch) => {
            assert_eq!(watch.resource, ResourceArg::Orders);
            assert_eq!(watch.interval_ms, Some(500));
            assert_eq!(watch.max_updates, Some(2));
        }
        other => panic!("wrong command parsed: {other:?}"),
    }
}
