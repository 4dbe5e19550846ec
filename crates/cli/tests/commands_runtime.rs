use std::env;
use std::sync::{Mutex, OnceLock};

use hrflow_cli::commands::{doctor, migrate, seed};
use serde_json::Value;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("HRFLOW_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
        assert!(
            payload["message"].as_str().unwrap_or("").contains("workflow schema is current"),
            "migrate should report the resulting schema version: {}",
            payload["message"]
        );
    });
}

#[test]
fn migrate_rejects_a_non_sqlite_database_url() {
    with_env(&[("HRFLOW_DATABASE_URL", "postgres://localhost/hrflow")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
        assert!(
            payload["hint"].as_str().unwrap_or("").contains("hrflow config"),
            "failures should carry an operator hint: {}",
            payload["hint"]
        );
    });
}

#[test]
fn seed_reports_the_deterministic_demo_dataset() {
    with_env(&[("HRFLOW_DATABASE_URL", "sqlite::memory:")], || {
        let result = seed::run();
        assert_eq!(result.exit_code, 0, "expected deterministic seed success");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");

        let message = payload["message"].as_str().unwrap_or("");
        assert_eq!(
            message,
            "demo dataset loaded: tenants=1 employees=4 requests=1 decision_seats=3"
        );
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    with_env(&[("HRFLOW_DATABASE_URL", "sqlite::memory:")], || {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");
        let first_payload = parse_payload(&first.output);
        assert_eq!(first_payload["status"], "ok");

        let second = seed::run();
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");
        let second_payload = parse_payload(&second.output);
        assert_eq!(second_payload["status"], "ok");

        assert_eq!(first_payload["message"], second_payload["message"]);
    });
}

#[test]
fn doctor_json_reports_pass_with_valid_env() {
    with_env(&[("HRFLOW_DATABASE_URL", "sqlite::memory:")], || {
        let output = doctor::run(true);
        let payload: Value =
            serde_json::from_str(&output).expect("doctor --json should emit valid JSON");

        assert_eq!(payload["overall_status"], "pass");
        let checks = payload["checks"].as_array().expect("checks array");
        assert_eq!(checks.len(), 3);
        assert!(checks.iter().all(|check| check["status"] != "fail"));

        // A fresh in-memory database connects fine but has no schema yet;
        // the connectivity check should say so.
        let connectivity = checks
            .iter()
            .find(|check| check["name"] == "database_connectivity")
            .expect("connectivity check");
        assert!(
            connectivity["details"].as_str().unwrap_or("").contains("workflow schema missing"),
            "connectivity details should report schema state: {}",
            connectivity["details"]
        );
    });
}

#[test]
fn doctor_reports_failure_when_config_is_invalid() {
    with_env(&[("HRFLOW_LOGGING_LEVEL", "shout")], || {
        let output = doctor::run(true);
        let payload: Value =
            serde_json::from_str(&output).expect("doctor --json should emit valid JSON");

        assert_eq!(payload["overall_status"], "fail");
        assert_eq!(payload["checks"][0]["name"], "config_validation");
        assert_eq!(payload["checks"][0]["status"], "fail");
        assert_eq!(payload["checks"][1]["status"], "skipped");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "HRFLOW_DATABASE_URL",
        "HRFLOW_DATABASE_MAX_CONNECTIONS",
        "HRFLOW_DATABASE_TIMEOUT_SECS",
        "HRFLOW_SERVER_BIND_ADDRESS",
        "HRFLOW_SERVER_PORT",
        "HRFLOW_SERVER_HEALTH_CHECK_PORT",
        "HRFLOW_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "HRFLOW_AUTH_ADMIN_TOKEN",
        "HRFLOW_LOGGING_LEVEL",
        "HRFLOW_LOGGING_FORMAT",
        "HRFLOW_LOG_LEVEL",
        "HRFLOW_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
