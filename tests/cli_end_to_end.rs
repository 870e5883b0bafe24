use assert_cmd::Command;
use httpmock::prelude::*;
use predicates::str::contains;
use serde_json::{Value, json};

fn loumo_admin(server: &MockServer) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("loumo-admin"));
    cmd.env_remove("LOUMO_CONFIG_FILE")
        .arg("--backend-url")
        .arg(server.url("/api/"))
        .arg("--log-level")
        .arg("warn");
    cmd
}

#[test]
fn categories_list_prints_filtered_json() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/categories");
        then.status(200).json_body(json!([
            {"id": 1, "name": "Fruits", "product_count": 12},
            {"id": 2, "name": "Vegetables", "product_count": 8}
        ]));
    });

    let assert = loumo_admin(&server)
        .args(["categories", "list", "--search", "veg"])
        .assert()
        .success();

    let output: Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("stdout is json");
    let names: Vec<&str> = output
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|row| row["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Vegetables"]);
    mock.assert();
}

#[test]
fn order_status_update_prints_the_updated_order() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(PATCH)
            .path("/api/orders/42/status")
            .json_body(json!({"status": "completed"}));
        then.status(200).json_body(json!({
            "id": 42,
            "reference": "LM-0042",
            "client_id": 7,
            "client_name": "Awa",
            "status": "completed",
            "total": 12500.0,
            "created_at": "2026-10-01T09:30:00Z"
        }));
    });

    let assert = loumo_admin(&server)
        .args(["orders", "set-status", "--id", "42", "--status", "completed"])
        .assert()
        .success();

    let output: Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("stdout is json");
    assert_eq!(output["reference"], "LM-0042");
    assert_eq!(output["status"], "completed");
    mock.assert();
}

#[test]
fn invalid_input_fails_without_calling_backend() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/api/zones");
        then.status(201);
    });

    loumo_admin(&server)
        .args(["zones", "create", "--name", "Plateau", "--delivery-fee=-5"])
        .assert()
        .failure()
        .stderr(contains("delivery_fee"));

    assert_eq!(mock.hits(), 0);
}

#[test]
fn backend_failure_is_reported_on_stderr() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/products/bulk-delete");
        then.status(500)
            .json_body(json!({"message": "database unavailable"}));
    });

    loumo_admin(&server)
        .args(["products", "delete", "--ids", "4,5"])
        .assert()
        .failure()
        .stderr(contains("database unavailable"));
}
