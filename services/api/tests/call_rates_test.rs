mod common;

use common::*;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_health() {
    let app = TestApp::spawn().await;

    let body: serde_json::Value = reqwest::get(format!("{}/health", app.address))
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON response");

    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_create_then_show_returns_the_same_record() {
    let app = TestApp::spawn().await;

    let created = app.call_ok("create", None, TestData::rate("europe")).await;
    let id = created["data"]["id"].as_i64().unwrap() as i32;

    let shown = app.show(id).await;
    assert_eq!(shown, created["data"]);
    assert_eq!(shown["name"], "europe");
    assert_eq!(shown["min_rate"], "0.10");
    assert_eq!(shown["sec_rate"], "0.002");
    assert_eq!(shown["number_of_digits"], 2);
    assert_eq!(shown["status"], "ACTIVE");
    assert_eq!(shown["currency"]["currency"], "EUR");

    let notifications = app.conf_notifications().await;
    assert_eq!(notifications, vec![json!({"action": "Create", "name": "europe"})]);
    assert!(app.pending_intents().await.is_empty());
}

#[tokio::test]
async fn test_show_without_currency() {
    let app = TestApp::spawn().await;

    let id = app
        .create_rate(json!({"name": "local", "min_rate": "1", "sec_rate": "0.5"}))
        .await;
    let missing_currency = app
        .create_rate(json!({"name": "orphan", "min_rate": "1", "sec_rate": "0.5", "currency_id": "42"}))
        .await;

    assert!(app.show(id).await["currency"].is_null());
    assert!(app.show(missing_currency).await["currency"].is_null());
}

#[tokio::test]
async fn test_numeric_op_codes() {
    let app = TestApp::spawn().await;

    let created = app.call_ok("2510", None, TestData::rate("americas")).await;
    let id = created["data"]["id"].as_i64().unwrap().to_string();

    let shown = app.call_ok("2500", Some(&id), json!({})).await;
    assert_eq!(shown["data"]["name"], "americas");

    let listed = app.call_ok("2519", None, json!({})).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);

    let currencies = app.call_ok("2518", None, json!({})).await;
    assert_eq!(currencies["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_unknown_op_code_is_a_server_error() {
    let app = TestApp::spawn().await;

    let (status, envelope) = app.call("2599", None, json!({})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(envelope, json!({"code": "2904", "msg": {"error": "serverError"}}));
}

#[tokio::test]
async fn test_name_is_unique_ignoring_case() {
    let app = TestApp::spawn().await;

    app.create_rate(TestData::rate("Europe")).await;
    let error = app.call_err("create", None, TestData::rate("EUROPE")).await;

    assert_eq!(error, "Name already exists");
    assert_eq!(app.rate_count().await, 1);
}

#[tokio::test]
async fn test_update_may_keep_its_own_name() {
    let app = TestApp::spawn().await;
    let id = app.create_rate(TestData::rate("europe")).await;

    let updated = app
        .call_ok(
            "update",
            Some(&id.to_string()),
            json!({"name": "Europe", "min_rate": "0.25"}),
        )
        .await;

    assert_eq!(updated["data"]["name"], "Europe");
    assert_eq!(updated["data"]["min_rate"], "0.25");
    assert_eq!(updated["data"]["prefix"], "0039");
}

#[tokio::test]
async fn test_update_rejects_name_of_another_rate() {
    let app = TestApp::spawn().await;
    app.create_rate(TestData::rate("europe")).await;
    let id = app.create_rate(TestData::rate("asia")).await;

    let error = app
        .call_err("update", Some(&id.to_string()), json!({"name": "EUROPE"}))
        .await;

    assert_eq!(error, "Name already exists");
    assert_eq!(app.show(id).await["name"], "asia");
}

#[tokio::test]
async fn test_update_clears_nullable_fields() {
    let app = TestApp::spawn().await;
    let id = app.create_rate(TestData::rate("europe")).await;

    let updated = app
        .call_ok(
            "update",
            Some(&id.to_string()),
            json!({"prefix": "--", "currency_id": ""}),
        )
        .await;

    assert!(updated["data"]["prefix"].is_null());
    assert!(updated["data"]["currency_id"].is_null());
    assert!(updated["data"]["currency"].is_null());
}

#[tokio::test]
async fn test_update_unknown_rate() {
    let app = TestApp::spawn().await;

    let error = app
        .call_err("update", Some("999"), json!({"min_rate": "1"}))
        .await;

    assert_eq!(error, "notFoundError");
}

#[tokio::test]
async fn test_validation_reports_every_field() {
    let app = TestApp::spawn().await;

    let error = app
        .call_err(
            "create",
            None,
            json!({"name": "bad name!", "number_of_digits": "123", "sec_rate": "x"}),
        )
        .await;

    let fields = error.as_object().expect("validation errors are a field map");
    for field in ["name", "number_of_digits", "min_rate", "sec_rate"] {
        assert!(fields.contains_key(field), "missing error for {field}: {error}");
    }
    assert_eq!(app.rate_count().await, 0);
    assert!(app.conf_notifications().await.is_empty());
}

#[tokio::test]
async fn test_missing_or_invalid_id() {
    let app = TestApp::spawn().await;

    for op in ["show", "update", "delete", "enable", "disable"] {
        assert_eq!(app.call_err(op, None, json!({})).await, "id is empty", "{op}");
        assert_eq!(
            app.call_err(op, Some("abc"), json!({})).await,
            "id is empty",
            "{op}"
        );
    }
}

#[tokio::test]
async fn test_show_unknown_rate() {
    let app = TestApp::spawn().await;

    assert_eq!(app.call_err("show", Some("999"), json!({})).await, "notFoundError");
}

#[tokio::test]
async fn test_show_over_get() {
    let app = TestApp::spawn().await;
    let id = app.create_rate(TestData::rate("europe")).await;

    let envelope: serde_json::Value = reqwest::get(format!(
        "{}/v1/call-rates/show?id={}",
        app.address, id
    ))
    .await
    .expect("Failed to send request")
    .json()
    .await
    .expect("Failed to parse JSON response");

    assert_eq!(envelope["code"], "2901");
    assert_eq!(envelope["msg"]["data"]["id"], id);
}

#[tokio::test]
async fn test_delete_removes_the_rate() {
    let app = TestApp::spawn().await;
    let id = app.create_rate(TestData::rate("europe")).await;

    let msg = app.call_ok("delete", Some(&id.to_string()), json!({})).await;
    assert_eq!(msg, json!({"data": {"delete": true}}));

    assert_eq!(app.call_err("show", Some(&id.to_string()), json!({})).await, "notFoundError");
    assert_eq!(app.call_err("delete", Some(&id.to_string()), json!({})).await, "notFoundError");
}

#[tokio::test]
async fn test_enable_and_disable() {
    let app = TestApp::spawn().await;
    let id = app.create_rate(TestData::rate("europe")).await;
    let id_text = id.to_string();

    let msg = app.call_ok("disable", Some(&id_text), json!({})).await;
    assert_eq!(msg, json!({"data": {"inactive": true}}));
    assert_eq!(app.show(id).await["status"], "INACTIVE");

    let msg = app.call_ok("enable", Some(&id_text), json!({})).await;
    assert_eq!(msg, json!({"data": {"active": true}}));
    assert_eq!(app.show(id).await["status"], "ACTIVE");
}

#[tokio::test]
async fn test_status_change_on_unknown_rate() {
    let app = TestApp::spawn().await;

    assert_eq!(app.call_err("enable", Some("999"), json!({})).await, "notFoundError");
    assert_eq!(app.call_err("disable", Some("999"), json!({})).await, "notFoundError");
    assert!(app.conf_notifications().await.is_empty());
}

#[tokio::test]
async fn test_list_pagination() {
    let app = TestApp::spawn().await;
    for i in 1..=25 {
        app.create_rate(TestData::rate(&format!("rate-{:02}", i))).await;
    }

    let msg = app
        .call_ok("list", None, json!({"page": 2, "perpage": 10}))
        .await;

    assert_eq!(msg["from"], 11);
    assert_eq!(msg["to"], 20);
    assert_eq!(msg["per_page"], 10);
    assert_eq!(msg["totalhits"], 25);
    assert_eq!(msg["current_page"], 2);

    let rows = msg["data"].as_array().unwrap();
    assert_eq!(rows.len(), 10);
    assert_eq!(rows[0]["tr"][0], json!({"td": "name", "value": "rate-11"}));
    assert_eq!(rows[0]["tr"][1], json!({"td": "currency", "value": "Euro"}));

    let last = app
        .call_ok("list", None, json!({"page": 3, "perpage": 10}))
        .await;
    assert_eq!(last["from"], 21);
    assert_eq!(last["to"], 25);
}

#[tokio::test]
async fn test_list_filters_and_orders() {
    let app = TestApp::spawn().await;
    app.create_rate(TestData::rate("europe-east")).await;
    app.create_rate(TestData::rate("europe-west")).await;
    app.create_rate(TestData::rate("asia")).await;

    let msg = app
        .call_ok(
            "list",
            None,
            json!({"filters": {"name": "EUR"}, "order": "desc", "orderField": "name"}),
        )
        .await;

    let names: Vec<_> = msg["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["tr"][0]["value"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["europe-west", "europe-east"]);
    assert_eq!(msg["totalhits"], 2);
}

#[tokio::test]
async fn test_list_empty_result() {
    let app = TestApp::spawn().await;

    let msg = app
        .call_ok("list", None, json!({"filters": {"name": "nothing"}}))
        .await;

    assert_eq!(msg, json!({"data": []}));
}

#[tokio::test]
async fn test_list_rejects_bad_ordering_and_paging() {
    let app = TestApp::spawn().await;

    assert_eq!(
        app.call_err("list", None, json!({"orderField": "password"})).await,
        "Invalid orderField"
    );
    assert_eq!(
        app.call_err("list", None, json!({"order": "sideways"})).await,
        "order must be asc or desc"
    );
    assert_eq!(
        app.call_err("list", None, json!({"page": 0})).await,
        "page and perpage must be positive integers"
    );
}
