#![allow(dead_code)]

use call_rates_api::ports::IntentLog;
use call_rates_api::store::MemoryStore;
use call_rates_api::v1::call_rates::RateDispatcher;
use call_rates_api::{app, AppState};
use chrono::{Duration as ChronoDuration, Utc};
use conf_client::{create_client, ConfSettings};
use postgres_models::{Compensation, Currency, IntentAction, NewRateIntent, RateIntent};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SUCCESS_CODE: &str = "2901";
pub const ERROR_CODE: &str = "2904";

/// API served on an ephemeral port, backed by the in-memory store and a mocked
/// conf service.
pub struct TestApp {
    pub address: String,
    pub conf: MockServer,
    pub dispatcher: RateDispatcher,
    client: Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let conf = MockServer::start().await;
        ConfMock::accepts(&conf).await;

        let conf_client =
            create_client(&ConfSettings::new(conf.uri())).expect("Failed to build conf client");
        let store = Arc::new(MemoryStore::with_currencies(TestData::currencies()));
        let dispatcher = RateDispatcher::new(store.clone(), store, Arc::new(conf_client));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let address = format!("http://{}", listener.local_addr().unwrap());

        let router = app(AppState::from_dispatcher(dispatcher.clone()));
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            address,
            conf,
            dispatcher,
            client: Client::new(),
        }
    }

    /// POST an operation and return the HTTP status with the decoded envelope.
    pub async fn call(&self, op: &str, id: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut request = self
            .client
            .post(format!("{}/v1/call-rates/{}", self.address, op))
            .json(&body);
        if let Some(id) = id {
            request = request.query(&[("id", id)]);
        }

        let response = request.send().await.expect("Failed to send request");
        let status = response.status();
        let envelope: Value = response.json().await.expect("Failed to parse JSON response");
        (status, envelope)
    }

    /// Call and expect a success envelope; returns `msg`.
    pub async fn call_ok(&self, op: &str, id: Option<&str>, body: Value) -> Value {
        let (status, envelope) = self.call(op, id, body).await;
        assert_eq!(status, StatusCode::OK, "unexpected status: {}", envelope);
        assert_eq!(envelope["code"], SUCCESS_CODE, "expected success: {}", envelope);
        envelope["msg"].clone()
    }

    /// Call and expect a business error; returns `msg.error`.
    pub async fn call_err(&self, op: &str, id: Option<&str>, body: Value) -> Value {
        let (status, envelope) = self.call(op, id, body).await;
        assert_eq!(status, StatusCode::OK, "unexpected status: {}", envelope);
        assert_eq!(envelope["code"], ERROR_CODE, "expected business error: {}", envelope);
        envelope["msg"]["error"].clone()
    }

    /// Create a rate and return its id.
    pub async fn create_rate(&self, body: Value) -> i32 {
        let msg = self.call_ok("create", None, body).await;
        msg["data"]["id"].as_i64().expect("Missing rate id") as i32
    }

    pub async fn show(&self, id: i32) -> Value {
        self.call_ok("show", Some(&id.to_string()), json!({})).await["data"].clone()
    }

    pub async fn rate_count(&self) -> usize {
        let msg = self.call_ok("basicListRate", None, json!({})).await;
        msg["data"].as_array().expect("Missing rate list").len()
    }

    /// Intents still pending, regardless of age.
    pub async fn pending_intents(&self) -> Vec<RateIntent> {
        self.dispatcher
            .intents()
            .pending_intents(Utc::now() + ChronoDuration::hours(1))
            .await
            .expect("Failed to read intents")
    }

    /// Record a pending intent directly, as a request that died mid-way would leave it.
    pub async fn record_intent(
        &self,
        action: IntentAction,
        rate_name: &str,
        rate_id: Option<i32>,
        compensation: Compensation,
    ) -> RateIntent {
        let mut intent = NewRateIntent::new(action, rate_name.to_string(), &compensation)
            .expect("Failed to encode compensation");
        if let Some(rate_id) = rate_id {
            intent = intent.with_rate_id(rate_id);
        }
        self.dispatcher
            .intents()
            .record_intent(intent)
            .await
            .expect("Failed to record intent")
    }

    /// Bodies of the rate notifications the conf service has received.
    pub async fn conf_notifications(&self) -> Vec<Value> {
        self.conf
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.url.path() == "/rates.php")
            .map(|request| request.body_json::<Value>().expect("Invalid conf request body"))
            .collect()
    }
}

/// Canned behaviours of the conf service.
pub struct ConfMock;

impl ConfMock {
    pub async fn accepts(server: &MockServer) {
        server.reset().await;
        Self::healthy(server).await;
        Mock::given(method("POST"))
            .and(path("/rates.php"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"state": "OK", "log": "Complete"})),
            )
            .mount(server)
            .await;
    }

    /// Reachable, but every rate notification comes back unconfirmed.
    pub async fn rejects(server: &MockServer) {
        server.reset().await;
        Self::healthy(server).await;
        Mock::given(method("POST"))
            .and(path("/rates.php"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"state": "ERROR", "log": "rates.conf not written"})),
            )
            .mount(server)
            .await;
    }

    pub async fn down(server: &MockServer) {
        server.reset().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(503))
            .mount(server)
            .await;
    }

    async fn healthy(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(server)
            .await;
    }
}

/// Test data generators
pub struct TestData;

impl TestData {
    pub fn currencies() -> Vec<Currency> {
        vec![
            Currency {
                id: 1,
                name: "Euro".to_string(),
                currency: "EUR".to_string(),
                symbol: Some("€".to_string()),
            },
            Currency {
                id: 2,
                name: "US Dollar".to_string(),
                currency: "USD".to_string(),
                symbol: None,
            },
        ]
    }

    pub fn rate(name: &str) -> Value {
        json!({
            "name": name,
            "prefix": "0039",
            "number_of_digits": "2",
            "min_rate": "0.10",
            "sec_rate": "0.002",
            "currency_id": "1",
        })
    }
}
