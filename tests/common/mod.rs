#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use robobar::{
    create_app, repositories::InMemorySessionRepository, services::OrderService, Metrics,
    RequestLimits,
};
use serde_json::Value;
use tokio::net::TcpListener;

pub struct TestEnvironment {
    pub client: Client,
    pub base_url: String,
    pub order_service: Arc<OrderService>,
}

impl TestEnvironment {
    pub async fn new() -> Self {
        Self::with_max_sessions(100).await
    }

    /// Start the real application on an ephemeral port
    pub async fn with_max_sessions(max_sessions: usize) -> Self {
        let metrics = Arc::new(Metrics::new().expect("Failed to create metrics"));
        let repository = Arc::new(InMemorySessionRepository::new(max_sessions));
        let order_service = Arc::new(OrderService::new(repository, metrics.clone()));

        let app = create_app(
            order_service.clone(),
            metrics,
            RequestLimits {
                timeout: Duration::from_secs(10),
                max_request_size: 64 * 1024,
            },
        );

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind listener");
        let addr = listener.local_addr().expect("Failed to get local address");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Failed to serve app");
        });

        // Wait for server to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        Self {
            client: Client::new(),
            base_url,
            order_service,
        }
    }

    /// Open a session and return its id
    pub async fn open_session(&self) -> String {
        let response = self
            .client
            .post(format!("{}/api/orders", self.base_url))
            .send()
            .await
            .expect("Failed to open session");
        assert_eq!(response.status().as_u16(), 201);

        let body: Value = response.json().await.expect("Failed to parse response");
        body["session_id"]
            .as_str()
            .expect("Missing session_id")
            .to_string()
    }

    /// POST a workflow step and return (status, body)
    pub async fn post(&self, path: &str, body: Option<Value>) -> (u16, Value) {
        let mut request = self.client.post(format!("{}{}", self.base_url, path));
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await.expect("Failed to send request");
        Self::read(response).await
    }

    pub async fn get(&self, path: &str) -> (u16, Value) {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("Failed to send request");
        Self::read(response).await
    }

    pub async fn increment(&self, session_id: &str, drink_id: u32) -> (u16, Value) {
        self.post(
            &format!("/api/orders/{}/drinks/{}/increment", session_id, drink_id),
            None,
        )
        .await
    }

    pub async fn decrement(&self, session_id: &str, drink_id: u32) -> (u16, Value) {
        self.post(
            &format!("/api/orders/{}/drinks/{}/decrement", session_id, drink_id),
            None,
        )
        .await
    }

    async fn read(response: reqwest::Response) -> (u16, Value) {
        let status = response.status().as_u16();
        let text = response.text().await.expect("Failed to read body");
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        (status, body)
    }
}

pub fn quantities(view: &Value) -> Vec<u64> {
    view["drinks"]
        .as_array()
        .expect("Missing drinks")
        .iter()
        .map(|drink| drink["quantity"].as_u64().expect("Missing quantity"))
        .collect()
}
