//! Mock sandbox endpoint for integration tests

use mockito::{Matcher, Mock, Server, ServerGuard};
use sandbox_classify::{ClassificationClient, ClientConfig};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub const INVOKE_PATH: &str = "/invoke";
pub const TEST_TOKEN: &str = "test-token";

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: Arc<Mutex<ServerGuard>>,
    pub endpoint: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let endpoint = format!("{}{}", server.url(), INVOKE_PATH);
        Self {
            server: Arc::new(Mutex::new(server)),
            endpoint,
        }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(&self.endpoint).with_auth_token(TEST_TOKEN)
    }

    /// Create a client pointed at the mock server with built-in tasks
    pub fn create_test_client(&self) -> sandbox_classify::Result<ClassificationClient> {
        ClassificationClient::builder().config(self.config()).build()
    }

    /// Successful answer for one sandbox function, expected exactly once
    pub async fn mock_function(&self, function_name: &str, answer: &str) -> Mock {
        self.mock_function_times(function_name, answer, 1).await
    }

    pub async fn mock_function_times(
        &self,
        function_name: &str,
        answer: &str,
        hits: usize,
    ) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", INVOKE_PATH)
            .match_header("x-function-name", function_name)
            .expect(hits)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(serde_json::json!({ "response": answer }).to_string())
            .create_async()
            .await
    }

    /// Successful answer whose body is only written after `delay`
    pub async fn mock_delayed(&self, function_name: &str, answer: &str, delay: Duration) -> Mock {
        let body = serde_json::json!({ "response": answer }).to_string();
        let mut server = self.server.lock().await;
        server
            .mock("POST", INVOKE_PATH)
            .match_header("x-function-name", function_name)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_chunked_body(move |w| {
                std::thread::sleep(delay);
                w.write_all(body.as_bytes())
            })
            .create_async()
            .await
    }

    /// Raw response body for one sandbox function
    pub async fn mock_raw(&self, function_name: &str, status: usize, body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", INVOKE_PATH)
            .match_header("x-function-name", function_name)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// Answer only when the body contains `partial`
    pub async fn mock_matching_body(
        &self,
        function_name: &str,
        partial: serde_json::Value,
        answer: &str,
    ) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", INVOKE_PATH)
            .match_header("x-function-name", function_name)
            .match_body(Matcher::PartialJson(partial))
            .with_status(200)
            .with_body(serde_json::json!({ "response": answer }).to_string())
            .create_async()
            .await
    }

    /// Catch-all that must never be hit
    pub async fn mock_no_requests(&self) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await
    }
}
