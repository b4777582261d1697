//! Mock TextSynth server shared by the integration tests.

#![allow(dead_code)]

use mockito::{Matcher, Mock, Server, ServerGuard};
use textsynth::{Engine, TextSynthClient};

pub const SECRET_KEY: &str = "test-key";
pub const ENGINE_ID: &str = "gptj_6B";

/// A mockito server plus a client pointed at it.
pub struct MockApi {
    pub server: ServerGuard,
    pub client: TextSynthClient,
}

impl MockApi {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let client = TextSynthClient::new(server.url(), SECRET_KEY).expect("client");
        Self { server, client }
    }

    pub fn engine(&self) -> Engine {
        self.client.engine(ENGINE_ID).expect("engine")
    }

    /// Mocks a JSON answer on one engine endpoint.
    pub async fn mock_endpoint(&mut self, endpoint: &str, status: usize, body: &str) -> Mock {
        self.server
            .mock("POST", endpoint_path(endpoint).as_str())
            .match_header("authorization", format!("Bearer {SECRET_KEY}").as_str())
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// Fails the test if any request at all reaches the server.
    pub async fn expect_no_requests(&mut self) -> Vec<Mock> {
        let mut mocks = Vec::new();
        for method in ["GET", "POST"] {
            mocks.push(
                self.server
                    .mock(method, Matcher::Any)
                    .expect(0)
                    .create_async()
                    .await,
            );
        }
        mocks
    }
}

pub fn endpoint_path(endpoint: &str) -> String {
    format!("/v1/engines/{ENGINE_ID}/{endpoint}")
}

/// Joins JSON documents the way the streaming endpoints separate them.
pub fn stream_body(chunks: &[&str]) -> String {
    chunks.iter().map(|chunk| format!("{chunk}\n\n")).collect()
}
