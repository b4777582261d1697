mod common;

use common::MockApi;
use std::time::Duration;
use textsynth::{
    AudioFile, ChatMessage, Engine, ErrorKind, GenerationOptions, Result, TextSynthClient,
    TextSynthError, TextToImageOptions, TokenizeOptions, TranscriptOptions, TranslateOptions,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

/// Calls one endpoint with a valid request, discarding the answer.
async fn call(engine: &Engine, endpoint: &str) -> Result<()> {
    let options = GenerationOptions::new();
    match endpoint {
        "completions" => engine.completions("Hello", &options).await.map(drop),
        "chat" => engine
            .chat(&[ChatMessage::user("Hello")], &options)
            .await
            .map(drop),
        "translate" => engine
            .translate(&["Hello"], &TranslateOptions::new("en", "fr"))
            .await
            .map(drop),
        "logprob" => engine.logprob("Hello", " world").await.map(drop),
        "tokenize" => engine
            .tokenize("Hello", &TokenizeOptions::new())
            .await
            .map(drop),
        "text_to_image" => engine
            .text_to_image("a cat", &TextToImageOptions::new())
            .await
            .map(drop),
        "transcript" => engine
            .transcript(
                &AudioFile::new("talk.mp3", b"audio".to_vec()),
                &TranscriptOptions::new("en"),
            )
            .await
            .map(drop),
        other => panic!("no such endpoint: {other}"),
    }
}

const ENDPOINTS: [&str; 7] = [
    "completions",
    "chat",
    "translate",
    "logprob",
    "tokenize",
    "text_to_image",
    "transcript",
];

#[tokio::test]
async fn test_status_classification_on_every_endpoint() {
    let cases = [
        (400, ErrorKind::Validation),
        (401, ErrorKind::Authentication),
        (403, ErrorKind::Authentication),
        (429, ErrorKind::RateLimited),
        (500, ErrorKind::Service),
        (503, ErrorKind::Service),
    ];
    for endpoint in ENDPOINTS {
        for (status, kind) in cases {
            let mut api = MockApi::new().await;
            api.mock_endpoint(
                endpoint,
                status,
                &format!(r#"{{"status": {status}, "error": "failed with {status}"}}"#),
            )
            .await;
            let err = call(&api.engine(), endpoint).await.unwrap_err();
            assert_eq!(err.kind(), kind, "{endpoint} answered {status}");
            assert!(
                err.to_string().contains(&format!("failed with {status}")),
                "{endpoint}: {err}"
            );
        }
    }
}

#[tokio::test]
async fn test_rate_limit_carries_retry_after() {
    let mut api = MockApi::new().await;
    api.server
        .mock("POST", common::endpoint_path("completions").as_str())
        .with_status(429)
        .with_header("retry-after", "30")
        .with_body(r#"{"error": "too many requests"}"#)
        .create_async()
        .await;
    let err = call(&api.engine(), "completions").await.unwrap_err();
    match err {
        TextSynthError::RateLimited {
            retry_after,
            message,
        } => {
            assert_eq!(retry_after, Some(30));
            assert_eq!(message, "too many requests");
        }
        other => panic!("Expected RateLimited variant, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unexpected_status_is_a_service_error() {
    let mut api = MockApi::new().await;
    api.mock_endpoint("completions", 402, "payment required").await;
    let err = call(&api.engine(), "completions").await.unwrap_err();
    match err {
        TextSynthError::Service { status, message } => {
            assert_eq!(status.as_u16(), 402);
            assert_eq!(message, "payment required");
        }
        other => panic!("Expected Service variant, got {other:?}"),
    }
}

#[tokio::test]
async fn test_wrong_key_on_credits() {
    let mut api = MockApi::new().await;
    api.server
        .mock("GET", "/v1/credits")
        .with_status(401)
        .with_body(r#"{"error": "invalid API key"}"#)
        .create_async()
        .await;
    let err = api.client.credits().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert_eq!(err.to_string(), "authentication error: invalid API key");
}

#[tokio::test]
async fn test_credits_status_classification() {
    let cases = [
        (401, ErrorKind::Authentication),
        (403, ErrorKind::Authentication),
        (429, ErrorKind::RateLimited),
        (500, ErrorKind::Service),
        (503, ErrorKind::Service),
    ];
    for (status, kind) in cases {
        let mut api = MockApi::new().await;
        api.server
            .mock("GET", "/v1/credits")
            .with_status(status)
            .with_body(format!(r#"{{"error": "credits failed with {status}"}}"#))
            .create_async()
            .await;
        let err = api.client.credits().await.unwrap_err();
        assert_eq!(err.kind(), kind, "credits answered {status}");
        assert!(err.to_string().contains(&format!("credits failed with {status}")));
    }
}

/// A server that accepts connections and runs `respond` on each of them.
async fn raw_server<F, Fut>(respond: F) -> String
where
    F: Fn(TcpStream) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(respond(socket));
        }
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_silent_server_is_a_timeout() {
    let host = raw_server(|socket| async move {
        // hold the connection open without ever answering
        tokio::time::sleep(Duration::from_secs(30)).await;
        drop(socket);
    })
    .await;
    let client = TextSynthClient::builder()
        .host(host)
        .secret_key("k")
        .timeout(Duration::from_millis(300))
        .build()
        .unwrap();
    let err = client
        .engine("gptj_6B")
        .unwrap()
        .completions("Hello", &GenerationOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout, "{err}");
}

#[tokio::test]
async fn test_unreadable_error_body_keeps_the_status() {
    let host = raw_server(|mut socket| async move {
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;
        // promise more bytes than are sent, then hang up
        let _ = socket
            .write_all(b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 100\r\n\r\nshort")
            .await;
        let _ = socket.shutdown().await;
    })
    .await;
    let client = TextSynthClient::new(host, "k").unwrap();
    let err = client.credits().await.unwrap_err();
    match err {
        TextSynthError::Service { status, message } => {
            assert_eq!(status.as_u16(), 500);
            assert!(message.contains("error body unreadable"), "{message}");
        }
        other => panic!("Expected Service variant, got {other:?}"),
    }
}
