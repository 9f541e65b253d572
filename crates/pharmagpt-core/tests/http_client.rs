//! Runs the real reqwest client against a throwaway HTTP responder.

use std::sync::Arc;

use pharmagpt_core::{
    PharmaBackend, PharmaClient, RequestError, RequestOrchestrator, SearchStore, SessionStore,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serve exactly one canned response and hand back the raw request text
async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;

        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        request
    });

    (base_url, handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[tokio::test]
async fn test_chat_round_trip() {
    let (base_url, server) = serve_once(
        "200 OK",
        r#"{"answer": "Take 400mg every 6 hours.", "sources": [{"name": "Ibuprofen"}]}"#,
    )
    .await;
    let orchestrator = RequestOrchestrator::new(Arc::new(PharmaClient::new(&base_url)));
    let mut store = SessionStore::new();

    orchestrator
        .submit_chat(&mut store, "ibuprofen dose?")
        .await
        .unwrap();

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /chat "));
    assert!(request.contains(r#""message":"ibuprofen dose?""#));
    assert!(request.contains(r#""history":[]"#));

    assert_eq!(store.history().len(), 2);
    assert_eq!(store.history()[1].content, "Take 400mg every 6 hours.");
    assert_eq!(store.history()[1].sources[0].label(0), "Ibuprofen");
    assert!(!store.is_loading());
}

#[tokio::test]
async fn test_chat_server_error_without_body() {
    let (base_url, server) = serve_once("500 Internal Server Error", "").await;
    let orchestrator = RequestOrchestrator::new(Arc::new(PharmaClient::new(&base_url)));
    let mut store = SessionStore::new();

    orchestrator.submit_chat(&mut store, "hello").await.unwrap();
    server.await.unwrap();

    assert_eq!(store.error_message(), Some("Server error 500"));
    assert_eq!(store.history().len(), 1);
    assert_eq!(store.history()[0].content, "hello");
    assert!(!store.is_loading());
}

#[tokio::test]
async fn test_search_detail_is_surfaced() {
    let (base_url, server) = serve_once(
        "422 Unprocessable Entity",
        r#"{"detail": "top_k must be positive"}"#,
    )
    .await;
    let orchestrator = RequestOrchestrator::new(Arc::new(PharmaClient::new(&base_url)));
    let mut store = SearchStore::new();

    orchestrator.submit_search(&mut store, "cough").await.unwrap();
    let request = server.await.unwrap();

    assert!(request.starts_with("POST /search "));
    assert!(request.contains(r#""top_k":5"#));
    assert_eq!(store.error_message(), Some("top_k must be positive"));
    assert!(store.results().is_empty());
    assert!(!store.is_loading());
}

#[tokio::test]
async fn test_search_results_are_parsed() {
    let (base_url, server) = serve_once(
        "200 OK",
        r#"[{"name": "Paracetamol", "benefits": "Reduces fever", "side_effects": "Rare liver damage",
             "safety_advice": "Do not exceed 4g a day", "relevance_score": 0.5}]"#,
    )
    .await;
    let client = PharmaClient::new(&base_url);
    let orchestrator = RequestOrchestrator::new(Arc::new(client));
    let mut store = SearchStore::new();

    orchestrator
        .submit_search(&mut store, "headache and fever")
        .await
        .unwrap();
    server.await.unwrap();

    assert_eq!(store.results().len(), 1);
    let relevance = pharmagpt_core::Relevance::from_score(store.results()[0].relevance_score);
    assert_eq!(relevance.label(), "High Match");
}

#[tokio::test]
async fn test_malformed_success_body_is_reported() {
    let (base_url, server) = serve_once("200 OK", "not json").await;
    let orchestrator = RequestOrchestrator::new(Arc::new(PharmaClient::new(&base_url)));
    let mut store = SessionStore::new();

    orchestrator.submit_chat(&mut store, "hello").await.unwrap();
    server.await.unwrap();

    assert!(store.error_message().is_some());
    assert_eq!(store.history().len(), 1);
    assert!(!store.is_loading());
}

#[tokio::test]
async fn test_unreachable_service_is_network_error() {
    // Grab a free port, then close it so nothing is listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = PharmaClient::new(&base_url);
    let err = client.welcome().await.unwrap_err();
    assert!(matches!(err, RequestError::Network(_)));
    assert!(!err.to_string().is_empty());

    let orchestrator = RequestOrchestrator::new(Arc::new(client));
    let mut store = SessionStore::new();
    orchestrator.submit_chat(&mut store, "anyone there?").await.unwrap();

    assert!(store.error_message().is_some());
    assert_eq!(store.history().len(), 1);
    assert!(!store.is_loading());

    let mut search = SearchStore::new();
    orchestrator.submit_search(&mut search, "fever").await.unwrap();

    assert!(search.error_message().is_some());
    assert!(search.results().is_empty());
    assert!(!search.is_loading());
}

#[tokio::test]
async fn test_welcome_probe() {
    let (base_url, server) = serve_once("200 OK", r#"{"message": "Welcome to PharmaGPT API"}"#).await;
    let client = PharmaClient::new(&base_url);

    let message = client.welcome().await.unwrap();
    let request = server.await.unwrap();

    assert!(request.starts_with("GET / "));
    assert_eq!(message, "Welcome to PharmaGPT API");
}
