//! Tests for the embedded HTTP entry point (`RpcServer::serve_request`).

use std::net::SocketAddr;
use std::sync::Arc;

use http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};

use phoenix_rpc::{InMemoryDag, RpcConfig, RpcServer};

fn server(config: RpcConfig) -> (Arc<InMemoryDag>, RpcServer<InMemoryDag>) {
    let dag = Arc::new(InMemoryDag::default());
    let server = RpcServer::new(config, Arc::clone(&dag)).unwrap();
    (dag, server)
}

fn post(body: impl Into<Vec<u8>>) -> Request<Vec<u8>> {
    Request::builder()
        .method(Method::POST)
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

fn body_json(body: &str) -> Value {
    serde_json::from_str(body).expect("response body is not JSON")
}

/// Test that a well-formed envelope gets a 200 and the method's result.
#[tokio::test]
async fn test_well_formed_request() {
    let (dag, server) = server(RpcConfig::default());
    for _ in 0..3 {
        dag.extend_virtual(0).unwrap();
    }

    let request = json!({"jsonrpc": "2.0", "id": 1, "method": "eth_blockNumber", "params": []});
    let response = server.serve_request(post(request.to_string())).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let body = body_json(response.body());
    assert_eq!(body["id"], 1);
    assert_eq!(body["result"], "0x3");
}

/// Test that serve_request works without the HTTP transport running.
#[tokio::test]
async fn test_serve_without_start() {
    let (_dag, server) = server(RpcConfig::with_chain_id(888));

    let request = json!({"jsonrpc": "2.0", "id": "a", "method": "eth_chainId"});
    let response = server.serve_request(post(request.to_string())).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.body());
    assert_eq!(body["id"], "a");
    assert_eq!(body["result"], "0x378");
}

/// Test placeholder methods through the embedded entry point.
#[tokio::test]
async fn test_placeholders() {
    let (_dag, server) = server(RpcConfig::default());

    let request = json!({
        "jsonrpc": "2.0",
        "id": 7,
        "method": "eth_getBlockByNumber",
        "params": ["latest", false],
    });
    let body = body_json(server.serve_request(post(request.to_string())).await.body());
    assert!(body["result"].is_null());
    assert!(body.get("error").is_none());

    let request = json!({
        "jsonrpc": "2.0",
        "id": 8,
        "method": "eth_sendRawTransaction",
        "params": ["0xdeadbeef"],
    });
    let body = body_json(server.serve_request(post(request.to_string())).await.body());
    assert_eq!(
        body["result"],
        "0x0000000000000000000000000000000000000000000000000000000000000000"
    );
}

/// Test batch requests.
#[tokio::test]
async fn test_batch() {
    let (_dag, server) = server(RpcConfig::default());

    let request = json!([
        {"jsonrpc": "2.0", "id": 1, "method": "eth_blockNumber"},
        {"jsonrpc": "2.0", "id": 2, "method": "net_version"},
        {"jsonrpc": "2.0", "method": "eth_blockNumber"},
    ]);
    let response = server.serve_request(post(request.to_string())).await;
    assert_eq!(response.status(), StatusCode::OK);

    // The notification gets no response
    let body = body_json(response.body());
    let responses = body.as_array().unwrap();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["result"], "0x0");
    assert_eq!(responses[1]["result"], "888");
}

/// Test that a lone notification produces an empty body.
#[tokio::test]
async fn test_notification() {
    let (_dag, server) = server(RpcConfig::default());

    let request = json!({"jsonrpc": "2.0", "method": "eth_blockNumber"});
    let response = server.serve_request(post(request.to_string())).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.body().is_empty());
}

/// Test JSON-RPC level errors.
#[tokio::test]
async fn test_jsonrpc_errors() {
    let (_dag, server) = server(RpcConfig::default());

    let body = body_json(server.serve_request(post("{\"jsonrpc\":")).await.body());
    assert_eq!(body["error"]["code"], -32700);

    let body = body_json(server.serve_request(post("[]")).await.body());
    assert_eq!(body["error"]["code"], -32600);

    let request = json!({"jsonrpc": "1.0", "id": 5, "method": "eth_blockNumber"});
    let body = body_json(server.serve_request(post(request.to_string())).await.body());
    assert_eq!(body["error"]["code"], -32600);
    assert_eq!(body["id"], 5);

    let request = json!({"jsonrpc": "2.0", "id": "x", "method": 7});
    let body = body_json(server.serve_request(post(request.to_string())).await.body());
    assert_eq!(body["error"]["code"], -32600);
    assert_eq!(body["id"], "x");

    let request = json!({"jsonrpc": "2.0", "id": 1, "method": "eth_mining"});
    let response = server.serve_request(post(request.to_string())).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response.body())["error"]["code"], -32601);
}

/// Test that an empty POST body is a JSON-RPC parse error, not an HTTP error.
#[tokio::test]
async fn test_empty_body() {
    let (_dag, server) = server(RpcConfig::default());

    let response = server.serve_request(post(Vec::new())).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.body());
    assert_eq!(body["error"]["code"], -32700);
    assert!(body["id"].is_null());
}

/// Test HTTP level admission.
#[tokio::test]
async fn test_http_admission() {
    let mut config = RpcConfig::default();
    config.max_request_body_size = 64;
    let (_dag, server) = server(config);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/")
        .body(Vec::new())
        .unwrap();
    let response = server.serve_request(request).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(b"{}".to_vec())
        .unwrap();
    let response = server.serve_request(request).await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let response = server.serve_request(post(vec![b' '; 65])).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

/// Test the IP allowlist on embedded requests.
#[tokio::test]
async fn test_ip_allowlist() {
    let mut config = RpcConfig::default();
    config.ip_allowlist = Some(vec!["10.0.0.1".parse().unwrap()]);
    let (_dag, server) = server(config);

    let request = json!({"jsonrpc": "2.0", "id": 1, "method": "eth_blockNumber"}).to_string();

    let mut blocked = post(request.clone());
    blocked
        .extensions_mut()
        .insert("192.168.1.1:40000".parse::<SocketAddr>().unwrap());
    assert_eq!(
        server.serve_request(blocked).await.status(),
        StatusCode::FORBIDDEN
    );

    let mut allowed = post(request.clone());
    allowed
        .extensions_mut()
        .insert("10.0.0.1:40000".parse::<SocketAddr>().unwrap());
    assert_eq!(server.serve_request(allowed).await.status(), StatusCode::OK);

    // Without caller information the request is admitted
    assert_eq!(
        server.serve_request(post(request)).await.status(),
        StatusCode::OK
    );
}
