//! Header injection and pass-through behavior of the request pipeline.

use std::sync::Arc;

use sandgate::pipeline::{RequestError, RequestPipeline, AUTH_HEADER};
use sandgate::store::{AuthToken, MemoryTokenStore, TokenStore};
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn pipeline_for(server: &MockServer, store: Arc<dyn TokenStore>) -> RequestPipeline {
    RequestPipeline::new(&server.uri(), store).expect("pipeline should construct")
}

#[tokio::test]
async fn attaches_auth_header_when_token_stored() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/run"))
        .and(header(AUTH_HEADER, "abc123"))
        .and(body_json(serde_json::json!({"code": "print(1)"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_token("abc123"));
    let pipeline = pipeline_for(&server, store);

    let result = pipeline
        .post_json("/run", &serde_json::json!({"code": "print(1)"}))
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn omits_auth_header_without_token() {
    let server = MockServer::start().await;
    // Any request carrying the auth header lands here and fails the test.
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header_exists(AUTH_HEADER))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let pipeline = pipeline_for(&server, store);

    let result = pipeline.get("/").await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn header_follows_store_state_at_dispatch_time() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/session/images"))
        .and(header(AUTH_HEADER, "abc123"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/session/images"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let pipeline = pipeline_for(&server, Arc::clone(&store) as Arc<dyn TokenStore>);

    // No caching of the presence decision: each dispatch re-reads the
    // store, so a login/logout flips the very next request.
    let login = store.set(&AuthToken::new("abc123"));
    assert!(login.is_ok());
    let first = pipeline.get("/session/images").await;
    assert!(first.is_ok());

    let logout = store.clear();
    assert!(logout.is_ok());
    let second = pipeline.get("/session/images").await;
    assert!(second.is_ok());
}

#[tokio::test]
async fn success_response_passes_through_unmodified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("sandbox up"))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let pipeline = pipeline_for(&server, store);

    let response = pipeline.get("/").await.expect("request should succeed");
    assert_eq!(response.status().as_u16(), 200);
    let body = response.text().await.expect("body should read");
    assert_eq!(body, "sandbox up");
}

#[tokio::test]
async fn non_success_status_surfaces_unmodified_with_single_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/run"))
        .respond_with(ResponseTemplate::new(500).set_body_string("execution backend down"))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_token("abc123"));
    let pipeline = pipeline_for(&server, store);

    let result = pipeline
        .post_json("/run", &serde_json::json!({"code": "print(1)"}))
        .await;
    match result {
        Err(RequestError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "execution backend down");
        }
        other => panic!("expected status error, got {other:?}"),
    }
    // expect(1) verifies on drop that no retry was attempted.
}

#[tokio::test]
async fn connection_failure_surfaces_as_transport_error() {
    // Bind then drop to find a port with nothing listening.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind should work");
        listener.local_addr().expect("addr should resolve").port()
    };

    let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());
    let pipeline = RequestPipeline::new(&format!("http://127.0.0.1:{port}"), store)
        .expect("pipeline should construct");

    let result = pipeline.get("/").await;
    assert!(matches!(result, Err(RequestError::Transport(_))));
}

#[tokio::test]
async fn trailing_slash_on_base_url_is_tolerated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/session/images"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());
    let base = format!("{}/", server.uri());
    let pipeline = RequestPipeline::new(&base, store).expect("pipeline should construct");

    let result = pipeline.get("/session/images").await;
    assert!(result.is_ok());
}

#[test]
fn rejects_unparseable_base_url() {
    let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());
    let result = RequestPipeline::new("not a url", store);
    assert!(result.is_err());
}
