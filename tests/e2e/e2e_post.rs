use axum::Router;
use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::routing::any;
use json_post::{Client, RestErrorKind};
use tokio::net::TcpListener;

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct Echo {
    method: String,
    content_type: Vec<String>,
    body: String,
}

#[tokio::test]
async fn e2e_post_sends_wrapped_json_body() {
    init_tracing();
    let server = TestServer::start().await;
    let client = Client::new().with_base_url(server.base_url.clone());

    let response = client
        .send_post("/echo", &sonic_rs::json!({"name": "widget"}))
        .await
        .expect("echo server should respond");

    assert_eq!(response.status(), 200);
    let echo: Echo = response.json().expect("echo payload should parse");
    assert_eq!(echo.method, "POST");
    assert_eq!(echo.content_type, vec!["application/json".to_string()]);
    assert_eq!(echo.body, r#"{"data":{"name":"widget"}}"#);
}

#[tokio::test]
async fn e2e_post_without_payload_sends_empty_data() {
    init_tracing();
    let server = TestServer::start().await;
    let client = Client::new();

    let response = client
        .send_post_empty(&server.url("/echo"))
        .await
        .expect("echo server should respond");

    let echo: Echo = response.json().expect("echo payload should parse");
    assert_eq!(echo.body, r#"{"data":{}}"#);
}

#[tokio::test]
async fn e2e_free_function_uses_default_client() {
    init_tracing();
    let server = TestServer::start().await;

    let response = json_post::send_post_empty(&server.url("/echo"))
        .await
        .expect("echo server should respond");

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn e2e_non_success_status_is_returned() {
    init_tracing();
    let server = TestServer::start().await;
    let client = Client::new();

    let response = client
        .send_post_empty(&server.url("/missing"))
        .await
        .expect("404 should not be an error");

    assert_eq!(response.status(), 404);
    assert_eq!(response.body(), b"no such item");
}

#[tokio::test]
async fn e2e_unreachable_host_fails_with_connect() {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe listener");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let err = Client::new()
        .send_post_empty(&format!("http://{addr}/echo"))
        .await
        .expect_err("closed port should refuse the connection");

    assert_eq!(err.kind(), RestErrorKind::Connect);
    assert!(std::error::Error::source(&err).is_some());
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

struct TestServer {
    base_url: String,
    task: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        let app = Router::new()
            .route("/echo", any(echo_handler))
            .route("/missing", any(missing_handler));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let base_url = format!("http://{}", addr);

        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { base_url, task }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn echo_handler(method: Method, headers: HeaderMap, body: Bytes) -> (StatusCode, String) {
    let content_type: Vec<String> = headers
        .get_all(header::CONTENT_TYPE)
        .iter()
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .collect();
    let echo = Echo {
        method: method.as_str().to_string(),
        content_type,
        body: String::from_utf8_lossy(&body).into_owned(),
    };
    match sonic_rs::to_string(&echo) {
        Ok(json) => (StatusCode::OK, json),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

async fn missing_handler() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "no such item")
}
