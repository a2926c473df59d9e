//! Router-level tests: response shapes, headers and status codes as seen by
//! the web client. Requests go through the full router in-process; upstream
//! vendors are stood in for by wiremock.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, Response, StatusCode};
use docent_chat::{HttpPool, TemplateStore, ERROR_PREFIX};
use docent_core::DocentConfig;
use docent_server::{build_router, AppState, DEFAULT_PROMPTS};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BOUNDARY: &str = "docent-test-boundary";

struct TestApp {
    state: Arc<AppState>,
    _dir: TempDir,
}

impl TestApp {
    fn new(vars: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let config = DocentConfig::from_lookup(dir.path(), |k| vars.get(k).cloned()).unwrap();
        let templates = TemplateStore::from_yaml(DEFAULT_PROMPTS).unwrap();
        let pool = HttpPool::with_defaults().unwrap();

        Self {
            state: Arc::new(AppState::new(config, templates, pool)),
            _dir: dir,
        }
    }

    async fn send(&self, req: Request<Body>) -> Response<Body> {
        build_router(self.state.clone()).oneshot(req).await.unwrap()
    }

    async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response<Body> {
        let req = Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(req).await
    }

    async fn upload(&self, filename: &str, contents: &[u8]) -> Response<Body> {
        let mut body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n",
            b = BOUNDARY,
            f = filename
        )
        .into_bytes();
        body.extend_from_slice(contents);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        let req = Request::post("/api/v1/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(req).await
    }
}

async fn body_text(resp: Response<Body>) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(resp: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_text(resp).await).unwrap()
}

#[tokio::test]
async fn test_models_response_shape() {
    let app = TestApp::new(&[]);
    let resp = app.get("/api/v1/models").await;
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    let models = json["models"].as_array().unwrap();
    assert_eq!(json["total"], models.len());
    assert!(models.iter().all(|m| m["name"].is_string() && m["manufacturer"].is_string()));
    assert_eq!(json["default_model"]["name"], "qwen2.5:latest");
    assert_eq!(json["default_model"]["manufacturer"], "ollama");
    assert_eq!(json["default_model"]["default"], true);
}

#[tokio::test]
async fn test_prompt_templates() {
    let app = TestApp::new(&[]);

    let json = body_json(app.get("/api/v1/prompt/templates").await).await;
    let categories = json.as_array().unwrap();
    assert_eq!(categories[0]["type"], "prompts");
    assert_eq!(categories[0]["name"], "Prompts");
    assert_eq!(categories[0]["subtypes"][0]["name"], "system");

    let resp = app.get("/api/v1/prompt/template/translate").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["type"], "translate");

    let resp = app.get("/api/v1/prompt/template/poetry").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_prompt_generate() {
    let app = TestApp::new(&[]);

    let resp = app
        .post_json(
            "/api/v1/prompt/generate",
            serde_json::json!({
                "query": "Why?",
                "text": "Because.",
                "history": [{"role": "user", "content": "earlier"}],
                "prompt_type": "prompts",
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    let messages = json["messages"].as_array().unwrap();
    assert_eq!(messages[0]["role"], "system");
    assert!(messages
        .iter()
        .any(|m| m["content"].as_str().unwrap().contains("Because.")));
    assert!(messages.iter().any(|m| m["content"] == "earlier"));
    assert_eq!(messages.last().unwrap()["content"], "Why?");
    assert_eq!(json["continuation"], false);

    let resp = app
        .post_json(
            "/api/v1/prompt/generate",
            serde_json::json!({
                "query": "Why?",
                "prompt_type": "prompts",
                "model_choice": {"manufacturer": "openai", "model": "o1-mini"},
            }),
        )
        .await;
    let json = body_json(resp).await;
    assert!(json["messages"]
        .as_array()
        .unwrap()
        .iter()
        .all(|m| m["role"] != "system"));

    let resp = app
        .post_json(
            "/api/v1/prompt/generate",
            serde_json::json!({"query": "Why?", "prompt_type": "poetry"}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app
        .post_json(
            "/api/v1/prompt/generate",
            serde_json::json!({
                "query": "Why?",
                "model_choice": {"manufacturer": "acme", "model": "rocket"},
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_stream_unknown_manufacturer() {
    let app = TestApp::new(&[]);
    let resp = app
        .post_json(
            "/api/v1/chat/stream",
            serde_json::json!({
                "message": "hello",
                "model_choice": {"manufacturer": "acme", "model": "rocket"},
            }),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers();
    assert_eq!(headers["content-type"], "text/plain; charset=utf-8");
    assert_eq!(headers["x-accel-buffering"], "no");
    assert_eq!(headers["cache-control"], "no-cache");

    let text = body_text(resp).await;
    assert!(text.starts_with(ERROR_PREFIX));
    assert!(text.contains("acme"));
}

#[tokio::test]
async fn test_chat_stream_rejects_blank_message() {
    let app = TestApp::new(&[]);
    let resp = app
        .post_json("/api/v1/chat/stream", serde_json::json!({"message": "  "}))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_then_grounded_chat() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string(concat!(
            "{\"message\":{\"content\":\"It is \"},\"done\":false}\n",
            "{\"message\":{\"content\":\"about tides.\"},\"done\":false}\n",
            "{\"message\":{\"content\":\"\"},\"done\":true}\n",
        )))
        .mount(&server)
        .await;

    let uri = server.uri();
    let app = TestApp::new(&[("OLLAMA_API_URL", uri.as_str())]);

    let resp = app.upload("notes.txt", b"The moon drives the tides.\n").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["filename"], "notes.txt");
    assert_eq!(json["text"], "The moon drives the tides.");

    let json = body_json(app.get("/api/v1/pdf/content/notes.txt").await).await;
    assert_eq!(json["text"], "The moon drives the tides.");
    assert!(json["timestamp"].is_string());

    let resp = app
        .post_json(
            "/api/v1/chat/stream",
            serde_json::json!({
                "message": "What is it about?",
                "pdf_filename": "notes.txt",
            }),
        )
        .await;
    assert_eq!(body_text(resp).await, "It is about tides.");

    let requests = server.received_requests().await.unwrap();
    let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(sent["model"], "qwen2.5:latest");
    assert_eq!(sent["stream"], true);
    let messages = sent["messages"].as_array().unwrap();
    assert!(messages
        .iter()
        .any(|m| m["content"].as_str().unwrap().contains("The moon drives the tides.")));
    assert_eq!(messages.last().unwrap()["content"], "What is it about?");
}

#[tokio::test]
async fn test_uploaded_file_served_back() {
    let app = TestApp::new(&[]);
    app.upload("readme.md", b"# Title").await;

    let resp = app.get("/api/v1/pdf/readme.md").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "# Title");

    let resp = app.get("/api/v1/pdf/missing.pdf").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_rejections() {
    let app = TestApp::new(&[("MAX_UPLOAD_SIZE", "16")]);

    let resp = app.upload("tool.exe", b"MZ").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app.upload("big.txt", &[b'a'; 64]).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let resp = app.upload("blank.txt", b"   ").await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = app.get("/api/v1/pdf/content/big.txt").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
