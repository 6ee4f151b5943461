//! In-process mock of the PDF Services API.
//!
//! Routes mirror the real contract; every handler appends `"METHOD path"` to
//! a request log so tests can assert exactly which stages ran.

#![allow(dead_code)]

use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Form, Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cloudpdf::{ConversionConfig, ConversionConfigBuilder};

pub const CLIENT_ID: &str = "client-1";
pub const CLIENT_SECRET: &str = "secret-1";
pub const TOKEN: &str = "tok123";
pub const ASSET_ID: &str = "a1";
pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n1 0 obj\n<<>>\nendobj\n%%EOF\n";
pub const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Knobs for one mock instance.
#[derive(Debug, Clone)]
pub struct MockOptions {
    pub token_status: u16,
    pub upload_status: u16,
    pub delete_status: u16,
    pub send_location: bool,
    /// Status values returned by successive polls; the last one repeats.
    pub poll_script: Vec<String>,
    pub pdf_bytes: Vec<u8>,
    pub download_status: u16,
    /// Send the first half of the PDF, then reset the stream.
    pub abort_download: bool,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            token_status: 200,
            upload_status: 200,
            delete_status: 200,
            send_location: true,
            poll_script: vec!["done".into()],
            pdf_bytes: PDF_BYTES.to_vec(),
            download_status: 200,
            abort_download: false,
        }
    }
}

impl MockOptions {
    pub fn polls(statuses: &[&str]) -> Self {
        Self {
            poll_script: statuses.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }
}

/// Everything the mock observed.
#[derive(Debug, Default, Clone)]
pub struct Recorded {
    pub requests: Vec<String>,
    pub media_type: Option<String>,
    pub upload_content_type: Option<String>,
    pub upload_content_length: Option<String>,
    pub upload_body: Vec<u8>,
    pub converted_asset: Option<String>,
    pub poll_count: usize,
    pub deleted: Vec<String>,
    /// Authenticated endpoints that were hit without the expected headers.
    pub unauthorized: Vec<String>,
}

struct Shared {
    base_url: String,
    opts: MockOptions,
    rec: Mutex<Recorded>,
}

impl Shared {
    fn log(&self, entry: &str) {
        self.rec.lock().unwrap().requests.push(entry.to_string());
    }

    fn check_auth(&self, endpoint: &str, headers: &HeaderMap) -> bool {
        let bearer = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        let api_key = headers.get("x-api-key").and_then(|v| v.to_str().ok());
        let ok = bearer == Some(&format!("Bearer {TOKEN}")[..]) && api_key == Some(CLIENT_ID);
        if !ok {
            self.rec
                .lock()
                .unwrap()
                .unauthorized
                .push(endpoint.to_string());
        }
        ok
    }
}

pub struct MockService {
    pub base_url: String,
    shared: Arc<Shared>,
    _task: tokio::task::JoinHandle<()>,
}

impl MockService {
    pub async fn start(opts: MockOptions) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr: SocketAddr = listener.local_addr().expect("listener addr");
        let base_url = format!("http://{addr}");

        let shared = Arc::new(Shared {
            base_url: base_url.clone(),
            opts,
            rec: Mutex::new(Recorded::default()),
        });

        let app = Router::new()
            .route("/token", post(token))
            .route("/assets", post(allocate))
            .route("/assets/{id}", delete(delete_asset))
            .route("/upload/x", put(upload))
            .route("/operation/createpdf", post(create_pdf))
            .route("/poll/a1", get(poll))
            .route("/dl/a1", get(download))
            .with_state(shared.clone());

        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve mock service");
        });

        Self {
            base_url,
            shared,
            _task: task,
        }
    }

    pub fn recorded(&self) -> Recorded {
        self.shared.rec.lock().unwrap().clone()
    }

    /// Builder pre-filled with valid credentials, this mock's address and a
    /// fast poll schedule.
    pub fn config(&self) -> ConversionConfigBuilder {
        ConversionConfig::builder()
            .base_url(&self.base_url)
            .credentials(CLIENT_ID, CLIENT_SECRET)
            .request_timeout_secs(5)
            .poll_initial_delay(Duration::from_millis(1))
            .poll_max_delay(Duration::from_millis(5))
            .poll_timeout(Duration::from_secs(5))
    }
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).expect("valid status code")
}

async fn token(State(s): State<Arc<Shared>>, Form(form): Form<HashMap<String, String>>) -> Response {
    s.log("POST /token");
    if s.opts.token_status != 200 {
        return (status(s.opts.token_status), "invalid_client").into_response();
    }
    if form.get("client_id").map(String::as_str) != Some(CLIENT_ID)
        || form.get("client_secret").map(String::as_str) != Some(CLIENT_SECRET)
    {
        return (StatusCode::UNAUTHORIZED, "bad credentials").into_response();
    }
    Json(json!({ "access_token": TOKEN, "token_type": "bearer", "expires_in": 86399 })).into_response()
}

async fn allocate(State(s): State<Arc<Shared>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    s.log("POST /assets");
    if !s.check_auth("POST /assets", &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    s.rec.lock().unwrap().media_type = body["mediaType"].as_str().map(String::from);
    Json(json!({
        "uploadUri": format!("{}/upload/x", s.base_url),
        "assetID": ASSET_ID,
    }))
    .into_response()
}

async fn upload(State(s): State<Arc<Shared>>, headers: HeaderMap, body: Bytes) -> Response {
    s.log("PUT /upload/x");
    {
        let mut rec = s.rec.lock().unwrap();
        rec.upload_content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        rec.upload_content_length = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        rec.upload_body = body.to_vec();
    }
    status(s.opts.upload_status).into_response()
}

async fn create_pdf(State(s): State<Arc<Shared>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    s.log("POST /operation/createpdf");
    if !s.check_auth("POST /operation/createpdf", &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    s.rec.lock().unwrap().converted_asset = body["assetID"].as_str().map(String::from);
    if s.opts.send_location {
        let location = format!("{}/poll/a1", s.base_url);
        (StatusCode::CREATED, [(LOCATION, location)]).into_response()
    } else {
        StatusCode::CREATED.into_response()
    }
}

async fn poll(State(s): State<Arc<Shared>>, headers: HeaderMap) -> Response {
    s.log("GET /poll/a1");
    if !s.check_auth("GET /poll/a1", &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let idx = {
        let mut rec = s.rec.lock().unwrap();
        rec.poll_count += 1;
        rec.poll_count - 1
    };
    let script = &s.opts.poll_script;
    let current = script
        .get(idx)
        .or_else(|| script.last())
        .cloned()
        .unwrap_or_else(|| "done".into());

    let body = match current.as_str() {
        "done" => json!({
            "status": "done",
            "asset": {
                "assetID": ASSET_ID,
                "downloadUri": format!("{}/dl/a1", s.base_url),
            }
        }),
        "failed" => json!({
            "status": "failed",
            "error": { "code": "BAD_INPUT", "message": "corrupt document", "status": 400 }
        }),
        other => json!({ "status": other }),
    };
    Json(body).into_response()
}

async fn download(State(s): State<Arc<Shared>>) -> Response {
    s.log("GET /dl/a1");
    if s.opts.download_status != 200 {
        return (status(s.opts.download_status), "AccessDenied").into_response();
    }
    if s.opts.abort_download {
        let half = Bytes::copy_from_slice(&s.opts.pdf_bytes[..s.opts.pdf_bytes.len() / 2]);
        let chunks: Vec<Result<Bytes, std::io::Error>> =
            vec![Ok(half), Err(std::io::Error::other("connection reset by mock"))];
        return Body::from_stream(futures::stream::iter(chunks)).into_response();
    }
    s.opts.pdf_bytes.clone().into_response()
}

async fn delete_asset(State(s): State<Arc<Shared>>, Path(id): Path<String>, headers: HeaderMap) -> Response {
    s.log(&format!("DELETE /assets/{id}"));
    if !s.check_auth("DELETE /assets", &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    s.rec.lock().unwrap().deleted.push(id);
    status(s.opts.delete_status).into_response()
}

/// Route library logs to the test harness; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("cloudpdf=debug"))
        .with_test_writer()
        .try_init();
}

/// Write a fake DOCX into a fresh temp dir and return both.
pub fn write_docx(name: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(name);
    std::fs::write(&path, b"PK\x03\x04 word/document.xml fake docx body").expect("write docx");
    (dir, path)
}
