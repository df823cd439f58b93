//! Test utilities & fixtures.
//! A tiny in-process HTTP server so the Town Star, craft data and OpenSea
//! clients can be exercised without the network.
#![allow(dead_code)] // each test binary uses a different subset

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use ntmbot::config::Config;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path including the query string.
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    /// Held back this long before answering.
    pub delay: Option<Duration>,
}

impl MockResponse {
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

type Handler = dyn Fn(&RecordedRequest) -> MockResponse + Send + Sync;

pub struct MockServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    task: tokio::task::JoinHandle<()>,
}

impl MockServer {
    /// Serve every request with `handler` until dropped.
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> MockResponse + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock");
        let addr = listener.local_addr().expect("mock addr");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler: Arc<Handler> = Arc::new(handler);

        let recorded = requests.clone();
        let task = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let recorded = recorded.clone();
                let handler = handler.clone();
                tokio::spawn(async move {
                    serve_one(stream, recorded, handler).await;
                });
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            requests,
            task,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path_prefix: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.starts_with(path_prefix))
            .collect()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve_one(
    mut stream: TcpStream,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
    handler: Arc<Handler>,
) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let body_end = (header_end + content_length).min(buf.len());
    let body = String::from_utf8_lossy(&buf[header_end..body_end]).to_string();

    let request = RecordedRequest {
        method,
        path,
        headers,
        body,
    };
    let response = (*handler)(&request);
    recorded.lock().unwrap().push(request);
    if let Some(delay) = response.delay {
        tokio::time::sleep(delay).await;
    }

    let reason = match response.status {
        200 => "OK",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    };
    let raw = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        response.status,
        reason,
        response.body.len(),
        response.body
    );
    let _ = stream.write_all(raw.as_bytes()).await;
    let _ = stream.shutdown().await;
}

/// Base URL of a port nothing listens on.
pub fn dead_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

/// Default config rooted in `data_dir`, with every remote endpoint pointed
/// at `base_url`, short timeouts and no reply cooldown.
pub fn test_config(data_dir: &std::path::Path, base_url: &str) -> Config {
    let mut config = Config::default();
    config.storage.data_dir = data_dir.to_string_lossy().to_string();
    config.logging.file = None;
    config.logging.error_file = None;
    config.bot.reply_cooldown_ms = 0;
    config.townstar.api_base = base_url.to_string();
    config.townstar.craft_data_url = format!("{}/crafts.json", base_url);
    config.townstar.secret = "test-secret".to_string();
    config.townstar.timeout_seconds = 2;
    config.opensea.api_base = format!("{}/api/v1", base_url);
    config.opensea.api_key = "os-key".to_string();
    config.opensea.timeout_seconds = 2;
    config
}

/// A small Town Star-shaped craft dataset.
pub const SAMPLE_CRAFTS: &str = r#"{
    "Wood": {"Req1": "none", "Value1": 0, "Req2": "none", "Value2": 0, "Req3": "none", "Value3": 0},
    "Lumber": {"Req1": "Wood", "Value1": 1, "Req2": "Energy", "Value2": 5, "Req3": "none", "Value3": 0},
    "Iron": {"Req1": "Water", "Value1": 2, "Req2": "none", "Value2": 0, "Req3": "none", "Value3": 0},
    "Steel": {"Req1": "Iron", "Value1": 2, "Req2": "Lumber", "Value2": 1, "Req3": "Energy", "Value3": 10},
    "Blue_Steel": {"Req1": "Steel", "Value1": 1, "Req2": "Lumber", "Value2": 2, "Req3": "none", "Value3": 0}
}"#;
