//! Shared test doubles: a one-response-per-connection HTTP server, a scripted
//! model transport and a sleeper that records instead of waiting.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pitchlens_core::{AnalysisRequest, ModelTransport, ServiceError, Sleeper};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const VALID_ANALYSIS: &str = r#"{
    "hook_score": 42,
    "audience_persona": "Enterprise CTOs planning a cloud migration.",
    "conversion_killers": ["synergy matrix", "platform-agnostic", "proprietary ecosystem"]
}"#;

/// A canned HTTP response.
#[derive(Debug, Clone)]
pub struct Canned {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl Canned {
    pub fn new(status: u16, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        Self { status, headers: vec![("Content-Type", content_type.to_string())], body: body.into() }
    }

    pub fn html(body: &str) -> Self {
        Self::new(200, "text/html; charset=utf-8", body)
    }

    pub fn json(status: u16, body: &str) -> Self {
        Self::new(status, "application/json", body)
    }

    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.push((name, value.to_string()));
        self
    }
}

/// Local HTTP server answering one canned response per connection, in order.
pub struct TestServer {
    pub url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    pub async fn start(responses: Vec<Canned>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = requests.clone();

        tokio::spawn(async move {
            for response in responses {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let request = read_request(&mut socket).await;
                log.lock().unwrap().push(request);
                write_response(&mut socket, &response).await;
            }
        });

        Self { url: format!("http://{}", addr), requests }
    }

    /// Raw requests received so far (head and body).
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let mut expected: Option<usize> = None;

    loop {
        if let Some(total) = expected
            && buf.len() >= total
        {
            break;
        }

        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        if expected.is_none()
            && let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n")
        {
            let head = String::from_utf8_lossy(&buf[..pos]).to_string();
            let content_length = head
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            expected = Some(pos + 4 + content_length);
        }
    }

    String::from_utf8_lossy(&buf).into_owned()
}

async fn write_response(socket: &mut TcpStream, response: &Canned) {
    let reason = if response.status == 200 { "OK" } else { "Canned" };
    let mut head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        response.status,
        reason,
        response.body.len()
    );
    for (name, value) in &response.headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str("\r\n");

    let _ = socket.write_all(head.as_bytes()).await;
    let _ = socket.write_all(&response.body).await;
    let _ = socket.shutdown().await;
}

/// A reqwest client that ignores proxy environment variables.
pub fn local_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Model transport that replays a script of outcomes and counts calls.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<Result<String, ServiceError>>>>,
    fallback: Option<Result<String, ServiceError>>,
    calls: Arc<AtomicU32>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<String, ServiceError>>) -> Self {
        Self { script: Arc::new(Mutex::new(script.into())), ..Default::default() }
    }

    /// Returns `outcome` on every call once the script runs out.
    pub fn always(outcome: Result<String, ServiceError>) -> Self {
        Self { fallback: Some(outcome), ..Default::default() }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelTransport for ScriptedTransport {
    async fn generate(&self, _request: &AnalysisRequest) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next.or_else(|| self.fallback.clone()) {
            Some(outcome) => outcome,
            None => Err(ServiceError::InvalidResponse("script exhausted".to_string())),
        }
    }
}

/// Sleeper that records every requested wait and returns immediately.
#[derive(Clone, Default)]
pub struct RecordingSleeper {
    waits: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.waits.lock().unwrap().push(duration);
    }
}

pub fn rate_limited() -> ServiceError {
    ServiceError::RateLimited { message: "Resource has been exhausted".to_string(), retry_after: None }
}

pub fn server_error() -> ServiceError {
    ServiceError::Server { status: 503, message: "The model is overloaded".to_string() }
}
