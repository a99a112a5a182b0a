//! HTTP client for the remote translation service.
//!
//! The submission controller never talks to reqwest directly: it goes through
//! [`TranslationBackend`], which hands back a channel that yields exactly one
//! outcome per dispatched request.

use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::model::{ErrorBody, HealthStatus, TranslateRequest, TranslationResult};

/// Path of the translation endpoint, relative to the service base URL.
pub const TRANSLATE_PATH: &str = "/api/translate";
/// Path of the health endpoint, relative to the service base URL.
pub const HEALTH_PATH: &str = "/health";

/// Errors from one translation call.
#[derive(Error, Debug)]
pub enum TranslateError {
    /// The service answered with a non-success status.
    #[error("translation service returned HTTP {status}")]
    Remote { status: u16, detail: Option<String> },

    /// No usable response: connection failure, timeout, or an undecodable body.
    #[error("transport failure: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for TranslateError {
    fn from(e: reqwest::Error) -> Self {
        TranslateError::Transport(e.to_string())
    }
}

/// Terminal outcome of one outbound call.
pub type TranslationOutcome = Result<TranslationResult, TranslateError>;

/// Something that can carry a translation request to the service.
pub trait TranslationBackend {
    /// Starts one request. The returned receiver yields a single outcome;
    /// a receiver that disconnects without one counts as a transport failure.
    fn dispatch(&self, request: TranslateRequest) -> Receiver<TranslationOutcome>;
}

/// Backend that performs the call over HTTP on the tokio runtime.
pub struct HttpBackend {
    client: Client,
    base_url: String,
    runtime: Handle,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Option<Duration>, runtime: Handle) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            runtime,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Starts a one-off `GET /health` probe.
    pub fn probe_health(&self) -> Receiver<Option<HealthStatus>> {
        let (tx, rx) = mpsc::channel();
        let client = self.client.clone();
        let url = format!("{}{}", self.base_url, HEALTH_PATH);
        self.runtime.spawn(async move {
            let _ = tx.send(check_health(&client, &url).await);
        });
        rx
    }
}

impl TranslationBackend for HttpBackend {
    fn dispatch(&self, request: TranslateRequest) -> Receiver<TranslationOutcome> {
        let (tx, rx) = mpsc::channel();
        let client = self.client.clone();
        let url = format!("{}{}", self.base_url, TRANSLATE_PATH);
        self.runtime.spawn(async move {
            let outcome = translate(&client, &url, &request).await;
            // Receiver may be gone if the app quit mid-flight
            let _ = tx.send(outcome);
        });
        rx
    }
}

/// Sends one translation request and decodes the response.
pub async fn translate(
    client: &Client,
    url: &str,
    request: &TranslateRequest,
) -> TranslationOutcome {
    let start = Instant::now();
    info!(
        url,
        requirement_chars = request.business_requirement.chars().count(),
        "translate_request"
    );

    let response = match client.post(url).json(request).send().await {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "translate_transport_error");
            return Err(e.into());
        }
    };

    let status = response.status();
    let body = match response.text().await {
        Ok(b) => b,
        Err(e) => {
            warn!(status = status.as_u16(), error = %e, "translate_body_read_failed");
            return Err(e.into());
        }
    };

    let outcome = interpret_response(status, &body);
    match &outcome {
        Ok(_) => info!(
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "translate_success"
        ),
        Err(TranslateError::Remote { status, detail }) => {
            warn!(status, detail = ?detail, "translate_remote_error")
        }
        Err(TranslateError::Transport(e)) => warn!(error = %e, "translate_decode_failed"),
    }
    outcome
}

/// Maps a status code and raw body onto a translation outcome.
pub fn interpret_response(status: StatusCode, body: &str) -> TranslationOutcome {
    if !status.is_success() {
        let detail = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(ErrorBody::message);
        return Err(TranslateError::Remote {
            status: status.as_u16(),
            detail,
        });
    }

    serde_json::from_str::<TranslationResult>(body)
        .map_err(|e| TranslateError::Transport(format!("malformed response body: {}", e)))
}

async fn check_health(client: &Client, url: &str) -> Option<HealthStatus> {
    let response = match client.get(url).send().await {
        Ok(r) => r,
        Err(e) => {
            warn!(url, error = %e, "health_probe_failed");
            return None;
        }
    };
    if !response.status().is_success() {
        warn!(url, status = response.status().as_u16(), "health_probe_unhealthy");
        return None;
    }
    match response.json::<HealthStatus>().await {
        Ok(health) => {
            debug!(status = %health.status, version = ?health.version, "health_probe_ok");
            Some(health)
        }
        Err(e) => {
            warn!(url, error = %e, "health_probe_decode_failed");
            None
        }
    }
}

#[cfg(test)]
pub mod testing {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves a single canned HTTP response and returns the base URL plus the raw request text.
    pub async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 4096];
            // Read until headers plus the declared body have arrived
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&received).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|l| {
                            let lower = l.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                        })
                        .unwrap_or(0);
                    if received.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }
            let response = format!(
                "{}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&received).to_string()
        });
        (format!("http://{}", addr), handle)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::serve_once;
    use super::*;

    use tokio::net::TcpListener;

    const FULL_BODY: &str = r#"{"technical_spec":"spec","feasibility":"easy","estimation":"40h","prototype_code":"print(1)"}"#;

    fn request(text: &str) -> TranslateRequest {
        TranslateRequest {
            business_requirement: text.to_string(),
        }
    }

    #[test]
    fn test_interpret_success() {
        let result = interpret_response(StatusCode::OK, FULL_BODY).unwrap();
        assert_eq!(result.technical_spec, "spec");
        assert_eq!(result.feasibility, "easy");
        assert_eq!(result.estimation, "40h");
        assert_eq!(result.prototype_code, "print(1)");
    }

    #[test]
    fn test_interpret_success_missing_field_is_transport_error() {
        let outcome = interpret_response(StatusCode::OK, r#"{"technical_spec":"spec"}"#);
        assert!(matches!(outcome, Err(TranslateError::Transport(_))));
    }

    #[test]
    fn test_interpret_remote_with_detail() {
        let outcome = interpret_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"detail":"configuration error: missing API key"}"#,
        );
        match outcome {
            Err(TranslateError::Remote { status, detail }) => {
                assert_eq!(status, 500);
                assert_eq!(detail.as_deref(), Some("configuration error: missing API key"));
            }
            other => panic!("expected remote error, got {:?}", other),
        }
    }

    #[test]
    fn test_interpret_remote_without_parsable_body() {
        let outcome = interpret_response(StatusCode::BAD_GATEWAY, "<html>Bad Gateway</html>");
        assert!(matches!(
            outcome,
            Err(TranslateError::Remote {
                status: 502,
                detail: None
            })
        ));
    }

    #[tokio::test]
    async fn test_translate_posts_requirement_to_endpoint() {
        let (base, server) = serve_once("HTTP/1.1 200 OK", FULL_BODY).await;
        let client = Client::new();
        let url = format!("{}{}", base, TRANSLATE_PATH);

        let result = translate(&client, &url, &request("free shipping over 10,000 yen"))
            .await
            .unwrap();
        assert_eq!(result.estimation, "40h");

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /api/translate HTTP/1.1"));
        assert!(raw.contains(r#"{"business_requirement":"free shipping over 10,000 yen"}"#));
    }

    #[tokio::test]
    async fn test_translate_remote_error_detail() {
        let (base, server) =
            serve_once("HTTP/1.1 500 Internal Server Error", r#"{"detail":"model overloaded"}"#)
                .await;
        let client = Client::new();
        let url = format!("{}{}", base, TRANSLATE_PATH);

        let outcome = translate(&client, &url, &request("order history for users")).await;
        match outcome {
            Err(TranslateError::Remote { status, detail }) => {
                assert_eq!(status, 500);
                assert_eq!(detail.as_deref(), Some("model overloaded"));
            }
            other => panic!("expected remote error, got {:?}", other),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_translate_connection_refused_is_transport_error() {
        // Bind then drop to get a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = Client::new();
        let url = format!("http://{}{}", addr, TRANSLATE_PATH);
        let outcome = translate(&client, &url, &request("email verification on signup")).await;
        assert!(matches!(outcome, Err(TranslateError::Transport(_))));
    }

    #[tokio::test]
    async fn test_http_backend_dispatch_delivers_outcome() {
        let (base, server) = serve_once("HTTP/1.1 200 OK", FULL_BODY).await;
        let backend = HttpBackend::new(&format!("{}/", base), None, Handle::current()).unwrap();
        assert_eq!(backend.base_url(), base);

        let rx = backend.dispatch(request("free shipping over 10,000 yen"));
        let outcome = tokio::task::spawn_blocking(move || rx.recv().unwrap())
            .await
            .unwrap();
        assert_eq!(outcome.unwrap().technical_spec, "spec");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_probe_health() {
        let (base, server) =
            serve_once("HTTP/1.1 200 OK", r#"{"status":"ok","version":"1.0.0"}"#).await;
        let backend = HttpBackend::new(&base, None, Handle::current()).unwrap();

        let rx = backend.probe_health();
        let health = tokio::task::spawn_blocking(move || rx.recv().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(health.status, "ok");
        assert_eq!(health.version.as_deref(), Some("1.0.0"));

        let raw = server.await.unwrap();
        assert!(raw.starts_with("GET /health HTTP/1.1"));
    }
}
