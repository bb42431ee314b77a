//! HTTP delivery for the remote transport

use super::remote::BatchSender;
use crate::core::{LogEntry, LoggerError, Result};
use serde::Serialize;
use std::time::Duration;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct BatchBody<'a> {
    entries: &'a [LogEntry],
}

/// POSTs each batch as `{"entries":[...]}` with a JSON content type.
///
/// Any 2xx status counts as delivered.
pub struct HttpBatchSender {
    client: reqwest::blocking::Client,
    endpoint: String,
    headers: Vec<(String, String)>,
}

impl HttpBatchSender {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(LoggerError::config("HttpBatchSender", "endpoint must not be empty"));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LoggerError::config("HttpBatchSender", e.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            headers: Vec::new(),
        })
    }

    /// Extra header sent with every request
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_bearer_token(self, token: impl AsRef<str>) -> Self {
        let value = format!("Bearer {}", token.as_ref());
        self.with_header("Authorization", value)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

impl BatchSender for HttpBatchSender {
    fn send_batch(&mut self, entries: &[LogEntry]) -> Result<()> {
        let mut request = self.client.post(&self.endpoint).json(&BatchBody { entries });
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        request
            .send()
            .and_then(|response| response.error_for_status())
            .map(|_| ())
            .map_err(|e| LoggerError::remote_delivery(&self.endpoint, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Accept one request, answer with `status`, and hand back the lowercased
    /// head and the raw body
    fn serve_once(status: &'static str) -> (String, mpsc::Receiver<(String, String)>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/ingest", listener.local_addr().unwrap());
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut raw = Vec::new();
            let mut chunk = [0u8; 4096];
            let head_end = loop {
                let n = stream.read(&mut chunk).unwrap();
                assert!(n > 0, "connection closed before headers");
                raw.extend_from_slice(&chunk[..n]);
                if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };

            let head = String::from_utf8_lossy(&raw[..head_end]).to_lowercase();
            let length: usize = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .map(|v| v.trim().parse().unwrap())
                .unwrap_or(0);
            while raw.len() < head_end + length {
                let n = stream.read(&mut chunk).unwrap();
                assert!(n > 0, "connection closed before body");
                raw.extend_from_slice(&chunk[..n]);
            }
            let body = String::from_utf8_lossy(&raw[head_end..head_end + length]).into_owned();

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                status
            );
            stream.write_all(response.as_bytes()).unwrap();
            tx.send((head, body)).unwrap();
        });

        (url, rx)
    }

    #[test]
    fn test_rejects_empty_endpoint() {
        assert!(matches!(
            HttpBatchSender::new("  "),
            Err(LoggerError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_headers() {
        let sender = HttpBatchSender::new("http://127.0.0.1:9/ingest")
            .unwrap()
            .with_bearer_token("abc")
            .with_header("X-Service-Name", "billing");

        assert_eq!(sender.endpoint(), "http://127.0.0.1:9/ingest");
        assert_eq!(
            sender.headers(),
            &[
                ("Authorization".to_string(), "Bearer abc".to_string()),
                ("X-Service-Name".to_string(), "billing".to_string()),
            ]
        );
    }

    #[test]
    fn test_body_shape() {
        let entries = vec![LogEntry::new(LogLevel::Info, "shipped")];
        let body = serde_json::to_value(BatchBody { entries: &entries }).unwrap();

        assert_eq!(body["entries"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["entries"][0]["message"], "shipped");
    }

    #[test]
    fn test_request_on_the_wire() {
        let (url, rx) = serve_once("200 OK");
        let mut sender = HttpBatchSender::with_timeout(url, Duration::from_secs(5))
            .unwrap()
            .with_bearer_token("abc")
            .with_header("X-Service-Name", "billing");

        let entries = vec![
            LogEntry::new(LogLevel::Info, "first"),
            LogEntry::new(LogLevel::Warn, "second"),
        ];
        sender.send_batch(&entries).unwrap();

        let (head, body) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(head.starts_with("post /ingest http/1.1\r\n"));
        assert!(head.contains("\r\ncontent-type: application/json\r\n"));
        assert!(head.contains("\r\nauthorization: bearer abc\r\n"));
        assert!(head.contains("\r\nx-service-name: billing\r\n"));

        let body: serde_json::Value = serde_json::from_str(&body).unwrap();
        let sent = body["entries"].as_array().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0]["message"], "first");
        assert_eq!(sent[1]["level"], "WARN");
    }

    #[test]
    fn test_error_status_is_delivery_error() {
        let (url, rx) = serve_once("503 Service Unavailable");
        let mut sender = HttpBatchSender::with_timeout(url, Duration::from_secs(5)).unwrap();

        let result = sender.send_batch(&[LogEntry::new(LogLevel::Info, "rejected")]);

        assert!(matches!(result, Err(LoggerError::RemoteDelivery { .. })));
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_unreachable_endpoint_is_delivery_error() {
        let mut sender =
            HttpBatchSender::with_timeout("http://127.0.0.1:9/ingest", Duration::from_millis(500))
                .unwrap();
        let result = sender.send_batch(&[LogEntry::new(LogLevel::Info, "lost")]);

        assert!(matches!(result, Err(LoggerError::RemoteDelivery { .. })));
    }
}
