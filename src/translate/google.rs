//! Google Translate provider (public `translate_a/single` endpoint).
//! Blocking client with a hard request timeout; no retries, a failed call
//! is reported to the `Translator`, which falls back to the original text.

use std::time::Duration;

use serde_json::Value;

use super::{TranslateError, TranslationProvider};

pub const DEFAULT_BASE_URL: &str = "https://translate.googleapis.com";

pub struct GoogleProvider {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl GoogleProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TranslateError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| TranslateError::Unavailable(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl TranslationProvider for GoogleProvider {
    fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, TranslateError> {
        let response = self
            .http
            .get(format!("{}/translate_a/single", self.base_url))
            .query(&[
                ("client", "gtx"),
                ("sl", source_lang),
                ("tl", target_lang),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .map_err(map_request_error)?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(TranslateError::RateLimited);
        }
        if !status.is_success() {
            return Err(TranslateError::Status {
                status: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .map_err(|e| TranslateError::MalformedResponse(e.to_string()))?;
        parse_translation(&body)
    }

    fn name(&self) -> &str {
        "google"
    }
}

fn map_request_error(e: reqwest::Error) -> TranslateError {
    if e.is_timeout() {
        TranslateError::Timeout
    } else {
        TranslateError::Http(e.to_string())
    }
}

/// Concatenate the translated segments of a response.
/// Format: [[["translated", "original", null, null, 10], ...], null, "pt", ...]
fn parse_translation(body: &Value) -> Result<String, TranslateError> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslateError::MalformedResponse("missing segment array".into()))?;

    let mut out = String::new();
    for segment in segments {
        if let Some(piece) = segment.get(0).and_then(Value::as_str) {
            out.push_str(piece);
        }
    }

    if out.is_empty() {
        return Err(TranslateError::MalformedResponse(
            "no translated segments".into(),
        ));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve one connection on a local port: read the request head, then
    /// answer with `response` verbatim. Returns the base URL.
    fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap_or(0) > 0 {
                if line == "\r\n" {
                    break;
                }
                line.clear();
            }
            let mut stream = reader.into_inner();
            let _ = stream.write_all(response.as_bytes());
        });
        format!("http://{addr}")
    }

    #[test]
    fn joins_segments_in_order() {
        let body = json!([
            [
                ["Extinct in 1627 ", "Extinto em 1627 ", null, null, 10],
                ["due to overhunting.", "por caça excessiva.", null, null, 10]
            ],
            null,
            "pt"
        ]);
        assert_eq!(
            parse_translation(&body).unwrap(),
            "Extinct in 1627 due to overhunting."
        );
    }

    #[test]
    fn rejects_unexpected_shape() {
        assert!(matches!(
            parse_translation(&json!({"error": "nope"})),
            Err(TranslateError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_translation(&json!([[]])),
            Err(TranslateError::MalformedResponse(_))
        ));
    }

    #[test]
    fn too_many_requests_is_rate_limited() {
        let url = serve_once(
            "HTTP/1.1 429 Too Many Requests\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        );
        let provider = GoogleProvider::new(&url, Duration::from_secs(5)).unwrap();
        assert!(matches!(
            provider.translate("Extinto.", "pt", "en"),
            Err(TranslateError::RateLimited)
        ));
    }

    #[test]
    fn server_error_keeps_status_code() {
        let url = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        );
        let provider = GoogleProvider::new(&url, Duration::from_secs(5)).unwrap();
        assert!(matches!(
            provider.translate("Extinto.", "pt", "en"),
            Err(TranslateError::Status { status: 500 })
        ));
    }

    #[test]
    fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        thread::spawn(move || {
            let (_stream, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_secs(2));
        });

        let provider = GoogleProvider::new(&url, Duration::from_millis(300)).unwrap();
        assert!(matches!(
            provider.translate("Extinto.", "pt", "en"),
            Err(TranslateError::Timeout)
        ));
    }

    #[test]
    fn successful_response_is_parsed() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 27\r\n\
             connection: close\r\n\r\n[[[\"Extinct.\",\"Extinto.\"]]]",
        );
        let provider = GoogleProvider::new(&url, Duration::from_secs(5)).unwrap();
        assert_eq!(provider.translate("Extinto.", "pt", "en").unwrap(), "Extinct.");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let provider = GoogleProvider::new("http://localhost:9/", Duration::from_secs(1)).unwrap();
        assert_eq!(provider.base_url, "http://localhost:9");
        assert_eq!(provider.name(), "google");
    }
}
