use crate::core::rate::RateError;
use reqwest::blocking::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;

/// Default HTTP request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A single query for the current official exchange rate.
///
/// Implementations perform the I/O and report every problem as a
/// [`RateError`]; they never decide on a fallback themselves.
pub trait RateFeed {
    /// Human-readable identity, used in logs and reports.
    fn name(&self) -> &str;

    /// Fetch the rate in local-currency units per reference unit.
    fn fetch(&self) -> Result<Decimal, RateError>;
}

/// Rate feed backed by a JSON HTTP endpoint.
///
/// Expects a body like `{"rate": 36.52}`; the rate may also be a JSON
/// string. The field name is configurable.
pub struct HttpRateFeed {
    client: Client,
    url: String,
    field: String,
}

impl HttpRateFeed {
    pub fn new(url: impl Into<String>, field: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self::with_client(client, url, field)
    }

    /// Use a preconfigured client, e.g. one with custom proxy settings.
    pub fn with_client(client: Client, url: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            field: field.into(),
        }
    }
}

impl RateFeed for HttpRateFeed {
    fn name(&self) -> &str {
        &self.url
    }

    fn fetch(&self) -> Result<Decimal, RateError> {
        let response = self.client.get(&self.url).send().map_err(|e| {
            if e.is_timeout() {
                RateError::Timeout {
                    url: self.url.clone(),
                }
            } else {
                RateError::Transport {
                    url: self.url.clone(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RateError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .map_err(|e| RateError::Malformed(e.to_string()))?;
        extract_rate(&body, &self.field)
    }
}

/// Pull a positive rate out of a JSON body.
pub fn extract_rate(body: &Value, field: &str) -> Result<Decimal, RateError> {
    let raw = body
        .get(field)
        .ok_or_else(|| RateError::Malformed(format!("no '{}' field", field)))?;

    let text = match raw {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        other => {
            return Err(RateError::Malformed(format!(
                "'{}' is not a number: {}",
                field, other
            )))
        }
    };

    let rate = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| RateError::Malformed(format!("'{}' is not a number: {}", field, text)))?;

    if rate <= Decimal::ZERO {
        return Err(RateError::NonPositive(rate));
    }
    Ok(rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_numeric_rate() {
        assert_eq!(extract_rate(&json!({"rate": 36.52}), "rate"), Ok(dec!(36.52)));
    }

    #[test]
    fn test_string_rate() {
        assert_eq!(extract_rate(&json!({"rate": " 40.10 "}), "rate"), Ok(dec!(40.10)));
    }

    #[test]
    fn test_custom_field() {
        assert_eq!(extract_rate(&json!({"usd": 41}), "usd"), Ok(dec!(41)));
    }

    #[test]
    fn test_missing_field() {
        assert!(matches!(
            extract_rate(&json!({"price": 1}), "rate"),
            Err(RateError::Malformed(_))
        ));
    }

    #[test]
    fn test_non_numeric() {
        assert!(matches!(
            extract_rate(&json!({"rate": "soon"}), "rate"),
            Err(RateError::Malformed(_))
        ));
        assert!(matches!(
            extract_rate(&json!({"rate": null}), "rate"),
            Err(RateError::Malformed(_))
        ));
    }

    #[test]
    fn test_zero_and_negative() {
        assert_eq!(
            extract_rate(&json!({"rate": 0}), "rate"),
            Err(RateError::NonPositive(Decimal::ZERO))
        );
        assert_eq!(
            extract_rate(&json!({"rate": -3}), "rate"),
            Err(RateError::NonPositive(dec!(-3)))
        );
    }

    /// Serve exactly one connection on a local port with a canned reply.
    /// `None` accepts the connection and never answers.
    fn serve_once(reply: Option<String>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => return,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            match reply {
                Some(reply) => {
                    let _ = stream.write_all(reply.as_bytes());
                }
                None => thread::sleep(Duration::from_secs(3)),
            }
        });
        format!("http://{}/rate", addr)
    }

    fn http_reply(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    }

    fn local_feed(url: String, timeout: Duration) -> HttpRateFeed {
        let client = Client::builder().timeout(timeout).no_proxy().build().unwrap();
        HttpRateFeed::with_client(client, url, "rate")
    }

    #[test]
    fn test_fetch_accepts_rate() {
        let url = serve_once(Some(http_reply("200 OK", r#"{"rate":"36.5"}"#)));
        let feed = local_feed(url, Duration::from_secs(5));
        assert_eq!(feed.fetch(), Ok(dec!(36.5)));
    }

    #[test]
    fn test_fetch_server_error_is_http_status() {
        let url = serve_once(Some(http_reply("500 Internal Server Error", "{}")));
        let feed = local_feed(url, Duration::from_secs(5));
        assert_eq!(feed.fetch(), Err(RateError::HttpStatus { status: 500 }));
    }

    #[test]
    fn test_fetch_non_json_is_malformed() {
        let url = serve_once(Some(http_reply("200 OK", "<html>maintenance</html>")));
        let feed = local_feed(url, Duration::from_secs(5));
        assert!(matches!(feed.fetch(), Err(RateError::Malformed(_))));
    }

    #[test]
    fn test_fetch_zero_rate_is_non_positive() {
        let url = serve_once(Some(http_reply("200 OK", r#"{"rate":0}"#)));
        let feed = local_feed(url, Duration::from_secs(5));
        assert_eq!(feed.fetch(), Err(RateError::NonPositive(Decimal::ZERO)));
    }

    #[test]
    fn test_fetch_silent_server_times_out() {
        let url = serve_once(None);
        let feed = local_feed(url.clone(), Duration::from_millis(200));
        assert_eq!(feed.fetch(), Err(RateError::Timeout { url }));
    }

    #[test]
    fn test_unreachable_endpoint_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/rate", listener.local_addr().unwrap());
        drop(listener);
        let feed = local_feed(url, Duration::from_secs(2));
        assert!(matches!(feed.fetch(), Err(RateError::Transport { .. })));
    }
}
