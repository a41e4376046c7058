//! Blocking HTTP transport for the GoCD configuration endpoints.
//!
//! Retry policy lives here, not in the configuration core: GETs are
//! retried on 503/504 up to five times with a fixed one-second backoff,
//! matching a server that is briefly unavailable while restarting.

mod error;

use std::thread;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, warn};

use gocd_config::{ConfigError, FINGERPRINT_HEADER, FetchedConfig, HostClient};

pub use error::{ClientError, Result};

const MAX_RETRIES: u32 = 5;
const RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// A REST client for one Go server.
#[derive(Debug, Clone)]
pub struct HostRestClient {
    host: String,
    username: Option<String>,
    password: Option<String>,
    ssl: bool,
}

impl HostRestClient {
    /// `host` is `host:port`, e.g. `localhost:8153`.
    pub fn new(host: &str) -> HostRestClient {
        HostRestClient {
            host: host.to_string(),
            username: None,
            password: None,
            ssl: false,
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, username: &str, password: &str) -> HostRestClient {
        self.username = Some(username.to_string());
        self.password = Some(password.to_string());
        self
    }

    #[must_use]
    pub fn with_ssl(mut self, ssl: bool) -> HostRestClient {
        self.ssl = ssl;
        self
    }

    fn url(&self, path: &str) -> String {
        let scheme = if self.ssl { "https" } else { "http" };
        format!("{scheme}://{}{path}", self.host)
    }

    fn authorization_header(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (None, None) => None,
            (username, password) => {
                let credentials = format!(
                    "{}:{}",
                    username.as_deref().unwrap_or(""),
                    password.as_deref().unwrap_or("")
                );
                Some(format!("Basic {}", STANDARD.encode(credentials)))
            }
        }
    }

    fn get_once(&self, url: &str) -> std::result::Result<ureq::Response, ureq::Error> {
        let mut request = ureq::get(url);
        if let Some(authorization) = self.authorization_header() {
            request = request.set("Authorization", &authorization);
        }
        request.call()
    }

    fn get_with_retry(&self, path: &str) -> Result<ureq::Response> {
        let url = self.url(path);
        let mut attempt = 0;
        loop {
            match self.get_once(&url) {
                Ok(response) => return Ok(response),
                Err(ureq::Error::Status(status @ (503 | 504), _)) if attempt < MAX_RETRIES => {
                    attempt += 1;
                    warn!(url = %url, status, attempt, "server unavailable; retrying");
                    thread::sleep(RETRY_BACKOFF);
                }
                Err(ureq::Error::Status(status, _)) => {
                    return Err(ClientError::GetFailed { url, status });
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    fn fetch(&self, path: &str) -> Result<FetchedConfig> {
        let response = self.get_with_retry(path)?;
        let fingerprint = response
            .header(FINGERPRINT_HEADER)
            .map(ToString::to_string)
            .ok_or_else(|| {
                ClientError::MissingFingerprint(self.url(path), FINGERPRINT_HEADER.to_string())
            })?;
        let body = response.into_string()?;
        debug!(path, bytes = body.len(), "fetched configuration");
        Ok(FetchedConfig { body, fingerprint })
    }

    fn submit(&self, path: &str, form: &[(&str, &str)], headers: &[(&str, &str)]) -> Result<()> {
        let url = self.url(path);
        let mut request = ureq::post(&url);
        if let Some(authorization) = self.authorization_header() {
            request = request.set("Authorization", &authorization);
        }
        for (name, value) in headers {
            request = request.set(name, value);
        }
        match request.send_form(form) {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                Err(ClientError::PostRejected {
                    url,
                    status,
                    message: rejection_message(&body),
                })
            }
            Err(error) => Err(error.into()),
        }
    }
}

/// The server wraps its rejection reason in a json `result` field; fall
/// back to the raw body when it is not json.
fn rejection_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("result")
                .and_then(|result| result.as_str())
                .map(ToString::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

impl HostClient for HostRestClient {
    fn get(&self, path: &str) -> gocd_config::Result<FetchedConfig> {
        self.fetch(path).map_err(ConfigError::from)
    }

    fn post(
        &self,
        path: &str,
        form: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> gocd_config::Result<()> {
        self.submit(path, form, headers).map_err(ConfigError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_follow_the_ssl_flag() {
        let plain = HostRestClient::new("localhost:8153");
        assert_eq!(
            plain.url("/go/api/version"),
            "http://localhost:8153/go/api/version"
        );
        let secure = HostRestClient::new("go.example.com").with_ssl(true);
        assert_eq!(
            secure.url("/go/api/version"),
            "https://go.example.com/go/api/version"
        );
    }

    #[test]
    fn credentials_become_a_basic_auth_header() {
        let client = HostRestClient::new("localhost:8153").with_credentials("admin", "badger");
        assert_eq!(
            client.authorization_header().as_deref(),
            Some("Basic YWRtaW46YmFkZ2Vy")
        );
        assert_eq!(HostRestClient::new("x").authorization_header(), None);
    }

    #[test]
    fn rejection_messages_prefer_the_json_result_field() {
        assert_eq!(
            rejection_message("{\"result\": \"Duplicate unique value\"}"),
            "Duplicate unique value"
        );
        assert_eq!(rejection_message("<html>nope</html>"), "<html>nope</html>");
    }
}
