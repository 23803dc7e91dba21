//! Remote registry - HTTP client for the platform's administrative API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::application::errors::SyncError;
use crate::domain::traits::{RateLimitNotice, RemoteCommand, RemoteRegistry};
use crate::infrastructure::config::RemoteCredentials;

fn header<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// Remote-supplied seconds; negative, NaN or out-of-range values are dropped
fn seconds(secs: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(secs).ok()
}

/// Build a notice from response headers.
///
/// Returns `None` unless the response was a 429 or exhausted its bucket.
pub fn notice_from_headers(
    method: &str,
    path: &str,
    status: u16,
    headers: &HeaderMap,
) -> Option<RateLimitNotice> {
    let remaining: Option<u32> = header(headers, "x-ratelimit-remaining");
    if status != StatusCode::TOO_MANY_REQUESTS.as_u16() && remaining != Some(0) {
        return None;
    }
    Some(RateLimitNotice {
        method: method.to_string(),
        path: path.to_string(),
        status,
        limit: header(headers, "x-ratelimit-limit"),
        remaining,
        reset_after: header::<f64>(headers, "x-ratelimit-reset-after").and_then(seconds),
        bucket: header(headers, "x-ratelimit-bucket"),
        global: header::<bool>(headers, "x-ratelimit-global").unwrap_or(false),
    })
}

#[derive(Debug, Deserialize)]
struct RateLimitBody {
    retry_after: f64,
}

/// Remote registry backed by the platform's REST API
pub struct HttpRemoteRegistry {
    client: Client,
    credentials: RemoteCredentials,
    notices: Option<mpsc::UnboundedSender<RateLimitNotice>>,
}

impl HttpRemoteRegistry {
    pub fn new(credentials: RemoteCredentials) -> Self {
        Self {
            client: Client::new(),
            credentials,
            notices: None,
        }
    }

    /// Forward rate-limit notices to `sender`
    pub fn with_notices(mut self, sender: mpsc::UnboundedSender<RateLimitNotice>) -> Self {
        self.notices = Some(sender);
        self
    }

    /// Path of the replace-all endpoint, global or guild-scoped
    pub fn commands_path(&self) -> String {
        match &self.credentials.guild_id {
            Some(guild) => format!(
                "/applications/{}/guilds/{}/commands",
                self.credentials.application_id, guild
            ),
            None => format!("/applications/{}/commands", self.credentials.application_id),
        }
    }

    fn publish(&self, notice: RateLimitNotice) {
        if let Some(sender) = &self.notices {
            // Receiver gone means nobody is logging; drop the notice
            let _ = sender.send(notice);
        }
    }
}

#[async_trait]
impl RemoteRegistry for HttpRemoteRegistry {
    async fn replace_all(&self, commands: &[RemoteCommand]) -> Result<usize, SyncError> {
        let path = self.commands_path();
        let url = format!("{}{}", self.credentials.api_base, path);

        let response = self
            .client
            .put(&url)
            .header("Authorization", format!("Bot {}", self.credentials.token))
            .json(commands)
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        let status = response.status();
        let notice = notice_from_headers("PUT", &path, status.as_u16(), response.headers());
        if let Some(notice) = notice {
            self.publish(notice);
        }

        if status.is_success() {
            let accepted: Vec<serde_json::Value> = response
                .json()
                .await
                .map_err(|e| SyncError::Network(e.to_string()))?;
            return Ok(accepted.len());
        }

        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = serde_json::from_str::<RateLimitBody>(&body)
                    .ok()
                    .and_then(|b| seconds(b.retry_after))
                    .unwrap_or_default();
                Err(SyncError::RateLimited { retry_after })
            }
            StatusCode::BAD_REQUEST => Err(SyncError::Validation(body)),
            other => Err(SyncError::Http {
                status: other.as_u16(),
                body,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_no_notice_while_budget_remains() {
        let map = headers(&[("x-ratelimit-limit", "5"), ("x-ratelimit-remaining", "3")]);
        assert!(notice_from_headers("PUT", "/applications/1/commands", 200, &map).is_none());
    }

    #[test]
    fn test_exhausted_bucket_yields_notice() {
        let map = headers(&[
            ("x-ratelimit-limit", "2"),
            ("x-ratelimit-remaining", "0"),
            ("x-ratelimit-reset-after", "20.5"),
            ("x-ratelimit-bucket", "abcd"),
        ]);
        let notice = notice_from_headers("PUT", "/applications/1/commands", 200, &map).unwrap();
        assert_eq!(notice.limit, Some(2));
        assert_eq!(notice.reset_after, Some(Duration::from_millis(20_500)));
        assert_eq!(notice.bucket.as_deref(), Some("abcd"));
        assert!(!notice.global);
    }

    #[test]
    fn test_429_without_headers_still_yields_notice() {
        let notice = notice_from_headers("PUT", "/x", 429, &HeaderMap::new()).unwrap();
        assert_eq!(notice.status, 429);
        assert!(notice.limit.is_none());
    }

    #[test]
    fn test_out_of_range_reset_after_is_dropped() {
        let map = headers(&[
            ("x-ratelimit-remaining", "0"),
            ("x-ratelimit-reset-after", "1e300"),
        ]);
        let notice = notice_from_headers("PUT", "/x", 200, &map).unwrap();
        assert_eq!(notice.remaining, Some(0));
        assert!(notice.reset_after.is_none());

        let map = headers(&[("x-ratelimit-reset-after", "-1")]);
        assert!(notice_from_headers("PUT", "/x", 429, &map).unwrap().reset_after.is_none());
    }

    #[test]
    fn test_retry_after_seconds_parsing() {
        assert_eq!(seconds(1.5), Some(Duration::from_millis(1_500)));
        assert_eq!(seconds(1e300), None);
        assert_eq!(seconds(f64::NAN), None);
        assert_eq!(seconds(-0.5), None);
    }

    #[test]
    fn test_guild_scoped_path() {
        let registry = HttpRemoteRegistry::new(RemoteCredentials {
            api_base: "https://example.invalid/api".to_string(),
            application_id: "10".to_string(),
            token: "t".to_string(),
            guild_id: Some("20".to_string()),
        });
        assert_eq!(registry.commands_path(), "/applications/10/guilds/20/commands");
    }
}
