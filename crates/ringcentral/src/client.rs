//! RingCentral REST client.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use pipeline_core::{
    async_trait, CallEvent, ExtensionEntry, RecordingContent, SyncError, Telephony, TokenCache,
};
use reqwest::header::{HeaderMap, CONTENT_TYPE, RETRY_AFTER};
use reqwest::StatusCode;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::api_types::{RecordPage, TokenResponse};
use crate::config::RingCentralConfig;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// API maximum page size for the extension listing.
const EXTENSIONS_PER_PAGE: i64 = 100;
/// API maximum page size for the call log.
const CALL_LOG_PER_PAGE: i64 = 250;

/// Wait applied on a rate-limit response carrying no usable Retry-After.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(10);

const RECORDING_ATTEMPTS: u32 = 3;
const RECORDING_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Client for the RingCentral REST API.
///
/// Holds its own token cache; every request path goes through
/// [`ensure_token`](Self::ensure_token) so a token is exchanged at most once
/// per effective lifetime.
#[derive(Debug)]
pub struct RingCentralClient {
    http: reqwest::Client,
    config: RingCentralConfig,
    token: TokenCache,
}

impl RingCentralClient {
    pub fn new(config: RingCentralConfig) -> Result<Self, SyncError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| SyncError::Transient(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            config,
            token: TokenCache::new(),
        })
    }

    /// A valid access token, exchanged via the JWT bearer grant when the
    /// cached one is absent or within its expiry buffer.
    async fn ensure_token(&self) -> Result<String, SyncError> {
        if let Some(token) = self.token.current().await {
            return Ok(token);
        }

        let basic = BASE64.encode(format!(
            "{}:{}",
            self.config.client_id, self.config.client_secret
        ));
        let url = format!("{}/restapi/oauth/token", self.config.api_url);

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Basic {basic}"))
            .form(&[
                ("grant_type", JWT_BEARER_GRANT),
                ("assertion", self.config.jwt_token.as_str()),
            ])
            .send()
            .await
            .map_err(transient)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Credential(format!(
                "token exchange rejected: {status} {body}"
            )));
        }

        let issued: TokenResponse = response
            .json()
            .await
            .map_err(|e| SyncError::Data(format!("malformed token response: {e}")))?;

        info!("obtained telephony access token");
        self.token
            .store(issued.access_token.clone(), issued.expires_in.unwrap_or(3600))
            .await;

        Ok(issued.access_token)
    }

    /// Fetch one listing page, sleeping out rate limits and reissuing the
    /// same request until the server answers it.
    async fn fetch_page(&self, url: &str, params: &[(&str, String)]) -> Result<RecordPage, SyncError> {
        loop {
            let token = self.ensure_token().await?;
            let response = self
                .http
                .get(url)
                .bearer_auth(&token)
                .query(params)
                .send()
                .await
                .map_err(transient)?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                let wait = retry_after(response.headers());
                warn!(seconds = wait.as_secs(), "telephony rate limit, waiting");
                sleep(wait).await;
                continue;
            }
            if status == StatusCode::UNAUTHORIZED {
                self.token.clear().await;
                return Err(SyncError::AuthExpired(format!(
                    "telephony rejected token on {url}"
                )));
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(SyncError::Transient(format!(
                    "telephony request failed: {status} {body}"
                )));
            }

            return response
                .json::<RecordPage>()
                .await
                .map_err(|e| SyncError::Data(format!("malformed listing page: {e}")));
        }
    }

    /// Drain every page of a listing endpoint into raw records.
    async fn fetch_all_pages(
        &self,
        url: &str,
        base_params: &[(&str, String)],
        per_page: i64,
    ) -> Result<Vec<serde_json::Value>, SyncError> {
        let mut records = Vec::new();
        let mut page = 1i64;

        loop {
            let mut params = base_params.to_vec();
            params.push(("page", page.to_string()));
            params.push(("perPage", per_page.to_string()));

            let listing = self.fetch_page(url, &params).await?;
            let fetched = listing.records.len();
            records.extend(listing.records);

            debug!(page, fetched, total_pages = listing.paging.total_pages, "fetched listing page");
            if fetched == 0 || page >= listing.paging.total_pages {
                break;
            }
            page += 1;
        }

        Ok(records)
    }
}

#[async_trait]
impl Telephony for RingCentralClient {
    async fn list_extensions(&self) -> Result<Vec<ExtensionEntry>, SyncError> {
        let url = format!(
            "{}/restapi/v1.0/account/{}/extension",
            self.config.api_url, self.config.account_id
        );
        let params = [("status", "Enabled".to_string())];

        let records = self
            .fetch_all_pages(&url, &params, EXTENSIONS_PER_PAGE)
            .await?;

        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            match serde_json::from_value::<ExtensionEntry>(record) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(error = %e, "skipping malformed extension record"),
            }
        }

        Ok(entries)
    }

    async fn list_call_log(
        &self,
        extension_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CallEvent>, SyncError> {
        let url = format!(
            "{}/restapi/v1.0/account/{}/extension/{}/call-log",
            self.config.api_url, self.config.account_id, extension_id
        );
        let params = [
            ("dateFrom", from.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("dateTo", to.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("direction", "Inbound".to_string()),
            ("type", "Voice".to_string()),
            ("view", "Detailed".to_string()),
            ("withRecording", "true".to_string()),
        ];

        let records = self.fetch_all_pages(&url, &params, CALL_LOG_PER_PAGE).await?;

        let mut events = Vec::with_capacity(records.len());
        for record in records {
            match CallEvent::from_raw(record) {
                Ok(event) => events.push(event),
                Err(e) => warn!(error = %e, "skipping malformed call record"),
            }
        }

        Ok(events)
    }

    async fn fetch_recording(&self, recording_id: &str) -> Result<RecordingContent, SyncError> {
        let url = format!(
            "{}/restapi/v1.0/account/{}/recording/{}/content",
            self.config.media_url, self.config.account_id, recording_id
        );

        let mut attempt = 0u32;
        loop {
            let token = self.ensure_token().await?;
            let response = self
                .http
                .get(&url)
                .bearer_auth(&token)
                .send()
                .await
                .map_err(transient)?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                // Rate limits do not consume a retry attempt.
                let wait = retry_after(response.headers());
                warn!(seconds = wait.as_secs(), recording_id, "media rate limit, waiting");
                sleep(wait).await;
                continue;
            }
            if status.is_success() {
                let content_type = response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = response.bytes().await.map_err(transient)?;
                return Ok(RecordingContent {
                    bytes: bytes.to_vec(),
                    content_type,
                });
            }

            attempt += 1;
            if attempt >= RECORDING_ATTEMPTS {
                return Err(SyncError::Transient(format!(
                    "recording {recording_id} download failed after {attempt} attempts: {status}"
                )));
            }
            let delay = RECORDING_RETRY_DELAY * 2u32.pow(attempt - 1);
            warn!(recording_id, %status, retry_in = delay.as_secs(), "recording download failed");
            sleep(delay).await;
        }
    }
}

fn transient(e: reqwest::Error) -> SyncError {
    SyncError::Transient(e.to_string())
}

fn retry_after(headers: &HeaderMap) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_RETRY_AFTER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    struct Scripted {
        status: u16,
        headers: Vec<(&'static str, String)>,
        body: String,
    }

    impl Scripted {
        fn json(status: u16, body: &str) -> Self {
            Self {
                status,
                headers: vec![("Content-Type", "application/json".to_string())],
                body: body.to_string(),
            }
        }
    }

    /// One-connection-per-response HTTP server for scripting exchanges.
    async fn spawn_scripted(responses: Vec<Scripted>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            for response in responses {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                read_request(&mut stream).await;
                counter.fetch_add(1, Ordering::SeqCst);

                let mut head = format!(
                    "HTTP/1.1 {} OK\r\nContent-Length: {}\r\nConnection: close\r\n",
                    response.status,
                    response.body.len()
                );
                for (name, value) in &response.headers {
                    head.push_str(&format!("{name}: {value}\r\n"));
                }
                head.push_str("\r\n");

                let _ = stream.write_all(head.as_bytes()).await;
                let _ = stream.write_all(response.body.as_bytes()).await;
                let _ = stream.flush().await;
            }
        });

        (base, hits)
    }

    async fn read_request(stream: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let content_length = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                let mut have = buf.len() - (end + 4);
                while have < content_length {
                    let n = stream.read(&mut chunk).await.unwrap_or(0);
                    if n == 0 {
                        return;
                    }
                    have += n;
                }
                return;
            }
        }
    }

    fn test_config(base: &str) -> RingCentralConfig {
        RingCentralConfig {
            api_url: base.to_string(),
            media_url: base.to_string(),
            client_id: "cid".to_string(),
            client_secret: "secret".to_string(),
            jwt_token: "signed.jwt".to_string(),
            account_id: "~".to_string(),
        }
    }

    const TOKEN_BODY: &str = r#"{"access_token": "tok", "expires_in": 3600}"#;

    fn extension_page(ids: std::ops::Range<i64>, total_pages: i64) -> String {
        let records: Vec<String> = ids
            .map(|id| format!(r#"{{"id": {id}, "name": "Ext {id}", "type": "User"}}"#))
            .collect();
        format!(
            r#"{{"records": [{}], "paging": {{"totalPages": {total_pages}}}}}"#,
            records.join(",")
        )
    }

    #[tokio::test]
    async fn test_list_extensions_drains_pages_and_honors_rate_limit() {
        let (base, hits) = spawn_scripted(vec![
            Scripted::json(200, TOKEN_BODY),
            Scripted::json(200, &extension_page(0..100, 2)),
            Scripted {
                status: 429,
                headers: vec![("Retry-After", "1".to_string())],
                body: String::new(),
            },
            Scripted::json(200, &extension_page(100..101, 2)),
        ])
        .await;

        let client = RingCentralClient::new(test_config(&base)).unwrap();
        let entries = client.list_extensions().await.unwrap();

        assert_eq!(entries.len(), 101);
        assert_eq!(entries[0].external_id(), "0");
        assert_eq!(entries[100].external_id(), "100");
        // Token exchange, page 1, rate-limited reissue, page 2.
        assert_eq!(hits.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_token_exchange_rejection_is_credential_error() {
        let (base, _hits) = spawn_scripted(vec![Scripted::json(
            400,
            r#"{"error": "invalid_grant"}"#,
        )])
        .await;

        let client = RingCentralClient::new(test_config(&base)).unwrap();
        let result = client.list_extensions().await;
        assert!(matches!(result, Err(SyncError::Credential(_))));
    }

    #[tokio::test]
    async fn test_call_log_parses_events_and_reuses_token() {
        let body = r#"{
            "records": [{
                "id": "call-1",
                "direction": "Inbound",
                "result": "Missed",
                "from": {"phoneNumber": "+15550001111"},
                "startTime": "2024-03-28T22:07:21.000Z",
                "legs": [{"result": "Missed"}]
            }],
            "paging": {"totalPages": 1}
        }"#;
        let (base, hits) = spawn_scripted(vec![
            Scripted::json(200, TOKEN_BODY),
            Scripted::json(200, body),
        ])
        .await;

        let client = RingCentralClient::new(test_config(&base)).unwrap();
        let events = client
            .list_call_log("101", Utc::now() - chrono::Duration::hours(1), Utc::now())
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "call-1");
        assert_eq!(events[0].from.phone_number, "+15550001111");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_recording_retries_then_succeeds() {
        let (base, hits) = spawn_scripted(vec![
            Scripted::json(200, TOKEN_BODY),
            Scripted::json(500, ""),
            Scripted {
                status: 200,
                headers: vec![("Content-Type", "audio/mpeg".to_string())],
                body: "AUDIO".to_string(),
            },
        ])
        .await;

        let client = RingCentralClient::new(test_config(&base)).unwrap();
        let recording = client.fetch_recording("rec-9").await.unwrap();

        assert_eq!(recording.content_type, "audio/mpeg");
        assert_eq!(recording.bytes, b"AUDIO");
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fetch_recording_gives_up_after_three_attempts() {
        let (base, hits) = spawn_scripted(vec![
            Scripted::json(200, TOKEN_BODY),
            Scripted::json(500, ""),
            Scripted::json(500, ""),
            Scripted::json(500, ""),
        ])
        .await;

        let client = RingCentralClient::new(test_config(&base)).unwrap();
        let result = client.fetch_recording("rec-9").await;

        assert!(matches!(result, Err(SyncError::Transient(_))));
        assert_eq!(hits.load(Ordering::SeqCst), 4);
    }
}
