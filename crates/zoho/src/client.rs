//! Zoho CRM REST client.

use std::time::Duration;

use pipeline_core::{async_trait, Crm, CrmLead, CrmUser, NewLead, SyncError, TokenCache};
use reqwest::multipart;
use reqwest::{RequestBuilder, Response, StatusCode};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::api_types::{DataEnvelope, MutationRecord, TokenResponse, UserPage};
use crate::config::ZohoConfig;

const TOKEN_ATTEMPTS: u32 = 3;
const TOKEN_RETRY_DELAY: Duration = Duration::from_secs(1);

const USERS_PER_PAGE: usize = 200;

/// The CRM caps note content at this many characters; longer content is
/// truncated with a trailing ellipsis before the request is sent.
const NOTE_MAX_CHARS: usize = 1000;

/// Client for the Zoho CRM API.
///
/// Access tokens are minted from the long-lived refresh token and cached
/// until their expiry buffer. Every record request gets one automatic
/// refresh-and-retry if the server answers 401.
#[derive(Debug)]
pub struct ZohoClient {
    http: reqwest::Client,
    config: ZohoConfig,
    token: TokenCache,
}

impl ZohoClient {
    pub fn new(config: ZohoConfig) -> Result<Self, SyncError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| SyncError::Transient(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            config,
            token: TokenCache::new(),
        })
    }

    /// A valid access token, refreshed through the OAuth refresh grant with
    /// bounded retries when the cache is empty.
    async fn ensure_token(&self) -> Result<String, SyncError> {
        if let Some(token) = self.token.current().await {
            return Ok(token);
        }

        let url = format!("{}/oauth/v2/token", self.config.accounts_url);
        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", self.config.refresh_token.as_str()),
        ];

        let mut delay = TOKEN_RETRY_DELAY;
        for attempt in 1..=TOKEN_ATTEMPTS {
            match self.http.post(&url).form(&params).send().await {
                Ok(response) if response.status().is_success() => {
                    match response.json::<TokenResponse>().await {
                        Ok(TokenResponse {
                            access_token: Some(token),
                            expires_in,
                        }) => {
                            info!("obtained CRM access token");
                            self.token
                                .store(token.clone(), expires_in.unwrap_or(3600))
                                .await;
                            return Ok(token);
                        }
                        Ok(_) => warn!(attempt, "CRM token response carried no access token"),
                        Err(e) => warn!(attempt, error = %e, "malformed CRM token response"),
                    }
                }
                Ok(response) => {
                    warn!(attempt, status = %response.status(), "CRM token refresh rejected")
                }
                Err(e) => warn!(attempt, error = %e, "CRM token refresh request failed"),
            }

            if attempt < TOKEN_ATTEMPTS {
                sleep(delay).await;
                delay *= 2;
            }
        }

        Err(SyncError::Credential(format!(
            "CRM token refresh failed after {TOKEN_ATTEMPTS} attempts"
        )))
    }

    /// Send a request built by `build`, refreshing the token and retrying
    /// exactly once if the server answers 401.
    async fn send_authorized<F>(&self, build: F) -> Result<Response, SyncError>
    where
        F: Fn(&str) -> RequestBuilder,
    {
        let token = self.ensure_token().await?;
        let response = authorize(build(&token), &token)
            .send()
            .await
            .map_err(transient)?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!("CRM rejected token, refreshing and retrying once");
        self.token.clear().await;
        let token = self.ensure_token().await?;
        let response = authorize(build(&token), &token)
            .send()
            .await
            .map_err(transient)?;
        if response.status() == StatusCode::UNAUTHORIZED {
            self.token.clear().await;
            return Err(SyncError::AuthExpired(
                "CRM rejected a freshly refreshed token".to_string(),
            ));
        }

        Ok(response)
    }
}

#[async_trait]
impl Crm for ZohoClient {
    async fn list_users(&self) -> Result<Vec<CrmUser>, SyncError> {
        let url = format!("{}/users", self.config.api_url);
        let mut users = Vec::new();
        let mut page = 1u32;

        loop {
            let response = self
                .send_authorized(|_| {
                    self.http.get(&url).query(&[
                        ("page", page.to_string()),
                        ("per_page", USERS_PER_PAGE.to_string()),
                    ])
                })
                .await?;

            if response.status() == StatusCode::NO_CONTENT {
                break;
            }
            let listing: UserPage = read_json(response).await?;
            let fetched = listing.users.len();
            users.extend(listing.users);

            // A short page is the last one.
            if fetched < USERS_PER_PAGE {
                break;
            }
            page += 1;
        }

        Ok(users)
    }

    async fn search_lead_by_phone(&self, phone: &str) -> Result<Option<CrmLead>, SyncError> {
        let url = format!("{}/Leads/search", self.config.api_url);
        let criteria = format!("Phone:equals:{phone}");
        let response = self
            .send_authorized(|_| self.http.get(&url).query(&[("criteria", criteria.as_str())]))
            .await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let envelope: DataEnvelope<CrmLead> = read_json(response).await?;
        Ok(envelope.data.into_iter().next())
    }

    async fn create_lead(&self, lead: &NewLead) -> Result<String, SyncError> {
        let url = format!("{}/Leads", self.config.api_url);
        let body = serde_json::json!({ "data": [lead] });

        let response = self
            .send_authorized(|_| self.http.post(&url).json(&body))
            .await?;
        let envelope: DataEnvelope<MutationRecord> = read_json(response).await?;

        envelope
            .data
            .into_iter()
            .next()
            .and_then(MutationRecord::record_id)
            .ok_or_else(|| SyncError::Data("lead create response carried no id".to_string()))
    }

    async fn update_lead_status(&self, lead_id: &str, status: &str) -> Result<(), SyncError> {
        let url = format!("{}/Leads", self.config.api_url);
        let body = serde_json::json!({
            "data": [{ "id": lead_id, "Lead_Status": status }]
        });

        let response = self
            .send_authorized(|_| self.http.put(&url).json(&body))
            .await?;
        expect_success(response).await?;
        Ok(())
    }

    async fn add_note(&self, lead_id: &str, title: &str, content: &str) -> Result<(), SyncError> {
        let url = format!("{}/Leads/{}/Notes", self.config.api_url, lead_id);
        let content = truncate_note(content);
        let body = serde_json::json!({
            "data": [{ "Note_Title": title, "Note_Content": content }]
        });

        let response = self
            .send_authorized(|_| self.http.post(&url).json(&body))
            .await?;
        expect_success(response).await?;
        Ok(())
    }

    async fn attach_file(
        &self,
        lead_id: &str,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), SyncError> {
        let url = format!("{}/Leads/{}/Attachments", self.config.api_url, lead_id);

        // The multipart form is consumed by each send, so the body is rebuilt
        // from the owned bytes for the one retry after a token refresh.
        let mut refreshed = false;
        loop {
            let token = self.ensure_token().await?;
            let part = multipart::Part::bytes(bytes.clone())
                .file_name(filename.to_string())
                .mime_str(content_type)
                .map_err(|e| SyncError::Data(format!("invalid attachment content type: {e}")))?;
            let request = self
                .http
                .post(&url)
                .multipart(multipart::Form::new().part("file", part));
            let response = authorize(request, &token).send().await.map_err(transient)?;

            if response.status() == StatusCode::UNAUTHORIZED {
                self.token.clear().await;
                if refreshed {
                    return Err(SyncError::AuthExpired(
                        "CRM rejected a freshly refreshed token on attachment upload".to_string(),
                    ));
                }
                debug!("CRM rejected token on attachment upload, refreshing and retrying once");
                refreshed = true;
                continue;
            }
            expect_success(response).await?;
            return Ok(());
        }
    }
}

fn authorize(request: RequestBuilder, token: &str) -> RequestBuilder {
    request.header("Authorization", format!("Zoho-oauthtoken {token}"))
}

fn transient(e: reqwest::Error) -> SyncError {
    SyncError::Transient(e.to_string())
}

async fn expect_success(response: Response) -> Result<Response, SyncError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SyncError::Transient(format!(
        "CRM request failed: {status} {body}"
    )))
}

async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, SyncError> {
    expect_success(response)
        .await?
        .json()
        .await
        .map_err(|e| SyncError::Data(format!("malformed CRM payload: {e}")))
}

/// Clip note content to the CRM's character limit, marking the cut.
fn truncate_note(content: &str) -> String {
    if content.chars().count() <= NOTE_MAX_CHARS {
        return content.to_string();
    }
    let mut clipped: String = content.chars().take(NOTE_MAX_CHARS - 3).collect();
    clipped.push_str("...");
    clipped
}
