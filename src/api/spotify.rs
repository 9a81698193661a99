//! Spotify Web API client.
//!
//! Authenticates with the client-credentials flow and pages through
//! playlist items until the API stops returning a `next` link.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use super::PlaylistSource;
use crate::error::{EtlError, Result};

/// Base URL for the Spotify Web API.
const API_BASE_URL: &str = "https://api.spotify.com/v1/";

/// Client-credentials token endpoint.
const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Largest page size the playlist items endpoint accepts.
const PAGE_LIMIT: u32 = 100;

/// Client-credentials pair for the Spotify accounts service.
#[derive(Clone)]
pub struct Credentials {
    /// Application client ID.
    pub client_id: String,
    /// Application client secret.
    pub client_secret: String,
}

impl Credentials {
    /// Create a credentials pair.
    pub fn new<S1: Into<String>, S2: Into<String>>(client_id: S1, client_secret: S2) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Refresh the token this long before the accounts service expires it.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Lifetime assumed when the token response carries no `expires_in`.
const DEFAULT_TOKEN_LIFETIME: u64 = 3600;

/// Bearer token together with the instant it stops being usable.
#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn new(value: String, expires_in: u64, issued_at: Instant) -> Self {
        Self {
            value,
            expires_at: issued_at + Duration::from_secs(expires_in),
        }
    }

    fn is_fresh_at(&self, now: Instant) -> bool {
        now + TOKEN_EXPIRY_MARGIN < self.expires_at
    }
}

/// Spotify Web API client.
///
/// # Example
///
/// ```rust,no_run
/// use playlist_etl::api::{Credentials, PlaylistSource, SpotifyApi};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let api = SpotifyApi::new(Credentials::new("client_id", "client_secret"))?;
///     let items = api.fetch_playlist_items("34NbomaTu7YuOYnky8nLXL").await?;
///     println!("{} items", items.len());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SpotifyApi {
    client: Client,
    credentials: Credentials,
    /// Bearer token, fetched on first use and refreshed once it expires.
    access_token: Arc<RwLock<Option<CachedToken>>>,
}

impl SpotifyApi {
    /// Create a new client. No request is made until the first fetch.
    pub fn new(credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("playlist-etl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EtlError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            credentials,
            access_token: Arc::new(RwLock::new(None)),
        })
    }

    /// Get a bearer token, requesting a new one if none is cached or the
    /// cached one is about to expire.
    async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.access_token.read().await.as_ref() {
            if token.is_fresh_at(Instant::now()) {
                return Ok(token.value.clone());
            }
        }

        let mut cached = self.access_token.write().await;
        if let Some(token) = cached.as_ref() {
            if token.is_fresh_at(Instant::now()) {
                return Ok(token.value.clone());
            }
            debug!("Spotify access token expired, refreshing");
        }

        let token = self.request_token().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    /// Run the client-credentials flow.
    async fn request_token(&self) -> Result<CachedToken> {
        debug!("POST {}", TOKEN_URL);
        let issued_at = Instant::now();

        let response = self
            .client
            .post(TOKEN_URL)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        let data = decode_body(status, &response.bytes().await?)?;

        if !status.is_success() {
            let message = error_message(&data);
            error!("Spotify token request failed ({}): {}", status, message);
            return Err(if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
                EtlError::Auth(message)
            } else {
                EtlError::Fetch(format!("token endpoint returned {}: {}", status, message))
            });
        }

        let token = parse_token(&data, issued_at)?;
        info!("Spotify API authenticated");
        Ok(token)
    }

    /// Make an authenticated GET request to an absolute URL.
    async fn send_get(&self, url: &str, query: &[(&str, String)]) -> Result<(StatusCode, Value)> {
        debug!("GET {} with params: {:?}", url, query);
        let token = self.access_token().await?;

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let data = decode_body(status, &response.bytes().await?)?;
        Ok((status, data))
    }

    /// Fetch one page of playlist items.
    pub async fn get_playlist_items_page(
        &self,
        playlist_id: &str,
        offset: u32,
    ) -> Result<Value> {
        let url = format!("{}playlists/{}/tracks", API_BASE_URL, playlist_id);
        let (status, data) = self
            .send_get(
                &url,
                &[
                    ("limit", PAGE_LIMIT.to_string()),
                    ("offset", offset.to_string()),
                ],
            )
            .await?;
        check_playlist_status(playlist_id, status, &data)?;
        Ok(data)
    }

    /// Fetch a page by the `next` link of the previous one.
    async fn get_next_page(&self, playlist_id: &str, url: String) -> Result<Value> {
        let (status, data) = self.send_get(&url, &[]).await?;
        check_playlist_status(playlist_id, status, &data)?;
        Ok(data)
    }
}

#[async_trait]
impl PlaylistSource for SpotifyApi {
    async fn fetch_playlist_items(&self, playlist_id: &str) -> Result<Vec<Value>> {
        let first = self.get_playlist_items_page(playlist_id, 0).await?;
        let items = collect_pages(first, |url| self.get_next_page(playlist_id, url)).await?;

        debug!("Fetched {} items for playlist {}", items.len(), playlist_id);
        Ok(items)
    }
}

/// Gather the items of a paging object and every page after it.
///
/// Follows `next` links until one is null. A failed page fails the whole
/// collection, so a truncated playlist is never returned.
async fn collect_pages<F, Fut>(first: Value, mut fetch_next: F) -> Result<Vec<Value>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Value>>,
{
    let (mut items, mut next_url) = split_page(first)?;

    while let Some(url) = next_url {
        let page = fetch_next(url).await?;
        let (page_items, next) = split_page(page)?;
        items.extend(page_items);
        next_url = next;
    }

    Ok(items)
}

/// Decode a response body.
///
/// Error responses may carry an empty or non-JSON body, which decodes to
/// `Null`; a success response must be valid JSON.
fn decode_body(status: StatusCode, body: &[u8]) -> Result<Value> {
    match serde_json::from_slice(body) {
        Ok(data) => Ok(data),
        Err(_) if !status.is_success() => Ok(Value::Null),
        Err(e) => Err(EtlError::Fetch(format!(
            "Invalid JSON in {} response: {}",
            status, e
        ))),
    }
}

/// Read the access token and its lifetime from a token response.
fn parse_token(data: &Value, issued_at: Instant) -> Result<CachedToken> {
    let value = data
        .get("access_token")
        .and_then(|t| t.as_str())
        .ok_or_else(|| EtlError::Auth("No access token in response".to_string()))?;
    let expires_in = data
        .get("expires_in")
        .and_then(|e| e.as_u64())
        .unwrap_or(DEFAULT_TOKEN_LIFETIME);

    Ok(CachedToken::new(value.to_string(), expires_in, issued_at))
}

/// Map a playlist page status, reporting 404 as a missing playlist.
fn check_playlist_status(playlist_id: &str, status: StatusCode, data: &Value) -> Result<()> {
    if status == StatusCode::NOT_FOUND {
        error!("Spotify playlist {} not found", playlist_id);
        return Err(EtlError::Fetch(format!("Playlist not found: {}", playlist_id)));
    }
    check_status(status, data)
}

/// Split a paging object into its items and the next page URL.
fn split_page(mut page: Value) -> Result<(Vec<Value>, Option<String>)> {
    let next = page
        .get("next")
        .and_then(|n| n.as_str())
        .map(|s| s.to_string());

    let items = match page.get_mut("items").map(Value::take) {
        Some(Value::Array(items)) => items,
        _ => return Err(EtlError::Fetch("Paging object has no items".to_string())),
    };

    Ok((items, next))
}

/// Map a non-success API status to the error taxonomy.
fn check_status(status: StatusCode, data: &Value) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }

    let message = error_message(data);
    error!("Spotify API error ({}): {}", status, message);
    Err(match status {
        StatusCode::UNAUTHORIZED => EtlError::Auth(message),
        _ => EtlError::Fetch(format!("{} {}", status.as_u16(), message)),
    })
}

/// Pull a human-readable message out of an API or accounts error body.
fn error_message(data: &Value) -> String {
    let error = data.get("error");
    error
        .and_then(|e| e.get("message"))
        .or_else(|| data.get("error_description"))
        .or(error)
        .and_then(|m| m.as_str())
        .unwrap_or("Unknown error")
        .to_string()
}
