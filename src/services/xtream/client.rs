//! Xtream Codes API Client
//!
//! HTTP client for making requests to Xtream Codes Player API v2.

use super::types::*;
use crate::config::Config;
use crate::models::ApiConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};
use url::Url;

/// Longest response excerpt written to the debug log
const BODY_PREVIEW_CHARS: usize = 500;

/// Catalog operations against an Xtream panel.
///
/// Every call takes the [`ApiConfig`] explicitly; implementations hold no
/// session state of their own.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Account + server info; doubles as the credential check
    async fn get_account_info(&self, config: &ApiConfig) -> Result<XtreamAuthResponse, XtreamError>;

    async fn get_live_categories(&self, config: &ApiConfig) -> Result<Vec<XtreamCategory>, XtreamError>;
    async fn get_vod_categories(&self, config: &ApiConfig) -> Result<Vec<XtreamCategory>, XtreamError>;
    async fn get_series_categories(&self, config: &ApiConfig) -> Result<Vec<XtreamCategory>, XtreamError>;

    async fn get_live_streams(&self, config: &ApiConfig) -> Result<Vec<XtreamLiveStream>, XtreamError>;
    async fn get_vod_streams(&self, config: &ApiConfig) -> Result<Vec<XtreamVodStream>, XtreamError>;
    async fn get_series_streams(&self, config: &ApiConfig) -> Result<Vec<XtreamSeries>, XtreamError>;

    /// Short EPG for one channel, at most `limit` entries
    async fn get_short_epg(
        &self,
        config: &ApiConfig,
        channel_id: i64,
        limit: u32,
    ) -> Result<XtreamEpgListings, XtreamError>;

    async fn get_vod_info(&self, config: &ApiConfig, vod_id: i64) -> Result<XtreamVodInfo, XtreamError>;
    async fn get_series_info(&self, config: &ApiConfig, series_id: i64) -> Result<XtreamSeriesInfo, XtreamError>;
}

/// Xtream API Client backed by reqwest
pub struct XtreamClient {
    http: Client,
}

impl XtreamClient {
    /// Create a new Xtream client from the client configuration
    pub fn new(config: &Config) -> Result<Self, XtreamError> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.fetch_timeout_ms))
            .user_agent(config.user_agent.clone())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| XtreamError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http })
    }

    /// Build `{server}/player_api.php?username=..&password=..[&action=..]`
    fn api_url(config: &ApiConfig, action: Option<&str>, params: &[(&str, String)]) -> Result<Url, XtreamError> {
        let mut query: Vec<(&str, String)> = vec![
            ("username", config.auth.username.clone()),
            ("password", config.auth.password.clone()),
        ];
        if let Some(action) = action {
            query.push(("action", action.to_string()));
        }
        query.extend(params.iter().cloned());

        Url::parse_with_params(&format!("{}/player_api.php", config.server()), &query)
            .map_err(|e| XtreamError::InvalidUrl(e.to_string()))
    }

    /// Fetch the raw body for an action. Incomplete configs are rejected
    /// here, before any request goes out.
    async fn fetch(
        &self,
        config: &ApiConfig,
        action: Option<&str>,
        params: &[(&str, String)],
    ) -> Result<String, XtreamError> {
        if !config.is_complete() {
            return Err(XtreamError::IncompleteConfig);
        }

        let url = Self::api_url(config, action, params)?;

        debug!("Xtream API request: {}", action.unwrap_or("account_info"));

        let response = self.http.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                XtreamError::Network("Connection timeout - server did not respond".to_string())
            } else if e.is_connect() {
                XtreamError::Network("Connection failed - server unreachable".to_string())
            } else {
                XtreamError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(XtreamError::Http(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| XtreamError::Network(e.to_string()))
    }

    /// Fetch a list endpoint. Panels answer "nothing here" with an empty
    /// body, `[]` or `null`, all of which mean an empty list.
    async fn get_list<T: DeserializeOwned>(
        &self,
        config: &ApiConfig,
        action: &str,
    ) -> Result<Vec<T>, XtreamError> {
        let text = self.fetch(config, Some(action), &[]).await?;
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == "[]" || trimmed == "null" {
            return Ok(Vec::new());
        }
        parse_list(action, trimmed)
    }

    /// Fetch an object endpoint
    async fn get_object<T: DeserializeOwned>(
        &self,
        config: &ApiConfig,
        action: &str,
        params: &[(&str, String)],
    ) -> Result<T, XtreamError> {
        let text = self.fetch(config, Some(action), params).await?;
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == "[]" || trimmed == "null" {
            return Err(XtreamError::EmptyResponse);
        }
        parse_body(action, trimmed)
    }
}

fn parse_body<T: DeserializeOwned>(action: &str, text: &str) -> Result<T, XtreamError> {
    serde_json::from_str(text).map_err(|e| {
        error!("Failed to parse Xtream response for action '{}': {}", action, e);
        debug!("Response text: {}", preview(text));
        XtreamError::Parse(e.to_string())
    })
}

/// Parse a JSON array entry by entry. Malformed entries are skipped; only a
/// body that is not an array fails.
pub(crate) fn parse_list<T: DeserializeOwned>(action: &str, text: &str) -> Result<Vec<T>, XtreamError> {
    let entries: Vec<serde_json::Value> = parse_body(action, text)?;
    let total = entries.len();

    let items: Vec<T> = entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(item) => Some(item),
            Err(e) => {
                debug!("Skipping malformed '{}' entry: {}", action, e);
                None
            }
        })
        .collect();

    if items.len() < total {
        warn!(
            "Skipped {} of {} malformed entries in '{}' response",
            total - items.len(),
            total,
            action
        );
    }
    Ok(items)
}

fn preview(text: &str) -> String {
    text.chars().take(BODY_PREVIEW_CHARS).collect()
}

/// Interpret a player_api.php account response
pub(crate) fn parse_account_info(text: &str) -> Result<XtreamAuthResponse, XtreamError> {
    let trimmed = text.trim();

    // Some servers return HTML error pages instead of JSON
    if trimmed.starts_with('<') {
        return Err(XtreamError::Unauthorized(
            "Server returned HTML instead of JSON - likely invalid credentials".to_string(),
        ));
    }
    if trimmed.is_empty() || trimmed == "null" || trimmed == "[]" {
        return Err(XtreamError::EmptyResponse);
    }

    let auth: XtreamAuthResponse = parse_body("account_info", trimmed)?;

    if auth.user_info.is_rejected() {
        return Err(XtreamError::Unauthorized("Credentials rejected by panel".to_string()));
    }
    if !auth.user_info.is_active() {
        return Err(XtreamError::Unauthorized(format!(
            "Account not active. Status: {}",
            auth.user_info.status.as_deref().unwrap_or("unknown")
        )));
    }

    Ok(auth)
}

#[async_trait]
impl ApiClient for XtreamClient {
    async fn get_account_info(&self, config: &ApiConfig) -> Result<XtreamAuthResponse, XtreamError> {
        let text = self.fetch(config, None, &[]).await?;
        parse_account_info(&text)
    }

    // ========================================================================
    // Categories
    // ========================================================================

    async fn get_live_categories(&self, config: &ApiConfig) -> Result<Vec<XtreamCategory>, XtreamError> {
        self.get_list(config, "get_live_categories").await
    }

    async fn get_vod_categories(&self, config: &ApiConfig) -> Result<Vec<XtreamCategory>, XtreamError> {
        self.get_list(config, "get_vod_categories").await
    }

    async fn get_series_categories(&self, config: &ApiConfig) -> Result<Vec<XtreamCategory>, XtreamError> {
        self.get_list(config, "get_series_categories").await
    }

    // ========================================================================
    // Streams
    // ========================================================================

    async fn get_live_streams(&self, config: &ApiConfig) -> Result<Vec<XtreamLiveStream>, XtreamError> {
        self.get_list(config, "get_live_streams").await
    }

    async fn get_vod_streams(&self, config: &ApiConfig) -> Result<Vec<XtreamVodStream>, XtreamError> {
        self.get_list(config, "get_vod_streams").await
    }

    async fn get_series_streams(&self, config: &ApiConfig) -> Result<Vec<XtreamSeries>, XtreamError> {
        self.get_list(config, "get_series").await
    }

    // ========================================================================
    // EPG
    // ========================================================================

    async fn get_short_epg(
        &self,
        config: &ApiConfig,
        channel_id: i64,
        limit: u32,
    ) -> Result<XtreamEpgListings, XtreamError> {
        let params = [("stream_id", channel_id.to_string()), ("limit", limit.to_string())];
        match self.get_object(config, "get_short_epg", &params).await {
            Err(XtreamError::EmptyResponse) => Ok(XtreamEpgListings::default()),
            other => other,
        }
    }

    // ========================================================================
    // Info
    // ========================================================================

    async fn get_vod_info(&self, config: &ApiConfig, vod_id: i64) -> Result<XtreamVodInfo, XtreamError> {
        self.get_object(config, "get_vod_info", &[("vod_id", vod_id.to_string())])
            .await
    }

    async fn get_series_info(&self, config: &ApiConfig, series_id: i64) -> Result<XtreamSeriesInfo, XtreamError> {
        self.get_object(config, "get_series_info", &[("series_id", series_id.to_string())])
            .await
    }
}

/// Xtream API Error types
#[derive(Debug, Clone, Error, PartialEq)]
pub enum XtreamError {
    /// Base URL, username or password missing; no request was made
    #[error("no api config")]
    IncompleteConfig,
    /// Base URL could not be turned into a request URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// Network/connection error
    #[error("Network error: {0}")]
    Network(String),
    /// HTTP error (non-2xx status)
    #[error("HTTP error: {0}")]
    Http(u16),
    /// JSON parsing error
    #[error("Parse error: {0}")]
    Parse(String),
    /// Empty response from server
    #[error("Empty response")]
    EmptyResponse,
    /// Panel refused the credentials or the account is unusable
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}
