//! App/auth slice: lifecycle status, the active API config and account info.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::SyncError;
use crate::models::{ApiConfig, AppStatus};
use crate::services::xtream::XtreamAuthResponse;

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub status: AppStatus,
    pub api_config: Option<ApiConfig>,
    pub account_info: Option<XtreamAuthResponse>,
    pub last_fetched_account_info: Option<DateTime<Utc>>,
    /// Bumped by every reset. Work started under an older generation must
    /// not write back.
    pub generation: u64,
}

/// Shared handle to the session state
#[derive(Clone, Default)]
pub struct Session {
    state: Arc<RwLock<SessionState>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn status(&self) -> AppStatus {
        self.state.read().await.status
    }

    pub async fn set_status(&self, status: AppStatus) {
        transition(&mut *self.state.write().await, status);
    }

    /// Set the status unless a reset happened since `generation`
    pub async fn set_status_if_current(&self, generation: u64, status: AppStatus) -> bool {
        let mut state = self.state.write().await;
        if state.generation != generation {
            return false;
        }
        transition(&mut state, status);
        true
    }

    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    pub async fn is_current(&self, generation: u64) -> bool {
        self.state.read().await.generation == generation
    }

    pub async fn api_config(&self) -> Option<ApiConfig> {
        self.state.read().await.api_config.clone()
    }

    /// The active config, or `NoApiConfig` when absent or incomplete
    pub async fn require_api_config(&self) -> Result<ApiConfig, SyncError> {
        self.credentials().await.map(|(config, _)| config)
    }

    /// The active config together with the generation it belongs to
    pub async fn credentials(&self) -> Result<(ApiConfig, u64), SyncError> {
        let state = self.state.read().await;
        match state.api_config.as_ref() {
            Some(config) if config.is_complete() => Ok((config.clone(), state.generation)),
            _ => Err(SyncError::NoApiConfig),
        }
    }

    /// Replace the config wholesale; the caller persists it
    pub async fn set_api_config(&self, config: ApiConfig) {
        self.state.write().await.api_config = Some(config);
    }

    pub async fn account_info(&self) -> Option<XtreamAuthResponse> {
        self.state.read().await.account_info.clone()
    }

    pub async fn set_account_info(&self, info: XtreamAuthResponse) {
        let mut state = self.state.write().await;
        state.account_info = Some(info);
        state.last_fetched_account_info = Some(Utc::now());
    }

    /// Store refreshed account info unless a reset happened since `generation`
    pub async fn set_account_info_if_current(&self, generation: u64, info: XtreamAuthResponse) -> bool {
        let mut state = self.state.write().await;
        if state.generation != generation {
            return false;
        }
        state.account_info = Some(info);
        state.last_fetched_account_info = Some(Utc::now());
        true
    }

    /// Install a validated login unless a reset happened since `generation`.
    ///
    /// `commit` runs under the session lock, so a concurrent reset is
    /// ordered entirely before or after it.
    pub async fn activate<F>(&self, generation: u64, config: ApiConfig, account: XtreamAuthResponse, commit: F) -> bool
    where
        F: FnOnce(&ApiConfig),
    {
        let mut state = self.state.write().await;
        if state.generation != generation {
            return false;
        }
        commit(&config);
        state.api_config = Some(config);
        state.account_info = Some(account);
        state.last_fetched_account_info = Some(Utc::now());
        true
    }

    pub async fn last_fetched_account_info(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.last_fetched_account_info
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Drop credentials and account data and require a new login.
    /// Anything still in flight from the old session is invalidated.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        state.api_config = None;
        state.account_info = None;
        state.last_fetched_account_info = None;
        state.generation += 1;
        transition(&mut state, AppStatus::NeedsAuth);
    }

    /// Streaming base URL advertised by the panel, see [`preferred_base_url`]
    pub async fn preferred_base_url(&self) -> Option<String> {
        let state = self.state.read().await;
        preferred_base_url(state.api_config.as_ref()?, state.account_info.as_ref()?)
    }
}

fn transition(state: &mut SessionState, status: AppStatus) {
    if state.status != status {
        tracing::info!("App status: {} -> {}", state.status, status);
        state.status = status;
    }
}

/// Derive the base URL to stream from using the panel's `server_info`.
///
/// Uses the https port when either the configured base URL or the panel's
/// protocol is https, the plain port otherwise.
pub fn preferred_base_url(config: &ApiConfig, account: &XtreamAuthResponse) -> Option<String> {
    let server = account.server_info.as_ref()?;
    let host = server.url.as_deref().filter(|u| !u.is_empty())?;

    let panel_https = server
        .server_protocol
        .as_deref()
        .map(|p| p.eq_ignore_ascii_case("https"))
        .unwrap_or(false);
    let https = config.is_https() || panel_https;

    let scheme = if https {
        "https"
    } else {
        server.server_protocol.as_deref().unwrap_or("http")
    };
    let port = if https {
        server.https_port.as_deref()
    } else {
        server.port.as_deref()
    };

    Some(match port.filter(|p| !p.is_empty()) {
        Some(port) => format!("{}://{}:{}", scheme, host, port),
        None => format!("{}://{}", scheme, host),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::xtream::XtreamServerInfo;

    fn account(protocol: &str) -> XtreamAuthResponse {
        XtreamAuthResponse {
            server_info: Some(XtreamServerInfo {
                url: Some("panel.tv".to_string()),
                port: Some("8080".to_string()),
                https_port: Some("8443".to_string()),
                server_protocol: Some(protocol.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_preferred_base_url_plain() {
        let config = ApiConfig::new("http://panel.tv:8080", "u", "p");
        assert_eq!(
            preferred_base_url(&config, &account("http")).as_deref(),
            Some("http://panel.tv:8080")
        );
    }

    #[test]
    fn test_preferred_base_url_https() {
        let config = ApiConfig::new("https://panel.tv", "u", "p");
        assert_eq!(
            preferred_base_url(&config, &account("http")).as_deref(),
            Some("https://panel.tv:8443")
        );

        let config = ApiConfig::new("http://panel.tv", "u", "p");
        assert_eq!(
            preferred_base_url(&config, &account("https")).as_deref(),
            Some("https://panel.tv:8443")
        );
    }

    #[test]
    fn test_preferred_base_url_requires_server_info() {
        let config = ApiConfig::new("http://panel.tv", "u", "p");
        assert_eq!(preferred_base_url(&config, &XtreamAuthResponse::default()), None);
    }

    #[tokio::test]
    async fn test_require_api_config() {
        let session = Session::new();
        assert_eq!(session.require_api_config().await, Err(SyncError::NoApiConfig));

        session.set_api_config(ApiConfig::new("http://panel", "", "p")).await;
        assert_eq!(session.require_api_config().await, Err(SyncError::NoApiConfig));

        let config = ApiConfig::new("http://panel", "u", "p");
        session.set_api_config(config.clone()).await;
        assert_eq!(session.require_api_config().await, Ok(config));
    }

    #[tokio::test]
    async fn test_reset_forces_needs_auth() {
        let session = Session::new();
        session.set_api_config(ApiConfig::new("http://panel", "u", "p")).await;
        session.set_account_info(XtreamAuthResponse::default()).await;
        session.set_status(AppStatus::Ready).await;

        session.reset().await;

        let state = session.snapshot().await;
        assert_eq!(state.status, AppStatus::NeedsAuth);
        assert!(state.api_config.is_none());
        assert!(state.account_info.is_none());
        assert!(state.last_fetched_account_info.is_none());
    }

    #[tokio::test]
    async fn test_reset_invalidates_older_generation() {
        let session = Session::new();
        let config = ApiConfig::new("http://panel", "u", "p");
        let generation = session.generation().await;

        assert!(session.activate(generation, config.clone(), XtreamAuthResponse::default(), |_| {}).await);
        assert_eq!(session.credentials().await, Ok((config.clone(), generation)));

        session.reset().await;
        assert!(!session.is_current(generation).await);
        assert!(!session.set_status_if_current(generation, AppStatus::Ready).await);
        assert!(!session.set_account_info_if_current(generation, XtreamAuthResponse::default()).await);

        let mut committed = false;
        assert!(!session.activate(generation, config, XtreamAuthResponse::default(), |_| committed = true).await);
        assert!(!committed);

        let state = session.snapshot().await;
        assert_eq!(state.status, AppStatus::NeedsAuth);
        assert!(state.api_config.is_none());
        assert!(state.account_info.is_none());
    }
}
