//! Application context: owns the slices and drives the session lifecycle.
//!
//! ```text
//! needsLoad ──bootstrap──▶ needsAuth ──login──▶ ready
//!                 └───────────────────────────────▲
//! ready ──sign_out──▶ needsAuth
//! ```

use std::sync::Arc;

use crate::config::Config;
use crate::error::{LoginError, SyncError};
use crate::models::{ApiConfig, AppStatus, MediaKind};
use crate::services::store::{FileStore, KeyValueStore, PersistentStore, StorageKey};
use crate::services::xtream::{ApiClient, XtreamAuthResponse, XtreamClient, XtreamError};
use crate::slices::session::SessionState;
use crate::slices::{CatalogDomain, CatalogSlice, LiveSlice, MediaList, SeriesSlice, Session, VodSlice};

/// One unit of work in a refresh fan-out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTask {
    Categories(MediaKind),
    Streams(MediaKind),
    Watchlist,
    Favorites,
}

impl std::fmt::Display for RefreshTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshTask::Categories(kind) => write!(f, "{} categories", kind),
            RefreshTask::Streams(kind) => write!(f, "{} streams", kind),
            RefreshTask::Watchlist => f.write_str("watchlist"),
            RefreshTask::Favorites => f.write_str("favorites"),
        }
    }
}

/// Outcome of every task in a fan-out. One failure never cancels the others.
#[derive(Debug, Clone, Default)]
pub struct RefreshReport {
    pub completed: Vec<RefreshTask>,
    pub failures: Vec<(RefreshTask, SyncError)>,
}

impl RefreshReport {
    fn record(&mut self, task: RefreshTask, outcome: Result<(), SyncError>) {
        match outcome {
            Ok(()) => self.completed.push(task),
            Err(e) => self.failures.push((task, e)),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed(&self, task: RefreshTask) -> bool {
        self.failures.iter().any(|(t, _)| *t == task)
    }
}

type Outcomes = Vec<(RefreshTask, Result<(), SyncError>)>;

/// Load one domain from the store, then refresh its categories and streams
/// concurrently. The cache load always completes first so stale data can
/// never overwrite a fresh response.
async fn sync_domain<D: CatalogDomain>(slice: &CatalogSlice<D>, load_cache: bool, refresh: bool) -> Outcomes {
    if load_cache {
        slice.load_from_cache().await;
    }
    if !refresh {
        return Vec::new();
    }

    let (categories, streams) = tokio::join!(slice.refresh_categories(), slice.refresh_streams());
    vec![
        (RefreshTask::Categories(D::KIND), categories.map(|_| ())),
        (RefreshTask::Streams(D::KIND), streams.map(|_| ())),
    ]
}

/// Everything the client needs, wired once at startup
#[derive(Clone)]
pub struct AppContext {
    config: Config,
    api: Arc<dyn ApiClient>,
    store: PersistentStore,
    pub session: Session,
    pub live: LiveSlice,
    pub vod: VodSlice,
    pub series: SeriesSlice,
    pub watchlist: MediaList,
}

impl AppContext {
    /// Wire the slices over the given API client and storage backend.
    /// Must be called inside a tokio runtime.
    pub fn new(config: Config, api: Arc<dyn ApiClient>, backend: Arc<dyn KeyValueStore>) -> Self {
        let store = PersistentStore::new(backend);
        let session = Session::new();

        Self {
            live: LiveSlice::new(api.clone(), store.clone(), session.clone()),
            vod: CatalogSlice::new(api.clone(), store.clone(), session.clone()),
            series: CatalogSlice::new(api.clone(), store.clone(), session.clone()),
            watchlist: MediaList::watchlist(store.clone()),
            config,
            api,
            store,
            session,
        }
    }

    /// Production wiring: file-backed store and the HTTP client
    pub async fn open(config: Config) -> anyhow::Result<Self> {
        let backend = FileStore::new(&config.store_dir).await?;
        tracing::info!("Using store directory: {}", backend.dir().display());

        let api = XtreamClient::new(&config)?;
        Ok(Self::new(config, Arc::new(api), Arc::new(backend)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &PersistentStore {
        &self.store
    }

    pub async fn status(&self) -> AppStatus {
        self.session.status().await
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Restore a persisted session.
    ///
    /// Only acts from `needsLoad`. Without a complete stored config, or when
    /// the panel rejects it, the app moves to `needsAuth`. Otherwise the
    /// catalog fan-out runs and the app becomes `ready` once every task has
    /// settled, whatever their outcomes (see `strict_bootstrap`). A sign out
    /// while this runs wins: nothing restored here is kept.
    pub async fn bootstrap(&self) -> AppStatus {
        let SessionState { status, generation, .. } = self.session.snapshot().await;
        if status != AppStatus::NeedsLoad {
            tracing::debug!("Bootstrap skipped, app is {}", status);
            return status;
        }

        let Some(config) = self.store.load::<ApiConfig>(StorageKey::ApiConfig).await else {
            tracing::info!("No stored login, authentication required");
            self.session.set_status(AppStatus::NeedsAuth).await;
            return AppStatus::NeedsAuth;
        };

        if !config.is_complete() {
            tracing::warn!("Stored login is incomplete, authentication required");
            self.session.set_status(AppStatus::NeedsAuth).await;
            return AppStatus::NeedsAuth;
        }

        let account = match self.validate(&config).await {
            Ok(account) => account,
            Err(e) => {
                tracing::warn!("Stored login rejected: {}", e);
                self.session.set_status(AppStatus::NeedsAuth).await;
                return AppStatus::NeedsAuth;
            }
        };

        if !self.session.activate(generation, config, account, |_| {}).await {
            return self.abandon("Bootstrap").await;
        }

        let report = self.restore_catalog(self.config.refresh_on_startup).await;
        log_report("Bootstrap", &report);

        let status = if self.config.strict_bootstrap && !report.is_success() {
            AppStatus::NeedsAuth
        } else {
            AppStatus::Ready
        };
        if !self.session.set_status_if_current(generation, status).await {
            return self.abandon("Bootstrap").await;
        }
        status
    }

    /// Validate and store new credentials, then load the catalog.
    ///
    /// Input errors are reported before any request. A rejected login leaves
    /// the status untouched. A sign out while this runs wins.
    pub async fn login(&self, base_url: &str, username: &str, password: &str) -> Result<RefreshReport, LoginError> {
        if !base_url.to_ascii_lowercase().starts_with("http") {
            return Err(LoginError::InvalidUrl);
        }
        if username.is_empty() {
            return Err(LoginError::MissingUsername);
        }
        if password.is_empty() {
            return Err(LoginError::MissingPassword);
        }

        let generation = self.session.generation().await;
        let config = ApiConfig::new(base_url, username, password);
        let account = self.validate(&config).await.map_err(|e| {
            tracing::warn!("Login to {} rejected: {}", config.server(), e);
            LoginError::Rejected(e)
        })?;

        tracing::info!("Logged in to {} as {}", config.server(), username);
        let store = &self.store;
        let persist = |config: &ApiConfig| store.persist(StorageKey::ApiConfig, config);
        if !self.session.activate(generation, config, account, persist).await {
            self.abandon("Login").await;
            return Err(LoginError::SignedOut);
        }

        let report = self.restore_catalog(true).await;
        log_report("Login", &report);

        if !self.session.set_status_if_current(generation, AppStatus::Ready).await {
            self.abandon("Login").await;
            return Err(LoginError::SignedOut);
        }
        Ok(report)
    }

    /// Require a new login, then wipe every slice and the store.
    ///
    /// The session reset comes first so in-flight work sees it. Clearing
    /// the slices waits out any refresh holding a slice lock, and the store
    /// is cleared last so it runs after whatever that refresh queued.
    pub async fn sign_out(&self) {
        self.session.reset().await;
        self.clear_slices().await;

        if let Err(e) = self.store.clear().await {
            tracing::error!("Failed to clear storage on sign out: {}", e);
        }
        tracing::info!("Signed out");
    }

    async fn clear_slices(&self) {
        tokio::join!(
            self.live.clear(),
            self.vod.clear(),
            self.series.clear(),
            self.watchlist.clear()
        );
    }

    /// Drop what an operation overtaken by a sign out put in memory
    async fn abandon(&self, what: &str) -> AppStatus {
        tracing::info!("{} interrupted by sign out, discarding its results", what);
        self.clear_slices().await;
        self.session.status().await
    }

    // ========================================================================
    // Sync
    // ========================================================================

    /// Re-fetch categories and streams for all three domains
    pub async fn refresh_playlist(&self) -> RefreshReport {
        let report = self.fan_out(false, true).await;
        log_report("Playlist refresh", &report);
        report
    }

    /// Re-fetch account and server info for the active session
    pub async fn refresh_account_info(&self) -> Result<XtreamAuthResponse, SyncError> {
        let (config, generation) = self.session.credentials().await?;
        let account = self.api.get_account_info(&config).await.map_err(|e| {
            tracing::warn!("Failed to refresh account info: {}", e);
            e
        })?;
        if !self.session.set_account_info_if_current(generation, account.clone()).await {
            return Err(SyncError::SignedOut);
        }
        Ok(account)
    }

    /// Streaming base URL advertised by the panel for the active session
    pub async fn preferred_base_url(&self) -> Option<String> {
        self.session.preferred_base_url().await
    }

    async fn validate(&self, config: &ApiConfig) -> Result<XtreamAuthResponse, XtreamError> {
        let account = self.api.get_account_info(config).await?;
        if let Some(exp) = account.user_info.exp_timestamp() {
            tracing::debug!("Account expires at {}", exp);
        }
        Ok(account)
    }

    /// Local watchlist and favorites plus every catalog cache, optionally
    /// followed by a network refresh
    async fn restore_catalog(&self, refresh: bool) -> RefreshReport {
        self.fan_out(true, refresh).await
    }

    async fn fan_out(&self, load_cache: bool, refresh: bool) -> RefreshReport {
        let lists = async {
            if !load_cache {
                return Outcomes::new();
            }
            tokio::join!(self.watchlist.load_from_cache(), self.live.load_favorites());
            vec![(RefreshTask::Watchlist, Ok(())), (RefreshTask::Favorites, Ok(()))]
        };

        let (lists, live, vod, series) = tokio::join!(
            lists,
            sync_domain(self.live.catalog(), load_cache, refresh),
            sync_domain(&self.vod, load_cache, refresh),
            sync_domain(&self.series, load_cache, refresh),
        );

        let mut report = RefreshReport::default();
        for (task, outcome) in lists.into_iter().chain(live).chain(vod).chain(series) {
            report.record(task, outcome);
        }
        report
    }
}

fn log_report(what: &str, report: &RefreshReport) {
    for (task, error) in &report.failures {
        tracing::warn!("{}: {} failed: {}", what, task, error);
    }
    tracing::info!(
        "{} finished: {} tasks completed, {} failed",
        what,
        report.completed.len(),
        report.failures.len()
    );
}
