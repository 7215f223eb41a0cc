//! Catalog slices for the live, VOD and series domains.
//!
//! The three domains share one implementation, [`CatalogSlice`], specialized
//! by a [`CatalogDomain`] marker that names the stream type, its storage keys
//! and the API calls that fetch it.

use futures::future::BoxFuture;
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};

use crate::error::SyncError;
use crate::models::{ApiConfig, MediaKind, MediaRef, Stream};
use crate::services::store::{PersistentStore, StorageKey};
use crate::services::xtream::{
    ApiClient, XtreamCategory, XtreamEpgListings, XtreamError, XtreamLiveStream, XtreamSeries,
    XtreamSeriesInfo, XtreamVodInfo, XtreamVodStream,
};
use crate::slices::media_list::MediaList;
use crate::slices::session::Session;

/// Static description of one catalog domain
pub trait CatalogDomain: Send + Sync + 'static {
    type Stream: Serialize + DeserializeOwned + Clone + Into<Stream> + Send + Sync + 'static;

    const KIND: MediaKind;
    const CATEGORIES_KEY: StorageKey;
    const STREAMS_KEY: StorageKey;

    fn stream_id(stream: &Self::Stream) -> i64;
    fn category_of(stream: &Self::Stream) -> Option<&str>;

    fn fetch_categories<'a>(
        api: &'a dyn ApiClient,
        config: &'a ApiConfig,
    ) -> BoxFuture<'a, Result<Vec<XtreamCategory>, XtreamError>>;

    fn fetch_streams<'a>(
        api: &'a dyn ApiClient,
        config: &'a ApiConfig,
    ) -> BoxFuture<'a, Result<Vec<Self::Stream>, XtreamError>>;
}

pub struct Live;
pub struct Vod;
pub struct Series;

impl CatalogDomain for Live {
    type Stream = XtreamLiveStream;

    const KIND: MediaKind = MediaKind::Live;
    const CATEGORIES_KEY: StorageKey = StorageKey::LiveCategories;
    const STREAMS_KEY: StorageKey = StorageKey::LiveStreams;

    fn stream_id(stream: &Self::Stream) -> i64 {
        stream.stream_id
    }

    fn category_of(stream: &Self::Stream) -> Option<&str> {
        stream.category_id.as_deref()
    }

    fn fetch_categories<'a>(
        api: &'a dyn ApiClient,
        config: &'a ApiConfig,
    ) -> BoxFuture<'a, Result<Vec<XtreamCategory>, XtreamError>> {
        Box::pin(async move { api.get_live_categories(config).await })
    }

    fn fetch_streams<'a>(
        api: &'a dyn ApiClient,
        config: &'a ApiConfig,
    ) -> BoxFuture<'a, Result<Vec<Self::Stream>, XtreamError>> {
        Box::pin(async move { api.get_live_streams(config).await })
    }
}

impl CatalogDomain for Vod {
    type Stream = XtreamVodStream;

    const KIND: MediaKind = MediaKind::Vod;
    const CATEGORIES_KEY: StorageKey = StorageKey::VodCategories;
    const STREAMS_KEY: StorageKey = StorageKey::VodStreams;

    fn stream_id(stream: &Self::Stream) -> i64 {
        stream.stream_id
    }

    fn category_of(stream: &Self::Stream) -> Option<&str> {
        stream.category_id.as_deref()
    }

    fn fetch_categories<'a>(
        api: &'a dyn ApiClient,
        config: &'a ApiConfig,
    ) -> BoxFuture<'a, Result<Vec<XtreamCategory>, XtreamError>> {
        Box::pin(async move { api.get_vod_categories(config).await })
    }

    fn fetch_streams<'a>(
        api: &'a dyn ApiClient,
        config: &'a ApiConfig,
    ) -> BoxFuture<'a, Result<Vec<Self::Stream>, XtreamError>> {
        Box::pin(async move { api.get_vod_streams(config).await })
    }
}

impl CatalogDomain for Series {
    type Stream = XtreamSeries;

    const KIND: MediaKind = MediaKind::Series;
    const CATEGORIES_KEY: StorageKey = StorageKey::SeriesCategories;
    const STREAMS_KEY: StorageKey = StorageKey::SeriesStreams;

    fn stream_id(stream: &Self::Stream) -> i64 {
        stream.series_id
    }

    fn category_of(stream: &Self::Stream) -> Option<&str> {
        stream.category_id.as_deref()
    }

    fn fetch_categories<'a>(
        api: &'a dyn ApiClient,
        config: &'a ApiConfig,
    ) -> BoxFuture<'a, Result<Vec<XtreamCategory>, XtreamError>> {
        Box::pin(async move { api.get_series_categories(config).await })
    }

    fn fetch_streams<'a>(
        api: &'a dyn ApiClient,
        config: &'a ApiConfig,
    ) -> BoxFuture<'a, Result<Vec<Self::Stream>, XtreamError>> {
        Box::pin(async move { api.get_series_streams(config).await })
    }
}

pub struct CatalogState<S> {
    pub categories: Vec<XtreamCategory>,
    pub streams: Vec<S>,
}

impl<S> Default for CatalogState<S> {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            streams: Vec::new(),
        }
    }
}

/// Categories and streams of one domain, backed by the persistent store.
///
/// A failed refresh leaves the previous data in place.
pub struct CatalogSlice<D: CatalogDomain> {
    state: Arc<RwLock<CatalogState<D::Stream>>>,
    api: Arc<dyn ApiClient>,
    store: PersistentStore,
    session: Session,
    _domain: PhantomData<fn() -> D>,
}

impl<D: CatalogDomain> Clone for CatalogSlice<D> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            api: self.api.clone(),
            store: self.store.clone(),
            session: self.session.clone(),
            _domain: PhantomData,
        }
    }
}

impl<D: CatalogDomain> CatalogSlice<D> {
    pub fn new(
        api: Arc<dyn ApiClient>,
        store: PersistentStore,
        session: Session,
    ) -> Self {
        Self {
            state: Arc::new(RwLock::new(CatalogState::default())),
            api,
            store,
            session,
            _domain: PhantomData,
        }
    }

    pub fn kind(&self) -> MediaKind {
        D::KIND
    }

    /// Replace in-memory categories and streams with the persisted ones
    pub async fn load_from_cache(&self) {
        let categories: Vec<XtreamCategory> =
            self.store.load(D::CATEGORIES_KEY).await.unwrap_or_default();
        let streams: Vec<D::Stream> = self.store.load(D::STREAMS_KEY).await.unwrap_or_default();

        tracing::info!(
            "Loaded {} cache: {} categories, {} streams",
            D::KIND,
            categories.len(),
            streams.len()
        );

        let mut state = self.state.write().await;
        state.categories = categories;
        state.streams = streams;
    }

    /// Fetch categories, then store them in memory and on disk.
    ///
    /// The session check and the store write both happen under the state
    /// lock, so a sign out clearing this slice always lands after them.
    pub async fn refresh_categories(&self) -> Result<usize, SyncError> {
        let (config, generation) = self.session.credentials().await?;
        let categories = D::fetch_categories(self.api.as_ref(), &config)
            .await
            .map_err(|e| {
                tracing::warn!("Failed to refresh {} categories: {}", D::KIND, e);
                e
            })?;

        let mut state = self.state.write().await;
        if !self.session.is_current(generation).await {
            tracing::info!("Dropping {} categories fetched before sign out", D::KIND);
            return Err(SyncError::SignedOut);
        }
        state.categories = categories;
        self.store.persist(D::CATEGORIES_KEY, &state.categories);

        tracing::info!("Refreshed {} {} categories", state.categories.len(), D::KIND);
        Ok(state.categories.len())
    }

    /// Fetch streams, then store them in memory and on disk
    pub async fn refresh_streams(&self) -> Result<usize, SyncError> {
        let (config, generation) = self.session.credentials().await?;
        let streams = D::fetch_streams(self.api.as_ref(), &config)
            .await
            .map_err(|e| {
                tracing::warn!("Failed to refresh {} streams: {}", D::KIND, e);
                e
            })?;

        let mut state = self.state.write().await;
        if !self.session.is_current(generation).await {
            tracing::info!("Dropping {} streams fetched before sign out", D::KIND);
            return Err(SyncError::SignedOut);
        }
        state.streams = streams;
        self.store.persist(D::STREAMS_KEY, &state.streams);

        tracing::info!("Refreshed {} {} streams", state.streams.len(), D::KIND);
        Ok(state.streams.len())
    }

    /// Borrow the current state without cloning it
    pub async fn read(&self) -> RwLockReadGuard<'_, CatalogState<D::Stream>> {
        self.state.read().await
    }

    pub async fn categories(&self) -> Vec<XtreamCategory> {
        self.state.read().await.categories.clone()
    }

    pub async fn streams(&self) -> Vec<D::Stream> {
        self.state.read().await.streams.clone()
    }

    pub async fn stream(&self, id: i64) -> Option<D::Stream> {
        self.state
            .read()
            .await
            .streams
            .iter()
            .find(|s| D::stream_id(s) == id)
            .cloned()
    }

    pub async fn category_streams(&self, category_id: &str) -> Vec<D::Stream> {
        self.state
            .read()
            .await
            .streams
            .iter()
            .filter(|s| D::category_of(s) == Some(category_id))
            .cloned()
            .collect()
    }

    /// Streams tagged with this slice's domain
    pub async fn tagged_streams(&self) -> Vec<Stream> {
        self.streams().await.into_iter().map(Into::into).collect()
    }

    pub async fn clear(&self) {
        *self.state.write().await = CatalogState::default();
    }
}

pub type VodSlice = CatalogSlice<Vod>;
pub type SeriesSlice = CatalogSlice<Series>;

impl CatalogSlice<Vod> {
    pub async fn fetch_info(&self, vod_id: i64) -> Result<XtreamVodInfo, SyncError> {
        let config = self.session.require_api_config().await?;
        Ok(self.api.get_vod_info(&config, vod_id).await?)
    }
}

impl CatalogSlice<Series> {
    pub async fn fetch_info(&self, series_id: i64) -> Result<XtreamSeriesInfo, SyncError> {
        let config = self.session.require_api_config().await?;
        Ok(self.api.get_series_info(&config, series_id).await?)
    }
}

/// Live catalog plus the favorite channels
#[derive(Clone)]
pub struct LiveSlice {
    catalog: CatalogSlice<Live>,
    favorites: MediaList,
}

impl std::ops::Deref for LiveSlice {
    type Target = CatalogSlice<Live>;

    fn deref(&self) -> &Self::Target {
        &self.catalog
    }
}

impl LiveSlice {
    pub fn new(
        api: Arc<dyn ApiClient>,
        store: PersistentStore,
        session: Session,
    ) -> Self {
        Self {
            favorites: MediaList::favorites(store.clone()),
            catalog: CatalogSlice::new(api, store, session),
        }
    }

    pub fn catalog(&self) -> &CatalogSlice<Live> {
        &self.catalog
    }

    pub async fn fetch_short_epg(&self, channel_id: i64, limit: u32) -> Result<XtreamEpgListings, SyncError> {
        let config = self.session.require_api_config().await?;
        Ok(self.api.get_short_epg(&config, channel_id, limit).await?)
    }

    pub async fn load_favorites(&self) -> usize {
        self.favorites.load_from_cache().await
    }

    pub async fn add_favorite(&self, channel_id: i64) -> bool {
        self.favorites.add(MediaRef::live(channel_id)).await
    }

    pub async fn remove_favorite(&self, channel_id: i64) -> bool {
        self.favorites.remove(MediaRef::live(channel_id)).await
    }

    pub async fn toggle_favorite(&self, channel_id: i64) -> bool {
        self.favorites.toggle(MediaRef::live(channel_id)).await
    }

    pub async fn is_favorite(&self, channel_id: i64) -> bool {
        self.favorites.contains(MediaRef::live(channel_id)).await
    }

    pub async fn favorites(&self) -> Vec<MediaRef> {
        self.favorites.items().await
    }

    /// Clear the catalog and favorites in memory
    pub async fn clear(&self) {
        self.catalog.clear().await;
        self.favorites.clear().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store::{KeyValueStore, MemoryStore};
    use crate::test_support::{self, FakeApi};

    async fn setup(api: FakeApi) -> (Arc<FakeApi>, Arc<MemoryStore>, PersistentStore, Session) {
        let api = Arc::new(api);
        let backend = Arc::new(MemoryStore::new());
        let store = PersistentStore::new(backend.clone());
        let session = Session::new();
        session
            .set_api_config(ApiConfig::new("http://panel.tv", "user", "pass"))
            .await;
        (api, backend, store, session)
    }

    #[tokio::test]
    async fn test_refresh_updates_memory_and_store() {
        let (api, backend, store, session) = setup(FakeApi::new()).await;
        let vod: VodSlice = CatalogSlice::new(api.clone(), store.clone(), session);

        assert_eq!(vod.refresh_categories().await, Ok(1));
        assert_eq!(vod.refresh_streams().await, Ok(1));

        assert_eq!(vod.categories().await[0].category_name, "Action");
        assert_eq!(vod.stream(200).await.map(|s| s.name), Some("Die Hard".to_string()));

        store.flush().await;
        assert!(backend.get(StorageKey::VodStreams).await.unwrap().is_some());
        assert!(backend.get(StorageKey::VodCategories).await.unwrap().is_some());
        assert_eq!(api.calls_to("get_vod_streams"), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_data() {
        let (api, _, store, session) = setup(FakeApi::new().failing("get_series")).await;
        let series: SeriesSlice = CatalogSlice::new(api.clone(), store.clone(), session);

        store.persist(
            StorageKey::SeriesStreams,
            &vec![test_support::series(1, "Cached", "20")],
        );
        series.load_from_cache().await;

        let result = series.refresh_streams().await;
        assert_eq!(result, Err(SyncError::Api(XtreamError::Http(500))));
        assert_eq!(series.streams().await.len(), 1);
        assert_eq!(series.streams().await[0].name, "Cached");
    }

    #[tokio::test]
    async fn test_refresh_without_config_makes_no_request() {
        let api = Arc::new(FakeApi::new());
        let store = PersistentStore::new(Arc::new(MemoryStore::new()));
        let live = LiveSlice::new(api.clone(), store, Session::new());

        assert_eq!(live.refresh_streams().await, Err(SyncError::NoApiConfig));
        assert_eq!(live.fetch_short_epg(1, 5).await.unwrap_err(), SyncError::NoApiConfig);
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn test_load_from_cache_missing_is_empty() {
        let (api, _, store, session) = setup(FakeApi::new()).await;
        let live = LiveSlice::new(api, store, session);

        live.load_from_cache().await;
        assert!(live.categories().await.is_empty());
        assert!(live.streams().await.is_empty());
    }

    #[tokio::test]
    async fn test_category_streams_and_tags() {
        let (api, _, store, session) = setup(FakeApi::new()).await;
        let live = LiveSlice::new(api, store, session);
        live.refresh_streams().await.unwrap();

        let sports = live.category_streams("2").await;
        assert_eq!(sports.len(), 1);
        assert_eq!(sports[0].name, "ESPN");

        let tagged = live.tagged_streams().await;
        assert!(tagged.iter().all(|s| s.kind() == MediaKind::Live));
    }

    #[tokio::test]
    async fn test_favorites_persist_as_live_refs() {
        let (api, backend, store, session) = setup(FakeApi::new()).await;
        let live = LiveSlice::new(api, store.clone(), session);

        assert!(live.add_favorite(100).await);
        assert!(!live.add_favorite(100).await);
        assert!(live.is_favorite(100).await);
        assert!(!live.toggle_favorite(100).await);
        assert!(live.toggle_favorite(101).await);

        store.flush().await;
        assert_eq!(
            backend.get(StorageKey::Favorites).await.unwrap().as_deref(),
            Some(r#"[{"id":101,"type":"live"}]"#)
        );

        live.clear().await;
        assert!(live.favorites().await.is_empty());
        assert_eq!(live.load_favorites().await, 1);
    }

    #[tokio::test]
    async fn test_fetch_info() {
        let (api, _, store, session) = setup(FakeApi::new()).await;
        let vod: VodSlice = CatalogSlice::new(api.clone(), store.clone(), session.clone());
        let series: SeriesSlice = CatalogSlice::new(api.clone(), store, session);

        assert!(vod.fetch_info(200).await.is_ok());
        assert!(series.fetch_info(300).await.is_ok());
        assert_eq!(api.calls_to("get_vod_info"), 1);
        assert_eq!(api.calls_to("get_series_info"), 1);
    }

    #[tokio::test]
    async fn test_refresh_dropped_after_session_reset() {
        let (api, backend, store, session) =
            setup(FakeApi::new().delayed(std::time::Duration::from_millis(100))).await;
        let live = LiveSlice::new(api, store.clone(), session.clone());

        let reset = async {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            session.reset().await;
        };
        let (result, ()) = tokio::join!(live.refresh_streams(), reset);

        assert_eq!(result, Err(SyncError::SignedOut));
        assert!(live.streams().await.is_empty());
        store.flush().await;
        assert_eq!(backend.get(StorageKey::LiveStreams).await.unwrap(), None);
    }
}
