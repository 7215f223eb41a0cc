//! In-process `ApiClient` used by unit tests.

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use crate::models::ApiConfig;
use crate::services::xtream::*;

pub(crate) fn category(id: &str, name: &str) -> XtreamCategory {
    serde_json::from_value(json!({ "category_id": id, "category_name": name })).unwrap()
}

pub(crate) fn live(id: i64, name: &str, category_id: &str) -> XtreamLiveStream {
    serde_json::from_value(json!({
        "stream_id": id,
        "name": name,
        "stream_type": "live",
        "category_id": category_id,
    }))
    .unwrap()
}

pub(crate) fn vod(id: i64, name: &str, category_id: &str, ext: &str) -> XtreamVodStream {
    serde_json::from_value(json!({
        "stream_id": id,
        "name": name,
        "stream_type": "movie",
        "category_id": category_id,
        "container_extension": ext,
    }))
    .unwrap()
}

pub(crate) fn series(id: i64, name: &str, category_id: &str) -> XtreamSeries {
    serde_json::from_value(json!({ "series_id": id, "name": name, "category_id": category_id }))
        .unwrap()
}

pub(crate) struct FakeApi {
    pub live_categories: Vec<XtreamCategory>,
    pub live_streams: Vec<XtreamLiveStream>,
    pub vod_categories: Vec<XtreamCategory>,
    pub vod_streams: Vec<XtreamVodStream>,
    pub series_categories: Vec<XtreamCategory>,
    pub series_streams: Vec<XtreamSeries>,
    pub epg: Vec<XtreamEpgEntry>,
    failing: HashSet<&'static str>,
    delay: Option<Duration>,
    calls: Mutex<Vec<&'static str>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            live_categories: vec![category("1", "News"), category("2", "Sports")],
            live_streams: vec![live(100, "CNN", "1"), live(101, "ESPN", "2")],
            vod_categories: vec![category("10", "Action")],
            vod_streams: vec![vod(200, "Die Hard", "10", "mkv")],
            series_categories: vec![category("20", "Drama")],
            series_streams: vec![series(300, "The Wire", "20")],
            epg: Vec::new(),
            failing: HashSet::new(),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Make `action` fail with HTTP 500
    pub fn failing(mut self, action: &'static str) -> Self {
        self.failing.insert(action);
        self
    }

    /// Hold every category and stream response for `delay`
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, action: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|a| **a == action).count()
    }

    fn record(&self, action: &'static str) -> Result<(), XtreamError> {
        self.calls.lock().unwrap().push(action);
        if self.failing.contains(action) {
            Err(XtreamError::Http(500))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ApiClient for FakeApi {
    async fn get_account_info(&self, _: &ApiConfig) -> Result<XtreamAuthResponse, XtreamError> {
        self.record("get_account_info")?;
        Ok(XtreamAuthResponse::default())
    }

    async fn get_live_categories(&self, _: &ApiConfig) -> Result<Vec<XtreamCategory>, XtreamError> {
        self.record("get_live_categories")?;
        self.pause().await;
        Ok(self.live_categories.clone())
    }

    async fn get_vod_categories(&self, _: &ApiConfig) -> Result<Vec<XtreamCategory>, XtreamError> {
        self.record("get_vod_categories")?;
        self.pause().await;
        Ok(self.vod_categories.clone())
    }

    async fn get_series_categories(&self, _: &ApiConfig) -> Result<Vec<XtreamCategory>, XtreamError> {
        self.record("get_series_categories")?;
        self.pause().await;
        Ok(self.series_categories.clone())
    }

    async fn get_live_streams(&self, _: &ApiConfig) -> Result<Vec<XtreamLiveStream>, XtreamError> {
        self.record("get_live_streams")?;
        self.pause().await;
        Ok(self.live_streams.clone())
    }

    async fn get_vod_streams(&self, _: &ApiConfig) -> Result<Vec<XtreamVodStream>, XtreamError> {
        self.record("get_vod_streams")?;
        self.pause().await;
        Ok(self.vod_streams.clone())
    }

    async fn get_series_streams(&self, _: &ApiConfig) -> Result<Vec<XtreamSeries>, XtreamError> {
        self.record("get_series")?;
        self.pause().await;
        Ok(self.series_streams.clone())
    }

    async fn get_short_epg(
        &self,
        _: &ApiConfig,
        _channel_id: i64,
        limit: u32,
    ) -> Result<XtreamEpgListings, XtreamError> {
        self.record("get_short_epg")?;
        Ok(XtreamEpgListings {
            epg_listings: self.epg.iter().take(limit as usize).cloned().collect(),
        })
    }

    async fn get_vod_info(&self, _: &ApiConfig, _vod_id: i64) -> Result<XtreamVodInfo, XtreamError> {
        self.record("get_vod_info")?;
        Ok(XtreamVodInfo::default())
    }

    async fn get_series_info(&self, _: &ApiConfig, _series_id: i64) -> Result<XtreamSeriesInfo, XtreamError> {
        self.record("get_series_info")?;
        Ok(XtreamSeriesInfo::default())
    }
}
