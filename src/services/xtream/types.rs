//! Xtream Codes API Types
//!
//! Type definitions for Xtream Codes Player API v2 responses. Panels are
//! inconsistent about numbers vs numeric strings, so most scalar fields go
//! through the lenient deserializers at the bottom of this file.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// ============================================================================
// Authentication Response Types
// ============================================================================

/// Response from player_api.php with no action (account info)
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct XtreamAuthResponse {
    #[serde(default)]
    pub user_info: XtreamUserInfo,
    #[serde(default)]
    pub server_info: Option<XtreamServerInfo>,
}

/// User account information
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct XtreamUserInfo {
    #[serde(default, deserialize_with = "de_opt_string")]
    pub username: Option<String>,
    #[serde(default, skip_serializing, deserialize_with = "de_opt_string")]
    pub password: Option<String>,
    /// 0 when the panel rejected the credentials
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub auth: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub exp_date: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub is_trial: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub active_cons: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub max_connections: Option<String>,
    #[serde(default)]
    pub allowed_output_formats: Option<Vec<String>>,
}

impl XtreamUserInfo {
    /// Accounts without a status field are treated as active
    pub fn is_active(&self) -> bool {
        self.status
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("active"))
            .unwrap_or(true)
    }

    pub fn is_rejected(&self) -> bool {
        self.auth == Some(0)
    }

    /// Parse expiration to Unix timestamp
    pub fn exp_timestamp(&self) -> Option<i64> {
        self.exp_date.as_ref()?.parse().ok()
    }

    pub fn is_trial_account(&self) -> bool {
        self.is_trial.as_deref() == Some("1")
    }
}

/// Server information
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct XtreamServerInfo {
    #[serde(default, deserialize_with = "de_opt_string")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub port: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub https_port: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub server_protocol: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub timezone: Option<String>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub timestamp_now: Option<i64>,
}

// ============================================================================
// Category Types
// ============================================================================

/// Category for live, VOD, or series
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct XtreamCategory {
    #[serde(deserialize_with = "de_string")]
    pub category_id: String,
    #[serde(default, deserialize_with = "de_string")]
    pub category_name: String,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub parent_id: Option<i64>,
}

// ============================================================================
// Live Stream Types
// ============================================================================

/// Live stream (channel) information
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct XtreamLiveStream {
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub num: Option<i64>,
    #[serde(default, deserialize_with = "de_string")]
    pub name: String,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub stream_type: Option<String>,
    #[serde(deserialize_with = "de_i64")]
    pub stream_id: i64,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub stream_icon: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub epg_channel_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub added: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub category_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub tv_archive: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub tv_archive_duration: Option<i64>,
}

// ============================================================================
// VOD Types
// ============================================================================

/// VOD (movie) stream information
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct XtreamVodStream {
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub num: Option<i64>,
    #[serde(default, deserialize_with = "de_string")]
    pub name: String,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub stream_type: Option<String>,
    #[serde(deserialize_with = "de_i64")]
    pub stream_id: i64,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub stream_icon: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub rating: Option<String>,
    #[serde(default, deserialize_with = "de_opt_f32")]
    pub rating_5based: Option<f32>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub added: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub category_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub container_extension: Option<String>,
}

/// Detailed VOD information (from get_vod_info)
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct XtreamVodInfo {
    #[serde(default)]
    pub info: XtreamVodDetails,
    #[serde(default)]
    pub movie_data: Option<XtreamVodStream>,
}

/// VOD metadata details
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct XtreamVodDetails {
    #[serde(default, deserialize_with = "de_opt_string")]
    pub tmdb_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub name: Option<String>,
    #[serde(default, rename = "o_name", deserialize_with = "de_opt_string")]
    pub original_name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub cover_big: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub movie_image: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub releasedate: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub youtube_trailer: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub director: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub actors: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub cast: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub plot: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub genre: Option<String>,
    #[serde(default, deserialize_with = "de_string_list")]
    pub backdrop_path: Option<Vec<String>>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub duration_secs: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub rating: Option<String>,
}

// ============================================================================
// Series Types
// ============================================================================

/// Series information from get_series
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct XtreamSeries {
    #[serde(deserialize_with = "de_i64")]
    pub series_id: i64,
    #[serde(default, deserialize_with = "de_string")]
    pub name: String,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub cover: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub plot: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub cast: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub director: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub genre: Option<String>,
    #[serde(default, rename = "releaseDate", deserialize_with = "de_opt_string")]
    pub release_date: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub last_modified: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub rating: Option<String>,
    #[serde(default, deserialize_with = "de_opt_f32")]
    pub rating_5based: Option<f32>,
    #[serde(default, deserialize_with = "de_string_list")]
    pub backdrop_path: Option<Vec<String>>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub youtube_trailer: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub category_id: Option<String>,
}

/// Detailed series information (from get_series_info)
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct XtreamSeriesInfo {
    #[serde(default)]
    pub seasons: Option<Vec<XtreamSeason>>,
    #[serde(default)]
    pub info: XtreamSeriesDetails,
    /// Episodes grouped by season number (key is season number as string)
    #[serde(default, deserialize_with = "de_episode_map")]
    pub episodes: HashMap<String, Vec<XtreamEpisode>>,
}

/// Season information
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct XtreamSeason {
    #[serde(default, deserialize_with = "de_opt_string")]
    pub air_date: Option<String>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub episode_count: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub overview: Option<String>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub season_number: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub cover: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub cover_big: Option<String>,
}

/// Series metadata details
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct XtreamSeriesDetails {
    #[serde(default, deserialize_with = "de_opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub cover: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub plot: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub cast: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub director: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub genre: Option<String>,
    #[serde(default, rename = "releaseDate", deserialize_with = "de_opt_string")]
    pub release_date: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub rating: Option<String>,
    #[serde(default, deserialize_with = "de_string_list")]
    pub backdrop_path: Option<Vec<String>>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub youtube_trailer: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub episode_run_time: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub category_id: Option<String>,
}

/// Episode information
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct XtreamEpisode {
    #[serde(deserialize_with = "de_string")]
    pub id: String,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub episode_num: Option<i64>,
    #[serde(default, deserialize_with = "de_string")]
    pub title: String,
    #[serde(default, deserialize_with = "de_string")]
    pub container_extension: String,
    #[serde(default)]
    pub info: Option<XtreamEpisodeInfo>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub season: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub added: Option<String>,
}

/// Episode metadata
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct XtreamEpisodeInfo {
    #[serde(default, deserialize_with = "de_opt_string")]
    pub releasedate: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub plot: Option<String>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub duration_secs: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub movie_image: Option<String>,
    #[serde(default, deserialize_with = "de_opt_f32")]
    pub rating: Option<f32>,
}

// ============================================================================
// EPG Types
// ============================================================================

/// Short EPG entry (from get_short_epg)
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct XtreamEpgEntry {
    #[serde(default, deserialize_with = "de_opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub epg_id: Option<String>,
    /// Frequently base64-encoded by the panel
    #[serde(default, deserialize_with = "de_opt_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub lang: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub start: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub end: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub channel_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub start_timestamp: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub stop_timestamp: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub now_playing: Option<i64>,
}

/// EPG listings container
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct XtreamEpgListings {
    #[serde(default)]
    pub epg_listings: Vec<XtreamEpgEntry>,
}

// ============================================================================
// Lenient deserializers
// ============================================================================

fn value_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn de_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = Value::deserialize(deserializer)?;
    value_to_i64(&value).ok_or_else(|| D::Error::custom(format!("expected integer, got {}", value)))
}

fn de_opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_i64(&value))
}

fn de_opt_f32<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64().map(|f| f as f32),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn de_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn de_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(de_opt_string(deserializer)?.unwrap_or_default())
}

fn de_string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let list: Vec<String> = match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) if !s.is_empty() => Some(s),
                _ => None,
            })
            .collect(),
        Value::String(s) if !s.is_empty() => vec![s],
        _ => Vec::new(),
    };
    Ok(if list.is_empty() { None } else { Some(list) })
}

/// Some panels send `[]` instead of `{}` when a series has no episodes
fn de_episode_map<'de, D>(deserializer: D) -> Result<HashMap<String, Vec<XtreamEpisode>>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Object(_) => serde_json::from_value(value).map_err(D::Error::custom),
        Value::Array(ref items) if items.is_empty() => Ok(HashMap::new()),
        Value::Null => Ok(HashMap::new()),
        other => Err(D::Error::custom(format!("unexpected episodes payload: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_stream_accepts_string_ids() {
        let json = r#"{"name":"News HD","stream_type":"live","stream_id":"42","category_id":7}"#;
        let stream: XtreamLiveStream = serde_json::from_str(json).unwrap();
        assert_eq!(stream.stream_id, 42);
        assert_eq!(stream.category_id.as_deref(), Some("7"));
        assert!(stream.stream_icon.is_none());
    }

    #[test]
    fn test_category_numeric_id() {
        let json = r#"[{"category_id":3,"category_name":"Sports","parent_id":0}]"#;
        let categories: Vec<XtreamCategory> = serde_json::from_str(json).unwrap();
        assert_eq!(categories[0].category_id, "3");
        assert_eq!(categories[0].parent_id, Some(0));
    }

    #[test]
    fn test_series_info_empty_episode_array() {
        let json = r#"{"seasons":[],"info":{"name":"Show"},"episodes":[]}"#;
        let info: XtreamSeriesInfo = serde_json::from_str(json).unwrap();
        assert!(info.episodes.is_empty());
        assert_eq!(info.info.name.as_deref(), Some("Show"));
    }

    #[test]
    fn test_epg_entry_string_timestamps() {
        let json = r#"{"epg_listings":[{"id":"1","title":"VGl0bGU=","start_timestamp":"1700000000","stop_timestamp":1700003600,"now_playing":0}]}"#;
        let listings: XtreamEpgListings = serde_json::from_str(json).unwrap();
        let entry = &listings.epg_listings[0];
        assert_eq!(entry.start_timestamp, Some(1_700_000_000));
        assert_eq!(entry.stop_timestamp, Some(1_700_003_600));
        assert_eq!(entry.now_playing, Some(0));
    }

    #[test]
    fn test_rejected_user_info() {
        let json = r#"{"user_info":{"auth":0}}"#;
        let auth: XtreamAuthResponse = serde_json::from_str(json).unwrap();
        assert!(auth.user_info.is_rejected());
        assert!(auth.server_info.is_none());
    }

    #[test]
    fn test_numeric_credentials_accepted() {
        let json = r#"{"user_info":{"auth":1,"username":1001,"password":12345,"status":"Active"}}"#;
        let auth: XtreamAuthResponse = serde_json::from_str(json).unwrap();
        assert_eq!(auth.user_info.username.as_deref(), Some("1001"));
        assert_eq!(auth.user_info.password.as_deref(), Some("12345"));
        assert!(auth.user_info.is_active());
    }

    #[test]
    fn test_backdrop_string_or_list() {
        let json = r#"{"series_id":5,"name":"S","backdrop_path":"http://img/a.jpg"}"#;
        let series: XtreamSeries = serde_json::from_str(json).unwrap();
        assert_eq!(series.backdrop_path, Some(vec!["http://img/a.jpg".to_string()]));
    }
}
