//! Short-EPG windowing for the channel guide.

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{Local, NaiveDateTime, TimeZone};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::services::xtream::XtreamEpgEntry;

/// Entries kept by default after windowing
pub const DEFAULT_WINDOW_LIMIT: usize = 10;

/// How long a finished program stays in the window
pub const STALE_AFTER_SECS: i64 = 3600;

pub const UNKNOWN_TITLE: &str = "Unknown Program";

/// Shorter strings are never treated as base64
const MIN_BASE64_TITLE_LEN: usize = 20;

lazy_static! {
    /// Padded standard-alphabet base64
    static ref BASE64_REGEX: Regex =
        Regex::new(r"^(?:[A-Za-z0-9+/]{4})*(?:[A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=)?$").unwrap();
}

/// A listing ready for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpgProgram {
    pub id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub start_timestamp: Option<i64>,
    pub stop_timestamp: Option<i64>,
    /// Local `HH:MM - HH:MM`
    pub time_label: String,
    pub now_playing: bool,
    /// 0..=100
    pub progress: f64,
}

/// Drop stale listings, order by start and keep the first `limit`.
///
/// A listing is stale once it ended more than an hour before `now`; one
/// without a stop time never is.
pub fn window_listings(listings: &[XtreamEpgEntry], now: i64, limit: usize) -> Vec<EpgProgram> {
    let mut fresh: Vec<&XtreamEpgEntry> = listings
        .iter()
        .filter(|entry| match entry.stop_timestamp {
            Some(stop) => stop >= now - STALE_AFTER_SECS,
            None => true,
        })
        .collect();

    // Stable, so equal starts keep provider order
    fresh.sort_by_key(|entry| entry.start_timestamp.unwrap_or(0));

    fresh
        .into_iter()
        .take(limit)
        .map(|entry| to_program(entry, now))
        .collect()
}

fn to_program(entry: &XtreamEpgEntry, now: i64) -> EpgProgram {
    EpgProgram {
        id: entry.id.clone(),
        title: decode_title(entry.title.as_deref()),
        description: entry.description.as_deref().map(decode_text),
        start_timestamp: entry.start_timestamp,
        stop_timestamp: entry.stop_timestamp,
        time_label: format!(
            "{} - {}",
            format_clock(entry.start_timestamp, entry.start.as_deref()),
            format_clock(entry.stop_timestamp, entry.end.as_deref())
        ),
        now_playing: is_now_playing(entry, now),
        progress: progress_percent(entry, now),
    }
}

/// Flagged by the panel, or running at `now`
pub fn is_now_playing(entry: &XtreamEpgEntry, now: i64) -> bool {
    if matches!(entry.now_playing, Some(flag) if flag != 0) {
        return true;
    }
    match (entry.start_timestamp, entry.stop_timestamp) {
        (Some(start), Some(stop)) => start < now && stop > now,
        _ => false,
    }
}

/// Elapsed share of the program at `now`, in percent. Zero outside the
/// program or when either bound is missing.
pub fn progress_percent(entry: &XtreamEpgEntry, now: i64) -> f64 {
    let (start, stop) = match (entry.start_timestamp, entry.stop_timestamp) {
        (Some(start), Some(stop)) if start != 0 && stop != 0 => (start, stop),
        _ => return 0.0,
    };
    if stop <= start || now < start || now > stop {
        return 0.0;
    }

    let progress = (now - start) as f64 / (stop - start) as f64 * 100.0;
    progress.clamp(0.0, 100.0)
}

/// Base64 shape check with the length gate that keeps short plain words out
pub fn looks_like_base64(s: &str) -> bool {
    s.len() > MIN_BASE64_TITLE_LEN && s.len() % 4 == 0 && BASE64_REGEX.is_match(s)
}

/// Display title: decoded when the panel sent base64, raw otherwise
pub fn decode_title(title: Option<&str>) -> String {
    match title {
        Some(title) if !title.is_empty() => decode_text(title),
        _ => UNKNOWN_TITLE.to_string(),
    }
}

fn decode_text(text: &str) -> String {
    if !looks_like_base64(text) {
        return text.to_string();
    }

    match STANDARD.decode(text) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(decoded) => decoded,
            Err(_) => text.to_string(),
        },
        Err(e) => {
            tracing::debug!("EPG text looked like base64 but failed to decode: {}", e);
            text.to_string()
        }
    }
}

/// Local `HH:MM` from a unix timestamp, else from a `YYYY-MM-DD HH:MM:SS`
/// string, else empty
pub fn format_clock(timestamp: Option<i64>, fallback: Option<&str>) -> String {
    if let Some(dt) = timestamp.and_then(|ts| Local.timestamp_opt(ts, 0).single()) {
        return dt.format("%H:%M").to_string();
    }

    fallback
        .and_then(|s| NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S").ok())
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn entry(start: Option<i64>, stop: Option<i64>) -> XtreamEpgEntry {
        XtreamEpgEntry {
            title: Some(format!("show-{}", stop.unwrap_or(0))),
            start_timestamp: start,
            stop_timestamp: stop,
            ..Default::default()
        }
    }

    #[test]
    fn test_window_drops_stale_and_sorts() {
        let listings = vec![
            entry(Some(NOW + 600), Some(NOW + 3600)),
            entry(Some(NOW - 9000), Some(NOW - 7200)),
            entry(Some(NOW - 3600), Some(NOW - 1800)),
            entry(Some(NOW - 1800), Some(NOW + 600)),
        ];

        let window = window_listings(&listings, NOW, DEFAULT_WINDOW_LIMIT);
        let stops: Vec<Option<i64>> = window.iter().map(|p| p.stop_timestamp).collect();
        assert_eq!(stops, vec![Some(NOW - 1800), Some(NOW + 600), Some(NOW + 3600)]);
        assert!(window[1].now_playing);
        assert!(!window[0].now_playing);
    }

    #[test]
    fn test_window_limit_and_missing_times() {
        let mut listings: Vec<XtreamEpgEntry> = (0..15)
            .map(|i| entry(Some(NOW + i * 60), Some(NOW + i * 60 + 60)))
            .collect();
        // No stop: never stale. No start: sorts first.
        listings.push(entry(None, None));

        let window = window_listings(&listings, NOW, 10);
        assert_eq!(window.len(), 10);
        assert_eq!(window[0].start_timestamp, None);
        assert_eq!(window[0].progress, 0.0);
    }

    #[test]
    fn test_now_playing_flag() {
        let mut e = entry(Some(NOW + 100), Some(NOW + 200));
        assert!(!is_now_playing(&e, NOW));
        e.now_playing = Some(1);
        assert!(is_now_playing(&e, NOW));
        assert!(!is_now_playing(&entry(Some(NOW - 10), None), NOW));
    }

    #[test]
    fn test_progress() {
        assert_eq!(progress_percent(&entry(Some(NOW - 50), Some(NOW + 50)), NOW), 50.0);
        assert_eq!(progress_percent(&entry(Some(NOW), Some(NOW + 100)), NOW), 0.0);
        assert_eq!(progress_percent(&entry(Some(NOW - 100), Some(NOW)), NOW), 100.0);
        assert_eq!(progress_percent(&entry(Some(NOW + 10), Some(NOW + 50)), NOW), 0.0);
        assert_eq!(progress_percent(&entry(None, Some(NOW + 50)), NOW), 0.0);
        assert_eq!(progress_percent(&entry(Some(NOW), Some(NOW)), NOW), 0.0);
    }

    #[test]
    fn test_decode_base64_title() {
        // 24 chars
        assert_eq!(decode_title(Some("TW9ybmluZyBTaG93IFRvZGF5")), "Morning Show Today");
    }

    #[test]
    fn test_short_base64_left_as_is() {
        assert_eq!(decode_title(Some("QUJDREVGRw==")), "QUJDREVGRw==");
        assert_eq!(decode_title(Some("SGVsbG8gV2")), "SGVsbG8gV2");
    }

    #[test]
    fn test_plain_titles_left_as_is() {
        assert_eq!(decode_title(Some("The Evening News at Nine")), "The Evening News at Nine");
        // Base64-shaped but decodes to invalid UTF-8
        assert_eq!(decode_title(Some("////////////////////////")), "////////////////////////");
        assert_eq!(decode_title(None), UNKNOWN_TITLE);
        assert_eq!(decode_title(Some("")), UNKNOWN_TITLE);
    }

    #[test]
    fn test_format_clock() {
        let expected = Local.timestamp_opt(NOW, 0).single().unwrap().format("%H:%M").to_string();
        assert_eq!(format_clock(Some(NOW), Some("2024-01-01 08:15:00")), expected);
        assert_eq!(format_clock(None, Some("2024-01-01 08:15:00")), "08:15");
        assert_eq!(format_clock(None, Some("tonight")), "");
        assert_eq!(format_clock(None, None), "");
    }

    #[test]
    fn test_time_label() {
        let mut e = entry(None, None);
        e.start = Some("2024-01-01 20:00:00".to_string());
        e.end = Some("2024-01-01 21:30:00".to_string());
        let window = window_listings(&[e], NOW, 1);
        assert_eq!(window[0].time_label, "20:00 - 21:30");
    }
}
