//! Resolve stored references against the loaded catalog.

use std::collections::HashMap;

use crate::models::{MediaKind, MediaRef, Stream};
use crate::services::xtream::{XtreamLiveStream, XtreamSeries, XtreamVodStream};

/// Watchlist entries as streams, in watchlist order. References whose stream
/// is no longer in the catalog are skipped.
pub fn resolve_watchlist(items: &[MediaRef], vod: &[XtreamVodStream], series: &[XtreamSeries]) -> Vec<Stream> {
    let vod_by_id: HashMap<i64, &XtreamVodStream> = vod.iter().map(|s| (s.stream_id, s)).collect();
    let series_by_id: HashMap<i64, &XtreamSeries> = series.iter().map(|s| (s.series_id, s)).collect();

    items
        .iter()
        .filter_map(|item| match item.kind {
            MediaKind::Vod => vod_by_id.get(&item.id).map(|s| Stream::Vod((*s).clone())),
            MediaKind::Series => series_by_id.get(&item.id).map(|s| Stream::Series((*s).clone())),
            MediaKind::Live => None,
        })
        .collect()
}

/// Favorite channels, in favorites order
pub fn resolve_favorites(items: &[MediaRef], live: &[XtreamLiveStream]) -> Vec<XtreamLiveStream> {
    let live_by_id: HashMap<i64, &XtreamLiveStream> = live.iter().map(|s| (s.stream_id, s)).collect();

    items
        .iter()
        .filter(|item| item.kind == MediaKind::Live)
        .filter_map(|item| live_by_id.get(&item.id).map(|s| (*s).clone()))
        .collect()
}
