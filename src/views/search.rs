//! Catalog-wide search by name.

use serde::Serialize;

use crate::services::xtream::{XtreamLiveStream, XtreamSeries, XtreamVodStream};

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    pub movies: Vec<XtreamVodStream>,
    pub series: Vec<XtreamSeries>,
    pub channels: Vec<XtreamLiveStream>,
}

impl SearchResults {
    pub fn total(&self) -> usize {
        self.movies.len() + self.series.len() + self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Case-insensitive substring match on stream names. An empty query matches
/// nothing.
pub fn search(
    query: &str,
    live: &[XtreamLiveStream],
    vod: &[XtreamVodStream],
    series: &[XtreamSeries],
) -> SearchResults {
    if query.is_empty() {
        return SearchResults::default();
    }

    let needle = query.to_lowercase();
    let matches = |name: &str| name.to_lowercase().contains(&needle);

    SearchResults {
        movies: vod.iter().filter(|s| matches(&s.name)).cloned().collect(),
        series: series.iter().filter(|s| matches(&s.name)).cloned().collect(),
        channels: live.iter().filter(|s| matches(&s.name)).cloned().collect(),
    }
}
