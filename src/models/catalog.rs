use serde::{Deserialize, Serialize};

use crate::services::xtream::{XtreamLiveStream, XtreamSeries, XtreamVodStream};

/// Catalog domain a stream belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Live,
    Vod,
    Series,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Live => "live",
            MediaKind::Vod => "vod",
            MediaKind::Series => "series",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a stream by id + domain, used by the watchlist and favorites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaRef {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: MediaKind,
}

impl MediaRef {
    pub fn new(id: i64, kind: MediaKind) -> Self {
        Self { id, kind }
    }

    pub fn live(id: i64) -> Self {
        Self::new(id, MediaKind::Live)
    }

    pub fn vod(id: i64) -> Self {
        Self::new(id, MediaKind::Vod)
    }

    pub fn series(id: i64) -> Self {
        Self::new(id, MediaKind::Series)
    }
}

/// A catalog stream tagged with the domain that produced it.
///
/// The tag comes from the slice that fetched the stream, never from which
/// optional fields happen to be present.
#[derive(Debug, Clone, PartialEq)]
pub enum Stream {
    Live(XtreamLiveStream),
    Vod(XtreamVodStream),
    Series(XtreamSeries),
}

impl Stream {
    pub fn kind(&self) -> MediaKind {
        match self {
            Stream::Live(_) => MediaKind::Live,
            Stream::Vod(_) => MediaKind::Vod,
            Stream::Series(_) => MediaKind::Series,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Stream::Live(s) => s.stream_id,
            Stream::Vod(s) => s.stream_id,
            Stream::Series(s) => s.series_id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Stream::Live(s) => &s.name,
            Stream::Vod(s) => &s.name,
            Stream::Series(s) => &s.name,
        }
    }

    pub fn category_id(&self) -> Option<&str> {
        match self {
            Stream::Live(s) => s.category_id.as_deref(),
            Stream::Vod(s) => s.category_id.as_deref(),
            Stream::Series(s) => s.category_id.as_deref(),
        }
    }

    /// Channel icon, movie poster or series cover
    pub fn artwork(&self) -> Option<&str> {
        match self {
            Stream::Live(s) => s.stream_icon.as_deref(),
            Stream::Vod(s) => s.stream_icon.as_deref(),
            Stream::Series(s) => s.cover.as_deref(),
        }
    }

    /// Only VOD streams carry a container at the catalog level; series
    /// containers live on individual episodes.
    pub fn container_extension(&self) -> Option<&str> {
        match self {
            Stream::Vod(s) => s.container_extension.as_deref(),
            _ => None,
        }
    }

    pub fn media_ref(&self) -> MediaRef {
        MediaRef::new(self.id(), self.kind())
    }
}

impl From<XtreamLiveStream> for Stream {
    fn from(stream: XtreamLiveStream) -> Self {
        Stream::Live(stream)
    }
}

impl From<XtreamVodStream> for Stream {
    fn from(stream: XtreamVodStream) -> Self {
        Stream::Vod(stream)
    }
}

impl From<XtreamSeries> for Stream {
    fn from(stream: XtreamSeries) -> Self {
        Stream::Series(stream)
    }
}
