//! What a player needs to open a stream. URL construction stays with the
//! caller; this only exposes identity, container and MIME type.

use serde::Serialize;

use crate::models::MediaKind;
use crate::services::xtream::{XtreamEpisode, XtreamLiveStream, XtreamVodStream};

/// Live channels are always played as HLS
pub const LIVE_CONTAINER: &str = "m3u8";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackSource {
    pub kind: MediaKind,
    pub stream_id: String,
    pub container_extension: String,
    pub mime_type: String,
}

impl PlaybackSource {
    fn new(kind: MediaKind, stream_id: String, container_extension: &str) -> Self {
        Self {
            kind,
            stream_id,
            container_extension: container_extension.to_string(),
            mime_type: mime_type_for_container(container_extension),
        }
    }

    pub fn live(stream: &XtreamLiveStream) -> Self {
        Self::new(MediaKind::Live, stream.stream_id.to_string(), LIVE_CONTAINER)
    }

    /// `None` when the panel did not report a container
    pub fn vod(stream: &XtreamVodStream) -> Option<Self> {
        let ext = stream.container_extension.as_deref().filter(|e| !e.is_empty())?;
        Some(Self::new(MediaKind::Vod, stream.stream_id.to_string(), ext))
    }

    pub fn episode(episode: &XtreamEpisode) -> Option<Self> {
        if episode.container_extension.is_empty() {
            return None;
        }
        Some(Self::new(MediaKind::Series, episode.id.clone(), &episode.container_extension))
    }
}

pub fn mime_type_for_container(container: &str) -> String {
    let mime = match container {
        "mkv" => "video/webm",
        "mp4" | "mov" | "m4v" => "video/mp4",
        "avi" => "video/x-msvideo",
        "3gp" => "video/3gpp",
        "mpg" | "mpeg" => "video/mpeg",
        "ogg" | "ogv" | "opus" => "video/ogg",
        "mpd" => "application/dash+xml",
        "m3u8" => "application/x-mpegURL",
        other => return format!("video/{}", other),
    };
    mime.to_string()
}
