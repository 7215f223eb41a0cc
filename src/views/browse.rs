//! Selection state for the live browser and the series detail view.

use crate::services::xtream::{XtreamCategory, XtreamEpisode, XtreamLiveStream, XtreamSeason, XtreamSeriesInfo};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelSelection {
    pub category: Option<XtreamCategory>,
    pub stream: Option<XtreamLiveStream>,
}

/// Pick the category and channel to show.
///
/// A requested channel that exists is selected together with its category
/// (the first category if its own is unknown). Otherwise the first category
/// and its first channel are selected.
pub fn select_channel(
    categories: &[XtreamCategory],
    streams: &[XtreamLiveStream],
    requested: Option<i64>,
) -> ChannelSelection {
    let first_category = categories.first();

    if let Some(stream) = requested.and_then(|id| streams.iter().find(|s| s.stream_id == id)) {
        let category = categories
            .iter()
            .find(|c| Some(c.category_id.as_str()) == stream.category_id.as_deref())
            .or(first_category);
        return ChannelSelection {
            category: category.cloned(),
            stream: Some(stream.clone()),
        };
    }

    if let Some(id) = requested {
        tracing::debug!("Requested channel {} not in catalog, using default", id);
    }

    let stream = first_category.and_then(|category| {
        streams
            .iter()
            .find(|s| s.category_id.as_deref() == Some(category.category_id.as_str()))
    });
    ChannelSelection {
        category: first_category.cloned(),
        stream: stream.cloned(),
    }
}

/// Channels of the selected category, in catalog order
pub fn streams_in_category<'a>(streams: &'a [XtreamLiveStream], category: Option<&XtreamCategory>) -> Vec<&'a XtreamLiveStream> {
    let Some(category) = category else {
        return Vec::new();
    };
    streams
        .iter()
        .filter(|s| s.category_id.as_deref() == Some(category.category_id.as_str()))
        .collect()
}

/// Seasons of a series. Some providers send an empty `seasons` list; those
/// seasons are rebuilt from the episode map, ordered by number.
pub fn seasons(info: &XtreamSeriesInfo) -> Vec<XtreamSeason> {
    if let Some(seasons) = info.seasons.as_ref().filter(|s| !s.is_empty()) {
        return seasons.clone();
    }

    let mut keys: Vec<&String> = info.episodes.keys().collect();
    keys.sort_by(|a, b| {
        let number = |k: &str| k.parse::<i64>().unwrap_or(i64::MAX);
        number(a).cmp(&number(b)).then_with(|| a.cmp(b))
    });

    keys.into_iter()
        .map(|key| XtreamSeason {
            season_number: key.parse().ok(),
            episode_count: Some(info.episodes[key].len() as i64),
            name: Some(format!("Season {}", key)),
            ..Default::default()
        })
        .collect()
}

/// First season with a number, selected when the view opens
pub fn default_season(seasons: &[XtreamSeason]) -> Option<&XtreamSeason> {
    seasons.iter().find(|s| s.season_number.is_some())
}

/// Episodes of one season in provider order
pub fn episodes_for_season(info: &XtreamSeriesInfo, season: &XtreamSeason) -> Vec<XtreamEpisode> {
    let key = season.season_number.unwrap_or(1).to_string();
    info.episodes.get(&key).cloned().unwrap_or_default()
}
