//! Pure derivations over slice state. Nothing here touches the network or
//! the store.

pub mod browse;
pub mod epg;
pub mod playback;
pub mod search;
pub mod watchlist;

pub use browse::{default_season, episodes_for_season, seasons, select_channel, streams_in_category, ChannelSelection};
pub use epg::{decode_title, window_listings, EpgProgram};
pub use playback::{mime_type_for_container, PlaybackSource};
pub use search::{search, SearchResults};
pub use watchlist::{resolve_favorites, resolve_watchlist};
