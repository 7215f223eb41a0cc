//! Xtream Codes Integration
//!
//! This module provides the client side of the Xtream Codes Player API v2.
//!
//! # Overview
//!
//! - **API Client**: the [`ApiClient`] trait, implemented over HTTP by
//!   [`XtreamClient`]. Every call receives the [`crate::models::ApiConfig`]
//!   to use and rejects incomplete configs before touching the network.
//! - **Types**: lenient response types for accounts, categories, streams,
//!   EPG listings and VOD/series details.
//!
//! Requests go to:
//! ```text
//! http://server:port/player_api.php?username=X&password=Y&action=get_live_streams
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use ativeplay_client::services::xtream::{ApiClient, XtreamClient};
//!
//! let client = XtreamClient::new(&config)?;
//! let account = client.get_account_info(&api_config).await?;
//! let channels = client.get_live_streams(&api_config).await?;
//! ```

pub mod client;
pub mod types;

// Re-exports for convenience
pub use client::{ApiClient, XtreamClient, XtreamError};
pub use types::{
    XtreamAuthResponse, XtreamCategory, XtreamEpgEntry, XtreamEpgListings, XtreamEpisode,
    XtreamEpisodeInfo, XtreamLiveStream, XtreamSeason, XtreamSeries, XtreamSeriesDetails,
    XtreamSeriesInfo, XtreamServerInfo, XtreamUserInfo, XtreamVodDetails, XtreamVodInfo,
    XtreamVodStream,
};
