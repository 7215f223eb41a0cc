//! Client core for Xtream Codes IPTV panels.
//!
//! Keeps a local copy of the live, VOD and series catalogs, restores the
//! session on startup and derives the views a player UI needs (EPG window,
//! watchlist, search).

pub mod app;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod slices;
pub mod views;

#[cfg(test)]
pub(crate) mod test_support;

pub use app::{AppContext, RefreshReport, RefreshTask};
pub use config::Config;
pub use error::{LoginError, SyncError};
