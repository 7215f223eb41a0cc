//! In-memory state slices. Each slice is a cheap `Clone` handle over shared
//! state; cloning never copies the catalog.

pub mod catalog;
pub mod media_list;
pub mod session;

pub use catalog::{CatalogDomain, CatalogSlice, Live, LiveSlice, Series, SeriesSlice, Vod, VodSlice};
pub use media_list::MediaList;
pub use session::Session;
