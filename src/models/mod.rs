pub mod catalog;
pub mod session;

pub use catalog::{MediaKind, MediaRef, Stream};
pub use session::{ApiConfig, AppStatus, Credentials};
