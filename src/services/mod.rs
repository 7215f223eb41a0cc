pub mod store;
pub mod xtream;
