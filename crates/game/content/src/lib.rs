//! Data-driven content definitions and loaders.
//!
//! This crate provides loaders for the RON/TOML data files a session is built
//! from:
//! - Item catalogs (data-driven via RON)
//! - Game configuration (data-driven via TOML)
//!
//! All loaders use survival-core types directly with serde for deserialization.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, ContentFactory, ItemLoader, LoadResult};
