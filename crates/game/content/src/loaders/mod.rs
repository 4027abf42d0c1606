//! Content loaders for reading game data from files.
//!
//! Each loader turns one file into survival-core types; [`ContentFactory`]
//! knows where those files live inside a data directory.

pub mod config;
pub mod factory;
pub mod item;

pub use config::ConfigLoader;
pub use factory::ContentFactory;
pub use item::ItemLoader;

use std::path::Path;

use anyhow::Context;

/// Every loader reports through `anyhow`, naming the file that failed.
pub type LoadResult<T> = anyhow::Result<T>;

pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}
