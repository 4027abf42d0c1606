//! Worker tasks that back the session orchestration.
//!
//! The authority worker owns the authoritative world and is the only task that
//! mutates it.

mod authority;

pub(crate) use authority::{AuthorityWorker, Command};
