//! Async session host for the survival gameplay core.
//!
//! One authoritative [`survival_core::World`] lives inside a worker task; every
//! connected player gets an [`ObserverReplica`] holding its own predicted
//! world. Replicas forward intents over a reliable ordered channel and receive
//! state-sync frames pushed back by the authority. Frames cross the channel as
//! `bincode` bytes, the same shape a socket transport would carry.
//!
//! Modules are organized by responsibility:
//! - [`session`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides the topic-based event bus
//! - [`arena`] stands in for engine geometry (ray probes and entity spawning)
//! - [`transport`] defines the wire frames
//! - `workers` keeps the authority task internal to the crate
pub mod api;
pub mod arena;
pub mod events;
pub mod session;
pub mod transport;

mod services;
mod workers;

pub use api::{ObserverReplica, Result, RuntimeError, SessionHandle};
pub use arena::{Arena, Body};
pub use events::{Event, EventBus, IntentEvent, LifecycleEvent, SyncEvent, Topic};
pub use services::NoticeBoard;
pub use session::{RuntimeConfig, Session, SessionBuilder};
pub use transport::{Downlink, Uplink};
