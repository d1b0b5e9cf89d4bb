//! # chronosync-core
//!
//! Core ChronoSync functionality including:
//! - Encrypted snapshot sync: PBKDF2-derived AES-256-GCM codes portable
//!   between devices
//! - Per-user JSON data store for tasks and the tag palette
//! - Tracker orchestration: login, task CRUD, tag management
//! - Per-tag time statistics bucketed by day, week, and month

pub mod crypto;
pub mod error;
pub mod snapshot;
pub mod stats;
pub mod store;
pub mod sync;
mod tracker;

pub use crypto::{derive_key, generate_salt, MasterKey, PBKDF2_ITERATIONS};
pub use error::{ChronoError, Result};
pub use snapshot::{Snapshot, TagDefinition, Task};
pub use stats::{duration_minutes, tag_totals, Period, TagTotal};
pub use store::DataStore;
pub use sync::{decode, encode, SyncCode};
pub use tracker::{NewTask, Tracker};
