#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Association graph over a key-value store.
//!
//! Keys are arbitrary tokens (URLs, domains, tags). Every association is
//! recorded in both directions, so a member of a key's set always names a key
//! whose own set points back.

pub mod backup;
pub mod command;
pub mod graph;
pub mod interpreter;
pub mod store;
pub mod tagging;
pub mod transport;
pub mod urls;

pub use backup::{BackupDocument, DEFAULT_BACKUP_FILE};
pub use command::{Command, NOT_FOUND};
pub use graph::{GraphEvent, LinkGraph};
pub use interpreter::{DEFAULT_TAGGING_TIMEOUT, HISTORY_BATCH, Interpreter};
pub use store::{KeyType, MemoryStore, Store, StoreError, StoredValue};
pub use tagging::{TaggingEvent, TaggingSession, TaggingStep};
pub use transport::{LoggedMessage, Transport};
