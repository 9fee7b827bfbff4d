//! Backends for the record store, blob store, and notification sender.

pub mod email;
pub mod memory;
pub mod rest;

pub use email::EmailJsNotifier;
pub use memory::{InMemoryBlobStore, InMemoryRecordStore, RecordingNotifier};
pub use rest::{HostedBackend, RestBlobStore, RestRecordStore};
