//! Interactive edge editing on top of the graph store and layout engine.
//!
//! [`EditSession`] is the synchronous state machine (select, optimistic
//! submit, resolve, cancel). [`EditController`] runs it against a
//! [`RemoteStore`] on a Tokio runtime, keeps the layout ticking and publishes
//! [`GraphSnapshot`](forcegraph_core::GraphSnapshot)s for renderers.

pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod memory;
pub mod remote;
pub mod session;

pub use config::SessionConfig;
pub use controller::EditController;
pub use error::SessionError;
pub use events::AdapterEvent;
pub use memory::{MemoryRemoteStore, StorePolicy};
pub use remote::{RemoteError, RemoteStore};
pub use session::{CancelledEdit, EditSession, PersistRequest, Resolution, SessionState};
