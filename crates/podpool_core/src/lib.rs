//! Runtime wiring engine for pods.
//!
//! A pod is a value that declares what it needs (imports), what it provides
//! (exports) and which other pods' exports it post-processes (filters).
//! A [`PodPool`](pool::PodPool) resolves those declarations across all
//! registered pods, sets the pods up in dependency order and tears them down
//! in reverse.
//!
//! - [`descriptor`] - Entry tables and the [`Entries`](descriptor::Entries) trait
//! - [`slot`] - `Import`, `Export` and `Filter` field types
//! - [`pod`] - The [`Pod`](pod::Pod) lifecycle contract
//! - [`pool`] - Registration, setup and teardown
//! - [`context`] - Setup context and cancellation
//! - [`error`] - Error taxonomy
//! - [`macro@Entries`] - Derive macro generating entry tables
//!
//! # Declaring a pod
//!
//! ```
//! use podpool_core::prelude::*;
//!
//! #[derive(Default, Entries)]
//! struct Server {
//!     #[pod(import = "Port")]
//!     pub port: Import<u16>,
//!     #[pod(export)]
//!     pub address: Export<String>,
//! }
//!
//! impl Pod for Server {
//!     fn set_up(&mut self, ctx: &SetupContext) -> Result<(), HookError> {
//!         ctx.check()?;
//!         let port = self.port.get().copied().unwrap_or_default();
//!         self.address.set(format!("127.0.0.1:{port}"));
//!         Ok(())
//!     }
//! }
//! ```

// Lets `#[derive(Entries)]` emit `podpool_core::` paths inside this crate.
extern crate self as podpool_core;

/// Setup context and hook errors.
pub mod context;

/// Entry tables for pod types.
pub mod descriptor;

/// Error types.
pub mod error;

/// The pod contract.
pub mod pod;

/// The pod pool.
pub mod pool;

/// Typed import, export and filter slots.
pub mod slot;

mod entry;
mod lifecycle;
mod resolve;

/// Re-export the `#[derive(Entries)]` macro.
pub use podpool_macros::Entries;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::Entries;
    pub use crate::context::{Cancelled, HookError, SetupContext};
    pub use crate::descriptor::{Descriptor, Entries, Field, Visibility};
    pub use crate::error::{EntryFault, Error, ErrorKind, InvalidPodReason};
    pub use crate::pod::{Pod, PodId};
    pub use crate::pool::{PodPool, PoolConfig};
    pub use crate::slot::{Export, Filter, Import};
}
