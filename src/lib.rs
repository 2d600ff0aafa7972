//! Runtime dependency injection for pods.
//!
//! See [`podpool_core`] for the full documentation.

pub use podpool_core;
pub use podpool_core::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use podpool_core::prelude::*;
}
