//! Shared helpers for `podpool_core` integration tests.

use std::sync::{Arc, Once};

use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Installs a test-writer subscriber once per test binary.
///
/// Set `RUST_LOG=podpool_core=trace` to see the pool's spans and events.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Ordered record of hook calls shared between the pods of one test.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    /// Appends an event.
    pub fn record(&self, event: impl Into<String>) {
        self.0.lock().push(event.into());
    }

    /// Removes and returns all events recorded so far.
    pub fn take(&self) -> Vec<String> {
        core::mem::take(&mut *self.0.lock())
    }
}
