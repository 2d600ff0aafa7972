//! The pod pool: registration, setup and teardown.
//!
//! # Example
//!
//! ```
//! use podpool_core::prelude::*;
//!
//! #[derive(Default, Entries)]
//! struct Greeter {
//!     #[pod(export = "the_greeting")]
//!     pub greeting: Export<String>,
//! }
//!
//! impl Pod for Greeter {
//!     fn set_up(&mut self, _ctx: &SetupContext) -> Result<(), HookError> {
//!         self.greeting.set("Hi!".to_owned());
//!         Ok(())
//!     }
//! }
//!
//! #[derive(Default, Entries)]
//! struct Namer {
//!     #[pod(filter = "the_greeting,add_name,0")]
//!     pub greeting: Filter<String>,
//! }
//!
//! impl Namer {
//!     fn add_name(&mut self, _ctx: &SetupContext) -> Result<(), HookError> {
//!         if let Some(mut greeting) = self.greeting.write() {
//!             greeting.push_str(" Jack!");
//!         }
//!         Ok(())
//!     }
//! }
//!
//! impl Pod for Namer {}
//!
//! #[derive(Default, Entries)]
//! struct Listener {
//!     #[pod(import = "the_greeting")]
//!     pub greeting: Import<String>,
//! }
//!
//! impl Pod for Listener {}
//!
//! let mut pool = PodPool::new();
//! let listener = pool.register(Listener::default())?;
//! pool.register(Greeter::default())?;
//! pool.register(Namer::default())?;
//!
//! pool.set_up(&SetupContext::new())?;
//! let heard = pool.pod::<Listener>(listener).and_then(|l| l.greeting.get().cloned());
//! assert_eq!(heard.as_deref(), Some("Hi! Jack!"));
//!
//! pool.tear_down();
//! # Ok::<(), podpool_core::error::Error>(())
//! ```

use tracing::{debug, info, warn};

use crate::context::SetupContext;
use crate::entry;
use crate::error::Error;
use crate::lifecycle;
use crate::pod::{Pod, PodId, PodRecord};
use crate::resolve::{self, Sequence};

/// Default prefix marking an identifier as a reference link.
pub const DEFAULT_REF_LINK_PREFIX: char = '@';

/// Pool configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    ref_link_prefix: char,
}

impl PoolConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the character that marks an identifier as a reference link.
    #[must_use]
    pub fn with_ref_link_prefix(mut self, prefix: char) -> Self {
        self.ref_link_prefix = prefix;
        self
    }

    /// Returns the reference link prefix.
    #[must_use]
    pub fn ref_link_prefix(&self) -> char {
        self.ref_link_prefix
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            ref_link_prefix: DEFAULT_REF_LINK_PREFIX,
        }
    }
}

/// Owns registered pods and drives their resolution and lifecycle.
///
/// Pods are set up in dependency order: a pod comes after every pod whose
/// export it imports, and an export's owner comes after every pod filtering
/// that export. Teardown runs in the exact reverse order.
#[derive(Debug, Default)]
pub struct PodPool {
    config: PoolConfig,
    pods: Vec<PodRecord>,
    sequence: Sequence,
}

impl PodPool {
    /// Creates an empty pool with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty pool with the given configuration.
    #[must_use]
    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Returns the pool configuration.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Registers a pod.
    ///
    /// The pod's entries are parsed and validated here; on error the pool is
    /// left unchanged. Cross-pod wiring is only checked by [`set_up`](Self::set_up).
    pub fn register<P: Pod>(&mut self, pod: P) -> Result<PodId, Error> {
        let record = entry::build(self.pods.len(), pod)?;
        let id = record.id;
        debug!(pod = %id, "registered pod");
        self.pods.push(record);
        Ok(id)
    }

    /// Returns the number of registered pods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pods.len()
    }

    /// Returns true if no pod is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pods.is_empty()
    }

    /// Returns a registered pod, if `id` names a pod of type `P`.
    #[must_use]
    pub fn pod<P: Pod>(&self, id: PodId) -> Option<&P> {
        self.pods.get(id.index())?.downcast_ref::<P>()
    }

    /// Returns a registered pod mutably, if `id` names a pod of type `P`.
    #[must_use]
    pub fn pod_mut<P: Pod>(&mut self, id: PodId) -> Option<&mut P> {
        self.pods.get_mut(id.index())?.downcast_mut::<P>()
    }

    /// Resolves all registered pods and sets them up in dependency order.
    ///
    /// On failure every pod that completed setup has already been torn down
    /// and the pool is left as if setup never ran, so it may be retried.
    pub fn set_up(&mut self, ctx: &SetupContext) -> Result<(), Error> {
        if self.is_set_up() {
            warn!("setting up a pool that was not torn down");
        }
        self.sequence = Sequence::default();

        let sequence = resolve::resolve(&mut self.pods, self.config.ref_link_prefix)?;

        if let Err(err) = lifecycle::set_up(&mut self.pods, sequence.head, ctx) {
            for record in &mut self.pods {
                record.prev = None;
                record.next = None;
            }
            return Err(err);
        }

        self.sequence = sequence;
        info!(pods = self.pods.len(), "pod pool set up");
        Ok(())
    }

    /// Tears down all pods in reverse setup order.
    ///
    /// Does nothing if the pool is not set up.
    pub fn tear_down(&mut self) {
        let Sequence { tail, .. } = core::mem::take(&mut self.sequence);
        if tail.is_none() {
            return;
        }

        lifecycle::tear_down(&mut self.pods, tail);
        info!(pods = self.pods.len(), "pod pool torn down");
    }

    /// Returns true between a successful [`set_up`](Self::set_up) and the
    /// next [`tear_down`](Self::tear_down).
    #[must_use]
    pub fn is_set_up(&self) -> bool {
        self.sequence.head.is_some()
    }

    /// Returns the pods in setup order.
    ///
    /// Empty unless the pool is set up.
    #[must_use]
    pub fn setup_order(&self) -> Vec<PodId> {
        let mut order = Vec::with_capacity(self.pods.len());
        let mut cursor = self.sequence.head;
        while let Some(index) = cursor {
            let record = &self.pods[index];
            order.push(record.id);
            cursor = record.next;
        }
        order
    }
}
