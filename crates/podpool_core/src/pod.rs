//! The pod contract and the pool's type-erased view of a pod.
//!
//! A pod is a user value that declares wiring entries through [`Entries`]
//! and lifecycle hooks through [`Pod`]. Once registered, the pool owns it
//! behind [`ErasedPod`] so pods of different types live in one arena.

use core::fmt;
use std::sync::Arc;

use downcast_rs::{Downcast, impl_downcast};

use crate::context::{HookError, SetupContext};
use crate::descriptor::{Entries, FieldAccess, FilterHook};
use crate::entry::PodEntries;
use crate::slot::Slot;

/// A unit of wiring registered with a [`PodPool`](crate::pool::PodPool).
///
/// Every hook has a default, so a pod that only moves values around can be
/// declared with an empty impl:
///
/// ```
/// use podpool_core::prelude::*;
///
/// #[derive(Default, Entries)]
/// struct Config {
///     #[pod(export = "Port")]
///     pub port: Export<u16>,
/// }
///
/// impl Pod for Config {
///     fn set_up(&mut self, _ctx: &SetupContext) -> Result<(), HookError> {
///         self.port.set(8080);
///         Ok(())
///     }
/// }
/// ```
pub trait Pod: Entries + Send {
    /// Resolves a reference link to a concrete identifier.
    ///
    /// `link` is passed as declared, prefix included (`@Foo`). Called during
    /// resolution, before any slot is populated. Returning `None` fails
    /// setup; returning an empty string makes the entry match by value type.
    fn resolve_ref_link(&self, link: &str) -> Option<String> {
        let _ = link;
        None
    }

    /// Called once all imports are populated. Fill exports here.
    fn set_up(&mut self, ctx: &SetupContext) -> Result<(), HookError> {
        let _ = ctx;
        Ok(())
    }

    /// Called in reverse setup order; the pod's slots are cleared afterwards.
    fn tear_down(&mut self) {}
}

/// Identity of a registered pod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PodId {
    index: usize,
    type_name: &'static str,
}

impl PodId {
    pub(crate) const fn new(index: usize, type_name: &'static str) -> Self {
        Self { index, type_name }
    }

    /// Registration index of the pod.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Type name of the pod.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Display for PodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.type_name, self.index)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Type erasure
// ─────────────────────────────────────────────────────────────────────────────

/// Object-safe view of a pod together with its resolved accessors.
pub(crate) trait ErasedPod: Downcast + Send {
    fn resolve_ref_link(&self, link: &str) -> Option<String>;

    fn set_up(&mut self, ctx: &SetupContext) -> Result<(), HookError>;

    fn tear_down(&mut self);

    /// Returns the slot of the entry whose accessor sits at `field`.
    fn slot(&mut self, field: usize) -> &mut dyn Slot;

    fn field_count(&self) -> usize;

    /// Runs the filter hook registered at `hook`.
    fn run_filter(&mut self, hook: usize, ctx: &SetupContext) -> Result<(), HookError>;
}

impl_downcast!(ErasedPod);

/// A pod with the accessors and hooks its entries refer to by index.
pub(crate) struct PodCell<P> {
    pub(crate) pod: P,
    pub(crate) fields: Vec<Arc<dyn FieldAccess<P>>>,
    pub(crate) hooks: Vec<Arc<dyn FilterHook<P>>>,
}

impl<P: Pod> ErasedPod for PodCell<P> {
    fn resolve_ref_link(&self, link: &str) -> Option<String> {
        self.pod.resolve_ref_link(link)
    }

    fn set_up(&mut self, ctx: &SetupContext) -> Result<(), HookError> {
        self.pod.set_up(ctx)
    }

    fn tear_down(&mut self) {
        self.pod.tear_down();
    }

    fn slot(&mut self, field: usize) -> &mut dyn Slot {
        self.fields[field].slot(&mut self.pod)
    }

    fn field_count(&self) -> usize {
        self.fields.len()
    }

    fn run_filter(&mut self, hook: usize, ctx: &SetupContext) -> Result<(), HookError> {
        self.hooks[hook].call(&mut self.pod, ctx)
    }
}

/// A registered pod, its parsed entries and its place in the setup sequence.
pub(crate) struct PodRecord {
    pub(crate) id: PodId,
    pub(crate) cell: Box<dyn ErasedPod>,
    pub(crate) entries: PodEntries,
    pub(crate) prev: Option<usize>,
    pub(crate) next: Option<usize>,
}

impl PodRecord {
    pub(crate) fn downcast_ref<P: Pod>(&self) -> Option<&P> {
        self.cell
            .downcast_ref::<PodCell<P>>()
            .map(|cell| &cell.pod)
    }

    pub(crate) fn downcast_mut<P: Pod>(&mut self) -> Option<&mut P> {
        self.cell
            .downcast_mut::<PodCell<P>>()
            .map(|cell| &mut cell.pod)
    }
}

impl fmt::Debug for PodRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PodRecord")
            .field("id", &self.id)
            .field("entries", &self.entries)
            .field("prev", &self.prev)
            .field("next", &self.next)
            .finish_non_exhaustive()
    }
}
