//! Typed field slots for imports, exports and filters.
//!
//! A pod declares its wiring through fields of these three types:
//!
//! | Slot | Filled by | Read/written by |
//! |------|-----------|-----------------|
//! | [`Export<V>`] | the owning pod's `set_up` | importers (copy), filters (in place) |
//! | [`Import<V>`] | the pool, before `set_up` | the owning pod |
//! | [`Filter<V>`] | the pool, before the filter hook runs | the owning pod's filter hook |
//!
//! An export keeps its value in a shared cell. Filters hold a handle to that
//! cell, which lets a filter owned by one pod rewrite another pod's export
//! in place. Imports receive a clone of the value once the export's owner and
//! all of its filters have run.
//!
//! Every slot is cleared when its pod is torn down.

use core::any::Any;
use core::fmt;
use std::sync::Arc;

use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

/// Type-erased handle to an export cell.
pub(crate) type SharedCell = Arc<dyn Any + Send + Sync>;

type Cell<V> = RwLock<Option<V>>;

mod sealed {
    pub trait Sealed {}
}

/// Operations the pool performs on a slot without knowing its value type.
///
/// Implemented by [`Import`], [`Export`] and [`Filter`] only.
pub trait Slot: sealed::Sealed + Send {
    /// Returns the export cell, for export slots.
    #[doc(hidden)]
    fn shared_cell(&self) -> Option<SharedCell>;

    /// Fills the slot from an export cell.
    #[doc(hidden)]
    fn bind(&mut self, cell: &SharedCell);

    /// Resets the slot to its empty state.
    #[doc(hidden)]
    fn clear(&mut self);
}

/// Static facts about a slot type, read when a descriptor is built.
pub trait TypedSlot: Slot + 'static {
    /// The value type the slot carries.
    type Value: 'static;

    /// True if the slot points at another slot's value instead of holding one.
    const INDIRECT: bool;
}

// ─────────────────────────────────────────────────────────────────────────────
// Import
// ─────────────────────────────────────────────────────────────────────────────

/// A field populated from another pod's export before `set_up` runs.
pub struct Import<V> {
    value: Option<V>,
}

impl<V> Import<V> {
    /// Creates an empty import slot.
    #[must_use]
    pub const fn new() -> Self {
        Self { value: None }
    }

    /// Returns the imported value, if the slot is populated.
    #[must_use]
    pub fn get(&self) -> Option<&V> {
        self.value.as_ref()
    }

    /// Returns true if the slot holds a value.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }
}

impl<V> Default for Import<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for Import<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Import").field(&self.value).finish()
    }
}

impl<V> sealed::Sealed for Import<V> {}

impl<V> Slot for Import<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn shared_cell(&self) -> Option<SharedCell> {
        None
    }

    fn bind(&mut self, cell: &SharedCell) {
        let cell = (**cell)
            .downcast_ref::<Cell<V>>()
            .expect("export cell type mismatch (this is a bug)");
        self.value = cell.read().clone();
    }

    fn clear(&mut self) {
        self.value = None;
    }
}

impl<V> TypedSlot for Import<V>
where
    V: Clone + Send + Sync + 'static,
{
    type Value = V;
    const INDIRECT: bool = false;
}

// ─────────────────────────────────────────────────────────────────────────────
// Export
// ─────────────────────────────────────────────────────────────────────────────

/// A field a pod publishes for other pods to import or filter.
///
/// The owning pod fills it in `set_up`:
///
/// ```
/// use podpool_core::slot::Export;
///
/// let greeting = Export::new();
/// greeting.set(String::from("Hi!"));
/// assert_eq!(greeting.get().as_deref(), Some("Hi!"));
/// ```
pub struct Export<V> {
    cell: Arc<Cell<V>>,
}

impl<V> Export<V> {
    /// Creates an empty export slot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cell: Arc::new(RwLock::new(None)),
        }
    }

    /// Stores a value, returning the previous one.
    pub fn set(&self, value: V) -> Option<V> {
        self.cell.write().replace(value)
    }

    /// Removes and returns the stored value.
    pub fn take(&self) -> Option<V> {
        self.cell.write().take()
    }

    /// Returns a read guard over the stored value.
    ///
    /// Filters of this export take a write lock on the same cell, so drop the
    /// guard before the filter hooks run.
    #[must_use]
    pub fn read(&self) -> Option<MappedRwLockReadGuard<'_, V>> {
        RwLockReadGuard::try_map(self.cell.read(), Option::as_ref).ok()
    }

    /// Returns a write guard over the stored value.
    #[must_use]
    pub fn write(&self) -> Option<MappedRwLockWriteGuard<'_, V>> {
        RwLockWriteGuard::try_map(self.cell.write(), Option::as_mut).ok()
    }

    /// Returns true if a value is stored.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.cell.read().is_some()
    }
}

impl<V: Clone> Export<V> {
    /// Returns a clone of the stored value.
    #[must_use]
    pub fn get(&self) -> Option<V> {
        self.cell.read().clone()
    }
}

impl<V> Default for Export<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for Export<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Export").field(&*self.cell.read()).finish()
    }
}

impl<V> sealed::Sealed for Export<V> {}

impl<V> Slot for Export<V>
where
    V: Send + Sync + 'static,
{
    fn shared_cell(&self) -> Option<SharedCell> {
        let cell: SharedCell = self.cell.clone();
        Some(cell)
    }

    fn bind(&mut self, _cell: &SharedCell) {}

    fn clear(&mut self) {
        *self.cell.write() = None;
    }
}

impl<V> TypedSlot for Export<V>
where
    V: Send + Sync + 'static,
{
    type Value = V;
    const INDIRECT: bool = false;
}

// ─────────────────────────────────────────────────────────────────────────────
// Filter
// ─────────────────────────────────────────────────────────────────────────────

/// A field pointing at another pod's export, rewritten by a filter hook.
///
/// The pool binds the slot right before the hook runs; inside the hook,
/// [`write`](Self::write) gives mutable access to the export's value.
pub struct Filter<V> {
    target: Option<Arc<Cell<V>>>,
}

impl<V> Filter<V> {
    /// Creates an unbound filter slot.
    #[must_use]
    pub const fn new() -> Self {
        Self { target: None }
    }

    /// Returns true once the slot points at an export.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.target.is_some()
    }

    /// Returns a read guard over the target export's value.
    #[must_use]
    pub fn read(&self) -> Option<MappedRwLockReadGuard<'_, V>> {
        let target = self.target.as_ref()?;
        RwLockReadGuard::try_map(target.read(), Option::as_ref).ok()
    }

    /// Returns a write guard over the target export's value.
    ///
    /// `None` if the slot is unbound or the export holds no value.
    #[must_use]
    pub fn write(&self) -> Option<MappedRwLockWriteGuard<'_, V>> {
        let target = self.target.as_ref()?;
        RwLockWriteGuard::try_map(target.write(), Option::as_mut).ok()
    }

    /// Replaces the target export's value, returning the previous one.
    ///
    /// Does nothing and returns `None` if the slot is unbound.
    pub fn replace(&self, value: V) -> Option<V> {
        self.target.as_ref()?.write().replace(value)
    }
}

impl<V: Clone> Filter<V> {
    /// Returns a clone of the target export's value.
    #[must_use]
    pub fn get(&self) -> Option<V> {
        self.target.as_ref()?.read().clone()
    }
}

impl<V> Default for Filter<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for Filter<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("bound", &self.target.is_some())
            .finish()
    }
}

impl<V> sealed::Sealed for Filter<V> {}

impl<V> Slot for Filter<V>
where
    V: Send + Sync + 'static,
{
    fn shared_cell(&self) -> Option<SharedCell> {
        None
    }

    fn bind(&mut self, cell: &SharedCell) {
        let target = Arc::clone(cell)
            .downcast::<Cell<V>>()
            .unwrap_or_else(|_| panic!("export cell type mismatch (this is a bug)"));
        self.target = Some(target);
    }

    fn clear(&mut self) {
        self.target = None;
    }
}

impl<V> TypedSlot for Filter<V>
where
    V: Send + Sync + 'static,
{
    type Value = V;
    const INDIRECT: bool = true;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_copies_export_value() {
        let export = Export::new();
        export.set(7_i32);

        let mut import = Import::<i32>::new();
        import.bind(&export.shared_cell().unwrap());
        assert_eq!(import.get(), Some(&7));

        // later writes to the export do not reach the copy
        export.set(8);
        assert_eq!(import.get(), Some(&7));

        import.clear();
        assert!(!import.is_set());
    }

    #[test]
    fn filter_writes_through_to_export() {
        let export = Export::new();
        export.set(String::from("Hi!"));

        let mut filter = Filter::<String>::new();
        assert!(filter.write().is_none());

        filter.bind(&export.shared_cell().unwrap());
        filter.write().unwrap().push_str(" Jack!");
        assert_eq!(export.get().as_deref(), Some("Hi! Jack!"));

        filter.clear();
        assert!(!filter.is_bound());
        assert_eq!(export.get().as_deref(), Some("Hi! Jack!"));
    }

    #[test]
    fn cleared_export_is_empty_for_bound_filters() {
        let mut export = Export::new();
        export.set(1_u8);

        let mut filter = Filter::<u8>::new();
        filter.bind(&export.shared_cell().unwrap());
        export.clear();

        assert!(filter.is_bound());
        assert!(filter.get().is_none());
        assert!(filter.write().is_none());
    }

    #[test]
    fn only_filters_are_indirect() {
        assert!(!<Import<u8> as TypedSlot>::INDIRECT);
        assert!(!<Export<u8> as TypedSlot>::INDIRECT);
        assert!(<Filter<u8> as TypedSlot>::INDIRECT);
    }
}
