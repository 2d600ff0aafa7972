//! Declarative entry tables for pod types.
//!
//! A [`Descriptor`] lists the fields of a pod type that take part in wiring:
//! each field's role (import, export or filter), its tag, its visibility and
//! an accessor that reaches the field from the pod. It also carries the
//! method table filter tags refer to by name.
//!
//! Descriptors are usually generated with `#[derive(Entries)]`, but can be
//! written by hand:
//!
//! ```
//! use podpool_core::context::{HookError, SetupContext};
//! use podpool_core::descriptor::{Descriptor, Entries, Field};
//! use podpool_core::slot::{Export, Filter, Import};
//!
//! struct Greeter {
//!     pub name: Import<String>,
//!     pub greeting: Export<String>,
//!     pub shout: Filter<String>,
//! }
//!
//! impl Greeter {
//!     fn shout(&mut self, _ctx: &SetupContext) -> Result<(), HookError> {
//!         if let Some(mut greeting) = self.shout.write() {
//!             greeting.make_ascii_uppercase();
//!         }
//!         Ok(())
//!     }
//! }
//!
//! impl Entries for Greeter {
//!     fn entries() -> Descriptor<Self> {
//!         let mut descriptor = Descriptor::<Self>::record();
//!         descriptor
//!             .import("name", "user_name", |pod| &mut pod.name)
//!             .export(Field::public("greeting"), "", |pod| &mut pod.greeting)
//!             .filter("shout", ",shout,10", |pod| &mut pod.shout)
//!             .method("shout", Self::shout);
//!         descriptor
//!     }
//! }
//!
//! assert_eq!(Greeter::entries().len(), 3);
//! ```
//!
//! # Embedded groups
//!
//! [`Descriptor::embed`] splices the entries of another [`Entries`] type
//! reachable from the pod. The embedded entries keep their own method table,
//! so a filter declared inside the group resolves its method against the
//! group's type.

use core::any::{TypeId, type_name};
use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;

use crate::context::{HookError, SetupContext};
use crate::slot::{Export, Import, Slot, TypedSlot};

/// The only signature a filter hook may have.
pub const FILTER_SIGNATURE: &str = "fn(&mut Self, &SetupContext) -> Result<(), HookError>";

/// Types that can describe their wiring entries.
///
/// Every [`Pod`](crate::pod::Pod) implements this, usually through
/// `#[derive(Entries)]`. Types that are only ever embedded in other pods
/// implement it too.
pub trait Entries: Sized + 'static {
    /// Returns the entry table for this type.
    fn entries() -> Descriptor<Self>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Field metadata
// ─────────────────────────────────────────────────────────────────────────────

/// Whether a declared field may be wired by the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// The field is public and may carry an entry.
    #[default]
    Public,
    /// The field is private; declaring an entry on it is an error.
    Private,
}

/// Name and visibility of a declared field.
///
/// A bare `&'static str` converts into a public field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    name: &'static str,
    visibility: Visibility,
}

impl Field {
    /// Creates a field with the given visibility.
    #[must_use]
    pub const fn new(name: &'static str, visibility: Visibility) -> Self {
        Self { name, visibility }
    }

    /// Creates a public field.
    #[must_use]
    pub const fn public(name: &'static str) -> Self {
        Self::new(name, Visibility::Public)
    }

    /// Creates a private field.
    #[must_use]
    pub const fn private(name: &'static str) -> Self {
        Self::new(name, Visibility::Private)
    }

    /// Returns the field name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the field visibility.
    #[must_use]
    pub const fn visibility(&self) -> Visibility {
        self.visibility
    }
}

impl From<&'static str> for Field {
    fn from(name: &'static str) -> Self {
        Self::public(name)
    }
}

/// Role of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role {
    Import,
    Export,
    Filter,
}

/// A type identity with its name kept for diagnostics.
#[derive(Clone, Copy)]
pub(crate) struct TypeInfo {
    pub(crate) id: TypeId,
    pub(crate) name: &'static str,
}

impl TypeInfo {
    pub(crate) fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Field access
// ─────────────────────────────────────────────────────────────────────────────

/// Reaches one slot of a pod.
pub(crate) trait FieldAccess<P>: Send + Sync {
    fn slot<'a>(&self, pod: &'a mut P) -> &'a mut dyn Slot;
}

/// A slot that is a direct field of `P`.
struct Direct<P, F> {
    access: fn(&mut P) -> &mut F,
}

impl<P: 'static, F: TypedSlot> FieldAccess<P> for Direct<P, F> {
    fn slot<'a>(&self, pod: &'a mut P) -> &'a mut dyn Slot {
        (self.access)(pod)
    }
}

/// A slot inside an embedded group `Q` of `P`.
struct Nested<P, Q> {
    outer: fn(&mut P) -> &mut Q,
    inner: Arc<dyn FieldAccess<Q>>,
}

impl<P: 'static, Q: 'static> FieldAccess<P> for Nested<P, Q> {
    fn slot<'a>(&self, pod: &'a mut P) -> &'a mut dyn Slot {
        self.inner.slot((self.outer)(pod))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Methods
// ─────────────────────────────────────────────────────────────────────────────

/// A bound filter hook.
pub(crate) trait FilterHook<P>: Send + Sync {
    fn call(&self, pod: &mut P, ctx: &SetupContext) -> Result<(), HookError>;
}

struct FnHook<F>(F);

impl<P, F> FilterHook<P> for FnHook<F>
where
    F: Fn(&mut P, &SetupContext) -> Result<(), HookError> + Send + Sync,
{
    fn call(&self, pod: &mut P, ctx: &SetupContext) -> Result<(), HookError> {
        (self.0)(pod, ctx)
    }
}

/// A hook of an embedded group, called through the outer pod.
struct LiftedHook<P, Q> {
    outer: fn(&mut P) -> &mut Q,
    inner: Arc<dyn FilterHook<Q>>,
}

impl<P: 'static, Q: 'static> FilterHook<P> for LiftedHook<P, Q> {
    fn call(&self, pod: &mut P, ctx: &SetupContext) -> Result<(), HookError> {
        self.inner.call((self.outer)(pod), ctx)
    }
}

/// An entry of a pod type's method table.
///
/// Created through [`IntoMethod`]; only methods with [`FILTER_SIGNATURE`]
/// can back a filter entry, but others may be registered and are reported as
/// a signature mismatch when a filter names them.
pub struct Method<P> {
    signature: &'static str,
    hook: Option<Arc<dyn FilterHook<P>>>,
}

impl<P> Method<P> {
    /// Returns the signature the method was registered with.
    #[must_use]
    pub fn signature(&self) -> &'static str {
        self.signature
    }

    /// Returns true if the method can back a filter entry.
    #[must_use]
    pub fn is_filter_hook(&self) -> bool {
        self.hook.is_some()
    }

    pub(crate) fn hook(&self) -> Option<&Arc<dyn FilterHook<P>>> {
        self.hook.as_ref()
    }
}

impl<P> Clone for Method<P> {
    fn clone(&self) -> Self {
        Self {
            signature: self.signature,
            hook: self.hook.clone(),
        }
    }
}

impl<P> fmt::Debug for Method<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Conversion of a function into a method table entry.
///
/// The `Marker` parameter only disambiguates the accepted signatures.
pub trait IntoMethod<P, Marker> {
    /// Wraps the function.
    fn into_method(self) -> Method<P>;
}

/// Marker for `fn(&mut Self, &SetupContext) -> Result<(), HookError>`.
#[doc(hidden)]
pub struct FilterSignature;

/// Marker for `fn(&mut Self) -> Result<(), HookError>`.
#[doc(hidden)]
pub struct NoContextSignature;

/// Marker for `fn(&mut Self, &SetupContext)`.
#[doc(hidden)]
pub struct InfallibleSignature;

impl<P, F> IntoMethod<P, FilterSignature> for F
where
    P: 'static,
    F: Fn(&mut P, &SetupContext) -> Result<(), HookError> + Send + Sync + 'static,
{
    fn into_method(self) -> Method<P> {
        Method {
            signature: FILTER_SIGNATURE,
            hook: Some(Arc::new(FnHook(self))),
        }
    }
}

impl<P, F> IntoMethod<P, NoContextSignature> for F
where
    F: Fn(&mut P) -> Result<(), HookError> + Send + Sync + 'static,
{
    fn into_method(self) -> Method<P> {
        Method {
            signature: "fn(&mut Self) -> Result<(), HookError>",
            hook: None,
        }
    }
}

impl<P, F> IntoMethod<P, InfallibleSignature> for F
where
    F: Fn(&mut P, &SetupContext) + Send + Sync + 'static,
{
    fn into_method(self) -> Method<P> {
        Method {
            signature: "fn(&mut Self, &SetupContext)",
            hook: None,
        }
    }
}

type MethodTable<P> = HashMap<&'static str, Method<P>>;

// ─────────────────────────────────────────────────────────────────────────────
// Descriptor
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Record,
    Opaque,
}

struct FieldDecl<P> {
    role: Role,
    segments: Vec<&'static str>,
    visibility: Visibility,
    tag: String,
    field_type: TypeInfo,
    value_type: TypeInfo,
    indirect: bool,
    access: Arc<dyn FieldAccess<P>>,
    group: usize,
}

/// The entry table of a pod type.
pub struct Descriptor<P> {
    shape: Shape,
    fields: Vec<FieldDecl<P>>,
    /// Method tables; index 0 is `P`'s own, the rest come from embedded groups.
    groups: Vec<MethodTable<P>>,
}

impl<P: 'static> Descriptor<P> {
    /// Creates an empty descriptor for a record type.
    #[must_use]
    pub fn record() -> Self {
        Self::with_shape(Shape::Record)
    }

    /// Creates a descriptor for a type that is not a record.
    ///
    /// Pods with an opaque descriptor are rejected at registration.
    #[must_use]
    pub fn opaque() -> Self {
        Self::with_shape(Shape::Opaque)
    }

    fn with_shape(shape: Shape) -> Self {
        Self {
            shape,
            fields: Vec::new(),
            groups: vec![MethodTable::new()],
        }
    }

    /// Returns true if this descriptor describes a record.
    #[must_use]
    pub fn is_record(&self) -> bool {
        self.shape == Shape::Record
    }

    /// Returns the number of declared entries, embedded ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no entries are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Declares an import entry.
    ///
    /// `tag` is the identifier to import; empty matches by value type.
    pub fn import<V>(
        &mut self,
        field: impl Into<Field>,
        tag: &str,
        access: fn(&mut P) -> &mut Import<V>,
    ) -> &mut Self
    where
        V: Clone + Send + Sync + 'static,
    {
        self.declare(Role::Import, field.into(), tag, access)
    }

    /// Declares an export entry.
    ///
    /// `tag` is the identifier to publish under; empty publishes by value type.
    pub fn export<V>(
        &mut self,
        field: impl Into<Field>,
        tag: &str,
        access: fn(&mut P) -> &mut Export<V>,
    ) -> &mut Self
    where
        V: Send + Sync + 'static,
    {
        self.declare(Role::Export, field.into(), tag, access)
    }

    /// Declares a filter entry.
    ///
    /// `tag` is `identifier,method,priority`. The field is expected to be a
    /// [`Filter`](crate::slot::Filter) slot; any other slot type is accepted
    /// here and rejected at registration.
    pub fn filter<F: TypedSlot>(
        &mut self,
        field: impl Into<Field>,
        tag: &str,
        access: fn(&mut P) -> &mut F,
    ) -> &mut Self {
        self.declare(Role::Filter, field.into(), tag, access)
    }

    /// Registers a method that filter tags can name.
    pub fn method<M>(&mut self, name: &'static str, method: impl IntoMethod<P, M>) -> &mut Self {
        self.groups[0].insert(name, method.into_method());
        self
    }

    /// Splices the entries of an embedded group under `name`.
    ///
    /// Embedding a type whose descriptor is opaque adds nothing.
    pub fn embed<Q: Entries>(
        &mut self,
        name: &'static str,
        access: fn(&mut P) -> &mut Q,
    ) -> &mut Self {
        let inner = Q::entries();
        if inner.shape == Shape::Opaque {
            return self;
        }

        let base = self.groups.len();
        for table in inner.groups {
            let lifted = table
                .into_iter()
                .map(|(method_name, method)| {
                    let hook = method.hook.map(|inner| {
                        let lifted: Arc<dyn FilterHook<P>> =
                            Arc::new(LiftedHook { outer: access, inner });
                        lifted
                    });
                    let method = Method {
                        signature: method.signature,
                        hook,
                    };
                    (method_name, method)
                })
                .collect();
            self.groups.push(lifted);
        }

        for decl in inner.fields {
            let mut segments = Vec::with_capacity(decl.segments.len() + 1);
            segments.push(name);
            segments.extend(decl.segments);

            self.fields.push(FieldDecl {
                role: decl.role,
                segments,
                visibility: decl.visibility,
                tag: decl.tag,
                field_type: decl.field_type,
                value_type: decl.value_type,
                indirect: decl.indirect,
                access: Arc::new(Nested {
                    outer: access,
                    inner: decl.access,
                }),
                group: base + decl.group,
            });
        }

        self
    }

    fn declare<F: TypedSlot>(
        &mut self,
        role: Role,
        field: Field,
        tag: &str,
        access: fn(&mut P) -> &mut F,
    ) -> &mut Self {
        self.fields.push(FieldDecl {
            role,
            segments: vec![field.name],
            visibility: field.visibility,
            tag: tag.to_owned(),
            field_type: TypeInfo::of::<F>(),
            value_type: TypeInfo::of::<F::Value>(),
            indirect: F::INDIRECT,
            access: Arc::new(Direct { access }),
            group: 0,
        });
        self
    }

    /// Flattens the descriptor into raw entry declarations.
    ///
    /// Paths are `<type name of P>.<field>[.<field>...]`; tag arguments are
    /// split on `,` and trimmed.
    pub(crate) fn extract(self) -> Extracted<P> {
        let type_name = type_name::<P>();

        let entries = self
            .fields
            .into_iter()
            .map(|decl| {
                let mut path = String::from(type_name);
                for segment in &decl.segments {
                    path.push('.');
                    path.push_str(segment);
                }

                RawEntry {
                    role: decl.role,
                    path,
                    visibility: decl.visibility,
                    args: decl.tag.split(',').map(|arg| arg.trim().to_owned()).collect(),
                    field_type: decl.field_type,
                    value_type: decl.value_type,
                    indirect: decl.indirect,
                    access: decl.access,
                    group: decl.group,
                }
            })
            .collect();

        Extracted {
            record: self.shape == Shape::Record,
            entries,
            groups: self.groups,
        }
    }
}

impl<P> fmt::Debug for Descriptor<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("shape", &self.shape)
            .field("fields", &self.fields.len())
            .field("groups", &self.groups.len())
            .finish()
    }
}

/// A raw entry declaration, before validation.
pub(crate) struct RawEntry<P> {
    pub(crate) role: Role,
    pub(crate) path: String,
    pub(crate) visibility: Visibility,
    /// Tag arguments; always at least one (the identifier).
    pub(crate) args: Vec<String>,
    pub(crate) field_type: TypeInfo,
    pub(crate) value_type: TypeInfo,
    pub(crate) indirect: bool,
    pub(crate) access: Arc<dyn FieldAccess<P>>,
    /// Index of the method table the entry's methods resolve against.
    pub(crate) group: usize,
}

/// The flattened form of a [`Descriptor`].
pub(crate) struct Extracted<P> {
    pub(crate) record: bool,
    pub(crate) entries: Vec<RawEntry<P>>,
    pub(crate) groups: Vec<HashMap<&'static str, Method<P>>>,
}
