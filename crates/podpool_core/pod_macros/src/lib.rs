//! Procedural macros for the `podpool_core` crate.
//!
//! This crate provides `#[derive(Entries)]`, which generates a pod type's
//! entry table from field attributes.
//!
//! # Example
//!
//! ```ignore
//! use podpool_core::prelude::*;
//!
//! #[derive(Default, Entries)]
//! struct Greeter {
//!     #[pod(import = "user_name")]
//!     pub name: Import<String>,
//!     #[pod(export)]
//!     pub greeting: Export<String>,
//! }
//! ```

mod crate_path;
mod entries;

use proc_macro::TokenStream;

/// Derive macro for the `Entries` trait.
///
/// Generates `podpool_core::descriptor::Entries` for a struct with named
/// fields. Each field may carry one `#[pod(...)]` attribute:
///
/// - `import` / `import = "id"`: an [`Import`] slot; without an identifier it
///   matches by value type.
/// - `export` / `export = "id"`: an [`Export`] slot.
/// - `filter = "id,method,priority"`: a [`Filter`] slot. The method named in
///   the tag is registered automatically when it is a valid identifier.
/// - `embed`: splices the entries of the field's type, which must implement
///   `Entries` itself, under the field's name.
///
/// Fields without an attribute are ignored. Private fields produce entries
/// that fail registration, matching hand-written descriptors.
///
/// [`Import`]: https://docs.rs/podpool_core/latest/podpool_core/slot/struct.Import.html
/// [`Export`]: https://docs.rs/podpool_core/latest/podpool_core/slot/struct.Export.html
/// [`Filter`]: https://docs.rs/podpool_core/latest/podpool_core/slot/struct.Filter.html
///
/// # Example
///
/// ```ignore
/// #[derive(Entries)]
/// struct Shouter {
///     #[pod(filter = "the_greeting,shout,10")]
///     pub greeting: Filter<String>,
/// }
///
/// impl Shouter {
///     fn shout(&mut self, _ctx: &SetupContext) -> Result<(), HookError> {
///         Ok(())
///     }
/// }
/// ```
///
/// # Generated Code
///
/// The example above expands to:
///
/// ```ignore
/// impl podpool_core::descriptor::Entries for Shouter {
///     fn entries() -> podpool_core::descriptor::Descriptor<Self> {
///         let mut descriptor = podpool_core::descriptor::Descriptor::<Self>::record();
///         descriptor.filter(
///             podpool_core::descriptor::Field::new(
///                 "greeting",
///                 podpool_core::descriptor::Visibility::Public,
///             ),
///             "the_greeting,shout,10",
///             |pod| &mut pod.greeting,
///         );
///         descriptor.method("shout", Self::shout);
///         descriptor
///     }
/// }
/// ```
#[proc_macro_derive(Entries, attributes(pod))]
pub fn derive_entries(input: TokenStream) -> TokenStream {
    entries::derive_entries(input)
}
