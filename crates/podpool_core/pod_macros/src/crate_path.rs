//! Where generated `Entries` impls find `podpool_core`.
//!
//! Pods are declared either next to a direct `podpool_core` dependency or
//! behind the `podpool` umbrella, which re-exports it as
//! `podpool::podpool_core`. Inside `podpool_core` itself the name resolves
//! through `extern crate self as podpool_core`.

use proc_macro_crate::{FoundCrate, crate_name};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

const CORE: &str = "podpool_core";
const UMBRELLA: &str = "podpool";

/// Returns the path prefix for `podpool_core` items in the consuming crate.
///
/// Falls back to the bare crate name, so a missing dependency shows up as an
/// unresolved `podpool_core` path at the derive site.
pub(crate) fn podpool_core_path() -> TokenStream {
    if let Ok(found) = crate_name(CORE) {
        return match found {
            FoundCrate::Itself => quote!(podpool_core),
            FoundCrate::Name(renamed) => {
                let core = format_ident!("{}", renamed);
                quote!(#core)
            }
        };
    }

    match crate_name(UMBRELLA) {
        Ok(FoundCrate::Name(umbrella)) => {
            let umbrella = format_ident!("{}", umbrella);
            quote!(#umbrella::podpool_core)
        }
        _ => quote!(podpool_core),
    }
}
