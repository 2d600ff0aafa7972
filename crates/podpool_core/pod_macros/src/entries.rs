//! Derive macro for the `Entries` trait.

use darling::ast::Data;
use darling::util::{Flag, Override};
use darling::{FromDeriveInput, FromField};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{DeriveInput, Ident, parse_macro_input};

use crate::crate_path::podpool_core_path;

/// Parsed container for the macro.
#[derive(FromDeriveInput)]
#[darling(attributes(pod), supports(struct_named))]
struct EntriesInput {
    ident: Ident,
    generics: syn::Generics,
    data: Data<(), PodField>,
}

/// Parsed `#[pod(...)]` attribute of one field.
#[derive(FromField)]
#[darling(attributes(pod))]
struct PodField {
    ident: Option<Ident>,
    vis: syn::Visibility,

    /// `import` or `import = "id"`.
    import: Option<Override<String>>,

    /// `export` or `export = "id"`.
    export: Option<Override<String>>,

    /// `filter = "id,method,priority"`.
    filter: Option<String>,

    /// Splice the field type's own entries.
    embed: Flag,
}

/// What a field contributes to the descriptor.
enum Role {
    Import(String),
    Export(String),
    Filter(String),
    Embed,
}

impl PodField {
    fn role(&self) -> darling::Result<Option<Role>> {
        let mut roles = Vec::new();
        if let Some(tag) = &self.import {
            roles.push(Role::Import(tag_of(tag)));
        }
        if let Some(tag) = &self.export {
            roles.push(Role::Export(tag_of(tag)));
        }
        if let Some(tag) = &self.filter {
            roles.push(Role::Filter(tag.clone()));
        }
        if self.embed.is_present() {
            roles.push(Role::Embed);
        }

        if roles.len() > 1 {
            let err = darling::Error::custom(
                "a field takes at most one of `import`, `export`, `filter` or `embed`",
            );
            return Err(match &self.ident {
                Some(ident) => err.with_span(ident),
                None => err,
            });
        }
        Ok(roles.pop())
    }
}

fn tag_of(tag: &Override<String>) -> String {
    match tag {
        Override::Inherit => String::new(),
        Override::Explicit(tag) => tag.clone(),
    }
}

/// Returns the method segment of a filter tag if it names a Rust method.
fn filter_method(tag: &str) -> Option<Ident> {
    let name = tag.split(',').nth(1)?.trim();
    syn::parse_str::<Ident>(name).ok()
}

/// Implementation of the `#[derive(Entries)]` macro.
pub(crate) fn derive_entries(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let args = match EntriesInput::from_derive_input(&input) {
        Ok(args) => args,
        Err(err) => return err.write_errors().into(),
    };

    match expand(&args) {
        Ok(expanded) => expanded.into(),
        Err(err) => err.write_errors().into(),
    }
}

fn expand(args: &EntriesInput) -> darling::Result<TokenStream2> {
    let core = podpool_core_path();
    let name = &args.ident;
    let (impl_generics, ty_generics, where_clause) = args.generics.split_for_impl();

    let fields = args
        .data
        .as_ref()
        .take_struct()
        .expect("struct_named is enforced by darling")
        .fields;

    let mut errors = darling::Error::accumulator();
    let mut declarations = Vec::new();
    let mut methods: Vec<Ident> = Vec::new();

    for field in fields {
        let Some(role) = errors.handle(field.role()).flatten() else {
            continue;
        };
        let Some(ident) = &field.ident else {
            continue;
        };

        let field_name = ident.unraw().to_string();
        let visibility = match field.vis {
            syn::Visibility::Inherited => quote!(#core::descriptor::Visibility::Private),
            _ => quote!(#core::descriptor::Visibility::Public),
        };
        let declared = quote!(#core::descriptor::Field::new(#field_name, #visibility));
        let access = quote!(|pod| &mut pod.#ident);

        declarations.push(match role {
            Role::Import(tag) => quote! {
                descriptor.import(#declared, #tag, #access);
            },
            Role::Export(tag) => quote! {
                descriptor.export(#declared, #tag, #access);
            },
            Role::Filter(tag) => {
                if let Some(method) = filter_method(&tag)
                    && !methods.contains(&method)
                {
                    methods.push(method);
                }
                quote! {
                    descriptor.filter(#declared, #tag, #access);
                }
            }
            Role::Embed => quote! {
                descriptor.embed(#field_name, #access);
            },
        });
    }

    errors.finish()?;

    let registrations = methods.iter().map(|method| {
        let method_name = method.unraw().to_string();
        quote! {
            descriptor.method(#method_name, Self::#method);
        }
    });

    Ok(quote! {
        impl #impl_generics #core::descriptor::Entries for #name #ty_generics #where_clause {
            fn entries() -> #core::descriptor::Descriptor<Self> {
                let mut descriptor = #core::descriptor::Descriptor::<Self>::record();
                #(#declarations)*
                #(#registrations)*
                descriptor
            }
        }
    })
}
