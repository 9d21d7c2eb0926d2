use proc_macro::TokenStream;
use quote::{quote, ToTokens};
use std::env::var_os;
use syn::parse::Parse;

mod attr_parsing;
mod injectable;

/// Implements `autowire::Injectable` for a struct, one constructor parameter per field.
///
/// Parameters are named after the fields (`0`, `1`, ... for tuple structs) and keep their order.
///
/// Field attributes:
/// - `#[inject(default)]` uses `Default::default()` when the field type isn't constructible
/// - `#[inject(default = expr)]` uses `expr` when the field type isn't constructible
#[proc_macro_derive(Injectable, attributes(inject))]
pub fn derive_injectable(item: TokenStream) -> TokenStream {
    expand_with(item, injectable::expand)
}

fn expand_with<F, I, K>(input: TokenStream, f: F) -> TokenStream
where
    F: FnOnce(I) -> syn::Result<K>,
    I: Parse,
    K: ToTokens,
{
    expand(syn::parse(input).and_then(f))
}

fn expand<T>(result: syn::Result<T>) -> TokenStream
where
    T: ToTokens,
{
    match result {
        Ok(tokens) => {
            let tokens = (quote! { #tokens }).into();
            if var_os("MACROS_DEBUG").is_some() {
                eprintln!("{tokens}");
            }
            tokens
        }
        Err(err) => err.into_compile_error().into(),
    }
}
