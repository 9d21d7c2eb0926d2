mod attr;

use crate::injectable::attr::{parse_field_attrs, FieldArgs};

use proc_macro2::TokenStream;
use quote::{quote, quote_spanned};
use syn::{ext::IdentExt as _, spanned::Spanned as _, Data, DataEnum, DataStruct, DataUnion, DeriveInput, Error, Field, Fields, LitStr};

fn generate_parameter(name: &LitStr, field: &Field, args: FieldArgs) -> TokenStream {
    let ty = &field.ty;

    match args.default {
        None => quote_spanned! { ty.span() =>
            ::autowire::Parameter::of::<#ty>(#name)
        },
        Some((_, None)) => quote_spanned! { ty.span() =>
            ::autowire::Parameter::with_default_fn(#name, <#ty as ::core::default::Default>::default)
        },
        Some((_, Some(expr))) => quote_spanned! { expr.span() =>
            ::autowire::Parameter::with_default_fn(#name, || -> #ty { #expr })
        },
    }
}

fn generate_build(fields: &Fields) -> TokenStream {
    match fields {
        Fields::Named(_) => {
            let idents = fields.iter().map(|field| &field.ident);
            quote! { Self { #( #idents: arguments.take()?, )* } }
        }
        Fields::Unnamed(_) => {
            let takes = fields.iter().map(|_| quote! { arguments.take()? });
            quote! { Self( #( #takes, )* ) }
        }
        Fields::Unit => quote! { Self },
    }
}

pub(crate) fn expand(input: DeriveInput) -> syn::Result<TokenStream> {
    let DeriveInput {
        ident, generics, data, ..
    } = &input;

    let fields = match data {
        Data::Struct(DataStruct { fields, .. }) => fields,
        Data::Enum(DataEnum { enum_token, .. }) => {
            return Err(Error::new_spanned(enum_token, "#[derive(Injectable)] can only be used on structs"))
        }
        Data::Union(DataUnion { union_token, .. }) => {
            return Err(Error::new_spanned(union_token, "#[derive(Injectable)] can only be used on structs"))
        }
    };

    let params = fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let args = parse_field_attrs(&field.attrs)?;
            let name = match &field.ident {
                Some(ident) => ident.unraw().to_string(),
                None => index.to_string(),
            };
            Ok(generate_parameter(&LitStr::new(&name, field.span()), field, args))
        })
        .collect::<syn::Result<Vec<_>>>()?;
    let build = generate_build(fields);

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::autowire::Injectable for #ident #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn constructor() -> ::autowire::Constructor<Self> {
                ::autowire::Constructor::new(|arguments: &mut ::autowire::Arguments| ::core::result::Result::Ok(#build))
                    #( .param(#params) )*
            }
        }
    })
}
