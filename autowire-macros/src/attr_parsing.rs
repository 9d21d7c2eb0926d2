use quote::ToTokens;
use syn::{
    parse::{Parse, ParseStream},
    Token,
};

fn specified_more_than_once(kw: &impl ToTokens) -> syn::Error {
    let kw_name = kw.to_token_stream().to_string();
    syn::Error::new_spanned(kw, ["`", &kw_name, "` specified more than once"].concat())
}

/// Parses `kw` or `kw = value`
pub(crate) fn parse_optional_assignment_attribute<K, T>(input: ParseStream<'_>, out: &mut Option<(K, Option<T>)>) -> syn::Result<()>
where
    K: Parse + ToTokens,
    T: Parse,
{
    let kw = input.parse::<K>()?;
    let inner = if input.peek(Token![=]) {
        input.parse::<Token![=]>()?;
        Some(input.parse()?)
    } else {
        None
    };

    if out.is_some() {
        return Err(specified_more_than_once(&kw));
    }

    *out = Some((kw, inner));

    Ok(())
}

pub(crate) trait Combine: Sized {
    fn combine(self, other: Self) -> syn::Result<Self>;
}

pub(crate) fn parse_attrs<T>(ident: &str, attrs: &[syn::Attribute]) -> Option<Result<T, (syn::Error, syn::Attribute)>>
where
    T: Combine + Parse,
{
    let mut iter = attrs
        .iter()
        .filter(|attr| attr.meta.path().is_ident(ident))
        .map(|attr| (attr, attr.parse_args::<T>()));

    let first = match iter.next() {
        Some((_, Ok(first))) => first,
        Some((attr, Err(err))) => return Some(Err((err, attr.clone()))),
        None => return None,
    };

    let result = iter.try_fold(first, |out, (attr, next_result)| match next_result {
        Ok(next) => out.combine(next).map_err(|err| (err, attr.clone())),
        Err(err) => Err((err, attr.clone())),
    });

    Some(result)
}

pub(crate) fn combine_attribute<K, T>(a: &mut Option<(K, T)>, b: Option<(K, T)>) -> syn::Result<()>
where
    K: ToTokens,
{
    if let Some((kw, inner)) = b {
        if a.is_some() {
            return Err(specified_more_than_once(&kw));
        }
        *a = Some((kw, inner));
    }
    Ok(())
}
