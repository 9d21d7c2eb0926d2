use syn::{
    parse::{Parse, ParseStream},
    Attribute, Expr, Token,
};

use crate::attr_parsing::{combine_attribute, parse_attrs, parse_optional_assignment_attribute, Combine};

#[derive(Default)]
pub(crate) struct FieldArgs {
    pub(super) default: Option<(Token![default], Option<Expr>)>,
}

impl Parse for FieldArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut default = None;

        while !input.is_empty() {
            let lh = input.lookahead1();
            if lh.peek(Token![default]) {
                parse_optional_assignment_attribute(input, &mut default)?;
            } else {
                return Err(lh.error());
            }

            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(Self { default })
    }
}

impl Combine for FieldArgs {
    fn combine(mut self, other: Self) -> syn::Result<Self> {
        let Self { default } = other;
        combine_attribute(&mut self.default, default)?;
        Ok(self)
    }
}

pub(crate) fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldArgs> {
    match parse_attrs("inject", attrs) {
        Some(result) => result.map_err(|(err, attr)| {
            let mut combined = syn::Error::new_spanned(attr, "invalid `inject` attribute");
            combined.combine(err);
            combined
        }),
        None => Ok(FieldArgs::default()),
    }
}
