use proc_macro::TokenStream;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{
    parse_macro_input,
    Attribute,
    DeriveInput,
    Expr,
    Generics,
    Ident,
    Path,
    Token,
    Type,
};

use crate::crate_path;

pub fn derive(input: TokenStream) -> TokenStream {
    let DeriveComponent { ident, generics, requirements, crate_path } =
        parse_macro_input!(input);
    let (impl_generics, type_generics, where_clause) =
        generics.split_for_impl();

    let required_components = (!requirements.is_empty()).then(|| {
        let requires = requirements.iter().map(|Requirement { ty, value }| {
            match value {
                Some(value) => quote! {
                    required.require::<#ty>(|| #value);
                },
                None => quote! {
                    required.require::<#ty>(
                        <#ty as ::core::default::Default>::default,
                    );
                },
            }
        });

        quote! {
            fn required_components(
                required: &mut ::#crate_path::component::RequiredComponents,
            ) {
                #(#requires)*
            }
        }
    });

    quote! {
        #[automatically_derived]
        impl #impl_generics ::#crate_path::component::Component
            for #ident #type_generics
        #where_clause
        {
            #required_components
        }
    }
    .into()
}

struct DeriveComponent {
    ident: Ident,
    generics: Generics,
    requirements: Vec<Requirement>,
    crate_path: Path,
}

/// `Type` or `Type = expression` in `#[require(...)]`.
struct Requirement {
    ty: Type,
    value: Option<Expr>,
}

impl Parse for DeriveComponent {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let DeriveInput { ident, generics, attrs, .. } = input.parse()?;
        let requirements = parse_requirements(&attrs)?;
        let crate_path = crate_path()?;

        Ok(Self { ident, generics, requirements, crate_path })
    }
}

impl Parse for Requirement {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let ty = input.parse()?;
        let value = if input.peek(Token![=]) {
            input.parse::<Token![=]>()?;

            Some(input.parse()?)
        } else {
            None
        };

        Ok(Self { ty, value })
    }
}

fn parse_requirements(attrs: &[Attribute]) -> syn::Result<Vec<Requirement>> {
    let mut requirements = Vec::new();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("require")) {
        let parsed = attr.parse_args_with(
            Punctuated::<Requirement, Token![,]>::parse_terminated,
        )?;

        requirements.extend(parsed);
    }

    Ok(requirements)
}
