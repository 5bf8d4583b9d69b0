use proc_macro::TokenStream;
use proc_macro2::Literal;
use quote::{quote, ToTokens};
use syn::parse::{Parse, ParseStream};
use syn::{
    parse_macro_input,
    Data,
    DataStruct,
    DeriveInput,
    Field,
    Fields,
    Generics,
    Ident,
    Path,
};

use crate::crate_path;

pub fn derive(input: TokenStream) -> TokenStream {
    let DeriveBundle { ident, generics, fields, crate_path } =
        parse_macro_input!(input);

    let (impl_generics, type_generics, where_clause) =
        generics.split_for_impl();

    // `(T::components(list), T::write(self.t, writer))`
    let (components, writes): (Vec<_>, Vec<_>) = fields
        .into_iter()
        .enumerate()
        .map(|(i, Field { ident, ty, .. })| {
            let field_ident = ident.map(FieldIdent::Named).unwrap_or(
                FieldIdent::Indexed(Literal::usize_unsuffixed(i)),
            );

            (
                quote! {
                    <#ty as ::#crate_path::component::Bundle>::components(list);
                },
                quote! {
                    <#ty as ::#crate_path::component::Bundle>::write(
                        self.#field_ident,
                        writer,
                    );
                },
            )
        })
        .unzip();

    quote! {
        #[automatically_derived]
        unsafe impl #impl_generics ::#crate_path::component::Bundle
            for #ident #type_generics
        #where_clause
        {
            #[allow(unused)]
            fn components(list: &mut ::#crate_path::component::ComponentList) {
                #(#components)*
            }

            #[allow(unused)]
            fn write(
                self,
                writer: &mut ::#crate_path::component::ComponentWriter<'_>,
            ) {
                #(#writes)*
            }
        }
    }
    .into()
}

struct DeriveBundle {
    ident: Ident,
    generics: Generics,
    fields: Fields,
    crate_path: Path,
}

enum FieldIdent {
    Named(Ident),
    Indexed(Literal),
}

impl Parse for DeriveBundle {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let DeriveInput { ident, generics, data, .. } = input.parse()?;
        let Data::Struct(DataStruct { fields, .. }) = data else {
            return Err(input.error("`Bundle` can only be derived for structs"));
        };
        let crate_path = crate_path()?;

        Ok(Self { ident, generics, fields, crate_path })
    }
}

impl ToTokens for FieldIdent {
    fn to_tokens(&self, tokens: &mut proc_macro2::TokenStream) {
        match self {
            Self::Named(ident) => ident.to_tokens(tokens),
            Self::Indexed(literal) => literal.to_tokens(tokens),
        }
    }
}
