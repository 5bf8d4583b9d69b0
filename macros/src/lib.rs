//! Derive macros for `stratum`.

use proc_macro::TokenStream;
use syn::Path;

mod bundle;
mod component;
mod resource;

/// Implements `Component` for a type.
///
/// Required components are declared with `#[require(...)]`, either as a type
/// that implements `Default` or as `Type = expression`:
///
/// ```ignore
/// #[derive(Component)]
/// #[require(Transform, Health = Health(100))]
/// struct Player;
/// ```
#[proc_macro_derive(Component, attributes(require))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    component::derive(input)
}

/// Implements `Bundle` for a struct whose fields are all bundles.
#[proc_macro_derive(Bundle)]
pub fn derive_bundle(input: TokenStream) -> TokenStream {
    bundle::derive(input)
}

/// Implements `Resource` for a type.
#[proc_macro_derive(Resource)]
pub fn derive_resource(input: TokenStream) -> TokenStream {
    resource::derive(input)
}

fn crate_path() -> syn::Result<Path> {
    syn::parse_str(option_env!("STRATUM_PATH").unwrap_or("stratum"))
}
