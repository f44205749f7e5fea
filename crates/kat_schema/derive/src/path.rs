//! Paths of `kat_schema` items named by generated code.

use proc_macro2::TokenStream;
use quote::quote;

/// Path of the `kat_schema` crate as seen from the calling crate.
///
/// Reading the manifest is costly, so the path is computed once per
/// derive and passed around.
pub(crate) fn kat_schema() -> syn::Path {
    kat_macro_utils::Manifest::shared(|manifest| manifest.get_crate_path("kat_schema"))
}

#[inline(always)]
pub(crate) fn info_(kat_schema: &syn::Path) -> TokenStream {
    quote! { #kat_schema::info }
}

#[inline(always)]
pub(crate) fn schema_(kat_schema: &syn::Path) -> TokenStream {
    quote! { #kat_schema::schema }
}

#[inline(always)]
pub(crate) fn arguments_(kat_schema: &syn::Path) -> TokenStream {
    quote! { #kat_schema::access::Arguments }
}

#[inline(always)]
pub(crate) fn codec_error_(kat_schema: &syn::Path) -> TokenStream {
    quote! { #kat_schema::error::CodecError }
}

#[cfg(feature = "auto_register")]
#[inline(always)]
pub(crate) fn auto_register_(kat_schema: &syn::Path) -> TokenStream {
    quote! { #kat_schema::__macro_exports::auto_register }
}
