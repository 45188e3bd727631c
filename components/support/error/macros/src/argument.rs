/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */
use quote::ToTokens;
use syn::{spanned::Spanned, Meta, NestedMeta};

const USAGE: &str = "Expected #[handle_error(ErrorName)]";

/// The internal error type named in the attribute.
pub(crate) fn parse(arguments: &syn::AttributeArgs) -> syn::Result<proc_macro2::TokenStream> {
    match arguments.as_slice() {
        [NestedMeta::Meta(Meta::Path(path))] => Ok(path.to_token_stream()),
        [other] => Err(syn::Error::new(other.span(), USAGE)),
        _ => Err(syn::Error::new(proc_macro2::Span::call_site(), USAGE)),
    }
}
