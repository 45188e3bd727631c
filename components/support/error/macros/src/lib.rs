/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */
use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;

mod argument;
mod signature;

/// `#[handle_error(InternalError)]` on a function returning `Result<T, PublicError>` runs the
/// body as a closure returning `Result<T, InternalError>`, then maps any error through
/// `error_support::convert_log_error`.
#[proc_macro_attribute]
pub fn handle_error(args: TokenStream, input: TokenStream) -> TokenStream {
    let args = syn::parse_macro_input!(args as syn::AttributeArgs);
    let parsed = syn::parse_macro_input!(input as syn::Item);
    TokenStream::from(match impl_handle_error(&args, parsed) {
        Ok(res) => res,
        Err(e) => e.to_compile_error(),
    })
}

fn impl_handle_error(
    arguments: &syn::AttributeArgs,
    input: syn::Item,
) -> syn::Result<proc_macro2::TokenStream> {
    let internal_error = argument::parse(arguments)?;
    let item_fn = match input {
        syn::Item::Fn(item_fn) => item_fn,
        other => {
            return Err(syn::Error::new(
                other.span(),
                "The macro should only be used on functions",
            ))
        }
    };
    let ok_type = signature::ok_type(&item_fn.sig)?;
    let syn::ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = item_fn;

    Ok(quote! {
        #(#attrs)*
        #vis #sig {
            (|| -> ::std::result::Result<#ok_type, #internal_error> #block)()
                .map_err(::error_support::convert_log_error)
        }
    })
}
