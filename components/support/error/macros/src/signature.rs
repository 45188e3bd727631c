/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */
use syn::{spanned::Spanned, GenericArgument, PathArguments, ReturnType, Type};

const WRONG_RETURN_TYPE_MSG: &str = "Expected Result<T> or Result<T, E>";

/// The `T` of a function returning `Result<T>` or `Result<T, E>` (or any alias of that shape).
pub(crate) fn ok_type(sig: &syn::Signature) -> syn::Result<Type> {
    let typ = match &sig.output {
        ReturnType::Type(_, typ) => typ,
        ReturnType::Default => return Err(syn::Error::new(sig.span(), WRONG_RETURN_TYPE_MSG)),
    };
    let type_path = match typ.as_ref() {
        Type::Path(type_path) => type_path,
        other => return Err(syn::Error::new(other.span(), WRONG_RETURN_TYPE_MSG)),
    };
    let seg = type_path
        .path
        .segments
        .last()
        .ok_or_else(|| syn::Error::new(type_path.span(), WRONG_RETURN_TYPE_MSG))?;
    match &seg.arguments {
        PathArguments::AngleBracketed(generic_args) => match generic_args.args.first() {
            Some(GenericArgument::Type(t)) => Ok(t.clone()),
            Some(other) => Err(syn::Error::new(other.span(), WRONG_RETURN_TYPE_MSG)),
            None => Err(syn::Error::new(generic_args.span(), WRONG_RETURN_TYPE_MSG)),
        },
        _ => Err(syn::Error::new(seg.span(), WRONG_RETURN_TYPE_MSG)),
    }
}
