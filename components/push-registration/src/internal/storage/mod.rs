/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Handles push registration storage
//!
//! Mainly exposes a trait, [`Storage`] and a concrete type that implements the trait, [`Store`]
//!
//! [`Storage`] is a small durable key-value store. The registration manager keeps its
//! [`EndpointRecord`] in it: the endpoint handle, the confirmed and desired enabled flags and
//! the platform application the values belong to.

mod db;
mod record;
mod schema;

pub use self::{
    db::{RegistrationDb as Store, Storage},
    record::EndpointRecord,
};
