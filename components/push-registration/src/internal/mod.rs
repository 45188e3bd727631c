/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

pub mod config;
pub mod identity;
pub mod listener;
pub mod publisher;
pub mod push_manager;
pub mod service;
pub mod storage;
pub mod token;

pub use config::RegistrationConfiguration;
pub use publisher::Publisher;
pub use push_manager::RegistrationManager;
