// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2025 iotsdk contributors. All rights reserved.
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Client-side pub/sub runtime for the IoT application SDK.
//!
//! The `iotsdk-client` crate maintains one shared broker connection per
//! application and exposes live, per-device streams of inbound messages plus a
//! downlink publish operation:
//!
//! - [`client::Client`] is the entry point, built from a [`config::ClientConfig`],
//!   a [`discovery::Discovery`] collaborator and a broker connector.
//! - [`connection::ConnectionGuard`] lazily establishes the shared connection.
//! - [`pubsub::ApplicationScope`] and [`pubsub::DeviceScope`] form a cancellation
//!   tree; closing a scope tears down every subscription beneath it.
//! - [`pubsub::TopicChannel`] buffers deliveries without ever blocking the
//!   broker, dropping messages once its buffer is full.
//! - [`registry::DeviceManager`] wraps the device registry collaborator.

#![warn(rustc::all)]
#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod client;
pub mod config;
pub mod connection;
pub mod discovery;
pub mod error;
pub mod pubsub;
pub mod registry;

// Re-exports
pub use crate::{
    client::Client,
    config::ClientConfig,
    error::ClientError,
};
