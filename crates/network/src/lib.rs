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

//! Broker transport machinery for the IoT application SDK.
//!
//! The `iotsdk-network` crate defines the contract between the SDK and a
//! publish/subscribe broker, and the plumbing shared by every transport:
//!
//! - The [`broker::BrokerClient`] and [`broker::BrokerConnector`] traits.
//! - Broker address parsing with plain/secure transport selection.
//! - The device topic layout and MQTT-style filter matching.
//! - An in-memory loopback broker for running applications without a network.

#![warn(rustc::all)]
#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod address;
pub mod broker;
pub mod memory;
pub mod mode;
pub mod topic;
