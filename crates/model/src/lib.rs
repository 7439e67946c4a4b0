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

//! Domain model for the IoT application SDK.
//!
//! The `iotsdk-model` crate defines the identifiers and message types exchanged
//! with the broker:
//!
//! - Application and device identifiers, including the wildcard device.
//! - Inbound uplink, event and activation messages.
//! - Outbound downlink messages.
//! - The message classes which partition inbound traffic per device.
//!
//! # Feature flags
//!
//! - `stubs`: Enables `rstest` fixtures for use in downstream test suites.

#![warn(rustc::all)]
#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod enums;
pub mod identifiers;
pub mod messages;
