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

//! Core foundational types and utilities for the IoT application SDK.
//!
//! The `iotsdk-core` crate is deliberately small. It supplies the building blocks
//! shared by the model, network and client crates:
//!
//! - Hierarchical cancellation scopes used to tear down subscription trees.
//! - Correctness checks for identifier and configuration values.
//! - Async test helpers for eventually-consistent assertions.

#![warn(rustc::all)]
#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod correctness;
pub mod scope;
pub mod testing;

// Re-exports
pub use crate::scope::{CancellationScope, ScopeCancelled};

/// Message for when a lock guard cannot be acquired due to poisoning.
///
/// A poisoned lock indicates a thread panicked while holding it, meaning the
/// protected data may be in an inconsistent state. Propagating the panic is
/// preferred over continuing with potentially corrupted state.
pub const MUTEX_POISONED: &str = "Mutex poisoned";
