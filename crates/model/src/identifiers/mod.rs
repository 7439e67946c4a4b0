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

//! Identifiers for the application and device domain model.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[macro_use]
mod macros;

pub mod app_id;
pub mod dev_id;

#[cfg(any(test, feature = "stubs"))]
pub mod stubs;

// Re-exports
pub use crate::identifiers::{
    app_id::AppId,
    dev_id::{DevId, WILDCARD_DEVICE_ID},
};

/// Characters reserved by the broker topic layout.
pub(crate) const TOPIC_RESERVED_CHARS: [char; 3] = ['/', '#', '+'];

impl_from_str_for_identifier!(app_id::AppId);
impl_from_str_for_identifier!(dev_id::DevId);

impl_serialization_for_identifier!(app_id::AppId);
impl_serialization_for_identifier!(dev_id::DevId);

impl_as_ref_for_identifier!(app_id::AppId);
impl_as_ref_for_identifier!(dev_id::DevId);

impl_display_for_identifier!(app_id::AppId);
impl_display_for_identifier!(dev_id::DevId);
