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

//! Represents a valid device ID, or the wildcard matching every device.

use iotsdk_core::correctness::{FAILED, check_string_excludes, check_valid_string_ascii};
use ustr::Ustr;

use super::TOPIC_RESERVED_CHARS;

/// The reserved device ID matching every device of an application.
pub const WILDCARD_DEVICE_ID: &str = "+";

/// Represents a valid device ID.
///
/// The only ID allowed to contain a reserved topic character is the wildcard
/// [`WILDCARD_DEVICE_ID`], which maps to a single-level topic wildcard.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct DevId(Ustr);

impl DevId {
    /// Creates a new [`DevId`] instance with correctness checking.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not a valid ASCII string, or contains a
    /// reserved topic character while not being the wildcard ID.
    pub fn new_checked<T: AsRef<str>>(value: T) -> anyhow::Result<Self> {
        let value = value.as_ref();
        check_valid_string_ascii(value, stringify!(value))?;
        if value != WILDCARD_DEVICE_ID {
            check_string_excludes(value, &TOPIC_RESERVED_CHARS, stringify!(value))?;
        }
        Ok(Self(Ustr::from(value)))
    }

    /// Creates a new [`DevId`] instance.
    ///
    /// # Panics
    ///
    /// Panics if `value` is not a valid device ID.
    pub fn new<T: AsRef<str>>(value: T) -> Self {
        Self::new_checked(value).expect(FAILED)
    }

    /// Returns the wildcard [`DevId`] matching every device.
    #[must_use]
    pub fn wildcard() -> Self {
        Self(Ustr::from(WILDCARD_DEVICE_ID))
    }

    /// Returns whether this is the wildcard device ID.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.0.as_str() == WILDCARD_DEVICE_ID
    }

    /// Returns the inner identifier value.
    #[must_use]
    pub fn inner(&self) -> Ustr {
        self.0
    }

    /// Returns the inner identifier value as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
