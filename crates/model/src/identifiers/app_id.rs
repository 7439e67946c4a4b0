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

//! Represents a valid application ID.

use iotsdk_core::correctness::{FAILED, check_string_excludes, check_valid_string_ascii};
use ustr::Ustr;

use super::TOPIC_RESERVED_CHARS;

/// Represents a valid application ID.
///
/// The application ID is the first level of every broker topic, so it must not
/// contain any of the topic separator or wildcard characters.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct AppId(Ustr);

impl AppId {
    /// Creates a new [`AppId`] instance with correctness checking.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not a valid ASCII string, or contains a
    /// reserved topic character (`/`, `#` or `+`).
    pub fn new_checked<T: AsRef<str>>(value: T) -> anyhow::Result<Self> {
        let value = value.as_ref();
        check_valid_string_ascii(value, stringify!(value))?;
        check_string_excludes(value, &TOPIC_RESERVED_CHARS, stringify!(value))?;
        Ok(Self(Ustr::from(value)))
    }

    /// Creates a new [`AppId`] instance.
    ///
    /// # Panics
    ///
    /// Panics if `value` is not a valid application ID.
    pub fn new<T: AsRef<str>>(value: T) -> Self {
        Self::new_checked(value).expect(FAILED)
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
