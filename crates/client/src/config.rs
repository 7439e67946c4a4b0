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

//! Configuration for the client.

use std::{
    fmt::{Debug, Formatter},
    time::Duration,
};

use iotsdk_core::correctness::check_usize_in_range_inclusive;
use iotsdk_model::identifiers::AppId;
use serde::{Deserialize, Serialize};

/// The default capacity of each topic channel's buffer.
pub const DEFAULT_BUFFER_CAPACITY: usize = 10;

/// The largest buffer capacity a topic channel supports.
pub const MAX_BUFFER_CAPACITY: usize = tokio::sync::Semaphore::MAX_PERMITS;

/// Checks `capacity` is a usable topic channel buffer capacity.
///
/// # Errors
///
/// Returns an error if `capacity` is zero or exceeds [`MAX_BUFFER_CAPACITY`].
pub fn check_buffer_capacity(capacity: usize) -> anyhow::Result<()> {
    check_usize_in_range_inclusive(capacity, 1, MAX_BUFFER_CAPACITY, "buffer_capacity")
}

/// Configuration for a [`Client`](crate::client::Client).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// The client name presented to the broker.
    pub client_name: String,
    /// The application the client acts for.
    pub app_id: String,
    /// The application access key.
    pub app_access_key: String,
    /// The number of undrained messages each topic channel buffers before dropping.
    pub buffer_capacity: usize,
    /// The maximum time to wait for the broker to acknowledge a connect.
    pub connect_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_name: "iotsdk-rust".to_string(),
            app_id: String::new(),
            app_access_key: String::new(),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            connect_timeout_ms: 10_000,
        }
    }
}

impl Debug for ClientConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(ClientConfig))
            .field("client_name", &self.client_name)
            .field("app_id", &self.app_id)
            .field("app_access_key", &"<redacted>")
            .field("buffer_capacity", &self.buffer_capacity)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .finish()
    }
}

impl ClientConfig {
    /// Creates a new [`ClientConfig`] for the given application.
    #[must_use]
    pub fn new(app_id: impl Into<String>, app_access_key: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_access_key: app_access_key.into(),
            ..Default::default()
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the application ID is invalid or the buffer capacity
    /// is out of range.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.app_id()?;
        check_buffer_capacity(self.buffer_capacity)?;
        Ok(())
    }

    /// Returns the validated application ID.
    ///
    /// # Errors
    ///
    /// Returns an error if `app_id` is not a valid application ID.
    pub fn app_id(&self) -> anyhow::Result<AppId> {
        AppId::new_checked(&self.app_id)
    }

    /// Returns the connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}
