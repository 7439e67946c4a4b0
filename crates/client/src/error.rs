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

//! Error taxonomy for client operations.

use iotsdk_core::ScopeCancelled;
use iotsdk_network::{address::AddressError, broker::BrokerError};

/// Error returned by a client operation.
///
/// Every error is final for the call which returned it; the client never retries
/// internally. The type is `Clone` so a single failed connect attempt can be
/// reported to every caller which waited on it.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// The broker or registry address is missing or malformed, or the client
    /// configuration is invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Resolving the application's endpoints failed.
    #[error("Discovery failed: {0}")]
    Discovery(String),
    /// The transport failed to connect or disconnect.
    #[error("Connection failed: {0}")]
    Connection(BrokerError),
    /// The broker rejected a subscribe or unsubscribe request.
    #[error("Subscription failed: {0}")]
    Subscription(BrokerError),
    /// The broker rejected a publish.
    #[error("Publish failed: {0}")]
    Publish(BrokerError),
    /// A message could not be encoded for the wire.
    #[error("Encoding failed: {0}")]
    Encoding(String),
    /// The operation was attempted after its scope was closed.
    #[error(transparent)]
    Cancelled(#[from] ScopeCancelled),
    /// The operation was invoked on a resource which was never initialized.
    #[error("Precondition failed: {0}")]
    Precondition(String),
    /// The device registry reported an error.
    #[error("Registry error: {0}")]
    Registry(String),
}

impl ClientError {
    /// Returns whether this is a cancellation error.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

impl From<AddressError> for ClientError {
    fn from(value: AddressError) -> Self {
        Self::Configuration(value.to_string())
    }
}
