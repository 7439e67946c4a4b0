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

//! The contract between the SDK and a publish/subscribe broker.
//!
//! A [`BrokerConnector`] creates one [`BrokerClient`] per connection. The client
//! owns the transport and dispatches inbound publishes to the
//! [`DeliveryHandler`] registered for the matching subscription filter.

use std::{
    fmt::{Debug, Formatter},
    sync::Arc,
    time::Duration,
};

use iotsdk_model::identifiers::AppId;

use crate::address::BrokerAddress;

/// Callback invoked by the broker client for each inbound publish.
///
/// Arguments are the concrete topic and the raw payload. The handler runs on the
/// broker client's delivery path and must never block.
pub type DeliveryHandler = Arc<dyn Fn(&str, &[u8]) + Send + Sync>;

/// Error reported by a broker operation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BrokerError {
    /// The broker refused the request (bad credentials, denied topic).
    #[error("Broker rejected request: {0}")]
    Rejected(String),
    /// The client is not connected.
    #[error("Broker client is not connected")]
    NotConnected,
    /// The broker did not acknowledge the request in time.
    #[error("Broker request timed out: {0}")]
    Timeout(String),
    /// The transport failed.
    #[error("Broker transport error: {0}")]
    Transport(String),
}

/// Options for creating a broker client.
#[derive(Clone)]
pub struct BrokerOptions {
    /// The client name presented to the broker.
    pub client_name: String,
    /// The application the client authenticates as.
    pub app_id: AppId,
    /// The access key used as the password.
    pub access_key: String,
    /// The validated broker address, which selects the transport.
    pub address: BrokerAddress,
    /// The maximum time to wait for the broker to acknowledge a connect.
    pub connect_timeout: Duration,
}

impl Debug for BrokerOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(BrokerOptions))
            .field("client_name", &self.client_name)
            .field("app_id", &self.app_id)
            .field("access_key", &"<redacted>")
            .field("address", &self.address)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// A connection to a publish/subscribe broker.
///
/// Every operation completes once the broker has acknowledged it, reporting the
/// broker's error otherwise.
#[async_trait::async_trait]
pub trait BrokerClient: Send + Sync {
    /// Opens the connection.
    async fn connect(&self) -> Result<(), BrokerError>;

    /// Closes the connection, dropping all of its subscriptions.
    async fn disconnect(&self) -> Result<(), BrokerError>;

    /// Subscribes `handler` to every topic matching `filter`.
    ///
    /// Subscribing to a filter which is already subscribed replaces its handler.
    async fn subscribe(&self, filter: &str, handler: DeliveryHandler) -> Result<(), BrokerError>;

    /// Removes the subscription for `filter`.
    async fn unsubscribe(&self, filter: &str) -> Result<(), BrokerError>;

    /// Publishes `payload` on `topic`.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BrokerError>;
}

/// Creates broker clients.
///
/// Implementations select the transport from [`BrokerOptions::address`].
pub trait BrokerConnector: Send + Sync {
    /// Creates a new, not yet connected, client.
    fn create_client(&self, options: BrokerOptions) -> Arc<dyn BrokerClient>;
}
