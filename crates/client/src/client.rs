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

//! The client entry point.

use std::{
    fmt::{Debug, Formatter},
    sync::Arc,
};

use iotsdk_model::identifiers::AppId;
use iotsdk_network::{broker::BrokerConnector, mode::ConnectionState};
use tokio::runtime::Handle;

use crate::{
    config::ClientConfig,
    connection::ConnectionGuard,
    discovery::Discovery,
    error::ClientError,
    pubsub::ApplicationScope,
    registry::{DeviceManager, RegistryConnector, RegistryLink},
};

/// The entry point of the SDK for one application.
///
/// Holds the application's shared broker connection and, when configured, its
/// registry link. Both are established lazily on first use.
pub struct Client {
    config: ClientConfig,
    app_id: AppId,
    discovery: Arc<dyn Discovery>,
    connection: ConnectionGuard,
    registry: Option<RegistryLink>,
}

impl Debug for Client {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(Client))
            .field("config", &self.config)
            .field("connection", &self.connection)
            .field("registry", &self.registry)
            .finish()
    }
}

impl Client {
    /// Creates a new [`Client`] instance.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn new(
        config: ClientConfig,
        discovery: Arc<dyn Discovery>,
        broker_connector: Arc<dyn BrokerConnector>,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        let app_id = config.app_id()?;
        let connection =
            ConnectionGuard::new(app_id, &config, Arc::clone(&discovery), broker_connector);

        Ok(Self {
            config,
            app_id,
            discovery,
            connection,
            registry: None,
        })
    }

    /// Enables device management through the registry reached by `connector`.
    #[must_use]
    pub fn with_registry(mut self, connector: Arc<dyn RegistryConnector>) -> Self {
        self.registry = Some(RegistryLink::new(
            self.app_id,
            Arc::clone(&self.discovery),
            connector,
        ));
        self
    }

    #[must_use]
    pub fn app_id(&self) -> AppId {
        self.app_id
    }

    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the state of the broker connection.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Returns a new [`ApplicationScope`], connecting to the broker on first use.
    ///
    /// Must be called from within a Tokio runtime, on which the scope's teardown
    /// watchers are spawned.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established, if the
    /// connection was closed while this call was in flight, or if no Tokio
    /// runtime is available.
    pub async fn pub_sub(&self) -> Result<ApplicationScope, ClientError> {
        let connection = self.connection.ensure_connected().await?;
        connection.scope().check()?;

        let handle = Handle::try_current()
            .map_err(|e| ClientError::Precondition(format!("no Tokio runtime: {e}")))?;

        Ok(ApplicationScope::new(
            self.app_id,
            &connection,
            self.config.buffer_capacity,
            handle,
        ))
    }

    /// Returns a [`DeviceManager`], connecting to the registry on first use.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Precondition`] if no registry connector was
    /// configured, or an error if the registry cannot be reached.
    pub async fn device_manager(&self) -> Result<DeviceManager, ClientError> {
        let link = self.registry.as_ref().ok_or_else(|| {
            ClientError::Precondition("no registry connector configured".to_string())
        })?;
        let registry = link.ensure_connected().await?;
        Ok(DeviceManager::new(self.app_id, registry))
    }

    /// Closes the broker connection, tearing down every scope, and the registry link.
    ///
    /// # Errors
    ///
    /// Returns an error if the broker client fails to disconnect.
    pub async fn close(&self) -> Result<(), ClientError> {
        if let Some(link) = &self.registry {
            link.close().await;
        }
        self.connection.close().await
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use iotsdk_network::memory::InMemoryBroker;
    use rstest::rstest;

    use super::*;
    use crate::discovery::StaticDiscovery;

    fn client(config: ClientConfig) -> anyhow::Result<Client> {
        Client::new(
            config,
            Arc::new(StaticDiscovery::broker("localhost:1883")),
            Arc::new(InMemoryBroker::new()),
        )
    }

    #[rstest]
    fn test_new_rejects_invalid_config() {
        assert!(client(ClientConfig::default()).is_err());
        assert!(client(ClientConfig::new("test-app", "key")).is_ok());
    }

    #[rstest]
    #[tokio::test]
    async fn test_device_manager_requires_registry() {
        let client = client(ClientConfig::new("test-app", "key")).unwrap();

        let err = client.device_manager().await.unwrap_err();

        assert!(matches!(err, ClientError::Precondition(_)));
    }

    #[rstest]
    #[tokio::test]
    async fn test_pub_sub_connects_lazily() {
        let client = client(ClientConfig::new("test-app", "key")).unwrap();
        assert_eq!(client.connection_state(), ConnectionState::Idle);

        let app = client.pub_sub().await.unwrap();

        assert_eq!(app.app_id(), client.app_id());
        assert_eq!(client.connection_state(), ConnectionState::Connected);
    }
}
