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

//! The shared broker connection.
//!
//! A [`ConnectionGuard`] owns the single broker client of an application. The
//! connection is established lazily on first use and every state transition is
//! serialized behind one lock, so callers never observe a half-constructed
//! client. A failed attempt is reported to every caller which was waiting on it
//! and is never retried internally.

use std::{
    fmt::{Debug, Formatter},
    sync::{
        Arc,
        atomic::{AtomicU8, AtomicU64, Ordering},
    },
    time::Duration,
};

use iotsdk_core::CancellationScope;
use iotsdk_model::identifiers::AppId;
use iotsdk_network::{
    address::BrokerAddress,
    broker::{BrokerClient, BrokerConnector, BrokerError, BrokerOptions},
    mode::ConnectionState,
};
use tokio::sync::Mutex;

use crate::{
    config::ClientConfig, discovery::Discovery, error::ClientError, pubsub::table::ChannelTable,
};

/// A handle to the live broker connection.
///
/// Carries the root of the connection's cancellation tree, which fires when the
/// connection is closed through its [`ConnectionGuard`], and the table of
/// device channels subscribed over the connection.
#[derive(Clone)]
pub struct LiveConnection {
    client: Arc<dyn BrokerClient>,
    scope: CancellationScope,
    channels: Arc<ChannelTable>,
}

impl Debug for LiveConnection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(LiveConnection))
            .field("scope", &self.scope)
            .field("channels", &self.channels)
            .finish_non_exhaustive()
    }
}

impl LiveConnection {
    pub(crate) fn new(client: Arc<dyn BrokerClient>, label: impl Into<Arc<str>>) -> Self {
        Self {
            client,
            scope: CancellationScope::root(label),
            channels: Arc::new(ChannelTable::new()),
        }
    }

    /// Returns the broker client of the connection.
    #[must_use]
    pub fn client(&self) -> &Arc<dyn BrokerClient> {
        &self.client
    }

    /// Returns the table of device channels subscribed over the connection.
    #[must_use]
    pub fn channels(&self) -> &Arc<ChannelTable> {
        &self.channels
    }

    /// Returns whether the connection has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.scope.is_cancelled()
    }

    pub(crate) const fn scope(&self) -> &CancellationScope {
        &self.scope
    }
}

#[derive(Default)]
struct ConnectionInner {
    live: Option<LiveConnection>,
    // Failure of the most recently completed attempt, tagged with its attempt number
    last_failure: Option<(u64, ClientError)>,
}

/// Guards the single broker connection shared by every scope of an application.
pub struct ConnectionGuard {
    app_id: AppId,
    client_name: String,
    access_key: String,
    connect_timeout: Duration,
    discovery: Arc<dyn Discovery>,
    connector: Arc<dyn BrokerConnector>,
    state: AtomicU8,
    attempts: AtomicU64,
    inner: Mutex<ConnectionInner>,
}

impl Debug for ConnectionGuard {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(ConnectionGuard))
            .field("app_id", &self.app_id)
            .field("state", &self.state())
            .field("attempts", &self.attempts.load(Ordering::SeqCst))
            .finish()
    }
}

impl ConnectionGuard {
    /// Creates a new idle [`ConnectionGuard`] instance.
    #[must_use]
    pub fn new(
        app_id: AppId,
        config: &ClientConfig,
        discovery: Arc<dyn Discovery>,
        connector: Arc<dyn BrokerConnector>,
    ) -> Self {
        Self {
            app_id,
            client_name: config.client_name.clone(),
            access_key: config.app_access_key.clone(),
            connect_timeout: config.connect_timeout(),
            discovery,
            connector,
            state: AtomicU8::new(ConnectionState::Idle.as_u8()),
            attempts: AtomicU64::new(0),
            inner: Mutex::new(ConnectionInner::default()),
        }
    }

    /// Returns the current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_atomic(&self.state)
    }

    /// Returns whether the connection is established.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Returns the number of connect attempts which have completed.
    #[must_use]
    pub fn completed_attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Ensures the broker connection is established, connecting if idle.
    ///
    /// Concurrent callers wait for the single in-flight attempt: its success is
    /// shared, and its failure is returned to every caller which was already
    /// waiting. A caller arriving after a failure makes a new attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if discovery fails, the broker address is missing or
    /// malformed, or the transport fails to connect.
    pub async fn ensure_connected(&self) -> Result<LiveConnection, ClientError> {
        let ticket = self.attempts.load(Ordering::SeqCst);
        let mut inner = self.inner.lock().await;

        if let Some(live) = &inner.live {
            return Ok(live.clone());
        }

        if let Some((attempt, err)) = &inner.last_failure
            && *attempt > ticket
        {
            return Err(err.clone());
        }

        ConnectionState::Connecting.store(&self.state);
        let result = self.connect().await;
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;

        match result {
            Ok(client) => {
                let live = LiveConnection::new(client, format!("connection {}", self.app_id));
                inner.live = Some(live.clone());
                inner.last_failure = None;
                ConnectionState::Connected.store(&self.state);
                Ok(live)
            }
            Err(e) => {
                inner.last_failure = Some((attempt, e.clone()));
                ConnectionState::Idle.store(&self.state);
                Err(e)
            }
        }
    }

    async fn connect(&self) -> Result<Arc<dyn BrokerClient>, ClientError> {
        let announcement = self.discovery.resolve_broker_endpoint(&self.app_id).await?;
        let address = BrokerAddress::parse(&announcement.mqtt_address)?;

        log::debug!(
            "Connecting to broker at {address} ({} transport) for {}",
            address.transport,
            self.app_id
        );

        let client = self.connector.create_client(BrokerOptions {
            client_name: self.client_name.clone(),
            app_id: self.app_id,
            access_key: self.access_key.clone(),
            address: address.clone(),
            connect_timeout: self.connect_timeout,
        });

        match tokio::time::timeout(self.connect_timeout, client.connect()).await {
            Ok(Ok(())) => {
                log::debug!("Connected to broker at {address}");
                Ok(client)
            }
            Ok(Err(e)) => {
                log::debug!("Could not connect to broker at {address}: {e}");
                Err(ClientError::Connection(e))
            }
            Err(_) => {
                log::debug!("Timed out connecting to broker at {address}");
                Err(ClientError::Connection(BrokerError::Timeout(format!(
                    "connect to {address}"
                ))))
            }
        }
    }

    /// Closes the connection if it is established.
    ///
    /// Fires the connection's root scope, tearing down every subscription beneath
    /// it, then disconnects the broker client. The guard returns to idle and a
    /// later [`ensure_connected`](Self::ensure_connected) reconnects.
    ///
    /// # Errors
    ///
    /// Returns an error if the broker client fails to disconnect. The guard is
    /// idle afterwards regardless.
    pub async fn close(&self) -> Result<(), ClientError> {
        let mut inner = self.inner.lock().await;
        let Some(live) = inner.live.take() else {
            return Ok(());
        };

        ConnectionState::Closed.store(&self.state);
        live.scope.cancel();

        let result = live.client.disconnect().await;
        ConnectionState::Idle.store(&self.state);

        match result {
            Ok(()) => {
                log::debug!("Disconnected from broker for {}", self.app_id);
                Ok(())
            }
            Err(e) => {
                log::warn!("Error disconnecting from broker for {}: {e}", self.app_id);
                Err(ClientError::Connection(e))
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
