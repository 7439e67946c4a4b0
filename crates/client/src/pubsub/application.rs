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

//! The subscriptions of one application.

use std::{
    fmt::{Debug, Formatter},
    sync::Arc,
};

use iotsdk_core::{CancellationScope, correctness::FAILED};
use iotsdk_model::identifiers::{AppId, DevId};
use iotsdk_network::broker::BrokerClient;
use tokio::runtime::Handle;

use super::{device::DeviceScope, table::ChannelTable};
use crate::{config::check_buffer_capacity, connection::LiveConnection};

/// Factory for the [`DeviceScope`]s of one application.
///
/// Owns the application's cancellation scope, a child of the connection's root
/// scope. Independent instances share the same underlying connection and its
/// device channels.
pub struct ApplicationScope {
    app_id: AppId,
    broker: Arc<dyn BrokerClient>,
    channels: Arc<ChannelTable>,
    scope: CancellationScope,
    buffer_capacity: usize,
    handle: Handle,
}

impl Debug for ApplicationScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(ApplicationScope))
            .field("app_id", &self.app_id)
            .field("scope", &self.scope)
            .field("buffer_capacity", &self.buffer_capacity)
            .finish()
    }
}

impl ApplicationScope {
    /// Creates a new [`ApplicationScope`] bound to `connection` with correctness
    /// checking.
    ///
    /// Teardown watchers of its device scopes are spawned on `handle`.
    ///
    /// # Errors
    ///
    /// Returns an error if `buffer_capacity` is zero or exceeds
    /// [`MAX_BUFFER_CAPACITY`](crate::config::MAX_BUFFER_CAPACITY).
    pub fn new_checked(
        app_id: AppId,
        connection: &LiveConnection,
        buffer_capacity: usize,
        handle: Handle,
    ) -> anyhow::Result<Self> {
        check_buffer_capacity(buffer_capacity)?;
        Ok(Self {
            app_id,
            broker: Arc::clone(connection.client()),
            channels: Arc::clone(connection.channels()),
            scope: connection.scope().child(format!("app {app_id}")),
            buffer_capacity,
            handle,
        })
    }

    /// Creates a new [`ApplicationScope`] bound to `connection`.
    ///
    /// # Panics
    ///
    /// Panics if `buffer_capacity` is out of range.
    #[must_use]
    pub fn new(
        app_id: AppId,
        connection: &LiveConnection,
        buffer_capacity: usize,
        handle: Handle,
    ) -> Self {
        Self::new_checked(app_id, connection, buffer_capacity, handle).expect(FAILED)
    }

    #[must_use]
    pub fn app_id(&self) -> AppId {
        self.app_id
    }

    /// Returns a new [`DeviceScope`] for `dev_id`.
    ///
    /// The scope shares its channels with every other scope of the same device
    /// on this connection. If this scope is already closed the device scope
    /// starts closed.
    #[must_use]
    pub fn device(&self, dev_id: DevId) -> DeviceScope {
        let channels = self.channels.device_channels(
            self.app_id,
            dev_id,
            self.buffer_capacity,
            &self.broker,
        );
        DeviceScope::new(channels, &self.scope, &self.handle)
    }

    /// Returns a new [`DeviceScope`] matching every device of the application.
    #[must_use]
    pub fn all_devices(&self) -> DeviceScope {
        self.device(DevId::wildcard())
    }

    /// Closes the scope, tearing down every device scope obtained from it.
    pub fn close(&self) {
        self.scope.cancel();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.scope.is_cancelled()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
