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

//! Subscriptions and downlinks for one device.

use std::{
    fmt::{Debug, Formatter},
    sync::Arc,
};

use iotsdk_core::CancellationScope;
use iotsdk_model::{
    identifiers::{AppId, DevId},
    messages::{Activation, DeviceEvent, DownlinkMessage, UplinkMessage},
};
use iotsdk_network::topic::downlink_topic;
use tokio::runtime::Handle;

use super::{channel::TopicChannel, stream::MessageStream, table::DeviceChannels};
use crate::error::ClientError;

/// The subscriptions and downlink operation of one device.
///
/// Clones share the same scope. Every scope obtained for the same device on one
/// connection shares the same channels, so subscribing twice returns the same
/// stream. A scope obtained for the wildcard device receives messages of every
/// device of the application, each stamped with the identifiers of the device it
/// came from.
#[derive(Clone)]
pub struct DeviceScope {
    inner: Arc<DeviceChannels>,
    scope: CancellationScope,
}

impl Debug for DeviceScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(DeviceScope))
            .field("app_id", &self.inner.app_id)
            .field("dev_id", &self.inner.dev_id)
            .field("scope", &self.scope)
            .finish()
    }
}

impl DeviceScope {
    /// Creates a new [`DeviceScope`] over `channels` whose cancellation scope is
    /// a child of `parent`.
    ///
    /// A teardown watcher is spawned on `handle`, unsubscribing every channel once
    /// the scope fires. A scope created already closed never tears down.
    pub(crate) fn new(
        channels: Arc<DeviceChannels>,
        parent: &CancellationScope,
        handle: &Handle,
    ) -> Self {
        let scope = parent.child(format!("device {}/{}", channels.app_id, channels.dev_id));

        if !scope.is_cancelled() {
            let watched = Arc::clone(&channels);
            scope.on_cancel(handle, async move { watched.teardown().await });
        }

        Self {
            inner: channels,
            scope,
        }
    }

    #[must_use]
    pub fn app_id(&self) -> AppId {
        self.inner.app_id
    }

    #[must_use]
    pub fn dev_id(&self) -> DevId {
        self.inner.dev_id
    }

    /// Returns the uplink channel.
    #[must_use]
    pub fn uplink(&self) -> &TopicChannel<UplinkMessage> {
        &self.inner.uplink
    }

    /// Returns the events channel.
    #[must_use]
    pub fn events(&self) -> &TopicChannel<DeviceEvent> {
        &self.inner.events
    }

    /// Returns the activations channel.
    #[must_use]
    pub fn activations(&self) -> &TopicChannel<Activation> {
        &self.inner.activations
    }

    /// Publishes a downlink to the device, waiting for the broker's acknowledgement.
    ///
    /// The message is stamped with this scope's application and device IDs.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The scope has been closed.
    /// - This is the wildcard device scope.
    /// - The broker reports an error, which is returned unchanged.
    pub async fn publish(&self, message: &DownlinkMessage) -> Result<(), ClientError> {
        self.scope.check()?;
        let inner = &self.inner;

        if inner.dev_id.is_wildcard() {
            return Err(ClientError::Precondition(
                "cannot publish a downlink to the wildcard device".to_string(),
            ));
        }

        let message = message.stamped(inner.app_id, inner.dev_id);
        let payload =
            serde_json::to_vec(&message).map_err(|e| ClientError::Encoding(e.to_string()))?;
        let topic = downlink_topic(&inner.app_id, &inner.dev_id);

        log::debug!("Publishing downlink on {topic}");
        inner
            .broker
            .publish(&topic, payload)
            .await
            .map_err(ClientError::Publish)
    }

    /// Subscribes to the device's uplink messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the scope has been closed or the broker rejects the request.
    pub async fn subscribe_uplink(&self) -> Result<MessageStream<UplinkMessage>, ClientError> {
        self.inner.uplink.subscribe(&self.scope).await
    }

    /// Subscribes to every event type of the device.
    ///
    /// # Errors
    ///
    /// Returns an error if the scope has been closed or the broker rejects the request.
    pub async fn subscribe_events(&self) -> Result<MessageStream<DeviceEvent>, ClientError> {
        self.inner.events.subscribe(&self.scope).await
    }

    /// Subscribes to the device's activations.
    ///
    /// # Errors
    ///
    /// Returns an error if the scope has been closed or the broker rejects the request.
    pub async fn subscribe_activations(&self) -> Result<MessageStream<Activation>, ClientError> {
        self.inner.activations.subscribe(&self.scope).await
    }

    /// Unsubscribes from the device's uplink messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the broker rejects the request.
    pub async fn unsubscribe_uplink(&self) -> Result<(), ClientError> {
        self.inner.uplink.unsubscribe().await
    }

    /// Unsubscribes from the device's events.
    ///
    /// # Errors
    ///
    /// Returns an error if the broker rejects the request.
    pub async fn unsubscribe_events(&self) -> Result<(), ClientError> {
        self.inner.events.unsubscribe().await
    }

    /// Unsubscribes from the device's activations.
    ///
    /// # Errors
    ///
    /// Returns an error if the broker rejects the request.
    pub async fn unsubscribe_activations(&self) -> Result<(), ClientError> {
        self.inner.activations.unsubscribe().await
    }

    /// Closes the scope.
    ///
    /// Every channel of the device is unsubscribed in the background, which also
    /// closes the streams other scopes of the device hold. Later subscribe and
    /// publish calls on this scope fail with [`ClientError::Cancelled`].
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
