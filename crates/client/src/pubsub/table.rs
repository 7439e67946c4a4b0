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

//! The channels of every device subscribed through one broker connection.
//!
//! A device and message class have at most one live [`TopicChannel`] per
//! connection. Every [`DeviceScope`](super::DeviceScope) obtained for the same
//! device, from any [`ApplicationScope`](super::ApplicationScope) on the
//! connection, shares the channels registered here.

use std::{
    fmt::{Debug, Formatter},
    sync::{Arc, Weak},
};

use dashmap::DashMap;
use iotsdk_model::{
    identifiers::{AppId, DevId},
    messages::{Activation, DeviceEvent, UplinkMessage},
};
use iotsdk_network::broker::BrokerClient;

use super::channel::TopicChannel;

/// The three topic channels of one device.
pub(crate) struct DeviceChannels {
    pub(crate) app_id: AppId,
    pub(crate) dev_id: DevId,
    pub(crate) broker: Arc<dyn BrokerClient>,
    pub(crate) uplink: TopicChannel<UplinkMessage>,
    pub(crate) events: TopicChannel<DeviceEvent>,
    pub(crate) activations: TopicChannel<Activation>,
}

impl DeviceChannels {
    fn new(app_id: AppId, dev_id: DevId, capacity: usize, broker: Arc<dyn BrokerClient>) -> Self {
        Self {
            app_id,
            dev_id,
            uplink: TopicChannel::new(app_id, dev_id, capacity, Arc::clone(&broker)),
            events: TopicChannel::new(app_id, dev_id, capacity, Arc::clone(&broker)),
            activations: TopicChannel::new(app_id, dev_id, capacity, Arc::clone(&broker)),
            broker,
        }
    }

    /// Unsubscribes every channel, logging rather than returning failures.
    pub(crate) async fn teardown(&self) {
        let (uplink, events, activations) = tokio::join!(
            self.uplink.unsubscribe(),
            self.events.unsubscribe(),
            self.activations.unsubscribe(),
        );

        for (filter, result) in [
            (self.uplink.filter(), uplink),
            (self.events.filter(), events),
            (self.activations.filter(), activations),
        ] {
            if let Err(e) = result {
                log::warn!("Error unsubscribing from {filter} during teardown: {e}");
            }
        }
        log::debug!("Tore down subscriptions of {}/{}", self.app_id, self.dev_id);
    }
}

/// The registry of live device channels of one broker connection.
///
/// Entries are held weakly: channels are dropped once no device scope or
/// teardown watcher references them.
#[derive(Default)]
pub struct ChannelTable {
    devices: DashMap<(AppId, DevId), Weak<DeviceChannels>>,
}

impl Debug for ChannelTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(ChannelTable))
            .field("live_devices", &self.live_devices())
            .finish()
    }
}

impl ChannelTable {
    /// Creates a new empty [`ChannelTable`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of devices whose channels are still alive.
    #[must_use]
    pub fn live_devices(&self) -> usize {
        self.devices
            .iter()
            .filter(|entry| entry.value().strong_count() > 0)
            .count()
    }

    /// Returns the live channels of the device, creating them if none exist.
    ///
    /// `capacity` only applies when the channels are created.
    pub(crate) fn device_channels(
        &self,
        app_id: AppId,
        dev_id: DevId,
        capacity: usize,
        broker: &Arc<dyn BrokerClient>,
    ) -> Arc<DeviceChannels> {
        let channels = {
            let mut slot = self.devices.entry((app_id, dev_id)).or_default();
            if let Some(channels) = slot.upgrade() {
                return channels;
            }
            let channels = Arc::new(DeviceChannels::new(
                app_id,
                dev_id,
                capacity,
                Arc::clone(broker),
            ));
            *slot = Arc::downgrade(&channels);
            channels
        };

        self.devices.retain(|_, channels| channels.strong_count() > 0);
        channels
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
