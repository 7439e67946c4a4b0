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

//! Decoding of inbound deliveries into typed messages.

use iotsdk_model::{
    enums::MessageClass,
    messages::{Activation, DeviceEvent, UplinkMessage, decode_stamped},
};
use iotsdk_network::topic::DeviceTopic;

/// A message type delivered on one class of device topics.
pub trait InboundMessage: Send + Sized + 'static {
    /// The class of topics carrying this message type.
    const CLASS: MessageClass;

    /// Decodes a delivery, stamping the identifiers parsed from its topic.
    ///
    /// Returns `None` if the delivery cannot be decoded, in which case it is
    /// dropped.
    fn decode(topic: &DeviceTopic, payload: &[u8]) -> Option<Self>;
}

impl InboundMessage for UplinkMessage {
    const CLASS: MessageClass = MessageClass::Uplink;

    fn decode(topic: &DeviceTopic, payload: &[u8]) -> Option<Self> {
        decode_stamped(topic.app_id, topic.dev_id, payload)
            .inspect_err(|e| log::debug!("Dropping undecodable uplink from {}: {e}", topic.dev_id))
            .ok()
    }
}

impl InboundMessage for Activation {
    const CLASS: MessageClass = MessageClass::Activation;

    fn decode(topic: &DeviceTopic, payload: &[u8]) -> Option<Self> {
        decode_stamped(topic.app_id, topic.dev_id, payload)
            .inspect_err(|e| {
                log::debug!("Dropping undecodable activation from {}: {e}", topic.dev_id);
            })
            .ok()
    }
}

impl InboundMessage for DeviceEvent {
    const CLASS: MessageClass = MessageClass::Event;

    fn decode(topic: &DeviceTopic, payload: &[u8]) -> Option<Self> {
        let event = topic.event_type()?.clone();
        Some(Self::from_payload(topic.app_id, topic.dev_id, event, payload))
    }
}
