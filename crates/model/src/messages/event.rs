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

//! Lifecycle events concerning a device.

use serde::{Deserialize, Serialize};

use super::{activation::Activation, decode_stamped, payload_base64};
use crate::{
    enums::EventType,
    identifiers::{AppId, DevId},
};

/// Payload of the `*/errors` event types.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEventData {
    /// The error description.
    #[serde(default)]
    pub error: String,
}

/// Payload of the `down/scheduled` and `down/sent` event types.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownlinkEventData {
    /// The encoded downlink frame.
    #[serde(with = "payload_base64")]
    pub payload: Vec<u8>,
    /// The gateway scheduled to transmit the downlink.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub gateway_id: String,
}

/// Decoded payload of a device event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventData {
    /// Data of an `activations` event.
    Activation(Activation),
    /// Data of an `*/errors` event.
    Error(ErrorEventData),
    /// Data of a `down/scheduled` or `down/sent` event.
    Downlink(DownlinkEventData),
}

impl EventData {
    /// Decodes the payload schema for `event_type`.
    ///
    /// Returns `None` when the event type has no payload schema, or when the
    /// payload does not match it.
    #[must_use]
    pub fn decode(
        event_type: &EventType,
        app_id: AppId,
        dev_id: DevId,
        payload: &[u8],
    ) -> Option<Self> {
        match event_type {
            EventType::Activations => decode_stamped(app_id, dev_id, payload)
                .ok()
                .map(Self::Activation),
            EventType::ActivationErrors | EventType::UplinkErrors | EventType::DownlinkErrors => {
                serde_json::from_slice(payload).ok().map(Self::Error)
            }
            EventType::DownlinkScheduled | EventType::DownlinkSent => {
                serde_json::from_slice(payload).ok().map(Self::Downlink)
            }
            _ => None,
        }
    }
}

/// An event concerning a device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviceEvent {
    /// The application the device belongs to.
    pub app_id: AppId,
    /// The device the event concerns.
    pub dev_id: DevId,
    /// The event type.
    pub event: EventType,
    /// The decoded event payload, if the event type has a schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<EventData>,
}

impl DeviceEvent {
    /// Builds a [`DeviceEvent`] from its topic-derived parts and raw payload.
    ///
    /// Never fails: undecodable payloads produce an event without data.
    #[must_use]
    pub fn from_payload(app_id: AppId, dev_id: DevId, event: EventType, payload: &[u8]) -> Self {
        let data = EventData::decode(&event, app_id, dev_id, payload);
        Self {
            app_id,
            dev_id,
            event,
            data,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
