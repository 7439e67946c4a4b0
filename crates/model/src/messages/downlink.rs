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

//! Downlink commands published to a device.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::payload_base64;
use crate::{
    enums::DownlinkSchedule,
    identifiers::{AppId, DevId},
};

/// A downlink message to be sent to a device.
///
/// The identifiers are left unset by callers and stamped by the device scope
/// which publishes the message.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DownlinkMessage {
    /// The application the device belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<AppId>,
    /// The target device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_id: Option<DevId>,
    /// The LoRaWAN FPort.
    #[serde(default)]
    pub port: u8,
    /// Whether the device must confirm reception.
    #[serde(default)]
    pub confirmed: bool,
    /// Scheduling relative to other queued downlinks.
    #[serde(default)]
    pub schedule: DownlinkSchedule,
    /// The raw application payload.
    #[serde(default, with = "payload_base64", skip_serializing_if = "Vec::is_empty")]
    pub payload_raw: Vec<u8>,
    /// Fields to be encoded by the application's payload functions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_fields: Option<Map<String, Value>>,
}

impl DownlinkMessage {
    /// Creates a new [`DownlinkMessage`] carrying a raw payload on `port`.
    #[must_use]
    pub fn new(port: u8, payload_raw: Vec<u8>) -> Self {
        Self {
            port,
            payload_raw,
            ..Default::default()
        }
    }

    /// Creates a new [`DownlinkMessage`] carrying payload fields on `port`.
    #[must_use]
    pub fn with_fields(port: u8, payload_fields: Map<String, Value>) -> Self {
        Self {
            port,
            payload_fields: Some(payload_fields),
            ..Default::default()
        }
    }

    /// Returns a copy of the message stamped with the given identifiers.
    #[must_use]
    pub fn stamped(&self, app_id: AppId, dev_id: DevId) -> Self {
        Self {
            app_id: Some(app_id),
            dev_id: Some(dev_id),
            ..self.clone()
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
