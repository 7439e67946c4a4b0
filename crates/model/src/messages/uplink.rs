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

//! Uplink telemetry sent by a device.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::payload_base64;
use crate::identifiers::{AppId, DevId};

/// Gateway reception metadata for an uplink.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayMetadata {
    /// The ID of the receiving gateway.
    pub gtw_id: String,
    /// The gateway's internal timestamp at reception (microseconds).
    pub timestamp: u32,
    /// Received signal strength (dBm).
    pub rssi: f32,
    /// Signal to noise ratio (dB).
    pub snr: f32,
}

/// Radio metadata attached to an uplink or activation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UplinkMetadata {
    /// The server time of reception (RFC 3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// The frequency (MHz).
    pub frequency: f32,
    /// The modulation, e.g. `LORA`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub modulation: String,
    /// The data rate, e.g. `SF7BW125`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub data_rate: String,
    /// The coding rate, e.g. `4/5`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub coding_rate: String,
    /// The gateways which received the uplink.
    pub gateways: Vec<GatewayMetadata>,
}

/// An uplink message received from a device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UplinkMessage {
    /// The application the device belongs to.
    pub app_id: AppId,
    /// The device which sent the uplink.
    pub dev_id: DevId,
    /// The device's hardware serial (DevEUI).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hardware_serial: String,
    /// The LoRaWAN FPort.
    #[serde(default)]
    pub port: u8,
    /// The frame counter.
    #[serde(default)]
    pub counter: u32,
    /// Whether this is a retransmission.
    #[serde(default)]
    pub is_retry: bool,
    /// Whether the uplink requested a confirmation.
    #[serde(default)]
    pub confirmed: bool,
    /// The raw application payload.
    #[serde(default, with = "payload_base64")]
    pub payload_raw: Vec<u8>,
    /// The payload decoded by the application's payload functions, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_fields: Option<Map<String, Value>>,
    /// Reception metadata.
    #[serde(default)]
    pub metadata: UplinkMetadata,
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
