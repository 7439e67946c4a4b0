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

//! Messages exchanged with the broker on behalf of devices.
//!
//! Inbound messages (uplinks, events, activations) are decoded from the JSON
//! payload delivered on a device topic. The application and device identifiers
//! are always taken from the topic the message arrived on, which is what makes
//! wildcard subscriptions attribute messages to the right device.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::identifiers::{AppId, DevId};

pub mod activation;
pub mod downlink;
pub mod event;
pub mod uplink;

#[cfg(any(test, feature = "stubs"))]
pub mod stubs;

// Re-exports
pub use crate::messages::{
    activation::Activation,
    downlink::DownlinkMessage,
    event::{DeviceEvent, DownlinkEventData, ErrorEventData, EventData},
    uplink::{GatewayMetadata, UplinkMessage, UplinkMetadata},
};

/// Decodes a JSON `payload` into `T`, stamping it with the given identifiers.
///
/// Any `app_id`/`dev_id` present in the payload are overwritten.
///
/// # Errors
///
/// Returns an error if the payload is not a JSON object or does not match `T`.
pub fn decode_stamped<T: DeserializeOwned>(
    app_id: AppId,
    dev_id: DevId,
    payload: &[u8],
) -> Result<T, serde_json::Error> {
    let mut value: Value = serde_json::from_slice(payload)?;
    if let Value::Object(map) = &mut value {
        map.insert("app_id".to_string(), Value::from(app_id.as_str()));
        map.insert("dev_id".to_string(), Value::from(dev_id.as_str()));
    }
    serde_json::from_value(value)
}

/// Serde helpers encoding raw payload bytes as base64 strings.
pub(crate) mod payload_base64 {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        match encoded {
            Some(encoded) => STANDARD
                .decode(encoded.as_bytes())
                .map_err(serde::de::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
