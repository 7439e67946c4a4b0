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

//! Enumerations for the application and device domain model.

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// The class of an inbound device message.
///
/// Each device scope owns at most one subscription per class.
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    AsRefStr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageClass {
    /// Uplink telemetry sent by the device.
    Uplink,
    /// Lifecycle events concerning the device.
    Event,
    /// Join/activation notices for the device.
    Activation,
}

/// When a downlink should be transmitted relative to other queued downlinks.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Display,
    Hash,
    PartialEq,
    Eq,
    AsRefStr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DownlinkSchedule {
    /// Replace any queued downlinks.
    #[default]
    Replace,
    /// Schedule ahead of queued downlinks.
    First,
    /// Schedule after queued downlinks.
    Last,
}

/// The type of a device event, as carried in the event topic sub-levels.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum EventType {
    /// The device was created in the registry.
    Create,
    /// The device was updated in the registry.
    Update,
    /// The device was deleted from the registry.
    Delete,
    /// The device activated (joined).
    Activations,
    /// An activation failed.
    ActivationErrors,
    /// An uplink could not be processed.
    UplinkErrors,
    /// A downlink was scheduled.
    DownlinkScheduled,
    /// A downlink was sent.
    DownlinkSent,
    /// A downlink failed.
    DownlinkErrors,
    /// A confirmed downlink was acknowledged.
    DownlinkAcks,
    /// Any event type not known to this SDK.
    Other(String),
}

impl EventType {
    /// Returns the topic representation of the event type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Activations => "activations",
            Self::ActivationErrors => "activations/errors",
            Self::UplinkErrors => "up/errors",
            Self::DownlinkScheduled => "down/scheduled",
            Self::DownlinkSent => "down/sent",
            Self::DownlinkErrors => "down/errors",
            Self::DownlinkAcks => "down/acks",
            Self::Other(value) => value,
        }
    }

    /// Returns whether events of this type carry an error payload.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(
            self,
            Self::ActivationErrors | Self::UplinkErrors | Self::DownlinkErrors
        )
    }
}

impl From<&str> for EventType {
    fn from(value: &str) -> Self {
        match value {
            "create" => Self::Create,
            "update" => Self::Update,
            "delete" => Self::Delete,
            "activations" => Self::Activations,
            "activations/errors" => Self::ActivationErrors,
            "up/errors" => Self::UplinkErrors,
            "down/scheduled" => Self::DownlinkScheduled,
            "down/sent" => Self::DownlinkSent,
            "down/errors" => Self::DownlinkErrors,
            "down/acks" => Self::DownlinkAcks,
            other => Self::Other(other.to_string()),
        }
    }
}

impl FromStr for EventType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl Display for EventType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for EventType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: String = Deserialize::deserialize(deserializer)?;
        Ok(Self::from(value.as_str()))
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
