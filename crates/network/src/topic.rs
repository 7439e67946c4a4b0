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

//! Device topic layout and MQTT-style filter matching.
//!
//! Every device topic has the form `{app_id}/devices/{dev_id}/{kind}` where
//! `kind` is `up`, `down` or `events/{event_type}`. Activations are published
//! as the `activations` event.

use iotsdk_model::{
    enums::{EventType, MessageClass},
    identifiers::{AppId, DevId},
};

/// The topic level separating the application from its devices.
pub const DEVICES_LEVEL: &str = "devices";

/// The single-level wildcard.
pub const SINGLE_LEVEL_WILDCARD: &str = "+";

/// The multi-level wildcard.
pub const MULTI_LEVEL_WILDCARD: &str = "#";

const UPLINK_LEVEL: &str = "up";
const DOWNLINK_LEVEL: &str = "down";
const EVENTS_LEVEL: &str = "events";

/// Error produced when a topic does not follow the device topic layout.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("Invalid device topic '{topic}': {reason}")]
pub struct TopicError {
    pub topic: String,
    pub reason: String,
}

/// Returns the uplink topic for the device.
#[must_use]
pub fn uplink_topic(app_id: &AppId, dev_id: &DevId) -> String {
    format!("{app_id}/{DEVICES_LEVEL}/{dev_id}/{UPLINK_LEVEL}")
}

/// Returns the downlink topic for the device.
#[must_use]
pub fn downlink_topic(app_id: &AppId, dev_id: &DevId) -> String {
    format!("{app_id}/{DEVICES_LEVEL}/{dev_id}/{DOWNLINK_LEVEL}")
}

/// Returns the topic for an event of type `event` for the device.
///
/// `event` may be a wildcard such as `#`.
#[must_use]
pub fn events_topic(app_id: &AppId, dev_id: &DevId, event: &str) -> String {
    format!("{app_id}/{DEVICES_LEVEL}/{dev_id}/{EVENTS_LEVEL}/{event}")
}

/// Returns the activations topic for the device.
#[must_use]
pub fn activations_topic(app_id: &AppId, dev_id: &DevId) -> String {
    events_topic(app_id, dev_id, EventType::Activations.as_str())
}

/// Returns the subscription filter for a device scope's channel of `class`.
///
/// The wildcard device id produces a filter matching every device.
#[must_use]
pub fn subscription_filter(app_id: &AppId, dev_id: &DevId, class: MessageClass) -> String {
    match class {
        MessageClass::Uplink => uplink_topic(app_id, dev_id),
        MessageClass::Event => events_topic(app_id, dev_id, MULTI_LEVEL_WILDCARD),
        MessageClass::Activation => activations_topic(app_id, dev_id),
    }
}

/// The kind of message carried on a device topic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TopicKind {
    Uplink,
    Downlink,
    Event(EventType),
}

/// A parsed concrete device topic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceTopic {
    pub app_id: AppId,
    pub dev_id: DevId,
    pub kind: TopicKind,
}

impl DeviceTopic {
    /// Parses a concrete topic as received from the broker.
    ///
    /// # Errors
    ///
    /// Returns an error if the topic does not follow the device topic layout or
    /// carries invalid identifiers.
    pub fn parse(topic: &str) -> Result<Self, TopicError> {
        let error = |reason: &str| TopicError {
            topic: topic.to_string(),
            reason: reason.to_string(),
        };

        let mut levels = topic.splitn(4, '/');
        let (Some(app), Some(devices), Some(dev), Some(rest)) =
            (levels.next(), levels.next(), levels.next(), levels.next())
        else {
            return Err(error("too few levels"));
        };

        if devices != DEVICES_LEVEL {
            return Err(error("missing devices level"));
        }

        let app_id = AppId::new_checked(app).map_err(|e| error(&e.to_string()))?;
        let dev_id = DevId::new_checked(dev).map_err(|e| error(&e.to_string()))?;
        if dev_id.is_wildcard() {
            return Err(error("wildcard device in concrete topic"));
        }

        let kind = match rest.split_once('/') {
            None if rest == UPLINK_LEVEL => TopicKind::Uplink,
            None if rest == DOWNLINK_LEVEL => TopicKind::Downlink,
            Some((EVENTS_LEVEL, event)) if !event.is_empty() => {
                TopicKind::Event(EventType::from(event))
            }
            _ => return Err(error("unknown message kind")),
        };

        Ok(Self {
            app_id,
            dev_id,
            kind,
        })
    }

    /// Returns the [`MessageClass`] delivered on this topic, if inbound.
    #[must_use]
    pub fn class(&self) -> Option<MessageClass> {
        match &self.kind {
            TopicKind::Uplink => Some(MessageClass::Uplink),
            TopicKind::Downlink => None,
            TopicKind::Event(EventType::Activations) => Some(MessageClass::Activation),
            TopicKind::Event(_) => Some(MessageClass::Event),
        }
    }

    /// Returns the event type, if this is an event topic.
    #[must_use]
    pub const fn event_type(&self) -> Option<&EventType> {
        match &self.kind {
            TopicKind::Event(event) => Some(event),
            _ => None,
        }
    }
}

/// Returns whether `topic` matches the subscription `filter`.
///
/// Supports the `+` single-level and trailing `#` multi-level wildcards. A `#`
/// also matches the parent level itself.
#[must_use]
pub fn topic_matches_filter(topic: &str, filter: &str) -> bool {
    let mut topic_levels = topic.split('/');
    let mut filter_levels = filter.split('/').peekable();

    while let Some(filter_level) = filter_levels.next() {
        if filter_level == MULTI_LEVEL_WILDCARD {
            return filter_levels.peek().is_none();
        }

        let Some(topic_level) = topic_levels.next() else {
            return false;
        };

        if filter_level != SINGLE_LEVEL_WILDCARD && filter_level != topic_level {
            return false;
        }
    }

    topic_levels.next().is_none()
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use iotsdk_model::identifiers::stubs::{app_id, dev_id, dev_id_wildcard};
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_topic_builders(app_id: AppId, dev_id: DevId) {
        assert_eq!(uplink_topic(&app_id, &dev_id), "test-app/devices/dev1/up");
        assert_eq!(downlink_topic(&app_id, &dev_id), "test-app/devices/dev1/down");
        assert_eq!(
            activations_topic(&app_id, &dev_id),
            "test-app/devices/dev1/events/activations"
        );
        assert_eq!(
            events_topic(&app_id, &dev_id, "down/sent"),
            "test-app/devices/dev1/events/down/sent"
        );
    }

    #[rstest]
    #[case(MessageClass::Uplink, "test-app/devices/+/up")]
    #[case(MessageClass::Event, "test-app/devices/+/events/#")]
    #[case(MessageClass::Activation, "test-app/devices/+/events/activations")]
    fn test_wildcard_subscription_filters(
        app_id: AppId,
        dev_id_wildcard: DevId,
        #[case] class: MessageClass,
        #[case] expected: &str,
    ) {
        assert_eq!(subscription_filter(&app_id, &dev_id_wildcard, class), expected);
    }

    #[rstest]
    #[case("test-app/devices/dev1/up", TopicKind::Uplink, Some(MessageClass::Uplink))]
    #[case("test-app/devices/dev1/down", TopicKind::Downlink, None)]
    #[case(
        "test-app/devices/dev1/events/activations",
        TopicKind::Event(EventType::Activations),
        Some(MessageClass::Activation)
    )]
    #[case(
        "test-app/devices/dev1/events/down/acks",
        TopicKind::Event(EventType::DownlinkAcks),
        Some(MessageClass::Event)
    )]
    fn test_parse_device_topic(
        #[case] topic: &str,
        #[case] kind: TopicKind,
        #[case] class: Option<MessageClass>,
    ) {
        let parsed = DeviceTopic::parse(topic).unwrap();
        assert_eq!(parsed.app_id.as_str(), "test-app");
        assert_eq!(parsed.dev_id.as_str(), "dev1");
        assert_eq!(parsed.kind, kind);
        assert_eq!(parsed.class(), class);
    }

    #[rstest]
    #[case("test-app/devices/dev1")]
    #[case("test-app/gateways/dev1/up")]
    #[case("test-app/devices/dev1/sideways")]
    #[case("test-app/devices/dev1/events/")]
    #[case("test-app/devices/+/up")]
    #[case("/devices/dev1/up")]
    fn test_parse_invalid_device_topic(#[case] topic: &str) {
        let err = DeviceTopic::parse(topic).unwrap_err();
        assert_eq!(err.topic, topic);
    }

    #[rstest]
    #[case("a/devices/d/up", "a/devices/d/up", true)]
    #[case("a/devices/d/up", "a/devices/+/up", true)]
    #[case("a/devices/d/up", "a/devices/+/down", false)]
    #[case("a/devices/d/events/down/sent", "a/devices/d/events/#", true)]
    #[case("a/devices/d/events", "a/devices/d/events/#", true)]
    #[case("a/devices/d/events/activations", "a/devices/+/events/activations", true)]
    #[case("a/devices/d/events/activations/errors", "a/devices/+/events/activations", false)]
    #[case("a/devices/d/up", "a/devices/d", false)]
    #[case("a/devices/d", "a/devices/d/up", false)]
    #[case("a/devices/d/up", "#", true)]
    #[case("a/devices/d/up", "a/#/up", false)]
    fn test_topic_matches_filter(#[case] topic: &str, #[case] filter: &str, #[case] expected: bool) {
        assert_eq!(topic_matches_filter(topic, filter), expected);
    }
}
