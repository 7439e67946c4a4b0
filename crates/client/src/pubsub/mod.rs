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

//! Per-device subscription management.
//!
//! An [`ApplicationScope`] hands out [`DeviceScope`]s, each exposing one
//! [`TopicChannel`] per [`MessageClass`](iotsdk_model::enums::MessageClass).
//! Channels live in the connection's [`ChannelTable`], so every scope of the
//! same device shares them. Scopes form a cancellation tree rooted at the broker
//! connection: firing any scope unsubscribes the channels of its devices.

pub mod application;
pub mod channel;
pub mod device;
pub mod message;
pub mod stream;
pub mod table;

// Re-exports
pub use crate::pubsub::{
    application::ApplicationScope,
    channel::{SubscriptionState, TopicChannel},
    device::DeviceScope,
    message::InboundMessage,
    stream::MessageStream,
    table::ChannelTable,
};
