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

//! The per-topic subscription state machine.
//!
//! A [`TopicChannel`] owns the subscription for one (device, message class)
//! pair. The buffer reference lives behind a read-write lock: the delivery
//! handler only ever takes the read side, for just long enough to enqueue
//! without blocking, while subscribe/unsubscribe replace or clear the buffer
//! under the write side. Transitions are serialized by a per-channel lock held
//! across the broker round-trip.

use std::{
    fmt::{Debug, Formatter},
    sync::{
        Arc, RwLock,
        atomic::{AtomicU8, Ordering},
    },
};

use iotsdk_core::{CancellationScope, MUTEX_POISONED};
use iotsdk_model::identifiers::{AppId, DevId};
use iotsdk_network::{
    broker::{BrokerClient, DeliveryHandler},
    topic::{DeviceTopic, subscription_filter},
};
use strum::{AsRefStr, Display};
use tokio::sync::{
    Mutex,
    mpsc::{self, error::TrySendError},
};

use super::{message::InboundMessage, stream::MessageStream};
use crate::error::ClientError;

/// The subscription state of a [`TopicChannel`].
#[derive(Clone, Copy, Debug, Display, Hash, PartialEq, Eq, AsRefStr)]
#[repr(u8)]
#[strum(serialize_all = "UPPERCASE")]
pub enum SubscriptionState {
    Unsubscribed = 0,
    Subscribing = 1,
    Subscribed = 2,
    Unsubscribing = 3,
}

impl SubscriptionState {
    fn load(value: &AtomicU8) -> Self {
        match value.load(Ordering::SeqCst) {
            1 => Self::Subscribing,
            2 => Self::Subscribed,
            3 => Self::Unsubscribing,
            _ => Self::Unsubscribed,
        }
    }

    fn store(self, value: &AtomicU8) {
        value.store(self as u8, Ordering::SeqCst);
    }
}

struct ChannelBuffer<M> {
    sender: mpsc::Sender<M>,
    stream: MessageStream<M>,
}

type BufferSlot<M> = Arc<RwLock<Option<ChannelBuffer<M>>>>;

/// The subscription for one class of messages of one device (or of every
/// device, for the wildcard ID).
pub struct TopicChannel<M> {
    app_id: AppId,
    dev_id: DevId,
    filter: String,
    capacity: usize,
    broker: Arc<dyn BrokerClient>,
    buffer: BufferSlot<M>,
    state: AtomicU8,
    transition: Mutex<()>,
}

impl<M> Debug for TopicChannel<M> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(TopicChannel))
            .field("app_id", &self.app_id)
            .field("dev_id", &self.dev_id)
            .field("filter", &self.filter)
            .field("capacity", &self.capacity)
            .field("state", &SubscriptionState::load(&self.state))
            .finish()
    }
}

impl<M: InboundMessage> TopicChannel<M> {
    /// Creates a new unsubscribed [`TopicChannel`] instance.
    ///
    /// `capacity` must already be validated with
    /// [`check_buffer_capacity`](crate::config::check_buffer_capacity).
    #[must_use]
    pub(crate) fn new(
        app_id: AppId,
        dev_id: DevId,
        capacity: usize,
        broker: Arc<dyn BrokerClient>,
    ) -> Self {
        Self {
            app_id,
            dev_id,
            filter: subscription_filter(&app_id, &dev_id, M::CLASS),
            capacity,
            broker,
            buffer: Arc::new(RwLock::new(None)),
            state: AtomicU8::new(SubscriptionState::Unsubscribed as u8),
            transition: Mutex::new(()),
        }
    }

    /// Returns the broker topic filter of this channel.
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Returns the current subscription state.
    #[must_use]
    pub fn state(&self) -> SubscriptionState {
        SubscriptionState::load(&self.state)
    }

    /// Returns the stream of the live subscription, if any.
    #[must_use]
    pub fn stream(&self) -> Option<MessageStream<M>> {
        self.buffer
            .read()
            .expect(MUTEX_POISONED)
            .as_ref()
            .map(|buffer| buffer.stream.clone())
    }

    /// Subscribes the channel, or returns the live subscription's stream.
    ///
    /// Only the first call issues a broker subscribe; later calls while
    /// subscribed return the same stream.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Cancelled`] if `scope` has fired (checked before
    /// and after waiting for any in-flight transition), or
    /// [`ClientError::Subscription`] if the broker rejects the request, in which
    /// case no buffer is retained.
    pub async fn subscribe(
        &self,
        scope: &CancellationScope,
    ) -> Result<MessageStream<M>, ClientError> {
        scope.check()?;
        let _transition = self.transition.lock().await;
        scope.check()?;

        if let Some(stream) = self.stream() {
            return Ok(stream);
        }

        SubscriptionState::Subscribing.store(&self.state);
        let (sender, receiver) = mpsc::channel(self.capacity);
        let stream = MessageStream::new(receiver);
        *self.buffer.write().expect(MUTEX_POISONED) = Some(ChannelBuffer {
            sender,
            stream: stream.clone(),
        });

        log::debug!("Subscribing to {}", self.filter);
        match self.broker.subscribe(&self.filter, self.delivery_handler()).await {
            Ok(()) => {
                SubscriptionState::Subscribed.store(&self.state);
                log::debug!("Subscribed to {}", self.filter);
                Ok(stream)
            }
            Err(e) => {
                self.buffer.write().expect(MUTEX_POISONED).take();
                SubscriptionState::Unsubscribed.store(&self.state);
                log::debug!("Could not subscribe to {}: {e}", self.filter);
                Err(ClientError::Subscription(e))
            }
        }
    }

    /// Unsubscribes the channel, closing its stream to readers.
    ///
    /// Local state is cleared even when the broker rejects the request. Calling
    /// this on an unsubscribed channel is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Subscription`] if the broker rejects the request.
    pub async fn unsubscribe(&self) -> Result<(), ClientError> {
        let _transition = self.transition.lock().await;

        if self.buffer.read().expect(MUTEX_POISONED).is_none() {
            return Ok(());
        }

        SubscriptionState::Unsubscribing.store(&self.state);
        log::debug!("Unsubscribing from {}", self.filter);
        let result = self.broker.unsubscribe(&self.filter).await;

        self.buffer.write().expect(MUTEX_POISONED).take();
        SubscriptionState::Unsubscribed.store(&self.state);

        result.map_err(|e| {
            log::debug!("Could not unsubscribe from {}: {e}", self.filter);
            ClientError::Subscription(e)
        })
    }

    fn delivery_handler(&self) -> DeliveryHandler {
        let buffer = Arc::clone(&self.buffer);
        let filter = self.filter.clone();

        Arc::new(move |topic: &str, payload: &[u8]| {
            let message = match DeviceTopic::parse(topic) {
                Ok(parsed) => M::decode(&parsed, payload),
                Err(e) => {
                    log::debug!("Ignoring delivery on {filter}: {e}");
                    None
                }
            };
            let Some(message) = message else {
                return;
            };

            let guard = buffer.read().expect(MUTEX_POISONED);
            let Some(buffer) = guard.as_ref() else {
                return;
            };

            if let Err(TrySendError::Full(_)) = buffer.sender.try_send(message) {
                log::trace!("Buffer full on {filter}, dropped message from {topic}");
            }
        })
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
