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

//! An in-memory loopback broker.
//!
//! [`InMemoryBroker`] implements [`BrokerConnector`] without any network. It
//! routes publishes to matching subscriptions within the process, records every
//! request, and can inject one-shot failures into any operation. Applications
//! use it for local runs and test suites use it to observe the SDK's traffic.

use std::{
    fmt::{Debug, Formatter},
    sync::{
        Arc, Mutex, RwLock,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use dashmap::DashMap;
use iotsdk_core::MUTEX_POISONED;
use strum::{AsRefStr, Display};

use crate::{
    broker::{BrokerClient, BrokerConnector, BrokerError, BrokerOptions, DeliveryHandler},
    topic::topic_matches_filter,
};

/// A broker operation, used to count requests and inject failures.
#[derive(Clone, Copy, Debug, Display, Hash, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum BrokerOperation {
    Connect,
    Disconnect,
    Subscribe,
    Unsubscribe,
    Publish,
}

/// A publish received by the broker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishRecord {
    pub topic: String,
    pub payload: Vec<u8>,
}

struct Subscription {
    client_id: u64,
    filter: String,
    handler: DeliveryHandler,
}

#[derive(Default)]
struct BrokerState {
    next_client_id: AtomicU64,
    subscriptions: RwLock<Vec<Subscription>>,
    faults: DashMap<BrokerOperation, BrokerError>,
    requests: DashMap<BrokerOperation, usize>,
    published: Mutex<Vec<PublishRecord>>,
    clients: Mutex<Vec<BrokerOptions>>,
    connected: DashMap<u64, ()>,
    delays: DashMap<BrokerOperation, Duration>,
}

impl BrokerState {
    async fn pause(&self, op: BrokerOperation) {
        let delay = self.delays.get(&op).map(|delay| *delay);
        if let Some(delay) = delay.filter(|delay| !delay.is_zero()) {
            tokio::time::sleep(delay).await;
        }
    }

    fn record_request(&self, op: BrokerOperation) -> Result<(), BrokerError> {
        *self.requests.entry(op).or_insert(0) += 1;
        match self.faults.remove(&op) {
            Some((_, err)) => {
                log::debug!("Injecting {op} failure: {err}");
                Err(err)
            }
            None => Ok(()),
        }
    }

    fn deliver(&self, topic: &str, payload: &[u8]) -> usize {
        // Handlers run outside the lock so they may call back into the broker
        let handlers: Vec<DeliveryHandler> = self
            .subscriptions
            .read()
            .expect(MUTEX_POISONED)
            .iter()
            .filter(|sub| topic_matches_filter(topic, &sub.filter))
            .map(|sub| Arc::clone(&sub.handler))
            .collect();

        log::trace!("Delivering to {} subscription(s) on {topic}", handlers.len());

        for handler in &handlers {
            handler(topic, payload);
        }
        handlers.len()
    }
}

/// An in-process broker implementing [`BrokerConnector`].
///
/// Clones share the same broker.
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<BrokerState>,
}

impl Debug for InMemoryBroker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(InMemoryBroker))
            .field("subscriptions", &self.subscription_count())
            .field("connected_clients", &self.connected_clients())
            .finish()
    }
}

impl InMemoryBroker {
    /// Creates a new empty [`InMemoryBroker`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next request of `op` fail with `err`.
    pub fn fail_next(&self, op: BrokerOperation, err: BrokerError) {
        self.state.faults.insert(op, err);
    }

    /// Delays every request of `op` by `delay` before it is acknowledged or fails.
    pub fn set_delay(&self, op: BrokerOperation, delay: Duration) {
        self.state.delays.insert(op, delay);
    }

    /// Returns how many requests of `op` the broker has received.
    #[must_use]
    pub fn request_count(&self, op: BrokerOperation) -> usize {
        self.state.requests.get(&op).map_or(0, |count| *count)
    }

    /// Returns every publish received, in order.
    #[must_use]
    pub fn published(&self) -> Vec<PublishRecord> {
        self.state.published.lock().expect(MUTEX_POISONED).clone()
    }

    /// Returns the options of every client created, in order.
    #[must_use]
    pub fn created_clients(&self) -> Vec<BrokerOptions> {
        self.state.clients.lock().expect(MUTEX_POISONED).clone()
    }

    /// Returns the number of active subscriptions across all clients.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.state.subscriptions.read().expect(MUTEX_POISONED).len()
    }

    /// Returns whether any client holds a subscription for exactly `filter`.
    #[must_use]
    pub fn is_subscribed(&self, filter: &str) -> bool {
        self.state
            .subscriptions
            .read()
            .expect(MUTEX_POISONED)
            .iter()
            .any(|sub| sub.filter == filter)
    }

    /// Returns the number of currently connected clients.
    #[must_use]
    pub fn connected_clients(&self) -> usize {
        self.state.connected.len()
    }

    /// Delivers `payload` on `topic` to every matching subscription, as if it
    /// had been published by another party.
    ///
    /// Returns the number of subscriptions the message was delivered to.
    pub fn deliver(&self, topic: &str, payload: &[u8]) -> usize {
        self.state.deliver(topic, payload)
    }
}

impl BrokerConnector for InMemoryBroker {
    fn create_client(&self, options: BrokerOptions) -> Arc<dyn BrokerClient> {
        let id = self.state.next_client_id.fetch_add(1, Ordering::SeqCst);
        log::debug!(
            "Creating in-memory client {id} for {} ({})",
            options.app_id,
            options.address
        );
        self.state
            .clients
            .lock()
            .expect(MUTEX_POISONED)
            .push(options);

        Arc::new(InMemoryBrokerClient {
            id,
            state: Arc::clone(&self.state),
            connected: AtomicBool::new(false),
        })
    }
}

/// A client of an [`InMemoryBroker`].
pub struct InMemoryBrokerClient {
    id: u64,
    state: Arc<BrokerState>,
    connected: AtomicBool,
}

impl Debug for InMemoryBrokerClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(InMemoryBrokerClient))
            .field("id", &self.id)
            .field("connected", &self.connected.load(Ordering::SeqCst))
            .finish()
    }
}

impl InMemoryBrokerClient {
    fn ensure_connected(&self) -> Result<(), BrokerError> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BrokerError::NotConnected)
        }
    }

    fn remove_subscriptions(&self, filter: Option<&str>) {
        self.state
            .subscriptions
            .write()
            .expect(MUTEX_POISONED)
            .retain(|sub| sub.client_id != self.id || filter.is_some_and(|f| sub.filter != f));
    }
}

#[async_trait::async_trait]
impl BrokerClient for InMemoryBrokerClient {
    async fn connect(&self) -> Result<(), BrokerError> {
        self.state.pause(BrokerOperation::Connect).await;
        self.state.record_request(BrokerOperation::Connect)?;

        self.connected.store(true, Ordering::SeqCst);
        self.state.connected.insert(self.id, ());
        log::debug!("In-memory client {} connected", self.id);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), BrokerError> {
        self.state.pause(BrokerOperation::Disconnect).await;
        self.state.record_request(BrokerOperation::Disconnect)?;
        self.remove_subscriptions(None);
        self.connected.store(false, Ordering::SeqCst);
        self.state.connected.remove(&self.id);
        log::debug!("In-memory client {} disconnected", self.id);
        Ok(())
    }

    async fn subscribe(&self, filter: &str, handler: DeliveryHandler) -> Result<(), BrokerError> {
        self.state.pause(BrokerOperation::Subscribe).await;
        self.state.record_request(BrokerOperation::Subscribe)?;
        self.ensure_connected()?;

        let mut subscriptions = self.state.subscriptions.write().expect(MUTEX_POISONED);
        match subscriptions
            .iter_mut()
            .find(|sub| sub.client_id == self.id && sub.filter == filter)
        {
            Some(existing) => existing.handler = handler,
            None => subscriptions.push(Subscription {
                client_id: self.id,
                filter: filter.to_string(),
                handler,
            }),
        }
        log::trace!("In-memory client {} subscribed to {filter}", self.id);
        Ok(())
    }

    async fn unsubscribe(&self, filter: &str) -> Result<(), BrokerError> {
        self.state.pause(BrokerOperation::Unsubscribe).await;
        self.state.record_request(BrokerOperation::Unsubscribe)?;
        self.ensure_connected()?;
        self.remove_subscriptions(Some(filter));
        log::trace!("In-memory client {} unsubscribed from {filter}", self.id);
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
        self.state.pause(BrokerOperation::Publish).await;
        self.state.record_request(BrokerOperation::Publish)?;
        self.ensure_connected()?;

        self.state
            .published
            .lock()
            .expect(MUTEX_POISONED)
            .push(PublishRecord {
                topic: topic.to_string(),
                payload: payload.clone(),
            });
        self.state.deliver(topic, &payload);
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
