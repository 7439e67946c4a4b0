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

//! Mock collaborators for client integration tests.

// Not every test binary uses every mock
#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use ahash::AHashMap;
use iotsdk_client::{
    ClientConfig, ClientError,
    client::Client,
    discovery::{Announcement, Discovery},
    registry::{DeviceRecord, DeviceRegistry, RegistryConnector},
};
use iotsdk_model::identifiers::{AppId, DevId};
use iotsdk_network::memory::InMemoryBroker;

/// A [`Discovery`] which counts resolutions and can be told to fail.
#[derive(Debug)]
pub struct MockDiscovery {
    pub announcement: Announcement,
    pub calls: AtomicUsize,
    pub fail: Mutex<Option<ClientError>>,
}

impl MockDiscovery {
    pub fn new(mqtt_address: &str, net_address: &str) -> Self {
        Self {
            announcement: Announcement::new("test-handler", mqtt_address, net_address),
            calls: AtomicUsize::new(0),
            fail: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Discovery for MockDiscovery {
    async fn resolve_broker_endpoint(&self, _app_id: &AppId) -> Result<Announcement, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.fail.lock().unwrap().take() {
            return Err(err);
        }
        Ok(self.announcement.clone())
    }
}

/// An in-memory [`DeviceRegistry`] keyed by application and device.
#[derive(Debug, Default)]
pub struct MockRegistry {
    pub devices: Mutex<AHashMap<(AppId, DevId), DeviceRecord>>,
    pub requests: AtomicUsize,
}

impl MockRegistry {
    fn count(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl DeviceRegistry for MockRegistry {
    async fn list(
        &self,
        app_id: &AppId,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<DeviceRecord>, ClientError> {
        self.count();
        let devices = self.devices.lock().unwrap();
        let mut records: Vec<DeviceRecord> = devices
            .iter()
            .filter(|((app, _), _)| app == app_id)
            .map(|(_, record)| record.clone())
            .collect();
        records.sort_by(|a, b| a.dev_id.cmp(&b.dev_id));
        let limit = if limit == 0 { usize::MAX } else { limit };
        Ok(records.into_iter().skip(offset).take(limit).collect())
    }

    async fn get(&self, app_id: &AppId, dev_id: &DevId) -> Result<DeviceRecord, ClientError> {
        self.count();
        self.devices
            .lock()
            .unwrap()
            .get(&(*app_id, *dev_id))
            .cloned()
            .ok_or_else(|| ClientError::Registry(format!("device '{dev_id}' not found")))
    }

    async fn set(&self, app_id: &AppId, record: &DeviceRecord) -> Result<(), ClientError> {
        self.count();
        self.devices
            .lock()
            .unwrap()
            .insert((*app_id, record.dev_id), record.clone());
        Ok(())
    }

    async fn delete(&self, app_id: &AppId, dev_id: &DevId) -> Result<(), ClientError> {
        self.count();
        self.devices
            .lock()
            .unwrap()
            .remove(&(*app_id, *dev_id))
            .map(|_| ())
            .ok_or_else(|| ClientError::Registry(format!("device '{dev_id}' not found")))
    }

    async fn allocate_dev_addr(&self, _app_id: &AppId) -> Result<String, ClientError> {
        self.count();
        Ok("26011CD1".to_string())
    }
}

/// A [`RegistryConnector`] handing out one shared [`MockRegistry`].
#[derive(Debug, Default)]
pub struct MockRegistryConnector {
    pub registry: Arc<MockRegistry>,
    pub connects: AtomicUsize,
}

#[async_trait::async_trait]
impl RegistryConnector for MockRegistryConnector {
    async fn connect(
        &self,
        _announcement: &Announcement,
    ) -> Result<Arc<dyn DeviceRegistry>, ClientError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.registry.clone())
    }
}

/// Builds a client for `app_id` over `broker`.
pub fn test_client(
    app_id: &str,
    buffer_capacity: usize,
    broker: &InMemoryBroker,
    discovery: Arc<MockDiscovery>,
) -> Client {
    let config = ClientConfig {
        buffer_capacity,
        connect_timeout_ms: 5_000,
        ..ClientConfig::new(app_id, "test-access-key")
    };
    Client::new(config, discovery, Arc::new(broker.clone())).unwrap()
}

/// Returns an uplink JSON payload carrying `counter`.
pub fn uplink_payload(app_id: &str, dev_id: &str, counter: u32) -> Vec<u8> {
    format!(
        r#"{{"app_id":"{app_id}","dev_id":"{dev_id}","port":1,"counter":{counter},"payload_raw":"AQID"}}"#
    )
    .into_bytes()
}
