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

//! Device registry access.
//!
//! The registry is an external request/response collaborator reached through the
//! `net_address` of the application's announcement. [`RegistryLink`] connects to
//! it lazily, and [`DeviceManager`] binds it to one application.

use std::{
    fmt::{Debug, Formatter},
    sync::Arc,
};

use ahash::AHashMap;
use iotsdk_model::identifiers::{AppId, DevId};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    discovery::{Announcement, Discovery},
    error::ClientError,
};

/// A device record as stored in the registry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub dev_id: DevId,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub app_eui: String,
    #[serde(default)]
    pub dev_eui: String,
    #[serde(default)]
    pub dev_addr: String,
    #[serde(default)]
    pub nwk_s_key: String,
    #[serde(default)]
    pub app_s_key: String,
    #[serde(default)]
    pub app_key: String,
    #[serde(default)]
    pub fcnt_up: u32,
    #[serde(default)]
    pub fcnt_down: u32,
    #[serde(default)]
    pub disable_fcnt_check: bool,
    #[serde(default)]
    pub uses_32bit_fcnt: bool,
    #[serde(default)]
    pub latitude: f32,
    #[serde(default)]
    pub longitude: f32,
    #[serde(default)]
    pub altitude: i32,
    #[serde(default)]
    pub attributes: AHashMap<String, String>,
}

impl DeviceRecord {
    /// Creates a new empty [`DeviceRecord`] for `dev_id`.
    #[must_use]
    pub fn new(dev_id: DevId) -> Self {
        Self {
            dev_id,
            description: String::new(),
            app_eui: String::new(),
            dev_eui: String::new(),
            dev_addr: String::new(),
            nwk_s_key: String::new(),
            app_s_key: String::new(),
            app_key: String::new(),
            fcnt_up: 0,
            fcnt_down: 0,
            disable_fcnt_check: false,
            uses_32bit_fcnt: false,
            latitude: 0.0,
            longitude: 0.0,
            altitude: 0,
            attributes: AHashMap::new(),
        }
    }
}

/// Request/response access to the device registry.
#[async_trait::async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// Lists the application's devices, skipping `offset` and returning at most
    /// `limit` (zero meaning no limit).
    async fn list(
        &self,
        app_id: &AppId,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<DeviceRecord>, ClientError>;

    /// Gets one device.
    async fn get(&self, app_id: &AppId, dev_id: &DevId) -> Result<DeviceRecord, ClientError>;

    /// Creates or updates a device.
    async fn set(&self, app_id: &AppId, record: &DeviceRecord) -> Result<(), ClientError>;

    /// Deletes a device.
    async fn delete(&self, app_id: &AppId, dev_id: &DevId) -> Result<(), ClientError>;

    /// Allocates a device address for personalizing a device.
    async fn allocate_dev_addr(&self, app_id: &AppId) -> Result<String, ClientError>;
}

/// Connects to the device registry announced for an application.
#[async_trait::async_trait]
pub trait RegistryConnector: Send + Sync {
    /// Connects to the registry at `announcement.net_address`.
    async fn connect(
        &self,
        announcement: &Announcement,
    ) -> Result<Arc<dyn DeviceRegistry>, ClientError>;
}

/// The lazily established link to the device registry.
pub struct RegistryLink {
    app_id: AppId,
    discovery: Arc<dyn Discovery>,
    connector: Arc<dyn RegistryConnector>,
    registry: Mutex<Option<Arc<dyn DeviceRegistry>>>,
}

impl Debug for RegistryLink {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(RegistryLink))
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

impl RegistryLink {
    /// Creates a new unconnected [`RegistryLink`] instance.
    #[must_use]
    pub fn new(
        app_id: AppId,
        discovery: Arc<dyn Discovery>,
        connector: Arc<dyn RegistryConnector>,
    ) -> Self {
        Self {
            app_id,
            discovery,
            connector,
            registry: Mutex::new(None),
        }
    }

    /// Ensures the registry is connected, connecting on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if discovery fails, no registry address is announced, or
    /// the connection fails. Failures are not retried.
    pub async fn ensure_connected(&self) -> Result<Arc<dyn DeviceRegistry>, ClientError> {
        let mut registry = self.registry.lock().await;
        if let Some(registry) = registry.as_ref() {
            return Ok(Arc::clone(registry));
        }

        let announcement = self.discovery.resolve_broker_endpoint(&self.app_id).await?;
        if announcement.net_address.trim().is_empty() {
            return Err(ClientError::Configuration(format!(
                "No registry address announced for {}",
                self.app_id
            )));
        }

        log::debug!(
            "Connecting to registry at {} (handler '{}')",
            announcement.net_address,
            announcement.id
        );
        let connected = self.connector.connect(&announcement).await.inspect_err(|e| {
            log::debug!("Could not connect to registry at {}: {e}", announcement.net_address);
        })?;
        log::debug!("Connected to registry at {}", announcement.net_address);

        *registry = Some(Arc::clone(&connected));
        Ok(connected)
    }

    /// Drops the registry connection. A later call reconnects.
    pub async fn close(&self) {
        if self.registry.lock().await.take().is_some() {
            log::debug!("Closed registry connection for {}", self.app_id);
        }
    }
}

/// Registry operations bound to one application.
#[derive(Clone)]
pub struct DeviceManager {
    app_id: AppId,
    registry: Arc<dyn DeviceRegistry>,
}

impl Debug for DeviceManager {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(DeviceManager))
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

impl DeviceManager {
    /// Creates a new [`DeviceManager`] instance.
    #[must_use]
    pub fn new(app_id: AppId, registry: Arc<dyn DeviceRegistry>) -> Self {
        Self { app_id, registry }
    }

    #[must_use]
    pub fn app_id(&self) -> AppId {
        self.app_id
    }

    /// Lists the application's devices.
    ///
    /// # Errors
    ///
    /// Returns the registry's error.
    pub async fn list(&self, offset: usize, limit: usize) -> Result<Vec<Device>, ClientError> {
        let records = self.registry.list(&self.app_id, offset, limit).await?;
        Ok(records
            .into_iter()
            .map(|record| Device::bound(record, self.clone()))
            .collect())
    }

    /// Gets one device.
    ///
    /// # Errors
    ///
    /// Returns the registry's error.
    pub async fn get(&self, dev_id: &DevId) -> Result<Device, ClientError> {
        let record = self.registry.get(&self.app_id, dev_id).await?;
        Ok(Device::bound(record, self.clone()))
    }

    /// Creates or updates a device.
    ///
    /// # Errors
    ///
    /// Returns the registry's error.
    pub async fn set(&self, device: &Device) -> Result<(), ClientError> {
        self.registry.set(&self.app_id, &device.record).await
    }

    /// Deletes a device.
    ///
    /// # Errors
    ///
    /// Returns the registry's error.
    pub async fn delete(&self, dev_id: &DevId) -> Result<(), ClientError> {
        self.registry.delete(&self.app_id, dev_id).await
    }
}

/// A device of the registry.
///
/// Devices obtained through a [`DeviceManager`] are bound to it and can update,
/// personalize and delete themselves. A device created with [`Device::new`] must
/// be stored with [`DeviceManager::set`] instead.
#[derive(Clone, Debug)]
pub struct Device {
    pub record: DeviceRecord,
    manager: Option<DeviceManager>,
}

impl Device {
    /// Creates a new unbound [`Device`] instance.
    #[must_use]
    pub const fn new(record: DeviceRecord) -> Self {
        Self {
            record,
            manager: None,
        }
    }

    fn bound(record: DeviceRecord, manager: DeviceManager) -> Self {
        Self {
            record,
            manager: Some(manager),
        }
    }

    fn manager(&self, operation: &str) -> Result<&DeviceManager, ClientError> {
        self.manager.as_ref().ok_or_else(|| {
            ClientError::Precondition(format!(
                "cannot {operation} device '{}' not obtained from a device manager",
                self.record.dev_id
            ))
        })
    }

    /// Stores the device's current record.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Precondition`] if the device is unbound, or the
    /// registry's error.
    pub async fn update(&self) -> Result<(), ClientError> {
        self.manager("update")?.set(self).await
    }

    /// Personalizes the device with session keys and a newly allocated address,
    /// then stores it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Precondition`] if the device is unbound, or the
    /// registry's error.
    pub async fn personalize(
        &mut self,
        nwk_s_key: impl Into<String>,
        app_s_key: impl Into<String>,
    ) -> Result<(), ClientError> {
        let manager = self.manager("personalize")?.clone();
        let dev_addr = manager.registry.allocate_dev_addr(&manager.app_id).await?;

        self.record.dev_addr = dev_addr;
        self.record.nwk_s_key = nwk_s_key.into();
        self.record.app_s_key = app_s_key.into();
        manager.set(self).await
    }

    /// Deletes the device from the registry.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Precondition`] if the device is unbound, or the
    /// registry's error.
    pub async fn delete(&self) -> Result<(), ClientError> {
        self.manager("delete")?.delete(&self.record.dev_id).await
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
