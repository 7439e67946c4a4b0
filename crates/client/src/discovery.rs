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

//! Endpoint discovery for an application.
//!
//! The discovery service announces where an application's broker and registry
//! live. Resolution must be idempotent; [`CachedDiscovery`] memoizes the first
//! successful answer per application.

use std::{
    fmt::{Debug, Formatter},
    sync::Arc,
};

use dashmap::DashMap;
use iotsdk_model::identifiers::AppId;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// The endpoints announced for an application.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Announcement {
    /// The ID of the announcing handler.
    pub id: String,
    /// The broker address, optionally prefixed with a transport scheme.
    pub mqtt_address: String,
    /// The registry (network API) address.
    pub net_address: String,
}

impl Announcement {
    /// Creates a new [`Announcement`] instance.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        mqtt_address: impl Into<String>,
        net_address: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            mqtt_address: mqtt_address.into(),
            net_address: net_address.into(),
        }
    }
}

/// Resolves the endpoints serving an application.
#[async_trait::async_trait]
pub trait Discovery: Send + Sync {
    /// Resolves the announcement for `app_id`.
    async fn resolve_broker_endpoint(&self, app_id: &AppId) -> Result<Announcement, ClientError>;
}

/// A [`Discovery`] returning a fixed announcement.
#[derive(Clone, Debug)]
pub struct StaticDiscovery {
    announcement: Announcement,
}

impl StaticDiscovery {
    /// Creates a new [`StaticDiscovery`] instance.
    #[must_use]
    pub const fn new(announcement: Announcement) -> Self {
        Self { announcement }
    }

    /// Creates a [`StaticDiscovery`] announcing only a broker address.
    #[must_use]
    pub fn broker(mqtt_address: impl Into<String>) -> Self {
        Self::new(Announcement::new("static", mqtt_address, ""))
    }
}

#[async_trait::async_trait]
impl Discovery for StaticDiscovery {
    async fn resolve_broker_endpoint(&self, _app_id: &AppId) -> Result<Announcement, ClientError> {
        Ok(self.announcement.clone())
    }
}

/// A [`Discovery`] which memoizes the first successful resolution per application.
///
/// Failures are not cached.
pub struct CachedDiscovery {
    inner: Arc<dyn Discovery>,
    cache: DashMap<AppId, Announcement>,
}

impl Debug for CachedDiscovery {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(CachedDiscovery))
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl CachedDiscovery {
    /// Creates a new [`CachedDiscovery`] wrapping `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn Discovery>) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
        }
    }

    /// Forgets the cached announcement for `app_id`.
    pub fn invalidate(&self, app_id: &AppId) {
        self.cache.remove(app_id);
    }
}

#[async_trait::async_trait]
impl Discovery for CachedDiscovery {
    async fn resolve_broker_endpoint(&self, app_id: &AppId) -> Result<Announcement, ClientError> {
        if let Some(announcement) = self.cache.get(app_id) {
            return Ok(announcement.clone());
        }

        let announcement = self.inner.resolve_broker_endpoint(app_id).await?;
        log::debug!(
            "Discovered handler '{}' for {app_id} (mqtt={}, net={})",
            announcement.id,
            announcement.mqtt_address,
            announcement.net_address
        );
        self.cache.insert(*app_id, announcement.clone());
        Ok(announcement)
    }
}
