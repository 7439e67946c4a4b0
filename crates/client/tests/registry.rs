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

mod common;

use std::sync::{Arc, atomic::Ordering};

use common::mocks::{MockDiscovery, MockRegistryConnector, test_client};
use iotsdk_client::{
    ClientError,
    registry::{Device, DeviceRecord},
};
use iotsdk_model::identifiers::DevId;
use iotsdk_network::memory::InMemoryBroker;
use rstest::*;

#[fixture]
fn connector() -> Arc<MockRegistryConnector> {
    Arc::new(MockRegistryConnector::default())
}

#[rstest]
#[tokio::test]
async fn test_device_lifecycle_through_manager(connector: Arc<MockRegistryConnector>) {
    let broker = InMemoryBroker::new();
    let discovery = Arc::new(MockDiscovery::new("localhost:1883", "localhost:1904"));
    let client = test_client("test-app", 10, &broker, discovery).with_registry(connector.clone());
    let manager = client.device_manager().await.unwrap();

    let mut record = DeviceRecord::new(DevId::new("dev1"));
    record.dev_eui = "0004A30B001C0530".to_string();
    manager.set(&Device::new(record)).await.unwrap();

    let mut device = manager.get(&DevId::new("dev1")).await.unwrap();
    assert_eq!(device.record.dev_eui, "0004A30B001C0530");

    device.record.description = "greenhouse sensor".to_string();
    device.update().await.unwrap();
    device.personalize("nwk-key", "app-key").await.unwrap();

    let listed = manager.list(0, 10).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].record.description, "greenhouse sensor");
    assert_eq!(listed[0].record.dev_addr, "26011CD1");

    listed[0].delete().await.unwrap();
    assert!(manager.list(0, 0).await.unwrap().is_empty());
    assert!(matches!(
        manager.get(&DevId::new("dev1")).await,
        Err(ClientError::Registry(_))
    ));
}

#[rstest]
#[tokio::test]
async fn test_registry_connects_lazily_once(connector: Arc<MockRegistryConnector>) {
    let broker = InMemoryBroker::new();
    let discovery = Arc::new(MockDiscovery::new("localhost:1883", "localhost:1904"));
    let client = test_client("test-app", 10, &broker, discovery).with_registry(connector.clone());
    assert_eq!(connector.connects.load(Ordering::SeqCst), 0);

    client.device_manager().await.unwrap();
    client.device_manager().await.unwrap();
    assert_eq!(connector.connects.load(Ordering::SeqCst), 1);

    client.close().await.unwrap();
    client.device_manager().await.unwrap();
    assert_eq!(connector.connects.load(Ordering::SeqCst), 2);
}

#[rstest]
#[tokio::test]
async fn test_registry_without_announced_address(connector: Arc<MockRegistryConnector>) {
    let broker = InMemoryBroker::new();
    let discovery = Arc::new(MockDiscovery::new("localhost:1883", ""));
    let client = test_client("test-app", 10, &broker, discovery).with_registry(connector.clone());

    let err = client.device_manager().await.unwrap_err();

    assert!(matches!(err, ClientError::Configuration(_)));
    assert_eq!(connector.connects.load(Ordering::SeqCst), 0);
}

#[rstest]
#[tokio::test]
async fn test_unbound_device_cannot_update() {
    let device = Device::new(DeviceRecord::new(DevId::new("dev1")));

    assert!(matches!(
        device.update().await,
        Err(ClientError::Precondition(_))
    ));
}
