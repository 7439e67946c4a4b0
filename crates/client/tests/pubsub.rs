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

use std::{sync::Arc, time::Duration};

use common::mocks::{MockDiscovery, test_client, uplink_payload};
use iotsdk_client::{
    Client, ClientConfig, ClientError,
    pubsub::{MessageStream, SubscriptionState},
};
use iotsdk_core::testing::wait_until_async;
use iotsdk_model::{
    enums::EventType,
    identifiers::DevId,
    messages::{DownlinkMessage, EventData, UplinkMessage},
};
use iotsdk_network::{
    broker::BrokerError,
    memory::{BrokerOperation, InMemoryBroker},
    mode::ConnectionState,
};
use pretty_assertions::assert_eq;
use rstest::*;
use tokio::sync::{Barrier, mpsc::error::TryRecvError};

const CONCURRENT_CALLERS: usize = 16;

#[fixture]
fn broker() -> InMemoryBroker {
    InMemoryBroker::new()
}

#[fixture]
fn discovery() -> Arc<MockDiscovery> {
    Arc::new(MockDiscovery::new("tcp://localhost:1883", "localhost:1904"))
}

async fn expect_closed<M>(stream: &MessageStream<M>) {
    let next = tokio::time::timeout(Duration::from_secs(2), stream.recv())
        .await
        .expect("stream did not close");
    assert!(next.is_none());
}

async fn wait_until_no_subscriptions(broker: &InMemoryBroker) {
    let broker = broker.clone();
    wait_until_async(
        move || {
            let broker = broker.clone();
            async move { broker.subscription_count() == 0 }
        },
        Duration::from_secs(2),
    )
    .await;
}

#[rstest]
#[tokio::test]
async fn test_end_to_end_uplinks_in_order(broker: InMemoryBroker, discovery: Arc<MockDiscovery>) {
    let client = test_client("A", 10, &broker, discovery);
    let app = client.pub_sub().await.unwrap();
    let stream = app.device(DevId::new("dev1")).subscribe_uplink().await.unwrap();

    for counter in 0..3 {
        let delivered = broker.deliver("A/devices/dev1/up", &uplink_payload("A", "dev1", counter));
        assert_eq!(delivered, 1);
    }

    for counter in 0..3 {
        let msg: UplinkMessage = stream.recv().await.unwrap();
        assert_eq!(msg.app_id.as_str(), "A");
        assert_eq!(msg.dev_id.as_str(), "dev1");
        assert_eq!(msg.counter, counter);
        assert_eq!(msg.payload_raw, vec![1, 2, 3]);
    }
    assert_eq!(stream.try_recv().unwrap_err(), TryRecvError::Empty);
}

#[rstest]
#[tokio::test]
async fn test_subscribe_is_idempotent(broker: InMemoryBroker, discovery: Arc<MockDiscovery>) {
    let client = test_client("test-app", 10, &broker, discovery);
    let app = client.pub_sub().await.unwrap();
    let device = app.device(DevId::new("dev1"));

    let first = device.subscribe_uplink().await.unwrap();
    let second = device.subscribe_uplink().await.unwrap();

    assert!(first.is_same_stream(&second));
    assert_eq!(broker.request_count(BrokerOperation::Subscribe), 1);
}

#[rstest]
#[tokio::test]
async fn test_overflow_drops_excess_without_blocking(
    broker: InMemoryBroker,
    discovery: Arc<MockDiscovery>,
) {
    let capacity = 5;
    let client = test_client("test-app", capacity, &broker, discovery);
    let app = client.pub_sub().await.unwrap();
    let stream = app.device(DevId::new("dev1")).subscribe_uplink().await.unwrap();

    for counter in 0..=capacity as u32 {
        broker.deliver(
            "test-app/devices/dev1/up",
            &uplink_payload("test-app", "dev1", counter),
        );
    }

    let mut received = Vec::new();
    while let Ok(msg) = stream.try_recv() {
        received.push(msg.counter);
    }
    assert_eq!(received, vec![0, 1, 2, 3, 4]);
}

#[rstest]
#[tokio::test]
async fn test_wildcard_stamps_device_from_topic(
    broker: InMemoryBroker,
    discovery: Arc<MockDiscovery>,
) {
    let client = test_client("test-app", 10, &broker, discovery);
    let app = client.pub_sub().await.unwrap();
    let stream = app.all_devices().subscribe_uplink().await.unwrap();

    broker.deliver("test-app/devices/dev1/up", &uplink_payload("x", "x", 1));
    broker.deliver("test-app/devices/dev2/up", &uplink_payload("x", "x", 2));
    broker.deliver("other-app/devices/dev3/up", &uplink_payload("x", "x", 3));

    let first = stream.recv().await.unwrap();
    let second = stream.recv().await.unwrap();
    assert_eq!((first.app_id.as_str(), first.dev_id.as_str()), ("test-app", "dev1"));
    assert_eq!((second.app_id.as_str(), second.dev_id.as_str()), ("test-app", "dev2"));
    assert!(stream.try_recv().is_err());
}

#[rstest]
#[tokio::test]
async fn test_events_cover_all_event_types(broker: InMemoryBroker, discovery: Arc<MockDiscovery>) {
    let client = test_client("test-app", 10, &broker, discovery);
    let app = client.pub_sub().await.unwrap();
    let device = app.device(DevId::new("dev1"));
    let events = device.subscribe_events().await.unwrap();
    let activations = device.subscribe_activations().await.unwrap();
    assert!(broker.is_subscribed("test-app/devices/dev1/events/#"));

    broker.deliver(
        "test-app/devices/dev1/events/down/sent",
        br#"{"payload":"AQI=","gateway_id":"gw-1"}"#,
    );
    broker.deliver("test-app/devices/dev1/events/create", b"{}");
    broker.deliver(
        "test-app/devices/dev1/events/activations",
        br#"{"dev_addr":"26011CD1"}"#,
    );

    let sent = events.recv().await.unwrap();
    assert_eq!(sent.event, EventType::DownlinkSent);
    assert!(matches!(sent.data, Some(EventData::Downlink(ref data)) if data.gateway_id == "gw-1"));

    let created = events.recv().await.unwrap();
    assert_eq!(created.event, EventType::Create);
    assert!(created.data.is_none());

    let activation_event = events.recv().await.unwrap();
    assert_eq!(activation_event.event, EventType::Activations);

    let activation = activations.recv().await.unwrap();
    assert_eq!(activation.dev_addr, "26011CD1");
    assert_eq!(activation.dev_id.as_str(), "dev1");
}

#[rstest]
#[tokio::test]
async fn test_publish_stamps_and_reports_ack_error(
    broker: InMemoryBroker,
    discovery: Arc<MockDiscovery>,
) {
    let client = test_client("test-app", 10, &broker, discovery);
    let app = client.pub_sub().await.unwrap();
    let device = app.device(DevId::new("dev7"));
    let downlink = DownlinkMessage::new(2, vec![0xAB]);

    device.publish(&downlink).await.unwrap();

    let published = broker.published();
    assert_eq!(published[0].topic, "test-app/devices/dev7/down");
    let sent: DownlinkMessage = serde_json::from_slice(&published[0].payload).unwrap();
    assert_eq!(sent.app_id.map(|id| id.to_string()), Some("test-app".to_string()));
    assert_eq!(sent.dev_id.map(|id| id.to_string()), Some("dev7".to_string()));
    assert_eq!(sent.payload_raw, vec![0xAB]);

    let ack_error = BrokerError::Rejected("not authorized to publish".to_string());
    broker.fail_next(BrokerOperation::Publish, ack_error.clone());

    let err = device.publish(&downlink).await.unwrap_err();
    assert_eq!(err, ClientError::Publish(ack_error));
}

#[rstest]
#[tokio::test]
async fn test_application_close_tears_down_every_device(
    broker: InMemoryBroker,
    discovery: Arc<MockDiscovery>,
) {
    let client = test_client("test-app", 10, &broker, discovery);
    let app = client.pub_sub().await.unwrap();
    let dev1 = app.device(DevId::new("dev1"));
    let dev2 = app.device(DevId::new("dev2"));
    let all = app.all_devices();

    let dev1_uplink = dev1.subscribe_uplink().await.unwrap();
    let dev1_events = dev1.subscribe_events().await.unwrap();
    let dev1_activations = dev1.subscribe_activations().await.unwrap();
    let stale = dev2.subscribe_uplink().await.unwrap();
    dev2.unsubscribe_uplink().await.unwrap();
    let dev2_uplink = dev2.subscribe_uplink().await.unwrap();
    let all_events = all.subscribe_events().await.unwrap();
    assert_eq!(broker.subscription_count(), 5);

    app.close();

    expect_closed(&dev1_uplink).await;
    expect_closed(&dev1_events).await;
    expect_closed(&dev1_activations).await;
    expect_closed(&stale).await;
    expect_closed(&dev2_uplink).await;
    expect_closed(&all_events).await;
    wait_until_no_subscriptions(&broker).await;
    assert_eq!(client.connection_state(), ConnectionState::Connected);
}

#[rstest]
#[tokio::test]
async fn test_operations_fail_fast_after_application_close(
    broker: InMemoryBroker,
    discovery: Arc<MockDiscovery>,
) {
    let client = test_client("test-app", 10, &broker, discovery);
    let app = client.pub_sub().await.unwrap();
    let device = app.device(DevId::new("dev1"));
    app.close();
    let subscribes = broker.request_count(BrokerOperation::Subscribe);

    let subscribe_err = device.subscribe_uplink().await.unwrap_err();
    let publish_err = device
        .publish(&DownlinkMessage::new(1, vec![1]))
        .await
        .unwrap_err();

    assert!(subscribe_err.is_cancelled());
    assert!(publish_err.is_cancelled());
    assert!(app.device(DevId::new("dev2")).subscribe_events().await.unwrap_err().is_cancelled());
    assert_eq!(broker.request_count(BrokerOperation::Subscribe), subscribes);
    assert_eq!(broker.request_count(BrokerOperation::Publish), 0);
}

#[rstest]
#[tokio::test]
async fn test_independent_application_scopes_share_connection(
    broker: InMemoryBroker,
    discovery: Arc<MockDiscovery>,
) {
    let client = test_client("test-app", 10, &broker, discovery.clone());
    let first = client.pub_sub().await.unwrap();
    let second = client.pub_sub().await.unwrap();
    let survivor = second.device(DevId::new("dev1")).subscribe_uplink().await.unwrap();

    first.close();
    broker.deliver(
        "test-app/devices/dev1/up",
        &uplink_payload("test-app", "dev1", 9),
    );

    assert_eq!(survivor.recv().await.unwrap().counter, 9);
    assert_eq!(broker.request_count(BrokerOperation::Connect), 1);
    assert_eq!(discovery.calls(), 1);
}

#[rstest]
#[tokio::test]
async fn test_device_scopes_share_one_subscription(
    broker: InMemoryBroker,
    discovery: Arc<MockDiscovery>,
) {
    let client = test_client("test-app", 10, &broker, discovery);
    let first = client.pub_sub().await.unwrap().device(DevId::new("dev1"));
    let second = client.pub_sub().await.unwrap().device(DevId::new("dev1"));

    let first_stream = first.subscribe_uplink().await.unwrap();
    let second_stream = second.subscribe_uplink().await.unwrap();
    broker.deliver(
        "test-app/devices/dev1/up",
        &uplink_payload("test-app", "dev1", 4),
    );

    assert!(first_stream.is_same_stream(&second_stream));
    assert_eq!(broker.request_count(BrokerOperation::Subscribe), 1);
    assert_eq!(first_stream.recv().await.unwrap().counter, 4);
    assert_eq!(second_stream.try_recv().unwrap_err(), TryRecvError::Empty);

    second.unsubscribe_uplink().await.unwrap();

    assert_eq!(first.uplink().state(), SubscriptionState::Unsubscribed);
    expect_closed(&first_stream).await;
    assert_eq!(broker.subscription_count(), 0);
}

#[rstest]
fn test_out_of_range_buffer_capacity_is_rejected(
    broker: InMemoryBroker,
    discovery: Arc<MockDiscovery>,
) {
    for buffer_capacity in [0, usize::MAX] {
        let config = ClientConfig {
            buffer_capacity,
            ..ClientConfig::new("test-app", "test-access-key")
        };
        let result = Client::new(config, discovery.clone(), Arc::new(broker.clone()));
        assert!(result.is_err());
    }
    assert!(broker.created_clients().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_client_close_tears_down_and_allows_reconnect(
    broker: InMemoryBroker,
    discovery: Arc<MockDiscovery>,
) {
    let client = test_client("test-app", 10, &broker, discovery);
    let app = client.pub_sub().await.unwrap();
    let device = app.device(DevId::new("dev1"));
    let stream = device.subscribe_uplink().await.unwrap();

    client.close().await.unwrap();

    assert_eq!(client.connection_state(), ConnectionState::Idle);
    assert!(app.is_closed());
    expect_closed(&stream).await;
    assert!(device.subscribe_uplink().await.unwrap_err().is_cancelled());

    let app = client.pub_sub().await.unwrap();
    assert!(!app.is_closed());
    assert_eq!(broker.request_count(BrokerOperation::Connect), 2);
    assert_eq!(broker.connected_clients(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_use_connects_once(
    broker: InMemoryBroker,
    discovery: Arc<MockDiscovery>,
) {
    broker.set_delay(BrokerOperation::Connect, Duration::from_millis(100));
    let client = Arc::new(test_client("test-app", 10, &broker, discovery.clone()));
    let barrier = Arc::new(Barrier::new(CONCURRENT_CALLERS));

    let tasks = (0..CONCURRENT_CALLERS).map(|_| {
        let client = Arc::clone(&client);
        let barrier = Arc::clone(&barrier);
        tokio::spawn(async move {
            barrier.wait().await;
            client.pub_sub().await.map(|_| ())
        })
    });
    let results = futures::future::join_all(tasks).await;

    for result in results {
        assert!(result.unwrap().is_ok());
    }
    assert_eq!(broker.request_count(BrokerOperation::Connect), 1);
    assert_eq!(discovery.calls(), 1);
    assert_eq!(client.connection_state(), ConnectionState::Connected);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_share_connect_failure(
    broker: InMemoryBroker,
    discovery: Arc<MockDiscovery>,
) {
    broker.set_delay(BrokerOperation::Connect, Duration::from_millis(100));
    let connect_error = BrokerError::Rejected("bad access key".to_string());
    broker.fail_next(BrokerOperation::Connect, connect_error.clone());
    let client = Arc::new(test_client("test-app", 10, &broker, discovery));
    let barrier = Arc::new(Barrier::new(CONCURRENT_CALLERS));

    let tasks = (0..CONCURRENT_CALLERS).map(|_| {
        let client = Arc::clone(&client);
        let barrier = Arc::clone(&barrier);
        tokio::spawn(async move {
            barrier.wait().await;
            client.pub_sub().await.map(|_| ())
        })
    });
    let results = futures::future::join_all(tasks).await;

    for result in results {
        assert_eq!(
            result.unwrap(),
            Err(ClientError::Connection(connect_error.clone()))
        );
    }
    assert_eq!(broker.request_count(BrokerOperation::Connect), 1);
    assert_eq!(client.connection_state(), ConnectionState::Idle);

    assert!(client.pub_sub().await.is_ok());
    assert_eq!(broker.request_count(BrokerOperation::Connect), 2);
}

#[rstest]
#[case("")]
#[case("ftp://broker.example")]
#[case("ssl://")]
#[tokio::test]
async fn test_bad_broker_address_is_configuration_error(
    broker: InMemoryBroker,
    #[case] mqtt_address: &str,
) {
    let discovery = Arc::new(MockDiscovery::new(mqtt_address, ""));
    let client = test_client("test-app", 10, &broker, discovery.clone());

    let err = client.pub_sub().await.unwrap_err();

    assert!(matches!(err, ClientError::Configuration(_)));
    assert_eq!(discovery.calls(), 1);
    assert!(broker.created_clients().is_empty());
    assert_eq!(client.connection_state(), ConnectionState::Idle);
}

#[rstest]
#[tokio::test]
async fn test_discovery_failure_is_surfaced_verbatim(broker: InMemoryBroker) {
    let discovery = Arc::new(MockDiscovery::new("localhost:1883", ""));
    let failure = ClientError::Discovery("discovery server unreachable".to_string());
    *discovery.fail.lock().unwrap() = Some(failure.clone());
    let client = test_client("test-app", 10, &broker, discovery.clone());

    assert_eq!(client.pub_sub().await.unwrap_err(), failure);
    assert!(client.pub_sub().await.is_ok());
    assert_eq!(discovery.calls(), 2);
}
