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

//! Fixture functions to provide stub messages for testing.

use rstest::fixture;

use crate::{
    identifiers::{AppId, DevId},
    messages::{DownlinkMessage, UplinkMessage, UplinkMetadata},
};

#[fixture]
pub fn uplink() -> UplinkMessage {
    UplinkMessage {
        app_id: AppId::from("test-app"),
        dev_id: DevId::from("dev1"),
        hardware_serial: "0102030405060708".to_string(),
        port: 1,
        counter: 0,
        is_retry: false,
        confirmed: false,
        payload_raw: vec![1, 2],
        payload_fields: None,
        metadata: UplinkMetadata::default(),
    }
}

#[fixture]
pub fn downlink() -> DownlinkMessage {
    DownlinkMessage::new(1, vec![0x01, 0x02, 0x03])
}
