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

//! Join/activation notices for a device.

use serde::{Deserialize, Serialize};

use super::uplink::UplinkMetadata;
use crate::identifiers::{AppId, DevId};

/// A device activation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Activation {
    /// The application the device belongs to.
    pub app_id: AppId,
    /// The device which activated.
    pub dev_id: DevId,
    /// The application EUI (hex).
    #[serde(default)]
    pub app_eui: String,
    /// The device EUI (hex).
    #[serde(default)]
    pub dev_eui: String,
    /// The device address assigned on activation (hex).
    #[serde(default)]
    pub dev_addr: String,
    /// Reception metadata of the join request.
    #[serde(default)]
    pub metadata: UplinkMetadata,
}
