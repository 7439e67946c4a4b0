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

//! Fixture functions to provide stub identifiers for testing.

use rstest::fixture;

use crate::identifiers::{AppId, DevId};

#[fixture]
pub fn app_id() -> AppId {
    AppId::from("test-app")
}

#[fixture]
pub fn dev_id() -> DevId {
    DevId::from("dev1")
}

#[fixture]
pub fn dev_id_wildcard() -> DevId {
    DevId::wildcard()
}
