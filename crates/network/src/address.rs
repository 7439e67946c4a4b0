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

//! Broker address parsing and transport selection.
//!
//! Discovery announces broker addresses in a loose form (`host:port`,
//! `tcp://host`, `ssl://host:8883`). This module normalises them and decides
//! whether the connection must be secured, based on the scheme prefix.

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use strum::{AsRefStr, Display};
use url::Url;

/// The default port for plain broker connections.
pub const DEFAULT_PLAIN_PORT: u16 = 1883;

/// The default port for secure broker connections.
pub const DEFAULT_TLS_PORT: u16 = 8883;

const PLAIN_SCHEMES: [&str; 2] = ["tcp", "mqtt"];
const TLS_SCHEMES: [&str; 3] = ["ssl", "tls", "mqtts"];

/// Error produced when a broker address is missing or malformed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("Broker address is empty")]
    Empty,
    #[error("Unsupported broker address scheme '{0}'")]
    UnsupportedScheme(String),
    #[error("Malformed broker address '{address}': {reason}")]
    Malformed { address: String, reason: String },
}

/// Transport used for the broker connection.
#[derive(Clone, Copy, Debug, Display, Hash, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum TransportMode {
    /// Plain TCP.
    Plain,
    /// TLS over TCP.
    Tls,
}

impl TransportMode {
    /// Returns the canonical scheme for the transport.
    #[must_use]
    pub const fn scheme(&self) -> &'static str {
        match self {
            Self::Plain => "tcp",
            Self::Tls => "ssl",
        }
    }

    /// Returns the default port for the transport.
    #[must_use]
    pub const fn default_port(&self) -> u16 {
        match self {
            Self::Plain => DEFAULT_PLAIN_PORT,
            Self::Tls => DEFAULT_TLS_PORT,
        }
    }
}

/// A validated broker address.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct BrokerAddress {
    /// The transport selected from the scheme.
    pub transport: TransportMode,
    /// The host name or IP address.
    pub host: String,
    /// The port.
    pub port: u16,
}

impl BrokerAddress {
    /// Parses and validates a raw broker address.
    ///
    /// A missing scheme means a plain connection. A missing port falls back to
    /// the transport's default port.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is empty, has an unsupported scheme, or
    /// cannot be parsed into a host and port.
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AddressError::Empty);
        }

        let (scheme, rest) = match raw.split_once("://") {
            Some((scheme, rest)) => (scheme.to_ascii_lowercase(), rest),
            None => (TransportMode::Plain.scheme().to_string(), raw),
        };

        let transport = if PLAIN_SCHEMES.contains(&scheme.as_str()) {
            TransportMode::Plain
        } else if TLS_SCHEMES.contains(&scheme.as_str()) {
            TransportMode::Tls
        } else {
            return Err(AddressError::UnsupportedScheme(scheme));
        };

        let malformed = |reason: String| AddressError::Malformed {
            address: raw.to_string(),
            reason,
        };

        let url = Url::parse(&format!("{}://{rest}", transport.scheme()))
            .map_err(|e| malformed(e.to_string()))?;

        if !matches!(url.path(), "" | "/") || url.query().is_some() || url.fragment().is_some() {
            return Err(malformed("unexpected path or query".to_string()));
        }

        let host = match url.host_str() {
            Some(host) if !host.is_empty() => host,
            _ => return Err(malformed("missing host".to_string())),
        };
        // Bracketed IPv6 literals are stored without the brackets
        let host = host.trim_start_matches('[').trim_end_matches(']').to_string();

        Ok(Self {
            transport,
            host,
            port: url.port().unwrap_or_else(|| transport.default_port()),
        })
    }

    /// Returns whether the connection must be secured.
    #[must_use]
    pub const fn is_secure(&self) -> bool {
        matches!(self.transport, TransportMode::Tls)
    }
}

impl FromStr for BrokerAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for BrokerAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.host.contains(':') {
            write!(f, "{}://[{}]:{}", self.transport.scheme(), self.host, self.port)
        } else {
            write!(f, "{}://{}:{}", self.transport.scheme(), self.host, self.port)
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
