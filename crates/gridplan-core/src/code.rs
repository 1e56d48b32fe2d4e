//! Node codes.
//!
//! Every endpoint of the network is named by a short code:
//!
//! ```text
//!   energy     EL NY         kind + zone
//!   transport  TC NY PA      mode + origin zone + destination zone
//! ```
//!
//! Codes beginning with `X` are phantom endpoints (sources and sinks that
//! carry no balance constraint).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{GridplanError, GridplanResult};

const ENERGY_LEN: usize = 4;
const TRANSPORT_LEN: usize = 6;

/// A validated energy or transport node code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeCode(String);

impl NodeCode {
    pub fn new(code: &str) -> GridplanResult<Self> {
        if code.len() != ENERGY_LEN && code.len() != TRANSPORT_LEN {
            return Err(GridplanError::Validation(format!(
                "node code '{}' must have {} (energy) or {} (transport) characters",
                code, ENERGY_LEN, TRANSPORT_LEN
            )));
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(GridplanError::Validation(format!(
                "node code '{}' must be ASCII alphanumeric",
                code
            )));
        }
        Ok(Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Two-character kind (energy) or mode (transport).
    pub fn kind(&self) -> &str {
        &self.0[..2]
    }

    /// Zone of an energy code, origin zone of a transport code.
    pub fn zone(&self) -> &str {
        &self.0[2..4]
    }

    /// Destination zone of a transport code.
    pub fn destination_zone(&self) -> Option<&str> {
        self.is_transport().then(|| &self.0[4..6])
    }

    pub fn is_transport(&self) -> bool {
        self.0.len() == TRANSPORT_LEN
    }

    pub fn is_phantom(&self) -> bool {
        self.0.starts_with('X')
    }

    /// The same route travelled the other way. Energy codes have no
    /// direction and come back unchanged.
    pub fn reversed(&self) -> NodeCode {
        match self.destination_zone() {
            Some(dest) => NodeCode(format!("{}{}{}", self.kind(), dest, self.zone())),
            None => self.clone(),
        }
    }

    /// Replace the two kind characters, keeping the zones.
    pub fn with_kind(&self, first: char, second: char) -> NodeCode {
        NodeCode(format!("{}{}{}", first, second, &self.0[2..]))
    }

    /// Transport node loaded when energy leaves `origin` towards `destination`.
    pub fn coupled_transport(origin: &NodeCode, destination: &NodeCode) -> GridplanResult<NodeCode> {
        if origin.is_transport() {
            return Err(GridplanError::Validation(format!(
                "coupling origin '{}' must be an energy code",
                origin
            )));
        }
        Ok(NodeCode(format!("{}{}", origin.0, destination.zone())))
    }

    pub fn first_char(&self) -> char {
        self.0.as_bytes()[0] as char
    }

    pub fn second_char(&self) -> char {
        self.0.as_bytes()[1] as char
    }
}

impl fmt::Display for NodeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NodeCode {
    type Err = GridplanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeCode::new(s)
    }
}

impl Serialize for NodeCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NodeCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        NodeCode::new(&text).map_err(serde::de::Error::custom)
    }
}
