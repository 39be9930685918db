/*!
Session-level enumerations: endpoint role, IF-T transport binding, TNCCS
protocol variant, and endpoint identities.
*/

use std::fmt;

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

/// Endpoint role in the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum Role {
    /// Network access requestor (TNC Client, hosts IMCs)
    Requestor,
    /// Policy decision point (TNC Server, hosts IMVs)
    Responder,
}

impl Role {
    /// Role selected by the factory's `is_server` flag
    pub fn from_is_server(is_server: bool) -> Self {
        if is_server {
            Role::Responder
        } else {
            Role::Requestor
        }
    }

    pub fn is_server(self) -> bool {
        self == Role::Responder
    }

    /// The role on the other end of the session
    pub fn peer(self) -> Self {
        match self {
            Role::Requestor => Role::Responder,
            Role::Responder => Role::Requestor,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Requestor => write!(f, "TNC Client"),
            Role::Responder => write!(f, "TNC Server"),
        }
    }
}

/// Carrier (IF-T binding) the session runs over
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum TransportType {
    #[default]
    Unknown = 0,
    Eap1_0 = 1,
    Eap1_1 = 2,
    Eap2_0 = 3,
    Tls1_0 = 4,
    Tls2_0 = 5,
}

impl TransportType {
    /// Every binding type, in wire-code order
    pub const ALL: [TransportType; 6] = [
        TransportType::Unknown,
        TransportType::Eap1_0,
        TransportType::Eap1_1,
        TransportType::Eap2_0,
        TransportType::Tls1_0,
        TransportType::Tls2_0,
    ];

    /// Convert a u8 value to a TransportType
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportType::Unknown => write!(f, "unknown IF-T"),
            TransportType::Eap1_0 => write!(f, "EAP 1.0"),
            TransportType::Eap1_1 => write!(f, "EAP 1.1"),
            TransportType::Eap2_0 => write!(f, "EAP 2.0"),
            TransportType::Tls1_0 => write!(f, "TLS 1.0"),
            TransportType::Tls2_0 => write!(f, "TLS 2.0"),
        }
    }
}

/// TNC Client/Server protocol variant
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum TnccsType {
    #[default]
    Unknown = 0,
    V1_1 = 1,
    Soh = 2,
    V2_0 = 3,
    /// Variant negotiated from the peer's first batch
    Dynamic = 4,
}

impl TnccsType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(TnccsType::Unknown),
            1 => Some(TnccsType::V1_1),
            2 => Some(TnccsType::Soh),
            3 => Some(TnccsType::V2_0),
            4 => Some(TnccsType::Dynamic),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Whether this names an actual wire protocol
    pub fn is_concrete(self) -> bool {
        matches!(self, TnccsType::V1_1 | TnccsType::Soh | TnccsType::V2_0)
    }
}

impl fmt::Display for TnccsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TnccsType::Unknown => write!(f, "unknown TNCCS"),
            TnccsType::V1_1 => write!(f, "TNCCS 1.1"),
            TnccsType::Soh => write!(f, "TNCCS-SOH"),
            TnccsType::V2_0 => write!(f, "TNCCS 2.0"),
            TnccsType::Dynamic => write!(f, "dynamic TNCCS"),
        }
    }
}

/// Identity of a session endpoint, as authenticated by the carrier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct Identity(String);

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identity used when the carrier did not supply one
    pub fn any() -> Self {
        Self("%any".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_any(&self) -> bool {
        self.0 == "%any"
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
