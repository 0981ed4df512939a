//! Protocol versions

use std::fmt;

use serde::{Deserialize, Serialize};

/// Protocol version needed to represent a type on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProtocolVersion {
    /// 1.0
    V1,
    /// 2.0
    V2,
    /// 3.0
    V3,
    /// 4.0
    V4,
}

impl ProtocolVersion {
    /// Lowest version every type can be represented in
    pub const BASELINE: ProtocolVersion = ProtocolVersion::V1;
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        ProtocolVersion::V4
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ProtocolVersion::V1 => "1.0",
            ProtocolVersion::V2 => "2.0",
            ProtocolVersion::V3 => "3.0",
            ProtocolVersion::V4 => "4.0",
        };
        f.write_str(text)
    }
}
