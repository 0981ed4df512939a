//! Client model options
//!
//! Options are plain serde data and can be embedded in a larger TOML
//! configuration file or parsed on their own:
//!
//! ```toml
//! undeclared-property-behavior = "ignore"
//! max-protocol-version = "V3"
//! ```

use serde::{Deserialize, Serialize};

use crate::error::MetadataResult;
use crate::metadata::ProtocolVersion;

/// What a lookup does with a wire property the type does not declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UndeclaredPropertyBehavior {
    /// Fail with a missing-property error
    #[default]
    ThrowException,
    /// Report the property as absent
    Ignore,
    /// Report the property as absent so the caller can treat it as dynamic
    Support,
}

/// Options of a [`ClientModel`](crate::ClientModel)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ClientModelOptions {
    /// Policy applied by [`ClientModel::get_property`](crate::ClientModel::get_property)
    pub undeclared_property_behavior: UndeclaredPropertyBehavior,
    /// Highest protocol version the client may speak
    pub max_protocol_version: ProtocolVersion,
}

impl ClientModelOptions {
    /// Parse options from TOML text; missing keys take their defaults
    pub fn from_toml_str(content: &str) -> MetadataResult<Self> {
        let options: ClientModelOptions = toml::from_str(content)?;
        Ok(options)
    }

    /// Render options as TOML text
    pub fn to_toml_string(&self) -> MetadataResult<String> {
        let text = toml::to_string_pretty(self)?;
        Ok(text)
    }
}
