//! Platform and data type identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a platform, e.g. `UBUNTU` or `WINDOWS`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Platform(pub String);

impl Platform {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a kind of payload flowing between workers,
/// e.g. `GIT_FILE_DETAILS`, `FILES` or `RESULTS`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataType(pub String);

impl DataType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scheduling details of a platform in the service catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformDetails {
    pub name: Platform,

    /// Build-queue constraints, opaque `key:value` strings
    #[serde(default)]
    pub dimensions: Vec<String>,

    /// Whether workers can actually execute on this platform.
    /// Platforms without a runtime are only used to qualify data types.
    #[serde(default)]
    pub has_runtime: bool,
}

/// Service-wide properties of a data type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataDetails {
    #[serde(rename = "type")]
    pub data_type: DataType,

    /// If false, a producer of this type feeds consumers on any platform
    #[serde(default)]
    pub is_platform_specific: bool,
}
