//! Function catalog types
//!
//! A [`Function`] is the platform-independent description of an analysis
//! capability as it appears in configuration. The same type is used for
//! service catalog entries and for project overrides, so the data contract
//! fields are optional: an unset field on a project entry means "inherit".
//! Merging a service entry with a project entry yields a [`ResolvedFunction`]
//! where the contract is always present.

use serde::{Deserialize, Serialize};

use super::platform::{DataType, Platform};

/// The role a function plays in a workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FunctionKind {
    /// Produces findings; may be skipped by path filters
    Analyzer,
    /// Transforms raw input into data other functions consume
    Isolator,
}

/// A function entry from the service catalog or a project override
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FunctionKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs: Option<DataType>,

    /// Required only when `needs` is a platform-specific data type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_for_platform: Option<Platform>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provides: Option<DataType>,

    /// Glob patterns matched against changed paths
    #[serde(default)]
    pub path_filters: Vec<String>,

    #[serde(default)]
    pub config_defs: Vec<ConfigDef>,

    #[serde(default)]
    pub owner: String,

    #[serde(default)]
    pub monorail_component: String,

    #[serde(default)]
    pub impls: Vec<Impl>,
}

/// A configurable parameter of a function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDef {
    pub name: String,

    #[serde(default)]
    pub description: String,
}

/// One platform-bound realization of a function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Impl {
    /// Platform the implementation executes on
    pub runtime_platform: Platform,

    /// Platform the produced data is qualified with
    pub provides_for_platform: Platform,

    /// Execution deadline in seconds
    #[serde(default)]
    pub deadline: u32,

    #[serde(default)]
    pub cipd_packages: Vec<CipdPackage>,

    #[serde(flatten)]
    pub kind: ImplKind,
}

/// How an implementation is executed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImplKind {
    /// A plain executable with static arguments
    Cmd(Cmd),
    /// A recipe run through the service's recipe bootstrap command
    Recipe(Recipe),
}

/// Executable plus arguments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cmd {
    pub exec: String,

    #[serde(default)]
    pub args: Vec<String>,
}

/// Location of a recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub repository: String,
    pub path: String,
    pub revision: String,
}

/// A pinned package installed before a worker runs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CipdPackage {
    pub package_name: String,

    #[serde(default)]
    pub path: String,

    pub version: String,
}

/// A function after merging the service entry with a project override
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedFunction {
    pub name: String,
    pub kind: FunctionKind,
    pub needs: DataType,
    pub needs_for_platform: Option<Platform>,
    pub provides: DataType,
    pub path_filters: Vec<String>,
    pub config_defs: Vec<ConfigDef>,
    pub owner: String,
    pub monorail_component: String,
    pub impls: Vec<Impl>,
}

impl ResolvedFunction {
    /// Find the implementation producing data for `platform`
    pub fn impl_for(&self, platform: &Platform) -> Option<&Impl> {
        self.impls
            .iter()
            .find(|i| &i.provides_for_platform == platform)
    }

    /// Whether `name` is one of this function's config parameters
    pub fn has_config(&self, name: &str) -> bool {
        self.config_defs.iter().any(|c| c.name == name)
    }
}
