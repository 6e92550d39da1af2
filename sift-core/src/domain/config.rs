//! Service and project configuration

use serde::{Deserialize, Serialize};

use super::function::{CipdPackage, Cmd, Function};
use super::platform::{DataDetails, DataType, Platform, PlatformDetails};

/// Service-wide catalog shared by all projects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub platforms: Vec<PlatformDetails>,

    #[serde(default)]
    pub data_details: Vec<DataDetails>,

    #[serde(default)]
    pub functions: Vec<Function>,

    /// Bootstrap command used to run recipe-based implementations
    #[serde(default)]
    pub recipe_cmd: Cmd,

    /// Packages every recipe-based worker needs
    #[serde(default)]
    pub recipe_packages: Vec<CipdPackage>,
}

impl ServiceConfig {
    /// Parse a service configuration document
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn platform(&self, platform: &Platform) -> Option<&PlatformDetails> {
        self.platforms.iter().find(|p| &p.name == platform)
    }

    /// Whether producer and consumer of `data_type` must agree on platform.
    ///
    /// Data types missing from the catalog are treated as platform independent.
    pub fn is_platform_specific(&self, data_type: &DataType) -> bool {
        self.data_details
            .iter()
            .find(|d| &d.data_type == data_type)
            .is_some_and(|d| d.is_platform_specific)
    }
}

/// Per-project overrides and selections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub name: String,

    /// Project-level function entries; may override catalog entries or
    /// define functions unknown to the service
    #[serde(default)]
    pub functions: Vec<Function>,

    #[serde(default)]
    pub selections: Vec<Selection>,
}

impl ProjectConfig {
    /// Parse a project configuration document
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }
}

/// A project's choice to run one function on one platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub function: String,
    pub platform: Platform,

    #[serde(default)]
    pub configs: Vec<SelectionConfig>,
}

/// A value for one of a function's config parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionConfig {
    pub name: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVICE: &str = r#"{
        "platforms": [
            { "name": "UBUNTU", "dimensions": ["pool:Default", "os:Ubuntu"], "has_runtime": true },
            { "name": "ANY" }
        ],
        "data_details": [
            { "type": "FILES" },
            { "type": "CLANG_DETAILS", "is_platform_specific": true }
        ],
        "functions": [
            {
                "type": "ISOLATOR",
                "name": "FileIsolator",
                "needs": "GIT_FILE_DETAILS",
                "provides": "FILES"
            }
        ],
        "recipe_cmd": { "exec": "recipes", "args": ["cook"] }
    }"#;

    #[test]
    fn test_parse_service_config() {
        let config = ServiceConfig::from_json(SERVICE).unwrap();

        assert_eq!(config.platforms.len(), 2);
        assert!(config.platform(&Platform::new("UBUNTU")).unwrap().has_runtime);
        assert!(!config.platform(&Platform::new("ANY")).unwrap().has_runtime);
        assert!(config.function("FileIsolator").is_some());
        assert_eq!(config.recipe_cmd.args, vec!["cook".to_string()]);
    }

    #[test]
    fn test_is_platform_specific() {
        let config = ServiceConfig::from_json(SERVICE).unwrap();

        assert!(config.is_platform_specific(&DataType::new("CLANG_DETAILS")));
        assert!(!config.is_platform_specific(&DataType::new("FILES")));
        assert!(!config.is_platform_specific(&DataType::new("UNKNOWN")));
    }

    #[test]
    fn test_parse_project_config() {
        let json = r#"{
            "name": "playground",
            "selections": [
                {
                    "function": "PyLint",
                    "platform": "UBUNTU",
                    "configs": [{ "name": "enable", "value": "all" }]
                }
            ]
        }"#;

        let config = ProjectConfig::from_json(json).unwrap();
        assert_eq!(config.name, "playground");
        assert_eq!(config.selections[0].configs[0].value, "all");
        assert!(config.function("PyLint").is_none());
    }
}
