use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use super::template::yaml_to_json;
use crate::traits::FileSystem;

/// A deployed stack as captured by an external reader
///
/// Field names follow the CloudFormation API (`DescribeStacks`,
/// `ListStackResources`, `GetTemplate`) so AWS CLI output can be assembled
/// into a snapshot without renaming.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackSnapshot {
    pub stack_name: String,
    #[serde(default)]
    pub stack_id: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub parameters: Vec<SnapshotParameter>,
    /// Template as a parsed document
    #[serde(default)]
    pub template: Option<Value>,
    /// Template as returned by `GetTemplate`, JSON or YAML text
    #[serde(default)]
    pub template_body: Option<String>,
    #[serde(default)]
    pub resources: Vec<SnapshotResource>,
    /// Exports visible to `Fn::ImportValue`
    #[serde(default)]
    pub exports: Vec<SnapshotExport>,
    /// Nested stacks keyed by stack name
    #[serde(default)]
    pub nested_stacks: BTreeMap<String, StackSnapshot>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SnapshotParameter {
    pub parameter_key: String,
    #[serde(default)]
    pub parameter_value: Option<String>,
    /// Value an SSM-backed parameter resolved to
    #[serde(default)]
    pub resolved_value: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SnapshotResource {
    pub logical_resource_id: String,
    #[serde(default)]
    pub physical_resource_id: String,
    pub resource_type: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SnapshotExport {
    pub name: String,
    pub value: String,
}

impl StackSnapshot {
    /// Load a snapshot file in JSON or YAML
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self> {
        let content = fs
            .read_to_string(path)
            .with_context(|| format!("Failed to read stack snapshot: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Failed to parse stack snapshot: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        if content.trim_start().starts_with('{') {
            return serde_json::from_str(content).context("Snapshot is not valid JSON");
        }

        let yaml: serde_yaml::Value =
            serde_yaml::from_str(content).context("Snapshot is neither JSON nor YAML")?;
        serde_json::from_value(yaml_to_json(yaml)).context("Snapshot has an unexpected shape")
    }

    /// Deployed value of a parameter; SSM parameters use their resolved value
    pub fn parameter_value(&self, key: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.parameter_key == key)
            .and_then(|p| p.resolved_value.as_deref().or(p.parameter_value.as_deref()))
    }

    pub fn nested_stack(&self, name: &str) -> Option<&StackSnapshot> {
        self.nested_stacks.get(name)
    }
}
