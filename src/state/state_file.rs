use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::value::StateValue;
use crate::traits::FileSystem;

/// Name of the local state file written by `terraform import`
pub const STATE_FILE_NAME: &str = "terraform.tfstate";

/// A Terraform state document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TerraformState {
    #[serde(default)]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terraform_version: Option<String>,
    #[serde(default)]
    pub serial: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineage: Option<String>,
    #[serde(default)]
    pub resources: Vec<StateResource>,
}

/// One `resources[]` entry of the state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateResource {
    /// Module path, e.g. `module.network` or `module.a.module.b`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub instances: Vec<StateInstance>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateInstance {
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub attributes: BTreeMap<String, StateValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

fn default_mode() -> String {
    "managed".to_string()
}

impl TerraformState {
    /// Read and parse a state file
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self> {
        let content = fs
            .read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("State file is not valid JSON")
    }

    /// Managed resources belonging to a module (`None` for the root module)
    pub fn module_resources<'a>(
        &'a self,
        module: Option<&'a str>,
    ) -> impl Iterator<Item = &'a StateResource> + 'a {
        self.resources
            .iter()
            .filter(move |r| r.is_managed() && r.module.as_deref() == module)
    }

    pub fn find(&self, module: Option<&str>, resource_type: &str, name: &str) -> Option<&StateResource> {
        self.resources.iter().find(|r| {
            r.is_managed()
                && r.module.as_deref() == module
                && r.resource_type == resource_type
                && r.name == name
        })
    }

    pub fn find_mut(
        &mut self,
        module: Option<&str>,
        resource_type: &str,
        name: &str,
    ) -> Option<&mut StateResource> {
        self.resources.iter_mut().find(|r| {
            r.is_managed()
                && r.module.as_deref() == module
                && r.resource_type == resource_type
                && r.name == name
        })
    }
}

impl StateResource {
    pub fn is_managed(&self) -> bool {
        self.mode == "managed"
    }

    /// Address within its module, `<type>.<name>`
    pub fn address(&self) -> String {
        format!("{}.{}", self.resource_type, self.name)
    }

    /// Attributes of the single instance an import produces
    pub fn attributes(&self) -> Option<&BTreeMap<String, StateValue>> {
        self.instances.first().map(|i| &i.attributes)
    }

    pub fn attributes_mut(&mut self) -> Option<&mut BTreeMap<String, StateValue>> {
        self.instances.first_mut().map(|i| &mut i.attributes)
    }

    /// Short provider name
    ///
    /// `provider["registry.terraform.io/hashicorp/aws"]` → `aws`
    pub fn provider_name(&self) -> String {
        let provider = &self.provider;

        if let Some(start) = provider.rfind('/') {
            let name = &provider[start + 1..];

            if let Some(end) = name.find(']') {
                return name[..end].trim_matches('"').to_string();
            }

            return name.trim_matches('"').to_string();
        }

        provider.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::Reference;
    use crate::traits::MockFileSystem;

    const STATE: &str = r#"{
        "version": 4,
        "terraform_version": "1.5.7",
        "serial": 3,
        "resources": [
            {
                "mode": "managed",
                "type": "aws_s3_bucket",
                "name": "Bucket",
                "provider": "provider[\"registry.terraform.io/hashicorp/aws\"]",
                "instances": [{"schema_version": 0, "attributes": {"bucket": "my-bucket", "tags": {"Env": "dev"}}}]
            },
            {
                "module": "module.network",
                "mode": "managed",
                "type": "aws_vpc",
                "name": "Vpc",
                "provider": "provider[\"registry.terraform.io/hashicorp/aws\"]",
                "instances": [{"attributes": {"cidr_block": "10.0.0.0/16"}}]
            },
            {
                "mode": "data",
                "type": "aws_region",
                "name": "current",
                "instances": []
            }
        ]
    }"#;

    #[test]
    fn test_parse_state_by_module() {
        let state = TerraformState::parse(STATE).unwrap();

        let root: Vec<String> = state.module_resources(None).map(StateResource::address).collect();
        assert_eq!(root, vec!["aws_s3_bucket.Bucket"]);

        let network: Vec<String> = state
            .module_resources(Some("module.network"))
            .map(StateResource::address)
            .collect();
        assert_eq!(network, vec!["aws_vpc.Vpc"]);
    }

    #[test]
    fn test_provider_name() {
        let state = TerraformState::parse(STATE).unwrap();
        let bucket = state.find(None, "aws_s3_bucket", "Bucket").unwrap();
        assert_eq!(bucket.provider_name(), "aws");
    }

    #[test]
    fn test_patched_state_round_trips() {
        let mut state = TerraformState::parse(STATE).unwrap();
        state
            .find_mut(None, "aws_s3_bucket", "Bucket")
            .and_then(StateResource::attributes_mut)
            .unwrap()
            .insert("bucket".to_string(), StateValue::Reference(Reference::variable("BucketName")));

        let text = serde_json::to_string(&state).unwrap();
        let reloaded = TerraformState::parse(&text).unwrap();
        let bucket = reloaded.find(None, "aws_s3_bucket", "Bucket").unwrap();

        assert_eq!(
            bucket.attributes().unwrap()["bucket"],
            StateValue::Reference(Reference::variable("BucketName"))
        );
    }

    #[test]
    fn test_load_missing_file_has_context() {
        let fs = MockFileSystem::new();
        let err = TerraformState::load(&fs, Path::new("/work/terraform.tfstate")).unwrap_err();
        assert!(err.to_string().contains("Failed to read state file"));
    }
}
