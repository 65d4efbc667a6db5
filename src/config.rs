use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::traits::FileSystem;

/// Settings file looked up in the workspace
pub const WORKSPACE_CONFIG_FILE: &str = ".cfn2tf.yaml";

const USER_CONFIG_DIR: &str = "cfn2tf";
const USER_CONFIG_FILE: &str = "config.yaml";

/// Settings of an export run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Terraform executable, by name or path
    pub terraform_binary: String,

    /// AWS profile passed to terraform as `AWS_PROFILE`
    pub aws_profile: Option<String>,

    /// Region for the provider block; the stack's own region when unset
    pub region: Option<String>,

    pub provider_source: String,

    pub provider_version: Option<String>,

    /// Export nested stacks as child modules instead of skipping them
    pub export_nested_stacks: bool,

    /// Directory under the workspace holding child modules
    pub modules_directory: String,

    /// Run `terraform plan` after the configuration is written
    pub run_plan: bool,

    /// Most `terraform plan` runs spent correcting the generated configuration
    pub plan_passes: usize,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            terraform_binary: "terraform".to_string(),
            aws_profile: None,
            region: None,
            provider_source: "hashicorp/aws".to_string(),
            provider_version: None,
            export_nested_stacks: true,
            modules_directory: "modules".to_string(),
            run_plan: true,
            plan_passes: 5,
        }
    }
}

impl ExportSettings {
    /// Load settings for a workspace
    ///
    /// The workspace file wins over the user file; without either the
    /// defaults apply.
    pub fn load(fs: &dyn FileSystem, workspace: &Path) -> Result<Self> {
        let workspace_file = workspace.join(WORKSPACE_CONFIG_FILE);
        if fs.exists(&workspace_file) {
            return Self::load_file(fs, &workspace_file);
        }

        if let Some(user_file) = Self::user_config_path() {
            if fs.exists(&user_file) {
                return Self::load_file(fs, &user_file);
            }
        }

        Ok(Self::default())
    }

    pub fn load_file(fs: &dyn FileSystem, path: &Path) -> Result<Self> {
        let content = fs
            .read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {:?}", path))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {:?}", path))
    }

    /// `~/.config/cfn2tf/config.yaml`
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| {
            home.join(".config")
                .join(USER_CONFIG_DIR)
                .join(USER_CONFIG_FILE)
        })
    }
}
