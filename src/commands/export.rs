use crate::cloudformation::{CloudFormationStack, StackSnapshot};
use crate::config::ExportSettings;
use crate::context::Context;
use crate::exporter::Exporter;
use crate::schema::AwsSchema;
use anyhow::{Context as AnyhowContext, Result};
use std::path::Path;

/// Region used when neither the settings nor the snapshot name one
const FALLBACK_REGION: &str = "us-east-1";

/// Command line overrides of the export settings
#[derive(Debug, Default, Clone)]
pub struct ExportOptions {
    pub workspace: Option<String>,
    pub region: Option<String>,
    pub profile: Option<String>,
    pub terraform: Option<String>,
    pub no_nested_stacks: bool,
    pub skip_plan: bool,
}

impl ExportOptions {
    fn apply(&self, settings: &mut ExportSettings) {
        if let Some(region) = &self.region {
            settings.region = Some(region.clone());
        }
        if let Some(profile) = &self.profile {
            settings.aws_profile = Some(profile.clone());
        }
        if let Some(terraform) = &self.terraform {
            settings.terraform_binary = terraform.clone();
        }
        if self.no_nested_stacks {
            settings.export_nested_stacks = false;
        }
        if self.skip_plan {
            settings.run_plan = false;
        }
    }
}

/// Handles the 'export' command - migrates a deployed stack into a terraform workspace
pub struct ExportCommand;

impl ExportCommand {
    pub fn execute(ctx: &Context, snapshot_path: &str, options: &ExportOptions) -> Result<()> {
        let workspace = Path::new(options.workspace.as_deref().unwrap_or("."));

        let mut settings = ExportSettings::load(&*ctx.fs, workspace)?;
        options.apply(&mut settings);

        let snapshot = StackSnapshot::load(&*ctx.fs, Path::new(snapshot_path))?;
        let default_region = settings.region.as_deref().unwrap_or(FALLBACK_REGION);
        let stack = CloudFormationStack::from_snapshot(&snapshot, default_region)
            .with_context(|| format!("Failed to read stack {}", snapshot.stack_name))?;

        ctx.output.key_value("Stack", &stack.name);
        ctx.output.key_value("Region", settings.region.as_deref().unwrap_or(&stack.region));
        ctx.output.key_value("Workspace", &workspace.display().to_string());

        let schema = AwsSchema::embedded()?;
        Exporter::new(ctx, &schema, &settings, workspace).run(stack)?;

        Ok(())
    }
}
