#![recursion_limit = "256"]

mod cloudformation;
mod commands;
mod config;
mod context;
mod error;
mod exporter;
mod hcl;
mod importers;
mod mapper;
mod output;
mod plan;
mod reference;
mod resolver;
mod runner;
mod schema;
mod state;
mod traits;

#[cfg(test)]
mod test_helpers;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{ExportCommand, ExportOptions, SchemaCommand, SerializeCommand};
use context::Context;

#[derive(Parser)]
#[command(name = "cfn2tf")]
#[command(about = "Migrate deployed CloudFormation stacks to Terraform", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a deployed stack into terraform state and write its configuration
    Export {
        /// Path to the stack snapshot (YAML or JSON)
        snapshot: String,

        /// Workspace directory for the generated configuration (defaults to current directory)
        #[arg(short, long)]
        workspace: Option<String>,

        /// AWS region, overriding the settings file and the snapshot
        #[arg(short, long, env = "AWS_REGION")]
        region: Option<String>,

        /// AWS profile passed to terraform
        #[arg(short, long, env = "AWS_PROFILE")]
        profile: Option<String>,

        /// Skip nested stacks instead of exporting them as modules
        #[arg(long)]
        no_nested_stacks: bool,

        /// Do not run `terraform plan` after writing the configuration
        #[arg(long)]
        skip_plan: bool,

        /// Path to the terraform executable
        #[arg(long)]
        terraform: Option<String>,
    },

    /// Show the terraform schema of a resource type
    Schema {
        /// CloudFormation (AWS::S3::Bucket) or terraform (aws_s3_bucket) type
        resource_type: String,

        /// Attribute path, e.g. cors_rule.0.allowed_methods
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Render the resources of a terraform state file as HCL
    Serialize {
        /// Path to the state file
        state: String,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let ctx = Context::new();

    match cli.command {
        Commands::Export {
            snapshot,
            workspace,
            region,
            profile,
            no_nested_stacks,
            skip_plan,
            terraform,
        } => {
            let options = ExportOptions {
                workspace,
                region,
                profile,
                terraform,
                no_nested_stacks,
                skip_plan,
            };
            ExportCommand::execute(&ctx, &snapshot, &options)?;
        }
        Commands::Schema {
            resource_type,
            path,
        } => {
            SchemaCommand::execute(&ctx, &resource_type, path.as_deref())?;
        }
        Commands::Serialize { state, output } => {
            SerializeCommand::execute(&ctx, &state, output.as_deref())?;
        }
    }

    Ok(())
}
