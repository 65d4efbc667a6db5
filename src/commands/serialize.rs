use crate::context::Context;
use crate::hcl;
use crate::schema::AwsSchema;
use crate::state::TerraformState;
use anyhow::{Context as AnyhowContext, Result};
use std::path::Path;

/// Handles the 'serialize' command - renders the resources of a state file as HCL
pub struct SerializeCommand;

impl SerializeCommand {
    pub fn execute(ctx: &Context, state_path: &str, output_path: Option<&str>) -> Result<()> {
        let schema = AwsSchema::embedded()?;
        let state = TerraformState::load(&*ctx.fs, Path::new(state_path))?;

        let blocks = Self::render(&schema, &state, &mut |warning: &str| {
            ctx.output.warning(warning)
        })?;
        let content = blocks.join("\n");

        match output_path {
            Some(path) => {
                ctx.fs
                    .write(Path::new(path), &content)
                    .with_context(|| format!("Failed to write {}", path))?;
                ctx.output.success(&format!(
                    "Serialized {} resource(s) to {}",
                    blocks.len(),
                    path
                ));
            }
            None => print!("{}", content),
        }

        Ok(())
    }

    fn render(
        schema: &AwsSchema,
        state: &TerraformState,
        warn: &mut dyn FnMut(&str),
    ) -> Result<Vec<String>> {
        let mut blocks = Vec::new();

        for resource in state.resources.iter().filter(|r| r.is_managed()) {
            let Some(attributes) = resource.attributes() else {
                warn(&format!("{}: no instance in state, skipped", resource.address()));
                continue;
            };

            let rendered =
                hcl::render_resource(schema, &resource.resource_type, &resource.name, attributes)
                    .with_context(|| format!("Failed to serialize {}", resource.address()))?;

            for warning in &rendered.warnings {
                warn(warning);
            }
            blocks.push(rendered.hcl);
        }

        Ok(blocks)
    }
}
