use crate::context::Context;
use crate::schema::{AwsSchema, ValueSchema};
use anyhow::{Context as AnyhowContext, Result};

/// Handles the 'schema' command - shows how a resource type maps to terraform
pub struct SchemaCommand;

impl SchemaCommand {
    pub fn execute(ctx: &Context, resource_type: &str, path: Option<&str>) -> Result<()> {
        let schema = AwsSchema::embedded()?;
        let resource = schema.resource_schema(resource_type)?;

        let terraform_type = if resource_type.starts_with("AWS::") {
            schema.terraform_type(resource_type).unwrap_or(resource_type)
        } else {
            resource_type
        };

        ctx.output.section(terraform_type);
        if let Some(aws_type) = schema.aws_type(terraform_type) {
            ctx.output.key_value("CloudFormation type", aws_type);
        }

        if let Some(path) = path {
            let attribute = resource.attribute_by_path(path)?;
            let yaml = serde_yaml::to_string(attribute)
                .with_context(|| format!("Failed to serialize schema of {}", path))?;

            ctx.output.subsection(path);
            for line in yaml.lines() {
                ctx.output.dimmed(line);
            }
            return Ok(());
        }

        ctx.output.subsection("Attributes");
        for (name, attribute) in &resource.schema {
            ctx.output.key_value(name, &describe(attribute));
        }
        ctx.output.blank();

        Ok(())
    }
}

/// One-line summary: `<type>, <required|optional>[, computed][, block]`
fn describe(attribute: &ValueSchema) -> String {
    let mut parts = vec![format!("{:?}", attribute.value_type).to_lowercase()];

    if attribute.required {
        parts.push("required".to_string());
    } else if attribute.optional {
        parts.push("optional".to_string());
    }
    if attribute.computed {
        parts.push("computed".to_string());
    }
    if attribute.is_block() {
        parts.push("block".to_string());
    }
    if !attribute.conflicts_with.is_empty() {
        parts.push(format!("conflicts with {}", attribute.conflicts_with.join(", ")));
    }

    parts.join(", ")
}
