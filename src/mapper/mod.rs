//! Resource mapping and module layout
//!
//! [`ResourceMapper`] walks a stack and its nested stacks, decides which
//! resources become Terraform resources, and writes the placeholder
//! configuration `terraform import` needs. [`ModuleImporter`] then imports
//! every mapped resource, children before their parents.

pub mod import;
pub mod mapping;
pub mod module_tree;

pub use import::ModuleImporter;
pub use mapping::ResourceMapping;
pub use module_tree::{ModuleId, ModuleInfo, ModuleTree};

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::cloudformation::{CloudFormationStack, stack_name_from_arn};
use crate::config::ExportSettings;
use crate::hcl::declarations::{placeholder, terraform_block};
use crate::hcl::syntax::json_value;
use crate::hcl::{InputVariable, ModuleDeclaration};
use crate::reference::Reference;
use crate::resolver::{IntrinsicEvaluator, IntrinsicResolver};
use crate::schema::AwsSchema;
use crate::traits::{FileSystem, Output};

pub const MAIN_SCRIPT_FILE: &str = "main.tf";
pub const MODULES_FILE: &str = "module_imports.tf";

/// Types folded into the resource that owns them in Terraform
const MERGED_TYPES: &[&str] = &[
    "AWS::IAM::Policy",
    "AWS::EC2::SecurityGroupIngress",
    "AWS::EC2::SecurityGroupEgress",
    "AWS::EC2::VPCGatewayAttachment",
    "AWS::SNS::TopicPolicy",
    "AWS::SQS::QueuePolicy",
];

/// Types that exist in CloudFormation only, or cannot be imported
const UNSUPPORTED_TYPES: &[&str] = &[
    "AWS::ApiGateway::Deployment",
    "AWS::CloudFormation::WaitCondition",
    "AWS::CloudFormation::WaitConditionHandle",
    "AWS::CloudFormation::CustomResource",
    "AWS::CDK::Metadata",
];

const NESTED_STACK_TYPE: &str = "AWS::CloudFormation::Stack";

fn is_unsupported(resource_type: &str) -> bool {
    UNSUPPORTED_TYPES.contains(&resource_type) || resource_type.starts_with("Custom::")
}

/// Builds the module tree of a stack and writes its placeholder configuration
pub struct ResourceMapper<'a> {
    fs: &'a dyn FileSystem,
    output: &'a dyn Output,
    schema: &'a AwsSchema,
    settings: &'a ExportSettings,
    workspace: &'a Path,
}

impl<'a> ResourceMapper<'a> {
    pub fn new(
        fs: &'a dyn FileSystem,
        output: &'a dyn Output,
        schema: &'a AwsSchema,
        settings: &'a ExportSettings,
        workspace: &'a Path,
    ) -> Self {
        Self {
            fs,
            output,
            schema,
            settings,
            workspace,
        }
    }

    /// Map a stack and, when enabled, its nested stacks
    ///
    /// Resources that cannot be mapped are left out with a warning.
    pub fn process_stack(
        &self,
        stack: CloudFormationStack,
        warnings: &mut Vec<String>,
    ) -> Result<ModuleTree> {
        self.output
            .info("- Mapping stack resources to terraform resource types...");

        let mut tree = ModuleTree::new(ModuleInfo::root(self.workspace.to_path_buf(), stack));
        let root = tree.root();
        self.process_module(&mut tree, root, warnings)?;

        Ok(tree)
    }

    fn process_module(
        &self,
        tree: &mut ModuleTree,
        id: ModuleId,
        warnings: &mut Vec<String>,
    ) -> Result<()> {
        if self.settings.export_nested_stacks {
            let nested: Vec<(String, String)> = tree
                .get(id)
                .stack
                .resources
                .iter()
                .filter(|r| r.is_nested_stack())
                .map(|r| (r.logical_id.clone(), r.physical_id.clone()))
                .collect();

            for (logical_id, physical_id) in nested {
                let name = stack_name_from_arn(&physical_id)?;
                let stack = tree
                    .get(id)
                    .stack
                    .nested_stack(&name)
                    .with_context(|| format!("Failed to read nested stack {}", logical_id))?;

                let directory = self
                    .workspace
                    .join(&self.settings.modules_directory)
                    .join(&name);
                let child = tree.add_child(id, ModuleInfo::nested(&logical_id, directory, stack));
                self.process_module(tree, child, warnings)?;
            }
        }

        let module_path = tree.module_path(id);
        let module = tree.get(id);
        let mappings = self.map_resources(&module.stack, module_path, warnings);
        let inputs = declare_inputs(&module.stack, warnings);

        let module = tree.get_mut(id);
        module.mappings = mappings;
        module.inputs = inputs;

        self.write_main_script(module)?;
        write_module_blocks(self.fs, tree, id, &self.settings.modules_directory)
    }

    fn map_resources(
        &self,
        stack: &CloudFormationStack,
        module_path: Option<String>,
        warnings: &mut Vec<String>,
    ) -> Vec<ResourceMapping> {
        let mut mappings = Vec::new();

        for resource in &stack.resources {
            let resource_type = resource.resource_type.as_str();

            if MERGED_TYPES.contains(&resource_type) {
                continue;
            }

            if resource_type == NESTED_STACK_TYPE && self.settings.export_nested_stacks {
                continue;
            }

            if resource_type == NESTED_STACK_TYPE || is_unsupported(resource_type) {
                warnings.push(format!(
                    "Resource \"{}\" ({}): Not supported for import.",
                    resource.logical_id, resource_type
                ));
                continue;
            }

            match self.schema.terraform_type(resource_type) {
                Some(terraform_type) => mappings.push(ResourceMapping::new(
                    resource.logical_id.clone(),
                    resource.physical_id.clone(),
                    resource_type,
                    terraform_type,
                    module_path.clone(),
                )),
                None => warnings.push(format!(
                    "Resource \"{}\" ({}): No corresponding terraform resource.",
                    resource.logical_id, resource_type
                )),
            }
        }

        mappings
    }

    fn write_main_script(&self, module: &ModuleInfo) -> Result<()> {
        let mut blocks = Vec::new();

        if module.is_root() {
            blocks.push(root_settings_block(self.settings, &module.stack));
        }

        blocks.extend(module.inputs.iter().map(InputVariable::render));
        blocks.extend(
            module
                .mappings
                .iter()
                .map(|m| placeholder(&m.terraform_type, &m.logical_id)),
        );

        self.fs
            .create_dir_all(&module.directory)
            .with_context(|| format!("Failed to create module directory: {:?}", module.directory))?;
        self.fs
            .write(&module.directory.join(MAIN_SCRIPT_FILE), &blocks.join("\n"))
            .with_context(|| format!("Failed to write {} for {}", MAIN_SCRIPT_FILE, module.friendly_name()))
    }
}

/// Terraform settings and provider block of the root module
///
/// The configured region wins over the stack's own region.
pub fn root_settings_block(settings: &ExportSettings, stack: &CloudFormationStack) -> String {
    terraform_block(
        &settings.provider_source,
        settings.provider_version.as_deref(),
        settings.region.as_deref().unwrap_or(&stack.region),
    )
}

/// Input variables for a stack's parameters
///
/// SSM-backed parameters are read through data sources instead.
fn declare_inputs(stack: &CloudFormationStack, warnings: &mut Vec<String>) -> Vec<InputVariable> {
    stack
        .template
        .parameters
        .iter()
        .filter(|(_, parameter)| !parameter.is_ssm_parameter())
        .filter_map(|(name, parameter)| {
            match InputVariable::from_parameter(name, parameter, stack.parameter_value(name)) {
                Ok(variable) => Some(variable),
                Err(e) => {
                    warnings.push(e.to_string());
                    None
                }
            }
        })
        .collect()
}

/// Values a parent passes to one child module
#[derive(Debug, Default)]
pub struct ModuleAssignments {
    /// Input variable name → HCL expression
    pub expressions: BTreeMap<String, String>,
    /// References among the expressions, for declarations in the parent
    pub references: Vec<Reference>,
}

/// Resolve a nested stack resource's `Parameters` in its parent's context
///
/// Only inputs the child declares are assigned; a parameter that neither
/// resolves nor evaluates is left to the variable's default. References
/// only point at parent resources already imported; any other resource is
/// passed as its deployed physical id.
pub fn module_assignments(tree: &ModuleTree, parent: ModuleId, child: ModuleId) -> ModuleAssignments {
    let mut assignments = ModuleAssignments::default();
    let parent_module = tree.get(parent);
    let child_module = tree.get(child);

    let Some(parameters) = child_module
        .logical_id
        .as_deref()
        .and_then(|logical_id| parent_module.stack.resource(logical_id))
        .and_then(|resource| resource.properties().get("Parameters"))
        .and_then(Value::as_object)
    else {
        return assignments;
    };

    let mapped = parent_module.imported_types();
    let modules = tree.child_modules(parent);
    let resolver = IntrinsicResolver::new(&parent_module.stack, &mapped, &modules);
    let evaluator = IntrinsicEvaluator::new(&parent_module.stack);

    for input in &child_module.inputs {
        let Some(value) = parameters.get(&input.name) else {
            continue;
        };

        if let Ok(Some(reference)) = resolver.resolve(value) {
            assignments
                .expressions
                .insert(input.name.clone(), reference.expression());
            assignments.references.push(reference);
            continue;
        }

        let Some(literal) = evaluator.evaluate(value) else {
            continue;
        };

        let literal = match (input.variable_type.starts_with("list("), literal) {
            (true, Value::String(csv)) => Value::Array(
                csv.split(',')
                    .map(|item| Value::String(item.trim().to_string()))
                    .collect(),
            ),
            (_, literal) => literal,
        };

        assignments
            .expressions
            .insert(input.name.clone(), json_value(&literal, 1));
    }

    assignments
}

/// Rewrite a module's `module_imports.tf` from its children
///
/// Children that are not imported yet get a bare module block, so their
/// variables keep their defaults until the import has been done.
pub fn write_module_blocks(
    fs: &dyn FileSystem,
    tree: &ModuleTree,
    id: ModuleId,
    modules_directory: &str,
) -> Result<()> {
    let module = tree.get(id);
    let path = module.directory.join(MODULES_FILE);

    if fs.exists(&path) {
        fs.remove_file(&path)
            .with_context(|| format!("Failed to remove {:?}", path))?;
    }

    if tree.children(id).is_empty() {
        return Ok(());
    }

    let blocks: Vec<String> = tree
        .children(id)
        .iter()
        .map(|&child| {
            let child_module = tree.get(child);
            let assignments = if child_module.imported {
                module_assignments(tree, id, child).expressions
            } else {
                BTreeMap::new()
            };

            ModuleDeclaration {
                name: child_module.friendly_name().to_string(),
                source: tree.source(child, modules_directory),
                assignments,
            }
            .render()
        })
        .collect();

    fs.create_dir_all(&module.directory)?;
    fs.write(&path, &blocks.join("\n"))
        .with_context(|| format!("Failed to write {:?}", path))
}
