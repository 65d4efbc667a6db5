//! End-to-end export of a deployed stack
//!
//! 1. map resources and write placeholder configuration
//! 2. `terraform init`
//! 3. import every mapped resource, nested modules first
//! 4. rewrite captured literals into references and regenerate `main.tf`
//!    for every module from the imported state
//! 5. `terraform plan`, correcting what it rejects and planning again, to
//!    surface anything the configuration still gets wrong

pub mod script;

pub use script::ModuleScript;

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context as _, Result};

use crate::cloudformation::CloudFormationStack;
use crate::config::ExportSettings;
use crate::context::Context;
use crate::hcl::render_resource;
use crate::mapper::{
    MAIN_SCRIPT_FILE, ModuleId, ModuleImporter, ModuleTree, ResourceMapper, ResourceMapping,
    module_assignments, root_settings_block,
};
use crate::resolver::{IntrinsicEvaluator, IntrinsicResolver};
use crate::plan::PlanFixer;
use crate::runner::TerraformRunner;
use crate::schema::AwsSchema;
use crate::state::{STATE_FILE_NAME, StatePatcher, StateValue, TerraformState};

/// Outcome of an export run
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExportReport {
    pub modules: usize,
    pub mapped: usize,
    pub imported: usize,
    /// Resource blocks written to the final configuration
    pub written: usize,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ExportReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.errors.is_empty()
    }
}

/// Drives one export into one workspace directory
pub struct Exporter<'a> {
    ctx: &'a Context,
    schema: &'a AwsSchema,
    settings: &'a ExportSettings,
    workspace: &'a Path,
}

impl<'a> Exporter<'a> {
    pub fn new(
        ctx: &'a Context,
        schema: &'a AwsSchema,
        settings: &'a ExportSettings,
        workspace: &'a Path,
    ) -> Self {
        Self {
            ctx,
            schema,
            settings,
            workspace,
        }
    }

    pub fn run(&self, stack: CloudFormationStack) -> Result<ExportReport> {
        let fs = self.ctx.fs.as_ref();
        let output = self.ctx.output.as_ref();

        output.section(&format!("Exporting stack {}", stack.name));

        let region = self
            .settings
            .region
            .clone()
            .unwrap_or_else(|| stack.region.clone());
        let runner = TerraformRunner::new(
            self.ctx.command.clone(),
            self.ctx.output.clone(),
            &self.settings.terraform_binary,
            self.workspace,
        )
        .with_aws(self.settings.aws_profile.as_deref(), Some(&region));

        // terraform runs inside the workspace, so it must exist first
        fs.create_dir_all(self.workspace)
            .with_context(|| format!("Failed to create workspace: {:?}", self.workspace))?;

        runner.check_installed()?;

        let mut report = ExportReport::default();

        // Step 1: placeholders
        let mut tree = ResourceMapper::new(fs, output, self.schema, self.settings, self.workspace)
            .process_stack(stack, &mut report.warnings)?;
        report.modules = tree.len();
        report.mapped = tree.all_mappings().len();

        // Step 2: init
        output.info("- Initializing terraform...");
        runner.run("init", true, true, &mut |_: &str| {}, &["-no-color", "-input=false"])?;

        // Step 3: import
        let summary = ModuleImporter::new(
            fs,
            output,
            &runner,
            self.ctx.importers.as_ref(),
            &self.settings.modules_directory,
        )
        .import_all(&mut tree, &mut report.warnings)?;
        report.imported = summary.imported;
        report.errors.extend(summary.errors);

        if report.imported == 0 {
            output.warning("No resources were imported; placeholder configuration left as is");
            self.print_summary(&report);
            return Ok(report);
        }

        // Step 4: configuration
        output.info("- Generating configuration from imported state...");
        let mut state = TerraformState::load(fs, &self.workspace.join(STATE_FILE_NAME))?;
        for id in tree.post_order() {
            report.written += self.write_module(&tree, id, &mut state, &mut report.warnings)?;
        }

        // Step 5: plan
        if self.settings.run_plan {
            output.info("- Checking configuration with terraform plan...");
            let remaining = PlanFixer::new(
                fs,
                output,
                &runner,
                self.workspace,
                self.settings.plan_passes,
            )
            .run()?;
            report.warnings.extend(
                remaining
                    .into_iter()
                    .map(|message| format!("terraform plan: {}", message)),
            );
        }

        self.print_summary(&report);
        Ok(report)
    }

    /// Regenerate one module's `main.tf`; returns the resource blocks written
    fn write_module(
        &self,
        tree: &ModuleTree,
        id: ModuleId,
        state: &mut TerraformState,
        warnings: &mut Vec<String>,
    ) -> Result<usize> {
        let module = tree.get(id);
        let module_path = tree.module_path(id);
        let imported: Vec<&ResourceMapping> = module.mappings.iter().filter(|m| m.imported).collect();

        let mapped = module.imported_types();
        let modules = tree.child_modules(id);

        // Attributes as imported, before any patching, for Fn::GetAtt evaluation
        let captured: BTreeMap<String, BTreeMap<String, StateValue>> = imported
            .iter()
            .filter_map(|m| {
                let attributes = state
                    .find(module_path.as_deref(), &m.terraform_type, &m.logical_id)?
                    .attributes()?;
                Some((m.logical_id.clone(), attributes.clone()))
            })
            .collect();

        let mut evaluator = IntrinsicEvaluator::new(&module.stack);
        for mapping in &imported {
            if let Some(attributes) = captured.get(&mapping.logical_id) {
                evaluator =
                    evaluator.with_imported(&mapping.logical_id, &mapping.terraform_type, attributes);
            }
        }
        let resolver = IntrinsicResolver::new(&module.stack, &mapped, &modules);
        let patcher = StatePatcher::new(&resolver, &evaluator);

        let mut script = ModuleScript::new();
        if module.is_root() {
            script.terraform_block(root_settings_block(self.settings, &module.stack));
        }
        script.variables(&module.inputs);

        for mapping in imported {
            let Some(resource) = module.stack.resource(&mapping.logical_id) else {
                continue;
            };

            let resource_schema = match self.schema.resource_schema(&mapping.terraform_type) {
                Ok(resource_schema) => resource_schema,
                Err(e) => {
                    warnings.push(format!("{}: {}", mapping.aws_address(), e));
                    continue;
                }
            };

            let Some(attributes) = state
                .find_mut(module_path.as_deref(), &mapping.terraform_type, &mapping.logical_id)
                .and_then(|r| r.attributes_mut())
            else {
                warnings.push(format!(
                    "{}: not found in terraform state",
                    mapping.aws_address()
                ));
                continue;
            };

            let outcome = patcher.patch(resource, resource_schema, attributes);
            warnings.extend(outcome.warnings);

            match render_resource(self.schema, &mapping.terraform_type, &mapping.logical_id, attributes) {
                Ok(rendered) => {
                    warnings.extend(rendered.warnings);
                    script.resource(rendered.hcl, attributes);
                }
                Err(e) => warnings.push(format!("{}: {}", mapping.aws_address(), e)),
            }
        }

        for &child in tree.children(id) {
            if tree.get(child).imported {
                for reference in module_assignments(tree, id, child).references {
                    script.reference(&reference);
                }
            }
        }

        for (name, template_output) in &module.stack.template.outputs {
            match resolver.resolve(&template_output.value) {
                Ok(Some(reference)) => {
                    script.output(name, &reference, template_output.description.as_deref())
                }
                Ok(None) => {}
                Err(e) => warnings.push(format!("Output \"{}\": {}", name, e)),
            }
        }

        let path = module.directory.join(MAIN_SCRIPT_FILE);
        self.ctx
            .fs
            .write(&path, &script.render(&module.stack.template.mappings))
            .with_context(|| format!("Failed to write {:?}", path))?;

        Ok(script.resource_count())
    }

    fn print_summary(&self, report: &ExportReport) {
        let output = self.ctx.output.as_ref();

        output.blank();
        output.subsection("Summary");
        output.key_value("Modules", &report.modules.to_string());
        output.key_value("Resources mapped", &report.mapped.to_string());
        output.key_value_highlight(
            "Resources imported",
            &format!("{}/{}", report.imported, report.mapped),
        );

        for warning in &report.warnings {
            output.warning(warning);
        }

        if report.errors.is_empty() {
            output.success(&format!(
                "Configuration written to {}",
                self.workspace.display()
            ));
        } else {
            output.error(&format!("{} resource(s) could not be imported", report.errors.len()));
        }
    }
}
