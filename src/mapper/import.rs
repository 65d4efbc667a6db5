use anyhow::Result;

use super::mapping::ResourceMapping;
use super::module_tree::{ModuleId, ModuleTree};
use super::write_module_blocks;
use crate::importers::{ImportContext, ImporterRegistry};
use crate::resolver::IntrinsicEvaluator;
use crate::runner::{TerraformRunner, error_messages};
use crate::traits::{FileSystem, Output};

/// Imports every mapped resource of a module tree, one at a time
pub struct ModuleImporter<'a> {
    fs: &'a dyn FileSystem,
    output: &'a dyn Output,
    runner: &'a TerraformRunner,
    importers: &'a dyn ImporterRegistry,
    modules_directory: &'a str,
}

/// What happened to the imports of a module tree
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ImportSummary {
    pub attempted: usize,
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

impl<'a> ModuleImporter<'a> {
    pub fn new(
        fs: &'a dyn FileSystem,
        output: &'a dyn Output,
        runner: &'a TerraformRunner,
        importers: &'a dyn ImporterRegistry,
        modules_directory: &'a str,
    ) -> Self {
        Self {
            fs,
            output,
            runner,
            importers,
            modules_directory,
        }
    }

    /// Import every module, children before their parent
    ///
    /// Once a module is done, it and each of its ancestors rewrite their
    /// module blocks: the finished child receives its input assignments, and
    /// the module's own children see which of its resources now exist.
    pub fn import_all(&self, tree: &mut ModuleTree, warnings: &mut Vec<String>) -> Result<ImportSummary> {
        let total = tree.all_mappings().len();
        let mut summary = ImportSummary::default();

        for id in tree.post_order() {
            let results = self.import_module(tree, id, total, &mut summary, warnings);

            let module = tree.get_mut(id);
            for (mapping, imported) in module.mappings.iter_mut().zip(results) {
                mapping.imported = imported;
            }
            module.imported = true;

            for module in std::iter::once(id).chain(tree.ancestors(id)) {
                write_module_blocks(self.fs, tree, module, self.modules_directory)?;
            }
        }

        Ok(summary)
    }

    fn import_module(
        &self,
        tree: &ModuleTree,
        id: ModuleId,
        total: usize,
        summary: &mut ImportSummary,
        warnings: &mut Vec<String>,
    ) -> Vec<bool> {
        let module = tree.get(id);
        let evaluator = IntrinsicEvaluator::new(&module.stack);

        module
            .mappings
            .iter()
            .map(|mapping| {
                let ctx = ImportContext {
                    mapping,
                    stack: &module.stack,
                    module_mappings: &module.mappings,
                    evaluator: &evaluator,
                };
                self.import_resource(&ctx, total, summary, warnings)
            })
            .collect()
    }

    fn import_resource(
        &self,
        ctx: &ImportContext<'_>,
        total: usize,
        summary: &mut ImportSummary,
        warnings: &mut Vec<String>,
    ) -> bool {
        let mapping: &ResourceMapping = ctx.mapping;
        let address = mapping.import_address();

        summary.attempted += 1;
        self.output.info(&format!(
            "Importing resource {}/{} - {}",
            summary.attempted, total, address
        ));

        let import_id = match self.importers.get(&mapping.terraform_type) {
            Some(strategy) => match strategy.import_id(ctx, warnings) {
                Some(id) => id,
                None => {
                    summary.skipped += 1;
                    return false;
                }
            },
            None => mapping.physical_id.clone(),
        };

        let mut lines = Vec::new();
        let result = self.runner.run(
            "import",
            false,
            false,
            &mut |line: &str| lines.push(line.to_string()),
            &["-no-color", &address, &import_id],
        );

        match result {
            Ok(true) => {
                summary.imported += 1;
                true
            }
            Ok(false) => {
                let error = match error_messages(&lines).first() {
                    Some(message) => format!("ERROR: {}: {}", mapping.aws_address(), message),
                    None => format!("ERROR: Could not import {}", mapping.aws_address()),
                };
                self.output.error(&error);
                summary.errors.push(error);
                false
            }
            Err(e) => {
                let error = format!("ERROR: {}: {}", mapping.aws_address(), e);
                self.output.error(&error);
                summary.errors.push(error);
                false
            }
        }
    }
}
