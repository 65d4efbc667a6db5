use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::hcl::InputVariable;
use crate::hcl::declarations::{data_block, locals_block, output_block};
use crate::reference::{DataSourceDeclaration, Reference};
use crate::state::StateValue;

/// The final `main.tf` of one module, assembled block by block
///
/// Blocks are written in a fixed order: terraform settings, variables, data
/// sources, locals, resources, outputs.
#[derive(Debug, Default)]
pub struct ModuleScript {
    terraform: Option<String>,
    variables: Vec<InputVariable>,
    data_sources: BTreeSet<DataSourceDeclaration>,
    uses_mappings: bool,
    resources: Vec<String>,
    outputs: Vec<String>,
}

impl ModuleScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn terraform_block(&mut self, block: String) {
        self.terraform = Some(block);
    }

    pub fn variables(&mut self, variables: &[InputVariable]) {
        self.variables.extend(variables.iter().cloned());
    }

    /// Record the declarations a reference depends on
    pub fn reference(&mut self, reference: &Reference) {
        self.data_sources.extend(reference.data_sources());
        self.uses_mappings |= reference.uses_mappings();
    }

    /// Add a rendered resource and the references among its attributes
    pub fn resource(&mut self, hcl: String, attributes: &BTreeMap<String, StateValue>) {
        for value in attributes.values() {
            visit_references(value, &mut |reference: &Reference| self.reference(reference));
        }
        self.resources.push(hcl);
    }

    pub fn output(&mut self, name: &str, value: &Reference, description: Option<&str>) {
        self.reference(value);
        self.outputs.push(output_block(name, value, description));
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn render(&self, mappings: &BTreeMap<String, Value>) -> String {
        let mut blocks: Vec<String> = Vec::new();

        blocks.extend(self.terraform.iter().cloned());
        blocks.extend(self.variables.iter().map(InputVariable::render));
        blocks.extend(self.data_sources.iter().map(data_block));
        if self.uses_mappings && !mappings.is_empty() {
            blocks.push(locals_block(mappings));
        }
        blocks.extend(self.resources.iter().cloned());
        blocks.extend(self.outputs.iter().cloned());

        blocks.join("\n")
    }
}

fn visit_references(value: &StateValue, f: &mut dyn FnMut(&Reference)) {
    match value {
        StateValue::Reference(reference) => f(reference),
        StateValue::List(items) => {
            for item in items {
                visit_references(item, f);
            }
        }
        StateValue::Map(map) => {
            for item in map.values() {
                visit_references(item, f);
            }
        }
        _ => {}
    }
}
