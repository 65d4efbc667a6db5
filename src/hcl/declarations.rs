//! Non-resource blocks of a generated script: terraform/provider settings,
//! variables, data sources, locals, outputs and child modules

use std::collections::BTreeMap;

use serde_json::Value;

use super::syntax::{json_value, object_key, quote};
use crate::cloudformation::template::TemplateParameter;
use crate::error::{MigrationError, MigrationResult};
use crate::reference::{DataSourceDeclaration, Reference};

/// Parameter types that hold a single string
const STRING_TYPES: &[&str] = &[
    "String",
    "AWS::EC2::AvailabilityZone::Name",
    "AWS::EC2::Image::Id",
    "AWS::EC2::Instance::Id",
    "AWS::EC2::KeyPair::KeyName",
    "AWS::EC2::SecurityGroup::GroupName",
    "AWS::EC2::SecurityGroup::Id",
    "AWS::EC2::Subnet::Id",
    "AWS::EC2::Volume::Id",
    "AWS::EC2::VPC::Id",
    "AWS::Route53::HostedZone::Id",
];

/// `terraform { required_providers }` and the provider block of the root module
pub fn terraform_block(source: &str, version: Option<&str>, region: &str) -> String {
    let mut hcl = String::from("terraform {\n  required_providers {\n    aws = {\n");
    hcl.push_str(&format!("      source  = {}\n", quote(source)));
    if let Some(version) = version {
        hcl.push_str(&format!("      version = {}\n", quote(version)));
    }
    hcl.push_str("    }\n  }\n}\n\n");
    hcl.push_str(&format!("provider \"aws\" {{\n  region = {}\n}}\n", quote(region)));
    hcl
}

/// Empty resource block that `terraform import` attaches state to
pub fn placeholder(resource_type: &str, name: &str) -> String {
    format!("resource {} {} {{}}\n", quote(resource_type), quote(name))
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputVariable {
    pub name: String,
    pub variable_type: &'static str,
    pub description: Option<String>,
    pub sensitive: bool,
    pub default: Option<Value>,
}

impl InputVariable {
    /// Declare a stack parameter, with the deployed value as its default
    pub fn from_parameter(
        name: &str,
        parameter: &TemplateParameter,
        deployed: Option<Value>,
    ) -> MigrationResult<Self> {
        let variable_type = variable_type(&parameter.parameter_type).ok_or_else(|| {
            MigrationError::InvalidInput(format!(
                "Parameter \"{}\": type \"{}\" cannot be declared as an input variable",
                name, parameter.parameter_type
            ))
        })?;

        let default = deployed.map(|value| match variable_type {
            "number" => to_number(value),
            "list(number)" => match value {
                Value::Array(items) => Value::Array(items.into_iter().map(to_number).collect()),
                other => other,
            },
            _ => value,
        });

        Ok(Self {
            name: name.to_string(),
            variable_type,
            description: parameter.description.clone().filter(|d| !d.is_empty()),
            sensitive: parameter.is_no_echo(),
            default,
        })
    }

    pub fn render(&self) -> String {
        let mut hcl = format!("variable {} {{\n", quote(&self.name));
        hcl.push_str(&format!("  type        = {}\n", self.variable_type));
        if let Some(description) = &self.description {
            hcl.push_str(&format!("  description = {}\n", quote(description)));
        }
        if self.sensitive {
            hcl.push_str("  sensitive   = true\n");
        }
        if let Some(default) = &self.default {
            hcl.push_str(&format!("  default     = {}\n", json_value(default, 1)));
        }
        hcl.push_str("}\n");
        hcl
    }
}

fn variable_type(parameter_type: &str) -> Option<&'static str> {
    if STRING_TYPES.contains(&parameter_type) {
        return Some("string");
    }

    match parameter_type {
        "Number" => Some("number"),
        "List<Number>" => Some("list(number)"),
        "CommaDelimitedList" => Some("list(string)"),
        _ => parameter_type
            .strip_prefix("List<")
            .and_then(|inner| inner.strip_suffix('>'))
            .filter(|inner| STRING_TYPES.contains(inner))
            .map(|_| "list(string)"),
    }
}

fn to_number(value: Value) -> Value {
    match &value {
        Value::String(text) => serde_json::from_str::<serde_json::Number>(text.trim())
            .map(Value::Number)
            .unwrap_or(value),
        _ => value,
    }
}

pub fn data_block(declaration: &DataSourceDeclaration) -> String {
    let mut hcl = format!(
        "data {} {} {{",
        quote(&declaration.data_type),
        quote(&declaration.name)
    );

    if declaration.arguments.is_empty() {
        hcl.push_str("}\n");
        return hcl;
    }

    hcl.push('\n');
    for (key, value) in &declaration.arguments {
        hcl.push_str(&format!("  {} = {}\n", key, quote(value)));
    }
    hcl.push_str("}\n");
    hcl
}

/// `locals { mappings = ... }` holding the template's `Mappings` section
pub fn locals_block(mappings: &BTreeMap<String, Value>) -> String {
    let mappings = Value::Object(mappings.clone().into_iter().collect());
    format!("locals {{\n  mappings = {}\n}}\n", json_value(&mappings, 1))
}

pub fn output_block(name: &str, value: &Reference, description: Option<&str>) -> String {
    let mut hcl = format!("output {} {{\n", quote(name));
    if let Some(description) = description.filter(|d| !d.is_empty()) {
        hcl.push_str(&format!("  description = {}\n", quote(description)));
    }
    hcl.push_str(&format!("  value       = {}\n", value.expression()));
    hcl.push_str("}\n");
    hcl
}

/// A child module call in `module_imports.tf`
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDeclaration {
    pub name: String,
    pub source: String,
    /// Input variable name → HCL expression
    pub assignments: BTreeMap<String, String>,
}

impl ModuleDeclaration {
    pub fn render(&self) -> String {
        let mut hcl = format!("module {} {{\n", quote(&self.name));
        hcl.push_str(&format!("  source = {}\n", quote(&self.source)));

        if !self.assignments.is_empty() {
            hcl.push('\n');
            for (name, expression) in &self.assignments {
                hcl.push_str(&format!("  {} = {}\n", object_key(name), expression));
            }
        }

        hcl.push_str("}\n");
        hcl
    }
}
