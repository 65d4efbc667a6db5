use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use super::dependency_graph::DependencyGraph;
use super::snapshot::StackSnapshot;
use super::template::{Template, TemplateResource};
use crate::error::{MigrationError, MigrationResult};

/// A template resource joined with its deployed counterpart
#[derive(Debug, Clone)]
pub struct CloudFormationResource {
    pub logical_id: String,
    pub physical_id: String,
    pub resource_type: String,
    pub template_resource: TemplateResource,
}

impl CloudFormationResource {
    pub fn properties(&self) -> &Value {
        &self.template_resource.properties
    }

    pub fn depends_on(&self) -> &[String] {
        &self.template_resource.depends_on
    }

    pub fn is_nested_stack(&self) -> bool {
        self.resource_type == "AWS::CloudFormation::Stack"
    }
}

/// A deployed stack with its parsed template and dependency graph
#[derive(Debug)]
pub struct CloudFormationStack {
    pub name: String,
    pub stack_id: Option<String>,
    pub region: String,
    pub account_id: Option<String>,
    pub template: Template,
    pub resources: Vec<CloudFormationResource>,
    /// Deployed parameter values
    pub parameter_values: BTreeMap<String, String>,
    /// Export name → value, for `Fn::ImportValue`
    pub exports: BTreeMap<String, String>,
    pub graph: DependencyGraph,
    nested: BTreeMap<String, StackSnapshot>,
}

impl CloudFormationStack {
    /// Build a stack from a snapshot
    ///
    /// Every live resource must appear in the template, and every template
    /// resource without a `Condition` must be live.
    pub fn from_snapshot(snapshot: &StackSnapshot, default_region: &str) -> MigrationResult<Self> {
        let template = match (&snapshot.template, &snapshot.template_body) {
            (Some(document), _) => Template::from_value(document.clone())?,
            (None, Some(body)) => Template::parse(body)?,
            (None, None) => {
                return Err(MigrationError::InvalidInput(format!(
                    "Stack \"{}\" has no template",
                    snapshot.stack_name
                )));
            }
        };

        let live: BTreeSet<&str> = snapshot
            .resources
            .iter()
            .map(|r| r.logical_resource_id.as_str())
            .collect();

        let missing_in_template: Vec<String> = live
            .iter()
            .filter(|id| !template.is_resource(id))
            .map(|id| id.to_string())
            .collect();

        let missing_in_stack: Vec<String> = template
            .resources
            .iter()
            .filter(|(id, resource)| resource.condition.is_none() && !live.contains(id.as_str()))
            .map(|(id, _)| id.clone())
            .collect();

        if !missing_in_template.is_empty() || !missing_in_stack.is_empty() {
            return Err(MigrationError::ResourceCountMismatch {
                stack_name: snapshot.stack_name.clone(),
                missing_in_stack,
                missing_in_template,
            });
        }

        let resources = snapshot
            .resources
            .iter()
            .filter_map(|live| {
                template
                    .resource(&live.logical_resource_id)
                    .map(|template_resource| CloudFormationResource {
                        logical_id: live.logical_resource_id.clone(),
                        physical_id: live.physical_resource_id.clone(),
                        resource_type: live.resource_type.clone(),
                        template_resource: template_resource.clone(),
                    })
            })
            .collect();

        let parameter_values = snapshot
            .parameters
            .iter()
            .filter_map(|p| {
                snapshot
                    .parameter_value(&p.parameter_key)
                    .map(|v| (p.parameter_key.clone(), v.to_string()))
            })
            .collect();

        let exports = snapshot
            .exports
            .iter()
            .map(|e| (e.name.clone(), e.value.clone()))
            .collect();

        let graph = DependencyGraph::build(&template);

        Ok(Self {
            name: snapshot.stack_name.clone(),
            stack_id: snapshot.stack_id.clone(),
            region: snapshot
                .region
                .clone()
                .unwrap_or_else(|| default_region.to_string()),
            account_id: snapshot.account_id.clone(),
            template,
            resources,
            parameter_values,
            exports,
            graph,
            nested: snapshot.nested_stacks.clone(),
        })
    }

    /// Read a nested stack by name; region, account and exports are inherited
    pub fn nested_stack(&self, stack_name: &str) -> MigrationResult<Self> {
        let snapshot = self.nested.get(stack_name).ok_or_else(|| {
            MigrationError::InvalidInput(format!(
                "Nested stack \"{}\" of \"{}\" is missing from the snapshot",
                stack_name, self.name
            ))
        })?;

        let mut stack = Self::from_snapshot(snapshot, &self.region)?;
        if stack.account_id.is_none() {
            stack.account_id = self.account_id.clone();
        }
        for (name, value) in &self.exports {
            stack.exports.entry(name.clone()).or_insert_with(|| value.clone());
        }

        Ok(stack)
    }

    pub fn resource(&self, logical_id: &str) -> Option<&CloudFormationResource> {
        self.resources.iter().find(|r| r.logical_id == logical_id)
    }

    /// Value of an `AWS::` pseudo parameter in the deployed stack
    ///
    /// `AWS::NoValue` and parameters without a known value yield `None`.
    pub fn pseudo_parameter(&self, name: &str) -> Option<String> {
        match name {
            "AWS::Region" => Some(self.region.clone()),
            "AWS::AccountId" => self.account_id.clone(),
            "AWS::Partition" => Some(self.partition().to_string()),
            "AWS::URLSuffix" => Some(
                if self.region.starts_with("cn-") {
                    "amazonaws.com.cn"
                } else {
                    "amazonaws.com"
                }
                .to_string(),
            ),
            "AWS::StackName" => Some(self.name.clone()),
            "AWS::StackId" => self.stack_id.clone(),
            _ => None,
        }
    }

    pub fn partition(&self) -> &'static str {
        if self.region.starts_with("cn-") {
            "aws-cn"
        } else if self.region.starts_with("us-gov-") {
            "aws-us-gov"
        } else {
            "aws"
        }
    }

    /// Deployed value of a parameter as JSON; list parameters become arrays
    pub fn parameter_value(&self, name: &str) -> Option<Value> {
        let raw = self.parameter_values.get(name).cloned().or_else(|| {
            self.template
                .parameters
                .get(name)
                .and_then(|p| p.default.as_ref())
                .map(|d| match d {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
        })?;

        let is_list = self
            .template
            .parameters
            .get(name)
            .is_some_and(|p| p.is_list());

        Some(if is_list {
            Value::Array(
                raw.split(',')
                    .map(|item| Value::String(item.trim().to_string()))
                    .collect(),
            )
        } else {
            Value::String(raw)
        })
    }
}
