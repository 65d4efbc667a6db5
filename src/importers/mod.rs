//! Import id strategies
//!
//! `terraform import` takes the physical id for most resource types. The
//! types below need an id assembled from the resource's properties or from
//! the resources it depends on; each has an [`ImportIdStrategy`] registered
//! under its Terraform type.

pub mod api_gateway;
pub mod cognito;
pub mod registry;
pub mod services;
pub mod vpc;

pub use registry::{DefaultImporterRegistry, ImporterRegistry};

use std::collections::BTreeSet;

use serde_json::Value;

use crate::cloudformation::{CloudFormationResource, CloudFormationStack};
use crate::mapper::ResourceMapping;
use crate::resolver::IntrinsicEvaluator;
use crate::resolver::evaluator::scalar_text;

/// Computes the id `terraform import` needs for one resource type
pub trait ImportIdStrategy: Send + Sync {
    /// Import id for the resource, or `None` to skip importing it
    fn import_id(&self, ctx: &ImportContext<'_>, warnings: &mut Vec<String>) -> Option<String>;
}

/// What a strategy knows about the resource being imported
pub struct ImportContext<'a> {
    pub mapping: &'a ResourceMapping,
    pub stack: &'a CloudFormationStack,
    /// Every mapping of the module the resource belongs to
    pub module_mappings: &'a [ResourceMapping],
    pub evaluator: &'a IntrinsicEvaluator<'a>,
}

impl<'a> ImportContext<'a> {
    pub fn resource(&self) -> Option<&'a CloudFormationResource> {
        self.stack.resource(&self.mapping.logical_id)
    }

    pub fn property(&self, path: &str) -> Option<&'a Value> {
        self.resource()?.template_resource.property(path)
    }

    /// Deployed value of a property as text, evaluating any intrinsic
    pub fn property_text(&self, path: &str) -> Option<String> {
        let value = self.property(path)?;
        scalar_text(value).or_else(|| self.evaluator.evaluate_string(value))
    }

    /// Physical id of the single resource of `aws_type` this one depends on
    ///
    /// Falls back to the deployed value of `property` when the dependency
    /// graph has no such resource, or more than one.
    pub fn related_physical_id(&self, aws_type: &str, property: &str) -> Option<String> {
        let targets: BTreeSet<&str> = self
            .stack
            .graph
            .dependencies_of(&self.mapping.logical_id)
            .into_iter()
            .map(|edge| edge.to.as_str())
            .filter(|target| {
                self.stack
                    .resource(target)
                    .is_some_and(|r| r.resource_type == aws_type)
            })
            .collect();

        if targets.len() == 1 {
            let target = targets.into_iter().next()?;
            let physical_id = self
                .module_mappings
                .iter()
                .find(|m| m.logical_id == target)
                .map(|m| m.physical_id.clone())
                .or_else(|| self.stack.resource(target).map(|r| r.physical_id.clone()));

            if physical_id.is_some() {
                return physical_id;
            }
        }

        self.property_text(property)
    }

    /// [`Self::related_physical_id`], warning when neither source yields a value
    pub fn require_related(
        &self,
        aws_type: &str,
        property: &str,
        warnings: &mut Vec<String>,
    ) -> Option<String> {
        let id = self.related_physical_id(aws_type, property);
        if id.is_none() {
            warnings.push(self.cannot_determine(property));
        }
        id
    }

    /// [`Self::property_text`], warning when the property has no value
    pub fn require_property(&self, path: &str, warnings: &mut Vec<String>) -> Option<String> {
        let text = self.property_text(path);
        if text.is_none() {
            warnings.push(self.cannot_determine(path));
        }
        text
    }

    fn cannot_determine(&self, what: &str) -> String {
        format!(
            "Cannot determine {} for resource \"{}\"",
            what, self.mapping.logical_id
        )
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::testing::Fixture;
    use super::*;
    use crate::test_helpers::SnapshotBuilder;

    struct RelatedTable;

    impl ImportIdStrategy for RelatedTable {
        fn import_id(&self, ctx: &ImportContext<'_>, _warnings: &mut Vec<String>) -> Option<String> {
            ctx.related_physical_id("AWS::EC2::RouteTable", "RouteTableId")
        }
    }

    #[test]
    fn test_related_resource_from_graph() {
        let fixture = Fixture::new(
            SnapshotBuilder::new("net")
                .resource("Table", "AWS::EC2::RouteTable", "rtb-111")
                .resource_with_properties(
                    "Route",
                    "AWS::EC2::Route",
                    "rtb-111_0.0.0.0/0",
                    json!({"RouteTableId": {"Ref": "Table"}}),
                ),
        );

        assert_eq!(fixture.import_id(&RelatedTable, "Route").0.as_deref(), Some("rtb-111"));
    }

    #[test]
    fn test_related_resource_falls_back_to_property() {
        let fixture = Fixture::new(SnapshotBuilder::new("net").resource_with_properties(
            "Route",
            "AWS::EC2::Route",
            "r-1",
            json!({"RouteTableId": "rtb-external"}),
        ));

        assert_eq!(
            fixture.import_id(&RelatedTable, "Route").0.as_deref(),
            Some("rtb-external")
        );
    }

    struct RequiredTable;

    impl ImportIdStrategy for RequiredTable {
        fn import_id(&self, ctx: &ImportContext<'_>, warnings: &mut Vec<String>) -> Option<String> {
            let table = ctx.require_related("AWS::EC2::RouteTable", "RouteTableId", warnings)?;
            let cidr = ctx.require_property("DestinationCidrBlock", warnings)?;
            Some(format!("{}_{}", table, cidr))
        }
    }

    #[test]
    fn test_required_values_warn_when_missing() {
        let fixture = Fixture::new(
            SnapshotBuilder::new("net")
                .resource_with_properties("Orphan", "AWS::EC2::Route", "r-1", json!({}))
                .resource_with_properties(
                    "NoCidr",
                    "AWS::EC2::Route",
                    "r-2",
                    json!({"RouteTableId": "rtb-external"}),
                ),
        );

        let (id, warnings) = fixture.import_id(&RequiredTable, "Orphan");
        assert!(id.is_none());
        assert_eq!(
            warnings,
            vec!["Cannot determine RouteTableId for resource \"Orphan\""]
        );

        let (id, warnings) = fixture.import_id(&RequiredTable, "NoCidr");
        assert!(id.is_none());
        assert_eq!(
            warnings,
            vec!["Cannot determine DestinationCidrBlock for resource \"NoCidr\""]
        );
    }
}
