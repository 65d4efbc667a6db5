use std::collections::HashMap;

use serde::Deserialize;

use super::resource_schema::ResourceSchema;
use super::traits::{ResourceTraits, resource_traits};
use crate::error::{MigrationError, MigrationResult};

const EMBEDDED_SCHEMA: &str = include_str!("data/terraform-aws-schema.json");
const EMBEDDED_TYPE_MAP: &str = include_str!("data/terraform-resource-map.json");

/// One row of the AWS → Terraform type table
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceTypeMapping {
    #[serde(rename = "AWS")]
    pub aws: String,
    #[serde(rename = "TF")]
    pub terraform: String,
}

/// Immutable registry of the bundled AWS provider schema
///
/// Built once at start-up and handed by reference to every component that
/// needs schema information.
#[derive(Debug)]
pub struct AwsSchema {
    resources: HashMap<String, ResourceSchema>,
    aws_to_terraform: HashMap<String, String>,
    terraform_to_aws: HashMap<String, String>,
}

impl AwsSchema {
    /// Load the schema and type map compiled into the binary
    pub fn embedded() -> MigrationResult<Self> {
        Self::from_json(EMBEDDED_SCHEMA, EMBEDDED_TYPE_MAP)
    }

    pub fn from_json(schema_json: &str, type_map_json: &str) -> MigrationResult<Self> {
        let resources: HashMap<String, ResourceSchema> = serde_json::from_str(schema_json)
            .map_err(|e| MigrationError::Serialization(format!("Malformed provider schema: {}", e)))?;
        let mappings: Vec<ResourceTypeMapping> = serde_json::from_str(type_map_json)
            .map_err(|e| MigrationError::Serialization(format!("Malformed resource type map: {}", e)))?;

        let mut aws_to_terraform = HashMap::new();
        let mut terraform_to_aws = HashMap::new();

        for mapping in mappings {
            terraform_to_aws
                .entry(mapping.terraform.clone())
                .or_insert_with(|| mapping.aws.clone());
            aws_to_terraform.insert(mapping.aws, mapping.terraform);
        }

        Ok(Self {
            resources,
            aws_to_terraform,
            terraform_to_aws,
        })
    }

    /// Terraform resource type for an AWS type
    pub fn terraform_type(&self, aws_type: &str) -> Option<&str> {
        self.aws_to_terraform.get(aws_type).map(String::as_str)
    }

    /// AWS type a Terraform resource type was mapped from
    pub fn aws_type(&self, terraform_type: &str) -> Option<&str> {
        self.terraform_to_aws.get(terraform_type).map(String::as_str)
    }

    /// Schema for an AWS (`AWS::EC2::Instance`) or Terraform (`aws_instance`) type
    pub fn resource_schema(&self, name: &str) -> MigrationResult<&ResourceSchema> {
        let terraform_type = if name.starts_with("AWS::") {
            self.terraform_type(name)
                .ok_or_else(|| MigrationError::TypeNotMapped(name.to_string()))?
        } else {
            name
        };

        self.resources
            .get(terraform_type)
            .ok_or_else(|| MigrationError::SchemaNotFound(terraform_type.to_string()))
    }

    pub fn traits(&self, terraform_type: &str) -> &'static ResourceTraits {
        resource_traits(terraform_type)
    }

    /// All Terraform types with a bundled schema, sorted
    pub fn terraform_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.resources.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}
