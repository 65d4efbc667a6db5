use std::collections::BTreeMap;

use serde_json::Value;

use crate::cloudformation::intrinsic::{Intrinsic, SubPart, parse_sub};
use crate::cloudformation::CloudFormationStack;
use crate::error::{MigrationError, MigrationResult};
use crate::reference::{FunctionArgument, MapKey, Reference};
use crate::schema::traits::resource_traits;

/// Pseudo parameters Terraform can read from a data source
const PSEUDO_PARAMETERS: &[(&str, &str, &str)] = &[
    ("AWS::Region", "aws_region", "name"),
    ("AWS::AccountId", "aws_caller_identity", "account_id"),
    ("AWS::Partition", "aws_partition", "partition"),
    ("AWS::URLSuffix", "aws_partition", "dns_suffix"),
];

/// Turns intrinsic nodes into Terraform references
///
/// `Ok(None)` means there is no static expression for the node and the
/// captured literal should stay. `Err` marks a construct that can never be
/// expressed.
pub struct IntrinsicResolver<'a> {
    stack: &'a CloudFormationStack,
    /// Logical id → Terraform type of every resource mapped in this module
    mapped: &'a BTreeMap<String, String>,
    /// Logical id of a nested stack resource → its module name
    modules: &'a BTreeMap<String, String>,
}

impl<'a> IntrinsicResolver<'a> {
    pub fn new(
        stack: &'a CloudFormationStack,
        mapped: &'a BTreeMap<String, String>,
        modules: &'a BTreeMap<String, String>,
    ) -> Self {
        Self {
            stack,
            mapped,
            modules,
        }
    }

    pub fn resolve(&self, node: &Value) -> MigrationResult<Option<Reference>> {
        let Some(intrinsic) = Intrinsic::parse(node) else {
            return Ok(None);
        };

        match intrinsic {
            Intrinsic::Ref(name) => self.resolve_ref(&name),
            Intrinsic::GetAtt {
                resource,
                attribute,
            } => Ok(self.resolve_getatt(&resource, &attribute)),
            Intrinsic::FindInMap {
                map_name,
                top_key,
                second_key,
            } => {
                let Some(map_name) = map_name.as_str() else {
                    return Err(MigrationError::Intrinsic("Fn::FindInMap".to_string()));
                };

                let (Some(top_key), Some(second_key)) =
                    (self.map_key(&top_key)?, self.map_key(&second_key)?)
                else {
                    return Ok(None);
                };

                Ok(Some(Reference::Map {
                    map_name: map_name.to_string(),
                    top_key,
                    second_key,
                    index: None,
                }))
            }
            Intrinsic::GetAZs(_) => Ok(Some(
                Reference::data_source("aws_availability_zones", "available", "names")
                    .with_argument("state", "available"),
            )),
            Intrinsic::Select { index, list } => {
                let index = select_index(&index)?;

                if let Value::Array(items) = &list {
                    return match items.get(index) {
                        Some(item) => self.resolve(item),
                        None => Ok(None),
                    };
                }

                Ok(self.resolve(&list)?.and_then(|r| r.with_index(index)))
            }
            Intrinsic::Join { separator, items } => {
                let items = match &items {
                    Value::Array(items) => match self.arguments(items)? {
                        Some(arguments) => FunctionArgument::List(arguments),
                        None => return Ok(None),
                    },
                    other => match self.argument(other)? {
                        Some(argument) => argument,
                        None => return Ok(None),
                    },
                };

                Ok(Some(Reference::function(
                    "join",
                    vec![FunctionArgument::String(separator), items],
                )))
            }
            Intrinsic::Split { separator, source } => Ok(self.argument(&source)?.map(|source| {
                Reference::function("split", vec![FunctionArgument::String(separator), source])
            })),
            Intrinsic::Sub {
                template,
                variables,
            } => self.resolve_sub(&template, &variables),
            Intrinsic::Base64(value) => Ok(self
                .argument(&value)?
                .map(|argument| Reference::function("base64encode", vec![argument]))),
            Intrinsic::ImportValue(name) => Ok(name.as_str().map(|export| {
                Reference::data_source("aws_cloudformation_export", export_data_name(export), "value")
                    .with_argument("name", export)
            })),
            Intrinsic::Cidr(_) | Intrinsic::If { .. } | Intrinsic::Other(_) => Ok(None),
        }
    }

    fn resolve_ref(&self, name: &str) -> MigrationResult<Option<Reference>> {
        if name.starts_with("AWS::") {
            return PSEUDO_PARAMETERS
                .iter()
                .find(|(pseudo, _, _)| *pseudo == name)
                .map(|(_, data_type, attribute)| {
                    Some(Reference::data_source(*data_type, "current", *attribute))
                })
                .ok_or_else(|| MigrationError::PseudoParameter(name.to_string()));
        }

        if let Some(parameter) = self.stack.template.parameters.get(name) {
            if parameter.is_ssm_parameter() {
                let path = parameter
                    .default
                    .as_ref()
                    .and_then(Value::as_str)
                    .unwrap_or(name);
                return Ok(Some(
                    Reference::data_source("aws_ssm_parameter", name, "value")
                        .with_argument("name", path),
                ));
            }

            return Ok(Some(Reference::variable(name)));
        }

        if self.modules.contains_key(name) {
            return Ok(None);
        }

        Ok(self
            .mapped
            .get(name)
            .map(|terraform_type| Reference::direct(format!("{}.{}", terraform_type, name))))
    }

    fn resolve_getatt(&self, resource: &str, attribute: &str) -> Option<Reference> {
        if let Some(module) = self.modules.get(resource) {
            return attribute.strip_prefix("Outputs.").map(|output| Reference::Module {
                module: module.clone(),
                output: output.to_string(),
            });
        }

        let terraform_type = self.mapped.get(resource)?;
        Some(Reference::indirect(
            format!("{}.{}", terraform_type, resource),
            resource_traits(terraform_type).terraform_attribute(attribute),
        ))
    }

    fn resolve_sub(
        &self,
        template: &str,
        variables: &BTreeMap<String, Value>,
    ) -> MigrationResult<Option<Reference>> {
        let parts = parse_sub(template);
        if !parts.iter().any(|p| matches!(p, SubPart::Placeholder(_))) {
            return Ok(None);
        }

        let mut arguments = Vec::new();
        for part in parts {
            let argument = match part {
                SubPart::Literal(text) => Some(FunctionArgument::String(text)),
                SubPart::Placeholder(name) => {
                    let reference = if let Some(value) = variables.get(&name) {
                        match self.argument(value)? {
                            Some(argument) => {
                                arguments.push(argument);
                                continue;
                            }
                            None => None,
                        }
                    } else if name.starts_with("AWS::") {
                        self.resolve_ref(&name)?
                    } else if let Some((resource, attribute)) = name.split_once('.') {
                        self.resolve_getatt(resource, attribute)
                    } else {
                        self.resolve_ref(&name)?
                    };

                    reference.map(|r| FunctionArgument::Reference(Box::new(r)))
                }
            };

            match argument {
                Some(argument) => arguments.push(argument),
                None => return Ok(None),
            }
        }

        Ok(Some(Reference::function(
            "join",
            vec![
                FunctionArgument::String(String::new()),
                FunctionArgument::List(arguments),
            ],
        )))
    }

    /// Resolve a literal or intrinsic into a function argument
    fn argument(&self, value: &Value) -> MigrationResult<Option<FunctionArgument>> {
        Ok(match value {
            Value::String(s) => Some(FunctionArgument::String(s.clone())),
            Value::Number(n) => Some(FunctionArgument::Number(n.clone())),
            Value::Bool(b) => Some(FunctionArgument::Bool(*b)),
            Value::Array(items) => self.arguments(items)?.map(FunctionArgument::List),
            Value::Object(_) => self
                .resolve(value)?
                .map(|r| FunctionArgument::Reference(Box::new(r))),
            Value::Null => None,
        })
    }

    fn arguments(&self, items: &[Value]) -> MigrationResult<Option<Vec<FunctionArgument>>> {
        let mut arguments = Vec::with_capacity(items.len());
        for item in items {
            match self.argument(item)? {
                Some(argument) => arguments.push(argument),
                None => return Ok(None),
            }
        }
        Ok(Some(arguments))
    }

    fn map_key(&self, key: &Value) -> MigrationResult<Option<MapKey>> {
        match key {
            Value::String(s) => Ok(Some(MapKey::Literal(s.clone()))),
            Value::Number(n) => Ok(Some(MapKey::Literal(n.to_string()))),
            other => match Intrinsic::parse(other) {
                Some(Intrinsic::Ref(name)) => Ok(self
                    .resolve_ref(&name)?
                    .map(|r| MapKey::Expression(Box::new(r)))),
                Some(intrinsic) => Err(MigrationError::Intrinsic(intrinsic.name())),
                None => Err(MigrationError::Intrinsic("Fn::FindInMap".to_string())),
            },
        }
    }
}

fn select_index(index: &Value) -> MigrationResult<usize> {
    let parsed = match index {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    parsed
        .and_then(|i| usize::try_from(i).ok())
        .ok_or_else(|| MigrationError::Intrinsic("Fn::Select".to_string()))
}

/// Name of the `aws_cloudformation_export` data block for an export
pub fn export_data_name(export: &str) -> String {
    let mut name: String = export
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();

    if !name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        name.insert(0, '_');
    }

    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloudformation::StackSnapshot;
    use serde_json::json;

    fn stack() -> CloudFormationStack {
        let snapshot: StackSnapshot = serde_json::from_value(json!({
            "StackName": "app",
            "Region": "eu-west-1",
            "Template": {
                "Parameters": {
                    "Env": {"Type": "String"},
                    "AmiId": {"Type": "AWS::SSM::Parameter::Value<AWS::EC2::Image::Id>", "Default": "/aws/service/ami"}
                },
                "Mappings": {"RegionMap": {"eu-west-1": {"AMI": "ami-1"}}},
                "Resources": {
                    "Vpc": {"Type": "AWS::EC2::VPC"},
                    "Bucket": {"Type": "AWS::S3::Bucket"},
                    "Network": {"Type": "AWS::CloudFormation::Stack"},
                    "Odd": {"Type": "AWS::Custom::Thing"}
                }
            },
            "Resources": [
                {"LogicalResourceId": "Vpc", "PhysicalResourceId": "vpc-1", "ResourceType": "AWS::EC2::VPC"},
                {"LogicalResourceId": "Bucket", "PhysicalResourceId": "b", "ResourceType": "AWS::S3::Bucket"},
                {"LogicalResourceId": "Network", "PhysicalResourceId": "n", "ResourceType": "AWS::CloudFormation::Stack"},
                {"LogicalResourceId": "Odd", "PhysicalResourceId": "o", "ResourceType": "AWS::Custom::Thing"}
            ]
        }))
        .unwrap();
        CloudFormationStack::from_snapshot(&snapshot, "us-east-1").unwrap()
    }

    fn resolve(node: Value) -> MigrationResult<Option<String>> {
        let stack = stack();
        let mapped = BTreeMap::from([
            ("Vpc".to_string(), "aws_vpc".to_string()),
            ("Bucket".to_string(), "aws_s3_bucket".to_string()),
        ]);
        let modules = BTreeMap::from([("Network".to_string(), "app-Network".to_string())]);
        let resolver = IntrinsicResolver::new(&stack, &mapped, &modules);
        resolver.resolve(&node).map(|r| r.map(|r| r.expression()))
    }

    #[test]
    fn test_ref_targets() {
        assert_eq!(resolve(json!({"Ref": "Vpc"})).unwrap().unwrap(), "aws_vpc.Vpc.id");
        assert_eq!(resolve(json!({"Ref": "Env"})).unwrap().unwrap(), "var.Env");
        assert_eq!(
            resolve(json!({"Ref": "AmiId"})).unwrap().unwrap(),
            "data.aws_ssm_parameter.AmiId.value"
        );
        assert_eq!(
            resolve(json!({"Ref": "AWS::Region"})).unwrap().unwrap(),
            "data.aws_region.current.name"
        );
        assert_eq!(resolve(json!({"Ref": "Odd"})).unwrap(), None);
        assert_eq!(resolve(json!({"Ref": "Network"})).unwrap(), None);
    }

    #[test]
    fn test_unsupported_pseudo_parameter() {
        let err = resolve(json!({"Ref": "AWS::NotificationARNs"})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Pseudo parameter \"AWS::NotificationARNs\" cannot be referenced by terraform."
        );
    }

    #[test]
    fn test_getatt_uses_attribute_map() {
        assert_eq!(
            resolve(json!({"Fn::GetAtt": ["Bucket", "DomainName"]})).unwrap().unwrap(),
            "aws_s3_bucket.Bucket.bucket_domain_name"
        );
        assert_eq!(
            resolve(json!({"Fn::GetAtt": ["Vpc", "CidrBlock"]})).unwrap().unwrap(),
            "aws_vpc.Vpc.cidr_block"
        );
        assert_eq!(
            resolve(json!({"Fn::GetAtt": ["Network", "Outputs.VpcId"]})).unwrap().unwrap(),
            "module.app-Network.VpcId"
        );
    }

    #[test]
    fn test_find_in_map() {
        assert_eq!(
            resolve(json!({"Fn::FindInMap": ["RegionMap", {"Ref": "AWS::Region"}, "AMI"]}))
                .unwrap()
                .unwrap(),
            "local.mappings.RegionMap[data.aws_region.current.name].AMI"
        );

        let err = resolve(json!({"Fn::FindInMap": ["RegionMap", {"Fn::Sub": "x"}, "AMI"]})).unwrap_err();
        assert_eq!(err.to_string(), "Intrinsic \"Fn::Sub\" cannot be resolved.");

        assert!(resolve(json!({"Fn::FindInMap": [{"Ref": "Env"}, "a", "b"]})).is_err());
    }

    #[test]
    fn test_select_and_getazs() {
        assert_eq!(
            resolve(json!({"Fn::Select": [1, {"Fn::GetAZs": ""}]})).unwrap().unwrap(),
            "data.aws_availability_zones.available.names[1]"
        );
        assert_eq!(
            resolve(json!({"Fn::Select": ["0", [{"Ref": "Vpc"}, "x"]]})).unwrap().unwrap(),
            "aws_vpc.Vpc.id"
        );
        assert_eq!(resolve(json!({"Fn::Select": [0, {"Ref": "Vpc"}]})).unwrap(), None);
        assert!(resolve(json!({"Fn::Select": ["first", {"Ref": "Vpc"}]})).is_err());
    }

    #[test]
    fn test_join_split_sub_base64() {
        assert_eq!(
            resolve(json!({"Fn::Join": ["-", ["app", {"Ref": "Env"}]]})).unwrap().unwrap(),
            "join(\"-\", [\"app\", var.Env])"
        );
        assert_eq!(
            resolve(json!({"Fn::Split": [",", {"Ref": "Env"}]})).unwrap().unwrap(),
            "split(\",\", var.Env)"
        );
        assert_eq!(
            resolve(json!({"Fn::Sub": "${AWS::Partition}:${Bucket.Arn}/${Env}"})).unwrap().unwrap(),
            "join(\"\", [data.aws_partition.current.partition, \":\", aws_s3_bucket.Bucket.arn, \"/\", var.Env])"
        );
        assert_eq!(
            resolve(json!({"Fn::Sub": ["${Name}-x", {"Name": {"Ref": "Env"}}]})).unwrap().unwrap(),
            "join(\"\", [var.Env, \"-x\"])"
        );
        assert_eq!(resolve(json!({"Fn::Sub": "no placeholders"})).unwrap(), None);
        assert_eq!(
            resolve(json!({"Fn::Base64": {"Ref": "Env"}})).unwrap().unwrap(),
            "base64encode(var.Env)"
        );
    }

    #[test]
    fn test_import_value_and_unresolvable() {
        assert_eq!(
            resolve(json!({"Fn::ImportValue": "network:VpcId"})).unwrap().unwrap(),
            "data.aws_cloudformation_export.network_VpcId.value"
        );
        assert_eq!(resolve(json!({"Fn::If": ["IsProd", "a", "b"]})).unwrap(), None);
        assert_eq!(resolve(json!({"Fn::Join": ["-", [{"Ref": "Odd"}]]})).unwrap(), None);
    }
}
