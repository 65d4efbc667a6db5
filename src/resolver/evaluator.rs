use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::cloudformation::CloudFormationStack;
use crate::cloudformation::intrinsic::{Intrinsic, SubPart, parse_sub};
use crate::schema::traits::resource_traits;
use crate::state::StateValue;

/// Attributes of a resource already imported into state
struct ImportedResource<'a> {
    terraform_type: String,
    attributes: &'a BTreeMap<String, StateValue>,
}

/// Computes the literal value an intrinsic had in the deployed stack
///
/// Results are cached per node, so a template that repeats the same
/// expression is only evaluated once.
pub struct IntrinsicEvaluator<'a> {
    stack: &'a CloudFormationStack,
    imported: HashMap<String, ImportedResource<'a>>,
    cache: RefCell<HashMap<String, Option<Value>>>,
}

impl<'a> IntrinsicEvaluator<'a> {
    pub fn new(stack: &'a CloudFormationStack) -> Self {
        Self {
            stack,
            imported: HashMap::new(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Make an imported resource's attributes available to `Fn::GetAtt`
    pub fn with_imported(
        mut self,
        logical_id: &str,
        terraform_type: &str,
        attributes: &'a BTreeMap<String, StateValue>,
    ) -> Self {
        self.imported.insert(
            logical_id.to_string(),
            ImportedResource {
                terraform_type: terraform_type.to_string(),
                attributes,
            },
        );
        self
    }

    /// Evaluate a template node; `None` when its value cannot be known
    pub fn evaluate(&self, node: &Value) -> Option<Value> {
        let key = node.to_string();
        if let Some(cached) = self.cache.borrow().get(&key) {
            return cached.clone();
        }

        let value = self.compute(node);
        self.cache.borrow_mut().insert(key, value.clone());
        value
    }

    /// Evaluate a node expected to produce a single string
    pub fn evaluate_string(&self, node: &Value) -> Option<String> {
        scalar_text(&self.evaluate(node)?)
    }

    fn compute(&self, node: &Value) -> Option<Value> {
        let Some(intrinsic) = Intrinsic::parse(node) else {
            return match node {
                Value::Array(items) => items
                    .iter()
                    .map(|item| self.evaluate(item))
                    .collect::<Option<Vec<_>>>()
                    .map(Value::Array),
                Value::Object(map) => map
                    .iter()
                    .map(|(k, v)| Some((k.clone(), self.evaluate(v)?)))
                    .collect::<Option<serde_json::Map<_, _>>>()
                    .map(Value::Object),
                scalar => Some(scalar.clone()),
            };
        };

        match intrinsic {
            Intrinsic::Ref(name) => self.evaluate_ref(&name),
            Intrinsic::GetAtt {
                resource,
                attribute,
            } => self.evaluate_getatt(&resource, &attribute),
            Intrinsic::Join { separator, items } => {
                let items = match self.evaluate(&items)? {
                    Value::Array(items) => items,
                    _ => return None,
                };

                items
                    .iter()
                    .map(scalar_text)
                    .collect::<Option<Vec<_>>>()
                    .map(|parts| Value::String(parts.join(&separator)))
            }
            Intrinsic::Select { index, list } => {
                let index: usize = self.evaluate_string(&index)?.trim().parse().ok()?;
                match self.evaluate(&list)? {
                    Value::Array(items) => items.into_iter().nth(index),
                    _ => None,
                }
            }
            Intrinsic::Split { separator, source } => {
                let source = self.evaluate_string(&source)?;
                Some(Value::Array(
                    source
                        .split(separator.as_str())
                        .map(|s| Value::String(s.to_string()))
                        .collect(),
                ))
            }
            Intrinsic::Sub {
                template,
                variables,
            } => {
                let mut result = String::new();
                for part in parse_sub(&template) {
                    match part {
                        SubPart::Literal(text) => result.push_str(&text),
                        SubPart::Placeholder(name) => {
                            let value = match variables.get(&name) {
                                Some(value) => self.evaluate_string(value)?,
                                None => match name.split_once('.') {
                                    Some((resource, attribute)) if !name.starts_with("AWS::") => {
                                        scalar_text(&self.evaluate_getatt(resource, attribute)?)?
                                    }
                                    _ => scalar_text(&self.evaluate_ref(&name)?)?,
                                },
                            };
                            result.push_str(&value);
                        }
                    }
                }
                Some(Value::String(result))
            }
            Intrinsic::FindInMap {
                map_name,
                top_key,
                second_key,
            } => {
                let map_name = self.evaluate_string(&map_name)?;
                let top_key = self.evaluate_string(&top_key)?;
                let second_key = self.evaluate_string(&second_key)?;

                self.stack
                    .template
                    .mappings
                    .get(&map_name)?
                    .get(&top_key)?
                    .get(&second_key)
                    .cloned()
            }
            Intrinsic::ImportValue(name) => {
                let name = self.evaluate_string(&name)?;
                self.stack.exports.get(&name).cloned().map(Value::String)
            }
            Intrinsic::If {
                condition,
                when_true,
                when_false,
            } => {
                if self.evaluate_condition(&condition)? {
                    self.evaluate(&when_true)
                } else {
                    self.evaluate(&when_false)
                }
            }
            Intrinsic::GetAZs(_) | Intrinsic::Base64(_) | Intrinsic::Cidr(_) | Intrinsic::Other(_) => None,
        }
    }

    fn evaluate_ref(&self, name: &str) -> Option<Value> {
        if name.starts_with("AWS::") {
            return self.stack.pseudo_parameter(name).map(Value::String);
        }

        if self.stack.template.is_parameter(name) {
            return self.stack.parameter_value(name);
        }

        self.stack
            .resource(name)
            .map(|r| Value::String(r.physical_id.clone()))
    }

    fn evaluate_getatt(&self, resource: &str, attribute: &str) -> Option<Value> {
        let imported = self.imported.get(resource)?;
        let name = resource_traits(&imported.terraform_type).terraform_attribute(attribute);

        imported.attributes.get(&name)?.to_literal()
    }

    /// Evaluate a named condition of the template
    pub fn evaluate_condition(&self, name: &str) -> Option<bool> {
        let condition = self.stack.template.conditions.get(name)?;
        self.condition_value(condition)
    }

    fn condition_value(&self, node: &Value) -> Option<bool> {
        let map = node.as_object()?;
        let (function, args) = map.iter().next()?;

        match function.as_str() {
            "Condition" => self.evaluate_condition(args.as_str()?),
            "Fn::Equals" => {
                let items = args.as_array()?;
                let left = self.evaluate(items.first()?)?;
                let right = self.evaluate(items.get(1)?)?;
                Some(scalar_text(&left)? == scalar_text(&right)?)
            }
            "Fn::Not" => Some(!self.condition_value(args.as_array()?.first()?)?),
            "Fn::And" => {
                let mut all = true;
                for item in args.as_array()? {
                    all &= self.condition_value(item)?;
                }
                Some(all)
            }
            "Fn::Or" => {
                let mut any = false;
                for item in args.as_array()? {
                    any |= self.condition_value(item)?;
                }
                Some(any)
            }
            _ => None,
        }
    }
}

/// Text of a scalar JSON value as CloudFormation would substitute it
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloudformation::StackSnapshot;
    use serde_json::json;

    fn stack() -> CloudFormationStack {
        let snapshot: StackSnapshot = serde_json::from_value(json!({
            "StackName": "app",
            "Region": "us-gov-west-1",
            "AccountId": "123456789012",
            "Parameters": [
                {"ParameterKey": "Env", "ParameterValue": "prod"},
                {"ParameterKey": "Subnets", "ParameterValue": "subnet-a,subnet-b"}
            ],
            "Exports": [{"Name": "network-VpcId", "Value": "vpc-123"}],
            "Template": {
                "Parameters": {
                    "Env": {"Type": "String"},
                    "Subnets": {"Type": "CommaDelimitedList"}
                },
                "Mappings": {"Sizes": {"prod": {"Instance": "m5.large"}}},
                "Conditions": {
                    "IsProd": {"Fn::Equals": [{"Ref": "Env"}, "prod"]},
                    "IsDev": {"Fn::Not": [{"Condition": "IsProd"}]}
                },
                "Resources": {"Queue": {"Type": "AWS::SQS::Queue"}}
            },
            "Resources": [
                {"LogicalResourceId": "Queue", "PhysicalResourceId": "https://sqs/app-Queue", "ResourceType": "AWS::SQS::Queue"}
            ]
        }))
        .unwrap();
        CloudFormationStack::from_snapshot(&snapshot, "us-east-1").unwrap()
    }

    #[test]
    fn test_refs_and_pseudo_parameters() {
        let stack = stack();
        let evaluator = IntrinsicEvaluator::new(&stack);

        assert_eq!(evaluator.evaluate(&json!({"Ref": "Env"})), Some(json!("prod")));
        assert_eq!(evaluator.evaluate(&json!({"Ref": "Queue"})), Some(json!("https://sqs/app-Queue")));
        assert_eq!(
            evaluator.evaluate(&json!({"Ref": "AWS::Partition"})),
            Some(json!("aws-us-gov"))
        );
        assert_eq!(evaluator.evaluate(&json!({"Ref": "AWS::NoValue"})), None);
    }

    #[test]
    fn test_join_select_split_sub() {
        let stack = stack();
        let evaluator = IntrinsicEvaluator::new(&stack);

        assert_eq!(
            evaluator.evaluate(&json!({"Fn::Join": [",", {"Ref": "Subnets"}]})),
            Some(json!("subnet-a,subnet-b"))
        );
        assert_eq!(
            evaluator.evaluate(&json!({"Fn::Select": [1, {"Ref": "Subnets"}]})),
            Some(json!("subnet-b"))
        );
        assert_eq!(
            evaluator.evaluate(&json!({"Fn::Split": ["-", "a-b"]})),
            Some(json!(["a", "b"]))
        );
        assert_eq!(
            evaluator.evaluate(&json!({"Fn::Sub": "arn:${AWS::Partition}:sqs:${AWS::Region}:${AWS::AccountId}:${Env}"})),
            Some(json!("arn:aws-us-gov:sqs:us-gov-west-1:123456789012:prod"))
        );
    }

    #[test]
    fn test_mappings_conditions_and_exports() {
        let stack = stack();
        let evaluator = IntrinsicEvaluator::new(&stack);

        assert_eq!(
            evaluator.evaluate(&json!({"Fn::FindInMap": ["Sizes", {"Ref": "Env"}, "Instance"]})),
            Some(json!("m5.large"))
        );
        assert_eq!(evaluator.evaluate_condition("IsDev"), Some(false));
        assert_eq!(
            evaluator.evaluate(&json!({"Fn::If": ["IsProd", "big", "small"]})),
            Some(json!("big"))
        );
        assert_eq!(
            evaluator.evaluate(&json!({"Fn::ImportValue": "network-VpcId"})),
            Some(json!("vpc-123"))
        );
        assert_eq!(evaluator.evaluate(&json!({"Fn::GetAZs": ""})), None);
    }

    #[test]
    fn test_getatt_reads_imported_state() {
        let stack = stack();
        let attributes = BTreeMap::from([
            ("arn".to_string(), StateValue::from("arn:aws:sqs:::app-Queue")),
            ("url".to_string(), StateValue::from("https://sqs/app-Queue")),
        ]);
        let evaluator =
            IntrinsicEvaluator::new(&stack).with_imported("Queue", "aws_sqs_queue", &attributes);

        assert_eq!(
            evaluator.evaluate(&json!({"Fn::GetAtt": ["Queue", "Arn"]})),
            Some(json!("arn:aws:sqs:::app-Queue"))
        );
        assert_eq!(
            evaluator.evaluate(&json!({"Fn::GetAtt": ["Queue", "QueueUrl"]})),
            Some(json!("https://sqs/app-Queue"))
        );
        assert_eq!(evaluator.evaluate(&json!({"Fn::GetAtt": ["Other", "Arn"]})), None);
    }
}
