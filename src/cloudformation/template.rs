use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Number, Value};
use serde_yaml::Value as YamlValue;

use crate::error::{MigrationError, MigrationResult};

/// A parsed CloudFormation template
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, TemplateParameter>,
    #[serde(default)]
    pub mappings: BTreeMap<String, Value>,
    #[serde(default)]
    pub conditions: BTreeMap<String, Value>,
    #[serde(default)]
    pub resources: BTreeMap<String, TemplateResource>,
    #[serde(default)]
    pub outputs: BTreeMap<String, TemplateOutput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateParameter {
    #[serde(rename = "Type", default = "default_parameter_type")]
    pub parameter_type: String,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub no_echo: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateResource {
    #[serde(rename = "Type")]
    pub resource_type: String,
    #[serde(default)]
    pub properties: Value,
    #[serde(default, deserialize_with = "one_or_many")]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub condition: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateOutput {
    pub value: Value,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub export: Option<Value>,
    #[serde(default)]
    pub condition: Option<String>,
}

fn default_parameter_type() -> String {
    "String".to_string()
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(name)) => vec![name],
        Some(OneOrMany::Many(names)) => names,
        None => Vec::new(),
    })
}

impl Template {
    /// Parse a template body in JSON or YAML, including YAML short-form tags
    pub fn parse(body: &str) -> MigrationResult<Self> {
        let json = if body.trim_start().starts_with('{') {
            serde_json::from_str(body)?
        } else {
            let yaml: YamlValue = serde_yaml::from_str(body).map_err(|e| {
                MigrationError::InvalidInput(format!("Template is neither JSON nor YAML: {}", e))
            })?;
            yaml_to_json(yaml)
        };

        Self::from_value(json)
    }

    pub fn from_value(value: Value) -> MigrationResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| MigrationError::InvalidInput(format!("Malformed template: {}", e)))
    }

    pub fn resource(&self, logical_id: &str) -> Option<&TemplateResource> {
        self.resources.get(logical_id)
    }

    pub fn is_resource(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }

    pub fn is_parameter(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }
}

impl TemplateParameter {
    pub fn is_no_echo(&self) -> bool {
        match &self.no_echo {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    /// Parameters resolved from SSM at deploy time (`AWS::SSM::Parameter::Value<...>`)
    pub fn is_ssm_parameter(&self) -> bool {
        self.parameter_type.starts_with("AWS::SSM::Parameter::Value<")
    }

    /// Whether the deployed value is a comma separated list
    pub fn is_list(&self) -> bool {
        self.parameter_type == "CommaDelimitedList"
            || self.parameter_type.starts_with("List<")
            || (self.is_ssm_parameter() && self.parameter_type.contains("List<"))
    }
}

impl TemplateResource {
    /// Look up a property by dotted path; numeric segments index lists
    pub fn property(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(&self.properties, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?),
            _ => None,
        })
    }

    /// A property holding a plain string
    pub fn string_property(&self, path: &str) -> Option<&str> {
        self.property(path).and_then(Value::as_str)
    }
}

/// Convert YAML into the JSON form of a template
///
/// Short-form tags become their long form: `!Ref X` → `{"Ref": "X"}`,
/// `!GetAtt A.B` → `{"Fn::GetAtt": ["A", "B"]}`, `!Sub s` → `{"Fn::Sub": s}`.
pub fn yaml_to_json(yaml: YamlValue) -> Value {
    match yaml {
        YamlValue::Null => Value::Null,
        YamlValue::Bool(b) => Value::Bool(b),
        YamlValue::Number(n) => yaml_number(&n),
        YamlValue::String(s) => Value::String(s),
        YamlValue::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect()),
        YamlValue::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, value) in mapping {
                map.insert(yaml_key(key), yaml_to_json(value));
            }
            Value::Object(map)
        }
        YamlValue::Tagged(tagged) => {
            let tag = tagged.tag.to_string();
            let name = tag.trim_start_matches('!');
            let value = yaml_to_json(tagged.value);

            let (key, value) = match name {
                "Ref" | "Condition" => (name.to_string(), value),
                "GetAtt" => {
                    let value = match value {
                        Value::String(s) => match s.split_once('.') {
                            Some((resource, attribute)) => {
                                Value::Array(vec![resource.into(), attribute.into()])
                            }
                            None => Value::String(s),
                        },
                        other => other,
                    };
                    ("Fn::GetAtt".to_string(), value)
                }
                _ => (format!("Fn::{}", name), value),
            };

            let mut map = Map::new();
            map.insert(key, value);
            Value::Object(map)
        }
    }
}

fn yaml_key(key: YamlValue) -> String {
    match key {
        YamlValue::String(s) => s,
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

fn yaml_number(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Number(i.into())
    } else if let Some(u) = n.as_u64() {
        Value::Number(u.into())
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const YAML_TEMPLATE: &str = r#"
Parameters:
  InstanceType:
    Type: String
    Default: t3.micro
  DbPassword:
    Type: String
    NoEcho: true
Resources:
  Sg:
    Type: AWS::EC2::SecurityGroup
    Properties:
      GroupDescription: !Sub "${AWS::StackName} web"
      VpcId: !ImportValue network-VpcId
  Instance:
    Type: AWS::EC2::Instance
    DependsOn: Sg
    Properties:
      InstanceType: !Ref InstanceType
      SecurityGroupIds:
        - !GetAtt Sg.GroupId
      AvailabilityZone: !Select [0, !GetAZs ""]
Outputs:
  InstanceId:
    Value: !Ref Instance
"#;

    #[test]
    fn test_yaml_short_form_tags() {
        let template = Template::parse(YAML_TEMPLATE).unwrap();
        let instance = template.resource("Instance").unwrap();

        assert_eq!(instance.property("InstanceType"), Some(&json!({"Ref": "InstanceType"})));
        assert_eq!(
            instance.property("SecurityGroupIds.0"),
            Some(&json!({"Fn::GetAtt": ["Sg", "GroupId"]}))
        );
        assert_eq!(
            instance.property("AvailabilityZone"),
            Some(&json!({"Fn::Select": [0, {"Fn::GetAZs": ""}]}))
        );
        assert_eq!(instance.depends_on, vec!["Sg".to_string()]);
    }

    #[test]
    fn test_parameters() {
        let template = Template::parse(YAML_TEMPLATE).unwrap();
        assert!(template.parameters["DbPassword"].is_no_echo());
        assert!(!template.parameters["InstanceType"].is_no_echo());
        assert_eq!(template.parameters["InstanceType"].default, Some(json!("t3.micro")));
    }

    #[test]
    fn test_json_template_with_depends_on_list() {
        let template = Template::parse(
            r#"{"Resources": {"Q": {"Type": "AWS::SQS::Queue", "DependsOn": ["A", "B"]}}}"#,
        )
        .unwrap();
        assert_eq!(template.resources["Q"].depends_on, vec!["A", "B"]);
        assert!(template.resources["Q"].properties.is_null());
    }

    #[test]
    fn test_list_parameter_types() {
        let parameter = |t: &str| TemplateParameter {
            parameter_type: t.to_string(),
            ..Default::default()
        };
        assert!(parameter("CommaDelimitedList").is_list());
        assert!(parameter("List<AWS::EC2::Subnet::Id>").is_list());
        assert!(!parameter("AWS::EC2::VPC::Id").is_list());
        assert!(parameter("AWS::SSM::Parameter::Value<String>").is_ssm_parameter());
    }

    #[test]
    fn test_malformed_template() {
        assert!(Template::parse("{\"Resources\": 3}").is_err());
    }
}
