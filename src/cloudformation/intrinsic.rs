use std::collections::BTreeMap;

use serde_json::Value;

/// A CloudFormation intrinsic function node
#[derive(Debug, Clone, PartialEq)]
pub enum Intrinsic {
    Ref(String),
    GetAtt {
        resource: String,
        attribute: String,
    },
    Sub {
        template: String,
        variables: BTreeMap<String, Value>,
    },
    Join {
        separator: String,
        items: Value,
    },
    Select {
        index: Value,
        list: Value,
    },
    Split {
        separator: String,
        source: Value,
    },
    FindInMap {
        map_name: Value,
        top_key: Value,
        second_key: Value,
    },
    GetAZs(Value),
    Base64(Value),
    ImportValue(Value),
    Cidr(Value),
    If {
        condition: String,
        when_true: Value,
        when_false: Value,
    },
    /// Any other `Fn::` function, or a known one with malformed arguments
    Other(String),
}

/// One piece of a `Fn::Sub` template string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubPart {
    Literal(String),
    Placeholder(String),
}

impl Intrinsic {
    /// Parse a template node; `None` when the node is not an intrinsic
    pub fn parse(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        if map.len() != 1 {
            return None;
        }

        let (key, args) = map.iter().next()?;
        if key != "Ref" && !key.starts_with("Fn::") {
            return None;
        }

        let name = key.as_str();
        let malformed = || Intrinsic::Other(name.to_string());

        Some(match name {
            "Ref" => match args.as_str() {
                Some(target) => Intrinsic::Ref(target.to_string()),
                None => malformed(),
            },
            "Fn::GetAtt" => match args {
                Value::Array(items) if items.len() == 2 => {
                    match (items[0].as_str(), items[1].as_str()) {
                        (Some(resource), Some(attribute)) => Intrinsic::GetAtt {
                            resource: resource.to_string(),
                            attribute: attribute.to_string(),
                        },
                        _ => malformed(),
                    }
                }
                Value::String(s) => match s.split_once('.') {
                    Some((resource, attribute)) => Intrinsic::GetAtt {
                        resource: resource.to_string(),
                        attribute: attribute.to_string(),
                    },
                    None => malformed(),
                },
                _ => malformed(),
            },
            "Fn::Sub" => match args {
                Value::String(template) => Intrinsic::Sub {
                    template: template.clone(),
                    variables: BTreeMap::new(),
                },
                Value::Array(items) if items.len() == 2 => {
                    match (items[0].as_str(), items[1].as_object()) {
                        (Some(template), Some(variables)) => Intrinsic::Sub {
                            template: template.to_string(),
                            variables: variables
                                .iter()
                                .map(|(k, v)| (k.clone(), v.clone()))
                                .collect(),
                        },
                        _ => malformed(),
                    }
                }
                _ => malformed(),
            },
            "Fn::Join" => match two_args(args) {
                Some((Value::String(separator), items)) => Intrinsic::Join {
                    separator: separator.clone(),
                    items: items.clone(),
                },
                _ => malformed(),
            },
            "Fn::Select" => match two_args(args) {
                Some((index, list)) => Intrinsic::Select {
                    index: index.clone(),
                    list: list.clone(),
                },
                None => malformed(),
            },
            "Fn::Split" => match two_args(args) {
                Some((Value::String(separator), source)) => Intrinsic::Split {
                    separator: separator.clone(),
                    source: source.clone(),
                },
                _ => malformed(),
            },
            "Fn::FindInMap" => match args.as_array() {
                Some(items) if items.len() >= 3 => Intrinsic::FindInMap {
                    map_name: items[0].clone(),
                    top_key: items[1].clone(),
                    second_key: items[2].clone(),
                },
                _ => malformed(),
            },
            "Fn::GetAZs" => Intrinsic::GetAZs(args.clone()),
            "Fn::Base64" => Intrinsic::Base64(args.clone()),
            "Fn::ImportValue" => Intrinsic::ImportValue(args.clone()),
            "Fn::Cidr" => Intrinsic::Cidr(args.clone()),
            "Fn::If" => match args.as_array() {
                Some(items) if items.len() == 3 => match items[0].as_str() {
                    Some(condition) => Intrinsic::If {
                        condition: condition.to_string(),
                        when_true: items[1].clone(),
                        when_false: items[2].clone(),
                    },
                    None => malformed(),
                },
                _ => malformed(),
            },
            _ => malformed(),
        })
    }

    /// Template name of the function, e.g. `Fn::Join`
    pub fn name(&self) -> String {
        match self {
            Intrinsic::Ref(_) => "Ref".to_string(),
            Intrinsic::GetAtt { .. } => "Fn::GetAtt".to_string(),
            Intrinsic::Sub { .. } => "Fn::Sub".to_string(),
            Intrinsic::Join { .. } => "Fn::Join".to_string(),
            Intrinsic::Select { .. } => "Fn::Select".to_string(),
            Intrinsic::Split { .. } => "Fn::Split".to_string(),
            Intrinsic::FindInMap { .. } => "Fn::FindInMap".to_string(),
            Intrinsic::GetAZs(_) => "Fn::GetAZs".to_string(),
            Intrinsic::Base64(_) => "Fn::Base64".to_string(),
            Intrinsic::ImportValue(_) => "Fn::ImportValue".to_string(),
            Intrinsic::Cidr(_) => "Fn::Cidr".to_string(),
            Intrinsic::If { .. } => "Fn::If".to_string(),
            Intrinsic::Other(name) => name.clone(),
        }
    }
}

fn two_args(args: &Value) -> Option<(&Value, &Value)> {
    match args.as_array() {
        Some(items) if items.len() == 2 => Some((&items[0], &items[1])),
        _ => None,
    }
}

/// Split a `Fn::Sub` template into literal text and `${...}` placeholders
///
/// `${!Name}` is the escaped form and produces the literal text `${Name}`.
pub fn parse_sub(template: &str) -> Vec<SubPart> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        literal.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find('}') else {
            literal.push_str(&rest[start..]);
            rest = "";
            break;
        };

        let name = &after[..end];
        if let Some(escaped) = name.strip_prefix('!') {
            literal.push_str("${");
            literal.push_str(escaped);
            literal.push('}');
        } else {
            if !literal.is_empty() {
                parts.push(SubPart::Literal(std::mem::take(&mut literal)));
            }
            parts.push(SubPart::Placeholder(name.trim().to_string()));
        }

        rest = &after[end + 1..];
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        parts.push(SubPart::Literal(literal));
    }

    parts
}

/// Intrinsic nodes in a property tree with their property paths
///
/// The walk stops at each intrinsic; nested intrinsics are part of their
/// outermost node.
pub fn find_intrinsics(properties: &Value) -> Vec<(String, &Value)> {
    fn walk<'a>(value: &'a Value, path: String, found: &mut Vec<(String, &'a Value)>) {
        if Intrinsic::parse(value).is_some() {
            found.push((path, value));
            return;
        }

        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    walk(child, join_path(&path, key), found);
                }
            }
            Value::Array(items) => {
                for (i, child) in items.iter().enumerate() {
                    walk(child, join_path(&path, &i.to_string()), found);
                }
            }
            _ => {}
        }
    }

    let mut found = Vec::new();
    walk(properties, String::new(), &mut found);
    found
}

fn join_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{}.{}", parent, child)
    }
}
