use std::collections::BTreeMap;
use std::fmt;

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};

use crate::reference::Reference;

/// Key marking a reference embedded in an otherwise plain JSON document
pub const REFERENCE_KEY: &str = "__reference__";

/// An attribute value held in Terraform state
///
/// Literals serialize as plain JSON. A [`Reference`] serializes as the
/// single-key object `{"__reference__": {...}}` so it can never be read back
/// as a string that happens to look like an expression.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum StateValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<StateValue>),
    Map(BTreeMap<String, StateValue>),
    Reference(Reference),
}

impl StateValue {
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        Ok(match value {
            Value::Null => StateValue::Null,
            Value::Bool(b) => StateValue::Bool(b),
            Value::Number(n) => StateValue::Number(n),
            Value::String(s) => StateValue::String(s),
            Value::Array(items) => StateValue::List(
                items
                    .into_iter()
                    .map(StateValue::from_json)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(mut map) => {
                if map.len() == 1 {
                    if let Some(reference) = map.remove(REFERENCE_KEY) {
                        return Ok(StateValue::Reference(serde_json::from_value(reference)?));
                    }
                }

                StateValue::Map(
                    map.into_iter()
                        .map(|(k, v)| Ok((k, StateValue::from_json(v)?)))
                        .collect::<Result<_, serde_json::Error>>()?,
                )
            }
        })
    }

    /// The literal JSON value, or `None` if a reference occurs anywhere inside
    pub fn to_literal(&self) -> Option<Value> {
        Some(match self {
            StateValue::Null => Value::Null,
            StateValue::Bool(b) => Value::Bool(*b),
            StateValue::Number(n) => Value::Number(n.clone()),
            StateValue::String(s) => Value::String(s.clone()),
            StateValue::List(items) => Value::Array(
                items
                    .iter()
                    .map(StateValue::to_literal)
                    .collect::<Option<_>>()?,
            ),
            StateValue::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| Some((k.clone(), v.to_literal()?)))
                    .collect::<Option<_>>()?,
            ),
            StateValue::Reference(_) => return None,
        })
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StateValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, StateValue>> {
        match self {
            StateValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, StateValue::Null)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, StateValue::Reference(_))
    }

    /// Scalars and references; lists and maps are containers
    pub fn is_scalar(&self) -> bool {
        !matches!(self, StateValue::List(_) | StateValue::Map(_))
    }

    /// Text form used when comparing a state value with an evaluated literal
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            StateValue::String(s) => Some(s.clone()),
            StateValue::Number(n) => Some(n.to_string()),
            StateValue::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Get a nested value by dotted attribute name (`endpoint.address`, `tags.Name`)
    pub fn get_path(&self, path: &str) -> Option<&StateValue> {
        path.split('.').try_fold(self, |current, segment| match current {
            StateValue::Map(map) => map.get(segment),
            StateValue::List(items) => items.get(segment.parse::<usize>().ok()?),
            _ => None,
        })
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        StateValue::String(value.to_string())
    }
}

impl From<Reference> for StateValue {
    fn from(reference: Reference) -> Self {
        StateValue::Reference(reference)
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateValue::Reference(reference) => write!(f, "{}", reference.expression()),
            other => match serde_json::to_string(other) {
                Ok(text) => write!(f, "{}", text),
                Err(_) => Err(fmt::Error),
            },
        }
    }
}

impl Serialize for StateValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StateValue::Null => serializer.serialize_unit(),
            StateValue::Bool(b) => serializer.serialize_bool(*b),
            StateValue::Number(n) => n.serialize(serializer),
            StateValue::String(s) => serializer.serialize_str(s),
            StateValue::List(items) => items.serialize(serializer),
            StateValue::Map(map) => map.serialize(serializer),
            StateValue::Reference(reference) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(REFERENCE_KEY, reference)?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for StateValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        StateValue::from_json(value).map_err(D::Error::custom)
    }
}
