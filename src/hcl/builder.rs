use std::collections::BTreeMap;

use serde_json::Value;

use super::event::{HclEvent, MAP_ELEMENT_SCHEMA};
use crate::schema::{AttributePath, ResourceSchema, ValueSchema};
use crate::state::StateValue;

/// Walk one resource's state attributes against its schema
///
/// Returns the event stream and a diagnostic for every attribute the schema
/// does not know, which is left out of the stream.
pub fn build_events<'s>(
    resource_type: &str,
    name: &str,
    attributes: &BTreeMap<String, StateValue>,
    schema: &'s ResourceSchema,
) -> (Vec<HclEvent<'s>>, Vec<String>) {
    let mut builder = Builder {
        resource_type,
        events: Vec::new(),
        diagnostics: Vec::new(),
    };

    builder.events.push(HclEvent::ResourceStart {
        resource_type: resource_type.to_string(),
        name: name.to_string(),
    });
    builder.attributes(attributes, schema, &AttributePath::default());
    builder.events.push(HclEvent::ResourceEnd);

    (builder.events, builder.diagnostics)
}

struct Builder<'a, 's> {
    resource_type: &'a str,
    events: Vec<HclEvent<'s>>,
    diagnostics: Vec<String>,
}

impl<'s> Builder<'_, 's> {
    fn attributes(
        &mut self,
        attributes: &BTreeMap<String, StateValue>,
        schema: &'s ResourceSchema,
        parent: &AttributePath,
    ) {
        for (name, value) in attributes {
            let path = parent.child(name);

            let Some(attribute) = schema.attribute(name) else {
                self.diagnostics.push(format!(
                    "{}: attribute \"{}\" is not in the schema and was skipped",
                    self.resource_type, path
                ));
                continue;
            };

            self.events.push(HclEvent::key(name, path.clone(), attribute));
            self.value(value, attribute, &path);
        }
    }

    fn value(&mut self, value: &StateValue, schema: &'s ValueSchema, path: &AttributePath) {
        match value {
            StateValue::List(items) => {
                self.events.push(HclEvent::SequenceStart);
                let element_path = path.index();

                for item in items {
                    match (schema.nested_resource(), item) {
                        (Some(resource), StateValue::Map(map)) => {
                            self.events.push(HclEvent::MappingStart);
                            self.attributes(map, resource, &element_path);
                            self.events.push(HclEvent::MappingEnd);
                        }
                        _ => {
                            let element = schema.element_value().unwrap_or(schema);
                            self.value(item, element, &element_path);
                        }
                    }
                }

                self.events.push(HclEvent::SequenceEnd);
            }
            StateValue::Map(map) => {
                self.events.push(HclEvent::MappingStart);

                if let Some(resource) = schema.nested_resource() {
                    self.attributes(map, resource, path);
                } else {
                    let element = schema.element_value().unwrap_or(&*MAP_ELEMENT_SCHEMA);
                    for (key, item) in map {
                        let key_path = path.child(key);
                        self.events.push(HclEvent::key(key, key_path.clone(), element));
                        self.value(item, element, &key_path);
                    }
                }

                self.events.push(HclEvent::MappingEnd);
            }
            StateValue::String(text) => match embedded_document(text) {
                Some(document) => {
                    self.events.push(HclEvent::JsonStart);
                    self.json(&document, path);
                    self.events.push(HclEvent::JsonEnd);
                }
                None => self.events.push(HclEvent::ScalarValue(value.clone())),
            },
            _ => self.events.push(HclEvent::ScalarValue(value.clone())),
        }
    }

    fn json(&mut self, value: &Value, path: &AttributePath) {
        match value {
            Value::Object(map) => {
                self.events.push(HclEvent::MappingStart);
                for (key, item) in map {
                    let key_path = path.child(key);
                    self.events.push(HclEvent::embedded_key(key, key_path.clone()));
                    self.json(item, &key_path);
                }
                self.events.push(HclEvent::MappingEnd);
            }
            Value::Array(items) => {
                self.events.push(HclEvent::SequenceStart);
                for item in items {
                    self.json(item, &path.index());
                }
                self.events.push(HclEvent::SequenceEnd);
            }
            Value::Null => self.events.push(HclEvent::ScalarValue(StateValue::Null)),
            Value::Bool(b) => self.events.push(HclEvent::ScalarValue(StateValue::Bool(*b))),
            Value::Number(n) => self
                .events
                .push(HclEvent::ScalarValue(StateValue::Number(n.clone()))),
            Value::String(s) => self
                .events
                .push(HclEvent::ScalarValue(StateValue::String(s.clone()))),
        }
    }
}

/// A JSON object or array held in a string attribute, e.g. an IAM policy
fn embedded_document(text: &str) -> Option<Value> {
    let trimmed = text.trim_start();
    if !trimmed.starts_with('{') && !trimmed.starts_with('[') {
        return None;
    }

    match serde_json::from_str::<Value>(text) {
        Ok(document) if document.is_object() || document.is_array() => Some(document),
        _ => None,
    }
}
