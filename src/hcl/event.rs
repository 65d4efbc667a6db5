use lazy_static::lazy_static;

use crate::schema::{AttributePath, ValueSchema, ValueType};
use crate::state::StateValue;

lazy_static! {
    /// Schema of every key inside an embedded JSON document
    pub static ref JSON_DOCUMENT_SCHEMA: ValueSchema = ValueSchema::json_document();

    /// Schema of map entries whose attribute declares no element type
    pub static ref MAP_ELEMENT_SCHEMA: ValueSchema = ValueSchema::optional(ValueType::String);
}

/// One step of a resource's serialized attribute tree
#[derive(Debug, Clone, PartialEq)]
pub enum HclEvent<'s> {
    ResourceStart { resource_type: String, name: String },
    ResourceEnd,
    MappingStart,
    MappingEnd,
    SequenceStart,
    SequenceEnd,
    /// Start of a JSON document held in a string attribute
    JsonStart,
    JsonEnd,
    MappingKey(MappingKey<'s>),
    ScalarValue(StateValue),
}

/// An attribute or map entry name together with its schema
#[derive(Debug, Clone)]
pub struct MappingKey<'s> {
    pub name: String,
    /// Normalised path, every index written as `0`
    pub path: AttributePath,
    pub schema: &'s ValueSchema,
    /// Key of an embedded JSON document rather than of the resource
    pub embedded: bool,
}

impl PartialEq for MappingKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.path == other.path
            && self.embedded == other.embedded
            && std::ptr::eq(self.schema, other.schema)
    }
}

impl<'s> HclEvent<'s> {
    pub fn key(name: &str, path: AttributePath, schema: &'s ValueSchema) -> Self {
        HclEvent::MappingKey(MappingKey {
            name: name.to_string(),
            path,
            schema,
            embedded: false,
        })
    }

    pub fn embedded_key(name: &str, path: AttributePath) -> Self {
        HclEvent::MappingKey(MappingKey {
            name: name.to_string(),
            path,
            schema: &*JSON_DOCUMENT_SCHEMA,
            embedded: true,
        })
    }

    pub fn is_start(&self) -> bool {
        matches!(
            self,
            HclEvent::ResourceStart { .. }
                | HclEvent::MappingStart
                | HclEvent::SequenceStart
                | HclEvent::JsonStart
        )
    }

    pub fn is_end(&self) -> bool {
        matches!(
            self,
            HclEvent::ResourceEnd | HclEvent::MappingEnd | HclEvent::SequenceEnd | HclEvent::JsonEnd
        )
    }

    /// Whether `end` closes a run opened by this event
    pub fn closed_by(&self, end: &HclEvent<'_>) -> bool {
        matches!(
            (self, end),
            (HclEvent::ResourceStart { .. }, HclEvent::ResourceEnd)
                | (HclEvent::MappingStart, HclEvent::MappingEnd)
                | (HclEvent::SequenceStart, HclEvent::SequenceEnd)
                | (HclEvent::JsonStart, HclEvent::JsonEnd)
        )
    }

    pub fn as_key(&self) -> Option<&MappingKey<'s>> {
        match self {
            HclEvent::MappingKey(key) => Some(key),
            _ => None,
        }
    }
}
