use serde::{Deserialize, Serialize};

use super::resource_schema::ResourceSchema;

/// Value type of a schema attribute, named as in the Terraform plugin SDK dump
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum ValueType {
    #[default]
    #[serde(rename = "TypeInvalid")]
    Invalid,
    #[serde(rename = "TypeBool")]
    Bool,
    #[serde(rename = "TypeInt")]
    Int,
    #[serde(rename = "TypeFloat")]
    Float,
    #[serde(rename = "TypeString")]
    String,
    #[serde(rename = "TypeList")]
    List,
    #[serde(rename = "TypeMap")]
    Map,
    #[serde(rename = "TypeSet")]
    Set,
    #[serde(rename = "TypeObject")]
    Object,
}

/// How a nested value is written in configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum ConfigMode {
    #[default]
    #[serde(rename = "SchemaConfigModeAuto")]
    Auto,
    #[serde(rename = "SchemaConfigModeAttr")]
    Attr,
    #[serde(rename = "SchemaConfigModeBlock")]
    Block,
}

/// Element schema of a collection attribute
///
/// A dump entry carrying a `Schema` key describes a nested resource (a block
/// when the config mode allows it); anything else is the schema of a scalar
/// element.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Elem {
    Resource(ResourceSchema),
    Value(Box<ValueSchema>),
}

/// Schema of a single attribute
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ValueSchema {
    #[serde(rename = "Type")]
    pub value_type: ValueType,
    pub optional: bool,
    pub required: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub default: Option<serde_json::Value>,
    pub config_mode: ConfigMode,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts_with: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exactly_one_of: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub at_least_one_of: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required_with: Vec<String>,
    pub min_items: u32,
    pub max_items: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elem: Option<Elem>,
}

impl ValueSchema {
    /// Schema used for keys inside an embedded JSON document
    pub fn json_document() -> Self {
        Self {
            value_type: ValueType::String,
            optional: true,
            ..Self::default()
        }
    }

    /// Schema for an opaque optional attribute of the given type
    pub fn optional(value_type: ValueType) -> Self {
        Self {
            value_type,
            optional: true,
            ..Self::default()
        }
    }

    /// Whether the attribute is written as a nested `name { ... }` block
    pub fn is_block(&self) -> bool {
        // Computed-only values can never appear in configuration, so they are
        // never blocks whatever the declared mode.
        if self.computed && !self.optional {
            return false;
        }

        match self.config_mode {
            ConfigMode::Auto => matches!(self.elem, Some(Elem::Resource(_))),
            ConfigMode::Block => true,
            ConfigMode::Attr => false,
        }
    }

    pub fn is_list_or_set(&self) -> bool {
        matches!(self.value_type, ValueType::List | ValueType::Set)
    }

    pub fn is_map(&self) -> bool {
        self.value_type == ValueType::Map
    }

    /// Read-only output of the provider, never settable in configuration
    pub fn is_computed_only(&self) -> bool {
        self.computed && !(self.optional || self.required)
    }

    /// Nested resource schema of a block or object list, if any
    pub fn nested_resource(&self) -> Option<&ResourceSchema> {
        match &self.elem {
            Some(Elem::Resource(resource)) => Some(resource),
            _ => None,
        }
    }

    /// Scalar element schema of a primitive list, set or map, if any
    pub fn element_value(&self) -> Option<&ValueSchema> {
        match &self.elem {
            Some(Elem::Value(value)) => Some(value),
            _ => None,
        }
    }

    /// Whether the schema declares an explicit default
    pub fn has_default(&self) -> bool {
        matches!(&self.default, Some(value) if !value.is_null())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ValueSchema {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_nested_schema_elem_is_resource() {
        let schema = parse(
            r#"{"Type": "TypeList", "Optional": true, "Elem": {"Schema": {"a": {"Type": "TypeString", "Optional": true}}}}"#,
        );
        assert!(schema.nested_resource().is_some());
        assert!(schema.is_block());
    }

    #[test]
    fn test_scalar_elem_is_value() {
        let schema = parse(r#"{"Type": "TypeSet", "Optional": true, "Elem": {"Type": "TypeString"}}"#);
        assert_eq!(
            schema.element_value().map(|e| e.value_type),
            Some(ValueType::String)
        );
        assert!(!schema.is_block());
        assert!(schema.is_list_or_set());
    }

    #[test]
    fn test_computed_only_is_never_block() {
        let schema = parse(
            r#"{"Type": "TypeList", "Computed": true, "ConfigMode": "SchemaConfigModeBlock", "Elem": {"Schema": {}}}"#,
        );
        assert!(!schema.is_block());
        assert!(schema.is_computed_only());
    }

    #[test]
    fn test_attr_mode_overrides_resource_elem() {
        let schema = parse(
            r#"{"Type": "TypeSet", "Optional": true, "Computed": true, "ConfigMode": "SchemaConfigModeAttr", "Elem": {"Schema": {}}}"#,
        );
        assert!(!schema.is_block());
        assert!(!schema.is_computed_only());
    }

    #[test]
    fn test_null_default_is_not_a_default() {
        let schema = parse(r#"{"Type": "TypeBool", "Optional": true, "Default": null}"#);
        assert!(!schema.has_default());

        let schema = parse(r#"{"Type": "TypeBool", "Optional": true, "Default": false}"#);
        assert!(schema.has_default());
    }
}
