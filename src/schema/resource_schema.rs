use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::attribute_path::{AttributePath, is_index};
use super::value_schema::{Elem, ValueSchema};
use crate::error::{MigrationError, MigrationResult};

/// Schema of a Terraform resource, or of a nested block element
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceSchema {
    pub schema: BTreeMap<String, ValueSchema>,
}

/// Position reached while walking a path through the schema tree
enum Cursor<'a> {
    Resource(&'a ResourceSchema),
    Value(&'a ValueSchema),
}

impl ResourceSchema {
    pub fn attribute(&self, name: &str) -> Option<&ValueSchema> {
        self.schema.get(name)
    }

    /// Look up the schema of the attribute addressed by `path`
    ///
    /// Index segments (`*`, `#` or a number) must directly follow a list or
    /// set attribute, and a list or set attribute must be followed by one.
    pub fn attribute_by_path(&self, path: &str) -> MigrationResult<&ValueSchema> {
        if path.is_empty() {
            return Err(MigrationError::InvalidPath {
                path: path.to_string(),
                message: "Path is empty.".to_string(),
            });
        }

        if path.starts_with('*') || path.ends_with('*') {
            return Err(MigrationError::InvalidPath {
                path: path.to_string(),
                message: "Path cannot start or end with '*'.".to_string(),
            });
        }

        let mut cursor = Cursor::Resource(self);
        let mut walked = AttributePath::default();

        for segment in AttributePath::split(path) {
            cursor = match cursor {
                Cursor::Resource(resource) => {
                    if is_index(&segment) {
                        return Err(MigrationError::InvalidPath {
                            path: path.to_string(),
                            message: format!(
                                "Attribute at \"{}\" is not a set or a list.",
                                walked
                            ),
                        });
                    }

                    let attribute = resource.attribute(&segment).ok_or_else(|| {
                        MigrationError::AttributeNotFound {
                            path: path.to_string(),
                            message: format!(
                                "Resource does not contain an attribute \"{}\".",
                                segment
                            ),
                        }
                    })?;

                    walked = walked.child(&segment);
                    Cursor::Value(attribute)
                }
                Cursor::Value(value) if value.is_list_or_set() => {
                    if !is_index(&segment) {
                        return Err(MigrationError::InvalidPath {
                            path: path.to_string(),
                            message: format!(
                                "Attribute at \"{}\" is a set or a list. '*' was expected next in path.",
                                walked
                            ),
                        });
                    }

                    walked = walked.index();
                    match &value.elem {
                        Some(Elem::Resource(resource)) => Cursor::Resource(resource),
                        Some(Elem::Value(element)) => Cursor::Value(element),
                        None => {
                            return Err(MigrationError::AttributeNotFound {
                                path: path.to_string(),
                                message: format!(
                                    "Attribute at \"{}\" has no element schema.",
                                    walked
                                ),
                            });
                        }
                    }
                }
                Cursor::Value(value) => {
                    if is_index(&segment) {
                        return Err(MigrationError::InvalidPath {
                            path: path.to_string(),
                            message: format!(
                                "Attribute at \"{}\" is not a set or a list.",
                                walked
                            ),
                        });
                    }

                    walked = walked.child(&segment);
                    match &value.elem {
                        // Map keys are free-form; every key shares the element schema.
                        Some(Elem::Value(element)) if value.is_map() => Cursor::Value(element),
                        Some(Elem::Resource(resource)) => {
                            let attribute = resource.attribute(&segment).ok_or_else(|| {
                                MigrationError::AttributeNotFound {
                                    path: path.to_string(),
                                    message: format!(
                                        "Resource does not contain an attribute \"{}\".",
                                        segment
                                    ),
                                }
                            })?;
                            Cursor::Value(attribute)
                        }
                        _ => {
                            return Err(MigrationError::AttributeNotFound {
                                path: path.to_string(),
                                message: format!("Resource schema expected at \"{}\".", walked),
                            });
                        }
                    }
                }
            };
        }

        match cursor {
            Cursor::Value(value) => Ok(value),
            Cursor::Resource(_) => Err(MigrationError::InvalidPath {
                path: path.to_string(),
                message: "Path addresses a block element, not an attribute.".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> ResourceSchema {
        serde_json::from_str(
            r#"{
                "Schema": {
                    "a": {
                        "Type": "TypeList",
                        "Optional": true,
                        "Elem": {"Schema": {"b": {"Type": "TypeString", "Optional": true}}}
                    },
                    "ids": {"Type": "TypeSet", "Optional": true, "Elem": {"Type": "TypeString"}},
                    "tags": {"Type": "TypeMap", "Optional": true, "Elem": {"Type": "TypeString"}},
                    "name": {"Type": "TypeString", "Required": true}
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_wildcard_after_list() {
        let schema = schema();
        let attribute = schema.attribute_by_path("a.*.b").unwrap();
        assert!(attribute.optional);
    }

    #[test]
    fn test_numeric_index_after_list() {
        let schema = schema();
        assert!(schema.attribute_by_path("a.0.b").is_ok());
        assert!(schema.attribute_by_path("ids.3").is_ok());
    }

    #[test]
    fn test_name_after_list_is_ordering_error() {
        let err = schema().attribute_by_path("a.b").unwrap_err();
        match err {
            MigrationError::InvalidPath { path, message } => {
                assert_eq!(path, "a.b");
                assert!(message.contains("\"a\" is a set or a list"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_index_after_scalar_is_ordering_error() {
        let err = schema().attribute_by_path("name.0").unwrap_err();
        assert!(matches!(err, MigrationError::InvalidPath { .. }));
    }

    #[test]
    fn test_missing_attribute_carries_full_path() {
        let err = schema().attribute_by_path("a.0.missing").unwrap_err();
        match err {
            MigrationError::AttributeNotFound { path, message } => {
                assert_eq!(path, "a.0.missing");
                assert!(message.contains("missing"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_map_keys_resolve_to_element() {
        let schema = schema();
        assert!(schema.attribute_by_path("tags['a.b.c']").is_ok());
        assert!(schema.attribute_by_path("tags.Name").is_ok());
    }

    #[test]
    fn test_rejects_empty_and_wildcard_edges() {
        let schema = schema();
        assert!(schema.attribute_by_path("").is_err());
        assert!(schema.attribute_by_path("*.a").is_err());
        assert!(schema.attribute_by_path("a.*").is_err());
    }

    #[test]
    fn test_path_ending_at_block_element_is_rejected() {
        assert!(schema().attribute_by_path("a.0").is_err());
    }
}
