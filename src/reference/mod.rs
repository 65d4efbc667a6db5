//! Symbolic Terraform expressions
//!
//! A [`Reference`] stands in for a literal captured from the live stack when
//! the template showed the value came from another resource, a parameter or
//! a built-in function. Its [`Reference::expression`] is written unquoted
//! into the generated configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::hcl::syntax::{is_identifier, quote};

/// A Terraform expression derived from a CloudFormation intrinsic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reference {
    /// `<address>.id`
    Direct { address: String },

    /// `<address>.<attribute>`
    Indirect { address: String, attribute: String },

    /// `var.<name>`, optionally subscripted
    InputVariable {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },

    /// `data.<type>.<name>.<attribute>`, optionally subscripted
    DataSource {
        data_type: String,
        name: String,
        attribute: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
        /// Arguments of the `data` block declaring this source
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        arguments: BTreeMap<String, String>,
    },

    /// `local.mappings.<map>.<top>.<second>`
    Map {
        map_name: String,
        top_key: MapKey,
        second_key: MapKey,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },

    /// `<name>(<args>)`, optionally subscripted
    Function {
        name: String,
        arguments: Vec<FunctionArgument>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },

    /// `module.<name>.<output>`
    Module { module: String, output: String },
}

/// Key of a `local.mappings` lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MapKey {
    Literal(String),
    Expression(Box<Reference>),
}

/// Argument of a function call expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FunctionArgument {
    String(String),
    Number(serde_json::Number),
    Bool(bool),
    Reference(Box<Reference>),
    List(Vec<FunctionArgument>),
}

/// A `data` block required by one or more references
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DataSourceDeclaration {
    pub data_type: String,
    pub name: String,
    pub arguments: BTreeMap<String, String>,
}

impl Reference {
    pub fn direct(address: impl Into<String>) -> Self {
        Reference::Direct {
            address: address.into(),
        }
    }

    pub fn indirect(address: impl Into<String>, attribute: impl Into<String>) -> Self {
        Reference::Indirect {
            address: address.into(),
            attribute: attribute.into(),
        }
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Reference::InputVariable {
            name: name.into(),
            index: None,
        }
    }

    pub fn data_source(
        data_type: impl Into<String>,
        name: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        Reference::DataSource {
            data_type: data_type.into(),
            name: name.into(),
            attribute: attribute.into(),
            index: None,
            arguments: BTreeMap::new(),
        }
    }

    pub fn function(name: impl Into<String>, arguments: Vec<FunctionArgument>) -> Self {
        Reference::Function {
            name: name.into(),
            arguments,
            index: None,
        }
    }

    /// Attach a declaration argument to a data source reference
    pub fn with_argument(mut self, key: &str, value: &str) -> Self {
        if let Reference::DataSource { arguments, .. } = &mut self {
            arguments.insert(key.to_string(), value.to_string());
        }
        self
    }

    /// Subscript the expression, if this kind of reference can be indexed
    pub fn with_index(self, i: usize) -> Option<Self> {
        match self {
            Reference::InputVariable { name, .. } => Some(Reference::InputVariable {
                name,
                index: Some(i),
            }),
            Reference::DataSource {
                data_type,
                name,
                attribute,
                arguments,
                ..
            } => Some(Reference::DataSource {
                data_type,
                name,
                attribute,
                index: Some(i),
                arguments,
            }),
            Reference::Map {
                map_name,
                top_key,
                second_key,
                ..
            } => Some(Reference::Map {
                map_name,
                top_key,
                second_key,
                index: Some(i),
            }),
            Reference::Function {
                name, arguments, ..
            } => Some(Reference::Function {
                name,
                arguments,
                index: Some(i),
            }),
            Reference::Direct { .. } | Reference::Indirect { .. } | Reference::Module { .. } => {
                None
            }
        }
    }

    /// The Terraform expression text
    pub fn expression(&self) -> String {
        match self {
            Reference::Direct { address } => format!("{}.id", address),
            Reference::Indirect { address, attribute } => format!("{}.{}", address, attribute),
            Reference::InputVariable { name, index } => {
                format!("var.{}{}", name, subscript(*index))
            }
            Reference::DataSource {
                data_type,
                name,
                attribute,
                index,
                ..
            } => format!(
                "data.{}.{}.{}{}",
                data_type,
                name,
                attribute,
                subscript(*index)
            ),
            Reference::Map {
                map_name,
                top_key,
                second_key,
                index,
            } => format!(
                "local.mappings{}{}{}{}",
                MapKey::Literal(map_name.clone()).traversal(),
                top_key.traversal(),
                second_key.traversal(),
                subscript(*index)
            ),
            Reference::Function {
                name,
                arguments,
                index,
            } => format!(
                "{}({}){}",
                name,
                arguments
                    .iter()
                    .map(FunctionArgument::render)
                    .collect::<Vec<_>>()
                    .join(", "),
                subscript(*index)
            ),
            Reference::Module { module, output } => format!("module.{}.{}", module, output),
        }
    }

    /// Data blocks this expression depends on, including nested references
    pub fn data_sources(&self) -> Vec<DataSourceDeclaration> {
        let mut found = Vec::new();
        self.visit(&mut |reference| {
            if let Reference::DataSource {
                data_type,
                name,
                arguments,
                ..
            } = reference
            {
                found.push(DataSourceDeclaration {
                    data_type: data_type.clone(),
                    name: name.clone(),
                    arguments: arguments.clone(),
                });
            }
        });
        found
    }

    /// Whether the expression reads `local.mappings`
    pub fn uses_mappings(&self) -> bool {
        let mut uses = false;
        self.visit(&mut |reference| {
            if matches!(reference, Reference::Map { .. }) {
                uses = true;
            }
        });
        uses
    }

    /// Names of input variables the expression reads
    pub fn input_variables(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.visit(&mut |reference| {
            if let Reference::InputVariable { name, .. } = reference {
                names.push(name.clone());
            }
        });
        names
    }

    fn visit(&self, f: &mut dyn FnMut(&Reference)) {
        f(self);

        match self {
            Reference::Map {
                top_key,
                second_key,
                ..
            } => {
                for key in [top_key, second_key] {
                    if let MapKey::Expression(inner) = key {
                        inner.visit(f);
                    }
                }
            }
            Reference::Function { arguments, .. } => {
                for argument in arguments {
                    argument.visit(f);
                }
            }
            _ => {}
        }
    }
}

impl MapKey {
    fn traversal(&self) -> String {
        match self {
            MapKey::Literal(key) if is_identifier(key) => format!(".{}", key),
            MapKey::Literal(key) => format!("[{}]", quote(key)),
            MapKey::Expression(reference) => format!("[{}]", reference.expression()),
        }
    }
}

impl FunctionArgument {
    pub fn render(&self) -> String {
        match self {
            FunctionArgument::String(s) => quote(s),
            FunctionArgument::Number(n) => n.to_string(),
            FunctionArgument::Bool(b) => b.to_string(),
            FunctionArgument::Reference(reference) => reference.expression(),
            FunctionArgument::List(items) => format!(
                "[{}]",
                items
                    .iter()
                    .map(FunctionArgument::render)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    fn visit(&self, f: &mut dyn FnMut(&Reference)) {
        match self {
            FunctionArgument::Reference(reference) => reference.visit(f),
            FunctionArgument::List(items) => {
                for item in items {
                    item.visit(f);
                }
            }
            _ => {}
        }
    }
}

fn subscript(index: Option<usize>) -> String {
    index.map(|i| format!("[{}]", i)).unwrap_or_default()
}
