//! The configuration document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A decoded configuration: template context plus the ordered component
/// declarations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Values available to template actions
    #[serde(
        rename = "Context",
        alias = "context",
        default,
        skip_serializing_if = "Value::is_null"
    )]
    pub context: Value,

    /// Declarations in their semantic order
    #[serde(rename = "Components", alias = "components", default)]
    pub components: Vec<Declaration>,
}

/// One component instance to create.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    /// Registered component name
    #[serde(rename = "Name", alias = "name", default)]
    pub name: String,

    /// Instance UUID; defaults to `name`
    #[serde(
        rename = "UUID",
        alias = "uuid",
        alias = "Uuid",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub uuid: String,

    /// Reference label to target UUID
    #[serde(
        rename = "Refs",
        alias = "refs",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub refs: BTreeMap<String, String>,

    /// Component specific options, decoded by the component itself
    #[serde(
        rename = "Options",
        alias = "options",
        default,
        skip_serializing_if = "Value::is_null"
    )]
    pub options: Value,
}

impl Declaration {
    /// Declaration of `name` with no UUID, refs or options.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = uuid.into();
        self
    }

    pub fn with_ref(mut self, label: impl Into<String>, target: impl Into<String>) -> Self {
        self.refs.insert(label.into(), target.into());
        self
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }

    /// The effective UUID: the declared one, or the name when absent.
    pub fn uuid(&self) -> &str {
        if self.uuid.is_empty() {
            &self.name
        } else {
            &self.uuid
        }
    }
}
