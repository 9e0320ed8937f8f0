//! Per-node form data.
//!
//! Each node owns one form-data entry holding the configuration values the
//! user entered for its operator, plus the synthesized task id and the
//! dependency list stamped at persist time.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Structured configuration values for one node
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeFormData {
    /// Task identifier used by the pipeline service. Stamped from a user
    /// rename when one happened; otherwise the loaded value is kept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,

    /// Upstream node ids, recomputed from the edge list at persist time.
    /// Never hand-edited.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    /// Field values keyed by the operator's field names
    #[serde(flatten)]
    pub fields: HashMap<String, Value>,
}

impl NodeFormData {
    /// Upsert one field value, leaving every other field untouched.
    ///
    /// Returns whether the entry actually changed; writing the value a
    /// field already holds is a no-op.
    pub fn set_field(&mut self, name: &str, value: Value) -> bool {
        if self.fields.get(name) == Some(&value) {
            return false;
        }
        self.fields.insert(name.to_string(), value);
        true
    }

    /// Current value of a field, if present
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Whether a field holds a usable value: present, non-null, and not an
    /// empty string.
    pub fn has_value(&self, name: &str) -> bool {
        match self.fields.get(name) {
            None | Some(Value::Null) => false,
            Some(Value::String(text)) => !text.is_empty(),
            Some(_) => true,
        }
    }
}
