//! Validation of flow documents.
//!
//! Three structural rules run over every node, in a fixed order, and their
//! findings are collected into a [`ValidationReport`]. The rules are not
//! exclusive: a node missing everything reports a connection error, a type
//! error and nothing else, since required-field checks only apply once an
//! operator type is chosen.

use std::collections::HashMap;

use crate::document::FlowDocument;
use crate::node::{FlowNode, NodeId};

/// Validation issue codes
pub mod issue_codes {
    pub const NOT_CONNECTED: &str = "NOT_CONNECTED";
    pub const NO_TYPE: &str = "NO_TYPE";
    pub const MISSING_FIELD: &str = "MISSING_FIELD";
}

/// One validation finding attached to a node
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// Stable machine readable code
    pub code: &'static str,

    /// Human readable message shown next to the node
    pub message: String,

    /// Node the finding belongs to
    pub node_id: NodeId,
}

impl ValidationIssue {
    fn new(code: &'static str, message: impl Into<String>, node_id: &NodeId) -> Self {
        Self {
            code,
            message: message.into(),
            node_id: node_id.clone(),
        }
    }
}

/// All findings of one validation pass, in rule order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Whether the document passed validation
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// All findings, in rule order
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Whether a node has any findings
    pub fn has_errors_for(&self, node_id: &NodeId) -> bool {
        self.issues.iter().any(|issue| &issue.node_id == node_id)
    }

    /// Messages for one node, in rule order
    pub fn messages_for(&self, node_id: &NodeId) -> Vec<&str> {
        self.issues
            .iter()
            .filter(|issue| &issue.node_id == node_id)
            .map(|issue| issue.message.as_str())
            .collect()
    }

    /// Findings grouped per node, preserving rule order within each group
    pub fn by_node(&self) -> HashMap<NodeId, Vec<&ValidationIssue>> {
        let mut grouped: HashMap<NodeId, Vec<&ValidationIssue>> = HashMap::new();
        for issue in &self.issues {
            grouped.entry(issue.node_id.clone()).or_default().push(issue);
        }
        grouped
    }
}

/// A single validation rule applied to one node
trait NodeRule {
    fn check(&self, document: &FlowDocument, node: &FlowNode, issues: &mut Vec<ValidationIssue>);
}

/// Rule 1: every node takes part in at least one connection, in either
/// direction.
struct ConnectedRule;

impl NodeRule for ConnectedRule {
    fn check(&self, document: &FlowDocument, node: &FlowNode, issues: &mut Vec<ValidationIssue>) {
        if document.degree(&node.id) == 0 {
            issues.push(ValidationIssue::new(
                issue_codes::NOT_CONNECTED,
                "Need at least one stream connection",
                &node.id,
            ));
        }
    }
}

/// Rule 2: every node has an operator type
struct TypedRule;

impl NodeRule for TypedRule {
    fn check(&self, _document: &FlowDocument, node: &FlowNode, issues: &mut Vec<ValidationIssue>) {
        if node.is_untyped() {
            issues.push(ValidationIssue::new(
                issue_codes::NO_TYPE,
                "Type is not selected",
                &node.id,
            ));
        }
    }
}

/// Rule 3: every field the operator declares required holds a value.
/// Only meaningful once a type is chosen; absent, null and empty string
/// all count as missing.
struct RequiredFieldsRule;

impl NodeRule for RequiredFieldsRule {
    fn check(&self, document: &FlowDocument, node: &FlowNode, issues: &mut Vec<ValidationIssue>) {
        let Some(kind) = node.kind else {
            return;
        };
        for field in kind.spec().required_fields() {
            let filled = document
                .form(&node.id)
                .map(|form| form.has_value(field.name))
                .unwrap_or(false);
            if !filled {
                issues.push(ValidationIssue::new(
                    issue_codes::MISSING_FIELD,
                    format!("Missing required field: {}", field.name),
                    &node.id,
                ));
            }
        }
    }
}

/// Validate a whole document. Findings come out in rule order, and within
/// one rule in node order, so per-node message lists are stable.
pub fn validate_document(document: &FlowDocument) -> ValidationReport {
    let rules: [&dyn NodeRule; 3] = [&ConnectedRule, &TypedRule, &RequiredFieldsRule];
    let mut issues = Vec::new();
    for rule in rules {
        for node in document.nodes() {
            rule.check(document, node, &mut issues);
        }
    }
    ValidationReport { issues }
}
