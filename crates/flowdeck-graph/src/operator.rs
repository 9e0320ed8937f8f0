//! The operator catalog.
//!
//! Every operator kind a node can take is declared here as a closed enum
//! together with its static field set. Required-field checks and form
//! blueprints are derived from these declarations instead of being
//! interpreted from runtime schemas.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Display};

use crate::form::NodeFormData;

/// Palette module an operator belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    /// Operators that read data into the pipeline
    Source,

    /// Operators that reshape or combine streams
    Transform,

    /// Operators that write data out of the pipeline
    Sink,

    /// Operators that run user code or scripts
    Utility,
}

impl ModuleKind {
    /// Display name shown in the palette
    pub fn label(&self) -> &'static str {
        match self {
            ModuleKind::Source => "Sources",
            ModuleKind::Transform => "Transforms",
            ModuleKind::Sink => "Sinks",
            ModuleKind::Utility => "Utilities",
        }
    }

    /// Accent color used for nodes dropped from this module
    pub fn color(&self) -> &'static str {
        match self {
            ModuleKind::Source => "#2f9e44",
            ModuleKind::Transform => "#1971c2",
            ModuleKind::Sink => "#e8590c",
            ModuleKind::Utility => "#862e9c",
        }
    }

    /// All modules in palette order
    pub fn all() -> &'static [ModuleKind] {
        &[
            ModuleKind::Source,
            ModuleKind::Transform,
            ModuleKind::Sink,
            ModuleKind::Utility,
        ]
    }
}

impl Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Input control rendered for a form field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Single line text input
    Text,

    /// Numeric input
    Number,

    /// Boolean switch
    Toggle,

    /// Fixed choice list
    Select(&'static [&'static str]),

    /// Multi line code editor
    Code,
}

impl FieldKind {
    /// The value a blank form starts out with for this control
    pub fn default_value(&self) -> Value {
        match self {
            FieldKind::Text | FieldKind::Code => Value::String(String::new()),
            FieldKind::Number => Value::Null,
            FieldKind::Toggle => Value::Bool(false),
            FieldKind::Select(_) => Value::String(String::new()),
        }
    }
}

/// Static declaration of one configurable field of an operator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    /// Field key used in form data and on the wire
    pub name: &'static str,

    /// Display label for the form
    pub label: &'static str,

    /// Input control to render
    pub kind: FieldKind,

    /// Whether the field must be filled before the node validates
    pub required: bool,

    /// Hint shown in an empty control
    pub placeholder: Option<&'static str>,
}

/// Static declaration of one operator kind
#[derive(Debug, PartialEq)]
pub struct OperatorSpec {
    /// The kind this spec describes
    pub kind: OperatorKind,

    /// Wire tag, identical to the kind's serde form
    pub tag: &'static str,

    /// Display name used as the default node label
    pub label: &'static str,

    /// Palette module grouping
    pub module: ModuleKind,

    /// Icon name for the canvas renderer
    pub icon: &'static str,

    /// Configurable fields, in form order
    pub fields: &'static [FieldSpec],
}

impl OperatorSpec {
    /// All operator specs in palette order
    pub fn all() -> &'static [&'static OperatorSpec] {
        CATALOG
    }

    /// Operators of one palette module, in palette order
    pub fn for_module(module: ModuleKind) -> Vec<&'static OperatorSpec> {
        CATALOG
            .iter()
            .copied()
            .filter(|spec| spec.module == module)
            .collect()
    }

    /// The subset of fields that must be filled
    pub fn required_fields(&self) -> impl Iterator<Item = &'static FieldSpec> {
        self.fields.iter().filter(|field| field.required)
    }

    /// Look up a field declaration by its key
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Operator kind of a node
///
/// The serde form of each variant is its wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatorKind {
    /// Read rows from a connection
    Reader,

    /// Write rows to a connection
    Writer,

    /// Run a SQL statement over the incoming streams
    Sql,

    /// Keep rows matching a condition
    Filter,

    /// Keep a bounded sample of the incoming stream
    Sample,

    /// Join two incoming streams on a condition
    Join,

    /// Concatenate incoming streams
    Union,

    /// Run a user supplied script
    Script,
}

impl OperatorKind {
    /// Static declaration for this kind
    pub fn spec(&self) -> &'static OperatorSpec {
        match self {
            OperatorKind::Reader => &READER,
            OperatorKind::Writer => &WRITER,
            OperatorKind::Sql => &SQL,
            OperatorKind::Filter => &FILTER,
            OperatorKind::Sample => &SAMPLE,
            OperatorKind::Join => &JOIN,
            OperatorKind::Union => &UNION,
            OperatorKind::Script => &SCRIPT,
        }
    }

    /// Wire tag of this kind
    pub fn tag(&self) -> &'static str {
        self.spec().tag
    }

    /// Resolve a wire tag back to a kind
    pub fn from_tag(tag: &str) -> Option<Self> {
        CATALOG
            .iter()
            .find(|spec| spec.tag == tag)
            .map(|spec| spec.kind)
    }

    /// Build a blank form for this kind, with every declared field
    /// present at its default value.
    pub fn blueprint(&self) -> NodeFormData {
        let mut form = NodeFormData::default();
        for field in self.spec().fields {
            form.fields
                .insert(field.name.to_string(), field.kind.default_value());
        }
        form
    }
}

impl Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

static READER: OperatorSpec = OperatorSpec {
    kind: OperatorKind::Reader,
    tag: "reader",
    label: "Reader",
    module: ModuleKind::Source,
    icon: "database-import",
    fields: &[
        FieldSpec {
            name: "connection",
            label: "Connection",
            kind: FieldKind::Text,
            required: true,
            placeholder: Some("warehouse-prod"),
        },
        FieldSpec {
            name: "table",
            label: "Table",
            kind: FieldKind::Text,
            required: true,
            placeholder: Some("schema.table"),
        },
        FieldSpec {
            name: "incremental",
            label: "Incremental load",
            kind: FieldKind::Toggle,
            required: false,
            placeholder: None,
        },
    ],
};

static WRITER: OperatorSpec = OperatorSpec {
    kind: OperatorKind::Writer,
    tag: "writer",
    label: "Writer",
    module: ModuleKind::Sink,
    icon: "database-export",
    fields: &[
        FieldSpec {
            name: "connection",
            label: "Connection",
            kind: FieldKind::Text,
            required: true,
            placeholder: Some("warehouse-prod"),
        },
        FieldSpec {
            name: "table",
            label: "Table",
            kind: FieldKind::Text,
            required: true,
            placeholder: Some("schema.table"),
        },
        FieldSpec {
            name: "writeMode",
            label: "Write mode",
            kind: FieldKind::Select(&["append", "overwrite", "upsert"]),
            required: false,
            placeholder: None,
        },
    ],
};

static SQL: OperatorSpec = OperatorSpec {
    kind: OperatorKind::Sql,
    tag: "sql",
    label: "SQL",
    module: ModuleKind::Transform,
    icon: "code-dots",
    fields: &[FieldSpec {
        name: "statement",
        label: "Statement",
        kind: FieldKind::Code,
        required: true,
        placeholder: Some("select * from input"),
    }],
};

static FILTER: OperatorSpec = OperatorSpec {
    kind: OperatorKind::Filter,
    tag: "filter",
    label: "Filter",
    module: ModuleKind::Transform,
    icon: "filter",
    fields: &[FieldSpec {
        name: "condition",
        label: "Condition",
        kind: FieldKind::Text,
        required: true,
        placeholder: Some("amount > 0"),
    }],
};

static SAMPLE: OperatorSpec = OperatorSpec {
    kind: OperatorKind::Sample,
    tag: "sample",
    label: "Sample",
    module: ModuleKind::Transform,
    icon: "dice",
    fields: &[
        FieldSpec {
            name: "amount",
            label: "Amount",
            kind: FieldKind::Number,
            required: true,
            placeholder: Some("1000"),
        },
        FieldSpec {
            name: "seed",
            label: "Seed",
            kind: FieldKind::Number,
            required: false,
            placeholder: None,
        },
    ],
};

static JOIN: OperatorSpec = OperatorSpec {
    kind: OperatorKind::Join,
    tag: "join",
    label: "Join",
    module: ModuleKind::Transform,
    icon: "arrows-join",
    fields: &[
        FieldSpec {
            name: "condition",
            label: "Join condition",
            kind: FieldKind::Text,
            required: true,
            placeholder: Some("left.id = right.id"),
        },
        FieldSpec {
            name: "strategy",
            label: "Strategy",
            kind: FieldKind::Select(&["inner", "left", "right", "full"]),
            required: false,
            placeholder: None,
        },
    ],
};

static UNION: OperatorSpec = OperatorSpec {
    kind: OperatorKind::Union,
    tag: "union",
    label: "Union",
    module: ModuleKind::Transform,
    icon: "stack",
    fields: &[],
};

static SCRIPT: OperatorSpec = OperatorSpec {
    kind: OperatorKind::Script,
    tag: "script",
    label: "Script",
    module: ModuleKind::Utility,
    icon: "terminal",
    fields: &[
        FieldSpec {
            name: "language",
            label: "Language",
            kind: FieldKind::Select(&["python", "shell"]),
            required: true,
            placeholder: None,
        },
        FieldSpec {
            name: "body",
            label: "Script body",
            kind: FieldKind::Code,
            required: true,
            placeholder: None,
        },
    ],
};

static CATALOG: &[&OperatorSpec] = &[
    &READER, &WRITER, &SQL, &FILTER, &SAMPLE, &JOIN, &UNION, &SCRIPT,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_is_in_the_catalog() {
        for spec in OperatorSpec::all() {
            assert_eq!(spec.kind.spec(), *spec);
            assert_eq!(OperatorKind::from_tag(spec.tag), Some(spec.kind));
        }
    }

    #[test]
    fn test_serde_form_matches_the_tag() {
        for spec in OperatorSpec::all() {
            let wire = serde_json::to_value(spec.kind).unwrap();
            assert_eq!(wire, Value::String(spec.tag.to_string()));
        }
    }

    #[test]
    fn test_unknown_tag_resolves_to_none() {
        assert_eq!(OperatorKind::from_tag("teleport"), None);
    }

    #[test]
    fn test_sample_requires_amount() {
        let required: Vec<&str> = OperatorKind::Sample
            .spec()
            .required_fields()
            .map(|field| field.name)
            .collect();
        assert_eq!(required, vec!["amount"]);
    }

    #[test]
    fn test_blueprint_seeds_every_declared_field() {
        let form = OperatorKind::Writer.blueprint();

        assert_eq!(form.fields.len(), OperatorKind::Writer.spec().fields.len());
        assert_eq!(form.fields["connection"], Value::String(String::new()));
        assert_eq!(form.fields["writeMode"], Value::String(String::new()));
        assert!(form.task_id.is_none());
        assert!(form.depends_on.is_empty());
    }

    #[test]
    fn test_union_has_no_required_fields() {
        assert_eq!(OperatorKind::Union.spec().required_fields().count(), 0);
        assert!(OperatorKind::Union.blueprint().fields.is_empty());
    }

    #[test]
    fn test_for_module_groups_the_palette() {
        let transforms = OperatorSpec::for_module(ModuleKind::Transform);
        let tags: Vec<&str> = transforms.iter().map(|spec| spec.tag).collect();
        assert_eq!(tags, vec!["sql", "filter", "sample", "join", "union"]);

        let sources = OperatorSpec::for_module(ModuleKind::Source);
        assert_eq!(sources.len(), 1);
    }

    #[test]
    fn test_field_lookup() {
        let spec = OperatorKind::Sample.spec();
        assert!(spec.field("amount").is_some());
        assert!(spec.field("banana").is_none());
    }
}
