//! Statement schema for the geology DSL
//!
//! The keyword set, field names, value shapes, and enum spellings are fixed
//! for the lifetime of the process and shared read-only by every parse.

use serde::Serialize;
use std::fmt;

/// The four statement kinds of the language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    Rock,
    Deposition,
    Erosion,
    Intrusion,
}

impl StatementKind {
    pub fn keyword(self) -> &'static str {
        self.spec().keyword
    }

    pub fn spec(self) -> &'static StatementSpec {
        match self {
            StatementKind::Rock => &GRAMMAR[0],
            StatementKind::Deposition => &GRAMMAR[1],
            StatementKind::Erosion => &GRAMMAR[2],
            StatementKind::Intrusion => &GRAMMAR[3],
        }
    }

    pub fn is_event(self) -> bool {
        !matches!(self, StatementKind::Rock)
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// What a field value must look like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    /// A single quoted string
    String,
    /// A single bare identifier
    Identifier,
    /// A single time literal (`35Ma`, `"?"`, or a quoted epoch name)
    Time,
    /// One or more identifiers separated by commas
    IdentifierList,
}

impl FieldShape {
    pub fn describe(self) -> &'static str {
        match self {
            FieldShape::String => "a quoted string",
            FieldShape::Identifier => "a single identifier",
            FieldShape::Time => "a time such as 35Ma, 500ka, 2Ga, or \"?\"",
            FieldShape::IdentifierList => "a comma separated list of event ids",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub shape: FieldShape,
    pub required: bool,
}

#[derive(Debug)]
pub struct StatementSpec {
    pub kind: StatementKind,
    pub keyword: &'static str,
    pub fields: &'static [FieldSpec],
}

impl StatementSpec {
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn required(&self) -> impl Iterator<Item = &'static FieldSpec> + use<> {
        let fields: &'static [FieldSpec] = self.fields;
        fields.iter().filter(|f| f.required)
    }

    /// Comma separated list of field names, for messages
    pub fn field_names(&self) -> String {
        self.fields.iter().map(|f| f.name).collect::<Vec<_>>().join(", ")
    }
}

const fn required(name: &'static str, shape: FieldShape) -> FieldSpec {
    FieldSpec { name, shape, required: true }
}

const fn optional(name: &'static str, shape: FieldShape) -> FieldSpec {
    FieldSpec { name, shape, required: false }
}

pub const NAME: &str = "name";
pub const TYPE: &str = "type";
pub const AGE: &str = "age";
pub const ROCK: &str = "rock";
pub const TIME: &str = "time";
pub const AFTER: &str = "after";
pub const STYLE: &str = "style";

/// Statement table, indexed in `StatementKind` order
pub static GRAMMAR: [StatementSpec; 4] = [
    StatementSpec {
        kind: StatementKind::Rock,
        keyword: "ROCK",
        fields: &[
            required(NAME, FieldShape::String),
            required(TYPE, FieldShape::Identifier),
            optional(AGE, FieldShape::Time),
        ],
    },
    StatementSpec {
        kind: StatementKind::Deposition,
        keyword: "DEPOSITION",
        fields: &[
            required(ROCK, FieldShape::Identifier),
            optional(TIME, FieldShape::Time),
            optional(AFTER, FieldShape::IdentifierList),
        ],
    },
    StatementSpec {
        kind: StatementKind::Erosion,
        keyword: "EROSION",
        fields: &[
            optional(TIME, FieldShape::Time),
            optional(AFTER, FieldShape::IdentifierList),
        ],
    },
    StatementSpec {
        kind: StatementKind::Intrusion,
        keyword: "INTRUSION",
        fields: &[
            required(ROCK, FieldShape::Identifier),
            optional(STYLE, FieldShape::Identifier),
            optional(TIME, FieldShape::Time),
            optional(AFTER, FieldShape::IdentifierList),
        ],
    },
];

/// Keywords that start a statement, for "expected ..." messages
pub fn keyword_list() -> String {
    GRAMMAR.iter().map(|s| s.keyword).collect::<Vec<_>>().join(", ")
}
