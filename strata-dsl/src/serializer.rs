//! Render a [`Document`] back to DSL text
//!
//! Statements come out one per line in declaration order, fields in schema
//! order. Parsing the output yields an equal document.

use crate::parser::ast::{Document, Event, EventKind, RockDefinition, Statement, TimeValue};
use crate::parser::grammar::{AFTER, AGE, NAME, ROCK, STYLE, TIME, TYPE};

pub fn to_dsl(document: &Document) -> String {
    let mut out = String::new();
    for statement in &document.statements {
        let fields = match &statement.value {
            Statement::Rock(rock) => rock_fields(rock),
            Statement::Event(event) => event_fields(event),
        };
        out.push_str(statement.value.kind().keyword());
        out.push(' ');
        out.push_str(&statement.value.id().value);
        if fields.is_empty() {
            out.push_str(" [ ]\n");
        } else {
            out.push_str(" [ ");
            out.push_str(&fields.join("; "));
            out.push_str(" ]\n");
        }
    }
    out
}

fn rock_fields(rock: &RockDefinition) -> Vec<String> {
    let mut fields = vec![
        field(NAME, quote(&rock.name.value)),
        field(TYPE, rock.rock_type.value.as_str()),
    ];
    if let Some(age) = &rock.age {
        fields.push(field(AGE, time(&age.value)));
    }
    fields
}

fn event_fields(event: &Event) -> Vec<String> {
    let mut fields = Vec::new();
    match &event.kind {
        EventKind::Deposition { rock } => fields.push(field(ROCK, &rock.value)),
        EventKind::Erosion => {}
        EventKind::Intrusion { rock, style } => {
            fields.push(field(ROCK, &rock.value));
            if let Some(style) = style {
                fields.push(field(STYLE, style.value.as_str()));
            }
        }
    }
    if let Some(t) = &event.time {
        fields.push(field(TIME, time(&t.value)));
    }
    if !event.after.is_empty() {
        let ids: Vec<&str> = event.after.iter().map(|a| a.value.as_str()).collect();
        fields.push(field(AFTER, ids.join(", ")));
    }
    fields
}

fn field(name: &str, value: impl AsRef<str>) -> String {
    format!("{}: {}", name, value.as_ref())
}

fn time(value: &TimeValue) -> String {
    match value {
        TimeValue::Absolute { .. } => value.to_string(),
        TimeValue::Epoch { name } => quote(name),
        TimeValue::Unknown => quote("?"),
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::builder::{build, BuildOptions};
    use crate::parser::parser::parse;

    fn document(source: &str) -> Document {
        let output = parse(source);
        assert!(output.errors.is_empty(), "{:?}", output.errors);
        let built = build(&output.tree, BuildOptions::default());
        assert!(!built.diagnostics.has_errors());
        built.document
    }

    #[test]
    fn test_canonical_layout() {
        let doc = document(
            r#"
            ROCK R1 [ age: 100Ma; type: sedimentary; name: "Sandstone" ]
            INTRUSION I1 [ after: E1, D1; style: dike; rock: R1; time: 2.5Ga ]
            EROSION E1 [ ]
            "#,
        );
        assert_eq!(
            to_dsl(&doc),
            "ROCK R1 [ name: \"Sandstone\"; type: sedimentary; age: 100Ma ]\n\
             INTRUSION I1 [ rock: R1; style: dike; time: 2.5Ga; after: E1, D1 ]\n\
             EROSION E1 [ ]\n"
        );
    }

    #[test]
    fn test_quoted_values() {
        let doc = document(
            r#"
            ROCK R1 [ name: "The \"Old\" Red\\Sandstone"; type: sedimentary; age: "?" ]
            EROSION E1 [ time: "late Eocene" ]
            "#,
        );
        let text = to_dsl(&doc);
        assert!(text.contains(r#"name: "The \"Old\" Red\\Sandstone""#));
        assert!(text.contains(r#"age: "?""#));
        assert!(text.contains(r#"time: "late Eocene""#));
        assert_eq!(document(&text), doc);
    }

    #[test]
    fn test_enum_spelling_is_normalized() {
        let doc = document(
            r#"
            ROCK R1 [ name: "Granite"; type: Intrusive ]
            INTRUSION I1 [ rock: R1; style: SILL ]
            "#,
        );
        let text = to_dsl(&doc);
        assert!(text.contains("type: intrusive"));
        assert!(text.contains("style: sill"));
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(to_dsl(&Document::default()), "");
    }
}
