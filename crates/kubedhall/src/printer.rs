//! render type expressions back to source
//!
//! The output is meant for `dhall format`, so whitespace only has to be parseable, not
//! canonical. Two conventions matter though:
//!
//! - fields are tab indented and continuation lines start with the separator (`, ` or ` | `)
//! - an application chain of more than two parts is parenthesized right-leaning and all
//!   parentheses close together at the end: `Optional ( List ( Text ) )`
use crate::ast::{FieldType, LastValueType, RecordType, UnionType, ValueType};
use std::fmt;

/// Write a node as type expression source
pub trait ToSource {
    fn write_source(&self, out: &mut String, indent_level: usize);

    fn to_source(&self, indent_level: usize) -> String {
        let mut out = String::new();
        self.write_source(&mut out, indent_level);
        out
    }
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push('\t');
    }
}

fn write_fields(
    out: &mut String,
    fields: &[FieldType],
    open: &str,
    separator: &str,
    close: &str,
    indent_level: usize,
) {
    out.push_str(open);
    out.push('\n');
    for (index, field) in fields.iter().enumerate() {
        indent(out, indent_level);
        if index > 0 {
            out.push_str(separator);
        }
        field.write_source(out, indent_level);
    }
    indent(out, indent_level.saturating_sub(1));
    out.push_str(close);
}

impl ToSource for RecordType {
    fn write_source(&self, out: &mut String, indent_level: usize) {
        write_fields(out, &self.fields, "{", ", ", "}", indent_level);
    }
}

impl ToSource for UnionType {
    fn write_source(&self, out: &mut String, indent_level: usize) {
        write_fields(out, &self.members, "<", " | ", ">", indent_level);
    }
}

impl ToSource for FieldType {
    fn write_source(&self, out: &mut String, indent_level: usize) {
        out.push_str(&self.key);
        out.push_str(": ");
        self.value.write_source(out, indent_level);
        out.push('\n');
    }
}

impl ToSource for ValueType {
    fn write_source(&self, out: &mut String, indent_level: usize) {
        let parts = self.atoms.len() + usize::from(self.tail.is_some());

        let mut open_parentheses = 0;
        if parts <= 2 {
            out.push_str(&self.atoms.join(" "));
        } else if let Some((head, rest)) = self.atoms.split_first() {
            out.push_str(head);
            for atom in rest {
                out.push_str(" ( ");
                out.push_str(atom);
                open_parentheses += 1;
            }
        }

        if let Some(tail) = &self.tail {
            if !self.atoms.is_empty() {
                out.push(' ');
            }
            tail.write_source(out, indent_level + 1);
        }

        for _ in 0..open_parentheses {
            out.push_str(" )");
        }
    }
}

impl ToSource for LastValueType {
    fn write_source(&self, out: &mut String, indent_level: usize) {
        match self {
            // records step in one more level, union members stay on the union's level
            LastValueType::Record(record) => record.write_source(out, indent_level + 1),
            LastValueType::Union(union) => union.write_source(out, indent_level),
        }
    }
}

macro_rules! display_as_source {
    ($($node:ty),+) => {
        $(
            impl fmt::Display for $node {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.to_source(1))
                }
            }
        )+
    };
}

display_as_source!(RecordType, UnionType, FieldType, ValueType, LastValueType);
