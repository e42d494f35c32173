//! # ClickHouse Type Parser
//!
//! Parses the type portion of a ClickHouse column definition into a small tree and
//! maps that tree onto the Python runtime types and `clickhouse_sqlalchemy` storage
//! types used by the model generator.
//!
//! Parsing works on the token stream produced by `sqlparser`'s ClickHouse dialect
//! (see [`super::sql_parser`]), so a type can be parsed on its own or in the middle of a
//! `CREATE TABLE` body.

use itertools::Itertools;
use serde::Serialize;
use sqlparser::tokenizer::Token;
use std::fmt;

use super::sql_parser::{ParseError, TokenParser};

/// Type names exposed by `clickhouse_sqlalchemy.types`. Bare type names outside this
/// list are emitted verbatim in storage expressions.
const CLICKHOUSE_TYPES: &[&str] = &[
    "AggregateFunction",
    "Array",
    "Boolean",
    "Date",
    "Date32",
    "DateTime",
    "DateTime64",
    "Decimal",
    "Enum",
    "Enum16",
    "Enum8",
    "Float",
    "Float32",
    "Float64",
    "IPv4",
    "IPv6",
    "Int",
    "Int128",
    "Int16",
    "Int256",
    "Int32",
    "Int64",
    "Int8",
    "LowCardinality",
    "Map",
    "Nested",
    "Nullable",
    "SimpleAggregateFunction",
    "String",
    "Tuple",
    "UInt128",
    "UInt16",
    "UInt256",
    "UInt32",
    "UInt64",
    "UInt8",
    "UUID",
];

/// Modifiers that wrap a type without changing its runtime representation.
const TRANSPARENT_MODIFIERS: &[&str] = &["Nullable", "LowCardinality"];

/// Parsed ClickHouse type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickHouseTypeNode {
    /// `UInt64`, `String`, ...
    Simple(String),
    /// `Nullable(T)`, `DateTime64(9)`, `Map(K, V)`, ...
    Parameterized {
        name: String,
        args: Vec<TypeArgument>,
    },
}

/// One argument of a parameterized type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeArgument {
    Type(ClickHouseTypeNode),
    /// Anything that is not a type (precision, time zone, enum member, named tuple element)
    /// kept as its source text.
    Literal(String),
}

impl fmt::Display for ClickHouseTypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClickHouseTypeNode::Simple(name) => write!(f, "{name}"),
            ClickHouseTypeNode::Parameterized { name, args } => {
                write!(f, "{name}({})", args.iter().join(", "))
            }
        }
    }
}

impl fmt::Display for TypeArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeArgument::Type(node) => write!(f, "{node}"),
            TypeArgument::Literal(text) => write!(f, "{text}"),
        }
    }
}

impl ClickHouseTypeNode {
    pub fn name(&self) -> &str {
        match self {
            ClickHouseTypeNode::Simple(name) => name,
            ClickHouseTypeNode::Parameterized { name, .. } => name,
        }
    }

    /// The wrapped type when this node is a transparent modifier with a single type argument.
    fn unwrap_modifier(&self) -> Option<&ClickHouseTypeNode> {
        match self {
            ClickHouseTypeNode::Parameterized { name, args }
                if TRANSPARENT_MODIFIERS.contains(&name.as_str()) =>
            {
                match args.as_slice() {
                    [TypeArgument::Type(inner)] => Some(inner),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// `true` when any transparent modifier layer is `Nullable`, so both `Nullable(String)`
    /// and `LowCardinality(Nullable(String))` are nullable.
    pub fn is_nullable(&self) -> bool {
        let mut node = self;
        while let Some(inner) = node.unwrap_modifier() {
            if node.name() == "Nullable" {
                return true;
            }
            node = inner;
        }
        false
    }

    /// The innermost type once `Nullable` and `LowCardinality` are peeled off.
    pub fn innermost(&self) -> &ClickHouseTypeNode {
        let mut node = self;
        while let Some(inner) = node.unwrap_modifier() {
            node = inner;
        }
        node
    }

    pub fn runtime_type(&self) -> RuntimeType {
        RuntimeType::from_clickhouse_name(self.innermost().name())
    }

    /// Renders the `clickhouse_sqlalchemy` storage type, e.g.
    /// `Nullable(DateTime64(9))` becomes `types.Nullable(types.DateTime64(9))`.
    pub fn to_storage_type_expression(&self) -> String {
        match self {
            ClickHouseTypeNode::Simple(name) => {
                let name = sqlalchemy_type_name(name);
                if CLICKHOUSE_TYPES.contains(&name) {
                    format!("types.{name}")
                } else {
                    name.to_string()
                }
            }
            ClickHouseTypeNode::Parameterized { name, args } => format!(
                "types.{}({})",
                sqlalchemy_type_name(name),
                args.iter()
                    .map(|arg| match arg {
                        TypeArgument::Type(node) => node.to_storage_type_expression(),
                        TypeArgument::Literal(text) => text.clone(),
                    })
                    .join(", ")
            ),
        }
    }
}

fn sqlalchemy_type_name(name: &str) -> &str {
    match name {
        "Bool" => "Boolean",
        other => other,
    }
}

/// Python-side representation of a ClickHouse column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeType {
    Integer,
    Boolean,
    Float,
    String,
    Date,
    DateTime,
    Uuid,
    /// No runtime mapping exists; the field is typed as `Any`.
    Unmapped,
}

impl RuntimeType {
    pub fn from_clickhouse_name(name: &str) -> Self {
        match name {
            "Int8" | "Int16" | "Int32" | "Int64" | "Int128" | "Int256" | "UInt8" | "UInt16"
            | "UInt32" | "UInt64" | "UInt128" | "UInt256" => RuntimeType::Integer,
            "Bool" | "Boolean" => RuntimeType::Boolean,
            "Float32" | "Float64" => RuntimeType::Float,
            "String" | "FixedString" => RuntimeType::String,
            "Date" | "Date32" => RuntimeType::Date,
            "DateTime" | "DateTime64" => RuntimeType::DateTime,
            "UUID" => RuntimeType::Uuid,
            _ => RuntimeType::Unmapped,
        }
    }

    pub fn python_type(&self) -> &'static str {
        match self {
            RuntimeType::Integer => "int",
            RuntimeType::Boolean => "bool",
            RuntimeType::Float => "float",
            RuntimeType::String => "str",
            RuntimeType::Date => "datetime.date",
            RuntimeType::DateTime => "datetime.datetime",
            RuntimeType::Uuid => "UUID",
            RuntimeType::Unmapped => "Any",
        }
    }

    /// The import a model needs when one of its fields uses this type.
    pub fn python_import(&self) -> Option<&'static str> {
        match self {
            RuntimeType::Date | RuntimeType::DateTime => Some("import datetime"),
            RuntimeType::Uuid => Some("from uuid import UUID"),
            RuntimeType::Unmapped => Some("from typing import Any"),
            _ => None,
        }
    }

    pub fn field_type_expression(&self, nullable: bool) -> String {
        match self {
            RuntimeType::Unmapped => self.python_type().to_string(),
            _ if nullable => format!("{} | None", self.python_type()),
            _ => self.python_type().to_string(),
        }
    }
}

/// Parses a standalone ClickHouse type string such as `Nullable(DateTime64(9))`.
pub fn parse_clickhouse_type(input: &str) -> Result<ClickHouseTypeNode, ParseError> {
    let mut parser = TokenParser::from_sql(input)?;
    let node = parse_type(&mut parser)?;
    parser.expect_end("type")?;
    Ok(node)
}

/// Parses a type at the parser's current position.
pub(crate) fn parse_type(parser: &mut TokenParser) -> Result<ClickHouseTypeNode, ParseError> {
    let name = parser.parse_identifier("type name")?;

    if !parser.consume(&Token::LParen) {
        return Ok(ClickHouseTypeNode::Simple(name));
    }

    let mut args = Vec::new();
    if parser.consume(&Token::RParen) {
        return Ok(ClickHouseTypeNode::Parameterized { name, args });
    }

    loop {
        args.push(parse_type_argument(parser)?);
        match parser.next_token() {
            Token::Comma => continue,
            Token::RParen => break,
            Token::EOF => {
                return Err(ParseError::UnexpectedEOF {
                    context: "type arguments",
                })
            }
            other => {
                return Err(ParseError::UnexpectedToken {
                    expected: "',' or ')'".to_string(),
                    found: other.to_string(),
                })
            }
        }
    }

    Ok(ClickHouseTypeNode::Parameterized { name, args })
}

/// An argument is a nested type when it is a bare word, optionally followed by its own
/// parenthesized arguments, and nothing else. Everything else is kept as literal text.
fn parse_type_argument(parser: &mut TokenParser) -> Result<TypeArgument, ParseError> {
    let checkpoint = parser.position();

    if matches!(parser.peek(), Token::Word(word) if word.quote_style.is_none()) {
        if let Ok(node) = parse_type(parser) {
            if matches!(parser.peek(), Token::Comma | Token::RParen) {
                return Ok(TypeArgument::Type(node));
            }
        }
        parser.rewind(checkpoint);
    }

    let text = parser.collect_item("type argument")?;
    Ok(TypeArgument::Literal(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> ClickHouseTypeNode {
        parse_clickhouse_type(input).unwrap()
    }

    #[test]
    fn test_parse_simple_type() {
        assert_eq!(parse("UInt64"), ClickHouseTypeNode::Simple("UInt64".to_string()));
    }

    #[test]
    fn test_parse_nested_modifiers() {
        let node = parse("Nullable(DateTime64(9))");
        assert_eq!(
            node,
            ClickHouseTypeNode::Parameterized {
                name: "Nullable".to_string(),
                args: vec![TypeArgument::Type(ClickHouseTypeNode::Parameterized {
                    name: "DateTime64".to_string(),
                    args: vec![TypeArgument::Literal("9".to_string())],
                })],
            }
        );
        assert_eq!(node.to_string(), "Nullable(DateTime64(9))");
    }

    #[test]
    fn test_parse_literal_arguments() {
        let node = parse("DateTime64(3, 'UTC')");
        assert_eq!(node.to_string(), "DateTime64(3, 'UTC')");

        let node = parse("Enum8('active' = 1, 'deleted' = 2)");
        assert_eq!(node.to_string(), "Enum8('active' = 1, 'deleted' = 2)");
    }

    #[test]
    fn test_parse_named_tuple_elements_are_literals() {
        let node = parse("Tuple(a String, b UInt64)");
        match node {
            ClickHouseTypeNode::Parameterized { args, .. } => {
                assert_eq!(
                    args,
                    vec![
                        TypeArgument::Literal("a String".to_string()),
                        TypeArgument::Literal("b UInt64".to_string()),
                    ]
                );
            }
            other => panic!("expected a parameterized type, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_trailing_tokens() {
        assert!(parse_clickhouse_type("UInt64 UInt8").is_err());
        assert!(parse_clickhouse_type("Nullable(String").is_err());
    }

    #[test]
    fn test_nullability() {
        assert!(parse("Nullable(String)").is_nullable());
        assert!(parse("LowCardinality(Nullable(String))").is_nullable());
        assert!(!parse("LowCardinality(String)").is_nullable());
        assert!(!parse("Array(Nullable(String))").is_nullable());
    }

    #[test]
    fn test_runtime_type_uses_innermost_type() {
        assert_eq!(parse("UInt64").runtime_type(), RuntimeType::Integer);
        assert_eq!(parse("Nullable(Bool)").runtime_type(), RuntimeType::Boolean);
        assert_eq!(
            parse("LowCardinality(Nullable(String))").runtime_type(),
            RuntimeType::String
        );
        assert_eq!(parse("FixedString(16)").runtime_type(), RuntimeType::String);
        assert_eq!(parse("Date32").runtime_type(), RuntimeType::Date);
        assert_eq!(parse("DateTime64(9)").runtime_type(), RuntimeType::DateTime);
        assert_eq!(parse("UUID").runtime_type(), RuntimeType::Uuid);
        assert_eq!(parse("Float32").runtime_type(), RuntimeType::Float);
        assert_eq!(parse("Array(UInt64)").runtime_type(), RuntimeType::Unmapped);
        assert_eq!(parse("Decimal(10, 2)").runtime_type(), RuntimeType::Unmapped);
    }

    #[test]
    fn test_storage_type_expression() {
        assert_eq!(parse("UInt64").to_storage_type_expression(), "types.UInt64");
        assert_eq!(
            parse("Nullable(Bool)").to_storage_type_expression(),
            "types.Nullable(types.Boolean)"
        );
        assert_eq!(
            parse("Nullable(DateTime64(9))").to_storage_type_expression(),
            "types.Nullable(types.DateTime64(9))"
        );
        assert_eq!(
            parse("Map(String, Array(UInt8))").to_storage_type_expression(),
            "types.Map(types.String, types.Array(types.UInt8))"
        );
        assert_eq!(
            parse("FixedString(16)").to_storage_type_expression(),
            "types.FixedString(16)"
        );
        assert_eq!(parse("Point").to_storage_type_expression(), "Point");
    }

    #[test]
    fn test_field_type_expression() {
        assert_eq!(RuntimeType::Integer.field_type_expression(false), "int");
        assert_eq!(
            RuntimeType::DateTime.field_type_expression(true),
            "datetime.datetime | None"
        );
        assert_eq!(RuntimeType::Uuid.field_type_expression(true), "UUID | None");
        assert_eq!(RuntimeType::Unmapped.field_type_expression(true), "Any");
    }
}
