//! # ClickHouse DDL Parser
//!
//! Parses a single ClickHouse `CREATE TABLE` statement into a [`ParsedSchema`].
//!
//! The statement is tokenized with `sqlparser`'s ClickHouse dialect and walked with a small
//! recursive-descent parser scoped to the clauses model generation needs:
//!
//! ```sql
//! CREATE [OR REPLACE] [TEMPORARY] TABLE [IF NOT EXISTS] [db.]name [ON CLUSTER c]
//! (
//!     column Type [NULL | NOT NULL] [DEFAULT ...] [CODEC(...)] [COMMENT '...'],
//!     INDEX ..., PROJECTION ..., CONSTRAINT ...,
//!     PRIMARY KEY key
//! )
//! [ENGINE [=] Name[(args)]] [PRIMARY KEY key] [ORDER BY key] [PARTITION BY expr]
//! [SAMPLE BY expr] [TTL expr, ...] [SETTINGS k = v, ...] [COMMENT '...'] [;]
//! ```
//!
//! Clauses after the table body may appear in any order. `PARTITION BY`, `SAMPLE BY`, `TTL`
//! and `COMMENT` are parsed and dropped.

use sqlparser::dialect::ClickHouseDialect;
use sqlparser::tokenizer::{Token, Tokenizer, TokenizerError};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

use super::model::{ColumnInfo, ParsedSchema, TableIdentifier};
use super::type_parser::{parse_type, ClickHouseTypeNode, RuntimeType};

/// Keywords that start a clause after the table body.
const CLAUSE_KEYWORDS: &[&str] = &[
    "ENGINE",
    "PRIMARY",
    "ORDER",
    "PARTITION",
    "SAMPLE",
    "TTL",
    "SETTINGS",
    "COMMENT",
];

/// Keywords that start a column option, used to detect columns declared without a type.
const COLUMN_OPTION_KEYWORDS: &[&str] = &[
    "DEFAULT",
    "MATERIALIZED",
    "ALIAS",
    "EPHEMERAL",
    "CODEC",
    "TTL",
    "COMMENT",
];

/// Errors that can occur while parsing ClickHouse DDL
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ParseError {
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Unexpected token encountered during parsing
    #[error("Unexpected token: expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    /// End of input reached unexpectedly
    #[error("Unexpected end of input while parsing {context}")]
    UnexpectedEOF { context: &'static str },

    #[error("Column `{column}` has no declared type")]
    MissingColumnType { column: String },

    #[error("Expected a single statement but found more input after ';'")]
    MultipleStatements,
}

impl From<TokenizerError> for ParseError {
    fn from(error: TokenizerError) -> Self {
        ParseError::Tokenizer(error.to_string())
    }
}

/// Parses a ClickHouse `CREATE TABLE` statement.
///
/// Fails without a partial result when the input cannot be tokenized, is not a
/// `CREATE TABLE` statement, or contains more than one statement.
pub fn parse_create_table_statement(sql: &str) -> Result<ParsedSchema, ParseError> {
    let mut parser = TokenParser::from_sql(sql)?;
    let statement = parser.parse_create_table()?;
    debug!(
        "Parsed CREATE TABLE with {} columns and engine {:?}",
        statement.columns.len(),
        statement.engine.as_ref().map(|engine| &engine.name)
    );
    Ok(statement.into_schema())
}

/// A clause fragment captured as source text together with its significant tokens.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Expression {
    text: String,
    tokens: Vec<Token>,
}

impl Expression {
    /// The identifier name when the expression is a single (possibly quoted) word.
    pub(crate) fn identifier(&self) -> Option<&str> {
        match self.tokens.as_slice() {
            [Token::Word(word)] => Some(&word.value),
            _ => None,
        }
    }

    pub(crate) fn is_string_literal(&self) -> bool {
        matches!(self.tokens.as_slice(), [Token::SingleQuotedString(_)])
    }

    /// Identifier name for plain identifiers, source text for anything else.
    pub(crate) fn into_name(self) -> String {
        match self.identifier() {
            Some(name) => name.to_string(),
            None => self.text,
        }
    }
}

/// Where a captured expression ends.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Boundary {
    /// A `,` or `)` at depth 0; running out of input is an error.
    ListItem,
    /// A `,`, `)`, `;`, the end of input or the keyword starting the next clause.
    Clause,
}

/// Cursor over a `sqlparser` token stream. Whitespace tokens stay in the stream so
/// captured expressions keep their original spelling, but every lookahead skips them.
pub struct TokenParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenParser {
    pub fn from_sql(sql: &str) -> Result<Self, ParseError> {
        let dialect = ClickHouseDialect {};
        let mut tokens = Tokenizer::new(&dialect, sql).tokenize()?;
        tokens.push(Token::EOF);
        Ok(Self { tokens, pos: 0 })
    }

    /// Index of the first non-whitespace token at or after `from`.
    fn significant_index(&self, from: usize) -> usize {
        let last = self.tokens.len() - 1;
        let mut index = from.min(last);
        while index < last && matches!(self.tokens[index], Token::Whitespace(_)) {
            index += 1;
        }
        index
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.significant_index(self.pos)]
    }

    pub(crate) fn peek_nth(&self, n: usize) -> &Token {
        let mut index = self.significant_index(self.pos);
        for _ in 0..n {
            if matches!(self.tokens[index], Token::EOF) {
                break;
            }
            index = self.significant_index(index + 1);
        }
        &self.tokens[index]
    }

    /// Returns the next significant token and moves past it. The cursor never moves past EOF.
    pub(crate) fn next_token(&mut self) -> Token {
        let index = self.significant_index(self.pos);
        let token = self.tokens[index].clone();
        self.pos = if matches!(token, Token::EOF) {
            index
        } else {
            index + 1
        };
        token
    }

    pub(crate) fn advance(&mut self) {
        self.next_token();
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn rewind(&mut self, position: usize) {
        self.pos = position;
    }

    pub(crate) fn consume(&mut self, token: &Token) -> bool {
        if self.peek() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(
        &mut self,
        token: &Token,
        context: &'static str,
    ) -> Result<(), ParseError> {
        match self.next_token() {
            found if &found == token => Ok(()),
            Token::EOF => Err(ParseError::UnexpectedEOF { context }),
            found => Err(ParseError::UnexpectedToken {
                expected: format!("'{token}' in {context}"),
                found: found.to_string(),
            }),
        }
    }

    pub(crate) fn expect_end(&mut self, context: &'static str) -> Result<(), ParseError> {
        match self.peek() {
            Token::EOF => Ok(()),
            found => Err(ParseError::UnexpectedToken {
                expected: format!("end of {context}"),
                found: found.to_string(),
            }),
        }
    }

    fn is_keyword_at(&self, n: usize, keyword: &str) -> bool {
        is_keyword(self.peek_nth(n), keyword)
    }

    pub(crate) fn peek_keyword(&self, keyword: &str) -> bool {
        self.is_keyword_at(0, keyword)
    }

    pub(crate) fn parse_keyword(&mut self, keyword: &str) -> bool {
        self.parse_keywords(&[keyword])
    }

    /// Consumes the keyword sequence only when every keyword matches.
    pub(crate) fn parse_keywords(&mut self, keywords: &[&str]) -> bool {
        let matched = keywords
            .iter()
            .enumerate()
            .all(|(n, keyword)| self.is_keyword_at(n, keyword));
        if matched {
            for _ in keywords {
                self.advance();
            }
        }
        matched
    }

    pub(crate) fn expect_keyword(&mut self, keyword: &'static str) -> Result<(), ParseError> {
        if self.parse_keyword(keyword) {
            return Ok(());
        }
        match self.peek() {
            Token::EOF => Err(ParseError::UnexpectedEOF { context: keyword }),
            found => Err(ParseError::UnexpectedToken {
                expected: keyword.to_string(),
                found: found.to_string(),
            }),
        }
    }

    /// Parses a quoted or unquoted identifier and returns it without quotes.
    pub(crate) fn parse_identifier(&mut self, context: &'static str) -> Result<String, ParseError> {
        match self.next_token() {
            Token::Word(word) => Ok(word.value),
            Token::EOF => Err(ParseError::UnexpectedEOF { context }),
            found => Err(ParseError::UnexpectedToken {
                expected: context.to_string(),
                found: found.to_string(),
            }),
        }
    }

    /// Captures tokens up to the boundary, tracking `()`, `[]` and `{}` nesting.
    fn collect_expression(
        &mut self,
        context: &'static str,
        boundary: Boundary,
    ) -> Result<Expression, ParseError> {
        let start = self.significant_index(self.pos);
        let mut end = start;
        let mut depth = 0usize;

        loop {
            let index = self.significant_index(self.pos);
            let stop = match &self.tokens[index] {
                Token::EOF if depth == 0 && boundary == Boundary::Clause => true,
                Token::EOF => return Err(ParseError::UnexpectedEOF { context }),
                Token::Comma if depth == 0 => true,
                token if depth == 0 && closes_group(token) => true,
                Token::SemiColon if depth == 0 && boundary == Boundary::Clause => true,
                Token::Word(word)
                    if depth == 0
                        && boundary == Boundary::Clause
                        && word.quote_style.is_none()
                        && index > start
                        && CLAUSE_KEYWORDS
                            .iter()
                            .any(|keyword| word.value.eq_ignore_ascii_case(keyword)) =>
                {
                    true
                }
                token if opens_group(token) => {
                    depth += 1;
                    false
                }
                token if closes_group(token) => {
                    depth -= 1;
                    false
                }
                _ => false,
            };
            if stop {
                break;
            }
            self.pos = index + 1;
            end = index + 1;
        }

        if end == start {
            return Err(ParseError::UnexpectedToken {
                expected: context.to_string(),
                found: self.peek().to_string(),
            });
        }

        let slice = &self.tokens[start..end];
        Ok(Expression {
            text: slice
                .iter()
                .map(|token| token.to_string())
                .collect::<String>()
                .trim()
                .to_string(),
            tokens: slice
                .iter()
                .filter(|token| !matches!(token, Token::Whitespace(_)))
                .cloned()
                .collect(),
        })
    }

    /// Captures one element of a parenthesized list as source text.
    pub(crate) fn collect_item(&mut self, context: &'static str) -> Result<String, ParseError> {
        Ok(self.collect_expression(context, Boundary::ListItem)?.text)
    }

    fn collect_clause_expression(
        &mut self,
        context: &'static str,
    ) -> Result<Expression, ParseError> {
        self.collect_expression(context, Boundary::Clause)
    }

    /// Parses `( expr, expr, ... )`. An empty list is allowed.
    fn parse_parenthesized_expressions(
        &mut self,
        context: &'static str,
    ) -> Result<Vec<Expression>, ParseError> {
        self.expect(&Token::LParen, context)?;

        let mut items = Vec::new();
        if self.consume(&Token::RParen) {
            return Ok(items);
        }

        loop {
            items.push(self.collect_expression(context, Boundary::ListItem)?);
            match self.next_token() {
                Token::Comma => continue,
                Token::RParen => break,
                Token::EOF => return Err(ParseError::UnexpectedEOF { context }),
                found => {
                    return Err(ParseError::UnexpectedToken {
                        expected: format!("',' or ')' in {context}"),
                        found: found.to_string(),
                    })
                }
            }
        }

        Ok(items)
    }

    /// Skips a balanced `( ... )`, `[ ... ]` or `{ ... }` group starting at the cursor.
    fn skip_group(&mut self, context: &'static str) -> Result<(), ParseError> {
        let mut depth = 0usize;
        loop {
            match self.next_token() {
                Token::EOF => return Err(ParseError::UnexpectedEOF { context }),
                token if opens_group(&token) => depth += 1,
                token if closes_group(&token) => depth -= 1,
                _ => {}
            }
            if depth == 0 {
                return Ok(());
            }
        }
    }

    /// Whether the table element starting at the cursor contains `keyword` at depth 0.
    fn element_contains_keyword(&self, keyword: &str) -> bool {
        let mut index = self.significant_index(self.pos);
        let mut depth = 0usize;
        loop {
            match &self.tokens[index] {
                Token::EOF => return false,
                Token::Comma if depth == 0 => return false,
                token if depth == 0 && closes_group(token) => return false,
                token if opens_group(token) => depth += 1,
                token if closes_group(token) => depth -= 1,
                token if depth == 0 && is_keyword(token, keyword) => return true,
                _ => {}
            }
            index = self.significant_index(index + 1);
        }
    }

    fn parse_create_table(&mut self) -> Result<CreateTableStatement, ParseError> {
        self.expect_keyword("CREATE")?;
        self.parse_keywords(&["OR", "REPLACE"]);
        self.parse_keyword("TEMPORARY");
        self.expect_keyword("TABLE")?;
        self.parse_keywords(&["IF", "NOT", "EXISTS"]);

        let table = self.parse_table_identifier()?;

        if self.parse_keywords(&["ON", "CLUSTER"]) {
            // Cluster names may be identifiers or string literals such as '{cluster}'
            match self.next_token() {
                Token::Word(_) | Token::SingleQuotedString(_) => {}
                Token::EOF => return Err(ParseError::UnexpectedEOF { context: "ON CLUSTER" }),
                found => {
                    return Err(ParseError::UnexpectedToken {
                        expected: "cluster name".to_string(),
                        found: found.to_string(),
                    })
                }
            }
        }

        let mut statement = CreateTableStatement {
            table: Some(table),
            ..CreateTableStatement::default()
        };

        self.parse_table_body(&mut statement)?;
        self.parse_table_clauses(&mut statement)?;

        Ok(statement)
    }

    fn parse_table_identifier(&mut self) -> Result<TableIdentifier, ParseError> {
        let first = self.parse_identifier("table name")?;
        if self.consume(&Token::Period) {
            let table = self.parse_identifier("table name")?;
            Ok(TableIdentifier::new(Some(first), table))
        } else {
            Ok(TableIdentifier::new(None, first))
        }
    }

    fn parse_table_body(&mut self, statement: &mut CreateTableStatement) -> Result<(), ParseError> {
        self.expect(&Token::LParen, "table body")?;

        loop {
            if self.peek_keyword("INDEX") && self.element_contains_keyword("TYPE") {
                self.collect_item("index definition")?;
            } else if self.peek_keyword("PROJECTION") && self.peek_nth(2) == &Token::LParen {
                self.collect_item("projection definition")?;
            } else if self.peek_keyword("CONSTRAINT")
                && (self.element_contains_keyword("CHECK")
                    || self.element_contains_keyword("ASSUME"))
            {
                self.collect_item("constraint definition")?;
            } else if self.parse_keywords(&["PRIMARY", "KEY"]) {
                let key = self.parse_key()?;
                statement.add_primary_key(key);
            } else {
                let column = self.parse_column_definition()?;
                statement.columns.push(column);
            }

            match self.next_token() {
                Token::Comma if self.peek() == &Token::RParen => {
                    self.advance();
                    break;
                }
                Token::Comma => continue,
                Token::RParen => break,
                Token::EOF => return Err(ParseError::UnexpectedEOF { context: "table body" }),
                found => {
                    return Err(ParseError::UnexpectedToken {
                        expected: "',' or ')' in table body".to_string(),
                        found: found.to_string(),
                    })
                }
            }
        }

        Ok(())
    }

    fn parse_column_definition(&mut self) -> Result<ColumnDefinition, ParseError> {
        let name = self.parse_identifier("column name")?;

        let missing_type = matches!(self.peek(), Token::Comma | Token::RParen)
            || COLUMN_OPTION_KEYWORDS
                .iter()
                .any(|keyword| self.peek_keyword(keyword));
        if missing_type {
            return Err(ParseError::MissingColumnType { column: name });
        }

        let data_type = parse_type(self)?;

        let mut null_modifier = false;
        if !self.parse_keywords(&["NOT", "NULL"]) && self.parse_keyword("NULL") {
            null_modifier = true;
        }

        let mut primary_key = false;
        loop {
            if matches!(self.peek(), Token::Comma | Token::RParen) {
                break;
            }
            if self.peek() == &Token::EOF {
                return Err(ParseError::UnexpectedEOF {
                    context: "column definition",
                });
            }
            if self.parse_keywords(&["PRIMARY", "KEY"]) {
                primary_key = true;
                continue;
            }
            if opens_group(self.peek()) {
                self.skip_group("column definition")?;
                continue;
            }
            self.advance();
        }

        Ok(ColumnDefinition {
            name,
            data_type,
            null_modifier,
            primary_key,
        })
    }

    fn parse_table_clauses(
        &mut self,
        statement: &mut CreateTableStatement,
    ) -> Result<(), ParseError> {
        loop {
            if self.peek() == &Token::EOF {
                break;
            }
            if self.consume(&Token::SemiColon) {
                if self.peek() != &Token::EOF {
                    return Err(ParseError::MultipleStatements);
                }
                break;
            }

            if self.parse_keyword("ENGINE") {
                statement.engine = Some(self.parse_engine()?);
            } else if self.parse_keywords(&["PRIMARY", "KEY"]) {
                let key = self.parse_key()?;
                statement.add_primary_key(key);
            } else if self.parse_keywords(&["ORDER", "BY"]) {
                statement.order_by = self.parse_key()?;
            } else if self.parse_keywords(&["PARTITION", "BY"])
                || self.parse_keywords(&["SAMPLE", "BY"])
                || self.parse_keyword("TTL")
                || self.parse_keyword("COMMENT")
            {
                self.skip_clause("table clause")?;
            } else if self.parse_keyword("SETTINGS") {
                self.parse_settings(&mut statement.settings)?;
            } else {
                return Err(ParseError::UnexpectedToken {
                    expected: "ENGINE, PRIMARY KEY, ORDER BY, PARTITION BY, SAMPLE BY, TTL, \
                               SETTINGS or COMMENT"
                        .to_string(),
                    found: self.peek().to_string(),
                });
            }
        }

        Ok(())
    }

    fn parse_engine(&mut self) -> Result<EngineDefinition, ParseError> {
        self.consume(&Token::Eq);
        let name = self.parse_identifier("engine name")?;
        let args = if self.peek() == &Token::LParen {
            self.parse_parenthesized_expressions("engine arguments")?
        } else {
            Vec::new()
        };
        Ok(EngineDefinition { name, args })
    }

    /// Parses a `PRIMARY KEY` or `ORDER BY` key: `tuple()`, `tuple(a, b)`, `(a, b)`, `a`
    /// or a single expression.
    fn parse_key(&mut self) -> Result<Vec<String>, ParseError> {
        let expressions = if self.peek_keyword("tuple") && self.peek_nth(1) == &Token::LParen {
            self.advance();
            self.parse_parenthesized_expressions("key")?
        } else if self.peek() == &Token::LParen {
            self.parse_parenthesized_expressions("key")?
        } else {
            vec![self.collect_clause_expression("key")?]
        };

        Ok(expressions.into_iter().map(Expression::into_name).collect())
    }

    fn parse_settings(
        &mut self,
        settings: &mut BTreeMap<String, String>,
    ) -> Result<(), ParseError> {
        loop {
            let key = self.parse_identifier("setting name")?;
            self.expect(&Token::Eq, "SETTINGS")?;
            let value = self.collect_clause_expression("setting value")?;
            settings.insert(key, value.text);

            if !self.consume(&Token::Comma) {
                break;
            }
        }
        Ok(())
    }

    fn skip_clause(&mut self, context: &'static str) -> Result<(), ParseError> {
        loop {
            self.collect_clause_expression(context)?;
            if !self.consume(&Token::Comma) {
                break;
            }
        }
        Ok(())
    }
}

fn is_keyword(token: &Token, keyword: &str) -> bool {
    matches!(
        token,
        Token::Word(word) if word.quote_style.is_none() && word.value.eq_ignore_ascii_case(keyword)
    )
}

fn opens_group(token: &Token) -> bool {
    matches!(token, Token::LParen | Token::LBracket | Token::LBrace)
}

fn closes_group(token: &Token) -> bool {
    matches!(token, Token::RParen | Token::RBracket | Token::RBrace)
}

#[derive(Debug, Default)]
struct CreateTableStatement {
    table: Option<TableIdentifier>,
    columns: Vec<ColumnDefinition>,
    engine: Option<EngineDefinition>,
    primary_key: Vec<String>,
    order_by: Vec<String>,
    settings: BTreeMap<String, String>,
}

#[derive(Debug)]
struct ColumnDefinition {
    name: String,
    data_type: ClickHouseTypeNode,
    null_modifier: bool,
    primary_key: bool,
}

#[derive(Debug)]
struct EngineDefinition {
    name: String,
    args: Vec<Expression>,
}

impl EngineDefinition {
    /// Maps the positional engine arguments onto (version column, soft-delete column).
    ///
    /// `Replicated*` engines start with the ZooKeeper path and replica name; those leading
    /// string literals are not columns and are dropped first.
    fn version_columns(&self) -> (Option<String>, Option<String>) {
        let mut args = self.args.as_slice();
        if self.name.starts_with("Replicated") {
            let coordination_args = args
                .iter()
                .take(2)
                .take_while(|arg| arg.is_string_literal())
                .count();
            args = &args[coordination_args..];
        }

        match args {
            [] => (None, None),
            [version] => (Some(version.clone().into_name()), None),
            [version, is_deleted] => (
                Some(version.clone().into_name()),
                Some(is_deleted.clone().into_name()),
            ),
            _ => {
                warn!(
                    "Engine {} has {} arguments; version and soft-delete columns are left unset",
                    self.name,
                    args.len()
                );
                (None, None)
            }
        }
    }
}

impl CreateTableStatement {
    fn add_primary_key(&mut self, key: Vec<String>) {
        for column in key {
            if !self.primary_key.contains(&column) {
                self.primary_key.push(column);
            }
        }
    }

    fn into_schema(mut self) -> ParsedSchema {
        let column_level_keys: Vec<String> = self
            .columns
            .iter()
            .filter(|column| column.primary_key)
            .map(|column| column.name.clone())
            .collect();
        self.add_primary_key(column_level_keys);

        let (version_column, soft_delete_column) = self
            .engine
            .as_ref()
            .map(EngineDefinition::version_columns)
            .unwrap_or_default();

        let primary_key = self.primary_key;
        let columns = self
            .columns
            .into_iter()
            .map(|column| column_info(column, &primary_key))
            .collect();

        ParsedSchema {
            table: self.table,
            engine: self.engine.map(|engine| engine.name),
            version_column,
            soft_delete_column,
            primary_key,
            order_by: self.order_by,
            settings: self.settings,
            columns,
        }
    }
}

fn column_info(column: ColumnDefinition, primary_key: &[String]) -> ColumnInfo {
    let is_nullable = column.null_modifier || column.data_type.is_nullable();
    let runtime_type = column.data_type.runtime_type();
    let source_type = column.data_type.to_string();

    if runtime_type == RuntimeType::Unmapped {
        warn!(
            "Column `{}` has type {} with no Python mapping; typing it as Any",
            column.name, source_type
        );
    }

    ColumnInfo {
        is_primary_key: primary_key.contains(&column.name),
        is_nullable,
        mapped_runtime_type: runtime_type,
        target_field_type_expression: runtime_type.field_type_expression(is_nullable),
        target_storage_type_expression: column.data_type.to_storage_type_expression(),
        source_type,
        name: column.name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PEERDB_TABLE: &str = "CREATE TABLE test_table (id UInt64, country String, updated_at DateTime default now(),
_peerdb_synced_at DateTime64(9) DEFAULT now64(), _peerdb_is_deleted Int8, _peerdb_version Int64)
ENGINE = ReplacingMergeTree(_peerdb_version, _peerdb_is_deleted) PRIMARY KEY id";

    fn parse(sql: &str) -> ParsedSchema {
        parse_create_table_statement(sql).unwrap()
    }

    #[test]
    fn test_end_to_end_example() {
        let schema = parse(PEERDB_TABLE);

        assert_eq!(schema.engine.as_deref(), Some("ReplacingMergeTree"));
        assert_eq!(schema.version_column.as_deref(), Some("_peerdb_version"));
        assert_eq!(schema.soft_delete_column.as_deref(), Some("_peerdb_is_deleted"));
        assert_eq!(schema.primary_key, vec!["id"]);
        assert!(schema.order_by.is_empty());
        assert!(schema.settings.is_empty());

        let names: Vec<&str> = schema.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "id",
                "country",
                "updated_at",
                "_peerdb_synced_at",
                "_peerdb_is_deleted",
                "_peerdb_version"
            ]
        );

        let key_columns: Vec<&str> = schema
            .primary_key_columns()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(key_columns, vec!["id"]);
        assert_eq!(schema.table, Some(TableIdentifier::new(None, "test_table")));
    }

    #[test]
    fn test_defaults_without_optional_clauses() {
        let schema = parse("CREATE TABLE t (id UInt64, name String)");

        assert_eq!(schema.engine, None);
        assert_eq!(schema.version_column, None);
        assert_eq!(schema.soft_delete_column, None);
        assert!(schema.primary_key.is_empty());
        assert!(schema.order_by.is_empty());
        assert!(schema.settings.is_empty());
        assert_eq!(schema.columns.len(), 2);
        assert!(schema.columns.iter().all(|c| !c.is_primary_key));
    }

    #[test]
    fn test_engine_argument_arity() {
        let schema = parse("CREATE TABLE t (id UInt64) ENGINE = ReplacingMergeTree");
        assert_eq!(schema.engine.as_deref(), Some("ReplacingMergeTree"));
        assert_eq!(schema.version_column, None);
        assert_eq!(schema.soft_delete_column, None);

        let schema = parse("CREATE TABLE t (id UInt64) ENGINE = ReplacingMergeTree()");
        assert_eq!(schema.version_column, None);

        let schema = parse("CREATE TABLE t (id UInt64) ENGINE = ReplacingMergeTree(_version)");
        assert_eq!(schema.version_column.as_deref(), Some("_version"));
        assert_eq!(schema.soft_delete_column, None);

        let schema = parse(
            "CREATE TABLE t (id UInt64) ENGINE = ReplacingMergeTree(_version, _is_deleted)",
        );
        assert_eq!(schema.version_column.as_deref(), Some("_version"));
        assert_eq!(schema.soft_delete_column.as_deref(), Some("_is_deleted"));
    }

    #[test]
    fn test_replicated_engine_drops_coordination_arguments() {
        let schema = parse(
            "CREATE TABLE db.t (id UInt64) ENGINE = ReplicatedReplacingMergeTree('/clickhouse/tables/{shard}/t', '{replica}', _peerdb_version, _peerdb_is_deleted)",
        );
        assert_eq!(schema.engine.as_deref(), Some("ReplicatedReplacingMergeTree"));
        assert_eq!(schema.version_column.as_deref(), Some("_peerdb_version"));
        assert_eq!(schema.soft_delete_column.as_deref(), Some("_peerdb_is_deleted"));
    }

    #[test]
    fn test_engine_with_too_many_arguments_leaves_columns_unset() {
        let schema =
            parse("CREATE TABLE t (d Date, id UInt64) ENGINE = MergeTree(d, (id, d), 8192)");
        assert_eq!(schema.engine.as_deref(), Some("MergeTree"));
        assert_eq!(schema.version_column, None);
        assert_eq!(schema.soft_delete_column, None);
    }

    #[test]
    fn test_primary_key_forms_are_equal() {
        let bare = parse("CREATE TABLE t (id UInt64) ENGINE = MergeTree PRIMARY KEY id");
        let tuple = parse("CREATE TABLE t (id UInt64) ENGINE = MergeTree PRIMARY KEY (id)");
        assert_eq!(bare.primary_key, vec!["id"]);
        assert_eq!(bare.primary_key, tuple.primary_key);
        assert_eq!(bare.columns, tuple.columns);
    }

    #[test]
    fn test_order_by_forms() {
        let bare = parse("CREATE TABLE t (id UInt64) ENGINE = MergeTree ORDER BY id");
        let tuple = parse("CREATE TABLE t (id UInt64) ENGINE = MergeTree ORDER BY (id)");
        assert_eq!(bare.order_by, vec!["id"]);
        assert_eq!(bare.order_by, tuple.order_by);

        let composite = parse(
            "CREATE TABLE t (id UInt64, country String) ENGINE = MergeTree ORDER BY (id, country)",
        );
        assert_eq!(composite.order_by, vec!["id", "country"]);

        let empty = parse("CREATE TABLE t (id UInt64) ENGINE = MergeTree ORDER BY tuple()");
        assert!(empty.order_by.is_empty());
    }

    #[test]
    fn test_key_expressions_keep_source_text() {
        let schema = parse(
            "CREATE TABLE t (id UInt64, ts DateTime) ENGINE = MergeTree ORDER BY (id, toStartOfDay(ts))",
        );
        assert_eq!(schema.order_by, vec!["id", "toStartOfDay(ts)"]);
    }

    #[test]
    fn test_settings_are_literal_text() {
        let schema = parse(
            "CREATE TABLE t (id UInt64) ENGINE = MergeTree ORDER BY id SETTINGS allow_nullable_key = 1, index_granularity = 8192",
        );
        let expected: BTreeMap<String, String> = [
            ("allow_nullable_key".to_string(), "1".to_string()),
            ("index_granularity".to_string(), "8192".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(schema.settings, expected);
    }

    #[test]
    fn test_nullable_propagation() {
        let schema = parse(
            "CREATE TABLE t (a Nullable(DateTime64(9)), b DateTime64(9), c Nullable(Bool), d UUID NULL)",
        );

        let a = schema.column("a").unwrap();
        assert!(a.is_nullable);
        assert_eq!(a.source_type, "Nullable(DateTime64(9))");
        assert_eq!(a.target_field_type_expression, "datetime.datetime | None");
        assert_eq!(
            a.target_storage_type_expression,
            "types.Nullable(types.DateTime64(9))"
        );

        let b = schema.column("b").unwrap();
        assert!(!b.is_nullable);
        assert_eq!(b.target_field_type_expression, "datetime.datetime");

        let c = schema.column("c").unwrap();
        assert_eq!(c.mapped_runtime_type, RuntimeType::Boolean);
        assert_eq!(c.target_field_type_expression, "bool | None");
        assert_eq!(c.target_storage_type_expression, "types.Nullable(types.Boolean)");

        let d = schema.column("d").unwrap();
        assert!(d.is_nullable);
        assert_eq!(d.target_field_type_expression, "UUID | None");
    }

    #[test]
    fn test_clickhouse_show_create_output() {
        let sql = r#"CREATE TABLE analytics.events
(
    `id` Int64,
    `user_id` Nullable(String) CODEC(ZSTD(1)),
    `tags` Array(LowCardinality(String)) DEFAULT [],
    `amount` Decimal(18, 4) COMMENT 'gross, in cents',
    `_peerdb_synced_at` DateTime64(9) DEFAULT now64(),
    `_peerdb_is_deleted` Int8,
    `_peerdb_version` Int64,
    INDEX idx_user user_id TYPE bloom_filter GRANULARITY 4
)
ENGINE = ReplacingMergeTree(_peerdb_version, _peerdb_is_deleted)
PARTITION BY toYYYYMM(_peerdb_synced_at)
PRIMARY KEY id
ORDER BY id
TTL toDateTime(_peerdb_synced_at) + toIntervalDay(90)
SETTINGS index_granularity = 8192
COMMENT 'synced by PeerDB';"#;

        let schema = parse(sql);
        assert_eq!(
            schema.table,
            Some(TableIdentifier::new(Some("analytics".to_string()), "events"))
        );
        assert_eq!(schema.columns.len(), 7);
        assert_eq!(schema.primary_key, vec!["id"]);
        assert_eq!(schema.order_by, vec!["id"]);
        assert_eq!(schema.settings.get("index_granularity").map(String::as_str), Some("8192"));

        let amount = schema.column("amount").unwrap();
        assert_eq!(amount.source_type, "Decimal(18, 4)");
        assert_eq!(amount.mapped_runtime_type, RuntimeType::Unmapped);
        assert_eq!(amount.target_field_type_expression, "Any");

        let tags = schema.column("tags").unwrap();
        assert_eq!(
            tags.target_storage_type_expression,
            "types.Array(types.LowCardinality(types.String))"
        );
    }

    #[test]
    fn test_array_and_map_literals_in_column_options() {
        let schema = parse(
            "CREATE TABLE t (id UInt64, tags Array(String) DEFAULT ['a', 'b']) ENGINE = MergeTree ORDER BY id",
        );
        assert_eq!(schema.columns.len(), 2);
        assert_eq!(schema.column("tags").unwrap().source_type, "Array(String)");
        assert_eq!(schema.order_by, vec!["id"]);

        let schema = parse(
            "CREATE TABLE t (id UInt64, m Map(String, UInt8) DEFAULT {'a': 1, 'b': 2}, n Int32) ENGINE = MergeTree ORDER BY id",
        );
        let names: Vec<&str> = schema.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "m", "n"]);
    }

    #[test]
    fn test_array_literals_in_clauses() {
        let schema = parse(
            "CREATE TABLE t (id UInt64, ts DateTime, tags Array(UInt8) DEFAULT [1, 2] CODEC(ZSTD(1)), \
             INDEX idx tags TYPE set(0) GRANULARITY 1) ENGINE = MergeTree \
             TTL ts + toIntervalDay(arrayMax([1, 2])) ORDER BY (id, ts)",
        );
        assert_eq!(schema.columns.len(), 3);
        assert_eq!(schema.order_by, vec!["id", "ts"]);
    }

    #[test]
    fn test_statement_head_variants() {
        let schema = parse(
            "create or replace table if not exists `db`.`my table` on cluster '{cluster}' (`id` UInt64) engine MergeTree order by id",
        );
        assert_eq!(
            schema.table,
            Some(TableIdentifier::new(Some("db".to_string()), "my table"))
        );
        assert_eq!(schema.engine.as_deref(), Some("MergeTree"));
        assert_eq!(schema.order_by, vec!["id"]);
    }

    #[test]
    fn test_column_level_and_body_primary_keys() {
        let schema = parse("CREATE TABLE t (id UInt64 PRIMARY KEY, name String)");
        assert_eq!(schema.primary_key, vec!["id"]);
        assert!(schema.column("id").unwrap().is_primary_key);

        let schema = parse("CREATE TABLE t (id UInt64, name String, PRIMARY KEY (id, name))");
        assert_eq!(schema.primary_key, vec!["id", "name"]);
        assert_eq!(schema.columns.len(), 2);
    }

    #[test]
    fn test_leading_underscores_are_kept() {
        let schema = parse("CREATE TABLE t (_peerdb_version Int64, __x String)");
        assert_eq!(schema.columns[0].name, "_peerdb_version");
        assert_eq!(schema.columns[1].name, "__x");
    }

    #[test]
    fn test_quoted_column_names_with_special_characters() {
        let schema = parse("CREATE TABLE t (`nullable(datetime)` Nullable(DateTime))");
        let column = &schema.columns[0];
        assert_eq!(column.name, "nullable(datetime)");
        assert!(column.is_nullable);
    }

    #[test]
    fn test_rejects_other_statements() {
        assert!(matches!(
            parse_create_table_statement("CREATE VIEW v AS SELECT 1"),
            Err(ParseError::UnexpectedToken { .. })
        ));
        assert!(parse_create_table_statement("SELECT * FROM t").is_err());
        assert!(parse_create_table_statement("").is_err());
    }

    #[test]
    fn test_rejects_multiple_statements() {
        assert_eq!(
            parse_create_table_statement("CREATE TABLE a (id UInt64); CREATE TABLE b (id UInt64)"),
            Err(ParseError::MultipleStatements)
        );
        assert!(parse_create_table_statement("CREATE TABLE a (id UInt64);").is_ok());
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert!(matches!(
            parse_create_table_statement("CREATE TABLE t (id UInt64"),
            Err(ParseError::UnexpectedEOF { .. })
        ));
        assert!(matches!(
            parse_create_table_statement("CREATE TABLE t (name 'unterminated)"),
            Err(ParseError::Tokenizer(_))
        ));
        assert_eq!(
            parse_create_table_statement("CREATE TABLE t (id DEFAULT 1)"),
            Err(ParseError::MissingColumnType {
                column: "id".to_string()
            })
        );
    }
}
