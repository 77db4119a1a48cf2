//! ---
//! lat_section: "01-graph-kernel"
//! lat_subsection: "module"
//! lat_type: "source"
//! lat_scope: "code"
//! lat_description: "Recursive-descent parser for the fixture statement dialect."
//! lat_version: "v0.1.0"
//! lat_owner: "tbd"
//! ---
//! The dialect covers what fixtures need: `CREATE` over node and relationship
//! path patterns, `MATCH ... RETURN` with label and property filters, and
//! `CALL` for registered procedures. Property values accept literals, lists,
//! and registered function invocations.

use indexmap::IndexMap;

use crate::lexer::{Lexer, Token, TokenKind};
use crate::value::Value;
use crate::{GraphError, Result};

/// One parsed statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `CREATE <path> (, <path>)*`
    Create(Vec<PathPattern>),
    /// `MATCH <node> RETURN <clause>`
    Match {
        /// Node filter pattern.
        pattern: NodePattern,
        /// Projection over the matched rows.
        ret: ReturnClause,
    },
    /// `CALL name(args...)`
    Call {
        /// Dotted procedure name.
        name: String,
        /// Argument expressions.
        args: Vec<Expr>,
    },
}

/// A node pattern with optional alias, labels, and property filters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodePattern {
    /// Alias binding the node within the statement.
    pub alias: Option<String>,
    /// Labels in declaration order.
    pub labels: Vec<String>,
    /// Property expressions in declaration order.
    pub properties: IndexMap<String, Expr>,
}

/// A relationship pattern between two node patterns.
#[derive(Debug, Clone, PartialEq)]
pub struct RelPattern {
    /// Relationship type.
    pub rel_type: String,
    /// Property expressions in declaration order.
    pub properties: IndexMap<String, Expr>,
}

/// A path: a start node followed by relationship segments.
#[derive(Debug, Clone, PartialEq)]
pub struct PathPattern {
    /// First node of the path.
    pub start: NodePattern,
    /// `-[:TYPE {..}]->(node)` continuations.
    pub segments: Vec<(RelPattern, NodePattern)>,
}

/// Projection of a `MATCH` statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnClause {
    /// `RETURN alias` — the matched nodes themselves.
    Alias(String),
    /// `RETURN func(alias)` or `RETURN func(alias.prop)` — `count` or a
    /// registered aggregation over a property column.
    Aggregate {
        /// Aggregation name (`count` is built in).
        func: String,
        /// Alias the aggregation ranges over.
        alias: String,
        /// Property projected per row, when present.
        property: Option<String>,
    },
}

/// Expression in a property map or argument list.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value, including lists of expressions.
    Literal(Value),
    /// List literal with possibly non-literal elements.
    List(Vec<Expr>),
    /// Invocation of a registered user function.
    FnCall {
        /// Dotted function name.
        name: String,
        /// Argument expressions.
        args: Vec<Expr>,
    },
}

/// Parse a statement text into its component statements.
///
/// Statements are separated by `;`; a trailing separator is allowed. `//`
/// comments and blank statements are ignored.
pub fn parse_statements(source: &str) -> Result<Vec<Statement>> {
    let tokens = Lexer::tokenize(source)?;
    Parser::new(tokens).parse()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn parse(mut self) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();
        loop {
            while self.peek_kind() == &TokenKind::Semicolon {
                self.advance();
            }
            if self.peek_kind() == &TokenKind::Eof {
                return Ok(statements);
            }
            statements.push(self.parse_statement()?);
            match self.peek_kind() {
                TokenKind::Semicolon => {
                    self.advance();
                }
                TokenKind::Eof => return Ok(statements),
                _ => return Err(self.error("expected `;` between statements")),
            }
        }
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        let keyword = self.expect_ident("expected CREATE, MATCH, or CALL")?;
        if keyword.eq_ignore_ascii_case("create") {
            self.parse_create()
        } else if keyword.eq_ignore_ascii_case("match") {
            self.parse_match()
        } else if keyword.eq_ignore_ascii_case("call") {
            self.parse_call()
        } else {
            Err(self.error_at_previous(&format!("unsupported statement keyword `{keyword}`")))
        }
    }

    fn parse_create(&mut self) -> Result<Statement> {
        let mut paths = vec![self.parse_path()?];
        while self.peek_kind() == &TokenKind::Comma {
            self.advance();
            paths.push(self.parse_path()?);
        }
        Ok(Statement::Create(paths))
    }

    fn parse_path(&mut self) -> Result<PathPattern> {
        let start = self.parse_node_pattern()?;
        let mut segments = Vec::new();
        while self.peek_kind() == &TokenKind::Dash {
            self.advance();
            self.expect(TokenKind::LBracket, "expected `[` after `-`")?;
            self.expect(TokenKind::Colon, "expected `:` before relationship type")?;
            let rel_type = self.expect_ident("expected relationship type")?;
            let properties = if self.peek_kind() == &TokenKind::LBrace {
                self.parse_property_map()?
            } else {
                IndexMap::new()
            };
            self.expect(TokenKind::RBracket, "expected `]` after relationship")?;
            self.expect(TokenKind::Arrow, "expected `->` after relationship")?;
            let end = self.parse_node_pattern()?;
            segments.push((
                RelPattern {
                    rel_type,
                    properties,
                },
                end,
            ));
        }
        Ok(PathPattern { start, segments })
    }

    fn parse_node_pattern(&mut self) -> Result<NodePattern> {
        self.expect(TokenKind::LParen, "expected `(` to open a node pattern")?;
        let mut pattern = NodePattern::default();
        if self.peek_kind() == &TokenKind::Ident {
            pattern.alias = Some(self.advance().text);
        }
        while self.peek_kind() == &TokenKind::Colon {
            self.advance();
            pattern.labels.push(self.expect_ident("expected label name")?);
        }
        if self.peek_kind() == &TokenKind::LBrace {
            pattern.properties = self.parse_property_map()?;
        }
        self.expect(TokenKind::RParen, "expected `)` to close a node pattern")?;
        Ok(pattern)
    }

    fn parse_property_map(&mut self) -> Result<IndexMap<String, Expr>> {
        self.expect(TokenKind::LBrace, "expected `{` to open a property map")?;
        let mut properties = IndexMap::new();
        if self.peek_kind() != &TokenKind::RBrace {
            loop {
                let key = self.expect_ident("expected property key")?;
                self.expect(TokenKind::Colon, "expected `:` after property key")?;
                let value = self.parse_expr()?;
                // Last write wins for duplicate keys, like repeated
                // configuration of the same setting.
                properties.insert(key, value);
                if self.peek_kind() == &TokenKind::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RBrace, "expected `}` to close a property map")?;
        Ok(properties)
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        match self.peek_kind() {
            TokenKind::Str => Ok(Expr::Literal(Value::Str(self.advance().text))),
            TokenKind::Int => {
                let token = self.advance();
                let parsed = token.text.parse::<i64>().map_err(|_| GraphError::Parse {
                    line: token.line,
                    column: token.column,
                    message: format!("integer literal `{}` out of range", token.text),
                })?;
                Ok(Expr::Literal(Value::Int(parsed)))
            }
            TokenKind::Float => {
                let token = self.advance();
                let parsed = token.text.parse::<f64>().map_err(|_| GraphError::Parse {
                    line: token.line,
                    column: token.column,
                    message: format!("float literal `{}` is malformed", token.text),
                })?;
                Ok(Expr::Literal(Value::Float(parsed)))
            }
            TokenKind::Dash => {
                self.advance();
                match self.parse_expr()? {
                    Expr::Literal(Value::Int(v)) => Ok(Expr::Literal(Value::Int(-v))),
                    Expr::Literal(Value::Float(v)) => Ok(Expr::Literal(Value::Float(-v))),
                    _ => Err(self.error_at_previous("`-` applies only to numeric literals")),
                }
            }
            TokenKind::LBracket => {
                self.advance();
                let mut items = Vec::new();
                if self.peek_kind() != &TokenKind::RBracket {
                    loop {
                        items.push(self.parse_expr()?);
                        if self.peek_kind() == &TokenKind::Comma {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RBracket, "expected `]` to close a list")?;
                Ok(Expr::List(items))
            }
            TokenKind::Ident => {
                let word = self.advance().text;
                if word.eq_ignore_ascii_case("true") {
                    return Ok(Expr::Literal(Value::Bool(true)));
                }
                if word.eq_ignore_ascii_case("false") {
                    return Ok(Expr::Literal(Value::Bool(false)));
                }
                if word.eq_ignore_ascii_case("null") {
                    return Ok(Expr::Literal(Value::Null));
                }
                let name = self.parse_qualified_tail(word)?;
                self.expect(TokenKind::LParen, "expected `(` after function name")?;
                let args = self.parse_arguments()?;
                Ok(Expr::FnCall { name, args })
            }
            _ => Err(self.error("expected a literal, list, or function call")),
        }
    }

    fn parse_match(&mut self) -> Result<Statement> {
        let pattern = self.parse_node_pattern()?;
        let keyword = self.expect_ident("expected RETURN after MATCH pattern")?;
        if !keyword.eq_ignore_ascii_case("return") {
            return Err(self.error_at_previous("expected RETURN after MATCH pattern"));
        }
        let first = self.expect_ident("expected alias or aggregation in RETURN")?;
        if self.peek_kind() != &TokenKind::LParen && self.peek_kind() != &TokenKind::Dot {
            return Ok(Statement::Match {
                pattern,
                ret: ReturnClause::Alias(first),
            });
        }
        let func = self.parse_qualified_tail(first)?;
        self.expect(TokenKind::LParen, "expected `(` after aggregation name")?;
        let alias = self.expect_ident("expected alias inside aggregation")?;
        let property = if self.peek_kind() == &TokenKind::Dot {
            self.advance();
            Some(self.expect_ident("expected property after `.`")?)
        } else {
            None
        };
        self.expect(TokenKind::RParen, "expected `)` to close aggregation")?;
        Ok(Statement::Match {
            pattern,
            ret: ReturnClause::Aggregate {
                func,
                alias,
                property,
            },
        })
    }

    fn parse_call(&mut self) -> Result<Statement> {
        let first = self.expect_ident("expected procedure name after CALL")?;
        let name = self.parse_qualified_tail(first)?;
        self.expect(TokenKind::LParen, "expected `(` after procedure name")?;
        let args = self.parse_arguments()?;
        Ok(Statement::Call { name, args })
    }

    /// Consume `.ident` continuations of a dotted name.
    fn parse_qualified_tail(&mut self, first: String) -> Result<String> {
        let mut name = first;
        while self.peek_kind() == &TokenKind::Dot {
            self.advance();
            name.push('.');
            name.push_str(&self.expect_ident("expected identifier after `.`")?);
        }
        Ok(name)
    }

    /// Parse a parenthesized argument list; the opening `(` is consumed.
    fn parse_arguments(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        if self.peek_kind() != &TokenKind::RParen {
            loop {
                args.push(self.parse_expr()?);
                if self.peek_kind() == &TokenKind::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "expected `)` to close argument list")?;
        Ok(args)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<Token> {
        if self.peek_kind() == &kind {
            Ok(self.advance())
        } else {
            Err(self.error(message))
        }
    }

    fn expect_ident(&mut self, message: &str) -> Result<String> {
        self.expect(TokenKind::Ident, message).map(|t| t.text)
    }

    fn error(&self, message: &str) -> GraphError {
        let token = self.peek();
        GraphError::Parse {
            line: token.line,
            column: token.column,
            message: message.to_owned(),
        }
    }

    fn error_at_previous(&self, message: &str) -> GraphError {
        let token = &self.tokens[self.pos.saturating_sub(1)];
        GraphError::Parse {
            line: token.line,
            column: token.column,
            message: message.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_create_with_relationship_path() {
        let statements =
            parse_statements("CREATE (a:Person {name: 'Ada'})-[:KNOWS {since: 1840}]->(b:Person)")
                .unwrap();
        assert_eq!(statements.len(), 1);
        let Statement::Create(paths) = &statements[0] else {
            panic!("expected CREATE");
        };
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].start.alias.as_deref(), Some("a"));
        assert_eq!(paths[0].segments.len(), 1);
        assert_eq!(paths[0].segments[0].0.rel_type, "KNOWS");
        assert_eq!(paths[0].segments[0].1.labels, vec!["Person".to_owned()]);
    }

    #[test]
    fn parses_multiple_statements_and_trailing_semicolon() {
        let statements =
            parse_statements("CREATE (:A); MATCH (n:A) RETURN n; CALL db.ping();").unwrap();
        assert_eq!(statements.len(), 3);
    }

    #[test]
    fn parses_count_aggregate() {
        let statements = parse_statements("MATCH (n:Person) RETURN count(n)").unwrap();
        let Statement::Match { ret, .. } = &statements[0] else {
            panic!("expected MATCH");
        };
        assert_eq!(
            ret,
            &ReturnClause::Aggregate {
                func: "count".to_owned(),
                alias: "n".to_owned(),
                property: None,
            }
        );
    }

    #[test]
    fn parses_aggregate_over_property() {
        let statements = parse_statements("MATCH (n:Person) RETURN stats.sum(n.age)").unwrap();
        let Statement::Match { ret, .. } = &statements[0] else {
            panic!("expected MATCH");
        };
        assert_eq!(
            ret,
            &ReturnClause::Aggregate {
                func: "stats.sum".to_owned(),
                alias: "n".to_owned(),
                property: Some("age".to_owned()),
            }
        );
    }

    #[test]
    fn parses_function_calls_in_property_values() {
        let statements = parse_statements("CREATE (n:X {name: text.upper('ada'), age: -3})")
            .unwrap();
        let Statement::Create(paths) = &statements[0] else {
            panic!("expected CREATE");
        };
        let props = &paths[0].start.properties;
        assert!(matches!(props["name"], Expr::FnCall { .. }));
        assert_eq!(props["age"], Expr::Literal(Value::Int(-3)));
    }

    #[test]
    fn parses_call_with_arguments() {
        let statements = parse_statements("CALL seed.people('ada', 'bob', 2)").unwrap();
        let Statement::Call { name, args } = &statements[0] else {
            panic!("expected CALL");
        };
        assert_eq!(name, "seed.people");
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn rejects_unknown_keyword() {
        let err = parse_statements("DROP (n)").unwrap_err();
        assert!(matches!(err, GraphError::Parse { .. }));
        assert!(format!("{err}").contains("DROP"));
    }

    #[test]
    fn rejects_missing_separator() {
        let err = parse_statements("CREATE (:A) CREATE (:B)").unwrap_err();
        assert!(format!("{err}").contains("expected `;`"));
    }
}
