//! ---
//! lat_section: "01-graph-kernel"
//! lat_subsection: "module"
//! lat_type: "source"
//! lat_scope: "code"
//! lat_description: "Tokenizer for the fixture statement dialect."
//! lat_version: "v0.1.0"
//! lat_owner: "tbd"
//! ---
use crate::{GraphError, Result};

/// Kind of a lexed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Bare identifier or keyword (keywords are resolved by the parser).
    Ident,
    /// Quoted string literal, unescaped.
    Str,
    /// Integer literal.
    Int,
    /// Float literal.
    Float,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `;`
    Semicolon,
    /// `-`
    Dash,
    /// `->`
    Arrow,
    /// End of input.
    Eof,
}

/// A token with its source text and 1-based position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Token kind.
    pub kind: TokenKind,
    /// Source text (unescaped for string literals).
    pub text: String,
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub column: u32,
}

/// Statement tokenizer tracking line and column for error reporting.
pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over the given statement text.
    pub fn new(source: &'a str) -> Self {
        Self {
            src: source.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire input, ending with an [`TokenKind::Eof`] token.
    pub fn tokenize(source: &str) -> Result<Vec<Token>> {
        // Not `Self::new`: that would pin the borrow to the impl lifetime.
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace_and_comments();

        let line = self.line;
        let column = self.column;
        let Some(ch) = self.peek() else {
            return Ok(self.token(TokenKind::Eof, String::new(), line, column));
        };

        match ch {
            b'\'' | b'"' => self.lex_string(ch, line, column),
            b'0'..=b'9' => self.lex_number(line, column),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.lex_ident(line, column),
            b'(' => self.punct(TokenKind::LParen, "(", line, column),
            b')' => self.punct(TokenKind::RParen, ")", line, column),
            b'{' => self.punct(TokenKind::LBrace, "{", line, column),
            b'}' => self.punct(TokenKind::RBrace, "}", line, column),
            b'[' => self.punct(TokenKind::LBracket, "[", line, column),
            b']' => self.punct(TokenKind::RBracket, "]", line, column),
            b':' => self.punct(TokenKind::Colon, ":", line, column),
            b',' => self.punct(TokenKind::Comma, ",", line, column),
            b'.' => self.punct(TokenKind::Dot, ".", line, column),
            b';' => self.punct(TokenKind::Semicolon, ";", line, column),
            b'-' => {
                self.advance();
                if self.peek() == Some(b'>') {
                    self.advance();
                    Ok(self.token(TokenKind::Arrow, "->".to_owned(), line, column))
                } else {
                    Ok(self.token(TokenKind::Dash, "-".to_owned(), line, column))
                }
            }
            other => Err(GraphError::Parse {
                line,
                column,
                message: format!("unexpected character `{}`", other as char),
            }),
        }
    }

    fn punct(&mut self, kind: TokenKind, text: &str, line: u32, column: u32) -> Result<Token> {
        self.advance();
        Ok(self.token(kind, text.to_owned(), line, column))
    }

    fn lex_string(&mut self, quote: u8, line: u32, column: u32) -> Result<Token> {
        self.advance();
        let mut text = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(GraphError::Parse {
                        line,
                        column,
                        message: "unterminated string literal".to_owned(),
                    })
                }
                Some(b'\\') => {
                    self.advance();
                    let escaped = self.peek().ok_or(GraphError::Parse {
                        line,
                        column,
                        message: "unterminated escape sequence".to_owned(),
                    })?;
                    text.push(match escaped {
                        b'n' => '\n',
                        b't' => '\t',
                        b'\\' => '\\',
                        b'\'' => '\'',
                        b'"' => '"',
                        other => other as char,
                    });
                    self.advance();
                }
                Some(ch) if ch == quote => {
                    self.advance();
                    return Ok(self.token(TokenKind::Str, text, line, column));
                }
                Some(_) => {
                    let start = self.pos;
                    while let Some(ch) = self.peek() {
                        if ch == quote || ch == b'\\' {
                            break;
                        }
                        self.advance();
                    }
                    text.push_str(std::str::from_utf8(&self.src[start..self.pos]).map_err(
                        |_| GraphError::Parse {
                            line,
                            column,
                            message: "invalid utf-8 in string literal".to_owned(),
                        },
                    )?);
                }
            }
        }
    }

    fn lex_number(&mut self, line: u32, column: u32) -> Result<Token> {
        let start = self.pos;
        let mut is_float = false;
        while let Some(ch) = self.peek() {
            match ch {
                b'0'..=b'9' => self.advance(),
                // A dot is part of the number only when a digit follows, so
                // `1.member` style access stays lexable.
                b'.' if !is_float && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                    is_float = true;
                    self.advance();
                }
                _ => break,
            }
        }
        let text = std::str::from_utf8(&self.src[start..self.pos])
            .expect("number spans are ascii")
            .to_owned();
        let kind = if is_float {
            TokenKind::Float
        } else {
            TokenKind::Int
        };
        Ok(self.token(kind, text, line, column))
    }

    fn lex_ident(&mut self, line: u32, column: u32) -> Result<Token> {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == b'_' {
                self.advance();
            } else {
                break;
            }
        }
        let text = std::str::from_utf8(&self.src[start..self.pos])
            .expect("identifier spans are ascii")
            .to_owned();
        Ok(self.token(TokenKind::Ident, text, line, column))
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => self.advance(),
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while let Some(ch) = self.peek() {
                        if ch == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => return,
            }
        }
    }

    fn token(&self, kind: TokenKind, text: String, line: u32, column: u32) -> Token {
        Token {
            kind,
            text,
            line,
            column,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.peek() {
            self.pos += 1;
            if ch == b'\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }
}
