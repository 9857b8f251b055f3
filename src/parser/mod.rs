//! Statement-level parser for YANG sources.
//!
//! The reactor only needs the generic statement structure
//! (`keyword [argument] (";" | "{" statement* "}")`), so that is what this
//! module produces: a [`RawStatement`] tree per source with arguments
//! already unquoted and concatenated.

mod lexer;

use std::sync::Arc;

use rayon::prelude::*;
use smol_str::SmolStr;
use thiserror::Error;

use crate::base::{LineCol, LineIndex, StatementRef, TextRange};
pub use lexer::{Token, TokenKind};
use lexer::{lex, token_text};

/// One statement as written in the source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawStatement {
    /// Keyword, possibly `prefix:name` for extension instances.
    pub keyword: SmolStr,
    /// Unquoted argument text.
    pub argument: Option<SmolStr>,
    pub reference: StatementRef,
    pub children: Vec<RawStatement>,
}

impl RawStatement {
    /// First child with the given keyword.
    pub fn child(&self, keyword: &str) -> Option<&RawStatement> {
        self.children.iter().find(|c| c.keyword == keyword)
    }

    /// Argument of the first child with the given keyword.
    pub fn child_argument(&self, keyword: &str) -> Option<&str> {
        self.child(keyword).and_then(|c| c.argument.as_deref())
    }

    pub fn children_named<'a>(&'a self, keyword: &'a str) -> impl Iterator<Item = &'a RawStatement> + 'a {
        self.children.iter().filter(move |c| c.keyword == keyword)
    }
}

/// Malformed source text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{source_name}:{position}: {message}")]
pub struct SyntaxError {
    pub source_name: Arc<str>,
    pub position: LineCol,
    pub message: String,
}

/// Parses one source into its single top-level `module` or `submodule`
/// statement.
pub fn parse(source_name: &str, text: &str) -> Result<RawStatement, SyntaxError> {
    let source_name: Arc<str> = Arc::from(source_name);
    let index = LineIndex::new(text);
    let tokens = lex(text).map_err(|range| SyntaxError {
        source_name: source_name.clone(),
        position: index.start_of(range),
        message: "unterminated or invalid string".to_string(),
    })?;

    let mut parser = Parser {
        source_name,
        text,
        index: &index,
        tokens: &tokens,
        pos: 0,
    };
    let root = parser.statement()?;
    if let Some(token) = parser.peek() {
        return Err(parser.error_at(token.span, "unexpected content after the top-level statement"));
    }
    if root.keyword != "module" && root.keyword != "submodule" {
        return Err(SyntaxError {
            source_name: parser.source_name.clone(),
            position: root.reference.position,
            message: format!("expected 'module' or 'submodule', found '{}'", root.keyword),
        });
    }
    Ok(root)
}

/// Parses many sources in parallel. Results keep the input order.
pub fn parse_all<S: AsRef<str> + Sync>(
    inputs: &[(S, S)],
) -> Vec<Result<RawStatement, SyntaxError>> {
    inputs
        .par_iter()
        .map(|(name, text)| parse(name.as_ref(), text.as_ref()))
        .collect()
}

struct Parser<'a> {
    source_name: Arc<str>,
    text: &'a str,
    index: &'a LineIndex,
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    fn error_at(&self, range: TextRange, message: impl Into<String>) -> SyntaxError {
        SyntaxError {
            source_name: self.source_name.clone(),
            position: self.index.start_of(range),
            message: message.into(),
        }
    }

    fn eof_error(&self, expected: &str) -> SyntaxError {
        let end = TextRange::empty((self.text.len() as u32).into());
        self.error_at(end, format!("unexpected end of input, expected {expected}"))
    }

    fn statement(&mut self) -> Result<RawStatement, SyntaxError> {
        let keyword_token = self.bump().ok_or_else(|| self.eof_error("a statement"))?;
        if keyword_token.kind != TokenKind::Unquoted {
            return Err(self.error_at(
                keyword_token.span,
                format!("expected a statement keyword, found {}", keyword_token.kind.describe()),
            ));
        }
        let keyword = SmolStr::new(token_text(self.text, &keyword_token));
        if !is_keyword(&keyword) {
            return Err(self.error_at(keyword_token.span, format!("invalid keyword '{keyword}'")));
        }

        let argument = match self.peek() {
            Some(token) if token.kind.is_string() => Some(self.argument()?),
            _ => None,
        };

        let mut children = Vec::new();
        let terminator = self.bump().ok_or_else(|| self.eof_error("';' or '{'"))?;
        let end = match terminator.kind {
            TokenKind::Semicolon => terminator.span.end(),
            TokenKind::LBrace => loop {
                match self.peek() {
                    Some(token) if token.kind == TokenKind::RBrace => {
                        self.pos += 1;
                        break token.span.end();
                    }
                    Some(_) => children.push(self.statement()?),
                    None => return Err(self.eof_error("'}'")),
                }
            },
            other => {
                return Err(self.error_at(
                    terminator.span,
                    format!("expected ';' or '{{', found {}", other.describe()),
                ));
            }
        };

        let range = TextRange::new(keyword_token.span.start(), end);
        Ok(RawStatement {
            keyword,
            argument,
            reference: StatementRef::new(self.source_name.clone(), range, self.index.start_of(range)),
            children,
        })
    }

    /// An argument: one unquoted string, or quoted strings joined by `+`.
    fn argument(&mut self) -> Result<SmolStr, SyntaxError> {
        let Some(first) = self.bump() else {
            return Err(self.eof_error("an argument"));
        };
        if first.kind == TokenKind::Unquoted {
            return Ok(SmolStr::new(token_text(self.text, &first)));
        }

        let mut value = self.quoted(first);
        while self.peek().map(|t| t.kind) == Some(TokenKind::Plus) {
            self.pos += 1;
            match self.bump() {
                Some(next) if matches!(next.kind, TokenKind::DoubleQuoted | TokenKind::SingleQuoted) => {
                    value.push_str(&self.quoted(next));
                }
                Some(next) => {
                    return Err(self.error_at(next.span, "expected a quoted string after '+'"));
                }
                None => return Err(self.eof_error("a quoted string")),
            }
        }
        Ok(SmolStr::new(value))
    }

    fn quoted(&self, token: Token) -> String {
        let raw = token_text(self.text, &token);
        let inner = &raw[1..raw.len() - 1];
        match token.kind {
            TokenKind::DoubleQuoted => {
                let indent = self.index.column(token.span.start()) as usize + 1;
                unescape(&trim_lines(inner, indent))
            }
            _ => inner.to_string(),
        }
    }
}

/// YANG keyword: identifier, or `prefix:identifier` for extensions.
fn is_keyword(text: &str) -> bool {
    let mut parts = text.splitn(2, ':');
    let first = parts.next().unwrap_or_default();
    is_identifier(first) && parts.next().is_none_or(is_identifier)
}

pub(crate) fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Line handling inside double-quoted strings: trailing whitespace before a
/// line break is dropped, and continuation lines lose leading whitespace up
/// to the column just after the opening quote (a tab counts as 8 columns).
fn trim_lines(inner: &str, indent: usize) -> String {
    let lines: Vec<&str> = inner.split('\n').collect();
    let last = lines.len() - 1;
    let mut out = String::with_capacity(inner.len());
    for (i, line) in lines.into_iter().enumerate() {
        let mut line = line;
        if i > 0 {
            out.push('\n');
            let mut column = 0;
            let mut cut = 0;
            for (offset, c) in line.char_indices() {
                let width = match c {
                    ' ' => 1,
                    '\t' => 8,
                    _ => break,
                };
                if column + width > indent {
                    break;
                }
                column += width;
                cut = offset + c.len_utf8();
            }
            line = &line[cut..];
        }
        if i == last {
            out.push_str(line);
        } else {
            out.push_str(line.trim_end_matches([' ', '\t', '\r']));
        }
    }
    out
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_module_tree() {
        let text = "module foo {\n  namespace \"urn:foo\";\n  prefix f;\n  container top { leaf x { type string; } }\n}\n";
        let root = parse("foo.yang", text).unwrap();

        assert_eq!(root.keyword, "module");
        assert_eq!(root.argument.as_deref(), Some("foo"));
        assert_eq!(root.child_argument("namespace"), Some("urn:foo"));
        let top = root.child("container").unwrap();
        assert_eq!(top.reference.position, LineCol::new(3, 2));
        assert_eq!(top.children[0].child_argument("type"), Some("string"));
    }

    #[test]
    fn test_parse_concatenation_and_escapes() {
        let root = parse(
            "a.yang",
            r#"module a { description "x\ty \"q\"" + 'raw\n'; }"#,
        )
        .unwrap();
        assert_eq!(root.child_argument("description"), Some("x\ty \"q\"raw\\n"));
    }

    #[test]
    fn test_parse_trims_continuation_indentation() {
        let text = "module a {\n  description \"first  \n                second\";\n}";
        let root = parse("a.yang", text).unwrap();
        assert_eq!(root.child_argument("description"), Some("first\n second"));
    }

    #[test]
    fn test_parse_extension_keyword() {
        let root = parse("a.yang", "module a { ext:marker \"v\"; }").unwrap();
        assert_eq!(root.children[0].keyword, "ext:marker");
    }

    #[test]
    fn test_parse_errors_are_localized() {
        let err = parse("bad.yang", "module a {\n  leaf x {\n}").unwrap_err();
        assert_eq!(&*err.source_name, "bad.yang");
        assert!(err.message.contains("end of input"));

        let err = parse("bad.yang", "module a { leaf x }").unwrap_err();
        assert!(err.message.contains("expected ';' or '{'"));

        let err = parse("bad.yang", "container a;").unwrap_err();
        assert!(err.message.contains("expected 'module' or 'submodule'"));

        let err = parse("bad.yang", "module a { } module b { }").unwrap_err();
        assert!(err.message.contains("after the top-level statement"));
    }

    #[test]
    fn test_parse_all_keeps_order() {
        let inputs = [
            ("a.yang", "module a { prefix a; }"),
            ("b.yang", "module b {"),
            ("c.yang", "submodule c { belongs-to a { prefix a; } }"),
        ];
        let results = parse_all(&inputs);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().keyword, "submodule");
    }
}
