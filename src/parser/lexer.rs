//! Tokenizer for YANG source text.
//!
//! Produces span-based tokens; argument text is sliced from the source and
//! unquoted by the parser.

use logos::Logos;
use std::ops::Range;

use crate::base::{TextRange, TextSize};

/// Raw lexemes. A lone `+` is lexed as unquoted text and told apart
/// afterwards, so no two patterns compete for the same input.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
enum Lexeme {
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(";")]
    Semicolon,
    #[regex(r#""([^"\\]|\\[\s\S])*""#)]
    DoubleQuoted,
    #[regex(r"'[^']*'")]
    SingleQuoted,
    #[regex(r#"[^ \t\r\n;{}"']+"#)]
    Unquoted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    LBrace,
    RBrace,
    Semicolon,
    Plus,
    DoubleQuoted,
    SingleQuoted,
    Unquoted,
}

impl TokenKind {
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Semicolon => "';'",
            TokenKind::Plus => "'+'",
            TokenKind::DoubleQuoted | TokenKind::SingleQuoted => "quoted string",
            TokenKind::Unquoted => "string",
        }
    }

    #[inline]
    pub fn is_string(self) -> bool {
        matches!(
            self,
            TokenKind::DoubleQuoted | TokenKind::SingleQuoted | TokenKind::Unquoted
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: TextRange,
}

fn to_text_range(range: Range<usize>) -> TextRange {
    TextRange::new(
        TextSize::from(range.start as u32),
        TextSize::from(range.end as u32),
    )
}

/// Tokenizes `text`. On the first unrecognized input (typically an
/// unterminated string) returns the offending range.
pub fn lex(text: &str) -> Result<Vec<Token>, TextRange> {
    let mut tokens = Vec::new();
    let mut lexer = Lexeme::lexer(text);
    while let Some(result) = lexer.next() {
        let Ok(lexeme) = result else {
            return Err(to_text_range(lexer.span()));
        };
        let kind = match lexeme {
            Lexeme::LBrace => TokenKind::LBrace,
            Lexeme::RBrace => TokenKind::RBrace,
            Lexeme::Semicolon => TokenKind::Semicolon,
            Lexeme::DoubleQuoted => TokenKind::DoubleQuoted,
            Lexeme::SingleQuoted => TokenKind::SingleQuoted,
            Lexeme::Unquoted if lexer.slice() == "+" => TokenKind::Plus,
            Lexeme::Unquoted => TokenKind::Unquoted,
        };
        tokens.push(Token {
            kind,
            span: to_text_range(lexer.span()),
        });
    }
    Ok(tokens)
}

/// Text slice for a token.
#[inline]
pub fn token_text<'a>(text: &'a str, token: &Token) -> &'a str {
    &text[Range::<usize>::from(token.span)]
}
