use std::{iter::Peekable, str::Chars, sync::Arc};

use crate::{
    diagnostics::{Diagnostic, SourcePosition},
    token::{self, Token, TokenKind},
};

/// Lazy tokenizer over a borrowed source text.
///
/// Tokens are produced one at a time by [`Lexer::next_token`]. Once the input
/// is exhausted every further call yields an `EndOfFile` token at the final
/// position.
pub struct Lexer<'a> {
    source_name: Arc<str>,
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source_name: impl Into<Arc<str>>, source: &'a str) -> Self {
        Self {
            source_name: source_name.into(),
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn position(&self) -> SourcePosition {
        SourcePosition {
            source_name: Arc::clone(&self.source_name),
            line: self.line,
            column: self.column,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    /// Consumes one character. The line only advances when that character
    /// was a newline, so a newline reports its own starting position.
    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn collect_while<F>(&mut self, text: &mut String, mut predicate: F)
    where
        F: FnMut(char) -> bool,
    {
        while let Some(ch) = self.peek() {
            if !predicate(ch) {
                break;
            }
            text.push(ch);
            self.bump();
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' || !ch.is_whitespace() {
                break;
            }
            self.bump();
        }
    }

    fn identifier_or_keyword(&mut self, position: SourcePosition) -> Token {
        let mut text = String::new();
        self.collect_while(&mut text, |ch| ch.is_alphanumeric() || ch == '_');
        let kind = token::keyword(&text).unwrap_or(TokenKind::Identifier);
        Token::new(kind, text, position)
    }

    fn number_literal(&mut self, position: SourcePosition) -> Token {
        let mut text = String::new();
        let mut seen_dot = false;
        self.collect_while(&mut text, |ch| match ch {
            '0'..='9' => true,
            '.' if !seen_dot => {
                seen_dot = true;
                true
            }
            _ => false,
        });
        Token::new(TokenKind::NumberLiteral, text, position)
    }

    fn string_literal(&mut self, position: SourcePosition) -> Result<Token, Diagnostic> {
        let quote = match self.bump() {
            Some(quote) => quote,
            None => unreachable!("string literal starts at a quote"),
        };
        let mut value = String::new();
        loop {
            let ch_position = self.position();
            match self.peek() {
                None | Some('\n') => {
                    return Err(Diagnostic::syntax(ch_position, "unterminated string literal"));
                }
                Some(ch) if ch == quote => {
                    self.bump();
                    return Ok(Token::new(TokenKind::StringLiteral, value, position));
                }
                Some('\\') => {
                    self.bump();
                    let escaped = match self.peek() {
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some('\'') => '\'',
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('t') => '\t',
                        None | Some('\n') => {
                            return Err(Diagnostic::syntax(
                                ch_position,
                                "unterminated string literal",
                            ));
                        }
                        Some(other) => {
                            return Err(Diagnostic::syntax(
                                ch_position,
                                format!("invalid escape sequence `\\{other}`"),
                            ));
                        }
                    };
                    self.bump();
                    value.push(escaped);
                }
                Some(ch) => {
                    self.bump();
                    value.push(ch);
                }
            }
        }
    }

    fn symbol(&mut self, first: char, position: SourcePosition) -> Result<Token, Diagnostic> {
        self.bump();
        if let Some(second) = self.peek() {
            if let Some(kind) = token::double_symbol(first, second) {
                self.bump();
                return Ok(Token::new(kind, format!("{first}{second}"), position));
            }
        }
        match token::single_symbol(first) {
            Some(kind) => Ok(Token::new(kind, first.to_string(), position)),
            None => Err(Diagnostic::syntax(
                position,
                format!("invalid character `{}`", first.escape_debug()),
            )),
        }
    }

    pub fn next_token(&mut self) -> Result<Token, Diagnostic> {
        self.skip_whitespace();
        let position = self.position();
        let ch = match self.peek() {
            Some(ch) => ch,
            None => return Ok(Token::new(TokenKind::EndOfFile, "", position)),
        };
        match ch {
            '\n' => {
                self.bump();
                Ok(Token::new(TokenKind::EndOfLine, "\n", position))
            }
            '0'..='9' => Ok(self.number_literal(position)),
            ch if ch.is_alphabetic() || ch == '_' => Ok(self.identifier_or_keyword(position)),
            '"' | '\'' => self.string_literal(position),
            other => self.symbol(other, position),
        }
    }

    /// Drains the lexer, including the trailing `EndOfFile` token.
    pub fn tokenize(mut self) -> Result<Vec<Token>, Diagnostic> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::EndOfFile;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}
