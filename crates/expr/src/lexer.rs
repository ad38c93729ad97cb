// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Expression lexer.
//!
//! Tokenizes numbers, quoted strings, booleans, keywords, operators, and
//! parentheses. Unquoted barewords lex as string values; keywords and
//! boolean literals are matched case-insensitively. Input that matches no
//! rule is collapsed into a single raw string token, never a lex error.

use crate::token::{Op, Span, Token, TokenKind};

pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Tokenize the whole input.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        while self.pos < self.input.len() {
            let rest = &self.input[self.pos..];
            let Some(ch) = rest.chars().next() else { break };

            if ch.is_whitespace() {
                self.pos += ch.len_utf8();
                continue;
            }

            if ch.is_ascii_digit() || (ch == '-' && starts_with_digit(&rest[1..])) {
                tokens.push(self.lex_number());
                continue;
            }

            if ch == '"' || ch == '\'' {
                match self.lex_quoted(ch) {
                    Some(token) => tokens.push(token),
                    None => {
                        // Unterminated quote: the remainder is one raw token
                        self.push_raw(&mut tokens);
                        break;
                    }
                }
                continue;
            }

            if ch.is_ascii_alphabetic() || ch == '_' {
                tokens.push(self.lex_word());
                continue;
            }

            if let Some(token) = self.lex_operator(rest) {
                tokens.push(token);
                continue;
            }

            self.push_raw(&mut tokens);
            break;
        }

        tokens
    }

    fn lex_number(&mut self) -> Token {
        let start = self.pos;
        let bytes = self.input.as_bytes();
        let mut end = self.pos;

        if bytes[end] == b'-' {
            end += 1;
        }
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        // Fractional part only when the dot is followed by a digit
        if end + 1 < bytes.len() && bytes[end] == b'.' && bytes[end + 1].is_ascii_digit() {
            end += 1;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
        }

        self.pos = end;
        let value = self.input[start..end].parse().unwrap_or(0.0);
        Token::new(TokenKind::Number(value), Span::new(start, end))
    }

    fn lex_quoted(&mut self, quote: char) -> Option<Token> {
        let start = self.pos;
        let body = &self.input[self.pos + 1..];
        let close = body.find(quote)?;
        let text = body[..close].to_string();
        let end = self.pos + 1 + close + 1;
        self.pos = end;
        Some(Token::new(TokenKind::Str(text), Span::new(start, end)))
    }

    fn lex_word(&mut self) -> Token {
        let start = self.pos;
        let bytes = self.input.as_bytes();
        let mut end = self.pos;
        while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
            end += 1;
        }
        self.pos = end;

        let word = &self.input[start..end];
        let span = Span::new(start, end);
        let kind = match word.to_ascii_lowercase().as_str() {
            "true" => TokenKind::Bool(true),
            "false" => TokenKind::Bool(false),
            "if" => TokenKind::If,
            "then" => TokenKind::Then,
            "else" => TokenKind::Else,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            _ => TokenKind::Str(word.to_string()),
        };
        Token::new(kind, span)
    }

    fn lex_operator(&mut self, rest: &str) -> Option<Token> {
        let start = self.pos;
        let two = ["==", "!=", ">=", "<="]
            .iter()
            .find(|op| rest.starts_with(**op));
        if let Some(op) = two {
            let kind = match *op {
                "==" => Op::Eq,
                "!=" => Op::Ne,
                ">=" => Op::Ge,
                _ => Op::Le,
            };
            self.pos += 2;
            return Some(Token::new(TokenKind::Op(kind), Span::new(start, start + 2)));
        }

        let kind = match rest.as_bytes().first()? {
            b'>' => TokenKind::Op(Op::Gt),
            b'<' => TokenKind::Op(Op::Lt),
            b'+' => TokenKind::Op(Op::Plus),
            b'-' => TokenKind::Op(Op::Minus),
            b'*' => TokenKind::Op(Op::Star),
            b'/' => TokenKind::Op(Op::Slash),
            b'%' => TokenKind::Op(Op::Percent),
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            _ => return None,
        };
        self.pos += 1;
        Some(Token::new(kind, Span::new(start, start + 1)))
    }

    /// Collapse everything from the current position into one raw string
    /// token.
    fn push_raw(&mut self, tokens: &mut Vec<Token>) {
        let rest = self.input[self.pos..].trim();
        if !rest.is_empty() {
            tokens.push(Token::new(
                TokenKind::Str(rest.to_string()),
                Span::new(self.pos, self.input.len()),
            ));
        }
        self.pos = self.input.len();
    }
}

fn starts_with_digit(s: &str) -> bool {
    s.bytes().next().is_some_and(|b| b.is_ascii_digit())
}

#[cfg(test)]
#[path = "lexer_tests.rs"]
mod tests;
