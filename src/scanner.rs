pub mod token;

use thiserror::Error;

use crate::diagnostics::Diagnostics;
use crate::keywords::Keywords;
use crate::scanner::token::{Token, TokenType};

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Error : {message} [{line}]")]
pub struct ScanError {
    pub line: usize,
    pub message: String,
}

pub struct Scanner<'k> {
    source: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
    keywords: &'k Keywords,
}

impl<'k> Scanner<'k> {
    pub fn new(source: impl Into<String>, keywords: &'k Keywords) -> Self {
        Scanner {
            source: source.into().chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            keywords,
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    /// Scans the whole source. Errors go to `diagnostics`; the returned sequence
    /// always ends with an `Eof` token, even when errors were reported.
    pub fn scan_tokens(mut self, diagnostics: &mut Diagnostics) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token(diagnostics);
        }

        self.tokens.push(Token::new(TokenType::Eof, "", self.line));
        tracing::trace!(count = self.tokens.len(), "scanned tokens");
        self.tokens
    }

    fn scan_token(&mut self, diagnostics: &mut Diagnostics) {
        let c = self.advance();
        match c {
            '(' => self.add_token(TokenType::LeftParen),
            ')' => self.add_token(TokenType::RightParen),
            '{' => self.add_token(TokenType::LeftBrace),
            '}' => self.add_token(TokenType::RightBrace),
            ',' => self.add_token(TokenType::Comma),
            '.' => self.add_token(TokenType::Dot),
            '-' => self.add_token(TokenType::Minus),
            '+' => self.add_token(TokenType::Plus),
            ';' => self.add_token(TokenType::Semicolon),
            '*' => self.add_token(TokenType::Star),

            // One or two character tokens
            '!' => {
                let token_type = if self.match_char('=') {
                    TokenType::BangEqual
                } else {
                    TokenType::Bang
                };
                self.add_token(token_type);
            }

            '=' => {
                let token_type = if self.match_char('=') {
                    TokenType::EqualEqual
                } else {
                    TokenType::Equal
                };
                self.add_token(token_type);
            }

            '>' => {
                let token_type = if self.match_char('=') {
                    TokenType::GreaterEqual
                } else {
                    TokenType::Greater
                };
                self.add_token(token_type);
            }

            '<' => {
                let token_type = if self.match_char('=') {
                    TokenType::LessEqual
                } else {
                    TokenType::Less
                };
                self.add_token(token_type);
            }

            '/' => {
                if self.match_char('/') {
                    // Comment goes until end of line
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenType::Slash);
                }
            }

            ' ' | '\r' | '\t' => {}

            '\n' => self.line += 1,

            '"' => self.handle_string(diagnostics),

            c if c.is_ascii_digit() => self.handle_number(diagnostics),

            c if is_alpha(c) => self.handle_identifier(),

            _ => self.report_error(diagnostics, "Unexpected character."),
        }
    }

    fn advance(&mut self) -> char {
        let ch = self.source.get(self.current).copied().unwrap_or('\0');
        self.current += 1;
        ch
    }

    fn peek(&self) -> char {
        self.source.get(self.current).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        self.source.get(self.current + 1).copied().unwrap_or('\0')
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            return false;
        }
        self.current += 1;
        true
    }

    fn handle_string(&mut self, diagnostics: &mut Diagnostics) {
        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            self.report_error(diagnostics, "Unterminated string.");
            return;
        }

        // closing quote
        self.advance();

        // the literal value excludes the quotes, the lexeme keeps them
        let value = self.source[self.start + 1..self.current - 1]
            .iter()
            .collect::<String>();
        self.add_token(TokenType::String(value));
    }

    fn handle_number(&mut self, diagnostics: &mut Diagnostics) {
        // First character is already consumed and is a digit
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance(); // consume '.'

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        match text.parse::<f64>() {
            Ok(num) => self.add_token(TokenType::Number(num)),
            Err(_) => self.report_error(diagnostics, format!("Invalid number '{}'.", text)),
        }
    }

    fn handle_identifier(&mut self) {
        while is_alpha_numeric(self.peek()) {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        let token_type = self
            .keywords
            .get(&text)
            .cloned()
            .unwrap_or(TokenType::Identifier);

        self.add_token(token_type);
    }

    fn add_token(&mut self, t: TokenType) {
        let text = self.source[self.start..self.current]
            .iter()
            .collect::<String>();
        self.tokens.push(Token::new(t, text, self.line));
    }

    fn report_error(&self, diagnostics: &mut Diagnostics, message: impl Into<String>) {
        diagnostics.report(ScanError {
            line: self.line,
            message: message.into(),
        });
    }
}

fn is_alpha(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_alpha_numeric(c: char) -> bool {
    is_alpha(c) || c.is_ascii_digit()
}
