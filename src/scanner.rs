use std::iter::FusedIterator;

use log::{debug, info};
use phf::phf_map;

use crate::error::LoxError;
use crate::token::{Token, TokenType};

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and" => TokenType::AND,
    b"break" => TokenType::BREAK,
    b"class" => TokenType::CLASS,
    b"else" => TokenType::ELSE,
    b"false" => TokenType::FALSE,
    b"fun" => TokenType::FUN,
    b"for" => TokenType::FOR,
    b"if" => TokenType::IF,
    b"nil" => TokenType::NIL,
    b"or" => TokenType::OR,
    b"print" => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"super" => TokenType::SUPER,
    b"this" => TokenType::THIS,
    b"true" => TokenType::TRUE,
    b"var" => TokenType::VAR,
    b"while" => TokenType::WHILE,
};

/// Single-pass scanner over raw source bytes.
///
/// Implements `Iterator`, yielding one `Token` per lexeme plus a terminating
/// `EOF`.  Scan errors are yielded in-stream as `Err`; the scanner recovers by
/// skipping the offending byte and continuing, so a single pass reports every
/// lexical error in the source.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    source: &'a [u8],
    start: usize,
    curr_ptr: usize,
    line: usize,
    pending_token: Option<TokenType>,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a [u8]) -> Self {
        info!("Initializing Scanner with buffer of {} bytes", source.len());
        Self {
            source,
            start: 0,
            curr_ptr: 0,
            line: 1,
            pending_token: None,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.source.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    fn scan_token(&mut self) -> Result<(), LoxError> {
        let byte: u8 = self.advance();

        match byte {
            b'(' => self.add_token(TokenType::LEFT_PAREN),

            b')' => self.add_token(TokenType::RIGHT_PAREN),

            b'{' => self.add_token(TokenType::LEFT_BRACE),

            b'}' => self.add_token(TokenType::RIGHT_BRACE),

            b',' => self.add_token(TokenType::COMMA),

            b'.' => self.add_token(TokenType::DOT),

            b'-' => self.add_token(TokenType::MINUS),

            b'+' => self.add_token(TokenType::PLUS),

            b';' => self.add_token(TokenType::SEMICOLON),

            b'*' => self.add_token(TokenType::STAR),

            b'?' => self.add_token(TokenType::QUESTION_MARK),

            b':' => self.add_token(TokenType::COLON),

            b'!' => {
                let token_type: TokenType = if self.match_byte(b'=') {
                    TokenType::BANG_EQUAL
                } else {
                    TokenType::BANG
                };
                self.add_token(token_type);
            }

            b'=' => {
                let token_type: TokenType = if self.match_byte(b'=') {
                    TokenType::EQUAL_EQUAL
                } else {
                    TokenType::EQUAL
                };
                self.add_token(token_type);
            }

            b'<' => {
                let token_type: TokenType = if self.match_byte(b'=') {
                    TokenType::LESS_EQUAL
                } else {
                    TokenType::LESS
                };
                self.add_token(token_type);
            }

            b'>' => {
                let token_type: TokenType = if self.match_byte(b'=') {
                    TokenType::GREATER_EQUAL
                } else {
                    TokenType::GREATER
                };
                self.add_token(token_type);
            }

            b' ' | b'\r' | b'\t' => {}

            b'\n' => {
                self.line += 1;
            }

            b'/' => {
                if self.match_byte(b'/') {
                    debug!("Found line comment, skipping until newline");
                    while self.peek() != b'\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else if self.match_byte(b'*') {
                    debug!("Found block comment, skipping until '*/'");
                    self.skip_block_comment()?;
                } else {
                    self.add_token(TokenType::SLASH);
                }
            }

            b'"' => {
                self.parse_string()?;
            }

            b'0'..=b'9' => {
                self.parse_number();
            }

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                self.parse_identifier();
            }

            _ => {
                debug!(
                    "Unexpected character '{}' at line {}",
                    byte as char, self.line
                );

                return Err(LoxError::lex(
                    self.line,
                    format!("Unexpected character: {}", byte as char),
                ));
            }
        }

        Ok(())
    }

    /// Consumes a `/* ... */` comment.  Block comments do not nest; newlines
    /// inside them still count toward the line number.
    fn skip_block_comment(&mut self) -> Result<(), LoxError> {
        while !self.is_at_end() {
            if self.peek() == b'*' && self.peek_next() == b'/' {
                self.advance();
                self.advance();
                return Ok(());
            }

            if self.peek() == b'\n' {
                self.line += 1;
            }

            self.advance();
        }

        Err(LoxError::lex(self.line, "Unterminated block comment."))
    }

    fn parse_string(&mut self) -> Result<(), LoxError> {
        while !self.is_at_end() && self.peek() != b'"' {
            if self.peek() == b'\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            return Err(LoxError::lex(self.line, "Unterminated string."));
        }

        // Closing quote.
        self.advance();

        let parsed_string: String =
            String::from_utf8_lossy(&self.source[self.start + 1..self.curr_ptr - 1]).into_owned();

        info!("Parsed string literal: {}", parsed_string);

        self.add_token(TokenType::STRING(parsed_string));

        Ok(())
    }

    fn parse_number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // A '.' is part of the number only when a digit follows it.
        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance();

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let parsed_number: String =
            String::from_utf8_lossy(&self.source[self.start..self.curr_ptr]).into_owned();

        let number: f64 = parsed_number.parse().unwrap_or(0.0);

        info!("Parsed number: {}", number);

        self.add_token(TokenType::NUMBER(number));
    }

    fn parse_identifier(&mut self) {
        while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
            self.advance();
        }

        let text: &[u8] = &self.source[self.start..self.curr_ptr];

        match KEYWORDS.get(text) {
            Some(token_type) => {
                info!("Parsed keyword: {}", String::from_utf8_lossy(text));

                self.add_token(token_type.clone());
            }

            None => {
                info!("Parsed identifier: {}", String::from_utf8_lossy(text));

                self.add_token(TokenType::IDENTIFIER);
            }
        }
    }

    #[inline]
    fn add_token(&mut self, token_type: TokenType) {
        self.pending_token = Some(token_type);
    }

    #[inline]
    fn advance(&mut self) -> u8 {
        let byte = self.source[self.curr_ptr];

        self.curr_ptr += 1;

        byte
    }

    #[inline]
    fn match_byte(&mut self, expected: u8) -> bool {
        if self.is_at_end() || self.source[self.curr_ptr] != expected {
            false
        } else {
            self.curr_ptr += 1;

            true
        }
    }

    #[inline]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.source[self.curr_ptr]
        }
    }

    #[inline]
    fn peek_next(&self) -> u8 {
        if self.curr_ptr + 1 >= self.len() {
            0
        } else {
            self.source[self.curr_ptr + 1]
        }
    }

    #[inline]
    fn is_at_end(&self) -> bool {
        self.curr_ptr >= self.len()
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token, LoxError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.is_at_end() {
                if self.curr_ptr == self.len() {
                    self.curr_ptr += 1;

                    info!("Reached EOF at line {}", self.line);

                    return Some(Ok(Token::new(TokenType::EOF, "".to_string(), self.line)));
                }

                return None;
            }

            self.pending_token = None;

            self.start = self.curr_ptr;

            if let Err(e) = self.scan_token() {
                return Some(Err(e));
            }

            if let Some(token_type) = self.pending_token.take() {
                let lexeme: String =
                    String::from_utf8_lossy(&self.source[self.start..self.curr_ptr]).into_owned();

                return Some(Ok(Token::new(token_type, lexeme, self.line)));
            }

            // Whitespace or comment: nothing pending, keep scanning.
        }
    }
}

impl<'a> FusedIterator for Scanner<'a> {}
