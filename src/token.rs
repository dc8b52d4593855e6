use std::fmt;
use std::mem;

use log::debug;

#[allow(non_camel_case_types)]
#[derive(Debug, Clone)]
pub enum TokenType {
    // Single-character tokens.
    LEFT_PAREN,
    RIGHT_PAREN,
    LEFT_BRACE,
    RIGHT_BRACE,
    COMMA,
    DOT,
    MINUS,
    PLUS,
    SEMICOLON,
    SLASH,
    STAR,
    QUESTION_MARK,
    COLON,

    // One or two character tokens.
    BANG,
    BANG_EQUAL,
    EQUAL,
    EQUAL_EQUAL,
    GREATER,
    GREATER_EQUAL,
    LESS,
    LESS_EQUAL,

    // Literals.
    IDENTIFIER,
    STRING(String),
    NUMBER(f64),

    // Keywords.
    AND,
    BREAK,
    CLASS,
    ELSE,
    FALSE,
    FUN,
    FOR,
    IF,
    NIL,
    OR,
    PRINT,
    RETURN,
    SUPER,
    THIS,
    TRUE,
    VAR,
    WHILE,

    // Special Characters
    EOF,
}

/// Kind-based equality: two `STRING`s (or two `NUMBER`s) compare equal
/// regardless of payload, so the parser can match literal kinds with
/// placeholder payloads.
impl PartialEq for TokenType {
    fn eq(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

impl Eq for TokenType {}

#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub line: usize,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: String, line: usize) -> Self {
        Self {
            token_type,
            lexeme,
            line,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug!(
            "Formatting token: type={:?}, lexeme={}, line={}",
            self.token_type, self.lexeme, self.line
        );

        let literal: String = match &self.token_type {
            TokenType::STRING(literal) => literal.clone(),

            TokenType::NUMBER(num_literal) => {
                if num_literal.fract() == 0.0 {
                    format!("{:.1}", num_literal)
                } else {
                    format!("{}", num_literal)
                }
            }

            _ => "null".to_string(),
        };

        let tmp: String = format!("{:?}", self.token_type);
        let type_name: &str = tmp.split('(').next().unwrap_or(&tmp);

        write!(f, "{} {} {}", type_name, self.lexeme, literal)
    }
}
