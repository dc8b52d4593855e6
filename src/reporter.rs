use log::debug;

use crate::error::LoxError;
use crate::token::{Token, TokenType};

/// Diagnostics sink shared by the whole pipeline.
///
/// Every phase reports human-readable diagnostics through here; the two flags
/// record which *class* of error occurred so the driver can pick an exit
/// code.  Compile-time diagnostics print `[line N] Error<where>: <msg>`,
/// runtime errors print `MSG` followed by `[line N]`.  Everything goes to
/// stderr so program output on stdout stays clean.
#[derive(Debug, Default)]
pub struct Reporter {
    had_error: bool,
    had_runtime_error: bool,
}

impl Reporter {
    pub fn new() -> Self {
        Reporter {
            had_error: false,
            had_runtime_error: false,
        }
    }

    /// A compile-time error with no token context (scan errors).
    pub fn error(&mut self, line: usize, message: &str) {
        self.report(line, "", message);
    }

    /// A compile-time error anchored to a token: ` at end` for the synthetic
    /// EOF, ` at 'LEX'` otherwise.
    pub fn token_error(&mut self, token: &Token, message: &str) {
        if token.token_type == TokenType::EOF {
            self.report(token.line, " at end", message);
        } else {
            let where_part: String = format!(" at '{}'", token.lexeme);
            self.report(token.line, &where_part, message);
        }
    }

    /// A scanner error yielded through the token stream.  `LoxError::Lex`
    /// already carries the compile-time format.
    pub fn scan_error(&mut self, err: &LoxError) {
        debug!("Reporting scan error: {}", err);

        eprintln!("{}", err);
        self.had_error = true;
    }

    /// A runtime error caught by the interpret loop.
    pub fn runtime_error(&mut self, err: &LoxError) {
        debug!("Reporting runtime error: {}", err);

        eprintln!("{}", err);
        self.had_runtime_error = true;
    }

    fn report(&mut self, line: usize, where_part: &str, message: &str) {
        eprintln!("[line {}] Error{}: {}", line, where_part, message);
        self.had_error = true;
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Clears the compile-time flag only; the REPL calls this between lines.
    /// `had_runtime_error` stays set for the lifetime of the session.
    pub fn reset(&mut self) {
        self.had_error = false;
    }
}
