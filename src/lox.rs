//! Pipeline driver: wires the scanner, parser, resolver and interpreter
//! together and owns the diagnostics sink across a session.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;

use log::info;

use crate::expr::ExprId;
use crate::interpreter::Interpreter;
use crate::parser::{Parser, ReplParse};
use crate::reporter::Reporter;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::stmt::Stmt;
use crate::token::Token;

pub struct Lox {
    interpreter: Interpreter,
    reporter: Reporter,

    /// Next AST node id.  Threaded through every parser the session creates
    /// so ids from earlier lines are never reused while their bindings live
    /// on in the side-table.
    next_expr_id: ExprId,
}

impl Lox {
    pub fn new() -> Self {
        Lox {
            interpreter: Interpreter::new(),
            reporter: Reporter::new(),
            next_expr_id: 0,
        }
    }

    /// Builds a session whose program output goes to `out` instead of
    /// stdout.  Integration tests capture exact output through this.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        Lox {
            interpreter: Interpreter::with_output(out),
            reporter: Reporter::new(),
            next_expr_id: 0,
        }
    }

    pub fn had_error(&self) -> bool {
        self.reporter.had_error()
    }

    pub fn had_runtime_error(&self) -> bool {
        self.reporter.had_runtime_error()
    }

    /// Reads and runs a script.  The caller inspects the error flags to pick
    /// an exit code.
    pub fn run_file(&mut self, path: &Path) -> io::Result<()> {
        let mut buf: Vec<u8> = Vec::new();
        let mut reader: BufReader<File> = BufReader::new(File::open(path)?);
        reader.read_to_end(&mut buf)?;

        self.run(&buf);

        Ok(())
    }

    /// Interactive session: one line at a time, compile errors forgiven
    /// between lines, end of input terminates.
    pub fn run_prompt(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();

        loop {
            print!("> ");
            io::stdout().flush()?;

            match lines.next() {
                Some(line) => {
                    self.run_line(&line?);
                    self.reporter.reset();
                }

                None => break,
            }
        }

        Ok(())
    }

    /// Script mode: scan → parse → resolve → interpret.  Execution is
    /// skipped if any compile-time error occurred.
    pub fn run(&mut self, source: &[u8]) {
        let tokens: Vec<Token> = self.scan(source);

        let mut parser = Parser::with_first_id(tokens, &mut self.reporter, self.next_expr_id);
        let statements: Vec<Stmt> = parser.parse();
        self.next_expr_id = parser.next_id();

        if self.reporter.had_error() {
            return;
        }

        Resolver::new(&mut self.interpreter, &mut self.reporter).resolve(&statements);

        if self.reporter.had_error() {
            return;
        }

        info!("Pipeline clean, executing {} statement(s)", statements.len());

        self.interpreter.interpret(&statements, &mut self.reporter);
    }

    /// REPL mode: like [`run`](Lox::run), but a line ending in a bare
    /// expression evaluates it and echoes the value.
    pub fn run_line(&mut self, line: &str) {
        let tokens: Vec<Token> = self.scan(line.as_bytes());

        let mut parser = Parser::with_first_id(tokens, &mut self.reporter, self.next_expr_id);
        let parsed: ReplParse = parser.parse_repl();
        self.next_expr_id = parser.next_id();

        if self.reporter.had_error() {
            return;
        }

        match parsed {
            ReplParse::Statements(statements) => {
                Resolver::new(&mut self.interpreter, &mut self.reporter).resolve(&statements);

                if self.reporter.had_error() {
                    return;
                }

                self.interpreter
                    .interpret_line(&statements, &mut self.reporter);
            }

            ReplParse::Expression(statements, expr) => {
                let mut resolver = Resolver::new(&mut self.interpreter, &mut self.reporter);
                resolver.resolve(&statements);
                resolver.resolve_expression(&expr);

                if self.reporter.had_error() {
                    return;
                }

                if self
                    .interpreter
                    .interpret_line(&statements, &mut self.reporter)
                {
                    self.interpreter.interpret_repl(&expr, &mut self.reporter);
                }
            }
        }
    }

    /// Collects the token stream, reporting scan errors in source order.
    /// The scanner recovers after each error, so one pass reports them all.
    fn scan(&mut self, source: &[u8]) -> Vec<Token> {
        let mut tokens: Vec<Token> = Vec::new();

        for result in Scanner::new(source) {
            match result {
                Ok(token) => tokens.push(token),

                Err(e) => self.reporter.scan_error(&e),
            }
        }

        tokens
    }
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}
