//! Tree-walking evaluator.
//!
//! Executes resolved statements against a chain of lexical environments.
//! Non-local control transfers (`break`, `return`) ride the same `Err`
//! channel as runtime errors but are a distinct [`Signal`] variant: they are
//! caught by the nearest `while` body or function call respectively and are
//! never surfaced to the diagnostics sink.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use crate::callable::{clock_native, LoxCallable, NativeFunction};
use crate::class::{LoxClass, LoxInstance};
use crate::environment::Environment;
use crate::error::LoxError;
use crate::expr::{Expr, ExprId, LiteralValue};
use crate::function::LoxFunction;
use crate::reporter::Reporter;
use crate::stmt::Stmt;
use crate::token::{Token, TokenType};
use crate::value::{number_to_string, Value};

/// Why execution of a statement or expression stopped early.
///
/// `Break` and `Return` are control transfers, not errors; only `Error`
/// reaches the diagnostics sink.
#[derive(Debug)]
pub enum Signal {
    Break,
    Return(Value),
    Error(LoxError),
}

impl From<LoxError> for Signal {
    fn from(err: LoxError) -> Self {
        Signal::Error(err)
    }
}

pub struct Interpreter {
    /// Fixed handle on the outermost environment; unresolved names are read
    /// and written here.
    globals: Rc<RefCell<Environment>>,

    /// The environment of the scope currently executing.  Swapped on block
    /// entry and restored on exit, including the error path.
    environment: Rc<RefCell<Environment>>,

    /// Side-table produced by the resolver: hop distance per binding use,
    /// keyed by node identity.  Uses with no entry are globals.
    locals: HashMap<ExprId, usize>,

    /// Program output sink.  Defaults to stdout; tests inject a buffer.
    out: Box<dyn Write>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    pub fn with_output(out: Box<dyn Write>) -> Self {
        let globals: Rc<RefCell<Environment>> = Rc::new(RefCell::new(Environment::new()));

        globals.borrow_mut().define(
            "clock",
            Value::Native(Rc::new(NativeFunction {
                name: "clock",
                arity: 0,
                func: clock_native,
            })),
        );

        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            out,
        }
    }

    /// Called by the resolver for every local binding use.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Script-mode entry point: a runtime error is reported and execution
    /// proceeds with the next top-level statement.
    pub fn interpret(&mut self, statements: &[Stmt], reporter: &mut Reporter) {
        for statement in statements {
            if let Err(signal) = self.execute(statement) {
                match signal {
                    Signal::Error(err) => reporter.runtime_error(&err),

                    Signal::Break | Signal::Return(_) => {
                        unreachable!("break/return escape is rejected statically")
                    }
                }
            }
        }
    }

    /// REPL-mode execution: unlike script mode, the first runtime error ends
    /// the line.  Returns whether the statements completed cleanly.
    pub fn interpret_line(&mut self, statements: &[Stmt], reporter: &mut Reporter) -> bool {
        for statement in statements {
            if let Err(signal) = self.execute(statement) {
                match signal {
                    Signal::Error(err) => {
                        reporter.runtime_error(&err);
                        return false;
                    }

                    Signal::Break | Signal::Return(_) => {
                        unreachable!("break/return escape is rejected statically")
                    }
                }
            }
        }

        true
    }

    /// REPL entry point for a trailing bare expression: evaluates it and
    /// echoes the value.
    pub fn interpret_repl(&mut self, expr: &Expr, reporter: &mut Reporter) {
        match self.evaluate(expr) {
            Ok(value) => {
                let _ = writeln!(self.out, "{}", value);
            }

            Err(Signal::Error(err)) => reporter.runtime_error(&err),

            Err(Signal::Break) | Err(Signal::Return(_)) => {
                unreachable!("break/return escape is rejected statically")
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────

    fn execute(&mut self, stmt: &Stmt) -> Result<(), Signal> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(())
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;

                writeln!(self.out, "{}", value).map_err(LoxError::Io)?;

                Ok(())
            }

            Stmt::Var { name, initializer } => {
                // At top level `var a = a;` reads nil: the name is bound to
                // nil before its initializer runs.  In local scopes the
                // resolver rejects that program instead.
                let at_top_level: bool = Rc::ptr_eq(&self.environment, &self.globals);

                if at_top_level && !self.globals.borrow().contains(&name.lexeme) {
                    self.globals.borrow_mut().define(&name.lexeme, Value::Nil);
                }

                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,

                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(())
            }

            Stmt::Block(statements) => {
                let inner: Environment =
                    Environment::with_enclosing(Rc::clone(&self.environment));

                self.execute_block(statements, Rc::new(RefCell::new(inner)))
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }

                Ok(())
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body) {
                        Ok(()) => {}

                        // `break` terminates this loop and nothing else.
                        Err(Signal::Break) => break,

                        Err(signal) => return Err(signal),
                    }
                }

                Ok(())
            }

            Stmt::Break => Err(Signal::Break),

            Stmt::Function(declaration) => {
                // The closure is the environment active at declaration, not
                // at any later call.
                let function: LoxFunction = LoxFunction::new(
                    Some(declaration.name.lexeme.clone()),
                    Rc::clone(&declaration.function),
                    Rc::clone(&self.environment),
                    false,
                );

                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));

                Ok(())
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,

                    None => Value::Nil,
                };

                Err(Signal::Return(value))
            }

            Stmt::Class { name, methods } => {
                // Two-stage binding (define nil, then assign the finished
                // class) lets methods refer to the class by name.
                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Value::Nil);

                let mut method_map: HashMap<String, Rc<LoxFunction>> = HashMap::new();

                for method in methods {
                    let is_initializer: bool = method.name.lexeme == "init";

                    let function: LoxFunction = LoxFunction::new(
                        Some(method.name.lexeme.clone()),
                        Rc::clone(&method.function),
                        Rc::clone(&self.environment),
                        is_initializer,
                    );

                    method_map.insert(method.name.lexeme.clone(), Rc::new(function));
                }

                let class: Value =
                    Value::Class(Rc::new(LoxClass::new(name.lexeme.clone(), method_map)));

                self.environment
                    .borrow_mut()
                    .assign(&name.lexeme, class, name.line)?;

                Ok(())
            }
        }
    }

    /// Runs `statements` with `environment` as the current scope, restoring
    /// the previous scope afterwards even when a signal unwinds.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> Result<(), Signal> {
        let previous: Rc<RefCell<Environment>> = Rc::clone(&self.environment);

        self.environment = environment;

        for statement in statements {
            if let Err(signal) = self.execute(statement) {
                self.environment = previous;
                return Err(signal);
            }
        }

        self.environment = previous;

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────

    fn evaluate(&mut self, expr: &Expr) -> Result<Value, Signal> {
        match expr {
            Expr::Literal(literal) => Ok(Self::literal_value(literal)),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => self.evaluate_logical(left, operator, right),

            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(name, *id),

            Expr::This { id, keyword } => self.look_up_variable(keyword, *id),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        if !Environment::assign_at(
                            &self.environment,
                            distance,
                            &name.lexeme,
                            value.clone(),
                        ) {
                            return Err(self.undefined_variable(name));
                        }
                    }

                    None => {
                        self.globals.borrow_mut().assign(
                            &name.lexeme,
                            value.clone(),
                            name.line,
                        )?;
                    }
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val: Value = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(self.evaluate(argument)?);
                }

                self.call_value(callee_val, args, paren)
            }

            Expr::Function(declaration) => {
                let function: LoxFunction = LoxFunction::new(
                    None,
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );

                Ok(Value::Function(Rc::new(function)))
            }

            Expr::Get { object, name } => {
                let object_val: Value = self.evaluate(object)?;

                match object_val {
                    Value::Instance(instance) => {
                        LoxInstance::get(&instance, name).map_err(Signal::Error)
                    }

                    _ => Err(self.runtime_error(name, "Only instances have properties.")),
                }
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let object_val: Value = self.evaluate(object)?;

                let instance: Rc<RefCell<LoxInstance>> = match object_val {
                    Value::Instance(instance) => instance,

                    _ => return Err(self.runtime_error(name, "Only instances have fields.")),
                };

                let value: Value = self.evaluate(value)?;

                instance.borrow_mut().set(&name.lexeme, value.clone());

                Ok(value)
            }
        }
    }

    fn literal_value(literal: &LiteralValue) -> Value {
        match literal {
            LiteralValue::Number(n) => Value::Number(*n),

            LiteralValue::Str(s) => Value::String(s.clone()),

            LiteralValue::True => Value::Bool(true),

            LiteralValue::False => Value::Bool(false),

            LiteralValue::Nil => Value::Nil,
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value, Signal> {
        let value: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match value {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(self.runtime_error(operator, "Operand must be a number.")),
            },

            TokenType::BANG => Ok(Value::Bool(!value.is_truthy())),

            _ => Err(self.runtime_error(operator, "Invalid unary operator.")),
        }
    }

    fn evaluate_logical(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> Result<Value, Signal> {
        let left_val: Value = self.evaluate(left)?;

        // Short-circuit: the deciding operand is the result, uncoerced.
        if operator.token_type == TokenType::OR {
            if left_val.is_truthy() {
                return Ok(left_val);
            }
        } else if !left_val.is_truthy() {
            return Ok(left_val);
        }

        self.evaluate(right)
    }

    fn evaluate_binary(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> Result<Value, Signal> {
        let left_val: Value = self.evaluate(left)?;
        let right_val: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),

                // Mixed operands concatenate with the number formatted the
                // way `print` would show it.
                (Value::String(a), Value::Number(b)) => {
                    Ok(Value::String(a + &number_to_string(b)))
                }

                (Value::Number(a), Value::String(b)) => {
                    Ok(Value::String(number_to_string(a) + &b))
                }

                _ => Err(self.runtime_error(
                    operator,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::MINUS => {
                let (a, b) = self.number_operands(operator, &left_val, &right_val)?;

                Ok(Value::Number(a - b))
            }

            TokenType::STAR => {
                let (a, b) = self.number_operands(operator, &left_val, &right_val)?;

                Ok(Value::Number(a * b))
            }

            TokenType::SLASH => {
                let (a, b) = self.number_operands(operator, &left_val, &right_val)?;

                if b == 0.0 {
                    return Err(self.runtime_error(operator, "Division by zero."));
                }

                Ok(Value::Number(a / b))
            }

            TokenType::GREATER => {
                let (a, b) = self.number_operands(operator, &left_val, &right_val)?;

                Ok(Value::Bool(a > b))
            }

            TokenType::GREATER_EQUAL => {
                let (a, b) = self.number_operands(operator, &left_val, &right_val)?;

                Ok(Value::Bool(a >= b))
            }

            TokenType::LESS => {
                let (a, b) = self.number_operands(operator, &left_val, &right_val)?;

                Ok(Value::Bool(a < b))
            }

            TokenType::LESS_EQUAL => {
                let (a, b) = self.number_operands(operator, &left_val, &right_val)?;

                Ok(Value::Bool(a <= b))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            // Comma: left evaluated for its effect, right is the result.
            TokenType::COMMA => Ok(right_val),

            _ => Err(self.runtime_error(operator, "Invalid binary operator.")),
        }
    }

    fn call_value(
        &mut self,
        callee: Value,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> Result<Value, Signal> {
        match callee {
            Value::Function(function) => {
                self.check_arity(function.arity(), arguments.len(), paren)?;

                function.call(self, arguments)
            }

            Value::Native(native) => {
                self.check_arity(native.arity(), arguments.len(), paren)?;

                native.call(self, arguments)
            }

            Value::Class(class) => {
                self.check_arity(class.arity(), arguments.len(), paren)?;

                class.call(self, arguments)
            }

            _ => Err(self.runtime_error(paren, "Can only call functions and classes.")),
        }
    }

    /// Checked before the callee runs; a mismatch never invokes it.
    fn check_arity(&self, expected: usize, got: usize, paren: &Token) -> Result<(), Signal> {
        if expected != got {
            return Err(self.runtime_error(
                paren,
                &format!("Expected {} arguments but got {}.", expected, got),
            ));
        }

        Ok(())
    }

    /// Resolved uses read at their recorded hop distance; everything else is
    /// a global, looked up dynamically.
    fn look_up_variable(&self, name: &Token, id: ExprId) -> Result<Value, Signal> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, &name.lexeme)
                .ok_or_else(|| self.undefined_variable(name)),

            None => self
                .globals
                .borrow()
                .get(&name.lexeme, name.line)
                .map_err(Signal::Error),
        }
    }

    fn number_operands(
        &self,
        operator: &Token,
        left: &Value,
        right: &Value,
    ) -> Result<(f64, f64), Signal> {
        match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),

            _ => Err(self.runtime_error(operator, "Operands must be numbers.")),
        }
    }

    fn runtime_error(&self, token: &Token, message: &str) -> Signal {
        Signal::Error(LoxError::runtime(token.line, message))
    }

    fn undefined_variable(&self, name: &Token) -> Signal {
        Signal::Error(LoxError::runtime(
            name.line,
            format!("Undefined variable '{}'.", name.lexeme),
        ))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
