//! Static resolution pass.
//!
//! A single AST walk between parsing and evaluation that:
//! 1. **Builds lexical scopes**: maintains a stack of `HashMap<&str, bool>`
//!    tracking declared (false) and fully defined (true) names in each
//!    nested block or function.
//! 2. **Enforces static rules**: reports redeclaration in the same local
//!    scope, reading a variable in its own initializer, `return` outside any
//!    function, and `this` outside any class.
//! 3. **Records binding distances**: for every `Variable`, `Assign` and
//!    `This` occurrence, tells the interpreter how many environment frames
//!    separate the use from its defining scope.  Occurrences with no entry
//!    are globals, looked up dynamically at runtime.
//!
//! Unlike a dynamic execution the walk has no side effects and no control
//! flow: loops are visited once, both `if` branches are visited, logic
//! operators do not short-circuit.
//!
//! Diagnostics go through the sink and resolution continues, so one pass
//! reports every static error; the sink's `had_error` flag gates execution.

use std::collections::HashMap;

use log::{debug, info};

use crate::expr::{Expr, ExprId, FunctionExpr};
use crate::interpreter::Interpreter;
use crate::reporter::Reporter;
use crate::stmt::Stmt;
use crate::token::Token;

/// Are we inside a user function?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
}

/// Are we inside a class body?  Used to validate `this`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
}

/// Resolver: tracks scopes, enforces static rules, and *records* binding
/// distances (locals vs. globals) by calling back into the interpreter.
pub struct Resolver<'i, 'src> {
    interpreter: &'i mut Interpreter,
    reporter: &'i mut Reporter,
    scopes: Vec<HashMap<&'src str, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
}

impl<'i, 'src> Resolver<'i, 'src> {
    /// Create a new resolver bound to the given interpreter and sink.
    pub fn new(interpreter: &'i mut Interpreter, reporter: &'i mut Reporter) -> Self {
        info!("Resolver instantiated");
        Resolver {
            interpreter,
            reporter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    /// Walk all top‑level statements.
    pub fn resolve(&mut self, statements: &'src [Stmt]) {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    /// Resolve a single expression.  The REPL uses this for the trailing
    /// bare expression of a line.
    pub fn resolve_expression(&mut self, expr: &'src Expr) {
        self.resolve_expr(expr);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &'src Stmt) {
        debug!("Resolving stmt: {:?}", stmt);

        match stmt {
            Stmt::Class { name, methods } => {
                // 1. Declare & define the class name so methods can refer to
                //    the class itself.
                self.declare(name);
                self.define(name);

                // 2. Save and enter the class context.
                let enclosing_class: ClassType = self.current_class;
                self.current_class = ClassType::Class;

                // 3. Open the implicit `this` scope around the methods, so
                //    `this` inside a method body resolves to it.
                self.begin_scope();
                if let Some(scope) = self.scopes.last_mut() {
                    scope.insert("this", true);
                }

                // 4. Resolve each method body as a function.
                for method in methods {
                    self.resolve_function(&method.function, FunctionType::Function);
                }

                // 5. Close the `this` scope.
                self.end_scope();

                // 6. Restore the outer class context.
                self.current_class = enclosing_class;
            }

            Stmt::Block(statements) => {
                // 1. Push a new anonymous scope for `{ … }`
                self.begin_scope();

                for s in statements {
                    self.resolve_stmt(s);
                }

                // 2. Pop the block scope
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // 1. Declare the variable name (marked but not yet defined)
                self.declare(name);

                // 2. Resolve the initializer expression, if any
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }

                // 3. Define the variable so it's available in this scope
                self.define(name);
            }

            Stmt::Function(declaration) => {
                // 1. Declare & define the function name eagerly so the body
                //    can recurse into it.
                self.declare(&declaration.name);
                self.define(&declaration.name);

                // 2. Resolve parameters and body under a function context.
                self.resolve_function(&declaration.function, FunctionType::Function);
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                // Both branches are resolved; there is no control flow here.
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);

                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Break => {
                // Validity was enforced by the parser's loop-depth counter.
            }

            Stmt::Return { keyword, value } => {
                // 1. Ensure we're inside a function.
                if self.current_function == FunctionType::None {
                    self.reporter
                        .token_error(keyword, "Can't return from top-level code.");
                }

                // 2. Resolve the returned expression, if present.
                if let Some(expr) = value {
                    self.resolve_expr(expr);
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &'src Expr) {
        debug!("Resolving expr: {:?}", expr);

        match expr {
            Expr::Literal(_) => {
                // Literals have no sub‑expressions.
            }

            Expr::Grouping(inner) => {
                self.resolve_expr(inner);
            }

            Expr::Unary { right, .. } => {
                self.resolve_expr(right);
            }

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_expr(then_branch);
                self.resolve_expr(else_branch);
            }

            Expr::Variable { id, name } => {
                // 1. Prevent reading a variable in its own initializer
                if let Some(scope) = self.scopes.last() {
                    if scope.get(name.lexeme.as_str()) == Some(&false) {
                        self.reporter.token_error(
                            name,
                            "Can't read local variable in its own initializer.",
                        );
                    }
                }

                // 2. Bind this variable occurrence at its lexical depth
                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                // Resolve the right‑hand side first, then bind the target.
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);

                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Function(declaration) => {
                self.resolve_function(declaration, FunctionType::Function);
            }

            Expr::This { id, keyword } => {
                // 1. `this` only valid inside class methods
                if self.current_class == ClassType::None {
                    self.reporter
                        .token_error(keyword, "Can't use 'this' outside of a class.");
                }

                // 2. Bind 'this' like a local variable
                self.resolve_local(*id, keyword);
            }

            Expr::Get { object, .. } => {
                // Properties are looked up dynamically; only the object
                // expression resolves.
                self.resolve_expr(object);
            }

            Expr::Set { object, value, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function's parameters + body.
    fn resolve_function(&mut self, function: &'src FunctionExpr, kind: FunctionType) {
        // 1. Save the enclosing function context so we can restore it later.
        let enclosing: FunctionType = self.current_function;
        self.current_function = kind;

        // 2. Begin a new lexical scope for the parameters & body.
        self.begin_scope();

        // 3. Declare and immediately define each parameter in this scope.
        for param in &function.params {
            self.declare(param);
            self.define(param);
        }

        // 4. Resolve the body under the current context.
        for stmt in &function.body {
            self.resolve_stmt(stmt);
        }

        // 5. End the parameter/body scope.
        self.end_scope();

        // 6. Restore the previous function context.
        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Adds the name to the innermost scope, marked "not ready yet".
    /// Globals (empty stack) are not tracked and may be redeclared freely.
    fn declare(&mut self, name: &'src Token) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(name.lexeme.as_str()) {
                self.reporter
                    .token_error(name, "Already variable with this name in this scope.");
                return;
            }

            scope.insert(&name.lexeme, false);
        }
    }

    /// Marks the name as fully initialized and available for use.
    fn define(&mut self, name: &'src Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(&name.lexeme, true);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this occurrence as a local at the depth of the innermost scope
    /// containing the name; not found in any scope means it's a global and
    /// no entry is recorded.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(name.lexeme.as_str()) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                self.interpreter.note_local(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}
