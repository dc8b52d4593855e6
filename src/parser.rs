//! Recursive-descent parser with panic-mode error recovery.
//!
//! Grammar (precedence ascending):
//!
//! ```text
//! program     → declaration* EOF
//! declaration → classDecl | funDecl | varDecl | statement
//! statement   → exprStmt | ifStmt | whileStmt | forStmt
//!             | breakStmt | returnStmt | printStmt | block
//! expression  → assignment
//! assignment  → ( call "." )? IDENT "=" assignment | comma
//! comma       → conditional ( "," conditional )*
//! conditional → logic_or ( "?" expression ":" conditional )?
//! logic_or    → logic_and ( "or" logic_and )*
//! logic_and   → equality ( "and" equality )*
//! equality    → comparison ( ( "!=" | "==" ) comparison )*
//! comparison  → term ( ( ">" | ">=" | "<" | "<=" ) term )*
//! term        → factor ( ( "-" | "+" ) factor )*
//! factor      → unary ( ( "/" | "*" ) unary )*
//! unary       → ( "!" | "-" ) unary | call
//! call        → primary ( "(" arguments? ")" | "." IDENT )*
//! primary     → NUMBER | STRING | "true" | "false" | "nil" | IDENT
//!             | "this" | "(" expression ")" | "fun" "(" params? ")" block
//! ```
//!
//! On a parse error the offending production reports through the sink and
//! unwinds with `LoxError::Parse`; `declaration` catches it, synchronizes to
//! the next statement boundary and keeps going.  The sink's `had_error` flag,
//! not the returned statement list, decides whether the program runs.

use std::rc::Rc;

use crate::error::{LoxError, Result};
use crate::expr::{Expr, ExprId, FunctionExpr, LiteralValue};
use crate::reporter::Reporter;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};

/// Result of the REPL entry point: either plain statements, or statements
/// followed by a trailing bare expression the driver should evaluate and
/// print.
#[derive(Debug)]
pub enum ReplParse {
    Statements(Vec<Stmt>),
    Expression(Vec<Stmt>, Expr),
}

pub struct Parser<'r> {
    tokens: Vec<Token>,
    current: usize,

    reporter: &'r mut Reporter,

    /// Nesting depth of `for`/`while` bodies; `break` is legal only when
    /// this is non-zero.
    loop_depth: usize,

    // REPL support: `allow_expression` marks the REPL entry point;
    // `found_expression` records that the line ended as a bare expression
    // with no `;`.  Only a statement that exhausts the token stream can set
    // it, so only the last statement of a line qualifies.
    allow_expression: bool,
    found_expression: bool,

    /// Latch suppressing the comma operator inside argument lists.
    no_comma_expr: bool,

    /// Monotonic id source for `Variable` / `Assign` / `This` nodes.
    next_id: ExprId,
}

impl<'r> Parser<'r> {
    pub fn new(tokens: Vec<Token>, reporter: &'r mut Reporter) -> Self {
        Self::with_first_id(tokens, reporter, 0)
    }

    /// Continues node-id assignment from `first_id`.  A session parses each
    /// REPL line with a fresh parser, but the side-table and closures from
    /// earlier lines survive, so ids must stay unique across the session.
    pub fn with_first_id(tokens: Vec<Token>, reporter: &'r mut Reporter, first_id: ExprId) -> Self {
        Parser {
            tokens,
            current: 0,
            reporter,
            loop_depth: 0,
            allow_expression: false,
            found_expression: false,
            no_comma_expr: false,
            next_id: first_id,
        }
    }

    /// The id the next parsed binding node would get; the session feeds it
    /// back into the next parser it creates.
    pub fn next_id(&self) -> ExprId {
        self.next_id
    }

    /// program → declaration* EOF
    pub fn parse(&mut self) -> Vec<Stmt> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        statements
    }

    /// REPL entry point: accepts statements, or a single trailing bare
    /// expression (no semicolon) for auto-printing.  Only the *last* parsed
    /// declaration can be the bare expression; everything before it is
    /// returned alongside so the driver executes the whole line.
    pub fn parse_repl(&mut self) -> ReplParse {
        self.allow_expression = true;

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                if self.found_expression {
                    if let Stmt::Expression(expr) = stmt {
                        return ReplParse::Expression(statements, expr);
                    }
                }

                statements.push(stmt);
            }
        }

        ReplParse::Statements(statements)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Declarations and statements
    // ─────────────────────────────────────────────────────────────────────

    fn declaration(&mut self) -> Option<Stmt> {
        let result: Result<Stmt> = if self.match_token(&[TokenType::CLASS]) {
            self.class_declaration()
        } else if self.check(&TokenType::FUN) && self.check_next(&TokenType::IDENTIFIER) {
            // Only `fun IDENT` starts a declaration; a bare `fun (` is an
            // anonymous function expression handled by `primary`.
            self.advance();
            self.function("function").map(Stmt::Function)
        } else if self.match_token(&[TokenType::VAR]) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),

            Err(_) => {
                self.synchronize();
                None
            }
        }
    }

    /// classDecl → "class" IDENT "{" function* "}"
    fn class_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self.consume(&TokenType::IDENTIFIER, "Expect class name.")?;

        self.consume(&TokenType::LEFT_BRACE, "Expect '{' before class body.")?;

        let mut methods: Vec<FunctionDecl> = Vec::new();
        while !self.check(&TokenType::RIGHT_BRACE) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }

        self.consume(&TokenType::RIGHT_BRACE, "Expect '}' after class body.")?;

        Ok(Stmt::Class { name, methods })
    }

    /// function → IDENT "(" params? ")" block
    ///
    /// Shared by `fun` declarations and class methods; `kind` only flavors
    /// the error messages.
    fn function(&mut self, kind: &str) -> Result<FunctionDecl> {
        let name: Token =
            self.consume(&TokenType::IDENTIFIER, &format!("Expect {} name.", kind))?;

        let function: Rc<FunctionExpr> = self.function_body(kind)?;

        Ok(FunctionDecl { name, function })
    }

    /// Parameter list and body, without the name.  Also the grammar of an
    /// anonymous function expression.
    fn function_body(&mut self, kind: &str) -> Result<Rc<FunctionExpr>> {
        self.consume(
            &TokenType::LEFT_PAREN,
            &format!("Expect '(' after {} name.", kind),
        )?;

        let mut params: Vec<Token> = Vec::new();
        if !self.check(&TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= 8 {
                    // Report but keep parsing; recovery is the next comma
                    // boundary, not a panic.
                    let token: Token = self.peek().clone();
                    self.error(&token, "Can't have more than 8 parameters.");
                }

                params.push(self.consume(&TokenType::IDENTIFIER, "Expect parameter name.")?);

                if !self.match_token(&[TokenType::COMMA]) {
                    break;
                }
            }
        }

        self.consume(&TokenType::RIGHT_PAREN, "Expect ')' after parameters.")?;

        self.consume(
            &TokenType::LEFT_BRACE,
            &format!("Expect '{{' before {} body.", kind),
        )?;

        let body: Vec<Stmt> = self.block()?;

        Ok(Rc::new(FunctionExpr { params, body }))
    }

    /// varDecl → "var" IDENT ( "=" expression )? ";"
    fn var_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self.consume(&TokenType::IDENTIFIER, "Expect variable name.")?;

        let initializer: Option<Expr> = if self.match_token(&[TokenType::EQUAL]) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            &TokenType::SEMICOLON,
            "Expect ';' after variable declaration.",
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    fn statement(&mut self) -> Result<Stmt> {
        if self.match_token(&[TokenType::PRINT]) {
            return self.print_statement();
        }

        if self.match_token(&[TokenType::LEFT_BRACE]) {
            return Ok(Stmt::Block(self.block()?));
        }

        if self.match_token(&[TokenType::IF]) {
            return self.if_statement();
        }

        if self.match_token(&[TokenType::WHILE]) {
            return self.while_statement();
        }

        if self.match_token(&[TokenType::FOR]) {
            return self.for_statement();
        }

        if self.match_token(&[TokenType::BREAK]) {
            return self.break_statement();
        }

        if self.match_token(&[TokenType::RETURN]) {
            return self.return_statement();
        }

        self.expression_statement()
    }

    /// printStmt → "print" expression ";"
    fn print_statement(&mut self) -> Result<Stmt> {
        let value: Expr = self.expression()?;

        self.consume(&TokenType::SEMICOLON, "Expect ';' after value.")?;

        Ok(Stmt::Print(value))
    }

    /// block → "{" declaration* "}"
    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(&TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(&TokenType::RIGHT_BRACE, "Expect '}' after block.")?;

        Ok(statements)
    }

    /// ifStmt → "if" "(" expression ")" statement ( "else" statement )?
    fn if_statement(&mut self) -> Result<Stmt> {
        self.consume(&TokenType::LEFT_PAREN, "Expect '(' after 'if'.")?;
        let condition: Expr = self.expression()?;
        self.consume(&TokenType::RIGHT_PAREN, "Expect ')' after if condition.")?;

        let then_branch: Box<Stmt> = Box::new(self.statement()?);

        let else_branch: Option<Box<Stmt>> = if self.match_token(&[TokenType::ELSE]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    /// whileStmt → "while" "(" expression ")" statement
    fn while_statement(&mut self) -> Result<Stmt> {
        self.consume(&TokenType::LEFT_PAREN, "Expect '(' after 'while'.")?;
        let condition: Expr = self.expression()?;
        self.consume(&TokenType::RIGHT_PAREN, "Expect ')' after condition.")?;

        self.loop_depth += 1;
        let body: Result<Stmt> = self.statement();
        self.loop_depth -= 1;

        Ok(Stmt::While {
            condition,
            body: Box::new(body?),
        })
    }

    /// forStmt → "for" "(" ( varDecl | exprStmt | ";" )
    ///           expression? ";" expression? ")" statement
    ///
    /// Desugared at parse time into
    /// `Block(init?, While(cond ?? true, Block(body, incr?)))`.
    fn for_statement(&mut self) -> Result<Stmt> {
        self.consume(&TokenType::LEFT_PAREN, "Expect '(' after 'for'.")?;

        let initializer: Option<Stmt> = if self.match_token(&[TokenType::SEMICOLON]) {
            None
        } else if self.match_token(&[TokenType::VAR]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition: Option<Expr> = if !self.check(&TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(&TokenType::SEMICOLON, "Expect ';' after loop condition.")?;

        let increment: Option<Expr> = if !self.check(&TokenType::RIGHT_PAREN) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(&TokenType::RIGHT_PAREN, "Expect ')' after for clauses.")?;

        self.loop_depth += 1;
        let body_result: Result<Stmt> = self.statement();
        self.loop_depth -= 1;

        let mut body: Stmt = body_result?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        let condition: Expr = condition.unwrap_or(Expr::Literal(LiteralValue::True));
        body = Stmt::While {
            condition,
            body: Box::new(body),
        };

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        Ok(body)
    }

    /// breakStmt → "break" ";"
    fn break_statement(&mut self) -> Result<Stmt> {
        if self.loop_depth == 0 {
            let token: Token = self.previous().clone();
            return Err(self.error(&token, "Must be inside a loop to use 'break'."));
        }

        self.consume(&TokenType::SEMICOLON, "Expect ';' after 'break'.")?;

        Ok(Stmt::Break)
    }

    /// returnStmt → "return" expression? ";"
    fn return_statement(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();

        let value: Option<Expr> = if !self.check(&TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(&TokenType::SEMICOLON, "Expect ';' after return value.")?;

        Ok(Stmt::Return { keyword, value })
    }

    /// exprStmt → expression ";"
    fn expression_statement(&mut self) -> Result<Stmt> {
        let expr: Expr = self.expression()?;

        if self.allow_expression && self.is_at_end() {
            // A REPL line ending in a bare expression skips the `;`.
            self.found_expression = true;
        } else {
            self.consume(&TokenType::SEMICOLON, "Expect ';' after expression.")?;
        }

        Ok(Stmt::Expression(expr))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────

    fn expression(&mut self) -> Result<Expr> {
        self.assignment()
    }

    /// assignment → ( call "." )? IDENT "=" assignment | comma
    ///
    /// The left side is parsed as a full expression and reshaped when `=`
    /// follows: `Variable` becomes `Assign`, `Get` becomes `Set`.
    fn assignment(&mut self) -> Result<Expr> {
        let expr: Expr = self.comma()?;

        if self.match_token(&[TokenType::EQUAL]) {
            let equals: Token = self.previous().clone();
            let value: Expr = self.assignment()?;

            return match expr {
                Expr::Variable { name, .. } => Ok(Expr::Assign {
                    id: self.fresh_id(),
                    name,
                    value: Box::new(value),
                }),

                Expr::Get { object, name } => Ok(Expr::Set {
                    object,
                    name,
                    value: Box::new(value),
                }),

                other => {
                    // Report without synchronizing; the already-parsed left
                    // side is returned so no further tokens are consumed.
                    self.error(&equals, "Invalid assignment target.");
                    Ok(other)
                }
            };
        }

        Ok(expr)
    }

    /// comma → conditional ( "," conditional )*
    fn comma(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.conditional()?;

        if !self.no_comma_expr {
            while self.match_token(&[TokenType::COMMA]) {
                let operator: Token = self.previous().clone();
                let right: Expr = self.conditional()?;

                expr = Expr::Binary {
                    left: Box::new(expr),
                    operator,
                    right: Box::new(right),
                };
            }
        }

        Ok(expr)
    }

    /// conditional → logic_or ( "?" expression ":" conditional )?
    fn conditional(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.or()?;

        while self.match_token(&[TokenType::QUESTION_MARK]) {
            let then_branch: Expr = self.expression()?;

            self.consume(
                &TokenType::COLON,
                "Expect ':' after then branch of conditional expression.",
            )?;

            let else_branch: Expr = self.conditional()?;

            expr = Expr::Conditional {
                condition: Box::new(expr),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            };
        }

        Ok(expr)
    }

    /// logic_or → logic_and ( "or" logic_and )*
    fn or(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.and()?;

        while self.match_token(&[TokenType::OR]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.and()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// logic_and → equality ( "and" equality )*
    fn and(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.equality()?;

        while self.match_token(&[TokenType::AND]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.equality()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// equality → comparison ( ( "!=" | "==" ) comparison )*
    fn equality(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.comparison()?;

        while self.match_token(&[TokenType::BANG_EQUAL, TokenType::EQUAL_EQUAL]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.comparison()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// comparison → term ( ( ">" | ">=" | "<" | "<=" ) term )*
    fn comparison(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.term()?;

        while self.match_token(&[
            TokenType::GREATER,
            TokenType::GREATER_EQUAL,
            TokenType::LESS,
            TokenType::LESS_EQUAL,
        ]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.term()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// term → factor ( ( "-" | "+" ) factor )*
    fn term(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.factor()?;

        while self.match_token(&[TokenType::MINUS, TokenType::PLUS]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.factor()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// factor → unary ( ( "/" | "*" ) unary )*
    fn factor(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.unary()?;

        while self.match_token(&[TokenType::SLASH, TokenType::STAR]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.unary()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// unary → ( "!" | "-" ) unary | call
    fn unary(&mut self) -> Result<Expr> {
        if self.match_token(&[TokenType::BANG, TokenType::MINUS]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.unary()?;

            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }

        self.call()
    }

    /// call → primary ( "(" arguments? ")" | "." IDENT )*
    ///
    /// A call is a postfix operator starting with `(`: in `f()()` the second
    /// call's callee is the whole `f()` expression.
    fn call(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.primary()?;

        loop {
            if self.match_token(&[TokenType::LEFT_PAREN]) {
                expr = self.finish_call(expr)?;
            } else if self.match_token(&[TokenType::DOT]) {
                let name: Token =
                    self.consume(&TokenType::IDENTIFIER, "Expect property name after '.'.")?;

                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// arguments → expression ( "," expression )*
    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        // The comma operator must not swallow arguments.  The latch is saved
        // and restored (not flatly cleared) so it survives a nested call
        // inside an outer argument list, on the error path too.
        let enclosing_no_comma: bool = self.no_comma_expr;
        self.no_comma_expr = true;

        let result: Result<(Token, Vec<Expr>)> = self.call_arguments();

        self.no_comma_expr = enclosing_no_comma;

        let (paren, arguments) = result?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn call_arguments(&mut self) -> Result<(Token, Vec<Expr>)> {
        let mut arguments: Vec<Expr> = Vec::new();

        if !self.check(&TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() >= 255 {
                    let token: Token = self.peek().clone();
                    self.error(&token, "Can't have more than 255 arguments.");
                }

                arguments.push(self.expression()?);

                if !self.match_token(&[TokenType::COMMA]) {
                    break;
                }
            }
        }

        let paren: Token = self.consume(&TokenType::RIGHT_PAREN, "Expect ')' after arguments.")?;

        Ok((paren, arguments))
    }

    /// primary → NUMBER | STRING | "true" | "false" | "nil" | IDENT
    ///         | "this" | "(" expression ")" | "fun" "(" params? ")" block
    fn primary(&mut self) -> Result<Expr> {
        if self.match_token(&[TokenType::FALSE]) {
            return Ok(Expr::Literal(LiteralValue::False));
        }

        if self.match_token(&[TokenType::TRUE]) {
            return Ok(Expr::Literal(LiteralValue::True));
        }

        if self.match_token(&[TokenType::NIL]) {
            return Ok(Expr::Literal(LiteralValue::Nil));
        }

        // Placeholder payloads: `TokenType` equality is kind-based.
        if self.match_token(&[TokenType::NUMBER(0.0), TokenType::STRING(String::new())]) {
            let literal: LiteralValue = match &self.previous().token_type {
                TokenType::NUMBER(n) => LiteralValue::Number(*n),

                TokenType::STRING(s) => LiteralValue::Str(s.clone()),

                _ => unreachable!("only literal kinds matched above"),
            };

            return Ok(Expr::Literal(literal));
        }

        if self.match_token(&[TokenType::IDENTIFIER]) {
            let name: Token = self.previous().clone();

            return Ok(Expr::Variable {
                id: self.fresh_id(),
                name,
            });
        }

        if self.match_token(&[TokenType::THIS]) {
            let keyword: Token = self.previous().clone();

            return Ok(Expr::This {
                id: self.fresh_id(),
                keyword,
            });
        }

        if self.match_token(&[TokenType::LEFT_PAREN]) {
            let expr: Expr = self.expression()?;

            self.consume(&TokenType::RIGHT_PAREN, "Expect ')' after expression.")?;

            return Ok(Expr::Grouping(Box::new(expr)));
        }

        if self.match_token(&[TokenType::FUN]) {
            return Ok(Expr::Function(self.function_body("function")?));
        }

        let token: Token = self.peek().clone();
        Err(self.error(&token, "Expect expression."))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Cursor helpers
    // ─────────────────────────────────────────────────────────────────────

    #[inline]
    fn fresh_id(&mut self) -> ExprId {
        let id: ExprId = self.next_id;
        self.next_id += 1;
        id
    }

    fn match_token(&mut self, types: &[TokenType]) -> bool {
        for token_type in types {
            if self.check(token_type) {
                self.advance();
                return true;
            }
        }

        false
    }

    #[inline]
    fn check(&self, token_type: &TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        &self.peek().token_type == token_type
    }

    fn check_next(&self, token_type: &TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        match self.tokens.get(self.current + 1) {
            Some(token) if token.token_type != TokenType::EOF => &token.token_type == token_type,

            _ => false,
        }
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline]
    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::EOF
    }

    #[inline]
    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    #[inline]
    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn consume(&mut self, token_type: &TokenType, message: &str) -> Result<Token> {
        if self.check(token_type) {
            return Ok(self.advance().clone());
        }

        let token: Token = self.peek().clone();
        Err(self.error(&token, message))
    }

    /// Reports through the sink and builds the error the caller unwinds
    /// with.  Call sites that recover in place just drop the return value.
    fn error(&mut self, token: &Token, message: &str) -> LoxError {
        self.reporter.token_error(token, message);
        LoxError::parse(token.line, message)
    }

    /// Panic-mode recovery: discard tokens until just past a `;` or in
    /// front of a statement-starter keyword.
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().token_type == TokenType::SEMICOLON {
                return;
            }

            match self.peek().token_type {
                TokenType::CLASS
                | TokenType::FUN
                | TokenType::VAR
                | TokenType::FOR
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::PRINT
                | TokenType::RETURN => return,

                _ => {}
            }

            self.advance();
        }
    }
}
