use crate::expr::{Expr, LiteralValue};
use crate::value::number_to_string;

/// Converts an expression to a parenthesized prefix form, e.g.
/// `1 + 2 * 3` → `(+ 1 (* 2 3))`.  Debugging aid; the parser tests use it to
/// assert tree shapes without pattern-matching every node.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal(lit) => match lit {
                LiteralValue::True => "true".into(),

                LiteralValue::False => "false".into(),

                LiteralValue::Nil => "nil".into(),

                LiteralValue::Str(s) => s.clone(),

                LiteralValue::Number(n) => number_to_string(*n),
            },

            // ── grouping ────────────────────────────────────────────────
            Expr::Grouping(inner) => format!("(group {})", Self::print(inner)),

            // ── unary operator ──────────────────────────────────────────
            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print(right))
            }

            // ── binary / logical operators ──────────────────────────────
            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            // ── conditional ─────────────────────────────────────────────
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => format!(
                "(?: {} {} {})",
                Self::print(condition),
                Self::print(then_branch),
                Self::print(else_branch)
            ),

            // ── bindings ────────────────────────────────────────────────
            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, Self::print(value))
            }

            Expr::This { .. } => "this".into(),

            // ── calls and properties ────────────────────────────────────
            Expr::Call {
                callee, arguments, ..
            } => {
                let mut s: String = format!("(call {}", Self::print(callee));
                for arg in arguments {
                    s.push(' ');
                    s.push_str(&Self::print(arg));
                }
                s.push(')');
                s
            }

            Expr::Get { object, name } => {
                format!("(. {} {})", Self::print(object), name.lexeme)
            }

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(set {} {} {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),

            // ── anonymous function ──────────────────────────────────────
            Expr::Function(declaration) => {
                let params: Vec<&str> = declaration
                    .params
                    .iter()
                    .map(|p| p.lexeme.as_str())
                    .collect();

                format!("(fun ({}))", params.join(" "))
            }
        }
    }
}
