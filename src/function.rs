use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::callable::LoxCallable;
use crate::class::LoxInstance;
use crate::environment::Environment;
use crate::error::LoxError;
use crate::expr::FunctionExpr;
use crate::interpreter::{Interpreter, Signal};
use crate::value::Value;

/// A user-defined function: the declaration it was parsed from, the
/// environment active where it was *declared* (its closure), an optional
/// source name, and whether it is a class initializer (`init`).
pub struct LoxFunction {
    name: Option<String>,
    declaration: Rc<FunctionExpr>,
    closure: Rc<RefCell<Environment>>,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        name: Option<String>,
        declaration: Rc<FunctionExpr>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        LoxFunction {
            name,
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Produces a copy of this function whose closure is prepended with a
    /// one-entry scope mapping `this` to the given instance.  Method access
    /// goes through here, so `this` inside the body resolves at hop distance
    /// matching the injected scope.
    pub fn bind(&self, instance: Rc<RefCell<LoxInstance>>) -> LoxFunction {
        let mut scope: Environment = Environment::with_enclosing(Rc::clone(&self.closure));
        scope.define("this", Value::Instance(instance));

        LoxFunction {
            name: self.name.clone(),
            declaration: Rc::clone(&self.declaration),
            closure: Rc::new(RefCell::new(scope)),
            is_initializer: self.is_initializer,
        }
    }

    /// The instance bound as `this` in the closure of a bound initializer.
    fn bound_instance(&self, line: usize) -> Result<Value, Signal> {
        Environment::get_at(&self.closure, 0, "this").ok_or_else(|| {
            Signal::Error(LoxError::runtime(line, "Undefined variable 'this'."))
        })
    }
}

impl LoxCallable for LoxFunction {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> Result<Value, Signal> {
        // Each call gets a fresh frame enclosing the captured closure, never
        // the caller's environment.  Recursive calls in flight each hold
        // their own frame.
        let mut environment: Environment = Environment::with_enclosing(Rc::clone(&self.closure));

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.define(&param.lexeme, argument);
        }

        let first_line: usize = self
            .declaration
            .params
            .first()
            .map_or(0, |param| param.line);

        match interpreter.execute_block(&self.declaration.body, Rc::new(RefCell::new(environment)))
        {
            Err(Signal::Return(value)) => {
                if self.is_initializer {
                    self.bound_instance(first_line)
                } else {
                    Ok(value)
                }
            }

            Err(signal) => Err(signal),

            Ok(()) => {
                if self.is_initializer {
                    self.bound_instance(first_line)
                } else {
                    Ok(Value::Nil)
                }
            }
        }
    }
}

/// Shallow on purpose: the closure chain can contain cycles (methods capture
/// the environment holding their class), so derived formatting must not
/// recurse into it.
impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxFunction")
            .field("name", &self.name)
            .field("arity", &self.declaration.params.len())
            .field("is_initializer", &self.is_initializer)
            .finish()
    }
}
