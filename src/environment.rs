use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{LoxError, Result};
use crate::value::Value;

/// One scope: a binding frame with an optional link to its enclosing frame.
///
/// Frames are shared (`Rc`) and interior-mutable (`RefCell`) because a block
/// that ends normally releases its scope while a closure declared inside it
/// may keep the same scope alive.  Method closures that capture the class
/// environment form reference cycles; those frames leak, which is accepted.
#[derive(Debug, Clone)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Binds `name` in this frame, shadowing any outer binding.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Whether `name` is bound in this frame (the chain is not consulted).
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Dynamic lookup by name, walking the chain outwards.  Used for globals,
    /// whose uses carry no resolved hop distance.
    pub fn get(&self, name: &str, line: usize) -> Result<Value> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    /// Dynamic assignment by name, walking the chain outwards.
    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<()> {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    /// Reads `name` exactly `distance` frames up from `env`.
    ///
    /// The resolver guarantees the binding exists at that hop; `None` only
    /// surfaces if that guarantee is broken, and the caller maps it to an
    /// undefined-variable error.
    pub fn get_at(env: &Rc<RefCell<Environment>>, distance: usize, name: &str) -> Option<Value> {
        let frame: Rc<RefCell<Environment>> = Self::ancestor(env, distance)?;
        let value: Option<Value> = frame.borrow().values.get(name).cloned();
        value
    }

    /// Writes `name` exactly `distance` frames up from `env`.  Returns
    /// whether the binding existed there.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        value: Value,
    ) -> bool {
        match Self::ancestor(env, distance) {
            Some(frame) => {
                frame.borrow_mut().values.insert(name.to_string(), value);
                true
            }

            None => false,
        }
    }

    fn ancestor(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
    ) -> Option<Rc<RefCell<Environment>>> {
        let mut frame: Rc<RefCell<Environment>> = Rc::clone(env);

        for _ in 0..distance {
            let enclosing: Option<Rc<RefCell<Environment>>> = frame.borrow().enclosing.clone();
            frame = enclosing?;
        }

        Some(frame)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
