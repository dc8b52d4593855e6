use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::callable::LoxCallable;
use crate::error::{LoxError, Result};
use crate::function::LoxFunction;
use crate::interpreter::{Interpreter, Signal};
use crate::token::Token;
use crate::value::Value;

/// A class: its name and its behavior.  Instances store state; the class
/// stores the methods they share.
#[derive(Debug)]
pub struct LoxClass {
    pub name: String,
    methods: HashMap<String, Rc<LoxFunction>>,
}

impl LoxClass {
    pub fn new(name: String, methods: HashMap<String, Rc<LoxFunction>>) -> Self {
        LoxClass { name, methods }
    }

    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        self.methods.get(name).cloned()
    }
}

/// Calling a class instantiates it.  Implemented on `Rc<LoxClass>` because
/// the fresh instance needs to hold the class handle itself.
impl LoxCallable for Rc<LoxClass> {
    fn arity(&self) -> usize {
        match self.find_method("init") {
            Some(initializer) => initializer.arity(),

            None => 0,
        }
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> std::result::Result<Value, Signal> {
        let instance: Rc<RefCell<LoxInstance>> =
            Rc::new(RefCell::new(LoxInstance::new(Rc::clone(self))));

        if let Some(initializer) = self.find_method("init") {
            initializer
                .bind(Rc::clone(&instance))
                .call(interpreter, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

/// An open bag of named values plus a reference to the owning class.
/// Fields are created by plain assignment; nothing is declared up front.
#[derive(Debug)]
pub struct LoxInstance {
    class: Rc<LoxClass>,
    fields: HashMap<String, Value>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        LoxInstance {
            class,
            fields: HashMap::new(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class.name
    }

    /// Property lookup: fields first, then class methods bound to this
    /// instance.  Fields therefore shadow methods of the same name.
    pub fn get(instance: &Rc<RefCell<LoxInstance>>, name: &Token) -> Result<Value> {
        if let Some(value) = instance.borrow().fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(method) = instance.borrow().class.find_method(&name.lexeme) {
            let bound: LoxFunction = method.bind(Rc::clone(instance));
            return Ok(Value::Function(Rc::new(bound)));
        }

        Err(LoxError::runtime(
            name.line,
            format!("Undefined property '{}'.", name.lexeme),
        ))
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }
}
