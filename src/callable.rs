use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{LoxError, Result};
use crate::interpreter::{Interpreter, Signal};
use crate::value::Value;

/// Protocol shared by everything the `Call` expression can invoke: user
/// functions, native functions and classes.
pub trait LoxCallable {
    fn arity(&self) -> usize;

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> std::result::Result<Value, Signal>;
}

/// A callable provided by the host.
#[derive(Debug)]
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value]) -> Result<Value>,
}

impl LoxCallable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(
        &self,
        _interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> std::result::Result<Value, Signal> {
        (self.func)(&arguments).map_err(Signal::Error)
    }
}

/// `clock()`: current Unix time in seconds.
pub fn clock_native(_args: &[Value]) -> Result<Value> {
    let timestamp: f64 = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| LoxError::runtime(0, format!("Clock error: {}", e)))?
        .as_secs_f64();

    Ok(Value::Number(timestamp))
}
