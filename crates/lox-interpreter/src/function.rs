//! Callable values: user functions (closures) and natives.

use std::fmt;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use lox_syntax::ast::FunctionDecl;
use lox_syntax::error::{Error, Result};

use crate::env::EnvId;
use crate::flow::Flow;
use crate::interpreter::Interpreter;
use crate::value::Value;

/// Anything a call expression can invoke.
///
/// `arguments.len() == self.arity()` is checked by the interpreter before
/// `call` runs.
pub trait Callable {
    fn arity(&self) -> usize;
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value>;
}

/// A function declaration paired with the frame it was declared in.
#[derive(Debug)]
pub struct Function {
    decl: Rc<FunctionDecl>,
    closure: EnvId,
}

impl Function {
    pub fn new(decl: Rc<FunctionDecl>, closure: EnvId) -> Self {
        Self { decl, closure }
    }

    pub fn name(&self) -> &str {
        &self.decl.name.lexeme
    }

    pub fn closure(&self) -> EnvId {
        self.closure
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        self.decl.params.len()
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        // parent is the defining frame, never the caller's
        let env = interpreter.environments_mut().new_frame(Some(self.closure));
        for (param, arg) in self.decl.params.iter().zip(arguments) {
            interpreter
                .environments_mut()
                .define(env, param.lexeme.clone(), arg);
        }
        match interpreter.execute_block(&self.decl.body, env)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Nil),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}

/// A built-in implemented in Rust.
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value]) -> Result<Value>,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, _interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        (self.func)(&arguments)
    }
}

impl fmt::Display for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn>")
    }
}

/// Natives predefined in every fresh global frame.
pub(crate) fn natives() -> Vec<NativeFunction> {
    vec![NativeFunction {
        name: "clock",
        arity: 0,
        func: clock,
    }]
}

fn clock(_args: &[Value]) -> Result<Value> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| Error::new(format!("System clock error: {}", e)))?;
    Ok(Value::Number(elapsed.as_secs_f64()))
}
