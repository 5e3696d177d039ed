//! Lox interpreter: evaluates resolved AST nodes with a tree-walking interpreter.
//!
//! Variable references the resolver bound to a depth are looked up exactly
//! that many frames above the current one; everything else goes to the
//! globals. Frames live in an arena (see [`env`]) so closures can share and
//! cycle through them freely.

pub mod env;
pub mod flow;
pub mod function;
pub mod interpreter;
pub mod value;

pub use env::{EnvId, Environments};
pub use function::{Callable, Function, NativeFunction};
pub use interpreter::{Interpreter, MAX_NESTING, STACK_SIZE};
pub use value::Value;
