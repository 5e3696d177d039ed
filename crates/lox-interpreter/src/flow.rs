//! Control flow for the interpreter.

use crate::value::Value;

/// How a statement finished.
#[derive(Debug)]
pub(crate) enum Flow {
    /// Fall through to the next statement
    Normal,
    /// Unwind to the nearest function call with the given value
    Return(Value),
}
