//! Environment arena for the Lox interpreter.
//!
//! Frames live in one `Vec` owned by the interpreter and refer to their
//! parent through an [`EnvId`] handle. A closure stores a handle to the
//! frame it was created in, so a function held in a variable of that same
//! frame is a cycle of handles, not of owners.
//!
//! Frames are allocated in stack order. When a block or call finishes and no
//! closure has captured any frame created since it started, everything from
//! its frame upward is released.
//!
//! The capture watermark only rises. Every frame at or below the newest
//! captured one stays allocated until the arena is dropped, whether or not a
//! live closure still refers to it, so a loop that keeps creating closures
//! grows the arena by a few frames per iteration. `Interpreter::reset`
//! reclaims everything.

use std::collections::HashMap;

use lox_syntax::error::{Error, Result};
use lox_syntax::token::Token;

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvId(u32);

impl EnvId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Default)]
struct Frame {
    /// Variables defined in this scope
    values: HashMap<String, Value>,
    /// Parent frame (None for the globals)
    enclosing: Option<EnvId>,
}

#[derive(Debug)]
pub struct Environments {
    frames: Vec<Frame>,
    /// Highest frame any closure has captured
    captured: Option<EnvId>,
}

impl Default for Environments {
    fn default() -> Self {
        Self::new()
    }
}

impl Environments {
    /// An arena holding only the globals frame.
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
            captured: None,
        }
    }

    pub fn globals(&self) -> EnvId {
        EnvId(0)
    }

    pub fn new_frame(&mut self, enclosing: Option<EnvId>) -> EnvId {
        let id = EnvId(self.frames.len() as u32);
        self.frames.push(Frame {
            values: HashMap::new(),
            enclosing,
        });
        id
    }

    /// Number of live frames, globals included.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Records that a closure holds `env`; it and its ancestors stay alive.
    pub fn capture(&mut self, env: EnvId) {
        if self.captured.map_or(true, |c| c.0 < env.0) {
            self.captured = Some(env);
        }
    }

    /// Frees `env` and every newer frame unless a closure captured one of them.
    ///
    /// `env` must have been the newest frame when it was allocated.
    pub fn release(&mut self, env: EnvId) {
        if env.index() == 0 || self.captured.is_some_and(|c| c.0 >= env.0) {
            return;
        }
        self.frames.truncate(env.index());
    }

    pub fn define(&mut self, env: EnvId, name: impl Into<String>, value: Value) {
        if let Some(frame) = self.frames.get_mut(env.index()) {
            frame.values.insert(name.into(), value);
        }
    }

    /// Dynamic lookup along the parent chain.
    pub fn get(&self, env: EnvId, name: &Token) -> Result<Value> {
        let mut current = Some(env);
        while let Some(id) = current {
            let frame = self.frame(id)?;
            if let Some(v) = frame.values.get(&name.lexeme) {
                return Ok(v.clone());
            }
            current = frame.enclosing;
        }
        Err(undefined(name))
    }

    /// Dynamic assignment along the parent chain; the name must exist.
    pub fn assign(&mut self, env: EnvId, name: &Token, value: Value) -> Result<()> {
        let mut current = Some(env);
        while let Some(id) = current {
            let frame = self.frame_mut(id)?;
            if let Some(slot) = frame.values.get_mut(&name.lexeme) {
                *slot = value;
                return Ok(());
            }
            current = frame.enclosing;
        }
        Err(undefined(name))
    }

    /// The frame `depth` parents above `env`.
    pub fn ancestor(&self, env: EnvId, depth: usize) -> Result<EnvId> {
        let mut id = env;
        for _ in 0..depth {
            id = self
                .frame(id)?
                .enclosing
                .ok_or_else(|| Error::new("Scope depth exceeds environment chain."))?;
        }
        Ok(id)
    }

    pub fn get_at(&self, env: EnvId, depth: usize, name: &Token) -> Result<Value> {
        let target = self.ancestor(env, depth)?;
        self.frame(target)?
            .values
            .get(&name.lexeme)
            .cloned()
            .ok_or_else(|| undefined(name))
    }

    pub fn assign_at(&mut self, env: EnvId, depth: usize, name: &Token, value: Value) -> Result<()> {
        let target = self.ancestor(env, depth)?;
        match self.frame_mut(target)?.values.get_mut(&name.lexeme) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(undefined(name)),
        }
    }

    pub fn vars_snapshot(&self, env: EnvId) -> Vec<(String, Value)> {
        self.frames
            .get(env.index())
            .map(|frame| {
                frame
                    .values
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn frame(&self, id: EnvId) -> Result<&Frame> {
        self.frames.get(id.index()).ok_or_else(dangling)
    }

    fn frame_mut(&mut self, id: EnvId) -> Result<&mut Frame> {
        self.frames.get_mut(id.index()).ok_or_else(dangling)
    }
}

fn undefined(name: &Token) -> Error {
    Error::at_token(name, format!("Undefined variable '{}'.", name.lexeme))
}

fn dangling() -> Error {
    Error::new("Dangling environment handle.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lox_syntax::token::TokenKind;

    fn ident(name: &str) -> Token {
        Token::new(TokenKind::Ident, name, None, 1, 1)
    }

    #[test]
    fn test_lookup_by_depth_and_by_chain() {
        let mut envs = Environments::new();
        let globals = envs.globals();
        envs.define(globals, "a", Value::Number(1.0));
        let outer = envs.new_frame(Some(globals));
        envs.define(outer, "a", Value::Number(2.0));
        let inner = envs.new_frame(Some(outer));

        assert_eq!(envs.get_at(inner, 1, &ident("a")).unwrap(), Value::Number(2.0));
        assert_eq!(envs.get_at(inner, 2, &ident("a")).unwrap(), Value::Number(1.0));
        assert_eq!(envs.get(inner, &ident("a")).unwrap(), Value::Number(2.0));
        assert!(envs.get_at(inner, 0, &ident("a")).is_err());
        assert!(envs.ancestor(inner, 3).is_err());
    }

    #[test]
    fn test_assign_at_targets_one_frame() {
        let mut envs = Environments::new();
        let outer = envs.new_frame(Some(envs.globals()));
        envs.define(outer, "x", Value::Nil);
        let inner = envs.new_frame(Some(outer));
        envs.define(inner, "x", Value::Nil);

        envs.assign_at(inner, 1, &ident("x"), Value::Bool(true)).unwrap();
        assert_eq!(envs.get_at(inner, 0, &ident("x")).unwrap(), Value::Nil);
        assert_eq!(envs.get_at(inner, 1, &ident("x")).unwrap(), Value::Bool(true));

        let err = envs.assign(inner, &ident("missing"), Value::Nil).unwrap_err();
        assert_eq!(err.msg, "Undefined variable 'missing'.");
    }

    #[test]
    fn test_release_respects_captures() {
        let mut envs = Environments::new();
        let block = envs.new_frame(Some(envs.globals()));
        envs.new_frame(Some(block));
        assert_eq!(envs.len(), 3);
        envs.release(block);
        assert_eq!(envs.len(), 1);

        let kept = envs.new_frame(Some(envs.globals()));
        let nested = envs.new_frame(Some(kept));
        envs.capture(nested);
        envs.release(kept);
        assert_eq!(envs.len(), 3);

        // the globals frame is never released
        envs.release(envs.globals());
        assert_eq!(envs.len(), 3);
    }

    #[test]
    fn test_frames_below_the_watermark_are_retained() {
        let mut envs = Environments::new();
        let block = envs.new_frame(Some(envs.globals()));
        let call = envs.new_frame(Some(block));
        envs.capture(call);
        envs.release(call);
        envs.release(block);
        // neither frame is referenced by a live closure any more
        assert_eq!(envs.len(), 3);

        // frames above the watermark are still reclaimed
        let later = envs.new_frame(Some(envs.globals()));
        envs.new_frame(Some(later));
        envs.release(later);
        assert_eq!(envs.len(), 3);
    }
}
