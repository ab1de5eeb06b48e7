use std::{collections::HashMap, iter};

use crate::{error::ErrorKind, value::Value};

/// Variable bindings for the global scope plus a stack of block scopes.
/// The innermost scope is the last element of `scopes`; its enclosing scope
/// is the one below it, and the globals enclose everything.
#[derive(Debug, Default)]
pub struct Environment {
    globals: HashMap<String, Value>,
    scopes: Vec<HashMap<String, Value>>,
}

impl Environment {
    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
        log::trace!("Entered scope at depth {}", self.depth());
    }

    /// The global scope is never popped.
    pub fn pop_scope(&mut self) {
        debug_assert!(!self.scopes.is_empty(), "Tried to pop the global scope");
        self.scopes.pop();
        log::trace!("Left scope, back at depth {}", self.depth());
    }

    /// Number of block scopes currently entered, 0 when only the globals are active.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Binds `name` in the innermost scope, replacing any binding of the same
    /// name in that scope and shadowing bindings in enclosing ones.
    pub fn define(&mut self, name: &str, value: Value) {
        self.scopes.last_mut().unwrap_or(&mut self.globals).insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Result<&Value, ErrorKind> {
        self.innermost_first()
            .find_map(|values| values.get(name))
            .ok_or_else(|| ErrorKind::UndefinedVariable(name.to_string()))
    }

    /// Overwrites the nearest existing binding of `name`. Never creates one.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), ErrorKind> {
        match self
            .scopes
            .iter_mut()
            .rev()
            .chain(iter::once(&mut self.globals))
            .find_map(|values| values.get_mut(name))
        {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(ErrorKind::UndefinedVariable(name.to_string())),
        }
    }

    fn innermost_first(&self) -> impl Iterator<Item = &HashMap<String, Value>> {
        self.scopes.iter().rev().chain(iter::once(&self.globals))
    }
}
