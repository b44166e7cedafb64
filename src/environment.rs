use crate::error::{ExecResult, RuntimeError};
use crate::value::Value;
use std::collections::HashMap;

/// A single scope frame: local variables of a call, the global scope, or the
/// field table of an instance.  Frames never chain to an enclosing frame, so a
/// method body sees only its parameters and `self`.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
        }
    }

    /// Bind `name`, creating it or overwriting the previous value.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> ExecResult<Value> {
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::NameNotFound(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}
