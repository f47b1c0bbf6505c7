use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::interpreter::value::Value;
use crate::interpreter::RuntimeError;
use crate::scanner::token::Token;

/// One scope in the chain. Blocks get a fresh child of whatever scope was
/// active when they were entered; lookups and assignments walk outwards.
#[derive(Debug, Default)]
pub struct Environment {
    enclosing: Option<Rc<Environment>>,
    values: RefCell<HashMap<String, Value>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_with_enclosing(enclosing: Rc<Environment>) -> Self {
        Self {
            enclosing: Some(enclosing),
            values: RefCell::new(HashMap::new()),
        }
    }

    pub fn enclosing(&self) -> Option<&Rc<Environment>> {
        self.enclosing.as_ref()
    }

    /// Always binds in this scope; redefining a name here simply overwrites it.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.values.borrow_mut().insert(name.into(), value);
    }

    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        let mut scope = Some(self);
        while let Some(env) = scope {
            if let Some(value) = env.values.borrow().get(&name.lexeme) {
                return Ok(value.clone());
            }
            scope = env.enclosing.as_deref();
        }
        Err(undefined(name))
    }

    /// Never declares: the name must already exist somewhere in the chain.
    pub fn assign(&self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        let mut scope = Some(self);
        while let Some(env) = scope {
            if let Some(slot) = env.values.borrow_mut().get_mut(&name.lexeme) {
                *slot = value;
                return Ok(());
            }
            scope = env.enclosing.as_deref();
        }
        Err(undefined(name))
    }
}

fn undefined(name: &Token) -> RuntimeError {
    RuntimeError {
        token: name.clone(),
        message: format!("Undefined variable '{}'.", name.lexeme),
    }
}
