//! Lexical scopes.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::mem;
use std::rc::Rc;

use crate::common::error::ScriptError;
use crate::script::value::Value;

/// Shared handle to a scope; closures keep their defining scope alive.
pub type Env = Rc<Scope>;

#[derive(Debug, Clone)]
struct Binding {
    value: Value,
    mutable: bool,
}

/// One level of the scope chain.
pub struct Scope {
    vars: RefCell<HashMap<String, Binding>>,
    parent: Option<Env>,
}

impl Scope {
    /// Creates a root scope.
    pub fn global() -> Env {
        Rc::new(Self {
            vars: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    /// Creates a scope nested in `parent`.
    pub fn child(parent: &Env) -> Env {
        Rc::new(Self {
            vars: RefCell::new(HashMap::new()),
            parent: Some(Rc::clone(parent)),
        })
    }

    /// Copies this scope's bindings into a new sibling scope.
    ///
    /// Used by `for (let ...)` so each iteration's closures see their own copy.
    pub fn fork(&self) -> Env {
        Rc::new(Self {
            vars: RefCell::new(self.vars.borrow().clone()),
            parent: self.parent.clone(),
        })
    }

    /// Binds `name` in this scope, replacing any binding it already has.
    pub fn declare(&self, name: &str, value: Value, mutable: bool) {
        let _ = self
            .vars
            .borrow_mut()
            .insert(name.to_string(), Binding { value, mutable });
    }

    /// Returns `true` if `name` is bound in this scope (parents excluded).
    pub fn has_own(&self, name: &str) -> bool {
        self.vars.borrow().contains_key(name)
    }

    /// Resolves `name` through the scope chain.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(binding) = self.vars.borrow().get(name) {
            return Some(binding.value.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.lookup(name))
    }

    /// Updates the nearest binding of `name`.
    ///
    /// Returns `Ok(false)` if no scope binds it.
    pub fn assign(&self, name: &str, value: Value) -> Result<bool, ScriptError> {
        if let Some(binding) = self.vars.borrow_mut().get_mut(name) {
            if !binding.mutable {
                return Err(ScriptError::Type(
                    "Assignment to constant variable.".to_string(),
                ));
            }
            binding.value = value;
            return Ok(true);
        }
        match &self.parent {
            Some(parent) => parent.assign(name, value),
            None => Ok(false),
        }
    }

    /// Drops every binding, breaking closure reference cycles.
    pub fn clear(&self) {
        let vars = mem::take(&mut *self.vars.borrow_mut());
        drop(vars);
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let vars = self.vars.borrow();
        let mut names: Vec<&String> = vars.keys().collect();
        names.sort();
        f.debug_struct("Scope")
            .field("vars", &names)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}
