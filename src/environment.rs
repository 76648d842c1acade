use std::{
    cell::RefCell,
    collections::HashMap,
    rc::{Rc, Weak},
};

use crate::{
    error::{EvalError, EvalResult},
    value::Value,
};

/// A scope: named bindings plus a non-owning link to the enclosing scope.
///
/// The global scope has no parent. A closure's scope gets its parent only when
/// the closure is fully applied, at which point it is linked to the caller.
pub struct Environment {
    bindings: RefCell<HashMap<String, Value>>,
    parent: RefCell<Weak<Environment>>,
}

impl Environment {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            bindings: RefCell::new(HashMap::new()),
            parent: RefCell::new(Weak::new()),
        })
    }

    pub fn parent(&self) -> Option<Rc<Environment>> {
        self.parent.borrow().upgrade()
    }

    pub fn set_parent(&self, parent: &Rc<Environment>) {
        *self.parent.borrow_mut() = Rc::downgrade(parent);
    }

    /// Looks `name` up through the scope chain and returns a copy of the bound
    /// value.
    pub fn get(&self, name: &str) -> EvalResult<Value> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Ok(value.clone());
        }
        match self.parent() {
            Some(parent) => parent.get(name),
            None => Err(EvalError::UnboundSymbol(name.to_string())),
        }
    }

    pub fn set_local(&self, name: impl Into<String>, value: Value) {
        self.bindings.borrow_mut().insert(name.into(), value);
    }

    pub fn set_global(&self, name: impl Into<String>, value: Value) {
        match self.parent() {
            Some(parent) => parent.set_global(name, value),
            None => self.set_local(name, value),
        }
    }

    /// A new scope with copies of every binding, linked to the same parent.
    pub fn copy(&self) -> Rc<Self> {
        Rc::new(Self {
            bindings: RefCell::new(self.bindings.borrow().clone()),
            parent: RefCell::new(self.parent.borrow().clone()),
        })
    }

    /// Local bindings only, sorted by name.
    pub fn local_bindings(&self) -> Vec<(String, Value)> {
        let mut bindings: Vec<(String, Value)> = self
            .bindings
            .borrow()
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        bindings.sort_by(|a, b| a.0.cmp(&b.0));
        bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn child_of(parent: &Rc<Environment>) -> Rc<Environment> {
        let child = Environment::new();
        child.set_parent(parent);
        child
    }

    #[test]
    fn lookup_walks_the_parent_chain() {
        let global = Environment::new();
        global.set_local("x", Value::Number(1));
        let middle = child_of(&global);
        let inner = child_of(&middle);

        assert_eq!(inner.get("x"), Ok(Value::Number(1)));
        assert_eq!(
            inner.get("missing"),
            Err(EvalError::UnboundSymbol("missing".to_string()))
        );
    }

    #[test]
    fn local_bindings_shadow_outer_ones() {
        let global = Environment::new();
        global.set_local("x", Value::Number(1));
        let local = child_of(&global);
        local.set_local("x", Value::Number(2));

        assert_eq!(local.get("x"), Ok(Value::Number(2)));
        assert_eq!(global.get("x"), Ok(Value::Number(1)));
    }

    #[test]
    fn set_local_replaces_existing_binding() {
        let env = Environment::new();
        env.set_local("x", Value::Number(1));
        env.set_local("x", Value::Number(2));
        assert_eq!(env.get("x"), Ok(Value::Number(2)));
        assert_eq!(
            env.local_bindings(),
            vec![("x".to_string(), Value::Number(2))]
        );
    }

    #[test]
    fn set_global_writes_to_the_root() {
        let global = Environment::new();
        let middle = child_of(&global);
        let inner = child_of(&middle);
        inner.set_global("y", Value::Number(5));

        assert_eq!(global.get("y"), Ok(Value::Number(5)));
        assert!(inner.local_bindings().is_empty());
        assert!(middle.local_bindings().is_empty());
        assert!(Rc::ptr_eq(&inner.parent().unwrap().parent().unwrap(), &global));
    }

    #[test]
    fn lookups_return_copies() {
        let env = Environment::new();
        env.set_local("xs", Value::QExpr(vec![Value::Number(1)]));

        let mut copy = env.get("xs").unwrap();
        if let Value::QExpr(cells) = &mut copy {
            cells.push(Value::Number(2));
        }
        assert_eq!(env.get("xs"), Ok(Value::QExpr(vec![Value::Number(1)])));
    }

    #[test]
    fn copy_keeps_parent_but_not_bindings() {
        let global = Environment::new();
        global.set_local("g", Value::Number(0));
        let scope = child_of(&global);
        scope.set_local("a", Value::Number(1));

        let copy = scope.copy();
        copy.set_local("a", Value::Number(2));

        assert_eq!(scope.get("a"), Ok(Value::Number(1)));
        assert_eq!(copy.get("a"), Ok(Value::Number(2)));
        assert_eq!(copy.get("g"), Ok(Value::Number(0)));
        assert!(Rc::ptr_eq(&copy.parent().unwrap(), &global));
    }

    #[test]
    fn parent_link_does_not_keep_the_parent_alive() {
        let scope = Environment::new();
        {
            let caller = Environment::new();
            scope.set_parent(&caller);
            assert!(scope.parent().is_some());
        }
        assert!(scope.parent().is_none());
    }
}
