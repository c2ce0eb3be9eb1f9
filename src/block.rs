use std::{
    cell::RefCell,
    mem,
    rc::{Rc, Weak},
};

use indexmap::IndexMap;

use crate::{
    diagnostics::{runtime_error, Result},
    value::Value,
};

pub type BlockRef = Rc<RefCell<Block>>;

/// Scopes of one run that script functions have captured.
///
/// A function stored in the scope it closes over forms a reference cycle.
/// Releasing the arena clears every captured scope that is still alive,
/// which breaks those cycles once the run is over.
#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: RefCell<Vec<Weak<RefCell<Block>>>>,
}

impl ScopeArena {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    fn track(&self, scope: &BlockRef) {
        let mut scopes = self.scopes.borrow_mut();
        if scopes
            .last()
            .is_some_and(|last| Weak::ptr_eq(last, &Rc::downgrade(scope)))
        {
            return;
        }
        if scopes.len() == scopes.capacity() {
            scopes.retain(|tracked| tracked.strong_count() > 0);
        }
        scopes.push(Rc::downgrade(scope));
    }

    /// Drops the variables of every tracked scope that is still alive.
    pub fn release(&self) {
        let scopes = mem::take(&mut *self.scopes.borrow_mut());
        for scope in scopes.iter().filter_map(Weak::upgrade) {
            let variables = mem::take(&mut scope.borrow_mut().variables);
            drop(variables);
        }
    }
}

/// One lexical scope. Lookups walk outward through `parent`.
#[derive(Debug, Default)]
pub struct Block {
    parent: Option<BlockRef>,
    variables: IndexMap<String, Value>,
    arena: Option<Rc<ScopeArena>>,
}

impl Block {
    pub fn new() -> BlockRef {
        Self::with_variables(None, IndexMap::new())
    }

    pub fn with_parent(parent: &BlockRef) -> BlockRef {
        Self::with_variables(Some(Rc::clone(parent)), IndexMap::new())
    }

    /// Child scopes share the arena of their parent.
    pub fn with_variables(parent: Option<BlockRef>, variables: IndexMap<String, Value>) -> BlockRef {
        let arena = parent
            .as_ref()
            .and_then(|parent| parent.borrow().arena.clone());
        Rc::new(RefCell::new(Self {
            parent,
            variables,
            arena,
        }))
    }

    /// Root scope of a run whose captured scopes are tracked by `arena`.
    pub fn in_arena(arena: &Rc<ScopeArena>, variables: IndexMap<String, Value>) -> BlockRef {
        let root = Rc::new(RefCell::new(Self {
            parent: None,
            variables,
            arena: Some(Rc::clone(arena)),
        }));
        arena.track(&root);
        root
    }

    /// Records that a closure holds on to `block`.
    pub fn capture(block: &BlockRef) {
        let arena = block.borrow().arena.clone();
        if let Some(arena) = arena {
            arena.track(block);
        }
    }

    pub fn parent(&self) -> Option<BlockRef> {
        self.parent.clone()
    }

    /// Binds `name` in this scope, shadowing any outer binding.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn contains_local(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn get_variable(block: &BlockRef, name: &str) -> Result<Value> {
        let mut current = Rc::clone(block);
        loop {
            let parent = {
                let scope = current.borrow();
                if let Some(value) = scope.variables.get(name) {
                    return Ok(value.clone());
                }
                scope.parent.clone()
            };
            match parent {
                Some(parent) => current = parent,
                None => return Err(runtime_error(format!("undefined variable `{name}`"))),
            }
        }
    }

    /// Writes to the nearest scope that already binds `name`, or defines it
    /// in `block` when no scope does.
    pub fn set_variable(block: &BlockRef, name: &str, value: Value) {
        let target = Self::binding_scope(block, name).unwrap_or_else(|| Rc::clone(block));
        target.borrow_mut().define(name, value);
    }

    fn binding_scope(block: &BlockRef, name: &str) -> Option<BlockRef> {
        let mut current = Rc::clone(block);
        loop {
            if current.borrow().contains_local(name) {
                return Some(current);
            }
            let parent = current.borrow().parent.clone()?;
            current = parent;
        }
    }

    pub fn root(block: &BlockRef) -> BlockRef {
        let mut current = Rc::clone(block);
        loop {
            let parent = current.borrow().parent();
            match parent {
                Some(parent) => current = parent,
                None => return current,
            }
        }
    }
}
