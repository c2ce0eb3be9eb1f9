use std::fmt;

use indexmap::IndexMap;

use crate::{
    diagnostics::{runtime_error, Result},
    value::Value,
};

/// Named bag of members, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Object {
    name: String,
    members: IndexMap<String, Value>,
}

impl Object {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: IndexMap::new(),
        }
    }

    pub fn with_members(name: impl Into<String>, members: IndexMap<String, Value>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.members.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Result<Value> {
        self.members.get(name).cloned().ok_or_else(|| {
            runtime_error(format!("undefined member `{name}` of object {}", self.name))
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    pub fn members(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.members.iter()
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object {}", self.name)
    }
}
