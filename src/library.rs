//! Host objects bound into the root scope of every run.
//!
//! The standard library exposes three objects: `Console`, `Convert` and
//! `System`. Console and System delegate to host traits so the embedding
//! application decides where text goes and what a tick does.

use std::{cell::RefCell, rc::Rc};

use indexmap::IndexMap;

use crate::{
    diagnostics::Result,
    function::Function,
    object::Object,
    value::{ObjectRef, Value, ValueType},
};

/// Text input and output for scripts.
pub trait Console {
    fn write_line(&mut self, value: &Value) -> Result<()>;

    /// Next input line without its terminator, or `none` at end of input.
    fn read_line(&mut self) -> Result<Value>;
}

/// Per-frame hook driven by `System.Update()`.
pub trait SystemHook {
    fn update(&mut self) -> Result<Value>;
}

/// System hook for hosts without a frame loop.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSystemHook;

impl SystemHook for NoopSystemHook {
    fn update(&mut self) -> Result<Value> {
        Ok(Value::None)
    }
}

/// Wraps a host callback as a function value.
pub fn native<F>(name: &str, params: &[&str], callback: F) -> Value
where
    F: Fn(&[Value]) -> Result<Value> + 'static,
{
    Value::function(Function::native(name, params, callback))
}

pub fn console_object<C: Console + 'static>(console: C) -> Object {
    let console = Rc::new(RefCell::new(console));
    let mut object = Object::new("Console");
    let writer = Rc::clone(&console);
    object.set(
        "WriteLine",
        native("WriteLine", &["v"], move |args| {
            writer.borrow_mut().write_line(&args[0])?;
            Ok(Value::None)
        }),
    );
    object.set(
        "ReadLine",
        native("ReadLine", &[], move |_| console.borrow_mut().read_line()),
    );
    object
}

pub fn convert_object() -> Object {
    let mut object = Object::new("Convert");
    let conversions = [
        ("ToString", ValueType::String),
        ("ToBool", ValueType::Bool),
        ("ToNumber", ValueType::Number),
    ];
    for (name, target) in conversions {
        object.set(
            name,
            native(name, &["v"], move |args| args[0].convert_type(target)),
        );
    }
    object
}

pub fn system_object<S: SystemHook + 'static>(system: S) -> Object {
    let system = RefCell::new(system);
    let mut object = Object::new("System");
    object.set(
        "Update",
        native("Update", &[], move |_| system.borrow_mut().update()),
    );
    object
}

/// Ordered set of host objects. Each one is bound in the root scope under
/// its own name.
#[derive(Debug, Default)]
pub struct Library {
    objects: Vec<ObjectRef>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Console`, `Convert` and `System`, in that order.
    pub fn standard<C, S>(console: C, system: S) -> Self
    where
        C: Console + 'static,
        S: SystemHook + 'static,
    {
        Self::new()
            .with_object(console_object(console))
            .with_object(convert_object())
            .with_object(system_object(system))
    }

    /// Adds `object`, replacing an earlier object of the same name.
    pub fn with_object(mut self, object: Object) -> Self {
        self.objects
            .retain(|existing| existing.borrow().name() != object.name());
        self.objects.push(Rc::new(RefCell::new(object)));
        self
    }

    pub fn objects(&self) -> &[ObjectRef] {
        &self.objects
    }

    /// Root-scope variables for a fresh run. Objects are shared between
    /// runs, so members a script sets stay visible to later runs.
    pub fn bindings(&self) -> IndexMap<String, Value> {
        self.objects
            .iter()
            .map(|object| {
                let name = object.borrow().name().to_string();
                (name, Value::Object(Rc::clone(object)))
            })
            .collect()
    }
}
