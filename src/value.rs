use std::{cell::RefCell, fmt, rc::Rc, str::FromStr, thread::LocalKey};

use rust_decimal::Decimal;

use crate::{
    array::Array,
    diagnostics::{runtime_error, Result},
    function::Function,
    object::Object,
};

pub type ArrayRef = Rc<RefCell<Array>>;
pub type ObjectRef = Rc<RefCell<Object>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    None,
    Bool,
    Number,
    String,
    Object,
    Array,
    Function,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A runtime value. Arrays and objects are shared handles: cloning the
/// value aliases the same storage.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Number(Decimal),
    String(String),
    Object(ObjectRef),
    Array(ArrayRef),
    Function(Rc<Function>),
}

impl Value {
    pub fn number(value: impl Into<Decimal>) -> Self {
        Value::Number(value.into())
    }

    pub fn string(value: impl Into<String>) -> Self {
        Value::String(value.into())
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(Array::from(items))))
    }

    pub fn object(object: Object) -> Self {
        Value::Object(Rc::new(RefCell::new(object)))
    }

    pub fn function(function: Function) -> Self {
        Value::Function(Rc::new(function))
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::None => ValueType::None,
            Value::Bool(_) => ValueType::Bool,
            Value::Number(_) => ValueType::Number,
            Value::String(_) => ValueType::String,
            Value::Object(_) => ValueType::Object,
            Value::Array(_) => ValueType::Array,
            Value::Function(_) => ValueType::Function,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// True for numbers without a fractional part.
    pub fn is_integer(&self) -> bool {
        matches!(self, Value::Number(n) if n.fract().is_zero())
    }

    pub fn as_bool(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            other => wrong_tag(ValueType::Bool, other),
        }
    }

    pub fn as_number(&self) -> Decimal {
        match self {
            Value::Number(n) => *n,
            other => wrong_tag(ValueType::Number, other),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Value::String(s) => s,
            other => wrong_tag(ValueType::String, other),
        }
    }

    pub fn as_array(&self) -> &ArrayRef {
        match self {
            Value::Array(array) => array,
            other => wrong_tag(ValueType::Array, other),
        }
    }

    pub fn as_object(&self) -> &ObjectRef {
        match self {
            Value::Object(object) => object,
            other => wrong_tag(ValueType::Object, other),
        }
    }

    pub fn as_function(&self) -> &Rc<Function> {
        match self {
            Value::Function(function) => function,
            other => wrong_tag(ValueType::Function, other),
        }
    }

    /// Converts through the string form of the value. `None` and `String`
    /// targets always succeed; `Bool` only accepts `true`/`false`.
    pub fn convert_type(&self, target: ValueType) -> Result<Value> {
        if self.value_type() == target {
            return Ok(self.clone());
        }
        let text = self.to_string();
        let converted = match target {
            ValueType::None => Some(Value::None),
            ValueType::String => Some(Value::String(text.clone())),
            ValueType::Bool => match text.as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            ValueType::Number => Decimal::from_str(text.trim()).ok().map(Value::Number),
            ValueType::Object | ValueType::Array | ValueType::Function => None,
        };
        converted.ok_or_else(|| runtime_error(format!("cannot convert `{text}` to {target}")))
    }
}

fn wrong_tag(expected: ValueType, found: &Value) -> ! {
    panic!(
        "value payload accessed as {expected} but the value is {}",
        found.value_type()
    )
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Array> for Value {
    fn from(value: Array) -> Self {
        Value::Array(Rc::new(RefCell::new(value)))
    }
}

type Visiting<K> = RefCell<Vec<K>>;

thread_local! {
    /// Containers whose rendering is in progress on this thread.
    static RENDERING: Visiting<*const ()> = const { RefCell::new(Vec::new()) };
    /// Array pairs whose comparison is in progress on this thread.
    static COMPARING: Visiting<(*const (), *const ())> = const { RefCell::new(Vec::new()) };
}

/// Marks `key` as being visited until dropped. Entering a key that is
/// already being visited yields `None`, which is how cycles are detected.
struct Visit<K: PartialEq + 'static> {
    stack: &'static LocalKey<Visiting<K>>,
}

impl<K: PartialEq + 'static> Visit<K> {
    fn enter(stack: &'static LocalKey<Visiting<K>>, key: K) -> Option<Self> {
        stack.with(|visiting| {
            let mut visiting = visiting.borrow_mut();
            if visiting.contains(&key) {
                return None;
            }
            visiting.push(key);
            Some(Visit { stack })
        })
    }
}

impl<K: PartialEq + 'static> Drop for Visit<K> {
    fn drop(&mut self) {
        self.stack.with(|visiting| {
            visiting.borrow_mut().pop();
        });
    }
}

fn container_key<T>(container: &Rc<RefCell<T>>) -> *const () {
    Rc::as_ptr(container).cast()
}

/// Element-wise comparison. A pair met again while it is still being
/// compared counts as equal, so cyclic arrays terminate.
fn arrays_eq(a: &ArrayRef, b: &ArrayRef) -> bool {
    if Rc::ptr_eq(a, b) {
        return true;
    }
    match Visit::enter(&COMPARING, (container_key(a), container_key(b))) {
        Some(_visit) => *a.borrow() == *b.borrow(),
        None => true,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => arrays_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "none"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", n.normalize()),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Array(array) => match Visit::enter(&RENDERING, container_key(array)) {
                Some(_visit) => f.debug_list().entries(array.borrow().iter()).finish(),
                None => write!(f, "[...]"),
            },
            Value::Object(object) => match Visit::enter(&RENDERING, container_key(object)) {
                Some(_visit) => f
                    .debug_map()
                    .entries(object.borrow().members())
                    .finish(),
                None => write!(f, "{{...}}"),
            },
            Value::Function(function) => write!(f, "<{function}>"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "none"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", n.normalize()),
            Value::String(s) => write!(f, "{s}"),
            Value::Array(array) => match Visit::enter(&RENDERING, container_key(array)) {
                Some(_visit) => write!(f, "{}", array.borrow()),
                None => write!(f, "[...]"),
            },
            Value::Object(object) => write!(f, "{}", object.borrow()),
            Value::Function(function) => write!(f, "{function}"),
        }
    }
}
