use std::{fmt, slice};

use crate::{
    diagnostics::{runtime_error, Result, SolfegeError},
    value::Value,
};

/// Longest array or string a script may build.
pub const MAX_LENGTH: usize = 1 << 24;

/// Fails when `len` is unknown (overflowed) or above [`MAX_LENGTH`].
pub fn check_length(len: Option<usize>) -> Result<usize> {
    match len {
        Some(len) if len <= MAX_LENGTH => Ok(len),
        _ => Err(runtime_error(format!(
            "sequence length exceeds the limit of {MAX_LENGTH}"
        ))),
    }
}

/// Growable, 0-indexed sequence of values. Slots created by growth hold
/// `none`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Array {
    items: Vec<Value>,
}

fn out_of_range(index: i64) -> SolfegeError {
    runtime_error(format!("index {index} out of range"))
}

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Value> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.items
    }

    pub fn item(&self, index: i64) -> Result<Value> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.items.get(i))
            .cloned()
            .ok_or_else(|| out_of_range(index))
    }

    /// Writes past the end grow the array first.
    pub fn set_item(&mut self, index: i64, value: Value) -> Result<()> {
        if index < 0 {
            return Err(out_of_range(index));
        }
        if index as u64 >= self.items.len() as u64 {
            self.set_len(index.saturating_add(1))?;
        }
        self.items[index as usize] = value;
        Ok(())
    }

    /// Truncates or pads with `none`.
    pub fn set_len(&mut self, len: i64) -> Result<()> {
        let len = usize::try_from(len)
            .map_err(|_| runtime_error(format!("array length cannot be negative: {len}")))?;
        let len = check_length(Some(len))?;
        self.items.resize(len, Value::None);
        Ok(())
    }

    pub fn push(&mut self, value: Value) {
        self.items.push(value);
    }

    pub fn concat(&self, other: &Array) -> Result<Array> {
        check_length(self.items.len().checked_add(other.items.len()))?;
        Ok(self.items.iter().chain(other.items.iter()).cloned().collect())
    }

    /// Items in `start..end`, clamped to the array. Empty when `end <= start`.
    pub fn span(&self, start: usize, end: usize) -> Array {
        if end <= start {
            return Array::new();
        }
        let end = end.min(self.items.len());
        let start = start.min(end);
        Array::from(self.items[start..end].to_vec())
    }

    pub fn reversed(&self) -> Array {
        self.items.iter().rev().cloned().collect()
    }
}

impl From<Vec<Value>> for Array {
    fn from(items: Vec<Value>) -> Self {
        Self { items }
    }
}

impl FromIterator<Value> for Array {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Array {
    type Item = &'a Value;
    type IntoIter = slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (idx, value) in self.items.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, "]")
    }
}
