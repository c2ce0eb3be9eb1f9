//! Operator and built-in semantics shared by lowered code and hosts.
//!
//! Every function here takes already-evaluated operands. Type mismatches and
//! arithmetic failures surface as runtime diagnostics without a position; the
//! caller attaches one.

use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};

use crate::{
    array::{check_length, Array},
    diagnostics::{runtime_error, Result, SolfegeError},
    value::{ArrayRef, Value},
};

fn mismatch(op: &str, lhs: &Value, rhs: &Value) -> SolfegeError {
    runtime_error(format!(
        "cannot apply `{op}` to {} and {}",
        lhs.value_type(),
        rhs.value_type()
    ))
}

fn overflow() -> SolfegeError {
    runtime_error("number overflow")
}

pub fn add(lhs: &Value, rhs: &Value) -> Result<Value> {
    match (lhs, rhs) {
        (Value::String(_), _) | (_, Value::String(_)) => {
            let joined = format!("{lhs}{rhs}");
            check_length(Some(joined.chars().count()))?;
            Ok(Value::String(joined))
        }
        (Value::Number(a), Value::Number(b)) => {
            a.checked_add(*b).map(Value::Number).ok_or_else(overflow)
        }
        (Value::Array(a), Value::Array(b)) => Ok(Value::from(a.borrow().concat(&b.borrow())?)),
        _ => Err(mismatch("+", lhs, rhs)),
    }
}

pub fn subtract(lhs: &Value, rhs: &Value) -> Result<Value> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => {
            a.checked_sub(*b).map(Value::Number).ok_or_else(overflow)
        }
        _ => Err(mismatch("-", lhs, rhs)),
    }
}

/// Numeric product, or repetition when a string or array is multiplied by a
/// number.
pub fn multiply(lhs: &Value, rhs: &Value) -> Result<Value> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => {
            a.checked_mul(*b).map(Value::Number).ok_or_else(overflow)
        }
        (Value::String(_) | Value::Array(_), Value::Number(_)) => repeat(lhs, rhs),
        _ => Err(mismatch("*", lhs, rhs)),
    }
}

pub fn divide(lhs: &Value, rhs: &Value) -> Result<Value> {
    match (lhs, rhs) {
        (Value::Number(_), Value::Number(b)) if b.is_zero() => {
            Err(runtime_error("division by zero"))
        }
        (Value::Number(a), Value::Number(b)) => {
            a.checked_div(*b).map(Value::Number).ok_or_else(overflow)
        }
        _ => Err(mismatch("/", lhs, rhs)),
    }
}

pub fn not(v: &Value) -> Result<Value> {
    match v {
        Value::Bool(b) => Ok(Value::Bool(!b)),
        other => Err(runtime_error(format!(
            "cannot apply `not` to {}",
            other.value_type()
        ))),
    }
}

pub fn negate(v: &Value) -> Result<Value> {
    match v {
        Value::Number(n) => Ok(Value::Number(-*n)),
        other => Err(runtime_error(format!(
            "cannot negate {}",
            other.value_type()
        ))),
    }
}

pub fn eq(lhs: &Value, rhs: &Value) -> Value {
    Value::Bool(lhs == rhs)
}

pub fn not_eq(lhs: &Value, rhs: &Value) -> Value {
    Value::Bool(lhs != rhs)
}

pub fn less_than(lhs: &Value, rhs: &Value) -> Value {
    Value::Bool(match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a < b,
        (Value::String(a), Value::String(b)) => a < b,
        _ => false,
    })
}

pub fn less_than_or_equals(lhs: &Value, rhs: &Value) -> Value {
    Value::Bool(less_than(lhs, rhs).as_bool() || lhs == rhs)
}

pub fn greater_than(lhs: &Value, rhs: &Value) -> Value {
    Value::Bool(match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a > b,
        (Value::String(a), Value::String(b)) => a > b,
        _ => false,
    })
}

pub fn greater_than_or_equals(lhs: &Value, rhs: &Value) -> Value {
    Value::Bool(greater_than(lhs, rhs).as_bool() || lhs == rhs)
}

fn length_of(v: &Value) -> Result<usize> {
    match v {
        Value::String(s) => Ok(s.chars().count()),
        Value::Array(array) => Ok(array.borrow().len()),
        other => Err(runtime_error(format!(
            "{} has no length",
            other.value_type()
        ))),
    }
}

/// Characters of a string or elements of an array.
pub fn length(v: &Value) -> Result<Value> {
    length_of(v).map(|len| Value::Number(Decimal::from(len)))
}

pub fn reverse(v: &Value) -> Result<Value> {
    match v {
        Value::String(s) => Ok(Value::String(s.chars().rev().collect())),
        Value::Array(array) => Ok(Value::from(array.borrow().reversed())),
        other => Err(runtime_error(format!(
            "cannot reverse {}",
            other.value_type()
        ))),
    }
}

/// Integer part of a numeric operand, saturating at the `i64` range.
fn integer_part(v: &Value, what: &str) -> Result<i64> {
    match v {
        Value::Number(n) => Ok(n.trunc().to_i64().unwrap_or(if n.is_sign_negative() {
            i64::MIN
        } else {
            i64::MAX
        })),
        other => Err(runtime_error(format!(
            "{what} must be a number but found {}",
            other.value_type()
        ))),
    }
}

/// Sub-range `start..end` of a string or array.
///
/// A negative `start` counts back from the end. A negative `end` is taken as
/// `length + end + 1`, so `-1` reaches through the last element.
pub fn slice(v: &Value, start: &Value, end: &Value) -> Result<Value> {
    let len = length_of(v)? as i64;
    let start = integer_part(start, "slice start")?;
    let end = integer_part(end, "slice end")?;
    let start = if start < 0 { len.saturating_add(start) } else { start };
    let end = if end < 0 {
        len.saturating_add(end).saturating_add(1)
    } else {
        end
    };
    let start = start.clamp(0, (len - 1).max(0)) as usize;
    let end = end.clamp(0, len) as usize;
    match v {
        Value::String(s) => Ok(Value::String(
            s.chars()
                .skip(start)
                .take(end.saturating_sub(start))
                .collect(),
        )),
        Value::Array(array) => Ok(Value::from(array.borrow().span(start, end))),
        _ => unreachable!("length_of accepted a non-sequence"),
    }
}

/// `v` repeated `n` times. A fractional count appends a leading part of `v`
/// proportional to the fraction; a negative count repeats the reversed
/// value.
pub fn repeat(v: &Value, n: &Value) -> Result<Value> {
    if !matches!(v, Value::String(_) | Value::Array(_)) {
        return Err(runtime_error(format!(
            "cannot repeat {}",
            v.value_type()
        )));
    }
    let count = match n {
        Value::Number(count) => *count,
        other => {
            return Err(runtime_error(format!(
                "repeat count must be a number but found {}",
                other.value_type()
            )));
        }
    };
    if count.is_sign_negative() && !count.is_zero() {
        return repeat(&reverse(v)?, &Value::Number(-count));
    }

    let len = length_of(v)?;
    if count.is_zero() || len == 0 {
        return Ok(match v {
            Value::String(_) => Value::string(""),
            _ => Value::from(Array::new()),
        });
    }
    let whole = count.trunc();
    let tail = (Decimal::from(len) * (count - whole))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_usize()
        .unwrap_or(len)
        .min(len);
    let copies = whole.to_usize();
    let total = check_length(
        copies
            .and_then(|copies| len.checked_mul(copies))
            .and_then(|total| total.checked_add(tail)),
    )?;
    let copies = copies.unwrap_or_default();
    match v {
        Value::String(s) => {
            let mut repeated = String::with_capacity(s.len() * (copies + 1));
            for _ in 0..copies {
                repeated.push_str(s);
            }
            repeated.extend(s.chars().take(tail));
            Ok(Value::String(repeated))
        }
        Value::Array(array) => {
            let array = array.borrow();
            let mut items = Vec::with_capacity(total);
            for _ in 0..copies {
                items.extend(array.iter().cloned());
            }
            items.extend(array.iter().take(tail).cloned());
            Ok(Value::array(items))
        }
        _ => unreachable!("checked above"),
    }
}

pub fn member_access(receiver: &Value, name: &str) -> Result<Value> {
    match receiver {
        Value::Object(object) => object.borrow().get(name),
        other => Err(runtime_error(format!(
            "cannot access member `{name}` of {}",
            other.value_type()
        ))),
    }
}

pub fn set_member(receiver: &Value, name: &str, value: Value) -> Result<()> {
    match receiver {
        Value::Object(object) => {
            object.borrow_mut().set(name, value);
            Ok(())
        }
        other => Err(runtime_error(format!(
            "cannot set member `{name}` of {}",
            other.value_type()
        ))),
    }
}

pub fn function_call(f: &Value, args: &[Value]) -> Result<Value> {
    match f {
        Value::Function(function) => function.call(args),
        other => Err(runtime_error(format!(
            "cannot call {}",
            other.value_type()
        ))),
    }
}

pub fn init_array(items: Vec<Value>) -> Value {
    Value::array(items)
}

fn range_bound(v: &Value, what: &str) -> Result<Decimal> {
    match v {
        Value::Number(n) => Ok(*n),
        other => Err(runtime_error(format!(
            "range {what} must be a number but found {}",
            other.value_type()
        ))),
    }
}

/// Inclusive range `from to to [step step]`.
///
/// Without a step the range counts by one towards `to`. A step pointing away
/// from `to` yields an empty array.
pub fn init_array_by_to(from: &Value, to: &Value, step: Option<&Value>) -> Result<Value> {
    let from = range_bound(from, "start")?;
    let to = range_bound(to, "end")?;
    let step = match step {
        Some(step) => range_bound(step, "step")?,
        None if to >= from => Decimal::ONE,
        None => Decimal::NEGATIVE_ONE,
    };
    if to == from {
        return Ok(Value::array(vec![Value::Number(from)]));
    }
    if step.is_zero() {
        return Err(runtime_error("range step cannot be zero"));
    }
    let distance = to.checked_sub(from).ok_or_else(overflow)?;
    if distance.is_sign_positive() != step.is_sign_positive() {
        return Ok(Value::array(Vec::new()));
    }
    let count = check_length(
        distance
            .checked_div(step)
            .and_then(|steps| steps.trunc().to_usize())
            .and_then(|steps| steps.checked_add(1)),
    )?;
    let mut items = Vec::with_capacity(count);
    let mut current = from;
    for i in 0..count {
        if i > 0 {
            current = current.checked_add(step).ok_or_else(overflow)?;
        }
        items.push(Value::Number(current));
    }
    Ok(Value::array(items))
}

fn array_and_index<'a>(v: &'a Value, index: &Value) -> Result<(&'a ArrayRef, i64)> {
    let array = match v {
        Value::Array(array) => array,
        other => {
            return Err(runtime_error(format!(
                "cannot index into {}",
                other.value_type()
            )));
        }
    };
    let index = match index {
        Value::Number(n) if index.is_integer() => n
            .to_i64()
            .ok_or_else(|| runtime_error(format!("index {n} out of range")))?,
        other => {
            return Err(runtime_error(format!(
                "array index must be an integer but found {other}"
            )));
        }
    };
    Ok((array, index))
}

pub fn array_item(v: &Value, index: &Value) -> Result<Value> {
    let (array, index) = array_and_index(v, index)?;
    array.borrow().item(index)
}

/// Writing past the end grows the array with `none`.
pub fn set_array_item(v: &Value, index: &Value, item: Value) -> Result<()> {
    let (array, index) = array_and_index(v, index)?;
    array.borrow_mut().set_item(index, item)
}
