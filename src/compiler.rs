//! Lowers the syntax tree into reusable closures.
//!
//! Each node becomes an [`Executable`] that receives the scope it runs in.
//! Nested constructs derive their child scopes from that argument, so no
//! evaluation state is shared between calls.

use std::rc::Rc;

use crate::{
    ast::{BinaryOp, Literal, LogicalOp, Node, NodeKind, Program, UnaryOp},
    block::{Block, BlockRef},
    diagnostics::{runtime_error, Result, SourcePosition},
    function::{Executable, Function},
    operations,
    value::Value,
};

type BinaryFn = fn(&Value, &Value) -> Result<Value>;
type UnaryFn = fn(&Value) -> Result<Value>;

/// Lowers the top-level statements. The result runs directly in the scope
/// it is given, which the engine seeds with the host library.
pub fn lower_program(program: &Program) -> Executable {
    lower_statements(&program.body)
}

/// Runs statements in order and yields the last value, or `none` when empty.
fn lower_statements(nodes: &[Node]) -> Executable {
    let statements: Vec<Executable> = nodes.iter().map(lower).collect();
    Rc::new(move |scope: &BlockRef| {
        let mut last = Value::None;
        for statement in &statements {
            last = statement(scope)?;
        }
        Ok(last)
    })
}

/// Wraps `run` so errors without a position report `position`.
fn positioned<F>(position: &SourcePosition, run: F) -> Executable
where
    F: Fn(&BlockRef) -> Result<Value> + 'static,
{
    let position = position.clone();
    Rc::new(move |scope: &BlockRef| run(scope).map_err(|err| err.or_position(&position)))
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::None => Value::None,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Number(n) => Value::Number(*n),
        Literal::String(s) => Value::String(s.clone()),
    }
}

fn binary_operation(op: BinaryOp) -> BinaryFn {
    match op {
        BinaryOp::Add => operations::add,
        BinaryOp::Subtract => operations::subtract,
        BinaryOp::Multiply => operations::multiply,
        BinaryOp::Divide => operations::divide,
        BinaryOp::Equals => |l, r| Ok(operations::eq(l, r)),
        BinaryOp::NotEquals => |l, r| Ok(operations::not_eq(l, r)),
        BinaryOp::LessThan => |l, r| Ok(operations::less_than(l, r)),
        BinaryOp::LessThanOrEquals => |l, r| Ok(operations::less_than_or_equals(l, r)),
        BinaryOp::GreaterThan => |l, r| Ok(operations::greater_than(l, r)),
        BinaryOp::GreaterThanOrEquals => |l, r| Ok(operations::greater_than_or_equals(l, r)),
    }
}

fn unary_operation(op: UnaryOp) -> UnaryFn {
    match op {
        UnaryOp::Not => operations::not,
        UnaryOp::Negate => operations::negate,
    }
}

fn condition(value: Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(runtime_error(format!(
            "condition must be a bool but found {}",
            other.value_type()
        ))),
    }
}

fn logical_operand(op: LogicalOp, value: Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(b),
        other => {
            let keyword = match op {
                LogicalOp::And => "and",
                LogicalOp::Or => "or",
            };
            Err(runtime_error(format!(
                "operands of `{keyword}` must be bools but found {}",
                other.value_type()
            )))
        }
    }
}

/// Function bodies run straight in the activation scope the call creates.
fn lower_function_body(body: &Node) -> Executable {
    match &body.kind {
        NodeKind::Block(statements) => lower_statements(statements),
        _ => lower(body),
    }
}

pub fn lower(node: &Node) -> Executable {
    let position = &node.position;
    match &node.kind {
        NodeKind::Literal(literal) => {
            let value = literal_value(literal);
            let constant: Executable = Rc::new(move |_: &BlockRef| Ok(value.clone()));
            constant
        }
        NodeKind::Variable(name) => {
            let name = name.clone();
            positioned(position, move |scope| Block::get_variable(scope, &name))
        }
        NodeKind::Assign { name, value } => {
            let name = name.clone();
            let value = lower(value);
            positioned(position, move |scope| {
                let value = value(scope)?;
                Block::set_variable(scope, &name, value.clone());
                Ok(value)
            })
        }
        NodeKind::Binary { op, left, right } => {
            let apply = binary_operation(*op);
            let left = lower(left);
            let right = lower(right);
            positioned(position, move |scope| {
                let lhs = left(scope)?;
                let rhs = right(scope)?;
                apply(&lhs, &rhs)
            })
        }
        NodeKind::Unary { op, operand } => {
            let apply = unary_operation(*op);
            let operand = lower(operand);
            positioned(position, move |scope| apply(&operand(scope)?))
        }
        NodeKind::Logical { op, left, right } => {
            let op = *op;
            let left = lower(left);
            let right = lower(right);
            positioned(position, move |scope| {
                let lhs = logical_operand(op, left(scope)?)?;
                let result = match op {
                    LogicalOp::And if !lhs => false,
                    LogicalOp::Or if lhs => true,
                    _ => logical_operand(op, right(scope)?)?,
                };
                Ok(Value::Bool(result))
            })
        }
        NodeKind::MemberAccess { receiver, name } => {
            let receiver = lower(receiver);
            let name = name.clone();
            positioned(position, move |scope| {
                operations::member_access(&receiver(scope)?, &name)
            })
        }
        NodeKind::AssignMember {
            receiver,
            name,
            value,
        } => {
            let receiver = lower(receiver);
            let name = name.clone();
            let value = lower(value);
            positioned(position, move |scope| {
                let receiver = receiver(scope)?;
                let value = value(scope)?;
                operations::set_member(&receiver, &name, value.clone())?;
                Ok(value)
            })
        }
        NodeKind::FunctionCall { function, args } => {
            let function = lower(function);
            let args: Vec<Executable> = args.iter().map(lower).collect();
            positioned(position, move |scope| {
                let function = function(scope)?;
                let args = args
                    .iter()
                    .map(|arg| arg(scope))
                    .collect::<Result<Vec<_>>>()?;
                operations::function_call(&function, &args)
            })
        }
        NodeKind::InitArray(items) => {
            let items: Vec<Executable> = items.iter().map(lower).collect();
            positioned(position, move |scope| {
                let items = items
                    .iter()
                    .map(|item| item(scope))
                    .collect::<Result<Vec<_>>>()?;
                Ok(operations::init_array(items))
            })
        }
        NodeKind::InitArrayByTo { from, to, step } => {
            let from = lower(from);
            let to = lower(to);
            let step = step.as_deref().map(lower);
            positioned(position, move |scope| {
                let from = from(scope)?;
                let to = to(scope)?;
                let step = match &step {
                    Some(step) => Some(step(scope)?),
                    None => None,
                };
                operations::init_array_by_to(&from, &to, step.as_ref())
            })
        }
        NodeKind::ArrayItem { array, index } => {
            let array = lower(array);
            let index = lower(index);
            positioned(position, move |scope| {
                let array = array(scope)?;
                let index = index(scope)?;
                operations::array_item(&array, &index)
            })
        }
        NodeKind::AssignArrayItem {
            array,
            index,
            value,
        } => {
            let array = lower(array);
            let index = lower(index);
            let value = lower(value);
            positioned(position, move |scope| {
                let array = array(scope)?;
                let index = index(scope)?;
                let value = value(scope)?;
                operations::set_array_item(&array, &index, value.clone())?;
                Ok(value)
            })
        }
        NodeKind::If {
            test,
            then_branch,
            otherwise,
        } => {
            let test = lower(test);
            let then_branch = lower(then_branch);
            let otherwise = otherwise.as_deref().map(lower);
            positioned(position, move |scope| {
                if condition(test(scope)?)? {
                    then_branch(scope)
                } else {
                    match &otherwise {
                        Some(otherwise) => otherwise(scope),
                        None => Ok(Value::None),
                    }
                }
            })
        }
        NodeKind::For { test, body } => {
            let test = lower(test);
            let body = lower(body);
            positioned(position, move |scope| {
                while condition(test(scope)?)? {
                    body(scope)?;
                }
                Ok(Value::None)
            })
        }
        NodeKind::ForEach {
            variable,
            list,
            body,
        } => {
            let variable = variable.clone();
            let list = lower(list);
            let body = lower(body);
            positioned(position, move |scope| {
                let list = list(scope)?;
                let array = match &list {
                    Value::Array(array) => Rc::clone(array),
                    other => {
                        return Err(runtime_error(format!(
                            "cannot iterate over {}",
                            other.value_type()
                        )));
                    }
                };
                let mut i = 0;
                loop {
                    let item = {
                        let array = array.borrow();
                        match array.as_slice().get(i) {
                            Some(item) => item.clone(),
                            None => break,
                        }
                    };
                    Block::set_variable(scope, &variable, item);
                    body(scope)?;
                    i += 1;
                }
                Ok(Value::None)
            })
        }
        NodeKind::Block(statements) => {
            let statements = lower_statements(statements);
            let block: Executable =
                Rc::new(move |scope: &BlockRef| statements(&Block::with_parent(scope)));
            block
        }
        NodeKind::Function { name, params, body } => {
            let name = name.clone();
            let params = params.clone();
            let body = lower_function_body(body);
            positioned(position, move |scope| {
                Block::capture(scope);
                let function = Value::function(Function::script(
                    name.clone().unwrap_or_default(),
                    params.clone(),
                    Rc::clone(&body),
                    Rc::clone(scope),
                ));
                if let Some(name) = &name {
                    Block::set_variable(scope, name, function.clone());
                }
                Ok(function)
            })
        }
    }
}
