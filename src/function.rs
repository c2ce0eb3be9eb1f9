use std::{cell::Cell, fmt, rc::Rc};

use crate::{
    block::{Block, BlockRef},
    diagnostics::{runtime_error, Result},
    value::Value,
};

/// Lowered code, run against the scope it executes in.
pub type Executable = Rc<dyn Fn(&BlockRef) -> Result<Value>>;

pub type NativeCallback = Rc<dyn Fn(&[Value]) -> Result<Value>>;

/// Nesting limit for calls when the host does not choose one.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 8192;

/// Native stack budgeted for each nested script call.
pub const STACK_PER_CALL: usize = 32 * 1024;

/// Stack a thread needs to reach `max_call_depth` nested calls.
pub fn stack_size_for(max_call_depth: usize) -> usize {
    max_call_depth
        .saturating_mul(STACK_PER_CALL)
        .saturating_add(1024 * 1024)
}

thread_local! {
    static CALL_DEPTH: Cell<usize> = const { Cell::new(0) };
    static CALL_LIMIT: Cell<usize> = const { Cell::new(DEFAULT_MAX_CALL_DEPTH) };
}

/// Applies a call depth limit to this thread until dropped.
pub struct CallLimit {
    previous: usize,
}

impl CallLimit {
    pub fn apply(max_call_depth: usize) -> Self {
        let previous = CALL_LIMIT.with(|limit| limit.replace(max_call_depth));
        CallLimit { previous }
    }
}

impl Drop for CallLimit {
    fn drop(&mut self) {
        CALL_LIMIT.with(|limit| limit.set(self.previous));
    }
}

struct CallDepthGuard;

impl CallDepthGuard {
    fn enter() -> Result<Self> {
        let limit = CALL_LIMIT.with(Cell::get);
        CALL_DEPTH.with(|depth| {
            if depth.get() >= limit {
                return Err(runtime_error(format!(
                    "maximum call depth of {limit} exceeded"
                )));
            }
            depth.set(depth.get() + 1);
            Ok(CallDepthGuard)
        })
    }
}

impl Drop for CallDepthGuard {
    fn drop(&mut self) {
        CALL_DEPTH.with(|depth| depth.set(depth.get() - 1));
    }
}

#[derive(Clone)]
enum FunctionBody {
    /// Script body together with the scope it closes over.
    Script { body: Executable, scope: BlockRef },
    Native(NativeCallback),
}

#[derive(Clone)]
pub struct Function {
    name: String,
    params: Vec<String>,
    body: FunctionBody,
}

impl Function {
    pub fn script(
        name: impl Into<String>,
        params: Vec<String>,
        body: Executable,
        scope: BlockRef,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            body: FunctionBody::Script { body, scope },
        }
    }

    pub fn native<F>(name: impl Into<String>, params: &[&str], callback: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + 'static,
    {
        Self {
            name: name.into(),
            params: params.iter().map(|param| param.to_string()).collect(),
            body: FunctionBody::Native(Rc::new(callback)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Script bodies run in a fresh child of the captured scope with every
    /// parameter bound locally.
    #[tracing::instrument(level = "trace", skip_all, fields(function = %self.name))]
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        if args.len() != self.arity() {
            return Err(runtime_error(format!(
                "function `{}` expected {} arguments but received {}",
                self.name,
                self.arity(),
                args.len()
            )));
        }
        let _depth = CallDepthGuard::enter()?;
        match &self.body {
            FunctionBody::Script { body, scope } => {
                let activation = Block::with_parent(scope);
                {
                    let mut activation = activation.borrow_mut();
                    for (param, arg) in self.params.iter().zip(args) {
                        activation.define(param.clone(), arg.clone());
                    }
                }
                body(&activation)
            }
            FunctionBody::Native(callback) => callback(args),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "func {}({})", self.name, self.params.join(", "))
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.body {
            FunctionBody::Script { .. } => "script",
            FunctionBody::Native(_) => "native",
        };
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("kind", &kind)
            .finish()
    }
}
