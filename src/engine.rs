use std::{
    fs::File,
    io::{self, Read},
    path::Path,
    thread::{self, JoinHandle},
};

use tracing::debug;

use crate::{
    block::{Block, ScopeArena},
    compiler,
    diagnostics::Result,
    function::{stack_size_for, CallLimit, Executable, DEFAULT_MAX_CALL_DEPTH},
    library::Library,
    parser,
    value::Value,
};

/// A parsed and lowered source, ready to run any number of times.
pub struct CompiledProgram {
    source_name: String,
    body: Executable,
}

impl CompiledProgram {
    pub fn source_name(&self) -> &str {
        &self.source_name
    }
}

/// Compiles sources and runs them against a host library.
///
/// Script calls nest at most [`Engine::max_call_depth`] deep. The thread
/// that runs a program needs [`Engine::stack_size`] bytes of stack to reach
/// that depth; [`Engine::spawn`] provides it.
#[derive(Debug)]
pub struct Engine {
    library: Library,
    max_call_depth: usize,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Library::default())
    }
}

impl Engine {
    pub fn new(library: Library) -> Self {
        Self {
            library,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn max_call_depth(&self) -> usize {
        self.max_call_depth
    }

    /// Stack needed by the thread that runs programs on this engine.
    pub fn stack_size(&self) -> usize {
        stack_size_for(self.max_call_depth)
    }

    /// Reads `input` to the end, then parses and lowers it.
    pub fn compile<R: Read>(&self, source_name: &str, mut input: R) -> Result<CompiledProgram> {
        let mut source = String::new();
        input.read_to_string(&mut source)?;
        self.compile_str(source_name, &source)
    }

    pub fn compile_str(&self, source_name: &str, source: &str) -> Result<CompiledProgram> {
        debug!(source = source_name, bytes = source.len(), "compiling");
        let program = parser::parse_program(source_name, source)?;
        debug!(
            source = source_name,
            statements = program.body.len(),
            "parsed program"
        );
        Ok(CompiledProgram {
            source_name: program.source_name.clone(),
            body: compiler::lower_program(&program),
        })
    }

    /// Runs `program` in a fresh root scope and returns the value of its
    /// last top-level statement.
    ///
    /// Scopes the run created are cleared when it ends, so script functions
    /// that outlive the run no longer see the variables they closed over.
    pub fn run(&self, program: &CompiledProgram) -> Result<Value> {
        debug!(source = %program.source_name, "running");
        let arena = ScopeArena::new();
        let root = Block::in_arena(&arena, self.library.bindings());
        let result = {
            let _limit = CallLimit::apply(self.max_call_depth);
            (program.body)(&root)
        };
        arena.release();
        match &result {
            Ok(value) => debug!(source = %program.source_name, result = %value, "finished"),
            Err(err) => debug!(source = %program.source_name, error = %err, "failed"),
        }
        result
    }

    pub fn execute<R: Read>(&self, source_name: &str, input: R) -> Result<Value> {
        let program = self.compile(source_name, input)?;
        self.run(&program)
    }

    pub fn execute_str(&self, source_name: &str, source: &str) -> Result<Value> {
        let program = self.compile_str(source_name, source)?;
        self.run(&program)
    }

    pub fn execute_file(&self, path: impl AsRef<Path>) -> Result<Value> {
        let path = path.as_ref();
        let file = File::open(path)?;
        self.execute(&path.display().to_string(), file)
    }

    /// Compiles and runs `source` on a new thread with the default call
    /// depth. Values are bound to the thread that creates them, so the
    /// library is built there by `make_library`.
    pub fn spawn<F>(
        source_name: impl Into<String>,
        source: impl Into<String>,
        make_library: F,
    ) -> io::Result<JoinHandle<Result<()>>>
    where
        F: FnOnce() -> Library + Send + 'static,
    {
        Self::spawn_with_call_depth(source_name, source, DEFAULT_MAX_CALL_DEPTH, make_library)
    }

    /// Like [`Engine::spawn`], with a stack sized for `max_call_depth`.
    pub fn spawn_with_call_depth<F>(
        source_name: impl Into<String>,
        source: impl Into<String>,
        max_call_depth: usize,
        make_library: F,
    ) -> io::Result<JoinHandle<Result<()>>>
    where
        F: FnOnce() -> Library + Send + 'static,
    {
        let source_name = source_name.into();
        let source = source.into();
        thread::Builder::new()
            .name(format!("solfege:{source_name}"))
            .stack_size(stack_size_for(max_call_depth))
            .spawn(move || {
                let engine = Engine::new(make_library()).with_max_call_depth(max_call_depth);
                engine.execute_str(&source_name, &source).map(|_| ())
            })
    }
}
