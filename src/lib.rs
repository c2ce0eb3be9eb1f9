//! Core library for the Solfege scripting language.
//! Implements lexing, parsing, lowering to closures, and the runtime value
//! model a host embeds through [`Engine`].

pub mod array;
pub mod ast;
pub mod block;
pub mod compiler;
pub mod diagnostics;
pub mod engine;
pub mod function;
pub mod lexer;
pub mod library;
pub mod lookahead;
pub mod object;
pub mod operations;
pub mod parser;
pub mod token;
pub mod value;

pub use diagnostics::{Diagnostic, DiagnosticKind, SolfegeError, SourcePosition};
pub use engine::{CompiledProgram, Engine};
pub use library::{Console, Library, NoopSystemHook, SystemHook};
pub use value::{Value, ValueType};
