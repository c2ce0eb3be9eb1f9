use std::{
    fs,
    io::{self, BufRead, Write},
    panic,
    path::PathBuf,
    process::ExitCode,
    thread,
};

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use solfege::{
    diagnostics::Result,
    function::{stack_size_for, DEFAULT_MAX_CALL_DEPTH},
    Console, Engine, Library, NoopSystemHook, Value,
};

#[derive(Parser)]
#[command(author, version, about = "Solfege language interpreter")]
struct Args {
    /// Log filter used when SOLFEGE_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a Solfege script file
    Run { script: PathBuf },
    /// Evaluate a snippet and print its final value
    Eval { source: String },
    /// Parse a script without running it
    Check { script: PathBuf },
}

/// Console bound to the process's stdin and stdout.
struct StdConsole;

impl Console for StdConsole {
    fn write_line(&mut self, value: &Value) -> Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{value}")?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<Value> {
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(Value::None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']);
        Ok(Value::string(trimmed))
    }
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_env("SOLFEGE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(true))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args.log_level);
    let command = args.command;
    // Scripts run on a worker whose stack fits the engine's call depth.
    let worker = thread::Builder::new()
        .name("solfege".to_string())
        .stack_size(stack_size_for(DEFAULT_MAX_CALL_DEPTH))
        .spawn(move || {
            let engine = Engine::new(Library::standard(StdConsole, NoopSystemHook));
            execute(&engine, command)
        });
    let result = match worker {
        Ok(handle) => match handle.join() {
            Ok(result) => result,
            Err(payload) => panic::resume_unwind(payload),
        },
        Err(err) => Err(err.into()),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn execute(engine: &Engine, command: Command) -> Result<()> {
    match command {
        Command::Run { script } => {
            engine.execute_file(&script)?;
        }
        Command::Eval { source } => {
            let value = engine.execute_str("<eval>", &source)?;
            if !value.is_none() {
                println!("{value}");
            }
        }
        Command::Check { script } => {
            let file = fs::File::open(&script)?;
            engine.compile(&script.display().to_string(), file)?;
            println!("{}: ok", script.display());
        }
    }
    Ok(())
}
