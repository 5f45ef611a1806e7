// quill - A small expression language with a bytecode VM, written in Rust
// Copyright (c) 2025 Tom Waddington. MIT licensed.

use std::env;
use std::fs;
use std::process;

use log::{LevelFilter, Log, Metadata, Record};
use quill_syntax::{Lexer, TokenKind};
use quill_vm::debug::disassemble_chunk;
use quill_vm::{InterpretError, VM, Value, compile};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

const EXIT_USAGE: i32 = 64;
const EXIT_COMPILE_ERROR: i32 = 65;
const EXIT_RUNTIME_ERROR: i32 = 70;
const EXIT_IO_ERROR: i32 = 74;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Writes log records to stderr.
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{}", record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

#[derive(Debug, Default)]
struct Options {
    tokens: bool,
    disassemble: bool,
    trace: bool,
    verbose: bool,
    path: Option<String>,
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    let options = match parse_args(&args) {
        Ok(Some(options)) => options,
        Ok(None) => return,
        Err(e) => {
            eprintln!("{}", e);
            usage();
            process::exit(EXIT_USAGE);
        }
    };

    init_logging(&options);

    match &options.path {
        Some(path) => run_file(path, &options),
        None => run_repl(&options),
    }
}

/// Parse command-line flags. `Ok(None)` means the request was fully handled.
fn parse_args(args: &[String]) -> Result<Option<Options>, String> {
    let mut options = Options::default();

    for arg in args {
        match arg.as_str() {
            "--version" | "-v" => {
                println!("Quill v{}", VERSION);
                return Ok(None);
            }
            "--help" | "-h" => {
                usage();
                return Ok(None);
            }
            "--tokens" => options.tokens = true,
            "--disassemble" => options.disassemble = true,
            "--trace" => options.trace = true,
            "--verbose" => options.verbose = true,
            flag if flag.starts_with('-') => {
                return Err(format!("Unknown option: {}", flag));
            }
            path => {
                if options.path.is_some() {
                    return Err("Only one script path may be given".into());
                }
                options.path = Some(path.to_string());
            }
        }
    }

    Ok(Some(options))
}

fn usage() {
    eprintln!(
        r#"Usage: quill [OPTIONS] [SCRIPT]

Runs SCRIPT, or starts a REPL when no script is given.

OPTIONS:
    --tokens        Print the token stream before running
    --disassemble   Print the compiled bytecode before running
    --trace         Trace every executed instruction to stderr
    --verbose       Log compiler and VM phases to stderr
    -v, --version   Print version
    -h, --help      Show this message"#
    );
}

fn init_logging(options: &Options) {
    let level = if options.trace {
        LevelFilter::Trace
    } else if options.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

/// Run a script file, exiting with the conventional status on failure.
fn run_file(path: &str, options: &Options) {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading '{}': {}", path, e);
            process::exit(EXIT_IO_ERROR);
        }
    };

    let mut vm = VM::new();
    match run_source(&mut vm, &source, options) {
        Ok(value) => println!("{}", value),
        Err(e) => {
            eprintln!("{}", e);
            process::exit(exit_code(&e));
        }
    }
}

/// Run the interactive REPL
fn run_repl(options: &Options) {
    println!("Quill v{}", VERSION);

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Could not initialise line editor: {}", e);
            process::exit(EXIT_IO_ERROR);
        }
    };
    let mut vm = VM::new();

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(input);

                match run_source(&mut vm, input, options) {
                    Ok(value) => println!("{}", value),
                    Err(e) => eprintln!("{}", e),
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(e) => {
                eprintln!("Read error: {}", e);
                break;
            }
        }
    }
}

fn run_source(vm: &mut VM, source: &str, options: &Options) -> Result<Value, InterpretError> {
    if options.tokens {
        print_tokens(source);
    }
    if options.disassemble {
        let chunk = compile(source)?;
        print!("{}", disassemble_chunk(&chunk, "script"));
        return vm.run(&chunk);
    }
    vm.interpret(source)
}

/// Print one token per line, showing the line number only when it changes.
fn print_tokens(source: &str) {
    let mut lexer = Lexer::new(source);
    let mut line = None;
    loop {
        let token = lexer.scan_token();
        if line == Some(token.line) {
            print!("   | ");
        } else {
            print!("{:4} ", token.line);
            line = Some(token.line);
        }

        match token.kind {
            TokenKind::Eof => {
                println!("EOF");
                break;
            }
            TokenKind::Error => println!("{:<13} {}", "ERROR", token.lexeme),
            _ => println!("{}", token),
        }
    }
}

fn exit_code(error: &InterpretError) -> i32 {
    match error {
        InterpretError::Compile(_) => EXIT_COMPILE_ERROR,
        InterpretError::Runtime { .. } => EXIT_RUNTIME_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_flags_and_path() {
        let options = parse_args(&args(&["--tokens", "--trace", "script.ql"]))
            .unwrap()
            .unwrap();
        assert!(options.tokens);
        assert!(options.trace);
        assert!(!options.disassemble);
        assert_eq!(options.path.as_deref(), Some("script.ql"));
    }

    #[test]
    fn test_unknown_flag_is_usage_error() {
        assert!(parse_args(&args(&["--bogus"])).is_err());
        assert!(parse_args(&args(&["a.ql", "b.ql"])).is_err());
    }

    #[test]
    fn test_exit_codes() {
        let mut vm = VM::new();
        let compile_err = vm.interpret("(").unwrap_err();
        let runtime_err = vm.interpret("-nil").unwrap_err();
        assert_eq!(exit_code(&compile_err), EXIT_COMPILE_ERROR);
        assert_eq!(exit_code(&runtime_err), EXIT_RUNTIME_ERROR);
    }

    #[test]
    fn test_run_source_with_disassembly() {
        let mut vm = VM::new();
        let options = Options {
            disassemble: true,
            ..Options::default()
        };
        assert_eq!(run_source(&mut vm, "1 + 2", &options), Ok(Value::Number(3.0)));
    }
}
