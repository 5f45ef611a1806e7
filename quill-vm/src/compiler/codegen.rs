// quill-vm - Bytecode compiler and virtual machine for the Quill expression language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Code generation: a single-pass Pratt parser that emits bytecode as it goes.

use log::{debug, log_enabled, trace};
use quill_syntax::{Lexer, Token, TokenKind};

use crate::chunk::Chunk;
use crate::debug::disassemble_chunk;
use crate::opcode::OpCode;
use crate::value::Value;

use super::rules::{self, ParseFn, Precedence};
use super::types::{CompileError, Diagnostic, Result};

/// Deepest expression nesting the compiler accepts. Every nested operand
/// recurses through `parse_precedence`, so this bounds native stack use.
pub const MAX_NESTING_DEPTH: usize = 2048;

/// Parser state: the two-token window plus error flags.
#[derive(Debug)]
struct Parser<'src> {
    previous: Token<'src>,
    current: Token<'src>,
    had_error: bool,
    /// Set by the first diagnostic; suppresses the cascade that follows it.
    panic_mode: bool,
}

/// Compiler for one unit of source.
///
/// Owns the lexer, the parser state and the chunk being written. Each
/// compile starts from fresh state.
pub struct Compiler<'src> {
    lexer: Lexer<'src>,
    parser: Parser<'src>,
    chunk: Chunk,
    diagnostics: Vec<Diagnostic>,
    /// Active `parse_precedence` calls.
    depth: usize,
}

impl<'src> Compiler<'src> {
    /// Create a compiler over `source`.
    pub fn new(source: &'src str) -> Self {
        Self {
            lexer: Lexer::new(source),
            parser: Parser {
                previous: Token::eof(),
                current: Token::eof(),
                had_error: false,
                panic_mode: false,
            },
            chunk: Chunk::new(),
            diagnostics: Vec::new(),
            depth: 0,
        }
    }

    /// Compile the source as a single expression followed by end of input.
    pub fn compile(mut self) -> Result<Chunk> {
        debug!("compiling {} bytes of source", self.lexer.source().len());

        self.advance();
        self.expression();
        self.consume(TokenKind::Eof, "Expect end of expression.");
        self.end();

        if self.parser.had_error {
            debug!("compile failed with {} diagnostic(s)", self.diagnostics.len());
            return Err(CompileError::new(self.diagnostics));
        }
        Ok(self.chunk)
    }

    fn end(&mut self) {
        self.emit_op(OpCode::Return);
        if !self.parser.had_error && log_enabled!(log::Level::Trace) {
            trace!("\n{}", disassemble_chunk(&self.chunk, "code"));
        }
    }

    // ========================================================================
    // Token handling
    // ========================================================================

    fn advance(&mut self) {
        self.parser.previous = self.parser.current;

        loop {
            self.parser.current = self.lexer.scan_token();
            if !self.parser.current.is_error() {
                break;
            }
            let message = self.parser.current.lexeme;
            self.error_at_current(message);
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) {
        if self.parser.current.kind == kind {
            self.advance();
            return;
        }
        self.error_at_current(message);
    }

    // ========================================================================
    // Error reporting
    // ========================================================================

    fn error_at(&mut self, token: Token<'src>, message: &str) {
        if self.parser.panic_mode {
            return;
        }
        self.parser.panic_mode = true;
        self.parser.had_error = true;

        let diagnostic = Diagnostic::at(&token, message);
        debug!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    fn error(&mut self, message: &str) {
        self.error_at(self.parser.previous, message);
    }

    fn error_at_current(&mut self, message: &str) {
        self.error_at(self.parser.current, message);
    }

    // ========================================================================
    // Emission
    // ========================================================================

    fn emit_op(&mut self, op: OpCode) {
        self.chunk.write_op(op, self.parser.previous.line);
    }

    fn emit_ops(&mut self, first: OpCode, second: OpCode) {
        self.chunk
            .write(&[first.into(), second.into()], self.parser.previous.line);
    }

    fn emit_constant(&mut self, value: Value) {
        if self
            .chunk
            .write_constant(value, self.parser.previous.line)
            .is_none()
        {
            self.error("Too many constants in one chunk.");
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    /// Parse an expression whose operators bind at least as tightly as `precedence`.
    fn parse_precedence(&mut self, precedence: Precedence) {
        if self.depth >= MAX_NESTING_DEPTH {
            self.error("Expression nested too deeply.");
            return;
        }
        self.depth += 1;
        self.parse_operand(precedence);
        self.depth -= 1;
    }

    fn parse_operand(&mut self, precedence: Precedence) {
        self.advance();
        let Some(prefix) = rules::rule(self.parser.previous.kind).prefix else {
            self.error("Expect expression.");
            return;
        };
        self.apply(prefix);

        while precedence <= rules::rule(self.parser.current.kind).precedence {
            self.advance();
            if let Some(infix) = rules::rule(self.parser.previous.kind).infix {
                self.apply(infix);
            }
        }
    }

    fn apply(&mut self, handler: ParseFn) {
        match handler {
            ParseFn::Grouping => self.grouping(),
            ParseFn::Unary => self.unary(),
            ParseFn::Binary => self.binary(),
            ParseFn::Number => self.number(),
            ParseFn::Literal => self.literal(),
        }
    }

    fn grouping(&mut self) {
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after expression.");
    }

    fn number(&mut self) {
        match self.parser.previous.lexeme.parse::<f64>() {
            Ok(n) => self.emit_constant(Value::Number(n)),
            Err(_) => self.error("Invalid number literal."),
        }
    }

    fn literal(&mut self) {
        match self.parser.previous.kind {
            TokenKind::Nil => self.emit_op(OpCode::Nil),
            TokenKind::False => self.emit_op(OpCode::False),
            TokenKind::True => self.emit_op(OpCode::True),
            kind => unreachable!("literal rule registered for {:?}", kind),
        }
    }

    fn unary(&mut self) {
        let operator = self.parser.previous.kind;

        // Operand first: the instruction runs after its value is on the stack.
        self.parse_precedence(Precedence::Unary);

        match operator {
            TokenKind::Bang => self.emit_op(OpCode::Not),
            TokenKind::Minus => self.emit_op(OpCode::Negate),
            kind => unreachable!("unary rule registered for {:?}", kind),
        }
    }

    fn binary(&mut self) {
        let operator = self.parser.previous.kind;

        // Right operand binds one level tighter: left associativity.
        self.parse_precedence(rules::rule(operator).precedence.next());

        match operator {
            TokenKind::Plus => self.emit_op(OpCode::Add),
            TokenKind::Minus => self.emit_op(OpCode::Sub),
            TokenKind::Star => self.emit_op(OpCode::Mul),
            TokenKind::Slash => self.emit_op(OpCode::Div),
            TokenKind::EqualEqual => self.emit_op(OpCode::Eq),
            TokenKind::BangEqual => self.emit_ops(OpCode::Eq, OpCode::Not),
            TokenKind::Greater => self.emit_op(OpCode::Gt),
            TokenKind::GreaterEqual => self.emit_ops(OpCode::Lt, OpCode::Not),
            TokenKind::Less => self.emit_op(OpCode::Lt),
            TokenKind::LessEqual => self.emit_ops(OpCode::Gt, OpCode::Not),
            kind => unreachable!("binary rule registered for {:?}", kind),
        }
    }
}

/// Compile `source` into a chunk ready for the VM.
pub fn compile(source: &str) -> Result<Chunk> {
    Compiler::new(source).compile()
}
