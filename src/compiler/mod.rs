use std::fmt;

use log::debug;

use crate::chunk::*;
use crate::scanner::{Scanner, Token, TokenKind};
use crate::source::Span;
use crate::value::{Heap, Value};

/// Where a compile error points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorLocation {
    AtEnd,
    AtLexeme(String),
    /// Scanner errors: the message already describes the input.
    Bare,
}

impl fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorLocation::AtEnd => write!(f, " at end"),
            ErrorLocation::AtLexeme(lexeme) => write!(f, " at '{lexeme}'"),
            ErrorLocation::Bare => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("[line {line}] Error{location}: {message}")]
pub struct CompileError {
    pub code: &'static str,
    pub line: usize,
    pub span: Span,
    pub location: ErrorLocation,
    pub message: String,
}

const EXPECT_EXPRESSION: &str = "LOX-C001";
const EXPECT_TOKEN: &str = "LOX-C002";
const TOO_MANY_CONSTANTS: &str = "LOX-C003";
const TOO_DEEP: &str = "LOX-C004";

/// Deepest expression nesting the recursive-descent parser will follow.
pub const MAX_NESTING: usize = 1000;

/// Compile `source` into a chunk. String constants are interned in `heap`, so
/// the chunk is only meaningful to the VM that owns that heap.
pub fn compile(source: &str, heap: &mut Heap) -> Result<Chunk, Vec<CompileError>> {
    let mut parser = Parser::new(source, heap);
    parser.advance();
    while !parser.matches(TokenKind::Eof) {
        parser.statement();
    }
    parser.end_compile();

    if !parser.errors.is_empty() {
        return Err(parser.errors);
    }
    debug!(
        "compiled {} bytes, {} constants",
        parser.chunk.len(),
        parser.chunk.constants.len()
    );
    Ok(parser.chunk)
}

// ── Precedence table ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    None,
    Assignment, // =
    Or,         // or
    And,        // and
    Equality,   // == !=
    Comparison, // < > <= >=
    Term,       // + -
    Factor,     // * /
    Unary,      // ! -
    Call,       // . ()
    Primary,
}

impl Precedence {
    fn next(self) -> Precedence {
        match self {
            Precedence::None => Precedence::Assignment,
            Precedence::Assignment => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Equality,
            Precedence::Equality => Precedence::Comparison,
            Precedence::Comparison => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Unary,
            Precedence::Unary => Precedence::Call,
            Precedence::Call | Precedence::Primary => Precedence::Primary,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseFn {
    Grouping,
    Unary,
    Binary,
    Number,
    String,
    Literal,
}

#[derive(Debug, Clone, Copy)]
struct ParseRule {
    prefix: Option<ParseFn>,
    infix: Option<ParseFn>,
    precedence: Precedence,
}

const fn rule(kind: TokenKind) -> ParseRule {
    use ParseFn as F;
    use Precedence as P;
    let (prefix, infix, precedence) = match kind {
        TokenKind::LeftParen => (Some(F::Grouping), None, P::None),
        TokenKind::Minus => (Some(F::Unary), Some(F::Binary), P::Term),
        TokenKind::Plus => (None, Some(F::Binary), P::Term),
        TokenKind::Slash | TokenKind::Star => (None, Some(F::Binary), P::Factor),
        TokenKind::Bang => (Some(F::Unary), None, P::None),
        TokenKind::BangEqual | TokenKind::EqualEqual => (None, Some(F::Binary), P::Equality),
        TokenKind::Greater | TokenKind::GreaterEqual | TokenKind::Less | TokenKind::LessEqual => {
            (None, Some(F::Binary), P::Comparison)
        }
        TokenKind::String => (Some(F::String), None, P::None),
        TokenKind::Number => (Some(F::Number), None, P::None),
        TokenKind::False | TokenKind::True | TokenKind::Nil => (Some(F::Literal), None, P::None),
        TokenKind::RightParen
        | TokenKind::LeftBrace
        | TokenKind::RightBrace
        | TokenKind::Comma
        | TokenKind::Dot
        | TokenKind::Semicolon
        | TokenKind::Equal
        | TokenKind::Identifier
        | TokenKind::And
        | TokenKind::Class
        | TokenKind::Else
        | TokenKind::For
        | TokenKind::Fun
        | TokenKind::If
        | TokenKind::Or
        | TokenKind::Print
        | TokenKind::Return
        | TokenKind::Super
        | TokenKind::This
        | TokenKind::Var
        | TokenKind::While
        | TokenKind::Error
        | TokenKind::Eof => (None, None, P::None),
    };
    ParseRule { prefix, infix, precedence }
}

// ── Parser ───────────────────────────────────────────────────────────

struct Parser<'src, 'h> {
    source: &'src str,
    scanner: Scanner<'src>,
    heap: &'h mut Heap,
    chunk: Chunk,
    current: Token,
    previous: Token,
    errors: Vec<CompileError>,
    /// Active `parse_precedence` calls.
    depth: usize,
    /// Set by the first error; suppresses every later report. There is no
    /// resynchronisation, so at most one error is recorded per compile.
    panic_mode: bool,
}

impl<'src, 'h> Parser<'src, 'h> {
    fn new(source: &'src str, heap: &'h mut Heap) -> Self {
        let placeholder = Token::new(TokenKind::Eof, 0, 0, 1);
        Parser {
            source,
            scanner: Scanner::new(source),
            heap,
            chunk: Chunk::new(),
            current: placeholder,
            previous: placeholder,
            errors: Vec::new(),
            depth: 0,
            panic_mode: false,
        }
    }

    // ---- Token stream ----

    fn advance(&mut self) {
        self.previous = self.current;
        loop {
            self.current = self.scanner.next_token();
            if self.current.kind != TokenKind::Error {
                break;
            }
            let token = self.current;
            if let Some(error) = token.error {
                self.error_at(token, error.code(), &error.to_string());
            }
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if !self.check(kind) {
            return false;
        }
        self.advance();
        true
    }

    fn consume(&mut self, kind: TokenKind, message: &str) {
        if self.check(kind) {
            self.advance();
            return;
        }
        self.error_at(self.current, EXPECT_TOKEN, message);
    }

    // ---- Errors ----

    fn error(&mut self, code: &'static str, message: &str) {
        self.error_at(self.previous, code, message);
    }

    fn error_at(&mut self, token: Token, code: &'static str, message: &str) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        let location = match token.kind {
            TokenKind::Eof => ErrorLocation::AtEnd,
            TokenKind::Error => ErrorLocation::Bare,
            _ => ErrorLocation::AtLexeme(token.lexeme(self.source).to_string()),
        };
        self.errors.push(CompileError {
            code,
            line: token.line,
            span: token.span(),
            location,
            message: message.to_string(),
        });
    }

    // ---- Emission ----

    fn emit_byte(&mut self, byte: u8) {
        self.chunk.write(byte, self.previous.line);
    }

    fn emit_bytes(&mut self, first: u8, second: u8) {
        self.emit_byte(first);
        self.emit_byte(second);
    }

    fn emit_constant(&mut self, value: Value) {
        let index = self.make_constant(value);
        self.emit_bytes(OP_CONSTANT, index);
    }

    fn make_constant(&mut self, value: Value) -> u8 {
        let index = self.chunk.add_constant(value);
        match u8::try_from(index) {
            Ok(index) => index,
            Err(_) => {
                self.error(TOO_MANY_CONSTANTS, "Too many constants in one chunk.");
                0
            }
        }
    }

    fn end_compile(&mut self) {
        self.emit_byte(OP_RETURN);
    }

    // ---- Statements ----

    fn statement(&mut self) {
        if self.matches(TokenKind::Print) {
            self.expression();
            self.consume(TokenKind::Semicolon, "Expect ';' after value.");
        } else {
            // A bare expression statement echoes its value.
            self.expression();
            self.consume(TokenKind::Semicolon, "Expect ';' after expression.");
        }
        self.emit_byte(OP_PRINT);
    }

    // ---- Expressions ----

    fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    fn parse_precedence(&mut self, precedence: Precedence) {
        if self.depth >= MAX_NESTING {
            self.error_at(self.current, TOO_DEEP, "Expression nested too deeply.");
            self.advance();
            return;
        }
        self.depth += 1;
        self.parse_operand(precedence);
        self.depth -= 1;
    }

    fn parse_operand(&mut self, precedence: Precedence) {
        self.advance();
        let Some(prefix) = rule(self.previous.kind).prefix else {
            self.error(EXPECT_EXPRESSION, "Expect expression.");
            return;
        };
        self.apply(prefix);

        while precedence <= rule(self.current.kind).precedence {
            self.advance();
            if let Some(infix) = rule(self.previous.kind).infix {
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
            ParseFn::String => self.string(),
            ParseFn::Literal => self.literal(),
        }
    }

    fn grouping(&mut self) {
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after expression.");
    }

    fn unary(&mut self) {
        let operator = self.previous.kind;
        self.parse_precedence(Precedence::Unary);
        match operator {
            TokenKind::Bang => self.emit_byte(OP_NOT),
            TokenKind::Minus => self.emit_byte(OP_NEGATE),
            _ => {}
        }
    }

    fn binary(&mut self) {
        let operator = self.previous.kind;
        self.parse_precedence(rule(operator).precedence.next());
        match operator {
            TokenKind::BangEqual => self.emit_bytes(OP_EQUAL, OP_NOT),
            TokenKind::EqualEqual => self.emit_byte(OP_EQUAL),
            TokenKind::Greater => self.emit_byte(OP_GREATER),
            TokenKind::GreaterEqual => self.emit_bytes(OP_LESS, OP_NOT),
            TokenKind::Less => self.emit_byte(OP_LESS),
            TokenKind::LessEqual => self.emit_bytes(OP_GREATER, OP_NOT),
            TokenKind::Plus => self.emit_byte(OP_ADD),
            TokenKind::Minus => self.emit_byte(OP_SUBTRACT),
            TokenKind::Star => self.emit_byte(OP_MULTIPLY),
            TokenKind::Slash => self.emit_byte(OP_DIVIDE),
            _ => {}
        }
    }

    fn number(&mut self) {
        match self.previous.lexeme(self.source).parse::<f64>() {
            Ok(n) => self.emit_constant(Value::Number(n)),
            Err(_) => self.error(EXPECT_EXPRESSION, "Invalid number literal."),
        }
    }

    fn string(&mut self) {
        let lexeme = self.previous.lexeme(self.source);
        let contents = lexeme.get(1..lexeme.len().saturating_sub(1)).unwrap_or("");
        let r = self.heap.intern(contents);
        self.emit_constant(Value::Obj(r));
    }

    fn literal(&mut self) {
        match self.previous.kind {
            TokenKind::False => self.emit_byte(OP_FALSE),
            TokenKind::Nil => self.emit_byte(OP_NIL),
            TokenKind::True => self.emit_byte(OP_TRUE),
            _ => {}
        }
    }
}
