use std::fmt::Write as _;
use std::io::Write;

use log::debug;

use crate::chunk::*;
use crate::compiler::{self, CompileError};
use crate::value::{Heap, Value, values_equal};

/// Maximum operand stack depth.
pub const STACK_MAX: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum VmError {
    #[error("Operand must be a number.")]
    OperandNotNumber,
    #[error("Operands must be numbers.")]
    OperandsNotNumbers,
    #[error("Operands must be numbers or strings.")]
    AddOperands,
    #[error("Stack overflow.")]
    StackOverflow,
    #[error("Stack underflow.")]
    StackUnderflow,
    #[error("Unknown opcode {op}.")]
    UnknownOpcode { op: u8 },
    #[error("Unexpected end of bytecode.")]
    TruncatedBytecode,
    #[error("Constant index {index} out of range.")]
    ConstantOutOfRange { index: u8 },
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

impl VmError {
    pub fn code(&self) -> Option<&'static str> {
        match self {
            VmError::OperandNotNumber => Some("LOX-R001"),
            VmError::OperandsNotNumbers => Some("LOX-R002"),
            VmError::AddOperands => Some("LOX-R003"),
            VmError::StackOverflow => Some("LOX-R004"),
            _ => None,
        }
    }
}

/// A fault during execution, tagged with the line of the instruction that
/// raised it.
#[derive(Debug, thiserror::Error)]
#[error("{error}\n[line {line}] in script")]
pub struct RuntimeError {
    pub error: VmError,
    pub line: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum InterpretError {
    #[error("{}", join_lines(.0))]
    Compile(Vec<CompileError>),
    #[error(transparent)]
    Runtime(RuntimeError),
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// Write failures are reported as I/O errors even when they surface mid-run.
impl From<RuntimeError> for InterpretError {
    fn from(e: RuntimeError) -> Self {
        match e.error {
            VmError::Output(io) => InterpretError::Output(io),
            error => InterpretError::Runtime(RuntimeError { error, line: e.line }),
        }
    }
}

fn join_lines(errors: &[CompileError]) -> String {
    errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("\n")
}

impl InterpretError {
    /// sysexits-style process status.
    pub fn exit_code(&self) -> i32 {
        match self {
            InterpretError::Compile(_) => 65,
            InterpretError::Runtime(_) => 70,
            InterpretError::Output(_) => 74,
        }
    }
}

/// Coarse outcome of one `interpret` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpretResult {
    Ok,
    CompileError,
    RuntimeError,
}

impl InterpretResult {
    pub fn exit_code(self) -> i32 {
        match self {
            InterpretResult::Ok => 0,
            InterpretResult::CompileError => 65,
            InterpretResult::RuntimeError => 70,
        }
    }
}

impl From<&Result<(), InterpretError>> for InterpretResult {
    fn from(outcome: &Result<(), InterpretError>) -> Self {
        match outcome {
            Ok(()) => InterpretResult::Ok,
            Err(InterpretError::Compile(_)) => InterpretResult::CompileError,
            Err(InterpretError::Runtime(_) | InterpretError::Output(_)) => InterpretResult::RuntimeError,
        }
    }
}

/// Debug switches for a [`Vm`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Config {
    /// Before each instruction, write the stack and the disassembled
    /// instruction to the output.
    pub trace_execution: bool,
    /// After each successful compile, write the chunk's disassembly.
    pub print_bytecode: bool,
}

// ── VM ───────────────────────────────────────────────────────────────

/// Stack machine. The heap (objects and intern table) lives as long as the VM
/// and is shared by every `interpret` call; it is only released by
/// [`Vm::free`] or on drop.
pub struct Vm {
    stack: Vec<Value>,
    heap: Heap,
    config: Config,
}

impl Default for Vm {
    fn default() -> Self {
        Vm::new()
    }
}

impl Drop for Vm {
    fn drop(&mut self) {
        self.free();
    }
}

impl Vm {
    pub fn new() -> Self {
        Vm::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Vm { stack: Vec::with_capacity(STACK_MAX), heap: Heap::new(), config }
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    /// Compile against this VM's intern table.
    pub fn compile(&mut self, source: &str) -> Result<Chunk, Vec<CompileError>> {
        compiler::compile(source, &mut self.heap)
    }

    /// Compile and run `source`, writing program output to `out`.
    pub fn interpret<W: Write>(&mut self, source: &str, out: &mut W) -> Result<(), InterpretError> {
        let chunk = self.compile(source).map_err(InterpretError::Compile)?;
        if self.config.print_bytecode {
            out.write_all(disassemble_chunk(&chunk, "code", &self.heap).as_bytes())?;
        }
        self.run(&chunk, out)?;
        Ok(())
    }

    /// Execute `chunk` from its first byte until `OP_RETURN` or the first
    /// runtime error. On error the stack is reset.
    pub fn run<W: Write>(&mut self, chunk: &Chunk, out: &mut W) -> Result<(), RuntimeError> {
        let mut ip = 0;
        match self.execute(chunk, out, &mut ip) {
            Ok(()) => {
                debug!("run finished, {} live objects", self.heap.len());
                Ok(())
            }
            Err(error) => {
                let line = chunk.line_at(ip.saturating_sub(1)).unwrap_or(0);
                self.stack.clear();
                Err(RuntimeError { error, line })
            }
        }
    }

    /// Drop every value and heap object this VM owns.
    pub fn free(&mut self) {
        self.stack.clear();
        self.heap.free_objects();
    }

    fn execute<W: Write>(&mut self, chunk: &Chunk, out: &mut W, ip: &mut usize) -> Result<(), VmError> {
        loop {
            if self.config.trace_execution {
                self.trace(chunk, *ip, out)?;
            }
            let op = read_byte(chunk, ip)?;
            match op {
                OP_CONSTANT => {
                    let index = read_byte(chunk, ip)?;
                    let value = chunk
                        .constants
                        .get(index as usize)
                        .copied()
                        .ok_or(VmError::ConstantOutOfRange { index })?;
                    self.push(value)?;
                }
                OP_NIL => self.push(Value::Nil)?,
                OP_TRUE => self.push(Value::Bool(true))?,
                OP_FALSE => self.push(Value::Bool(false))?,
                OP_EQUAL => {
                    let b = self.pop()?;
                    let a = self.pop()?;
                    self.push(Value::Bool(values_equal(a, b, &self.heap)))?;
                }
                OP_GREATER => self.binary_number(|a, b| Value::Bool(a > b))?,
                OP_LESS => self.binary_number(|a, b| Value::Bool(a < b))?,
                OP_ADD => self.add()?,
                OP_SUBTRACT => self.binary_number(|a, b| Value::Number(a - b))?,
                OP_MULTIPLY => self.binary_number(|a, b| Value::Number(a * b))?,
                OP_DIVIDE => self.binary_number(|a, b| Value::Number(a / b))?,
                OP_NOT => {
                    let v = self.pop()?;
                    self.push(Value::Bool(v.is_falsey()))?;
                }
                OP_NEGATE => {
                    // peek first so a type error leaves the operand in place
                    let Value::Number(n) = self.peek(0)? else {
                        return Err(VmError::OperandNotNumber);
                    };
                    self.pop()?;
                    self.push(Value::Number(-n))?;
                }
                OP_PRINT => {
                    let v = self.pop()?;
                    writeln!(out, "{}", v.display(&self.heap))?;
                }
                OP_RETURN => return Ok(()),
                _ => return Err(VmError::UnknownOpcode { op }),
            }
        }
    }

    // ---- Stack ----

    fn push(&mut self, value: Value) -> Result<(), VmError> {
        if self.stack.len() >= STACK_MAX {
            return Err(VmError::StackOverflow);
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<Value, VmError> {
        self.stack.pop().ok_or(VmError::StackUnderflow)
    }

    fn peek(&self, distance: usize) -> Result<Value, VmError> {
        self.stack
            .len()
            .checked_sub(distance + 1)
            .map(|i| self.stack[i])
            .ok_or(VmError::StackUnderflow)
    }

    // ---- Operators ----

    /// Pop `b` then `a` and push `f(a, b)`; `a` is the operand that was lower
    /// on the stack, i.e. the left-hand side.
    fn binary_number(&mut self, f: fn(f64, f64) -> Value) -> Result<(), VmError> {
        let b = self.pop()?;
        let a = self.pop()?;
        match (a, b) {
            (Value::Number(a), Value::Number(b)) => self.push(f(a, b)),
            _ => Err(VmError::OperandsNotNumbers),
        }
    }

    fn add(&mut self) -> Result<(), VmError> {
        let b = self.pop()?;
        let a = self.pop()?;
        match (a, b) {
            (Value::Number(a), Value::Number(b)) => self.push(Value::Number(a + b)),
            (Value::Obj(a), Value::Obj(b)) => {
                let joined = match (self.heap.as_str(a), self.heap.as_str(b)) {
                    (Some(a), Some(b)) => [a, b].concat(),
                    _ => return Err(VmError::AddOperands),
                };
                let r = self.heap.intern_owned(joined);
                self.push(Value::Obj(r))
            }
            _ => Err(VmError::AddOperands),
        }
    }

    fn trace<W: Write>(&self, chunk: &Chunk, ip: usize, out: &mut W) -> Result<(), VmError> {
        let mut text = String::from("          ");
        for value in &self.stack {
            let _ = write!(text, "[ {} ]", value.display(&self.heap));
        }
        text.push('\n');
        disassemble_instruction(chunk, ip, &self.heap, &mut text);
        out.write_all(text.as_bytes())?;
        Ok(())
    }
}

fn read_byte(chunk: &Chunk, ip: &mut usize) -> Result<u8, VmError> {
    let byte = chunk.code.get(*ip).copied().ok_or(VmError::TruncatedBytecode)?;
    *ip += 1;
    Ok(byte)
}

// ── Tests ────────────────────────────────────────────────────────────
