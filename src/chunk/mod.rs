use crate::value::Value;

pub mod disassemble;
pub use disassemble::{disassemble_chunk, disassemble_instruction};

// ── Opcodes ──────────────────────────────────────────────────────────
//
// One byte each. OP_CONSTANT is followed by a one-byte constant pool index;
// every other opcode takes no operand.

pub const OP_CONSTANT: u8 = 0;
pub const OP_NIL: u8 = 1;
pub const OP_TRUE: u8 = 2;
pub const OP_FALSE: u8 = 3;
pub const OP_EQUAL: u8 = 4;
pub const OP_GREATER: u8 = 5;
pub const OP_LESS: u8 = 6;
pub const OP_ADD: u8 = 7;
pub const OP_SUBTRACT: u8 = 8;
pub const OP_MULTIPLY: u8 = 9;
pub const OP_DIVIDE: u8 = 10;
pub const OP_NOT: u8 = 11;
pub const OP_NEGATE: u8 = 12;
pub const OP_PRINT: u8 = 13;
pub const OP_RETURN: u8 = 14;

pub fn op_name(op: u8) -> Option<&'static str> {
    Some(match op {
        OP_CONSTANT => "OP_CONSTANT",
        OP_NIL => "OP_NIL",
        OP_TRUE => "OP_TRUE",
        OP_FALSE => "OP_FALSE",
        OP_EQUAL => "OP_EQUAL",
        OP_GREATER => "OP_GREATER",
        OP_LESS => "OP_LESS",
        OP_ADD => "OP_ADD",
        OP_SUBTRACT => "OP_SUBTRACT",
        OP_MULTIPLY => "OP_MULTIPLY",
        OP_DIVIDE => "OP_DIVIDE",
        OP_NOT => "OP_NOT",
        OP_NEGATE => "OP_NEGATE",
        OP_PRINT => "OP_PRINT",
        OP_RETURN => "OP_RETURN",
        _ => return None,
    })
}

/// Number of operand bytes following `op`.
pub fn operand_width(op: u8) -> usize {
    if op == OP_CONSTANT { 1 } else { 0 }
}

// ── Chunk ────────────────────────────────────────────────────────────

/// Append-only bytecode: `code[i]` was emitted for source line `lines[i]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    pub code: Vec<u8>,
    pub lines: Vec<usize>,
    pub constants: Vec<Value>,
}

impl Chunk {
    pub fn new() -> Self {
        Chunk::default()
    }

    pub fn write(&mut self, byte: u8, line: usize) {
        self.code.push(byte);
        self.lines.push(line);
    }

    /// Append to the constant pool. Callers that encode the index in one byte
    /// must check it fits.
    pub fn add_constant(&mut self, value: Value) -> usize {
        self.constants.push(value);
        self.constants.len() - 1
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn line_at(&self, offset: usize) -> Option<usize> {
        self.lines.get(offset).copied()
    }
}
