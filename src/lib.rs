//! Lox: a scanner, a single-pass Pratt compiler that emits bytecode directly,
//! and a stack virtual machine with interned strings.
//!
//! ```
//! let mut vm = lox::Vm::new();
//! let mut out = Vec::new();
//! vm.interpret("print (1 + 2) * 3;", &mut out).unwrap();
//! assert_eq!(out, b"9\n");
//! ```

pub mod chunk;
pub mod compiler;
pub mod diagnostic;
pub mod scanner;
pub mod source;
pub mod value;
pub mod vm;

pub use chunk::Chunk;
pub use compiler::{CompileError, compile};
pub use value::{Heap, Value};
pub use vm::{Config, InterpretError, InterpretResult, RuntimeError, Vm, VmError};
