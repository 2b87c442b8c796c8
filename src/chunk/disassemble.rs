use std::fmt::Write;

use super::{Chunk, OP_CONSTANT, op_name};
use crate::value::Heap;

/// Human-readable listing of `chunk` under a `== name ==` header.
pub fn disassemble_chunk(chunk: &Chunk, name: &str, heap: &Heap) -> String {
    let mut out = format!("== {name} ==\n");
    let mut offset = 0;
    while offset < chunk.len() {
        offset = disassemble_instruction(chunk, offset, heap, &mut out);
    }
    out
}

/// Append one instruction line to `out` and return the offset of the next
/// instruction.
pub fn disassemble_instruction(chunk: &Chunk, offset: usize, heap: &Heap, out: &mut String) -> usize {
    let _ = write!(out, "{offset:04} ");
    match (offset.checked_sub(1).and_then(|prev| chunk.line_at(prev)), chunk.line_at(offset)) {
        (Some(prev), Some(line)) if prev == line => out.push_str("   | "),
        (_, Some(line)) => {
            let _ = write!(out, "{line:4} ");
        }
        (_, None) => out.push_str("   ? "),
    }

    let Some(&op) = chunk.code.get(offset) else {
        out.push_str("<end of chunk>\n");
        return offset + 1;
    };
    match op_name(op) {
        Some(name) if op == OP_CONSTANT => constant_instruction(name, chunk, offset, heap, out),
        Some(name) => {
            let _ = writeln!(out, "{name}");
            offset + 1
        }
        None => {
            let _ = writeln!(out, "Unknown opcode {op}");
            offset + 1
        }
    }
}

fn constant_instruction(name: &str, chunk: &Chunk, offset: usize, heap: &Heap, out: &mut String) -> usize {
    let Some(&index) = chunk.code.get(offset + 1) else {
        let _ = writeln!(out, "{name:<16} <missing operand>");
        return offset + 2;
    };
    match chunk.constants.get(index as usize) {
        Some(value) => {
            let _ = writeln!(out, "{name:<16} {index:4} '{}'", value.display(heap));
        }
        None => {
            let _ = writeln!(out, "{name:<16} {index:4} <out of range>");
        }
    }
    offset + 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::*;
    use crate::value::Value;

    fn sample(heap: &mut Heap) -> Chunk {
        let mut chunk = Chunk::new();
        let n = chunk.add_constant(Value::Number(1.2));
        let s = chunk.add_constant(Value::Obj(heap.intern("hi")));
        chunk.write(OP_CONSTANT, 123);
        chunk.write(n as u8, 123);
        chunk.write(OP_CONSTANT, 123);
        chunk.write(s as u8, 123);
        chunk.write(OP_ADD, 124);
        chunk.write(OP_RETURN, 124);
        chunk
    }

    #[test]
    fn listing_matches_expected_layout() {
        let mut heap = Heap::new();
        let chunk = sample(&mut heap);
        let listing = disassemble_chunk(&chunk, "test chunk", &heap);
        let expected = "\
== test chunk ==
0000  123 OP_CONSTANT         0 '1.2'
0002    | OP_CONSTANT         1 'hi'
0004  124 OP_ADD
0005    | OP_RETURN
";
        assert_eq!(listing, expected);
    }

    #[test]
    fn every_line_has_offset_and_line_columns() {
        let mut heap = Heap::new();
        let chunk = sample(&mut heap);
        let listing = disassemble_chunk(&chunk, "code", &heap);
        let line_re = regex::Regex::new(r"^\d{4} (   \||\s*\d+) OP_[A-Z]+").unwrap();
        for line in listing.lines().skip(1) {
            assert!(line_re.is_match(line), "malformed listing line: {line:?}");
        }
    }

    #[test]
    fn unknown_opcode_advances_one_byte() {
        let heap = Heap::new();
        let mut chunk = Chunk::new();
        chunk.write(200, 1);
        let mut out = String::new();
        assert_eq!(disassemble_instruction(&chunk, 0, &heap, &mut out), 1);
        assert_eq!(out, "0000    1 Unknown opcode 200\n");
    }

    #[test]
    fn constant_with_bad_index_is_reported() {
        let heap = Heap::new();
        let mut chunk = Chunk::new();
        chunk.write(OP_CONSTANT, 1);
        chunk.write(7, 1);
        let mut out = String::new();
        assert_eq!(disassemble_instruction(&chunk, 0, &heap, &mut out), 2);
        assert!(out.contains("<out of range>"), "{out}");
    }
}
