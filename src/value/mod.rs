use std::fmt;

pub mod object;
pub use object::{Heap, Obj, ObjRef};

/// Runtime value. Heap payloads are reached through an [`ObjRef`] into the
/// owning VM's [`Heap`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Bool(bool),
    Nil,
    Number(f64),
    Obj(ObjRef),
}

impl Value {
    /// `nil` and `false` are falsey; everything else, `0` included, is truthy.
    pub fn is_falsey(self) -> bool {
        matches!(self, Value::Nil | Value::Bool(false))
    }

    /// Borrow this value for printing; strings are resolved through `heap`.
    pub fn display(self, heap: &Heap) -> ValueDisplay<'_> {
        ValueDisplay { value: self, heap }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<ObjRef> for Value {
    fn from(r: ObjRef) -> Self {
        Value::Obj(r)
    }
}

/// Language-level equality. Values of different variants are never equal;
/// strings compare by content.
pub fn values_equal(a: Value, b: Value, heap: &Heap) -> bool {
    match (a, b) {
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Nil, Value::Nil) => true,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::Obj(a), Value::Obj(b)) => {
            a == b
                || match (heap.get(a), heap.get(b)) {
                    (Some(Obj::String(a)), Some(Obj::String(b))) => a == b,
                    _ => false,
                }
        }
        _ => false,
    }
}

pub struct ValueDisplay<'h> {
    value: Value,
    heap: &'h Heap,
}

impl fmt::Display for ValueDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Nil => write!(f, "nil"),
            Value::Number(n) => f.write_str(&format_number(n)),
            Value::Obj(r) => match self.heap.get(r) {
                Some(obj) => write!(f, "{obj}"),
                None => write!(f, "<freed object>"),
            },
        }
    }
}

const SIGNIFICANT_DIGITS: i32 = 6;

/// Shortest general-purpose rendering: six significant digits, trailing zeros
/// dropped, scientific notation outside `1e-4 ..= 1e6`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "nan".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if n == 0.0 {
        return if n.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let sci = format!("{:.*e}", (SIGNIFICANT_DIGITS - 1) as usize, n);
    let Some((mantissa, exponent)) = sci.split_once('e') else {
        return sci;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= SIGNIFICANT_DIGITS {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exponent.abs())
    } else {
        let decimals = (SIGNIFICANT_DIGITS - 1 - exponent) as usize;
        trim_fraction(&format!("{n:.decimals$}")).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_nil_and_false_are_falsey() {
        let mut heap = Heap::new();
        let empty = Value::Obj(heap.intern(""));
        assert!(Value::Nil.is_falsey());
        assert!(Value::Bool(false).is_falsey());
        assert!(!Value::Bool(true).is_falsey());
        assert!(!Value::Number(0.0).is_falsey());
        assert!(!Value::Number(f64::NAN).is_falsey());
        assert!(!empty.is_falsey());
    }

    #[test]
    fn equality_requires_matching_variants() {
        let heap = Heap::new();
        assert!(values_equal(Value::Nil, Value::Nil, &heap));
        assert!(values_equal(1.5.into(), 1.5.into(), &heap));
        assert!(!values_equal(Value::Nil, Value::Bool(false), &heap));
        assert!(!values_equal(Value::Number(0.0), Value::Bool(false), &heap));
        assert!(!values_equal(Value::Number(f64::NAN), Value::Number(f64::NAN), &heap));
        assert!(values_equal(true.into(), true.into(), &heap));
    }

    #[test]
    fn strings_compare_by_content() {
        let mut heap = Heap::new();
        let a = heap.intern("abc");
        let b = heap.alloc(Obj::String("abc".into()));
        assert_ne!(a, b, "raw allocation bypasses the intern table");
        assert!(values_equal(Value::Obj(a), Value::Obj(b), &heap));
        let c = heap.intern("abd");
        assert!(!values_equal(Value::Obj(a), Value::Obj(c), &heap));
    }

    #[test]
    fn display_resolves_strings() {
        let mut heap = Heap::new();
        let s = Value::Obj(heap.intern("hi there"));
        assert_eq!(s.display(&heap).to_string(), "hi there");
        assert_eq!(Value::Nil.display(&heap).to_string(), "nil");
        assert_eq!(Value::Bool(false).display(&heap).to_string(), "false");
    }

    #[test]
    fn numbers_print_like_percent_g() {
        assert_eq!(format_number(3.4), "3.4");
        assert_eq!(format_number(7.0), "7");
        assert_eq!(format_number(-2.5), "-2.5");
        assert_eq!(format_number(0.1 + 0.2), "0.3");
        assert_eq!(format_number(1.0 / 3.0), "0.333333");
        assert_eq!(format_number(123456.0), "123456");
        assert_eq!(format_number(1234567.0), "1.23457e+06");
        assert_eq!(format_number(0.0001), "0.0001");
        assert_eq!(format_number(0.00001), "1e-05");
        assert_eq!(format_number(-0.0), "-0");
        assert_eq!(format_number(f64::INFINITY), "inf");
        assert_eq!(format_number(f64::NEG_INFINITY), "-inf");
        assert_eq!(format_number(f64::NAN), "nan");
    }
}
