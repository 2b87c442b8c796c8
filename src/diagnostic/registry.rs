/// An entry in the error code registry.
pub struct ErrorEntry {
    pub code: &'static str,
    /// One-line description for listings.
    pub short: &'static str,
    /// Attached to diagnostics as a `help:` line; may be empty.
    pub hint: &'static str,
    /// Full explanation for `--explain`.
    pub long: &'static str,
}

/// All stable error codes.
pub static REGISTRY: &[ErrorEntry] = &[
    // ── Scanner ──────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "LOX-S001",
        short: "unexpected character",
        hint: "",
        long: r#"## LOX-S001: unexpected character

A character was found that does not start any token.

**Example:**

    print 1 @ 2;

Only the Lox operators `( ) { } , . - + ; / * ! != = == > >= < <=`,
numbers, double-quoted strings and identifiers are recognised.
"#,
    },
    ErrorEntry {
        code: "LOX-S002",
        short: "unterminated string",
        hint: "close the string with '\"'",
        long: r#"## LOX-S002: unterminated string

A string literal was opened with `"` but the input ended before the
closing quote. Strings may span several lines.

**Example:**

    print "hello;
"#,
    },

    // ── Compiler ─────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "LOX-C001",
        short: "expect expression",
        hint: "an expression is a literal, a grouping, or a unary/binary operation",
        long: r#"## LOX-C001: expect expression

The compiler needed the start of an expression: a number, a string,
`true`, `false`, `nil`, `(`, `-` or `!`.

**Examples:**

    print ;
    1 + ;
    var;
"#,
    },
    ErrorEntry {
        code: "LOX-C002",
        short: "missing expected token",
        hint: "",
        long: r#"## LOX-C002: missing expected token

A specific token was required here, usually the `;` that ends every
statement or the `)` that closes a grouping.

**Examples:**

    print 1
    print (1 + 2;
"#,
    },
    ErrorEntry {
        code: "LOX-C003",
        short: "too many constants in one chunk",
        hint: "split the program into several runs",
        long: r#"## LOX-C003: too many constants in one chunk

Constant operands are a single byte, so one compiled chunk can refer to
at most 256 number and string literals.
"#,
    },
    ErrorEntry {
        code: "LOX-C004",
        short: "expression nested too deeply",
        hint: "flatten the expression or split it across statements",
        long: r#"## LOX-C004: expression nested too deeply

Grouping, unary and binary operands may nest at most 1000 levels deep.

**Example:**

    print ((((((... 1 ...))))));

Parentheses that only wrap a single value can be removed.
"#,
    },

    // ── Runtime ──────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "LOX-R001",
        short: "operand must be a number",
        hint: "",
        long: r#"## LOX-R001: operand must be a number

Unary `-` was applied to a value that is not a number.

**Example:**

    -"str";
"#,
    },
    ErrorEntry {
        code: "LOX-R002",
        short: "operands must be numbers",
        hint: "",
        long: r#"## LOX-R002: operands must be numbers

`-`, `*`, `/`, `<`, `<=`, `>` and `>=` only accept two numbers.

**Example:**

    1 < "a";
"#,
    },
    ErrorEntry {
        code: "LOX-R003",
        short: "operands must be numbers or strings",
        hint: "",
        long: r#"## LOX-R003: operands must be numbers or strings

`+` adds two numbers or concatenates two strings. Any other pairing,
such as a number and a boolean, is an error.

**Example:**

    1 + true;
"#,
    },
    ErrorEntry {
        code: "LOX-R004",
        short: "stack overflow",
        hint: "",
        long: r#"## LOX-R004: stack overflow

The expression nests too deeply for the fixed-size value stack
(256 slots).
"#,
    },
];

pub fn lookup(code: &str) -> Option<&'static ErrorEntry> {
    REGISTRY.iter().find(|e| e.code == code)
}
