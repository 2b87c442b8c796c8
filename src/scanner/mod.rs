use logos::Logos;

use crate::source::Span;

/// Raw lexeme boundaries. Keywords are not distinguished here; identifiers are
/// classified afterwards by [`identifier_kind`].
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip(r"//[^\n]*", allow_greedy = true))]
enum Lexeme {
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("-")]
    Minus,
    #[token("+")]
    Plus,
    #[token(";")]
    Semicolon,
    #[token("/")]
    Slash,
    #[token("*")]
    Star,
    #[token("!")]
    Bang,
    #[token("!=")]
    BangEqual,
    #[token("=")]
    Equal,
    #[token("==")]
    EqualEqual,
    #[token(">")]
    Greater,
    #[token(">=")]
    GreaterEqual,
    #[token("<")]
    Less,
    #[token("<=")]
    LessEqual,

    #[regex(r#""[^"]*""#)]
    String,
    #[regex(r#""[^"]*"#)]
    UnterminatedString,
    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Number,
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Identifier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Single-character tokens.
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,
    // One or two character tokens.
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    // Literals.
    Identifier,
    String,
    Number,
    // Keywords.
    And,
    Class,
    Else,
    False,
    For,
    Fun,
    If,
    Nil,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    Var,
    While,

    Error,
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    #[error("Unexpected character.")]
    UnexpectedCharacter,
    #[error("Unterminated string.")]
    UnterminatedString,
}

impl ScanError {
    pub fn code(self) -> &'static str {
        match self {
            ScanError::UnexpectedCharacter => "LOX-S001",
            ScanError::UnterminatedString => "LOX-S002",
        }
    }
}

/// A view into the source: the lexeme is `source[start..start + length]`.
/// `Error` tokens carry their diagnostic in `error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub length: usize,
    pub line: usize,
    pub error: Option<ScanError>,
}

impl Token {
    pub fn new(kind: TokenKind, start: usize, length: usize, line: usize) -> Self {
        Token { kind, start, length, line, error: None }
    }

    fn error(error: ScanError, start: usize, length: usize, line: usize) -> Self {
        Token { kind: TokenKind::Error, start, length, line, error: Some(error) }
    }

    pub fn span(&self) -> Span {
        Span::new(self.start, self.length)
    }

    pub fn lexeme<'src>(&self, source: &'src str) -> &'src str {
        self.span().slice(source)
    }
}

/// On-demand tokenizer. Once the input is exhausted every further call to
/// [`Scanner::next_token`] returns another `Eof` token.
pub struct Scanner<'src> {
    source: &'src str,
    lexer: logos::Lexer<'src, Lexeme>,
    /// Byte offset up to which newlines have been counted into `line`.
    cursor: usize,
    line: usize,
    exhausted: bool,
    eof_emitted: bool,
}

impl<'src> Scanner<'src> {
    pub fn new(source: &'src str) -> Self {
        Scanner {
            source,
            lexer: Lexeme::lexer(source),
            cursor: 0,
            line: 1,
            exhausted: false,
            eof_emitted: false,
        }
    }

    pub fn next_token(&mut self) -> Token {
        let next = if self.exhausted { None } else { self.lexer.next() };
        let Some(result) = next else {
            self.exhausted = true;
            self.count_lines_to(self.source.len());
            return Token::new(TokenKind::Eof, self.source.len(), 0, self.line);
        };

        let span = self.lexer.span();
        self.count_lines_to(span.end);
        let (start, length) = (span.start, span.end - span.start);

        let kind = match result {
            Ok(Lexeme::UnterminatedString) => {
                return Token::error(ScanError::UnterminatedString, start, length, self.line);
            }
            Err(()) => {
                return Token::error(ScanError::UnexpectedCharacter, start, length, self.line);
            }
            Ok(Lexeme::Identifier) => identifier_kind(&self.source[span]),
            Ok(lexeme) => punctuation_kind(lexeme),
        };
        Token::new(kind, start, length, self.line)
    }

    fn count_lines_to(&mut self, end: usize) {
        if end <= self.cursor {
            return;
        }
        let skipped = self.source.as_bytes().get(self.cursor..end).unwrap_or(&[]);
        self.line += skipped.iter().filter(|&&b| b == b'\n').count();
        self.cursor = end;
    }
}

/// Yields every token up to and including the first `Eof`.
impl Iterator for Scanner<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.eof_emitted {
            return None;
        }
        let token = self.next_token();
        self.eof_emitted = token.kind == TokenKind::Eof;
        Some(token)
    }
}

fn punctuation_kind(lexeme: Lexeme) -> TokenKind {
    match lexeme {
        Lexeme::LeftParen => TokenKind::LeftParen,
        Lexeme::RightParen => TokenKind::RightParen,
        Lexeme::LeftBrace => TokenKind::LeftBrace,
        Lexeme::RightBrace => TokenKind::RightBrace,
        Lexeme::Comma => TokenKind::Comma,
        Lexeme::Dot => TokenKind::Dot,
        Lexeme::Minus => TokenKind::Minus,
        Lexeme::Plus => TokenKind::Plus,
        Lexeme::Semicolon => TokenKind::Semicolon,
        Lexeme::Slash => TokenKind::Slash,
        Lexeme::Star => TokenKind::Star,
        Lexeme::Bang => TokenKind::Bang,
        Lexeme::BangEqual => TokenKind::BangEqual,
        Lexeme::Equal => TokenKind::Equal,
        Lexeme::EqualEqual => TokenKind::EqualEqual,
        Lexeme::Greater => TokenKind::Greater,
        Lexeme::GreaterEqual => TokenKind::GreaterEqual,
        Lexeme::Less => TokenKind::Less,
        Lexeme::LessEqual => TokenKind::LessEqual,
        Lexeme::String => TokenKind::String,
        Lexeme::Number => TokenKind::Number,
        Lexeme::Identifier => TokenKind::Identifier,
        Lexeme::UnterminatedString => TokenKind::Error,
    }
}

/// Keyword recognition by first letter(s), then an exact match on the rest.
fn identifier_kind(text: &str) -> TokenKind {
    match text.as_bytes() {
        [b'a', rest @ ..] => keyword(rest, b"nd", TokenKind::And),
        [b'c', rest @ ..] => keyword(rest, b"lass", TokenKind::Class),
        [b'e', rest @ ..] => keyword(rest, b"lse", TokenKind::Else),
        [b'f', b'a', rest @ ..] => keyword(rest, b"lse", TokenKind::False),
        [b'f', b'o', rest @ ..] => keyword(rest, b"r", TokenKind::For),
        [b'f', b'u', rest @ ..] => keyword(rest, b"n", TokenKind::Fun),
        [b'i', rest @ ..] => keyword(rest, b"f", TokenKind::If),
        [b'n', rest @ ..] => keyword(rest, b"il", TokenKind::Nil),
        [b'o', rest @ ..] => keyword(rest, b"r", TokenKind::Or),
        [b'p', rest @ ..] => keyword(rest, b"rint", TokenKind::Print),
        [b'r', rest @ ..] => keyword(rest, b"eturn", TokenKind::Return),
        [b's', rest @ ..] => keyword(rest, b"uper", TokenKind::Super),
        [b't', b'h', rest @ ..] => keyword(rest, b"is", TokenKind::This),
        [b't', b'r', rest @ ..] => keyword(rest, b"ue", TokenKind::True),
        [b'v', rest @ ..] => keyword(rest, b"ar", TokenKind::Var),
        [b'w', rest @ ..] => keyword(rest, b"hile", TokenKind::While),
        _ => TokenKind::Identifier,
    }
}

fn keyword(rest: &[u8], expected: &[u8], kind: TokenKind) -> TokenKind {
    if rest == expected { kind } else { TokenKind::Identifier }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Scanner::new(source).map(|t| t.kind).collect()
    }

    #[test]
    fn scan_print_statement() {
        use TokenKind::*;
        assert_eq!(
            kinds("print 1 + 2.5;"),
            vec![Print, Number, Plus, Number, Semicolon, Eof]
        );
    }

    #[test]
    fn scan_two_character_operators() {
        use TokenKind::*;
        assert_eq!(
            kinds("! != = == > >= < <="),
            vec![Bang, BangEqual, Equal, EqualEqual, Greater, GreaterEqual, Less, LessEqual, Eof]
        );
    }

    #[test]
    fn keywords_need_exact_length() {
        use TokenKind::*;
        assert_eq!(kinds("and andy an"), vec![And, Identifier, Identifier, Eof]);
        assert_eq!(kinds("false fal fun for f"), vec![False, Identifier, Fun, For, Identifier, Eof]);
        assert_eq!(kinds("this true th tru"), vec![This, True, Identifier, Identifier, Eof]);
        assert_eq!(
            kinds("class else if nil or print return super var while"),
            vec![Class, Else, If, Nil, Or, Print, Return, Super, Var, While, Eof]
        );
    }

    #[test]
    fn string_token_includes_quotes() {
        let source = r#""hello world""#;
        let token = Scanner::new(source).next_token();
        assert_eq!(token.kind, TokenKind::String);
        assert_eq!(token.lexeme(source), source);
    }

    #[test]
    fn unterminated_string_is_an_error_token() {
        let mut scanner = Scanner::new("print \"oops");
        assert_eq!(scanner.next_token().kind, TokenKind::Print);
        let token = scanner.next_token();
        assert_eq!(token.kind, TokenKind::Error);
        assert_eq!(token.error, Some(ScanError::UnterminatedString));
        assert_eq!(scanner.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn unexpected_character_does_not_stop_scanning() {
        use TokenKind::*;
        let tokens: Vec<Token> = Scanner::new("1 @ 2").collect();
        assert_eq!(tokens.iter().map(|t| t.kind).collect::<Vec<_>>(), vec![Number, Error, Number, Eof]);
        assert_eq!(tokens[1].error, Some(ScanError::UnexpectedCharacter));
    }

    #[test]
    fn comments_and_newlines_advance_line() {
        let mut scanner = Scanner::new("// header\nprint\n\n  nil; // trailing\n");
        let print = scanner.next_token();
        assert_eq!((print.kind, print.line), (TokenKind::Print, 2));
        let nil = scanner.next_token();
        assert_eq!((nil.kind, nil.line), (TokenKind::Nil, 4));
        assert_eq!(scanner.next_token().line, 4);
        let eof = scanner.next_token();
        assert_eq!((eof.kind, eof.line), (TokenKind::Eof, 5));
    }

    #[test]
    fn multi_line_string_reports_closing_line() {
        let mut scanner = Scanner::new("\"a\nb\" 1");
        assert_eq!(scanner.next_token().line, 2);
        assert_eq!(scanner.next_token().line, 2);
    }

    #[test]
    fn eof_is_repeatable() {
        let mut scanner = Scanner::new("");
        for _ in 0..3 {
            let token = scanner.next_token();
            assert_eq!(token.kind, TokenKind::Eof);
            assert_eq!(token.line, 1);
        }
    }

    #[test]
    fn number_without_fraction_digits_stops_at_dot() {
        use TokenKind::*;
        assert_eq!(kinds("12.5 7."), vec![Number, Number, Dot, Eof]);
    }

    #[test]
    fn lexeme_spans_point_into_source() {
        let source = "  (12.5)";
        let tokens: Vec<Token> = Scanner::new(source).collect();
        assert_eq!(tokens[1].lexeme(source), "12.5");
        assert_eq!(tokens[1].span(), Span { start: 3, end: 7 });
    }
}
