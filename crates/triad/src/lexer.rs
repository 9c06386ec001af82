//! Tokenizer (ambient front end; spec.md §1 calls real lexing/parsing an
//! external collaborator, but a runnable crate needs one — see
//! SPEC_FULL.md §2). Hand-written, since no existing crate tokenizes this
//! language's particular grammar mixture.
//!
//! Simplification (documented in DESIGN.md): statements require an
//! explicit terminating `;`. Automatic semicolon insertion is not
//! implemented; every seed scenario and the original test suite's
//! fixtures in `examples/original_source/test/*.cpp` use explicit
//! semicolons, so this does not block any required behavior.

use std::rc::Rc;

use crate::{
    ast::{Pos, Span},
    exception::ParseError,
    version::Version,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Tok {
    Ident(Rc<str>),
    Keyword(&'static str),
    Number(f64),
    String(Rc<str>),
    Regex { source: Rc<str>, global: bool, ignore_case: bool },
    Punct(&'static str),
    Eof,
}

const KEYWORDS: &[&str] = &[
    "var", "function", "if", "else", "for", "while", "do", "break", "continue", "return", "with", "throw", "try",
    "catch", "finally", "switch", "case", "default", "new", "delete", "typeof", "void", "in", "instanceof", "this",
    "null", "true", "false", "undefined", "debugger", "in",
];

#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub tok: Tok,
    pub span: Span,
    /// Whether a line terminator appeared between this token and the
    /// previous one. Not currently consulted (no ASI), kept because a
    /// front end for this grammar conventionally tracks it and several
    /// parser diagnostics read better when they can say "on the same
    /// line".
    pub newline_before: bool,
}

pub(crate) struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    line: u32,
    col: u32,
    version: Version,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(src: &'a str, version: Version) -> Self {
        Lexer { src: src.as_bytes(), pos: 0, line: 1, col: 1, version }
    }

    fn peek_byte(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, off: usize) -> Option<u8> {
        self.src.get(self.pos + off).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek_byte()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(b)
    }

    fn here(&self) -> Pos {
        Pos { line: self.line, col: self.col }
    }

    /// Cheap backtracking support for the parser's one-token lookahead
    /// (labeled statements, `get`/`set` accessor disambiguation). The
    /// lexer carries no state besides these three fields, so snapshotting
    /// them is enough to replay from an earlier point.
    pub(crate) fn pos_for_checkpoint(&self) -> usize {
        self.pos
    }
    pub(crate) fn line_for_checkpoint(&self) -> u32 {
        self.line
    }
    pub(crate) fn col_for_checkpoint(&self) -> u32 {
        self.col
    }
    pub(crate) fn restore_checkpoint(&mut self, pos: usize, line: u32, col: u32) {
        self.pos = pos;
        self.line = line;
        self.col = col;
    }

    fn err(&self, msg: impl Into<String>) -> ParseError {
        let p = self.here();
        ParseError { message: msg.into(), span: Span { start: p, end: p } }
    }

    /// Skips whitespace and comments, returning whether a newline was
    /// crossed.
    fn skip_trivia(&mut self) -> bool {
        let mut saw_newline = false;
        loop {
            match self.peek_byte() {
                Some(b' ') | Some(b'\t') | Some(b'\r') => {
                    self.bump();
                }
                Some(b'\n') => {
                    saw_newline = true;
                    self.bump();
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while let Some(b) = self.peek_byte() {
                        if b == b'\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    self.bump();
                    self.bump();
                    loop {
                        match self.peek_byte() {
                            None => break,
                            Some(b'*') if self.peek_at(1) == Some(b'/') => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            Some(b'\n') => {
                                saw_newline = true;
                                self.bump();
                            }
                            _ => {
                                self.bump();
                            }
                        }
                    }
                }
                _ => break,
            }
        }
        saw_newline
    }

    /// `regex_allowed` tells the lexer whether `/` at this position should
    /// be read as a regex literal (true after most punctuators/keywords)
    /// or a division operator (true after an identifier/number/`)`/`]`).
    /// The parser tracks this and passes it in, since the lexer alone
    /// can't know the grammatical context.
    pub(crate) fn next_token(&mut self, regex_allowed: bool) -> Result<Token, ParseError> {
        let newline_before = self.skip_trivia();
        let start = self.here();
        let Some(b) = self.peek_byte() else {
            return Ok(Token { tok: Tok::Eof, span: Span { start, end: start }, newline_before });
        };

        if b.is_ascii_alphabetic() || b == b'_' || b == b'$' {
            return self.lex_ident_or_keyword(start, newline_before);
        }
        if b.is_ascii_digit() || (b == b'.' && self.peek_at(1).is_some_and(|c| c.is_ascii_digit())) {
            return self.lex_number(start, newline_before);
        }
        if b == b'"' || b == b'\'' {
            return self.lex_string(start, newline_before, b);
        }
        if b == b'/' && regex_allowed {
            return self.lex_regex(start, newline_before);
        }
        self.lex_punct(start, newline_before)
    }

    fn lex_ident_or_keyword(&mut self, start: Pos, newline_before: bool) -> Result<Token, ParseError> {
        let begin = self.pos;
        while let Some(b) = self.peek_byte() {
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'$' {
                self.bump();
            } else {
                break;
            }
        }
        let text = std::str::from_utf8(&self.src[begin..self.pos]).unwrap();
        let end = self.here();
        let span = Span { start, end };
        if text == "use" {
            // handled specially by the parser's directive-prologue check
        }
        if let Some(kw) = KEYWORDS.iter().find(|k| **k == text) {
            if (*kw == "debugger") && !self.version.has_v5_syntax() {
                return Ok(Token { tok: Tok::Ident(Rc::from(text)), span, newline_before });
            }
            return Ok(Token { tok: Tok::Keyword(kw), span, newline_before });
        }
        Ok(Token { tok: Tok::Ident(Rc::from(text)), span, newline_before })
    }

    fn lex_number(&mut self, start: Pos, newline_before: bool) -> Result<Token, ParseError> {
        let begin = self.pos;
        if self.peek_byte() == Some(b'0') && matches!(self.peek_at(1), Some(b'x') | Some(b'X')) {
            self.bump();
            self.bump();
            while self.peek_byte().is_some_and(|b| b.is_ascii_hexdigit()) {
                self.bump();
            }
            let text = std::str::from_utf8(&self.src[begin..self.pos]).unwrap();
            let n = crate::coerce::parse_numeric_literal(text).ok_or_else(|| self.err("invalid hex literal"))?;
            return Ok(Token { tok: Tok::Number(n), span: Span { start, end: self.here() }, newline_before });
        }
        // Octal literals (`0` followed by more digits) only parse pre-V5.
        if self.peek_byte() == Some(b'0')
            && self.peek_at(1).is_some_and(|b| b.is_ascii_digit())
            && self.version.infers_octal()
        {
            self.bump();
            let oct_begin = self.pos;
            while self.peek_byte().is_some_and(|b| (b'0'..=b'7').contains(&b)) {
                self.bump();
            }
            let text = std::str::from_utf8(&self.src[oct_begin..self.pos]).unwrap();
            let n = i64::from_str_radix(text, 8).map_err(|_| self.err("invalid octal literal"))? as f64;
            return Ok(Token { tok: Tok::Number(n), span: Span { start, end: self.here() }, newline_before });
        }
        // A leading-zero integer with more digits is only legal as an octal
        // literal (handled above, pre-V5); from V5 onward it is rejected
        // rather than silently falling through to a decimal reading.
        if self.peek_byte() == Some(b'0') && self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) {
            return Err(self.err("octal literals are not allowed in this version"));
        }
        while self.peek_byte().is_some_and(|b| b.is_ascii_digit()) {
            self.bump();
        }
        if self.peek_byte() == Some(b'.') {
            self.bump();
            while self.peek_byte().is_some_and(|b| b.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.peek_byte(), Some(b'e') | Some(b'E')) {
            self.bump();
            if matches!(self.peek_byte(), Some(b'+') | Some(b'-')) {
                self.bump();
            }
            while self.peek_byte().is_some_and(|b| b.is_ascii_digit()) {
                self.bump();
            }
        }
        let text = std::str::from_utf8(&self.src[begin..self.pos]).unwrap();
        let n = text.parse::<f64>().map_err(|_| self.err("invalid number literal"))?;
        Ok(Token { tok: Tok::Number(n), span: Span { start, end: self.here() }, newline_before })
    }

    fn lex_string(&mut self, start: Pos, newline_before: bool, quote: u8) -> Result<Token, ParseError> {
        self.bump();
        let mut s = String::new();
        loop {
            match self.peek_byte() {
                None => return Err(self.err("unterminated string literal")),
                Some(b) if b == quote => {
                    self.bump();
                    break;
                }
                Some(b'\\') => {
                    self.bump();
                    match self.bump() {
                        Some(b'n') => s.push('\n'),
                        Some(b't') => s.push('\t'),
                        Some(b'r') => s.push('\r'),
                        Some(b'\\') => s.push('\\'),
                        Some(b'\'') => s.push('\''),
                        Some(b'"') => s.push('"'),
                        Some(b'0') => s.push('\0'),
                        Some(b'b') => s.push('\u{8}'),
                        Some(b'f') => s.push('\u{c}'),
                        Some(b'v') => s.push('\u{b}'),
                        Some(b'\n') => {}
                        Some(other) => s.push(other as char),
                        None => return Err(self.err("unterminated string literal")),
                    }
                }
                Some(_) => {
                    // Re-decode as UTF-8 a rune at a time so non-ASCII
                    // source text round-trips.
                    let rest = std::str::from_utf8(&self.src[self.pos..]).unwrap_or("");
                    if let Some(ch) = rest.chars().next() {
                        for _ in 0..ch.len_utf8() {
                            self.bump();
                        }
                        s.push(ch);
                    } else {
                        self.bump();
                    }
                }
            }
        }
        Ok(Token { tok: Tok::String(Rc::from(s.as_str())), span: Span { start, end: self.here() }, newline_before })
    }

    fn lex_regex(&mut self, start: Pos, newline_before: bool) -> Result<Token, ParseError> {
        self.bump(); // leading '/'
        let begin = self.pos;
        let mut in_class = false;
        loop {
            match self.peek_byte() {
                None => return Err(self.err("unterminated regular expression literal")),
                Some(b'\\') => {
                    self.bump();
                    self.bump();
                }
                Some(b'[') => {
                    in_class = true;
                    self.bump();
                }
                Some(b']') => {
                    in_class = false;
                    self.bump();
                }
                Some(b'/') if !in_class => break,
                _ => {
                    self.bump();
                }
            }
        }
        let source = std::str::from_utf8(&self.src[begin..self.pos]).unwrap().to_string();
        self.bump(); // trailing '/'
        let flags_begin = self.pos;
        while self.peek_byte().is_some_and(|b| b.is_ascii_alphabetic()) {
            self.bump();
        }
        let flags = std::str::from_utf8(&self.src[flags_begin..self.pos]).unwrap();
        let global = flags.contains('g');
        let ignore_case = flags.contains('i');
        Ok(Token {
            tok: Tok::Regex { source: Rc::from(source.as_str()), global, ignore_case },
            span: Span { start, end: self.here() },
            newline_before,
        })
    }

    fn lex_punct(&mut self, start: Pos, newline_before: bool) -> Result<Token, ParseError> {
        const THREE: &[&str] = &["===", "!==", ">>>", "<<=", ">>="];
        const TWO: &[&str] = &[
            "==", "!=", "<=", ">=", "&&", "||", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<",
            ">>",
        ];
        let remaining = std::str::from_utf8(&self.src[self.pos..]).unwrap_or("");
        for cand in THREE {
            if remaining.starts_with(cand) {
                for _ in 0..3 {
                    self.bump();
                }
                return Ok(Token { tok: Tok::Punct(cand), span: Span { start, end: self.here() }, newline_before });
            }
        }
        for cand in TWO {
            if remaining.starts_with(cand) {
                for _ in 0..2 {
                    self.bump();
                }
                return Ok(Token { tok: Tok::Punct(cand), span: Span { start, end: self.here() }, newline_before });
            }
        }
        const ONE: &str = "{}()[];,<>+-*/%&|^!~?:=.";
        if let Some(b) = self.peek_byte() {
            if ONE.contains(b as char) {
                self.bump();
                let s: &'static str = match b {
                    b'{' => "{",
                    b'}' => "}",
                    b'(' => "(",
                    b')' => ")",
                    b'[' => "[",
                    b']' => "]",
                    b';' => ";",
                    b',' => ",",
                    b'<' => "<",
                    b'>' => ">",
                    b'+' => "+",
                    b'-' => "-",
                    b'*' => "*",
                    b'/' => "/",
                    b'%' => "%",
                    b'&' => "&",
                    b'|' => "|",
                    b'^' => "^",
                    b'!' => "!",
                    b'~' => "~",
                    b'?' => "?",
                    b':' => ":",
                    b'=' => "=",
                    b'.' => ".",
                    _ => unreachable!(),
                };
                return Ok(Token { tok: Tok::Punct(s), span: Span { start, end: self.here() }, newline_before });
            }
        }
        Err(self.err(format!("unexpected character {:?}", self.peek_byte().map(|b| b as char))))
    }
}
