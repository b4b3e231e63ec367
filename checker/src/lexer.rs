// Lexer for CFG description (.cfg) files.
//
// Tokenizes the block/edge description language the bundled IR provider
// reads. Uses the `logos` crate for DFA-based lexing. Whitespace and `#`
// comments are insignificant; a `pragma` line is captured whole and handed
// to the annotation parser later.
//
// Preconditions: input is valid UTF-8.
// Postconditions: returns all tokens with byte-offset spans, plus any lex
//                 errors.
// Failure modes: unrecognized characters produce `LexError`; lexing
//                continues.
// Side effects: none.

use logos::Logos;
use std::fmt;

/// Byte-offset span in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// A lexer error with location.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub span: Span,
    pub message: String,
}

/// Result of lexing: tokens plus any errors (non-fatal).
#[derive(Debug)]
pub struct LexResult {
    pub tokens: Vec<(Token, Span)>,
    pub errors: Vec<LexError>,
}

/// CFG description token types.
///
/// Keywords and symbols are matched as fixed strings. Identifiers carry no
/// value — use the span to retrieve the text from the source.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+|#[^\n]*")]
pub enum Token {
    // ── Keywords ──
    #[token("function")]
    Function,
    #[token("block")]
    Block,
    #[token("entry")]
    Entry,
    #[token("exit")]
    Exit,
    #[token("call")]
    Call,
    #[token("indirect")]
    Indirect,
    #[token("nop")]
    Nop,

    // ── Symbols ──
    #[token("->")]
    Arrow,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    // ── Pragma line ──
    //
    // Captured whole (the annotation collaborator owns the argument
    // grammar). The mandatory blank after `pragma` keeps identifiers such
    // as `pragmatic` out of this rule.
    /// A `pragma <directive> ...` line; value is the text after `pragma`.
    #[regex(r"pragma[ \t][^\n]*", pragma_text)]
    Pragma(String),

    // ── Identifier ──
    //
    // Placed after keywords — logos prioritises fixed `#[token]` matches
    // over regex for the same length, so `block` matches Block, not Ident.
    /// Identifier: `[a-zA-Z_][a-zA-Z0-9_]*`
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Function => write!(f, "function"),
            Token::Block => write!(f, "block"),
            Token::Entry => write!(f, "entry"),
            Token::Exit => write!(f, "exit"),
            Token::Call => write!(f, "call"),
            Token::Indirect => write!(f, "indirect"),
            Token::Nop => write!(f, "nop"),
            Token::Arrow => write!(f, "->"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Pragma(_) => write!(f, "<pragma>"),
            Token::Ident => write!(f, "<ident>"),
        }
    }
}

// ── Callbacks ──

fn pragma_text(lex: &mut logos::Lexer<'_, Token>) -> String {
    lex.slice()["pragma".len()..].trim().to_string()
}

// ── Public API ──

/// Lex a CFG description string into tokens.
///
/// Returns all successfully parsed tokens together with any errors for
/// unrecognised characters. Lexing is non-fatal: errors are collected and
/// the lexer continues past bad characters.
pub fn lex(source: &str) -> LexResult {
    let lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    for (result, range) in lexer.spanned() {
        let span = Span {
            start: range.start,
            end: range.end,
        };
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => errors.push(LexError {
                span,
                message: format!("unexpected character: {:?}", &source[span.start..span.end]),
            }),
        }
    }

    LexResult { tokens, errors }
}

// ── Tests ──
