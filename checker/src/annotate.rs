// annotate.rs — Instrumentation annotation parsing
//
// Owns the argument grammar of the `mpicoll_check` pragma: a function name,
// or a parenthesized comma-separated list of names. The accumulated names
// form an explicit opt-in set passed to the driver — there is no global
// registry. A malformed annotation aborts that annotation (its names are
// discarded) but never the run.
//
// Preconditions: `input` is the pragma's argument text (directive stripped).
// Postconditions: on success `names` holds every listed function; on error
//                 `names` is empty and `diagnostics` explains why.
// Failure modes: E0101 (expected a name), E0102 (missing ')'),
//                E0103 (unexpected ')').
// Side effects: none.

use std::collections::BTreeSet;

use logos::Logos;

use crate::diag::{codes, Diagnostic};

/// Tokens of the annotation argument grammar.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t]+")]
enum PragmaToken {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Name(String),
}

/// Result of parsing one annotation.
#[derive(Debug)]
pub struct AnnotateResult {
    pub names: BTreeSet<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl AnnotateResult {
    fn err(diagnostic: Diagnostic) -> Self {
        AnnotateResult {
            names: BTreeSet::new(),
            diagnostics: vec![diagnostic],
        }
    }
}

/// Split a pragma's text into its directive name and argument text.
pub fn split_directive(text: &str) -> (&str, &str) {
    let text = text.trim();
    let end = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    (&text[..end], text[end..].trim_start())
}

/// Parse an instrumentation list: `name` or `(name, name, ...)`.
pub fn parse_instrument_list(input: &str) -> AnnotateResult {
    let mut tokens = Vec::new();
    for (result, range) in PragmaToken::lexer(input).spanned() {
        match result {
            Ok(tok) => tokens.push(tok),
            Err(()) => {
                return AnnotateResult::err(
                    Diagnostic::error(format!(
                        "expected a function name, found {:?}",
                        &input[range]
                    ))
                    .with_code(codes::E0101),
                );
            }
        }
    }

    let mut names = BTreeSet::new();
    let mut iter = tokens.into_iter();

    match iter.next() {
        Some(PragmaToken::Name(name)) => {
            names.insert(name);
            match iter.next() {
                None => {}
                Some(PragmaToken::RParen) => {
                    return AnnotateResult::err(
                        Diagnostic::error("unexpected closing parenthesis")
                            .with_code(codes::E0103),
                    );
                }
                Some(_) => {
                    return AnnotateResult::err(
                        Diagnostic::error("expected end of annotation after function name")
                            .with_code(codes::E0101),
                    );
                }
            }
        }
        Some(PragmaToken::LParen) => loop {
            match iter.next() {
                Some(PragmaToken::Name(name)) => {
                    names.insert(name);
                }
                _ => {
                    return AnnotateResult::err(
                        Diagnostic::error("expected a function name").with_code(codes::E0101),
                    );
                }
            }
            match iter.next() {
                Some(PragmaToken::Comma) => continue,
                Some(PragmaToken::RParen) => {
                    if iter.next().is_some() {
                        return AnnotateResult::err(
                            Diagnostic::error("expected end of annotation after ')'")
                                .with_code(codes::E0101),
                        );
                    }
                    break;
                }
                None => {
                    return AnnotateResult::err(
                        Diagnostic::error("missing closing parenthesis")
                            .with_code(codes::E0102),
                    );
                }
                Some(_) => {
                    return AnnotateResult::err(
                        Diagnostic::error("expected ',' or ')' after function name")
                            .with_code(codes::E0101),
                    );
                }
            }
        },
        Some(PragmaToken::RParen) => {
            return AnnotateResult::err(
                Diagnostic::error("unexpected closing parenthesis").with_code(codes::E0103),
            );
        }
        _ => {
            return AnnotateResult::err(
                Diagnostic::error("expected a function name").with_code(codes::E0101),
            );
        }
    }

    AnnotateResult {
        names,
        diagnostics: Vec::new(),
    }
}
