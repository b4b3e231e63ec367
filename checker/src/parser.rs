// Parser for CFG description (.cfg) files.
//
// Parses a token stream (from the lexer) into an AST. Uses chumsky
// combinators. Within a function body, block declarations, edges, and
// entry/exit directives may appear in any order.
//
// Preconditions: input is a valid token stream from `lexer::lex()`.
// Postconditions: returns an AST plus any parse errors (non-fatal).
// Failure modes: syntax errors produce `Rich` diagnostics.
// Side effects: none.

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;
use chumsky::span::SimpleSpan;

use crate::ast::*;
use crate::lexer::Token;

/// Result of parsing: AST plus any errors.
#[derive(Debug)]
pub struct ParseResult {
    pub unit: Option<Unit>,
    pub errors: Vec<Rich<'static, Token, SimpleSpan>>,
}

/// Parse a CFG description string. Lexes then parses.
///
/// Returns the unit (if parsing succeeded) plus any errors.
pub fn parse(source: &str) -> ParseResult {
    let lex_result = crate::lexer::lex(source);
    let len = source.len();

    // Convert lexer output to chumsky stream.
    let token_iter = lex_result.tokens.into_iter().map(|(tok, span)| {
        let cspan: SimpleSpan = (span.start..span.end).into();
        (tok, cspan)
    });
    let eoi: SimpleSpan = (len..len).into();
    let stream = Stream::from_iter(token_iter).map(eoi, |(t, s): (_, _)| (t, s));

    let parser = unit_parser(source);
    let (unit, parse_errors) = parser.parse(stream).into_output_errors();

    // Merge lex errors + parse errors.
    let mut all_errors: Vec<Rich<'static, Token, SimpleSpan>> = lex_result
        .errors
        .into_iter()
        .map(|e| {
            let span: SimpleSpan = (e.span.start..e.span.end).into();
            Rich::custom(span, e.message)
        })
        .collect();
    all_errors.extend(parse_errors.into_iter().map(|e| e.into_owned()));

    ParseResult {
        unit,
        errors: all_errors,
    }
}

// ── Item buckets ──
//
// Function bodies and units interleave their constructs freely; the parser
// collects them as tagged items and partitions in `map_with`.

enum FnItem {
    Block(BlockDecl),
    Edge(EdgeDecl),
    Entry(Ident),
    Exit(Ident),
}

enum TopItem {
    Pragma(PragmaDecl),
    Function(FunctionDecl),
}

// ── Main parser builder ──
//
// All grammar rules are built inside `unit_parser` so that the `source`
// reference is captured once and shared by all combinators.

fn unit_parser<'tokens, 'src: 'tokens, I>(
    source: &'src str,
) -> impl Parser<'tokens, I, Unit, extra::Err<Rich<'tokens, Token, SimpleSpan>>> + 'src
where
    'tokens: 'src,
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    // ── Identifier ──

    let ident = just(Token::Ident).map_with(move |_, e| {
        let span: SimpleSpan = e.span();
        Ident {
            name: source[span.start()..span.end()].to_string(),
            span,
        }
    });

    // ── Statements ──

    let stmt = choice((
        just(Token::Call)
            .ignore_then(ident.clone())
            .map(StmtDecl::Call),
        just(Token::Indirect).map_with(|_, e| StmtDecl::Indirect(e.span())),
        just(Token::Nop).map_with(|_, e| StmtDecl::Nop(e.span())),
    ));

    // ── Block declaration: 'block' IDENT '{' stmt* '}' ──

    let block_decl = just(Token::Block)
        .ignore_then(ident.clone())
        .then(
            stmt.repeated()
                .collect::<Vec<_>>()
                .delimited_by(just(Token::LBrace), just(Token::RBrace)),
        )
        .map_with(|(label, stmts), e| BlockDecl {
            label,
            stmts,
            span: e.span(),
        });

    // ── Edge declaration: IDENT '->' IDENT ──

    let edge_decl = ident
        .clone()
        .then_ignore(just(Token::Arrow))
        .then(ident.clone())
        .map_with(|(from, to), e| EdgeDecl {
            from,
            to,
            span: e.span(),
        });

    // ── Function items ──

    let fn_item = choice((
        block_decl.map(FnItem::Block),
        just(Token::Entry)
            .ignore_then(ident.clone())
            .map(FnItem::Entry),
        just(Token::Exit)
            .ignore_then(ident.clone())
            .map(FnItem::Exit),
        edge_decl.map(FnItem::Edge),
    ));

    // ── Function declaration ──

    let function_decl = just(Token::Function)
        .ignore_then(ident.clone())
        .then(
            fn_item
                .repeated()
                .collect::<Vec<_>>()
                .delimited_by(just(Token::LBrace), just(Token::RBrace)),
        )
        .map_with(|(name, items), e| {
            let mut blocks = Vec::new();
            let mut edges = Vec::new();
            let mut entry = None;
            let mut exit = None;
            for item in items {
                match item {
                    FnItem::Block(b) => blocks.push(b),
                    FnItem::Edge(ed) => edges.push(ed),
                    FnItem::Entry(id) => entry = Some(id),
                    FnItem::Exit(id) => exit = Some(id),
                }
            }
            FunctionDecl {
                name,
                blocks,
                edges,
                entry,
                exit,
                span: e.span(),
            }
        });

    // ── Pragma ──

    let pragma = select! {
        Token::Pragma(text) = e => PragmaDecl { text, span: e.span() },
    };

    // ── Unit ──

    let top = pragma
        .map(TopItem::Pragma)
        .or(function_decl.map(TopItem::Function));

    top.repeated()
        .collect::<Vec<_>>()
        .map_with(|tops, e| {
            let mut pragmas = Vec::new();
            let mut functions = Vec::new();
            for t in tops {
                match t {
                    TopItem::Pragma(p) => pragmas.push(p),
                    TopItem::Function(f) => functions.push(f),
                }
            }
            Unit {
                pragmas,
                functions,
                span: e.span(),
            }
        })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Unit {
        let result = parse(source);
        assert!(
            result.errors.is_empty(),
            "unexpected errors: {:#?}",
            result.errors
        );
        result.unit.expect("expected unit")
    }

    #[test]
    fn empty_unit() {
        let unit = parse_ok("");
        assert!(unit.pragmas.is_empty());
        assert!(unit.functions.is_empty());
    }

    #[test]
    fn minimal_function() {
        let unit = parse_ok("function main { block b0 { nop } }");
        assert_eq!(unit.functions.len(), 1);
        let f = &unit.functions[0];
        assert_eq!(f.name.name, "main");
        assert_eq!(f.blocks.len(), 1);
        assert_eq!(f.blocks[0].label.name, "b0");
        assert_eq!(f.blocks[0].stmts.len(), 1);
        assert!(matches!(&f.blocks[0].stmts[0], StmtDecl::Nop(_)));
    }

    #[test]
    fn statement_kinds() {
        let unit = parse_ok("function f { block b0 { call MPI_Barrier indirect nop } }");
        let stmts = &unit.functions[0].blocks[0].stmts;
        assert_eq!(stmts.len(), 3);
        assert!(matches!(&stmts[0], StmtDecl::Call(id) if id.name == "MPI_Barrier"));
        assert!(matches!(&stmts[1], StmtDecl::Indirect(_)));
        assert!(matches!(&stmts[2], StmtDecl::Nop(_)));
    }

    #[test]
    fn edges_and_directives_in_any_order() {
        let unit = parse_ok(
            "function f {
                entry b1
                block b0 { nop }
                b0 -> b1
                block b1 { nop }
                exit b0
                b1 -> b0
            }",
        );
        let f = &unit.functions[0];
        assert_eq!(f.blocks.len(), 2);
        assert_eq!(f.edges.len(), 2);
        assert_eq!(f.edges[0].from.name, "b0");
        assert_eq!(f.edges[1].to.name, "b0");
        assert_eq!(f.entry.as_ref().map(|i| i.name.as_str()), Some("b1"));
        assert_eq!(f.exit.as_ref().map(|i| i.name.as_str()), Some("b0"));
    }

    #[test]
    fn pragmas_collected_at_unit_level() {
        let unit = parse_ok(
            "pragma mpicoll_check main\nfunction main { block b0 { nop } }",
        );
        assert_eq!(unit.pragmas.len(), 1);
        assert_eq!(unit.pragmas[0].text, "mpicoll_check main");
    }

    #[test]
    fn multiple_functions() {
        let unit = parse_ok(
            "function a { block b0 { nop } }\nfunction b { block b0 { call f } }",
        );
        assert_eq!(unit.functions.len(), 2);
        assert_eq!(unit.functions[1].name.name, "b");
    }

    #[test]
    fn missing_brace_is_an_error() {
        let result = parse("function main { block b0 { nop }");
        assert!(!result.errors.is_empty());
    }

    #[test]
    fn stray_token_is_an_error() {
        let result = parse("function main { block b0 { nop } } ->");
        assert!(!result.errors.is_empty());
    }
}
