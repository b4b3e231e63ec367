// ast.rs — AST node types for CFG description files
//
// Mirrors the grammar of the `.cfg` description language the bundled IR
// provider reads. Every node carries a `SimpleSpan` for error reporting in
// the lowering phase.
//
// Preconditions: produced by the parser from a valid or partially-valid
//                token stream.
// Postconditions: each node's span covers the source range of the construct.
// Failure modes: none (data-only module).
// Side effects: none.

use chumsky::span::SimpleSpan;

/// Byte-offset span (alias for chumsky's `SimpleSpan`).
pub type Span = SimpleSpan;

/// An identifier with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

// ── Root ──

/// A complete description unit: pragmas plus function declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub pragmas: Vec<PragmaDecl>,
    pub functions: Vec<FunctionDecl>,
    pub span: Span,
}

// ── pragma: 'pragma' <directive> <argument text to end of line> ──

/// A raw pragma line. The directive name and its argument grammar are owned
/// by the annotation collaborator (`annotate.rs`); the parser only captures
/// the text.
#[derive(Debug, Clone, PartialEq)]
pub struct PragmaDecl {
    /// Everything after the `pragma` keyword, trimmed.
    pub text: String,
    pub span: Span,
}

// ── function_decl: 'function' IDENT '{' item* '}' ──

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Ident,
    pub blocks: Vec<BlockDecl>,
    pub edges: Vec<EdgeDecl>,
    /// Explicit entry label; defaults to the first declared block.
    pub entry: Option<Ident>,
    /// Explicit exit label; defaults to the last declared block.
    pub exit: Option<Ident>,
    pub span: Span,
}

// ── block_decl: 'block' IDENT '{' stmt* '}' ──

#[derive(Debug, Clone, PartialEq)]
pub struct BlockDecl {
    pub label: Ident,
    pub stmts: Vec<StmtDecl>,
    pub span: Span,
}

/// A declared statement.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtDecl {
    /// `call IDENT` — a direct call to the named function.
    Call(Ident),
    /// `indirect` — a call with no statically resolvable target.
    Indirect(Span),
    /// `nop` — any non-call statement.
    Nop(Span),
}

// ── edge_decl: IDENT '->' IDENT ──

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeDecl {
    pub from: Ident,
    pub to: Ident,
    pub span: Span,
}
