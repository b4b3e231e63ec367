// classify.rs — Call-site classification
//
// Bridges host statements to the collective catalog. This is the only place
// the analysis inspects a statement; everything downstream works with
// `Option<CollectiveKind>`.
//
// Preconditions: none.
// Postconditions: never mutates the statement or the graph.
// Failure modes: none — unresolvable call targets classify as `None`
//                (a precision limitation, not an error).
// Side effects: none.

use crate::catalog::{self, CollectiveKind};
use crate::cfg::{BasicBlock, Statement};

/// Classify a single statement.
///
/// `None` for non-calls and for calls without a statically resolvable
/// target (calls through pointers are conservatively not flagged).
pub fn classify_statement<S: Statement>(stmt: &S) -> Option<CollectiveKind> {
    stmt.callee().and_then(catalog::classify)
}

/// The collective operation a block invokes, if any.
///
/// Returns the first collective call site found; after normalization a
/// block contains at most one.
pub fn block_collective<S: Statement>(block: &BasicBlock<S>) -> Option<CollectiveKind> {
    block.stmts.iter().find_map(|s| classify_statement(s))
}
