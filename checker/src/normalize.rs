// normalize.rs — Block normalization pass
//
// Rewrites a CFG so no basic block contains more than one collective call.
// Each split peels off the statements up to and including a block's first
// collective call; the tail becomes a new block that inherits the original's
// successor list and is itself scanned later in the same sweep.
//
// Preconditions: `cfg` passed `validate()`.
// Postconditions: every block contains at most one collective call;
//                 statement multiset and per-block order are preserved;
//                 running the pass again performs zero splits.
// Failure modes: none.
// Side effects: mutates `cfg` in place (block boundaries and edges only).

use crate::cfg::{BlockId, ControlFlowGraph, Statement};
use crate::classify::classify_statement;

/// Outcome of a normalization sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeResult {
    /// Number of block splits performed.
    pub splits: usize,
}

/// Split every block holding more than one collective call.
///
/// The sweep walks the arena by index; tail blocks appended by a split are
/// reached by the same sweep, so a block with `n` collective calls ends as a
/// chain of `n` single-call blocks (plus a call-free tail when statements
/// follow the last call). Already-normalized blocks are never re-touched.
pub fn normalize<S: Statement>(cfg: &mut ControlFlowGraph<S>) -> NormalizeResult {
    let mut splits = 0;
    let mut next = 0u32;
    while (next as usize) < cfg.len() {
        let id = BlockId(next);
        if let Some(at) = second_collective_boundary(cfg, id) {
            cfg.split_block(id, at);
            splits += 1;
        }
        next += 1;
    }
    NormalizeResult { splits }
}

/// The split boundary for a block holding a second collective call: the
/// statement index just past the first collective call. `None` when the
/// block is already normalized.
fn second_collective_boundary<S: Statement>(
    cfg: &ControlFlowGraph<S>,
    id: BlockId,
) -> Option<usize> {
    let mut tracked: Option<usize> = None;
    for (i, stmt) in cfg.block(id).stmts.iter().enumerate() {
        if classify_statement(stmt).is_some() {
            if let Some(first) = tracked {
                debug_assert!(i > first);
                return Some(first + 1);
            }
            tracked = Some(i);
        }
    }
    None
}
