// cfg.rs — Control-flow graph types for the collective analysis
//
// The block arena every analysis pass operates on. Host IRs plug in through
// the `Statement` capability trait; the bundled CFG description language
// lowers to the same types (see `lower.rs`).
//
// Preconditions: blocks are added before edges that reference them.
// Postconditions: `validate` accepts exactly the graphs whose entry, exit,
//                 and successor ids all stay inside the arena.
// Failure modes: `CfgError` for out-of-range entry/exit/successor ids.
// Side effects: none (mutation is explicit via `&mut` methods).

use std::fmt;

use serde::Serialize;

// ── Statement capability ────────────────────────────────────────────────────

/// Capability interface a host statement must provide.
///
/// The analysis asks one question of a statement: if it is a call with a
/// statically resolved target, what is the callee's name? Non-calls and
/// indirect calls answer `None`.
pub trait Statement {
    fn callee(&self) -> Option<&str>;
}

// ── Identifiers ─────────────────────────────────────────────────────────────

/// Stable identifier of a basic block within one function's graph.
///
/// Ids are arena indices: splitting appends new blocks, existing ids never
/// move or change meaning for the duration of an analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct BlockId(pub u32);

impl BlockId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

// ── Blocks and graph ────────────────────────────────────────────────────────

/// A basic block: ordered statements plus an ordered successor list.
///
/// Multiplicities are allowed in `succs` (a conditional may branch to the
/// same target twice).
#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock<S> {
    pub id: BlockId,
    pub stmts: Vec<S>,
    pub succs: Vec<BlockId>,
}

/// One function's control-flow graph.
///
/// Built and owned by the host; the analysis mutates block contents and
/// boundaries (splitting) only — it never deletes blocks or edges.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlFlowGraph<S> {
    blocks: Vec<BasicBlock<S>>,
    pub entry: BlockId,
    pub exit: BlockId,
}

/// A structural invariant violation in a host-supplied graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CfgError {
    Empty,
    BadEntry(BlockId),
    BadExit(BlockId),
    UnknownSuccessor { from: BlockId, to: BlockId },
}

impl fmt::Display for CfgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CfgError::Empty => write!(f, "graph has no blocks"),
            CfgError::BadEntry(id) => write!(f, "entry block {} is not in the graph", id),
            CfgError::BadExit(id) => write!(f, "exit block {} is not in the graph", id),
            CfgError::UnknownSuccessor { from, to } => {
                write!(f, "edge {} -> {} references an unknown block", from, to)
            }
        }
    }
}

impl std::error::Error for CfgError {}

impl<S> ControlFlowGraph<S> {
    /// Create an empty graph. Entry and exit default to the first and last
    /// added block until set explicitly.
    pub fn new() -> Self {
        ControlFlowGraph {
            blocks: Vec::new(),
            entry: BlockId(0),
            exit: BlockId(0),
        }
    }

    /// Append a block and return its id. The exit marker follows the last
    /// added block until overridden.
    pub fn add_block(&mut self, stmts: Vec<S>) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(BasicBlock {
            id,
            stmts,
            succs: Vec::new(),
        });
        self.exit = id;
        id
    }

    /// Append a directed edge. Validity is checked by `validate`, not here.
    pub fn add_edge(&mut self, from: BlockId, to: BlockId) {
        self.blocks[from.index()].succs.push(to);
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The block with the given id. Callers run `validate` at the analysis
    /// boundary; ids produced by this graph are always in range.
    pub fn block(&self, id: BlockId) -> &BasicBlock<S> {
        &self.blocks[id.index()]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut BasicBlock<S> {
        &mut self.blocks[id.index()]
    }

    pub fn get(&self, id: BlockId) -> Option<&BasicBlock<S>> {
        self.blocks.get(id.index())
    }

    /// All blocks in id order.
    pub fn blocks(&self) -> impl Iterator<Item = &BasicBlock<S>> {
        self.blocks.iter()
    }

    /// All block ids in id order.
    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> + '_ {
        (0..self.blocks.len() as u32).map(BlockId)
    }

    /// Check the structural invariants a host-supplied graph must satisfy.
    pub fn validate(&self) -> Result<(), CfgError> {
        if self.blocks.is_empty() {
            return Err(CfgError::Empty);
        }
        if self.entry.index() >= self.blocks.len() {
            return Err(CfgError::BadEntry(self.entry));
        }
        if self.exit.index() >= self.blocks.len() {
            return Err(CfgError::BadExit(self.exit));
        }
        for block in &self.blocks {
            for &succ in &block.succs {
                if succ.index() >= self.blocks.len() {
                    return Err(CfgError::UnknownSuccessor {
                        from: block.id,
                        to: succ,
                    });
                }
            }
        }
        Ok(())
    }

    /// Split the block `id` at statement index `at`: statements `at..` move
    /// to a new block that inherits the original's successor list, and the
    /// original keeps statements `..at` with a single edge to the new block.
    ///
    /// Returns the new block's id.
    pub fn split_block(&mut self, id: BlockId, at: usize) -> BlockId {
        let new_id = BlockId(self.blocks.len() as u32);
        let block = &mut self.blocks[id.index()];
        let tail_stmts = block.stmts.split_off(at);
        let tail_succs = std::mem::replace(&mut block.succs, vec![new_id]);
        self.blocks.push(BasicBlock {
            id: new_id,
            stmts: tail_stmts,
            succs: tail_succs,
        });
        // Splitting the exit block moves the exit marker to the tail.
        if self.exit == id {
            self.exit = new_id;
        }
        new_id
    }
}

impl<S> Default for ControlFlowGraph<S> {
    fn default() -> Self {
        Self::new()
    }
}
