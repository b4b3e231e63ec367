// rank.rs — Wavefront rank assignment
//
// Forward breadth-first propagation from the entry block. Crossing a block
// that invokes a collective advances the rank counter by one; pure
// control-flow branching does not. First discovery wins: a block already
// assigned is never re-ranked, which also bounds the traversal on cyclic
// graphs.
//
// A re-reached block whose candidate rank disagrees with its assigned rank
// marks two converging paths that crossed different numbers of collectives.
// Along forward edges that is recorded as a `RankDivergence` (the checker
// turns it into a finding); along back edges it is the normal shape of a
// loop whose body synchronizes, and is ignored.
//
// Preconditions: `cfg` passed `validate()`; normally also `normalize()`.
// Postconditions: every block reachable from entry appears in exactly one
//                 rank group; unreachable blocks stay unranked (W0202).
// Failure modes: iteration bound exceeded emits E0203 (signals a broken
//                graph the pass cannot analyze further) instead of hanging.
// Side effects: none (read-only over the graph).

use std::collections::{HashSet, VecDeque};

use serde::Serialize;

use crate::cfg::{BlockId, ControlFlowGraph, Statement};
use crate::classify::block_collective;
use crate::diag::{codes, Diagnostic};

// ── Public types ────────────────────────────────────────────────────────────

/// The ordered partition of reachable blocks into rank groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPartition {
    /// Rank groups in order; group `r` lists its blocks in id order.
    pub groups: Vec<Vec<BlockId>>,
    /// Rank per block, indexed by block id. `None` = unreachable.
    pub rank_of: Vec<Option<u32>>,
    /// Forward-edge rank conflicts discovered during propagation.
    pub divergences: Vec<RankDivergence>,
}

impl RankedPartition {
    pub fn rank(&self, id: BlockId) -> Option<u32> {
        self.rank_of.get(id.index()).copied().flatten()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

/// Converging paths crossed different numbers of collectives: `block` was
/// assigned its rank first, then re-reached from `from` with a different
/// candidate rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankDivergence {
    pub block: BlockId,
    pub from: BlockId,
    pub assigned: u32,
    pub candidate: u32,
}

/// Result of rank assignment.
#[derive(Debug)]
pub struct RankResult {
    pub partition: RankedPartition,
    pub diagnostics: Vec<Diagnostic>,
}

// ── Back-edge classification ────────────────────────────────────────────────

/// Edges closing a cycle, per an iterative three-color depth-first walk
/// from the entry block. Successor order follows the block's edge list.
pub fn back_edges<S>(cfg: &ControlFlowGraph<S>) -> HashSet<(BlockId, BlockId)> {
    const UNSEEN: u8 = 0;
    const OPEN: u8 = 1;
    const DONE: u8 = 2;

    let mut state = vec![UNSEEN; cfg.len()];
    let mut backs = HashSet::new();
    if cfg.is_empty() {
        return backs;
    }

    let mut stack: Vec<(BlockId, usize)> = vec![(cfg.entry, 0)];
    state[cfg.entry.index()] = OPEN;

    while let Some(frame) = stack.last_mut() {
        let (u, next) = *frame;
        let succs = &cfg.block(u).succs;
        if next < succs.len() {
            frame.1 += 1;
            let v = succs[next];
            match state[v.index()] {
                UNSEEN => {
                    state[v.index()] = OPEN;
                    stack.push((v, 0));
                }
                OPEN => {
                    backs.insert((u, v));
                }
                _ => {}
            }
        } else {
            state[u.index()] = DONE;
            stack.pop();
        }
    }
    backs
}

// ── Rank assignment ─────────────────────────────────────────────────────────

/// Partition the graph into wavefront ranks.
pub fn assign_ranks<S: Statement>(cfg: &ControlFlowGraph<S>) -> RankResult {
    let n = cfg.len();
    let mut rank_of: Vec<Option<u32>> = vec![None; n];
    let mut divergences: Vec<RankDivergence> = Vec::new();
    let mut diverged: HashSet<(BlockId, BlockId)> = HashSet::new();
    let mut diagnostics = Vec::new();

    let backs = back_edges(cfg);

    let mut queue = VecDeque::new();
    rank_of[cfg.entry.index()] = Some(0);
    queue.push_back(cfg.entry);

    // Every block enters the queue at most once; anything past `n` pops
    // means the visited table has been bypassed and the graph is broken.
    let mut pops = 0usize;
    while let Some(u) = queue.pop_front() {
        pops += 1;
        if pops > n {
            diagnostics.push(
                Diagnostic::error(format!(
                    "rank propagation exceeded its bound of {} blocks; \
                     graph invariants are violated",
                    n
                ))
                .with_code(codes::E0203),
            );
            break;
        }

        let ru = rank_of[u.index()].unwrap_or(0);
        let candidate = if block_collective(cfg.block(u)).is_some() {
            ru + 1
        } else {
            ru
        };

        for &v in &cfg.block(u).succs {
            match rank_of[v.index()] {
                None => {
                    rank_of[v.index()] = Some(candidate);
                    queue.push_back(v);
                }
                Some(rv) => {
                    if rv != candidate && !backs.contains(&(u, v)) && diverged.insert((u, v)) {
                        divergences.push(RankDivergence {
                            block: v,
                            from: u,
                            assigned: rv,
                            candidate,
                        });
                    }
                }
            }
        }
    }

    for id in cfg.block_ids() {
        if rank_of[id.index()].is_none() {
            diagnostics.push(
                Diagnostic::warning(format!(
                    "block {} is unreachable from entry and is excluded from the analysis",
                    id
                ))
                .with_code(codes::W0202),
            );
        }
    }

    let max_rank = rank_of.iter().flatten().copied().max().unwrap_or(0);
    let mut groups: Vec<Vec<BlockId>> = vec![Vec::new(); max_rank as usize + 1];
    for id in cfg.block_ids() {
        if let Some(r) = rank_of[id.index()] {
            groups[r as usize].push(id);
        }
    }

    RankResult {
        partition: RankedPartition {
            groups,
            rank_of,
            divergences,
        },
        diagnostics,
    }
}
