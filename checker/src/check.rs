// check.rs — Rank consistency checking
//
// Inspects each rank group of a partition and verifies that every block
// invoking a collective within the group invokes the same one. Findings are
// the product of the analysis, not failures: the pass always completes and
// reports everything it saw (unless asked to stop at the first conflict).
//
// Preconditions: `partition` was produced by `assign_ranks` over `cfg`.
// Postconditions: no mutation of the graph or the partition.
// Failure modes: none.
// Side effects: none.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::catalog::CollectiveKind;
use crate::cfg::{BlockId, ControlFlowGraph, Statement};
use crate::classify::block_collective;
use crate::diag::{codes, Diagnostic};
use crate::rank::RankedPartition;

// ── Options ─────────────────────────────────────────────────────────────────

/// Checker configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckOptions {
    /// Stop after the first conflicting rank (the first mismatch is usually
    /// sufficient for a report).
    pub stop_at_first: bool,
    /// Surface rank divergences recorded during propagation — a collective
    /// on one path with no counterpart on a converging sibling path.
    pub flag_divergence: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        CheckOptions {
            stop_at_first: false,
            flag_divergence: true,
        }
    }
}

// ── Findings ────────────────────────────────────────────────────────────────

/// A rank whose blocks disagree on which collective they invoke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub rank: u32,
    /// The distinct conflicting kinds, in catalog order.
    pub kinds: Vec<CollectiveKind>,
    /// The call-site blocks participating in the conflict, in id order.
    pub blocks: Vec<BlockId>,
}

/// Result of the consistency check.
#[derive(Debug)]
pub struct CheckResult {
    pub mismatches: Vec<Mismatch>,
    pub diagnostics: Vec<Diagnostic>,
}

// ── Checking ────────────────────────────────────────────────────────────────

/// Verify that all blocks sharing a rank agree on their collective.
pub fn check<S: Statement>(
    cfg: &ControlFlowGraph<S>,
    partition: &RankedPartition,
    options: CheckOptions,
) -> CheckResult {
    let mut mismatches = Vec::new();
    let mut diagnostics = Vec::new();

    for (rank, group) in partition.groups.iter().enumerate() {
        let mut kinds: BTreeSet<CollectiveKind> = BTreeSet::new();
        let mut call_blocks: Vec<BlockId> = Vec::new();
        for &id in group {
            if let Some(kind) = block_collective(cfg.block(id)) {
                kinds.insert(kind);
                call_blocks.push(id);
            }
        }
        if kinds.len() > 1 {
            let kinds: Vec<CollectiveKind> = kinds.into_iter().collect();
            let names: Vec<&str> = kinds.iter().map(|k| k.name()).collect();
            diagnostics.push(
                Diagnostic::error(format!(
                    "conflicting collective operations at rank {}: {}",
                    rank,
                    names.join(" vs ")
                ))
                .with_code(codes::E0301)
                .with_hint("processes taking different paths reach different collectives here"),
            );
            mismatches.push(Mismatch {
                rank: rank as u32,
                kinds,
                blocks: call_blocks,
            });
            if options.stop_at_first {
                break;
            }
        }
    }

    if options.flag_divergence {
        for d in &partition.divergences {
            diagnostics.push(
                Diagnostic::warning(format!(
                    "paths converging at block {} cross different numbers of \
                     collectives ({} vs {})",
                    d.block, d.assigned, d.candidate
                ))
                .with_code(codes::W0302)
                .with_hint(
                    "a collective on one branch has no counterpart on the sibling branch",
                ),
            );
        }
    }

    CheckResult {
        mismatches,
        diagnostics,
    }
}
