// Property-based tests for analysis invariants.
//
// Three categories over randomly generated CFGs:
// 1. Normalization: idempotence, statement preservation, one collective
//    call per block.
// 2. Rank assignment: partition totality and rank monotonicity (modulo
//    recorded divergences and loop back edges).
// 3. Checking: completes without error diagnostics on structurally valid
//    graphs.
//
// Uses proptest with explicit configuration to prevent CI flakiness.

use proptest::prelude::*;

use mcc::cfg::{BlockId, ControlFlowGraph};
use mcc::check::{check, CheckOptions};
use mcc::classify::{block_collective, classify_statement};
use mcc::lower::HostStmt;
use mcc::normalize::normalize;
use mcc::rank::{assign_ranks, back_edges};

// ── CFG generator ───────────────────────────────────────────────────────────

fn arb_stmt() -> impl Strategy<Value = HostStmt> {
    prop_oneof![
        2 => Just(HostStmt::Nop),
        1 => Just(HostStmt::Indirect),
        2 => prop_oneof![
            Just("MPI_Barrier"),
            Just("MPI_Bcast"),
            Just("MPI_Reduce"),
            Just("compute"),
            Just("log"),
        ]
        .prop_map(|name| HostStmt::Call(name.to_string())),
    ]
}

/// A random CFG: a backbone chain b0 -> b1 -> ... (so every block is
/// reachable and the exit is the last block) plus arbitrary extra edges,
/// which may create diamonds, forward jumps, and loops.
fn arb_cfg() -> impl Strategy<Value = ControlFlowGraph<HostStmt>> {
    (2usize..10).prop_flat_map(|n| {
        (
            prop::collection::vec(prop::collection::vec(arb_stmt(), 0..5), n),
            prop::collection::vec((0..n, 0..n), 0..2 * n),
        )
            .prop_map(move |(blocks, extra_edges)| {
                let mut cfg = ControlFlowGraph::new();
                for stmts in blocks {
                    cfg.add_block(stmts);
                }
                for i in 0..n - 1 {
                    cfg.add_edge(BlockId(i as u32), BlockId(i as u32 + 1));
                }
                for (a, b) in extra_edges {
                    cfg.add_edge(BlockId(a as u32), BlockId(b as u32));
                }
                cfg
            })
    })
}

fn callee_multiset(cfg: &ControlFlowGraph<HostStmt>) -> Vec<String> {
    let mut names: Vec<String> = cfg
        .blocks()
        .flat_map(|b| &b.stmts)
        .map(|s| match s {
            HostStmt::Call(name) => format!("call:{}", name),
            HostStmt::Indirect => "indirect".to_string(),
            HostStmt::Nop => "nop".to_string(),
        })
        .collect();
    names.sort();
    names
}

// ── 1. Normalization invariants ─────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 200,
        .. ProptestConfig::default()
    })]

    #[test]
    fn normalization_leaves_at_most_one_collective_per_block(cfg in arb_cfg()) {
        let mut cfg = cfg;
        normalize(&mut cfg);
        for block in cfg.blocks() {
            let collectives = block
                .stmts
                .iter()
                .filter(|s| classify_statement(*s).is_some())
                .count();
            prop_assert!(
                collectives <= 1,
                "block {} holds {} collective calls",
                block.id,
                collectives
            );
        }
    }

    #[test]
    fn normalization_preserves_statements(cfg in arb_cfg()) {
        let mut cfg = cfg;
        let before = callee_multiset(&cfg);
        normalize(&mut cfg);
        prop_assert_eq!(callee_multiset(&cfg), before);
    }

    #[test]
    fn normalization_is_idempotent(cfg in arb_cfg()) {
        let mut cfg = cfg;
        normalize(&mut cfg);
        let after_first = cfg.clone();
        let second = normalize(&mut cfg);
        prop_assert_eq!(second.splits, 0);
        prop_assert_eq!(cfg, after_first);
    }

    #[test]
    fn normalization_preserves_validity(cfg in arb_cfg()) {
        let mut cfg = cfg;
        prop_assert!(cfg.validate().is_ok());
        normalize(&mut cfg);
        prop_assert!(cfg.validate().is_ok());
    }
}

// ── 2. Rank assignment invariants ───────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 200,
        .. ProptestConfig::default()
    })]

    #[test]
    fn partition_is_total_over_reachable_blocks(cfg in arb_cfg()) {
        let mut cfg = cfg;
        normalize(&mut cfg);
        let result = assign_ranks(&cfg);
        let p = result.partition;

        // The backbone chain makes every block reachable.
        for id in cfg.block_ids() {
            let memberships = p.groups.iter().filter(|g| g.contains(&id)).count();
            prop_assert_eq!(memberships, 1, "block {} in {} groups", id, memberships);
            prop_assert!(p.rank(id).is_some());
        }
        let total: usize = p.groups.iter().map(|g| g.len()).sum();
        prop_assert_eq!(total, cfg.len());
        // No internal-limit diagnostics on valid graphs.
        prop_assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn ranks_are_monotone_or_divergent(cfg in arb_cfg()) {
        let mut cfg = cfg;
        normalize(&mut cfg);
        let result = assign_ranks(&cfg);
        let p = result.partition;
        let backs = back_edges(&cfg);

        for block in cfg.blocks() {
            let ru = p.rank(block.id).unwrap();
            let candidate = if block_collective(block).is_some() {
                ru + 1
            } else {
                ru
            };
            for &succ in &block.succs {
                if backs.contains(&(block.id, succ)) {
                    continue;
                }
                let rv = p.rank(succ).unwrap();
                let diverged = p
                    .divergences
                    .iter()
                    .any(|d| d.from == block.id && d.block == succ);
                prop_assert!(
                    rv == candidate || diverged,
                    "edge {} -> {}: rank {} vs candidate {}, no divergence recorded",
                    block.id,
                    succ,
                    rv,
                    candidate
                );
            }
        }
    }

    #[test]
    fn entry_is_rank_zero(cfg in arb_cfg()) {
        let mut cfg = cfg;
        normalize(&mut cfg);
        let result = assign_ranks(&cfg);
        prop_assert_eq!(result.partition.rank(cfg.entry), Some(0));
        prop_assert!(result.partition.groups[0].contains(&cfg.entry));
    }
}

// ── 3. Checker invariants ───────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        max_shrink_iters: 100,
        .. ProptestConfig::default()
    })]

    #[test]
    fn checker_completes_on_any_valid_graph(cfg in arb_cfg()) {
        let mut cfg = cfg;
        normalize(&mut cfg);
        let ranked = assign_ranks(&cfg);
        let result = check(&cfg, &ranked.partition, CheckOptions::default());

        for mismatch in &result.mismatches {
            prop_assert!((mismatch.rank as usize) < ranked.partition.group_count());
            prop_assert!(mismatch.kinds.len() >= 2);
        }
    }

    #[test]
    fn uniform_collectives_never_mismatch(n in 2usize..8) {
        // Every block calls the same collective: whatever the edge shape,
        // no rank can hold two distinct kinds.
        let mut cfg = ControlFlowGraph::new();
        for _ in 0..n {
            cfg.add_block(vec![HostStmt::Call("MPI_Allreduce".to_string())]);
        }
        for i in 0..n - 1 {
            cfg.add_edge(BlockId(i as u32), BlockId(i as u32 + 1));
        }
        // Extra diamond edges.
        for i in 0..n - 2 {
            cfg.add_edge(BlockId(i as u32), BlockId(i as u32 + 2));
        }
        normalize(&mut cfg);
        let ranked = assign_ranks(&cfg);
        let result = check(&cfg, &ranked.partition, CheckOptions::default());
        prop_assert!(result.mismatches.is_empty());
    }
}
