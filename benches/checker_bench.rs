use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};

use mcc::cfg::{BlockId, ControlFlowGraph};
use mcc::check::{check, CheckOptions};
use mcc::lower::HostStmt;
use mcc::normalize::normalize;
use mcc::rank::assign_ranks;

// KPI-aligned benchmark scenarios: the analysis is expected to stay linear
// in block count on branch-heavy graphs.

/// A chain of `n` diamonds. Each diamond's arms hold two consecutive
/// collectives, so normalization splits every arm and the checker sees two
/// call-bearing blocks per rank.
fn diamond_chain(n: usize) -> ControlFlowGraph<HostStmt> {
    let mut cfg = ControlFlowGraph::new();
    let mut prev = cfg.add_block(vec![HostStmt::Nop]);
    for _ in 0..n {
        let left = cfg.add_block(vec![
            HostStmt::Call("MPI_Barrier".to_string()),
            HostStmt::Call("MPI_Bcast".to_string()),
        ]);
        let right = cfg.add_block(vec![
            HostStmt::Call("MPI_Barrier".to_string()),
            HostStmt::Call("MPI_Bcast".to_string()),
        ]);
        let join = cfg.add_block(vec![HostStmt::Nop]);
        cfg.add_edge(prev, left);
        cfg.add_edge(prev, right);
        cfg.add_edge(left, join);
        cfg.add_edge(right, join);
        prev = join;
    }
    cfg
}

/// A straight line of `n` blocks alternating collectives and plain calls.
fn straight_line(n: usize) -> ControlFlowGraph<HostStmt> {
    let mut cfg = ControlFlowGraph::new();
    let mut prev: Option<BlockId> = None;
    for i in 0..n {
        let stmts = if i % 2 == 0 {
            vec![HostStmt::Call("MPI_Allreduce".to_string())]
        } else {
            vec![HostStmt::Call("compute".to_string()), HostStmt::Nop]
        };
        let id = cfg.add_block(stmts);
        if let Some(p) = prev {
            cfg.add_edge(p, id);
        }
        prev = Some(id);
    }
    cfg
}

fn run_analysis(mut cfg: ControlFlowGraph<HostStmt>) {
    normalize(&mut cfg);
    let ranked = assign_ranks(&cfg);
    black_box(check(&cfg, &ranked.partition, CheckOptions::default()));
}

fn bench_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze");

    for &size in &[16usize, 64, 256] {
        group.bench_with_input(
            BenchmarkId::new("diamond_chain", size),
            &size,
            |b, &size| {
                b.iter_batched(|| diamond_chain(size), run_analysis, BatchSize::SmallInput)
            },
        );
        group.bench_with_input(
            BenchmarkId::new("straight_line", size),
            &size,
            |b, &size| {
                b.iter_batched(|| straight_line(size), run_analysis, BatchSize::SmallInput)
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_analysis);
criterion_main!(benches);
