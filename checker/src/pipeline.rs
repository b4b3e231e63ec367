// pipeline.rs — Per-function analysis driver
//
// Runs the three passes (normalize, rank, check) in sequence over one
// function's CFG and assembles the reports hosts consume. Functions are
// analyzed independently; a structural failure in one never affects the
// others.
//
// Preconditions: the caller owns the CFGs exclusively for the duration of
//                the run.
// Postconditions: each analyzed CFG is left normalized; reports carry every
//                 diagnostic produced along the way.
// Failure modes: CFG invariant violations abort that function's analysis
//                with a tagged internal error (E0201).
// Side effects: mutates the CFGs in place (normalization).

use std::collections::BTreeSet;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::cfg::{ControlFlowGraph, Statement};
use crate::check::{check, CheckOptions, Mismatch};
use crate::diag::{codes, DiagLevel, Diagnostic};
use crate::lower::LoweredFunction;
use crate::normalize::normalize;
use crate::rank::{assign_ranks, RankDivergence, RankedPartition};

// ── Options ─────────────────────────────────────────────────────────────────

/// Configuration for one analysis run.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    /// Functions opted into the analysis. Empty means "analyze everything".
    pub instrument: BTreeSet<String>,
    pub check: CheckOptions,
}

impl AnalysisOptions {
    /// Whether a function participates in this run.
    pub fn selected(&self, name: &str) -> bool {
        self.instrument.is_empty() || self.instrument.contains(name)
    }
}

// ── Reports ─────────────────────────────────────────────────────────────────

/// Per-function analysis report.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionReport {
    pub function: String,
    /// Stable structural fingerprint of the input CFG (first 8 bytes of
    /// SHA-256, hex).
    pub fingerprint: String,
    /// Block count after normalization.
    pub blocks: usize,
    /// Splits performed by the normalizer.
    pub splits: usize,
    /// Number of rank groups in the partition.
    pub groups: usize,
    pub mismatches: Vec<Mismatch>,
    pub divergences: Vec<RankDivergence>,
    pub diagnostics: Vec<Diagnostic>,
    /// True when no error-level finding was produced.
    pub consistent: bool,
}

/// One function's full analysis output: the report plus the partition the
/// host may want for visualization.
#[derive(Debug)]
pub struct FunctionAnalysis {
    pub partition: Option<RankedPartition>,
    pub report: FunctionReport,
}

/// A whole unit's analysis output.
#[derive(Debug)]
pub struct UnitAnalysis {
    pub functions: Vec<FunctionAnalysis>,
    pub skipped: Vec<String>,
}

/// Serializable unit-level report.
#[derive(Debug, Serialize)]
pub struct UnitReport {
    pub functions: Vec<FunctionReport>,
    pub skipped: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
    pub consistent: bool,
}

impl UnitAnalysis {
    /// Fold per-function reports into a unit report, attaching unit-level
    /// diagnostics (pragma errors, dropped functions).
    pub fn into_report(self, diagnostics: Vec<Diagnostic>) -> UnitReport {
        let functions: Vec<FunctionReport> =
            self.functions.into_iter().map(|f| f.report).collect();
        let consistent = functions.iter().all(|f| f.consistent)
            && diagnostics.iter().all(|d| d.level != DiagLevel::Error);
        UnitReport {
            functions,
            skipped: self.skipped,
            diagnostics,
            consistent,
        }
    }
}

impl std::fmt::Display for UnitReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for report in &self.functions {
            let verdict = if report.consistent {
                "consistent".to_string()
            } else {
                format!("INCONSISTENT ({} conflicting ranks)", report.mismatches.len())
            };
            writeln!(
                f,
                "function '{}': {} blocks ({} splits), {} rank groups — {}",
                report.function, report.blocks, report.splits, report.groups, verdict
            )?;
        }
        for name in &self.skipped {
            writeln!(f, "function '{}': skipped (not instrumented)", name)?;
        }
        Ok(())
    }
}

// ── Fingerprinting ──────────────────────────────────────────────────────────

/// Deterministic structural fingerprint of a CFG.
///
/// Hash key: per block, statement callee names (`\0`-separated, `-` for
/// non-calls) then the successor list, plus entry/exit ids.
/// Output: 16-char hex string (first 8 bytes of SHA-256).
pub fn fingerprint<S: Statement>(cfg: &ControlFlowGraph<S>) -> String {
    let mut hasher = Sha256::new();
    for block in cfg.blocks() {
        hasher.update(block.id.0.to_le_bytes());
        for stmt in &block.stmts {
            match stmt.callee() {
                Some(name) => hasher.update(name.as_bytes()),
                None => hasher.update(b"-"),
            }
            hasher.update(b"\0");
        }
        hasher.update(b"|");
        for succ in &block.succs {
            hasher.update(succ.0.to_le_bytes());
        }
        hasher.update(b"\n");
    }
    hasher.update(cfg.entry.0.to_le_bytes());
    hasher.update(cfg.exit.0.to_le_bytes());
    let hash = hasher.finalize();
    hash.iter().take(8).map(|b| format!("{:02x}", b)).collect()
}

// ── Driver ──────────────────────────────────────────────────────────────────

/// Run the full analysis over one function's CFG.
pub fn analyze_function<S: Statement>(
    name: &str,
    cfg: &mut ControlFlowGraph<S>,
    options: &AnalysisOptions,
) -> FunctionAnalysis {
    let fp = fingerprint(cfg);

    if let Err(err) = cfg.validate() {
        let diag = Diagnostic::error(format!("internal: {}", err))
            .with_code(codes::E0201)
            .with_function(name);
        return FunctionAnalysis {
            partition: None,
            report: FunctionReport {
                function: name.to_string(),
                fingerprint: fp,
                blocks: cfg.len(),
                splits: 0,
                groups: 0,
                mismatches: Vec::new(),
                divergences: Vec::new(),
                diagnostics: vec![diag],
                consistent: false,
            },
        };
    }

    let normalized = normalize(cfg);
    let ranked = assign_ranks(cfg);
    let checked = check(cfg, &ranked.partition, options.check);

    let mut diagnostics: Vec<Diagnostic> = ranked
        .diagnostics
        .into_iter()
        .chain(checked.diagnostics)
        .map(|d| d.with_function(name))
        .collect();
    diagnostics.sort_by_key(|d| match d.level {
        DiagLevel::Error => 0,
        DiagLevel::Warning => 1,
    });

    let consistent = checked.mismatches.is_empty()
        && diagnostics.iter().all(|d| d.level != DiagLevel::Error);

    FunctionAnalysis {
        report: FunctionReport {
            function: name.to_string(),
            fingerprint: fp,
            blocks: cfg.len(),
            splits: normalized.splits,
            groups: ranked.partition.group_count(),
            mismatches: checked.mismatches,
            divergences: ranked.partition.divergences.clone(),
            diagnostics,
            consistent,
        },
        partition: Some(ranked.partition),
    }
}

/// Analyze every instrumented function of a lowered unit.
pub fn analyze_unit(
    functions: &mut [LoweredFunction],
    options: &AnalysisOptions,
) -> UnitAnalysis {
    let mut analyses = Vec::new();
    let mut skipped = Vec::new();

    for function in functions.iter_mut() {
        if !options.selected(&function.name) {
            skipped.push(function.name.clone());
            continue;
        }
        analyses.push(analyze_function(&function.name, &mut function.cfg, options));
    }

    UnitAnalysis {
        functions: analyses,
        skipped,
    }
}
