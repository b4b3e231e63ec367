// lower.rs — Lowering from description AST to analysis graphs
//
// Resolves block labels to `BlockId`s, materializes edges, applies
// entry/exit defaults (first/last declared block), and routes pragma lines
// to the annotation parser. Functions with structural errors are dropped
// with a diagnostic; the rest of the unit lowers normally.
//
// Preconditions: `unit` was produced by `parser::parse`.
// Postconditions: every lowered CFG passes `validate()`.
// Failure modes: E0201 (edge to unknown label), E0204 (duplicate label),
//                E0205 (function without blocks); pragma errors per
//                `annotate.rs`.
// Side effects: none.

use std::collections::{BTreeSet, HashMap};

use crate::annotate;
use crate::ast::{FunctionDecl, StmtDecl, Unit};
use crate::cfg::{BlockId, ControlFlowGraph, Statement};
use crate::diag::{codes, Diagnostic};

// ── Host statement ──────────────────────────────────────────────────────────

/// The description language's statement, and the crate's reference
/// implementation of the `Statement` capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostStmt {
    /// Direct call to a named function.
    Call(String),
    /// Call with no statically resolvable target.
    Indirect,
    /// Any non-call statement.
    Nop,
}

impl Statement for HostStmt {
    fn callee(&self) -> Option<&str> {
        match self {
            HostStmt::Call(name) => Some(name),
            HostStmt::Indirect | HostStmt::Nop => None,
        }
    }
}

// ── Results ─────────────────────────────────────────────────────────────────

/// A successfully lowered function.
#[derive(Debug, Clone)]
pub struct LoweredFunction {
    pub name: String,
    pub cfg: ControlFlowGraph<HostStmt>,
}

/// Result of lowering a unit.
#[derive(Debug)]
pub struct LowerResult {
    pub functions: Vec<LoweredFunction>,
    /// Union of all `mpicoll_check` annotations in the unit.
    pub instrument: BTreeSet<String>,
    pub diagnostics: Vec<Diagnostic>,
}

// ── Lowering ────────────────────────────────────────────────────────────────

/// Lower a parsed unit into analysis-ready CFGs plus the opt-in set.
pub fn lower(unit: &Unit) -> LowerResult {
    let mut functions = Vec::new();
    let mut instrument = BTreeSet::new();
    let mut diagnostics = Vec::new();

    for pragma in &unit.pragmas {
        let (directive, args) = annotate::split_directive(&pragma.text);
        if directive == "mpicoll_check" {
            let mut result = annotate::parse_instrument_list(args);
            instrument.append(&mut result.names);
            diagnostics.extend(result.diagnostics);
        } else {
            diagnostics.push(
                Diagnostic::warning(format!("unknown pragma directive '{}' ignored", directive))
                    .with_code(codes::W0104),
            );
        }
    }

    for decl in &unit.functions {
        match lower_function(decl) {
            Ok(cfg) => functions.push(LoweredFunction {
                name: decl.name.name.clone(),
                cfg,
            }),
            Err(diag) => diagnostics.push(diag.with_function(decl.name.name.clone())),
        }
    }

    LowerResult {
        functions,
        instrument,
        diagnostics,
    }
}

fn lower_function(decl: &FunctionDecl) -> Result<ControlFlowGraph<HostStmt>, Diagnostic> {
    if decl.blocks.is_empty() {
        return Err(Diagnostic::error("function declares no blocks").with_code(codes::E0205));
    }

    let mut cfg = ControlFlowGraph::new();
    let mut labels: HashMap<&str, BlockId> = HashMap::new();

    for block in &decl.blocks {
        let stmts = block
            .stmts
            .iter()
            .map(|s| match s {
                StmtDecl::Call(id) => HostStmt::Call(id.name.clone()),
                StmtDecl::Indirect(_) => HostStmt::Indirect,
                StmtDecl::Nop(_) => HostStmt::Nop,
            })
            .collect();
        let id = cfg.add_block(stmts);
        if labels.insert(block.label.name.as_str(), id).is_some() {
            return Err(Diagnostic::error(format!(
                "duplicate block label '{}'",
                block.label.name
            ))
            .with_code(codes::E0204));
        }
    }

    let resolve = |label: &crate::ast::Ident| -> Result<BlockId, Diagnostic> {
        labels.get(label.name.as_str()).copied().ok_or_else(|| {
            Diagnostic::error(format!("reference to unknown block '{}'", label.name))
                .with_code(codes::E0201)
        })
    };

    for edge in &decl.edges {
        let from = resolve(&edge.from)?;
        let to = resolve(&edge.to)?;
        cfg.add_edge(from, to);
    }

    // Defaults: first declared block is the entry, last is the exit.
    cfg.entry = match &decl.entry {
        Some(label) => resolve(label)?,
        None => BlockId(0),
    };
    cfg.exit = match &decl.exit {
        Some(label) => resolve(label)?,
        None => BlockId(cfg.len() as u32 - 1),
    };

    Ok(cfg)
}
