// dot.rs — Graphviz DOT output for control-flow graphs
//
// Renders a CFG (optionally annotated with wavefront ranks) into DOT format
// suitable for `dot`, `neato`, or other Graphviz layout engines. The
// exporter is a debugging collaborator: the analysis has no obligations
// about the rendering beyond determinism.
//
// Preconditions: `cfg` passed `validate()`; `ranks`, when given, came from
//                `assign_ranks` over the same graph.
// Postconditions: returns a valid DOT string; output is deterministic.
// Failure modes: none (pure string formatting).
// Side effects: none.

use std::fmt::Write;

use crate::cfg::{ControlFlowGraph, Statement};
use crate::classify::block_collective;
use crate::rank::RankedPartition;

/// Emit a function's CFG as a Graphviz DOT string.
pub fn emit_dot<S: Statement>(
    name: &str,
    cfg: &ControlFlowGraph<S>,
    ranks: Option<&RankedPartition>,
) -> String {
    let mut buf = String::new();
    writeln!(buf, "digraph mcc {{").unwrap();
    writeln!(buf, "    label=\"{}\";", sanitize(name)).unwrap();
    writeln!(buf, "    labelloc=t;").unwrap();
    writeln!(buf, "    node [fontname=\"Helvetica\", fontsize=10, shape=ellipse];").unwrap();
    writeln!(buf).unwrap();

    for block in cfg.blocks() {
        let mut label = format!("N{}", block.id.0);
        if block.id == cfg.entry {
            label.push_str("\\nentry");
        }
        if block.id == cfg.exit {
            label.push_str("\\nexit");
        }
        let collective = block_collective(block);
        if let Some(kind) = collective {
            label.push_str("\\n");
            label.push_str(kind.name());
        }
        if let Some(partition) = ranks {
            match partition.rank(block.id) {
                Some(r) => {
                    label.push_str(&format!("\\nrank {}", r));
                }
                None => {
                    label.push_str("\\nunreachable");
                }
            }
        }
        if collective.is_some() {
            writeln!(
                buf,
                "    N{} [label=\"{}\", shape=box, style=filled, fillcolor=lightblue];",
                block.id.0, label
            )
            .unwrap();
        } else {
            writeln!(buf, "    N{} [label=\"{}\"];", block.id.0, label).unwrap();
        }
    }

    writeln!(buf).unwrap();
    for block in cfg.blocks() {
        for succ in &block.succs {
            writeln!(buf, "    N{} -> N{};", block.id.0, succ.0).unwrap();
        }
    }
    writeln!(buf, "}}").unwrap();
    buf
}

/// Sanitize a name for embedding in a DOT label.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::DiagLevel;
    use crate::lower::HostStmt;
    use crate::normalize::normalize;
    use crate::rank::assign_ranks;

    fn cfg_of(source: &str) -> ControlFlowGraph<HostStmt> {
        let result = crate::parser::parse(source);
        assert!(result.errors.is_empty(), "parse errors: {:?}", result.errors);
        let unit = result.unit.expect("parse failed");
        let lowered = crate::lower::lower(&unit);
        assert!(
            lowered
                .diagnostics
                .iter()
                .all(|d| d.level != DiagLevel::Error),
            "lower errors: {:#?}",
            lowered.diagnostics
        );
        lowered.functions.into_iter().next().expect("no function").cfg
    }

    #[test]
    fn nodes_and_edges_render() {
        let cfg = cfg_of(
            "function main {
                block b0 { call MPI_Barrier }
                block b1 { nop }
                b0 -> b1
            }",
        );
        let dot = emit_dot("main", &cfg, None);
        assert!(dot.starts_with("digraph mcc {"));
        assert!(dot.contains("label=\"main\";"));
        assert!(dot.contains("N0 [label=\"N0\\nentry\\nMPI_Barrier\", shape=box"));
        assert!(dot.contains("N1 [label=\"N1\\nexit\"];"));
        assert!(dot.contains("N0 -> N1;"));
        assert!(dot.ends_with("}\n"));
    }

    #[test]
    fn ranks_appear_when_partition_is_given() {
        let mut cfg = cfg_of(
            "function main {
                block b0 { call MPI_Barrier }
                block b1 { nop }
                b0 -> b1
            }",
        );
        normalize(&mut cfg);
        let ranked = assign_ranks(&cfg);
        let dot = emit_dot("main", &cfg, Some(&ranked.partition));
        assert!(dot.contains("\\nrank 0"));
        assert!(dot.contains("\\nrank 1"));
    }

    #[test]
    fn output_is_deterministic() {
        let cfg = cfg_of(
            "function main {
                block b0 { nop }
                block b1 { nop }
                b0 -> b1  b0 -> b1
            }",
        );
        assert_eq!(emit_dot("main", &cfg, None), emit_dot("main", &cfg, None));
        // Parallel edges are preserved.
        assert_eq!(emit_dot("main", &cfg, None).matches("N0 -> N1;").count(), 2);
    }

    #[test]
    fn names_are_sanitized() {
        let cfg = cfg_of("function main { block b0 { nop } }");
        let dot = emit_dot("weird name!", &cfg, None);
        assert!(dot.contains("label=\"weird_name_\";"));
    }
}
