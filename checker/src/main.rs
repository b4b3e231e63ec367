use clap::Parser;
use std::path::PathBuf;

use mcc::check::CheckOptions;
use mcc::pipeline::{analyze_unit, AnalysisOptions};

#[derive(Debug, Clone, clap::ValueEnum)]
enum EmitStage {
    /// Human-readable consistency report (default).
    Check,
    /// Machine-readable JSON report.
    Json,
    /// Graphviz CFGs, before and after normalization.
    Dot,
}

#[derive(Parser, Debug)]
#[command(
    name = "mcc",
    version,
    about = "MPI Collective Checker — detects inconsistent collective sequencing across CFG paths"
)]
struct Cli {
    /// Input .cfg description file
    source: PathBuf,

    /// Output stage
    #[arg(long, value_enum, default_value_t = EmitStage::Check)]
    emit: EmitStage,

    /// Additional instrumented functions, e.g. "main" or "(main, worker)"
    #[arg(long)]
    instrument: Option<String>,

    /// Stop at the first conflicting rank per function
    #[arg(long)]
    fail_fast: bool,

    /// Do not warn about collectives present on only one of two converging paths
    #[arg(long)]
    no_divergence: bool,

    /// Directory for --emit dot output files
    #[arg(long, default_value = ".")]
    dot_dir: PathBuf,

    /// Print analysis phases and counts
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        eprintln!("mcc: source = {}", cli.source.display());
        eprintln!("mcc: emit   = {:?}", cli.emit);
    }

    // ── Read and parse source ──
    let source = match std::fs::read_to_string(&cli.source) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("mcc: error: {}: {}", cli.source.display(), e);
            std::process::exit(2);
        }
    };

    let parse_result = mcc::parser::parse(&source);
    if !parse_result.errors.is_empty() {
        for err in &parse_result.errors {
            eprintln!("mcc: parse error: {}", err);
        }
        std::process::exit(2);
    }
    let unit = match parse_result.unit {
        Some(u) => u,
        None => {
            eprintln!("mcc: parse failed with no output");
            std::process::exit(2);
        }
    };

    // ── Lowering ──
    let mut lowered = mcc::lower::lower(&unit);
    for diag in &lowered.diagnostics {
        eprintln!("mcc: {}", diag);
    }

    if cli.verbose {
        eprintln!(
            "mcc: lowered {} functions, {} instrumented by pragma",
            lowered.functions.len(),
            lowered.instrument.len()
        );
    }

    // ── Options ──
    let mut instrument = lowered.instrument.clone();
    if let Some(list) = &cli.instrument {
        let mut parsed = mcc::annotate::parse_instrument_list(list);
        if !parsed.diagnostics.is_empty() {
            for diag in &parsed.diagnostics {
                eprintln!("mcc: --instrument: {}", diag);
            }
            std::process::exit(2);
        }
        instrument.append(&mut parsed.names);
    }
    let options = AnalysisOptions {
        instrument,
        check: CheckOptions {
            stop_at_first: cli.fail_fast,
            flag_divergence: !cli.no_divergence,
        },
    };

    // ── Pre-normalization dumps ──
    if matches!(cli.emit, EmitStage::Dot) {
        if let Err(e) = std::fs::create_dir_all(&cli.dot_dir) {
            eprintln!("mcc: error: {}: {}", cli.dot_dir.display(), e);
            std::process::exit(2);
        }
        for function in &lowered.functions {
            if !options.selected(&function.name) {
                continue;
            }
            let fp = mcc::pipeline::fingerprint(&function.cfg);
            let path = cli
                .dot_dir
                .join(format!("{}_{}_before.dot", function.name, fp));
            let dot = mcc::dot::emit_dot(&function.name, &function.cfg, None);
            if let Err(e) = std::fs::write(&path, dot) {
                eprintln!("mcc: error: {}: {}", path.display(), e);
                std::process::exit(2);
            }
            println!("mcc: wrote {}", path.display());
        }
    }

    // ── Analysis ──
    let analysis = analyze_unit(&mut lowered.functions, &options);

    for function in &analysis.functions {
        for diag in &function.report.diagnostics {
            eprintln!("mcc: {}", diag);
        }
    }

    // ── Post-normalization dumps ──
    if matches!(cli.emit, EmitStage::Dot) {
        for function in &analysis.functions {
            let lowered_fn = lowered
                .functions
                .iter()
                .find(|f| f.name == function.report.function);
            let Some(lowered_fn) = lowered_fn else { continue };
            let path = cli.dot_dir.join(format!(
                "{}_{}_after.dot",
                function.report.function, function.report.fingerprint
            ));
            let dot = mcc::dot::emit_dot(
                &function.report.function,
                &lowered_fn.cfg,
                function.partition.as_ref(),
            );
            if let Err(e) = std::fs::write(&path, dot) {
                eprintln!("mcc: error: {}: {}", path.display(), e);
                std::process::exit(2);
            }
            println!("mcc: wrote {}", path.display());
        }
    }

    let report = analysis.into_report(lowered.diagnostics);

    match cli.emit {
        EmitStage::Check | EmitStage::Dot => {
            print!("{}", report);
        }
        EmitStage::Json => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("mcc: error: report serialization failed: {}", e);
                std::process::exit(2);
            }
        },
    }

    if !report.consistent {
        std::process::exit(1);
    }
}
