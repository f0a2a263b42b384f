//! The `transform` subcommand: load → elaborate → run passes → emit (§6).

use std::fs;
use std::path::{Path, PathBuf};

use grh_diagnostics::{DiagnosticRenderer, DiagnosticSink, Severity, TerminalRenderer};
use grh_pass::{ConstInline, DeadCodeElim, MemInitCheck, Pass, PassManager, RedundantElim, Stats, XmrResolve};
use grh_source::SourceDb;

use crate::input::{load_design_file, merge_design_files};
use crate::{Cli, TransformArgs};

/// Exit codes per the CLI surface contract.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const CLI_ERROR: i32 = 1;
    pub const OPTION_ERROR: i32 = 2;
    pub const SOURCE_PARSE_ERROR: i32 = 3;
    pub const ANALYSIS_ERROR: i32 = 4;
}

/// Builds the default pass pipeline, in the fixed order `aion`'s own
/// pipelines use: structural cleanups before the analyses that benefit from
/// them running on a reduced graph.
fn default_pipeline() -> Vec<Box<dyn Pass>> {
    vec![
        Box::new(XmrResolve),
        Box::new(ConstInline),
        Box::new(RedundantElim),
        Box::new(DeadCodeElim),
        Box::new(MemInitCheck),
        Box::new(Stats),
    ]
}

fn pass_by_id(id: &str) -> Option<Box<dyn Pass>> {
    match id {
        "xmr-resolve" => Some(Box::new(XmrResolve)),
        "const-inline" => Some(Box::new(ConstInline)),
        "redundant-elim" => Some(Box::new(RedundantElim)),
        "dead-code-elim" => Some(Box::new(DeadCodeElim)),
        "mem-init-check" => Some(Box::new(MemInitCheck)),
        "stats" => Some(Box::new(Stats)),
        _ => None,
    }
}

/// Runs the `transform` subcommand, returning a process exit code.
pub fn run(args: &TransformArgs, cli: &Cli) -> i32 {
    if args.sources.is_empty() {
        eprintln!("error: no source files given");
        return exit_code::OPTION_ERROR;
    }

    let config = match &cli.config {
        Some(dir) => match grh_config::load_config(dir) {
            Ok(c) => Some(c),
            Err(e) => {
                eprintln!("error: loading `{}`: {e}", dir.join("grh.toml").display());
                return exit_code::OPTION_ERROR;
            }
        },
        None => None,
    };

    let mut manager = PassManager::new();
    match config.as_ref().map(|c| &c.passes.order) {
        Some(order) if !order.is_empty() => {
            for id in order {
                let Some(pass) = pass_by_id(id) else {
                    eprintln!("error: unknown pass id `{id}` in grh.toml");
                    return exit_code::OPTION_ERROR;
                };
                manager.add_pass(pass);
            }
        }
        _ => {
            for pass in default_pipeline() {
                manager.add_pass(pass);
            }
        }
    }
    if let Some(c) = &config {
        for id in &c.passes.skip {
            manager.remove_pass(id);
        }
        manager.stop_on_error = c.passes.stop_on_error;
    }
    for id in &args.no_pass {
        manager.remove_pass(id);
    }
    for id in &args.pass {
        let Some(pass) = pass_by_id(id) else {
            eprintln!("error: unknown pass id `{id}`");
            return exit_code::OPTION_ERROR;
        };
        manager.add_pass(pass);
    }

    let mut files = Vec::with_capacity(args.sources.len());
    for path in &args.sources {
        match load_design_file(Path::new(path)) {
            Ok(f) => files.push(f),
            Err(e) => {
                eprintln!("error: {e}");
                return exit_code::SOURCE_PARSE_ERROR;
            }
        }
    }
    let (mut design, names) = merge_design_files(files);
    if !args.top.is_empty() {
        let Some(top_name) = args.top.first() else { unreachable!() };
        let found = design.modules.iter().find(|m| names_match(&names, m.name, top_name));
        match found {
            Some(m) => design.top = Some(m.name),
            None => {
                eprintln!("error: unknown top module `{top_name}`");
                return exit_code::OPTION_ERROR;
            }
        }
    }

    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.output.dir.clone()));
    let dump_ast = args.dump_ast || config.as_ref().map_or(false, |c| c.output.dump_ast);

    let sink = DiagnosticSink::new();
    let resolve_ident = |id: grh_common::Ident| {
        names
            .get(id.as_raw() as usize)
            .cloned()
            .unwrap_or_else(|| format!("%{}", id.as_raw()))
    };
    let mut netlist = grh_elaborate::elaborate_design(&design, &resolve_ident, &sink);
    if sink.has_errors() {
        report(&sink, cli.quiet);
        return exit_code::ANALYSIS_ERROR;
    }

    let result = manager.run(&mut netlist, &sink);
    if !result.success {
        report(&sink, cli.quiet);
        return exit_code::ANALYSIS_ERROR;
    }

    if dump_ast {
        let json = grh_emit::render_json(&netlist);
        let dump_path = dump_ast_path(args, output_dir.as_deref());
        if let Err(e) = fs::write(&dump_path, json) {
            eprintln!("error: writing `{}`: {e}", dump_path.display());
            return exit_code::ANALYSIS_ERROR;
        }
    }

    let emit_result = grh_emit::emit(&netlist, &args.top, &sink);
    report(&sink, cli.quiet);
    if !emit_result.success {
        return exit_code::ANALYSIS_ERROR;
    }

    match write_output(args, output_dir.as_deref(), &emit_result.text) {
        Ok(()) => exit_code::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            exit_code::ANALYSIS_ERROR
        }
    }
}

fn names_match(names: &[String], id: grh_common::Ident, target: &str) -> bool {
    names.get(id.as_raw() as usize).map(String::as_str) == Some(target)
}

fn dump_ast_path(args: &TransformArgs, output_dir: Option<&str>) -> PathBuf {
    match (&args.output, output_dir) {
        (Some(out), _) => PathBuf::from(out).with_extension("ast.json"),
        (None, Some(dir)) => Path::new(dir).join("design.ast.json"),
        (None, None) => PathBuf::from("design.ast.json"),
    }
}

fn write_output(args: &TransformArgs, output_dir: Option<&str>, text: &str) -> Result<(), String> {
    let path = match (&args.output, output_dir) {
        (Some(out), _) => PathBuf::from(out),
        (None, Some(dir)) => {
            fs::create_dir_all(dir).map_err(|e| format!("creating `{dir}`: {e}"))?;
            Path::new(dir).join("out.sv")
        }
        (None, None) => PathBuf::from("out.sv"),
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| format!("creating `{}`: {e}", parent.display()))?;
        }
    }
    fs::write(&path, text).map_err(|e| format!("writing `{}`: {e}", path.display()))
}

/// Pretty-prints every accumulated diagnostic to stderr. In quiet mode,
/// only `Warning`- and `Error`-severity diagnostics are shown.
fn report(sink: &DiagnosticSink, quiet: bool) {
    let source_db = SourceDb::new();
    let renderer = TerminalRenderer::new(false, 100);
    let min_severity = if quiet { Severity::Warning } else { Severity::Info };
    for diag in sink.diagnostics() {
        if diag.severity >= min_severity {
            eprint!("{}", renderer.render(&diag, &source_db));
        }
    }
}
