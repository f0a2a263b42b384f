//! Grh CLI — the command-line driver for the GRH SystemVerilog
//! transformation toolchain.
//!
//! The toolchain's front end (lexer/parser/name binder) is out of scope
//! (§4.0); `transform` takes already-elaborated designs serialized as JSON
//! (see [`input`]) rather than raw `.sv` text.

#![warn(missing_docs)]

mod input;
mod transform;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

/// Grh — the GRH SystemVerilog transformation toolchain.
#[derive(Parser, Debug)]
#[command(name = "grh", version, about = "GRH SystemVerilog transformation toolchain")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a custom `grh.toml` configuration file's directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Elaborate, run passes, and emit SystemVerilog.
    Transform(TransformArgs),
}

/// Arguments for the `grh transform` subcommand (§6 "CLI surface").
#[derive(Parser, Debug)]
pub struct TransformArgs {
    /// Source design files (JSON-serialized elaborated `AstDesign`, §4.0).
    #[arg(required = true)]
    pub sources: Vec<String>,

    /// Top module name override (may repeat; the first wins for elaboration,
    /// every entry is validated against the emitted netlist).
    #[arg(long)]
    pub top: Vec<String>,

    /// Render the elaborated netlist's attribute schema as a JSON debug
    /// artifact alongside the emitted SystemVerilog.
    #[arg(long)]
    pub dump_ast: bool,

    /// Append a pass to the default pipeline (by id, e.g. `const-inline`).
    #[arg(long = "pass")]
    pub pass: Vec<String>,

    /// Remove a pass from the default pipeline (by id).
    #[arg(long = "no-pass")]
    pub no_pass: Vec<String>,

    /// Output file for the emitted SystemVerilog.
    #[arg(short = 'o', long)]
    pub output: Option<String>,

    /// Output directory for the emitted SystemVerilog (mutually exclusive
    /// with `-o` in intent; `-o` wins if both are given).
    #[arg(long)]
    pub output_dir: Option<String>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{e}");
            process::exit(transform::exit_code::CLI_ERROR);
        }
    };

    let code = match &cli.command {
        Command::Transform(args) => transform::run(args, &cli),
    };
    process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_transform_basic() {
        let cli = Cli::parse_from(["grh", "transform", "top.json"]);
        match cli.command {
            Command::Transform(args) => {
                assert_eq!(args.sources, vec!["top.json"]);
                assert!(args.top.is_empty());
                assert!(!args.dump_ast);
                assert!(args.pass.is_empty());
                assert!(args.no_pass.is_empty());
                assert!(args.output.is_none());
                assert!(args.output_dir.is_none());
            }
        }
    }

    #[test]
    fn parse_transform_multiple_sources() {
        let cli = Cli::parse_from(["grh", "transform", "a.json", "b.json"]);
        match cli.command {
            Command::Transform(args) => assert_eq!(args.sources, vec!["a.json", "b.json"]),
        }
    }

    #[test]
    fn parse_transform_repeated_top() {
        let cli = Cli::parse_from(["grh", "transform", "top.json", "--top", "a", "--top", "b"]);
        match cli.command {
            Command::Transform(args) => assert_eq!(args.top, vec!["a", "b"]),
        }
    }

    #[test]
    fn parse_transform_dump_ast() {
        let cli = Cli::parse_from(["grh", "transform", "top.json", "--dump-ast"]);
        match cli.command {
            Command::Transform(args) => assert!(args.dump_ast),
        }
    }

    #[test]
    fn parse_transform_pass_flags() {
        let cli = Cli::parse_from([
            "grh",
            "transform",
            "top.json",
            "--pass",
            "stats",
            "--no-pass",
            "dead-code-elim",
        ]);
        match cli.command {
            Command::Transform(args) => {
                assert_eq!(args.pass, vec!["stats"]);
                assert_eq!(args.no_pass, vec!["dead-code-elim"]);
            }
        }
    }

    #[test]
    fn parse_transform_output() {
        let cli = Cli::parse_from(["grh", "transform", "top.json", "-o", "out.sv"]);
        match cli.command {
            Command::Transform(args) => assert_eq!(args.output.as_deref(), Some("out.sv")),
        }
    }

    #[test]
    fn parse_transform_output_dir() {
        let cli = Cli::parse_from(["grh", "transform", "top.json", "--output-dir", "build"]);
        match cli.command {
            Command::Transform(args) => assert_eq!(args.output_dir.as_deref(), Some("build")),
        }
    }

    #[test]
    fn missing_sources_is_a_parse_error() {
        assert!(Cli::try_parse_from(["grh", "transform"]).is_err());
    }

    #[test]
    fn parse_global_quiet() {
        let cli = Cli::parse_from(["grh", "--quiet", "transform", "top.json"]);
        assert!(cli.quiet);
    }
}
