//! # Paren
//!
//! A small, dynamically typed, parenthesized-prefix expression language — a tokenizer, a
//! recursive-descent parser, and a tree-walking evaluator, wrapped in a CLI that either runs one
//! or more source files or drops into an interactive REPL.
//!
//! ## Usage
//!
//! ```bash
//! paren                # print the logo and start the REPL
//! paren script.prn     # evaluate a file
//! paren -v             # print the version
//! ```

mod cli;

use std::path::PathBuf;

use clap::Parser as _;
use paren::facade::Interpreter;

/// Command-line arguments. Paren has no subcommands, only two flags and a list of files, so this
/// mirrors the original interpreter's argument handling rather than the richer subcommand-based
/// CLI a bigger tool would need.
#[derive(clap::Parser)]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct Args {
	/// Print the usage screen and exit.
	#[arg(short = 'h')]
	help: bool,

	/// Print the interpreter version and exit.
	#[arg(short = 'v')]
	version: bool,

	/// Source files to evaluate. With none given, starts the REPL instead.
	files: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	if args.help {
		println!("{}", cli::USAGE);
		return Ok(());
	}
	if args.version {
		println!("{}", env!("CARGO_PKG_VERSION"));
		return Ok(());
	}

	if args.files.is_empty() {
		cli::print_logo(&Interpreter::new());
		cli::repl();
		return Ok(());
	}

	for path in &args.files {
		match std::fs::read_to_string(path) {
			Ok(source) => {
				let mut interpreter = Interpreter::new();
				interpreter.eval_string(&source);
			}
			Err(_) => eprintln!("Cannot open file: {}", path.display()),
		}
	}

	Ok(())
}
