//! The interactive shell and startup banner. Plain `println!`/`print!` plus `colored` for
//! emphasis, the same way the library crate's evaluator prints its own diagnostics — there's no
//! dedicated logging crate here, just terminal output.

use std::io::{self, Write};

use colored::Colorize as _;
use paren::facade::Interpreter;
use paren::lexer::tokenize;

pub const USAGE: &str = "Usage: paren [OPTIONS...] [FILES...]\n\nOPTIONS:\n    -h    print this screen.\n    -v    print version.";

const PROMPT: &str = "> ";
const CONTINUATION_PROMPT: &str = "  ";

/// Prints the startup banner the REPL shows before its first prompt: the version line, the
/// predefined symbols and functions seeded into a fresh interpreter, and a one-line syntax note.
pub fn print_logo(interpreter: &Interpreter) {
	println!("{}", format!("Paren {} (C) 2013 Kim, Taegyoon", env!("CARGO_PKG_VERSION")).bold());
	println!("{}", "Predefined Symbols:".underline());
	print_columns(&interpreter.symbol_names());
	println!("{}", "Functions:".underline());
	let builtins: Vec<String> = Interpreter::builtin_names().into_iter().map(str::to_owned).collect();
	print_columns(&builtins);
	println!("{}", "Etc.:".underline());
	println!(" (list) \"string\" ; end-of-line comment");
}

/// Prints `names` ten per line, space separated. Used for the symbol/function banners above; the
/// builtin table is large enough that one name per line would scroll the banner off-screen.
fn print_columns(names: &[String]) {
	for chunk in names.chunks(10) {
		println!("{}", chunk.join(" "));
	}
}

/// Runs the read-eval-print loop until end-of-input. A source buffer accumulates lines until its
/// parenthesis/string nesting closes (see [`paren::lexer::Tokens::is_complete`]), at which point it
/// is evaluated as one unit and the prompt resets to the primary `"> "` rather than the
/// continuation `"  "`. On end-of-input, whatever is still buffered (even an unterminated form) is
/// evaluated one last time before the loop exits.
pub fn repl() {
	let mut interpreter = Interpreter::new();
	let mut buffer = String::new();
	let stdin = io::stdin();

	loop {
		print!("{}", if buffer.is_empty() { PROMPT } else { CONTINUATION_PROMPT });
		let _ = io::stdout().flush();

		let mut line = String::new();
		if stdin.read_line(&mut line).unwrap_or(0) == 0 {
			println!();
			if !buffer.is_empty() {
				let result = interpreter.eval_string(&buffer);
				println!("{}", result.display_with_type().cyan());
			}
			break;
		}
		buffer.push_str(&line);

		if tokenize(&buffer).is_complete() {
			let result = interpreter.eval_string(&buffer);
			println!("{}", result.display_with_type().cyan());
			buffer.clear();
		}
	}
}
