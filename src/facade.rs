//! The public facade: [`Interpreter`] bundles an [`Environment`] with the global scope it was
//! seeded into, and exposes the handful of operations the CLI and REPL actually need —
//! `eval_string`, variable get/set, and the two `print_symbols`/`print_functions` introspection
//! builtins the original REPL's `-h`-equivalent banner relies on. This mirrors the teacher's
//! `Context` struct: one long-lived object owning interpreter state, with thin methods on top.

use crate::builtins::BUILTINS;
use crate::environment::{EnvId, Environment};
use crate::value::Value;

/// A standalone Paren interpreter: one global environment plus everything needed to tokenize,
/// parse, and evaluate source text against it. Each file given on the command line gets its own
/// fresh `Interpreter`; the REPL keeps one alive for the whole session.
pub struct Interpreter {
	env: Environment,
	global: EnvId,
}

impl Interpreter {
	/// Builds a fresh interpreter with the global scope seeded with `true`, `false`, `E`, and
	/// `PI`, the same constants the original language's startup routine installs before any user
	/// code runs.
	#[must_use]
	pub fn new() -> Self {
		let mut env = Environment::new();
		let global = env.global();
		env.bind(global, "true", Value::Bool(true));
		env.bind(global, "false", Value::Bool(false));
		env.bind(global, "E", Value::Double(std::f64::consts::E));
		env.bind(global, "PI", Value::Double(std::f64::consts::PI));
		Self { env, global }
	}

	/// Tokenizes and parses `source` into zero or more top-level forms and evaluates them in
	/// order, returning the value of the last one (or `Nil` if `source` contained nothing).
	/// Forms are evaluated incrementally, each form sees the bindings any earlier form in the
	/// same call made.
	pub fn eval_string(&mut self, source: &str) -> Value {
		let tokens = crate::lexer::tokenize(source);
		let forms = crate::parser::parse_all(&tokens.tokens);
		let mut result = Value::Nil;
		for form in &forms {
			result = crate::evaluator::eval(form, &mut self.env, self.global);
		}
		result
	}

	/// Looks up a global variable by name, without going through the builtin table.
	#[must_use]
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.env.get(self.global, name)
	}

	/// Binds a global variable by name, the same as evaluating `(set name value)`.
	pub fn set(&mut self, name: &str, value: Value) {
		self.env.bind(self.global, name, value);
	}

	/// Non-function global bindings (constants and plain variables), sorted and ready to print,
	/// ten per line, the way the original REPL's startup banner lists them.
	#[must_use]
	pub fn symbol_names(&self) -> Vec<String> {
		let mut names: Vec<String> = self
			.env
			.global_bindings()
			.filter(|(_, v)| !matches!(v, Value::Fn(_)))
			.map(|(name, _)| name.clone())
			.collect();
		names.sort_unstable();
		names
	}

	/// Global bindings that hold a `fn` closure, sorted the same way as [`Interpreter::symbol_names`].
	#[must_use]
	pub fn function_names(&self) -> Vec<String> {
		let mut names: Vec<String> = self
			.env
			.global_bindings()
			.filter(|(_, v)| matches!(v, Value::Fn(_)))
			.map(|(name, _)| name.clone())
			.collect();
		names.sort_unstable();
		names
	}

	/// The builtin primitive and special-form names, sorted, for the REPL's startup banner.
	#[must_use]
	pub fn builtin_names() -> Vec<&'static str> {
		let mut names: Vec<&'static str> = BUILTINS.keys().copied().collect();
		names.sort_unstable();
		names
	}
}

impl Default for Interpreter {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn seeds_constants_on_construction() {
		let interp = Interpreter::new();
		assert!(matches!(interp.get("true"), Some(Value::Bool(true))));
		assert!(matches!(interp.get("PI"), Some(Value::Double(_))));
	}

	#[test]
	fn eval_string_threads_bindings_across_forms() {
		let mut interp = Interpreter::new();
		let result = interp.eval_string("(set x 10) (* x 2)");
		assert!(matches!(result, Value::Int(20)));
	}

	#[test]
	fn symbol_and_function_names_are_sorted_and_disjoint() {
		let mut interp = Interpreter::new();
		interp.eval_string("(set square (fn (x) (* x x))) (set limit 100)");
		assert!(interp.function_names().contains(&"square".to_owned()));
		assert!(interp.symbol_names().contains(&"limit".to_owned()));
		assert!(!interp.symbol_names().contains(&"square".to_owned()));
	}
}
