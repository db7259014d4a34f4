//! The runtime value type. A `Value` is a tagged union of everything a Paren expression can
//! evaluate to: the parser only ever produces `Nil`, `Int`, `Double`, `Symbol`, `String`, and
//! `List` nodes; `Builtin` and `Fn` values are created by the evaluator itself (resolving a
//! builtin name, or evaluating a `fn` form).
//!
//! Every variant has a total, infallible conversion to `int`, `double`, and `string` (§3 of the
//! design notes calls these "coercions"). Reading the wrong payload directly (e.g. matching out an
//! `i64` from a `Value::Str`) is a programmer error, not something this module tries to guard
//! against — callers that need a specific representation should go through the coercion methods.

use std::rc::Rc;

use crate::builtins::Opcode;

/// A closure: the original `(fn (params...) body...)` form, plus the id of the environment it
/// captured at the point of definition. The form is reference-counted because applying a function
/// clones its `Value::Fn` on every call site evaluation but never needs to mutate the body.
#[derive(Debug, Clone)]
pub struct Closure {
	/// The full, unevaluated `fn` list: `[Symbol("fn"), List(params), body...]`.
	pub form: Rc<Vec<Value>>,
	pub captured_env: crate::environment::EnvId,
}

/// A runtime value. See the module documentation for the big picture.
#[derive(Debug, Clone)]
pub enum Value {
	Nil,
	Int(i64),
	Double(f64),
	Bool(bool),
	/// An immutable string. Paren does not distinguish between byte strings and text; this holds
	/// whatever bytes were between the quotes, decoded as UTF-8 on a best-effort basis.
	Str(String),
	/// A name. Only the parser produces these; the evaluator resolves them against the
	/// environment or the builtin table and never sees a `Symbol` flow back out of `eval`.
	Symbol(String),
	List(Vec<Value>),
	/// An opcode identifying a special form or primitive. Produced when a symbol resolves against
	/// the builtin table instead of a user binding.
	Builtin(Opcode),
	Fn(Closure),
}

impl Value {
	#[must_use]
	pub fn string(value: impl Into<String>) -> Self {
		Self::Str(value.into())
	}

	/// Coerces this value to an integer. Ints pass through; doubles truncate toward zero; bools
	/// become 0 or 1; strings parse their longest leading numeric prefix (0 if there is none);
	/// everything else is 0.
	#[must_use]
	pub fn to_int(&self) -> i64 {
		match self {
			Self::Int(n) => *n,
			Self::Double(n) => *n as i64,
			Self::Bool(b) => i64::from(*b),
			Self::Str(s) | Self::Symbol(s) => parse_int_prefix(s),
			Self::Nil | Self::List(_) | Self::Builtin(_) | Self::Fn(_) => 0,
		}
	}

	/// Coerces this value to a double. Mirrors [`Value::to_int`] but widening instead of
	/// truncating, and parsing a floating-point prefix instead of an integer one.
	#[must_use]
	pub fn to_double(&self) -> f64 {
		match self {
			Self::Int(n) => *n as f64,
			Self::Double(n) => *n,
			Self::Bool(b) => {
				if *b {
					1.0
				} else {
					0.0
				}
			}
			Self::Str(s) | Self::Symbol(s) => parse_double_prefix(s),
			Self::Nil | Self::List(_) | Self::Builtin(_) | Self::Fn(_) => 0.0,
		}
	}

	/// Renders this value the way `strcat`, `string`, and `pr`/`prn` see it: `nil` as the empty
	/// string, numbers in decimal, bools as `true`/`false`, strings and symbols verbatim, lists
	/// and closures recursively as a parenthesized, space-separated sequence, and builtins as
	/// `builtin.<opcode>`.
	#[must_use]
	pub fn to_paren_string(&self) -> String {
		match self {
			Self::Nil => String::new(),
			Self::Int(n) => n.to_string(),
			Self::Double(n) => format_double(*n),
			Self::Bool(b) => (if *b { "true" } else { "false" }).to_owned(),
			Self::Str(s) | Self::Symbol(s) => s.clone(),
			Self::List(items) => format_list(items),
			Self::Fn(closure) => format_list(&closure.form),
			Self::Builtin(opcode) => format!("builtin.{}", opcode.id()),
		}
	}

	/// The fixed type-name string for this value's tag, as returned by the `type` builtin.
	#[must_use]
	pub fn type_name(&self) -> &'static str {
		match self {
			Self::Nil => "nil",
			Self::Int(_) => "int",
			Self::Double(_) => "double",
			Self::Bool(_) => "bool",
			Self::Str(_) => "string",
			Self::Symbol(_) => "symbol",
			Self::List(_) => "list",
			Self::Builtin(_) => "builtin",
			Self::Fn(_) => "fn",
		}
	}

	/// `true` for any value whose `bool` payload is meaningful and true. Used by the evaluator
	/// wherever a special form expects a boolean condition (`if`, `when`, `while`, `&&`, `||`).
	/// Non-bool values are never truthy here; Paren conditions must genuinely be bools.
	#[must_use]
	pub fn is_truthy(&self) -> bool {
		matches!(self, Self::Bool(true))
	}

	/// Renders `"<repr> : <typename>"`, the format the REPL prints after evaluating each form.
	#[must_use]
	pub fn display_with_type(&self) -> String {
		format!("{} : {}", self.to_paren_string(), self.type_name())
	}
}

fn format_list(items: &[Value]) -> String {
	let mut out = String::from("(");
	for (i, item) in items.iter().enumerate() {
		if i > 0 {
			out.push(' ');
		}
		out.push_str(&item.to_paren_string());
	}
	out.push(')');
	out
}

/// Formats a double with up to 20 significant digits, the way the reference implementation's
/// `stringstream` with `precision(20)` would, trimming a trailing `.0` is *not* performed — `3.0`
/// prints as `3` only when the value happens to round to an integer within that precision, which
/// matches what `%.20g`-style formatting produces in practice.
fn format_double(value: f64) -> String {
	if value == value.trunc() && value.abs() < 1e18 {
		format!("{value:.0}")
	} else {
		let formatted = format!("{value:.20}");
		let trimmed = formatted.trim_end_matches('0');
		let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);
		truncate_significant_digits(trimmed)
	}
}

/// Keeps at most 20 significant digits of a formatted decimal string, which is what a 20-digit
/// precision `stringstream` would produce for non-integral doubles.
fn truncate_significant_digits(formatted: &str) -> String {
	let significant: String = formatted.chars().filter(|c| c.is_ascii_digit()).collect();
	if significant.len() <= 20 {
		return formatted.to_owned();
	}

	let mut digits_seen = 0;
	let mut out = String::new();
	for c in formatted.chars() {
		if c.is_ascii_digit() {
			if digits_seen >= 20 {
				break;
			}
			digits_seen += 1;
		}
		out.push(c);
	}
	out
}

/// Parses the longest leading (optionally signed) decimal-integer prefix of `s`, or 0 if there is
/// none. This is the `atoi`-style "non-numeric prefix yields 0" coercion from the data model.
pub(crate) fn parse_int_prefix(s: &str) -> i64 {
	let s = s.trim_start();
	let mut end = 0;
	let bytes = s.as_bytes();
	if end < bytes.len() && (bytes[end] == b'-' || bytes[end] == b'+') {
		end += 1;
	}
	let digits_start = end;
	while end < bytes.len() && bytes[end].is_ascii_digit() {
		end += 1;
	}
	if end == digits_start {
		return 0;
	}
	s[..end].parse().unwrap_or(0)
}

/// Parses the longest leading (optionally signed) floating-point prefix of `s`, or 0.0 if there is
/// none. Mirrors [`parse_int_prefix`] but also accepts a decimal point and exponent.
pub(crate) fn parse_double_prefix(s: &str) -> f64 {
	let s = s.trim_start();
	let bytes = s.as_bytes();
	let mut end = 0;
	if end < bytes.len() && (bytes[end] == b'-' || bytes[end] == b'+') {
		end += 1;
	}
	let mut saw_digit = false;
	while end < bytes.len() && bytes[end].is_ascii_digit() {
		end += 1;
		saw_digit = true;
	}
	if end < bytes.len() && bytes[end] == b'.' {
		end += 1;
		while end < bytes.len() && bytes[end].is_ascii_digit() {
			end += 1;
			saw_digit = true;
		}
	}
	if saw_digit && end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
		let mut exp_end = end + 1;
		if exp_end < bytes.len() && (bytes[exp_end] == b'-' || bytes[exp_end] == b'+') {
			exp_end += 1;
		}
		let exp_digits_start = exp_end;
		while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
			exp_end += 1;
		}
		if exp_end > exp_digits_start {
			end = exp_end;
		}
	}
	if !saw_digit {
		return 0.0;
	}
	s[..end].parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn coercion_round_trips_through_int() {
		let value = Value::Int(42);
		assert_eq!(Value::Double(value.to_double()).to_int(), 42);
	}

	#[test]
	fn string_coercion_parses_numeric_prefix() {
		assert_eq!(Value::string("123abc").to_int(), 123);
		assert_eq!(Value::string("abc").to_int(), 0);
		assert_eq!(Value::string("3.14xyz").to_double(), 3.14);
	}

	#[test]
	fn list_renders_space_separated() {
		let list = Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
		assert_eq!(list.to_paren_string(), "(1 2 3)");
	}

	#[test]
	fn bool_coercions() {
		assert_eq!(Value::Bool(true).to_paren_string(), "true");
		assert_eq!(Value::Bool(false).to_int(), 0);
		assert_eq!(Value::Bool(true).to_int(), 1);
	}

	#[test]
	fn double_formatting_drops_trailing_zeroes() {
		assert_eq!(Value::Double(2.5).to_paren_string(), "2.5");
		assert_eq!(Value::Double(3.0).to_paren_string(), "3");
	}

	#[test]
	fn display_with_type_matches_repl_format() {
		assert_eq!(Value::Int(6).display_with_type(), "6 : int");
	}
}
