//! The parser: turns a flat token sequence into a tree of [`Value`]s, recursively, the same way
//! the original's position-based `parser` class does — no grammar beyond "a form is either an
//! atom or a parenthesized sequence of forms" is needed, since Paren has no operator precedence or
//! infix syntax to resolve.

use crate::value::{parse_double_prefix, parse_int_prefix, Value};

/// Parses every complete top-level form out of `tokens`, in source order. A caller normally checks
/// [`crate::lexer::Tokens::is_complete`] before calling this; passing an incomplete or malformed
/// token stream only affects how far parsing gets; it never panics.
#[must_use]
pub fn parse_all(tokens: &[String]) -> Vec<Value> {
	let mut pos = 0;
	let mut forms = Vec::new();
	while pos < tokens.len() {
		match parse_one(tokens, &mut pos) {
			Some(value) => forms.push(value),
			None => break,
		}
	}
	forms
}

/// Parses a single form starting at `*pos`, advancing `*pos` past it. Returns `None` (without
/// advancing past a stray `)`) if nothing could be parsed at the current position.
fn parse_one(tokens: &[String], pos: &mut usize) -> Option<Value> {
	let token = tokens.get(*pos)?;
	if token == ")" {
		return None;
	}
	if token == "(" {
		*pos += 1;
		let mut items = Vec::new();
		loop {
			match tokens.get(*pos) {
				None => break,
				Some(t) if t == ")" => {
					*pos += 1;
					break;
				}
				_ => match parse_one(tokens, pos) {
					Some(value) => items.push(value),
					None => break,
				},
			}
		}
		return Some(Value::List(items));
	}

	*pos += 1;
	Some(classify_atom(token))
}

/// Classifies a single non-parenthesis token into a literal or a symbol: a leading `"` marks a
/// string literal (the lexer leaves that marker in place precisely so the parser can make this
/// call). Otherwise, a token is numeric only if its first character is a digit, or `-` followed by
/// a digit; such a token is a double if it contains `.` or `e`, else an int, taking the longest
/// leading numeric prefix the same way `atoi`/`atof` do rather than requiring the whole token to
/// parse (`"5x"` is the int `5`, not the symbol `5x`). Anything else is a bare symbol.
fn classify_atom(token: &str) -> Value {
	if let Some(body) = token.strip_prefix('"') {
		return Value::string(body);
	}
	if !is_numeric_lead(token) {
		return Value::Symbol(token.to_owned());
	}
	if token.contains('.') || token.contains('e') {
		Value::Double(parse_double_prefix(token))
	} else {
		Value::Int(parse_int_prefix(token))
	}
}

/// True if `token`'s first character is a digit, or `-` followed by a digit.
fn is_numeric_lead(token: &str) -> bool {
	let mut chars = token.chars();
	match chars.next() {
		Some(c) if c.is_ascii_digit() => true,
		Some('-') => chars.next().is_some_and(|c| c.is_ascii_digit()),
		_ => false,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::lexer::tokenize;

	fn parse_source(source: &str) -> Vec<Value> {
		parse_all(&tokenize(source).tokens)
	}

	#[test]
	fn parses_nested_lists() {
		let forms = parse_source("(+ 1 (* 2 3))");
		assert_eq!(forms.len(), 1);
		match &forms[0] {
			Value::List(items) => {
				assert_eq!(items.len(), 3);
				assert!(matches!(items[0], Value::Symbol(ref s) if s == "+"));
				assert!(matches!(items[2], Value::List(_)));
			}
			_ => panic!("expected a list"),
		}
	}

	#[test]
	fn classifies_ints_doubles_strings_and_symbols() {
		assert!(matches!(classify_atom("42"), Value::Int(42)));
		assert!(matches!(classify_atom("3.5"), Value::Double(d) if (d - 3.5).abs() < f64::EPSILON));
		assert!(matches!(classify_atom("\"hi"), Value::Str(ref s) if s == "hi"));
		assert!(matches!(classify_atom("foo"), Value::Symbol(ref s) if s == "foo"));
	}

	#[test]
	fn numeric_classification_takes_the_leading_prefix() {
		assert!(matches!(classify_atom("5x"), Value::Int(5)));
		assert!(matches!(classify_atom("-3"), Value::Int(-3)));
		assert!(matches!(classify_atom("-x"), Value::Symbol(ref s) if s == "-x"));
		assert!(matches!(classify_atom("1.5e2junk"), Value::Double(d) if (d - 150.0).abs() < f64::EPSILON));
	}

	#[test]
	fn parses_multiple_top_level_forms() {
		let forms = parse_source("1 2 3");
		assert_eq!(forms.len(), 3);
	}

	#[test]
	fn stray_close_paren_stops_parsing_without_panicking() {
		let forms = parse_source(") 1");
		assert!(forms.is_empty());
	}
}
