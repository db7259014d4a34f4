//! The tokenizer. This is the first step in evaluating Paren source code: it walks the raw source
//! string once, left to right, and splits it into a flat sequence of tokens. Whitespace and
//! end-of-line comments are discarded here; everything else (numeric classification, list
//! nesting, string escape interpretation) is left to the parser or left as-is in the token text.
//!
//! The tokenizer also tracks how many opening delimiters (`(` and `"`) are still unclosed. The
//! REPL uses this to decide whether a multi-line buffer is ready to be parsed and evaluated, or
//! whether it should keep reading more lines.

/// A single token produced by [`tokenize`]. String-literal tokens are distinguished from symbols
/// by a leading `"` byte that the parser strips off; this mirrors the source language's own
/// tokenizer, which stores the distinction in-band rather than as a separate token type.
pub type Token = String;

/// The result of tokenizing a source string: the flat token sequence plus the unclosed-delimiter
/// count described in the module documentation.
pub struct Tokens {
	pub tokens: Vec<Token>,
	/// Positive iff the input has an unmatched `(` or opening `"`. See [`Tokens::is_complete`].
	pub unclosed: i64,
}

impl Tokens {
	/// A source buffer is complete (ready to parse) iff it has no more open delimiters than
	/// closed ones. This is deliberately `<= 0` rather than `== 0`: stray unmatched `)` or `"`
	/// don't make a buffer incomplete, they just leave it for the parser to reject or ignore.
	#[must_use]
	pub fn is_complete(&self) -> bool {
		self.unclosed <= 0
	}
}

/// Tokenizes a Paren source string.
///
/// Whitespace (space, tab, CR, LF) separates tokens and is dropped. `;` begins an end-of-line
/// comment that runs through the next LF, inclusive of neither the `;` nor anything tokenized from
/// it. `"` opens a string literal that runs until the next unescaped `"`; inside it, `\r`, `\n` and
/// `\t` are translated to their control-character equivalents and any other `\x` collapses to the
/// literal character `x`. `(` and `)` are always their own single-character tokens. Any other run
/// of characters accumulates into one token, to be classified later by the parser.
#[must_use]
pub fn tokenize(source: &str) -> Tokens {
	let chars: Vec<char> = source.chars().collect();
	let mut tokens = Vec::new();
	let mut accumulator = String::new();
	let mut unclosed: i64 = 0;
	let mut pos = 0;

	fn emit(accumulator: &mut String, tokens: &mut Vec<Token>) {
		if !accumulator.is_empty() {
			tokens.push(std::mem::take(accumulator));
		}
	}

	while pos < chars.len() {
		let c = chars[pos];
		match c {
			' ' | '\t' | '\r' | '\n' => {
				emit(&mut accumulator, &mut tokens);
				pos += 1;
			}
			';' => {
				emit(&mut accumulator, &mut tokens);
				while pos < chars.len() && chars[pos] != '\n' {
					pos += 1;
				}
			}
			'"' => {
				unclosed += 1;
				emit(&mut accumulator, &mut tokens);
				accumulator.push('"');
				pos += 1;
				while pos < chars.len() {
					match chars[pos] {
						'"' => {
							unclosed -= 1;
							pos += 1;
							break;
						}
						'\\' if pos + 1 < chars.len() => {
							let escaped = match chars[pos + 1] {
								'r' => '\r',
								'n' => '\n',
								't' => '\t',
								other => other,
							};
							accumulator.push(escaped);
							pos += 2;
						}
						other => {
							accumulator.push(other);
							pos += 1;
						}
					}
				}
				emit(&mut accumulator, &mut tokens);
			}
			'(' => {
				unclosed += 1;
				emit(&mut accumulator, &mut tokens);
				tokens.push("(".to_owned());
				pos += 1;
			}
			')' => {
				unclosed -= 1;
				emit(&mut accumulator, &mut tokens);
				tokens.push(")".to_owned());
				pos += 1;
			}
			other => {
				accumulator.push(other);
				pos += 1;
			}
		}
	}
	emit(&mut accumulator, &mut tokens);

	Tokens { tokens, unclosed }
}

#[cfg(test)]
mod tests {
	use super::tokenize;

	#[test]
	fn splits_on_whitespace_and_parens() {
		let result = tokenize("(+ 1 2)");
		assert_eq!(result.tokens, vec!["(", "+", "1", "2", ")"]);
		assert!(result.is_complete());
	}

	#[test]
	fn tracks_unclosed_parens() {
		let result = tokenize("(+ 1 (* 2 3)");
		assert_eq!(result.unclosed, 1);
		assert!(!result.is_complete());
	}

	#[test]
	fn strips_line_comments() {
		let result = tokenize("1 ; this is a comment\n2");
		assert_eq!(result.tokens, vec!["1", "2"]);
	}

	#[test]
	fn strings_keep_a_leading_quote_marker() {
		let result = tokenize(r#"(pr "hi\nthere")"#);
		assert_eq!(result.tokens[2], "\"hi\nthere");
	}

	#[test]
	fn unterminated_string_stays_unclosed() {
		let result = tokenize("\"abc");
		assert_eq!(result.unclosed, 1);
		assert!(!result.is_complete());
	}

	#[test]
	fn unknown_escape_falls_back_to_literal_character() {
		let result = tokenize(r#""a\qb""#);
		assert_eq!(result.tokens[0], "\"aqb");
	}
}
