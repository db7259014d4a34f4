//! The fixed table of builtin names, mirroring the original `builtin` enum and the `builtin_map`
//! populated by `init()`: every name the evaluator recognizes as a special form or primitive maps
//! to exactly one [`Opcode`], and that table is a `phf` perfect-hash map built at compile time, the
//! same pattern the teacher uses for its own name-to-operation tables.

/// One entry of the builtin dispatch table. Variant names match the original enum entries; the
/// evaluator's `eval` match arms are keyed on these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
	Plus,
	Minus,
	Mul,
	Div,
	Caret,
	Percent,
	Sqrt,
	Inc,
	Dec,
	PlusPlus,
	MinusMinus,
	Floor,
	Ceil,
	Ln,
	Log10,
	Rand,
	EqEq,
	NotEq,
	Lt,
	Gt,
	Lte,
	Gte,
	AndAnd,
	OrOr,
	Not,
	If,
	When,
	For,
	While,
	StrLen,
	StrCat,
	CharAt,
	Chr,
	Int,
	Double,
	StringOf,
	ReadString,
	Type,
	Set,
	Eval,
	Quote,
	Fn,
	List,
	Apply,
	Map,
	Filter,
	Range,
	Nth,
	Length,
	Begin,
	Pr,
	Prn,
	Exit,
	System,
}

impl Opcode {
	/// A stable numeric id, used only for [`crate::value::Value::to_paren_string`]'s rendering of
	/// bare builtin values (`builtin.<id>`); the original language has no literal syntax for
	/// builtins, so this is purely diagnostic.
	#[must_use]
	pub const fn id(self) -> u8 {
		self as u8
	}
}

macro_rules! builtin_table {
	($($name:literal => $variant:ident),+ $(,)?) => {
		/// Maps a builtin's textual name (as it appears in source) to its [`Opcode`]. Symbol
		/// resolution checks the current environment first and only falls back to this table, so
		/// user code is free to shadow any of these names with a local binding.
		pub static BUILTINS: phf::Map<&'static str, Opcode> = phf::phf_map! {
			$($name => Opcode::$variant),+
		};
	};
}

builtin_table! {
	"+" => Plus,
	"-" => Minus,
	"*" => Mul,
	"/" => Div,
	"^" => Caret,
	"%" => Percent,
	"sqrt" => Sqrt,
	"inc" => Inc,
	"dec" => Dec,
	"++" => PlusPlus,
	"--" => MinusMinus,
	"floor" => Floor,
	"ceil" => Ceil,
	"ln" => Ln,
	"log10" => Log10,
	"rand" => Rand,
	"==" => EqEq,
	"!=" => NotEq,
	"<" => Lt,
	">" => Gt,
	"<=" => Lte,
	">=" => Gte,
	"&&" => AndAnd,
	"||" => OrOr,
	"!" => Not,
	"if" => If,
	"when" => When,
	"for" => For,
	"while" => While,
	"strlen" => StrLen,
	"strcat" => StrCat,
	"char-at" => CharAt,
	"chr" => Chr,
	"int" => Int,
	"double" => Double,
	"string" => StringOf,
	"read-string" => ReadString,
	"type" => Type,
	"set" => Set,
	"eval" => Eval,
	"quote" => Quote,
	"fn" => Fn,
	"list" => List,
	"apply" => Apply,
	"map" => Map,
	"filter" => Filter,
	"range" => Range,
	"nth" => Nth,
	"length" => Length,
	"begin" => Begin,
	"pr" => Pr,
	"prn" => Prn,
	"exit" => Exit,
	"system" => System,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn resolves_arithmetic_and_special_forms() {
		assert_eq!(BUILTINS.get("+"), Some(&Opcode::Plus));
		assert_eq!(BUILTINS.get("if"), Some(&Opcode::If));
		assert_eq!(BUILTINS.get("fn"), Some(&Opcode::Fn));
	}

	#[test]
	fn unknown_name_is_not_a_builtin() {
		assert_eq!(BUILTINS.get("not-a-real-builtin"), None);
	}
}
