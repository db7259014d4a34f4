//! The tree-walking evaluator. `eval` is the single entry point: literals evaluate to themselves,
//! symbols resolve against the environment chain and then the builtin table, and lists are calls —
//! the first element is evaluated to find out what's being called, and either dispatched as a
//! special form (control flow and anything else that needs its arguments *unevaluated*), a builtin
//! primitive (arguments evaluated eagerly, left to right), or a user-defined closure.
//!
//! Evaluation never fails in the `Result` sense (see the crate's error-handling notes): anything
//! that doesn't make sense — calling a non-callable value, indexing past the end of a list —
//! prints a diagnostic to stderr and the offending expression evaluates to `Value::Nil`.

use std::rc::Rc;

use crate::builtins::{Opcode, BUILTINS};
use crate::environment::{EnvId, Environment};
use crate::value::{Closure, Value};

fn diagnostic(message: &str) {
	eprintln!("{}", colored::Colorize::red(message));
}

/// Evaluates a single form in `scope`. This is the only function in the module that needs to be
/// reentrant with respect to the caller's own position in the tree; every other function here is a
/// helper called from inside this one (directly or through [`call_closure`]/[`apply_value`]).
pub fn eval(form: &Value, env: &mut Environment, scope: EnvId) -> Value {
	match form {
		Value::Nil
		| Value::Int(_)
		| Value::Double(_)
		| Value::Bool(_)
		| Value::Str(_)
		| Value::Builtin(_)
		| Value::Fn(_) => form.clone(),
		Value::Symbol(name) => resolve_symbol(name, env, scope),
		Value::List(items) => eval_list(items, env, scope),
	}
}

fn resolve_symbol(name: &str, env: &Environment, scope: EnvId) -> Value {
	if let Some(value) = env.get(scope, name) {
		return value.clone();
	}
	if let Some(op) = BUILTINS.get(name) {
		return Value::Builtin(*op);
	}
	diagnostic(&format!("unbound symbol: {name}"));
	Value::Nil
}

fn eval_list(items: &[Value], env: &mut Environment, scope: EnvId) -> Value {
	let Some(head_form) = items.first() else {
		return Value::Nil;
	};
	let head = eval(head_form, env, scope);
	let raw_args = &items[1..];
	match head {
		Value::Builtin(op) if is_special_form(op) => special_form(op, raw_args, env, scope),
		Value::Builtin(op) => {
			let args: Vec<Value> = raw_args.iter().map(|a| eval(a, env, scope)).collect();
			compute(op, args, env)
		}
		Value::Fn(closure) => {
			let args: Vec<Value> = raw_args.iter().map(|a| eval(a, env, scope)).collect();
			call_closure(&closure, args, env)
		}
		other => {
			diagnostic(&format!("cannot call a value of type {}", other.type_name()));
			Value::Nil
		}
	}
}

const fn is_special_form(op: Opcode) -> bool {
	matches!(
		op,
		Opcode::If
			| Opcode::When | Opcode::For
			| Opcode::While | Opcode::Set
			| Opcode::Eval | Opcode::Quote
			| Opcode::Fn | Opcode::Begin
			| Opcode::PlusPlus | Opcode::MinusMinus
			| Opcode::AndAnd | Opcode::OrOr
	)
}

/// Evaluates every form in `forms` in order and returns the last result, or `Nil` for an empty
/// body. Shared by `when`, `while`, `for`, `begin`, and function-call bodies — none of them
/// introduce a new binding scope themselves (that's `fn`'s job at call time).
fn eval_body(forms: &[Value], env: &mut Environment, scope: EnvId) -> Value {
	let mut result = Value::Nil;
	for form in forms {
		result = eval(form, env, scope);
	}
	result
}

fn special_form(op: Opcode, raw: &[Value], env: &mut Environment, scope: EnvId) -> Value {
	match op {
		Opcode::If => {
			let cond = raw.first().map_or(Value::Nil, |c| eval(c, env, scope));
			if cond.is_truthy() {
				raw.get(1).map_or(Value::Nil, |t| eval(t, env, scope))
			} else {
				raw.get(2).map_or(Value::Nil, |e| eval(e, env, scope))
			}
		}
		Opcode::When => {
			let cond = raw.first().map_or(Value::Nil, |c| eval(c, env, scope));
			if cond.is_truthy() {
				eval_body(&raw[1.min(raw.len())..], env, scope)
			} else {
				Value::Nil
			}
		}
		Opcode::While => {
			let Some(cond_form) = raw.first() else {
				return Value::Nil;
			};
			let body = &raw[1..];
			while eval(cond_form, env, scope).is_truthy() {
				eval_body(body, env, scope);
			}
			Value::Nil
		}
		Opcode::For => for_loop(raw, env, scope),
		Opcode::Set => {
			let Some(Value::Symbol(name)) = raw.first() else {
				diagnostic("set requires a symbol as its first argument");
				return Value::Nil;
			};
			let value = raw.get(1).map_or(Value::Nil, |v| eval(v, env, scope));
			env.bind(scope, name.clone(), value);
			Value::Nil
		}
		Opcode::Quote => raw.first().cloned().unwrap_or(Value::Nil),
		Opcode::Eval => {
			let inner = raw.first().map_or(Value::Nil, |v| eval(v, env, scope));
			eval(&inner, env, scope)
		}
		Opcode::Fn => {
			let mut full = Vec::with_capacity(raw.len() + 1);
			full.push(Value::Symbol("fn".to_owned()));
			full.extend_from_slice(raw);
			Value::Fn(Closure { form: Rc::new(full), captured_env: env.child(scope) })
		}
		Opcode::Begin => eval_body(raw, env, scope),
		Opcode::PlusPlus | Opcode::MinusMinus => {
			let Some(Value::Symbol(name)) = raw.first() else {
				diagnostic("++/-- requires a symbol argument");
				return Value::Nil;
			};
			let current = env.get(scope, name).cloned().unwrap_or(Value::Nil);
			let delta: i64 = if op == Opcode::PlusPlus { 1 } else { -1 };
			let updated = match current {
				Value::Double(d) => Value::Double(d + delta as f64),
				other => Value::Int(other.to_int() + delta),
			};
			env.assign(scope, name, updated);
			Value::Nil
		}
		Opcode::AndAnd => {
			for form in raw {
				if !eval(form, env, scope).is_truthy() {
					return Value::Bool(false);
				}
			}
			Value::Bool(true)
		}
		Opcode::OrOr => {
			for form in raw {
				if eval(form, env, scope).is_truthy() {
					return Value::Bool(true);
				}
			}
			Value::Bool(false)
		}
		_ => unreachable!("not registered as a special form"),
	}
}

/// `(for SYM START END STEP BODY...)`: binds `SYM` to the evaluated `START` directly in `scope`,
/// then repeatedly runs `BODY` while the *current* value of `SYM` (re-read every iteration, so
/// mutations the body makes are observed) is within bound of `END`, adding `STEP` after each
/// pass. Always returns `Nil`. The numeric mode (int or double) is fixed by `START`'s type for the
/// lifetime of the loop.
fn for_loop(raw: &[Value], env: &mut Environment, scope: EnvId) -> Value {
	let Some(Value::Symbol(name)) = raw.first() else {
		diagnostic("for requires a symbol as its first argument");
		return Value::Nil;
	};
	if raw.len() < 4 {
		diagnostic("for requires a symbol, start, end, and step form");
		return Value::Nil;
	}
	let start = eval(&raw[1], env, scope);
	let end = eval(&raw[2], env, scope);
	let step = eval(&raw[3], env, scope);
	let body = &raw[4..];
	env.bind(scope, name.clone(), start.clone());

	if matches!(start, Value::Double(_)) {
		let (end, step) = (end.to_double(), step.to_double());
		loop {
			let current = env.get(scope, name).map_or(0.0, Value::to_double);
			let in_bound = if step >= 0.0 { current <= end } else { current >= end };
			if !in_bound {
				break;
			}
			eval_body(body, env, scope);
			let current = env.get(scope, name).map_or(0.0, Value::to_double);
			env.assign(scope, name, Value::Double(current + step));
		}
	} else {
		let (end, step) = (end.to_int(), step.to_int());
		loop {
			let current = env.get(scope, name).map_or(0, Value::to_int);
			let in_bound = if step >= 0 { current <= end } else { current >= end };
			if !in_bound {
				break;
			}
			eval_body(body, env, scope);
			let current = env.get(scope, name).map_or(0, Value::to_int);
			env.assign(scope, name, Value::Int(current + step));
		}
	}
	Value::Nil
}

/// Applies a closure to already-evaluated arguments. Creates one fresh child scope of the
/// closure's captured environment per call — closures do not share or mutate a single captured
/// scope across invocations, each call gets its own bindings layered on top of what was captured.
/// Formals beyond the supplied arguments are left unbound rather than bound to `Nil`; reading them
/// falls through the environment chain and resolves to `Nil` the same way any other unbound symbol
/// does, per [`resolve_symbol`].
fn call_closure(closure: &Closure, args: Vec<Value>, env: &mut Environment) -> Value {
	let params: &[Value] = match closure.form.get(1) {
		Some(Value::List(params)) => params,
		_ => &[],
	};
	let body = &closure.form[2.min(closure.form.len())..];
	let call_scope = env.child(closure.captured_env);
	for (param, value) in params.iter().zip(args) {
		if let Value::Symbol(name) = param {
			env.bind(call_scope, name.clone(), value);
		}
	}
	eval_body(body, env, call_scope)
}

/// Applies a callable [`Value`] (a closure or a builtin that isn't a special form) to already
/// evaluated arguments. Used by `apply`, `map`, and `filter`, whose own arguments are runtime
/// values rather than raw source forms by the time they reach here.
fn apply_value(callee: &Value, args: Vec<Value>, env: &mut Environment) -> Value {
	match callee {
		Value::Fn(closure) => call_closure(closure, args, env),
		Value::Builtin(op) if !is_special_form(*op) => compute(*op, args, env),
		other => {
			diagnostic(&format!("cannot apply a value of type {}", other.type_name()));
			Value::Nil
		}
	}
}

fn compute(op: Opcode, args: Vec<Value>, env: &mut Environment) -> Value {
	match op {
		Opcode::Plus => arithmetic_fold(&args, 0, i64::wrapping_add, |a, b| a + b),
		Opcode::Minus => arithmetic_fold(&args, 0, i64::wrapping_sub, |a, b| a - b),
		Opcode::Mul => arithmetic_fold(&args, 1, i64::wrapping_mul, |a, b| a * b),
		Opcode::Div => arithmetic_div(&args),
		Opcode::Caret => {
			let base = args.first().map_or(0.0, Value::to_double);
			let exp = args.get(1).map_or(0.0, Value::to_double);
			Value::Double(base.powf(exp))
		}
		Opcode::Percent => arithmetic_percent(&args),
		Opcode::Sqrt => Value::Double(args.first().map_or(0.0, Value::to_double).sqrt()),
		Opcode::Floor => Value::Double(args.first().map_or(0.0, Value::to_double).floor()),
		Opcode::Ceil => Value::Double(args.first().map_or(0.0, Value::to_double).ceil()),
		Opcode::Ln => Value::Double(args.first().map_or(0.0, Value::to_double).ln()),
		Opcode::Log10 => Value::Double(args.first().map_or(0.0, Value::to_double).log10()),
		Opcode::Rand => Value::Double(rand::random::<f64>()),
		Opcode::Inc => arithmetic_step(args.first(), 1),
		Opcode::Dec => arithmetic_step(args.first(), -1),
		Opcode::EqEq => numeric_eq(&args),
		Opcode::NotEq => numeric_not_eq(&args),
		Opcode::Lt => compare(&args, |o| o == std::cmp::Ordering::Less),
		Opcode::Gt => compare(&args, |o| o == std::cmp::Ordering::Greater),
		Opcode::Lte => compare(&args, |o| o != std::cmp::Ordering::Greater),
		Opcode::Gte => compare(&args, |o| o != std::cmp::Ordering::Less),
		Opcode::Not => Value::Bool(!args.first().is_some_and(Value::is_truthy)),
		Opcode::StrLen => Value::Int(args.first().map_or(0, |v| v.to_paren_string().len() as i64)),
		Opcode::StrCat => {
			Value::Str(args.iter().map(Value::to_paren_string).collect::<Vec<_>>().concat())
		}
		Opcode::CharAt => char_at(&args),
		Opcode::Chr => {
			let byte = args.first().map_or(0, Value::to_int) as u8;
			Value::string((byte as char).to_string())
		}
		Opcode::Int => Value::Int(args.first().map_or(0, Value::to_int)),
		Opcode::Double => Value::Double(args.first().map_or(0.0, Value::to_double)),
		Opcode::StringOf => Value::Str(args.first().map_or_else(String::new, Value::to_paren_string)),
		Opcode::ReadString => read_string(&args),
		Opcode::Type => Value::Str(args.first().map_or("nil", Value::type_name).to_owned()),
		Opcode::List => Value::List(args),
		Opcode::Apply => {
			let callee = args.first().cloned().unwrap_or(Value::Nil);
			let call_args = match args.get(1) {
				Some(Value::List(items)) => items.clone(),
				_ => Vec::new(),
			};
			apply_value(&callee, call_args, env)
		}
		Opcode::Map => {
			let callee = args.first().cloned().unwrap_or(Value::Nil);
			let items = match args.get(1) {
				Some(Value::List(items)) => items.clone(),
				_ => Vec::new(),
			};
			Value::List(items.into_iter().map(|item| apply_value(&callee, vec![item], env)).collect())
		}
		Opcode::Filter => {
			let callee = args.first().cloned().unwrap_or(Value::Nil);
			let items = match args.get(1) {
				Some(Value::List(items)) => items.clone(),
				_ => Vec::new(),
			};
			Value::List(
				items
					.into_iter()
					.filter(|item| apply_value(&callee, vec![item.clone()], env).is_truthy())
					.collect(),
			)
		}
		Opcode::Range => Value::List(range(&args)),
		Opcode::Nth => {
			let index = args.first().map_or(0, Value::to_int);
			match args.get(1) {
				Some(Value::List(items)) => usize::try_from(index)
					.ok()
					.and_then(|i| items.get(i))
					.cloned()
					.unwrap_or(Value::Nil),
				_ => Value::Nil,
			}
		}
		Opcode::Length => match args.first() {
			Some(Value::List(items)) => Value::Int(items.len() as i64),
			_ => Value::Int(0),
		},
		Opcode::Pr => {
			print!("{}", args.iter().map(Value::to_paren_string).collect::<Vec<_>>().join(" "));
			Value::Nil
		}
		Opcode::Prn => {
			println!("{}", args.iter().map(Value::to_paren_string).collect::<Vec<_>>().join(" "));
			Value::Nil
		}
		Opcode::Exit => {
			let code = args.first().map_or(0, Value::to_int);
			println!();
			std::process::exit(i32::try_from(code).unwrap_or(0));
		}
		Opcode::System => system_call(&args),
		Opcode::If
		| Opcode::When
		| Opcode::For
		| Opcode::While
		| Opcode::Set
		| Opcode::Eval
		| Opcode::Quote
		| Opcode::Fn
		| Opcode::Begin
		| Opcode::PlusPlus
		| Opcode::MinusMinus
		| Opcode::AndAnd
		| Opcode::OrOr => unreachable!("special forms are dispatched before compute"),
	}
}

fn arithmetic_fold(args: &[Value], identity: i64, int_op: fn(i64, i64) -> i64, double_op: fn(f64, f64) -> f64) -> Value {
	let Some(first) = args.first() else {
		return Value::Int(identity);
	};
	if matches!(first, Value::Double(_)) {
		let acc = args[1..].iter().fold(first.to_double(), |acc, v| double_op(acc, v.to_double()));
		Value::Double(acc)
	} else {
		let acc = args[1..].iter().fold(first.to_int(), |acc, v| int_op(acc, v.to_int()));
		Value::Int(acc)
	}
}

fn arithmetic_div(args: &[Value]) -> Value {
	let Some(first) = args.first() else {
		return Value::Int(1);
	};
	if matches!(first, Value::Double(_)) {
		let acc = args[1..].iter().fold(first.to_double(), |acc, v| acc / v.to_double());
		Value::Double(acc)
	} else {
		let mut acc = first.to_int();
		for v in &args[1..] {
			let divisor = v.to_int();
			if divisor == 0 {
				diagnostic("division by zero");
				return Value::Nil;
			}
			acc /= divisor;
		}
		Value::Int(acc)
	}
}

fn arithmetic_percent(args: &[Value]) -> Value {
	let a = args.first().map_or(0, Value::to_int);
	let b = args.get(1).map_or(0, Value::to_int);
	if b == 0 {
		diagnostic("modulo by zero");
		return Value::Nil;
	}
	Value::Int(a % b)
}

fn arithmetic_step(value: Option<&Value>, delta: i64) -> Value {
	match value {
		Some(Value::Double(d)) => Value::Double(d + delta as f64),
		Some(other) => Value::Int(other.to_int() + delta),
		None => Value::Int(delta),
	}
}

/// `==`/`!=` coerce every operand to the *first* operand's numeric type (int or double, per
/// [`Value::to_int`]/[`Value::to_double`]) rather than comparing structurally — a string and an
/// int can compare equal if their numeric coercions agree. Variadic: `==` requires every operand
/// to match the first; `!=` requires every operand after the first to differ from it.
fn numeric_eq(args: &[Value]) -> Value {
	let Some(first) = args.first() else {
		return Value::Bool(true);
	};
	let all_match = if matches!(first, Value::Double(_)) {
		let target = first.to_double();
		args.iter().all(|v| v.to_double() == target)
	} else {
		let target = first.to_int();
		args.iter().all(|v| v.to_int() == target)
	};
	Value::Bool(all_match)
}

fn numeric_not_eq(args: &[Value]) -> Value {
	let Some(first) = args.first() else {
		return Value::Bool(true);
	};
	let all_differ = if matches!(first, Value::Double(_)) {
		let target = first.to_double();
		args[1..].iter().all(|v| v.to_double() != target)
	} else {
		let target = first.to_int();
		args[1..].iter().all(|v| v.to_int() != target)
	};
	Value::Bool(all_differ)
}

/// `<`/`>`/`<=`/`>=` take exactly two operands, coerced by the first operand's numeric type.
fn compare(args: &[Value], accept: fn(std::cmp::Ordering) -> bool) -> Value {
	let Some(a) = args.first() else { return Value::Bool(false) };
	let Some(b) = args.get(1) else { return Value::Bool(false) };
	let ordering = if matches!(a, Value::Double(_)) {
		a.to_double().partial_cmp(&b.to_double()).unwrap_or(std::cmp::Ordering::Equal)
	} else {
		a.to_int().cmp(&b.to_int())
	};
	Value::Bool(accept(ordering))
}

/// Indexes by byte offset, not code point — Paren strings are an immutable byte sequence, and a
/// multi-byte UTF-8 character occupies more than one such offset.
fn char_at(args: &[Value]) -> Value {
	let Some(s) = args.first().map(Value::to_paren_string) else {
		return Value::Nil;
	};
	let index = args.get(1).map_or(0, Value::to_int);
	let Ok(index) = usize::try_from(index) else {
		diagnostic("char-at index out of range");
		return Value::Nil;
	};
	match s.as_bytes().get(index) {
		Some(&byte) => Value::string(String::from_utf8_lossy(&[byte]).into_owned()),
		None => {
			diagnostic("char-at index out of range");
			Value::Nil
		}
	}
}

fn read_string(args: &[Value]) -> Value {
	let Some(source) = args.first().map(Value::to_paren_string) else {
		return Value::Nil;
	};
	let tokens = crate::lexer::tokenize(&source);
	crate::parser::parse_all(&tokens.tokens).into_iter().next().unwrap_or(Value::Nil)
}

/// `(range START END STEP)`: `[START, END]` inclusive, stepping by `STEP`, numeric mode chosen by
/// `START`'s type. Direction is governed by the sign of `STEP`; a zero step whose `START` already
/// meets `END` never terminates, the same degenerate case `for` has.
fn range(args: &[Value]) -> Vec<Value> {
	let start = args.first().cloned().unwrap_or(Value::Int(0));
	let end = args.get(1).cloned().unwrap_or(Value::Int(0));
	let step = args.get(2).cloned().unwrap_or(Value::Int(0));

	if matches!(start, Value::Double(_)) {
		let (end, step) = (end.to_double(), step.to_double());
		let mut out = Vec::new();
		let mut current = start.to_double();
		while if step >= 0.0 { current <= end } else { current >= end } {
			out.push(Value::Double(current));
			current += step;
		}
		out
	} else {
		let (end, step) = (end.to_int(), step.to_int());
		let mut out = Vec::new();
		let mut current = start.to_int();
		while if step >= 0 { current <= end } else { current >= end } {
			out.push(Value::Int(current));
			current += step;
		}
		out
	}
}

/// `system` concatenates every operand's string coercion with single spaces and hands the result
/// to the shell, returning its exit status.
fn system_call(args: &[Value]) -> Value {
	let command = args.iter().map(Value::to_paren_string).collect::<Vec<_>>().join(" ");
	let status = std::process::Command::new("sh").arg("-c").arg(&command).status();
	match status {
		Ok(status) => Value::Int(i64::from(status.code().unwrap_or(-1))),
		Err(err) => {
			diagnostic(&format!("system: {err}"));
			Value::Int(-1)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::parser::parse_all;

	fn run(source: &str) -> Value {
		let mut env = Environment::new();
		let scope = env.global();
		let tokens = crate::lexer::tokenize(source);
		let forms = parse_all(&tokens.tokens);
		eval_body(&forms, &mut env, scope)
	}

	#[test]
	fn arithmetic_respects_first_operand_type() {
		assert!(matches!(run("(+ 1 2 3)"), Value::Int(6)));
		assert!(matches!(run("(+ 1.0 2 3)"), Value::Double(d) if (d - 6.0).abs() < f64::EPSILON));
	}

	#[test]
	fn division_by_zero_reports_nil() {
		assert!(matches!(run("(/ 1 0)"), Value::Nil));
	}

	#[test]
	fn if_branches_on_truthiness() {
		assert!(matches!(run("(if (== 1 1) 10 20)"), Value::Int(10)));
		assert!(matches!(run("(if (== 1 2) 10 20)"), Value::Int(20)));
	}

	#[test]
	fn set_rebinds_across_scopes() {
		assert!(matches!(run("(begin (set x 1) (set x (+ x 1)) x)"), Value::Int(2)));
	}

	#[test]
	fn fn_application_and_missing_arguments_yield_nil_reads() {
		assert!(matches!(run("((fn (a b) (list a b)) 1)"), Value::List(ref items) if matches!(items[1], Value::Nil)));
	}

	#[test]
	fn closures_capture_their_defining_scope() {
		let source = "(begin (set make-adder (fn (n) (fn (x) (+ x n)))) (set add5 (make-adder 5)) (add5 10))";
		assert!(matches!(run(source), Value::Int(15)));
	}

	#[test]
	fn char_at_returns_a_one_character_string() {
		assert!(matches!(run(r#"(char-at "hello" 1)"#), Value::Str(ref s) if s == "e"));
	}

	#[test]
	fn map_and_filter_apply_closures_over_lists() {
		let doubled = run("(map (fn (x) (* x 2)) (list 1 2 3))");
		assert!(matches!(doubled, Value::List(ref items) if items.len() == 3));
		let evens = run("(filter (fn (x) (== (% x 2) 0)) (list 1 2 3 4))");
		if let Value::List(items) = evens {
			assert_eq!(items.len(), 2);
		} else {
			panic!("expected a list");
		}
	}

	#[test]
	fn and_or_short_circuit() {
		assert!(matches!(run("(&& false (/ 1 0))"), Value::Bool(false)));
	}

	#[test]
	fn for_loop_sums_inclusive_range_and_returns_nil() {
		assert!(matches!(
			run("(begin (set total 0) (for i 1 3 1 (set total (+ total i))) total)"),
			Value::Int(6)
		));
		assert!(matches!(run("(for i 1 0 1)"), Value::Nil));
	}

	#[test]
	fn range_is_inclusive_and_respects_step_direction() {
		assert!(matches!(run("(length (range 1 5 1))"), Value::Int(5)));
		assert!(matches!(run("(nth 1 (range 5 1 -2))"), Value::Int(3)));
	}
}
