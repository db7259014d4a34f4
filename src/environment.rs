//! The environment model: an arena of scopes rather than a tree of `Rc<RefCell<...>>` nodes.
//!
//! Every scope lives in a flat [`Environment`] vector and is referred to everywhere else by its
//! index, an [`EnvId`]. A scope optionally points at a parent by index; `set` walks that chain
//! looking for an existing binding to overwrite, falling back to creating a new binding in the
//! scope `set` was called on if no ancestor already owns the name. This sidesteps the aliasing
//! problems a self-referential `Rc<RefCell<Scope>>` graph would otherwise cause when closures and
//! the evaluator need to mutate scopes they don't exclusively own.

use std::collections::HashMap;

use crate::value::Value;

/// An index into an [`Environment`]'s scope arena. Indices are only ever handed out by
/// [`Environment::child`]/[`Environment::global`] and are stable for the arena's lifetime: scopes
/// are never removed, only added.
pub type EnvId = usize;

/// A single lexical scope: its own bindings plus an optional parent to search next.
#[derive(Debug)]
struct Scope {
	bindings: HashMap<String, Value>,
	parent: Option<EnvId>,
}

/// The arena of all scopes created during a single evaluation session. One `Environment` backs one
/// [`crate::facade::Interpreter`]; every `fn` closure captures an `EnvId` into this same arena.
#[derive(Debug)]
pub struct Environment {
	scopes: Vec<Scope>,
}

impl Environment {
	/// Creates a fresh arena containing a single, parentless global scope, and returns its id
	/// (always `0`).
	#[must_use]
	pub fn new() -> Self {
		Self {
			scopes: vec![Scope { bindings: HashMap::new(), parent: None }],
		}
	}

	/// The id of the root global scope. Always `0` for any `Environment` built via [`Environment::new`].
	#[must_use]
	pub const fn global(&self) -> EnvId {
		0
	}

	/// Allocates a new, empty scope whose parent is `parent`, and returns its id.
	pub fn child(&mut self, parent: EnvId) -> EnvId {
		self.scopes.push(Scope { bindings: HashMap::new(), parent: Some(parent) });
		self.scopes.len() - 1
	}

	/// Looks up `name` starting at `env` and walking up through parents. Returns `None` if no
	/// scope in the chain binds it (callers typically treat that as `Value::Nil`, per the data
	/// model's "unbound reads yield nil" rule).
	#[must_use]
	pub fn get(&self, env: EnvId, name: &str) -> Option<&Value> {
		let mut current = Some(env);
		while let Some(id) = current {
			let scope = &self.scopes[id];
			if let Some(value) = scope.bindings.get(name) {
				return Some(value);
			}
			current = scope.parent;
		}
		None
	}

	/// Binds `name` to `value` in `env` directly, without searching ancestors or shadow-walking —
	/// this is the `set` builtin's actual semantics (writes into the current scope only), as well
	/// as function parameter binding and `for`'s initial loop-variable declaration.
	pub fn bind(&mut self, env: EnvId, name: impl Into<String>, value: Value) {
		self.scopes[env].bindings.insert(name.into(), value);
	}

	/// Mutates the binding of `name` wherever it's actually owned in `env`'s ancestor chain,
	/// falling back to creating it in `env` itself if no ancestor binds it. This is the "mutable
	/// reference via `get`" operation `++`, `--`, and `for`'s step use to update a loop or counter
	/// variable in place, as distinct from [`Environment::bind`], which never searches ancestors.
	pub fn assign(&mut self, env: EnvId, name: &str, value: Value) {
		let mut current = Some(env);
		while let Some(id) = current {
			if self.scopes[id].bindings.contains_key(name) {
				self.scopes[id].bindings.insert(name.to_owned(), value);
				return;
			}
			current = self.scopes[id].parent;
		}
		self.scopes[env].bindings.insert(name.to_owned(), value);
	}

	/// All names bound directly in the global scope, for `print_symbols`/`print_functions`.
	/// Deliberately only the global scope: those two builtins only ever report top-level state.
	pub fn global_bindings(&self) -> impl Iterator<Item = (&String, &Value)> {
		self.scopes[self.global()].bindings.iter()
	}
}

impl Default for Environment {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn child_scope_sees_parent_bindings() {
		let mut env = Environment::new();
		env.bind(env.global(), "x", Value::Int(1));
		let child = env.child(env.global());
		assert!(matches!(env.get(child, "x"), Some(Value::Int(1))));
	}

	#[test]
	fn assign_mutates_in_owning_ancestor() {
		let mut env = Environment::new();
		env.bind(env.global(), "x", Value::Int(1));
		let child = env.child(env.global());
		env.assign(child, "x", Value::Int(2));
		assert!(matches!(env.get(env.global(), "x"), Some(Value::Int(2))));
		assert!(env.get(child, "x").is_some());
	}

	#[test]
	fn assign_creates_local_binding_when_unbound_anywhere() {
		let mut env = Environment::new();
		let child = env.child(env.global());
		env.assign(child, "y", Value::Int(5));
		assert!(env.get(env.global(), "y").is_none());
		assert!(matches!(env.get(child, "y"), Some(Value::Int(5))));
	}

	#[test]
	fn bind_never_touches_outer_scopes() {
		let mut env = Environment::new();
		env.bind(env.global(), "x", Value::Int(1));
		let child = env.child(env.global());
		env.bind(child, "x", Value::Int(99));
		assert!(matches!(env.get(env.global(), "x"), Some(Value::Int(1))));
		assert!(matches!(env.get(child, "x"), Some(Value::Int(99))));
	}

	#[test]
	fn unbound_name_yields_none() {
		let env = Environment::new();
		assert!(env.get(env.global(), "missing").is_none());
	}
}
