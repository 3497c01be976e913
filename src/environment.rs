//! Runtime values and the scopes that bind names to them.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use num_bigint::BigInt;

use crate::ast::Expr;
use crate::builtins::BuiltinCall;

/// The result of evaluating an expression.
#[derive(Debug, Clone)]
pub enum Value {
    Int(BigInt),
    Bool(bool),
    Closure(Rc<Closure>),
    Builtin(Rc<BuiltinCall>),
}

impl Value {
    /// Only `false` is falsy; numbers (zero included) and functions are truthy.
    pub fn is_truthy(&self) -> bool {
        return !matches!(self, Value::Bool(false));
    }

    /// Whether the value may appear in function position of an application.
    pub fn is_callable(&self) -> bool {
        return matches!(self, Value::Closure(_) | Value::Builtin(_));
    }
}

/// Integers and booleans compare by value, functions by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => {
                return a == b;
            }
            (Value::Bool(a), Value::Bool(b)) => {
                return a == b;
            }
            (Value::Closure(a), Value::Closure(b)) => {
                return Rc::ptr_eq(a, b);
            }
            (Value::Builtin(a), Value::Builtin(b)) => {
                return Rc::ptr_eq(a, b);
            }
            _ => {
                return false;
            }
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(int) => {
                return write!(f, "{}", int);
            }
            Value::Bool(boolean) => {
                return write!(f, "{}", boolean);
            }
            Value::Closure(closure) => {
                return write!(f, "{}", closure);
            }
            Value::Builtin(call) => {
                return write!(f, "{}", call);
            }
        }
    }
}

/// A lambda together with the scope it was evaluated in.
pub struct Closure {
    pub formal_param: String,
    pub fn_body: Rc<Expr>,
    pub scope: Rc<Scope>,
}

impl std::fmt::Display for Closure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "\\{}.{}", self.formal_param, self.fn_body);
    }
}

// Printing the captured scope would walk every reachable value.
impl std::fmt::Debug for Closure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "Closure({})", self);
    }
}

// The bindings a single scope contributes.
enum Frame {
    Predefined(HashMap<String, Value>),
    Param { name: String, value: Value },
}

impl Frame {
    // Moves every value out of the frame, leaving it empty.
    fn take_values(&mut self) -> Vec<Value> {
        match self {
            Frame::Predefined(bindings) => {
                return bindings.drain().map(|(_, value)| value).collect();
            }
            Frame::Param { value, .. } => {
                return vec![std::mem::replace(value, Value::Bool(false))];
            }
        }
    }
}

/// A persistent chain of bindings. The root holds the predefined names and
/// every further link binds one lambda parameter. Links are never mutated:
/// binding a parameter creates a new link that shares its parent, so a
/// closure can keep the scope it was created in by holding an `Rc`.
pub struct Scope {
    frame: Frame,
    parent: Option<Rc<Scope>>,
}

impl Scope {
    /// Creates a root scope holding the given bindings.
    pub fn root(bindings: HashMap<String, Value>) -> Rc<Scope> {
        return Rc::new(Scope {
            frame: Frame::Predefined(bindings),
            parent: None,
        });
    }

    /// Returns a new scope that binds `name` to `value` on top of `self`.
    /// The new binding is released when the returned `Rc` and every closure
    /// that captured it are dropped.
    pub fn bind(self: &Rc<Self>, name: &str, value: Value) -> Rc<Scope> {
        return Rc::new(Scope {
            frame: Frame::Param {
                name: String::from(name),
                value,
            },
            parent: Some(Rc::clone(self)),
        });
    }

    /// Looks `name` up, innermost binding first.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        let mut curr_scope = self;

        loop {
            match &curr_scope.frame {
                Frame::Param {
                    name: param_name,
                    value,
                } => {
                    if param_name == name {
                        return Some(value);
                    }
                }
                Frame::Predefined(bindings) => {
                    if let Some(value) = bindings.get(name) {
                        return Some(value);
                    }
                }
            }

            match &curr_scope.parent {
                Some(parent) => curr_scope = &**parent,
                None => return None,
            }
        }
    }

    /// Snapshot of the parameter bindings visible from this scope, innermost
    /// first. Shadowed bindings and predefined names are left out.
    pub fn local_bindings(&self) -> Vec<(String, Value)> {
        let mut seen_names: HashSet<&str> = HashSet::new();
        let mut out = Vec::new();
        let mut curr_scope = Some(self);

        while let Some(scope) = curr_scope {
            if let Frame::Param { name, value } = &scope.frame {
                if seen_names.insert(name.as_str()) {
                    out.push((name.clone(), value.clone()));
                }
            }

            curr_scope = scope.parent.as_deref();
        }

        return out;
    }
}

// Scopes hold values, values hold closures and partial built-ins, and those
// hold scopes and further values again, so the structures built by deep
// recursion can be very long. They are torn down with an explicit work list
// to keep drop off the native stack.
pub(crate) fn release(mut pending_scopes: Vec<Rc<Scope>>, mut pending_values: Vec<Value>) {
    loop {
        if let Some(value) = pending_values.pop() {
            match value {
                Value::Closure(closure) => {
                    if let Ok(closure) = Rc::try_unwrap(closure) {
                        pending_scopes.push(closure.scope);
                    }
                }
                Value::Builtin(call) => {
                    // The emptied call is then dropped with nothing left to
                    // recurse into.
                    if let Ok(mut call) = Rc::try_unwrap(call) {
                        pending_values.append(&mut call.args);
                    }
                }
                Value::Int(_) | Value::Bool(_) => {}
            }
            continue;
        }

        match pending_scopes.pop() {
            Some(scope) => {
                // Only the last owner empties the scope.
                if let Ok(mut scope) = Rc::try_unwrap(scope) {
                    pending_scopes.extend(scope.parent.take());
                    pending_values.extend(scope.frame.take_values());
                }
            }
            None => break,
        }
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        release(
            self.parent.take().into_iter().collect(),
            self.frame.take_values(),
        );
    }
}
