//! The names every evaluation session starts with.

use std::collections::HashMap;
use std::rc::Rc;

use num_bigint::BigInt;
use num_traits::Zero;

use crate::environment::{release, Value};
use crate::execution::EvalErrorKind;

/// Built-in curried operations.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Builtin {
    Add,
    Sub,
    Mul,
    Div,
    Less,
    Cond,
}

/// Every built-in operation, in binding order.
pub const ALL_BUILTINS: [Builtin; 6] = [
    Builtin::Add,
    Builtin::Sub,
    Builtin::Mul,
    Builtin::Div,
    Builtin::Less,
    Builtin::Cond,
];

impl Builtin {
    /// The name the operation is bound to.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Less => "less",
            Self::Cond => "cond",
        }
    }

    /// How many arguments the operation takes before it runs.
    pub fn arity(&self) -> usize {
        match self {
            Self::Cond => 3,
            _ => 2,
        }
    }
}

/// A built-in together with the arguments it has been applied to so far.
/// Always holds fewer arguments than the built-in's arity.
#[derive(Debug)]
pub struct BuiltinCall {
    pub builtin: Builtin,
    pub args: Vec<Value>,
}

// Pieces of a partial application's printed form still to be written.
enum Pending<'a> {
    Call(&'a BuiltinCall),
    Value(&'a Value),
    Text(&'static str),
}

/// Renders like the source that would produce it, e.g. `((cond true) \z.1)`.
/// Arguments can be partial applications nested as deep as the program
/// recursed, so they are written from a work list.
impl std::fmt::Display for BuiltinCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut pending: Vec<Pending> = vec![Pending::Call(self)];

        while let Some(piece) = pending.pop() {
            match piece {
                Pending::Call(call) => {
                    for _ in 0..call.args.len() {
                        f.write_str("(")?;
                    }
                    f.write_str(call.builtin.name())?;

                    for arg in call.args.iter().rev() {
                        pending.push(Pending::Text(")"));
                        pending.push(Pending::Value(arg));
                        pending.push(Pending::Text(" "));
                    }
                }
                Pending::Value(Value::Builtin(call)) => pending.push(Pending::Call(&**call)),
                Pending::Value(other) => write!(f, "{}", other)?,
                Pending::Text(text) => f.write_str(text)?,
            }
        }

        return Ok(());
    }
}

impl Drop for BuiltinCall {
    fn drop(&mut self) {
        release(Vec::new(), std::mem::take(&mut self.args));
    }
}

/// What running a saturated built-in produced.
#[derive(Debug)]
pub enum BuiltinOutcome {
    /// A finished value.
    Value(Value),
    /// `cond` picked this branch; it still has to be applied to `false`.
    ApplyBranch(Value),
}

/// Supplies one more argument to a built-in. Returns the partial application
/// while arguments are missing and runs the operation once they are all
/// present.
pub fn apply_builtin(call: &BuiltinCall, arg: Value) -> Result<BuiltinOutcome, EvalErrorKind> {
    let mut args = call.args.clone();
    args.push(arg);

    if args.len() < call.builtin.arity() {
        return Ok(BuiltinOutcome::Value(Value::Builtin(Rc::new(BuiltinCall {
            builtin: call.builtin,
            args,
        }))));
    }

    return run_builtin(call.builtin, args);
}

// Extracts an integer operand or reports which operation got the wrong type.
fn expect_int(builtin: Builtin, value: &Value) -> Result<&BigInt, EvalErrorKind> {
    match value {
        Value::Int(int) => {
            return Ok(int);
        }
        other => {
            return Err(EvalErrorKind::TypeMismatch {
                operation: builtin.name(),
                expected: "integer",
                found: other.to_string(),
            });
        }
    }
}

/// Runs a built-in on exactly `builtin.arity()` arguments.
fn run_builtin(builtin: Builtin, args: Vec<Value>) -> Result<BuiltinOutcome, EvalErrorKind> {
    let (lhs, rhs) = match (builtin, args.as_slice()) {
        (Builtin::Cond, [test, on_true, on_false]) => {
            let branch = if test.is_truthy() { on_true } else { on_false };
            return Ok(BuiltinOutcome::ApplyBranch(branch.clone()));
        }
        (_, [lhs, rhs]) => (expect_int(builtin, lhs)?, expect_int(builtin, rhs)?),
        _ => unreachable!("{} applied to {} arguments", builtin.name(), args.len()),
    };

    let result = match builtin {
        Builtin::Add => Value::Int(lhs + rhs),
        Builtin::Sub => Value::Int(lhs - rhs),
        Builtin::Mul => Value::Int(lhs * rhs),
        Builtin::Div => {
            if rhs.is_zero() {
                return Err(EvalErrorKind::DivisionByZero);
            }
            // Truncates toward zero.
            Value::Int(lhs / rhs)
        }
        Builtin::Less => Value::Bool(lhs < rhs),
        Builtin::Cond => unreachable!("cond takes three arguments"),
    };

    return Ok(BuiltinOutcome::Value(result));
}

/// Builds the bindings every fresh session starts with. Each call returns new
/// values; sessions never share them.
pub fn predefined_bindings() -> HashMap<String, Value> {
    let mut out: HashMap<String, Value> = HashMap::new();

    out.insert(String::from("true"), Value::Bool(true));
    out.insert(String::from("false"), Value::Bool(false));

    for builtin in ALL_BUILTINS {
        out.insert(
            String::from(builtin.name()),
            Value::Builtin(Rc::new(BuiltinCall {
                builtin,
                args: Vec::new(),
            })),
        );
    }

    return out;
}
