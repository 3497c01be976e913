//! This crate contains a parser and call-by-value evaluator for elambda, a
//! minimal untyped lambda calculus with integers, booleans and a handful of
//! built-in operations.
//!
//! ```
//! let expr = elambda::parse(r"(((cond ((less 1) 2)) \z.((add 2) 3)) \z.0)").unwrap();
//! assert_eq!(elambda::evaluate(&expr).unwrap().to_string(), "5");
//! ```

pub mod ast;
pub mod builtins;
pub mod diagnostics;
pub mod end_to_end;
pub mod environment;
pub mod execution;
pub mod lexical_analysis;
pub mod recursive_descent_parsing;

pub use diagnostics::{check_source, Diagnostic};
pub use environment::Value;
pub use execution::{evaluate, EvalError, EvalErrorKind, Evaluator, EvaluatorConfig};
pub use recursive_descent_parsing::{parse, ParseError};
