//! Evaluates parsed elambda expressions under call-by-value semantics.
//!
//! The evaluator is an explicit machine: instead of recursing on the host
//! stack, pending work is kept in a `Vec` of continuations. A program that
//! recurses without end therefore runs into the step limit rather than
//! overflowing the native stack.

use std::fmt::Display;
use std::rc::Rc;

use num_bigint::BigInt;

use crate::ast::{Expr, ExprNode, Span};
use crate::builtins::{apply_builtin, predefined_bindings, BuiltinOutcome};
use crate::environment::{Closure, Scope, Value};

/// How many applications a session may perform before it is aborted.
pub const DEFAULT_STEP_LIMIT: usize = 500_000;

/// What went wrong during evaluation.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum EvalErrorKind {
    UnboundName(String),
    NotAFunction(String),
    TimeLimitExceeded(usize),
    DivisionByZero,
    TypeMismatch {
        operation: &'static str,
        expected: &'static str,
        found: String,
    },
}

/// Display trait implementation for EvalErrorKind.
impl Display for EvalErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnboundName(var_name) => {
                return write!(f, "Unbound name '{}'", var_name);
            }
            Self::NotAFunction(found) => {
                return write!(f, "Trying to call non-function {}", found);
            }
            Self::TimeLimitExceeded(step_limit) => {
                return write!(f, "Time limit exceeded after {} applications", step_limit);
            }
            Self::DivisionByZero => {
                return write!(f, "Division by zero");
            }
            Self::TypeMismatch {
                operation,
                expected,
                found,
            } => {
                return write!(f, "'{}' expects an {}, found {}", operation, expected, found);
            }
        }
    }
}

/// An evaluation failure, with the span of the node being evaluated and the
/// parameter bindings that were visible when it happened.
#[derive(Debug, PartialEq, Clone)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub span: Span,
    pub bound: Vec<(String, Value)>,
}

impl Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "{} {}", self.span.start, self.kind);
    }
}

impl std::error::Error for EvalError {}

/// Settings for one evaluation session.
#[derive(Debug, Clone, Copy)]
pub struct EvaluatorConfig {
    pub step_limit: usize,
    pub verbose: bool,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        return EvaluatorConfig {
            step_limit: DEFAULT_STEP_LIMIT,
            verbose: false,
        };
    }
}

// Work left to do once the value currently being computed is known.
enum Continuation {
    // The function of an application is being computed; the argument comes
    // next.
    EvalArgument {
        argument: Rc<Expr>,
        scope: Rc<Scope>,
        span: Span,
    },
    // The argument is being computed; then `function` is called with it.
    Call {
        function: Value,
        scope: Rc<Scope>,
        span: Span,
    },
}

// What the machine does next.
enum State {
    Eval { expr: Rc<Expr>, scope: Rc<Scope> },
    Return(Value),
}

/// One evaluation session: the predefined scope and an application counter.
pub struct Evaluator {
    config: EvaluatorConfig,
    root_scope: Rc<Scope>,
    steps: usize,
}

impl Evaluator {
    /// Creates a session seeded with fresh predefined bindings.
    pub fn new(config: EvaluatorConfig) -> Evaluator {
        return Evaluator {
            config,
            root_scope: Scope::root(predefined_bindings()),
            steps: 0,
        };
    }

    /// Number of applications performed by the last call to `evaluate`,
    /// including the one that tripped the step limit.
    pub fn steps(&self) -> usize {
        return self.steps;
    }

    /// Reduces `expr` to a value. The step counter restarts at zero.
    pub fn evaluate(&mut self, expr: &Rc<Expr>) -> Result<Value, EvalError> {
        self.steps = 0;

        let mut continuations: Vec<Continuation> = Vec::new();
        let mut state = State::Eval {
            expr: Rc::clone(expr),
            scope: Rc::clone(&self.root_scope),
        };

        loop {
            state = match state {
                State::Eval { expr, scope } => self.eval_node(&expr, scope, &mut continuations)?,

                State::Return(value) => match continuations.pop() {
                    None => {
                        return Ok(value);
                    }

                    // The function is known; it must be callable before the
                    // argument is computed.
                    Some(Continuation::EvalArgument {
                        argument,
                        scope,
                        span,
                    }) => {
                        if !value.is_callable() {
                            return Err(make_error(
                                EvalErrorKind::NotAFunction(value.to_string()),
                                span,
                                &scope,
                            ));
                        }

                        continuations.push(Continuation::Call {
                            function: value,
                            scope: Rc::clone(&scope),
                            span,
                        });

                        State::Eval {
                            expr: argument,
                            scope,
                        }
                    }

                    Some(Continuation::Call {
                        function,
                        scope,
                        span,
                    }) => self.apply(function, value, span, &scope)?,
                },
            };
        }
    }

    // Takes one step on an expression node.
    fn eval_node(
        &mut self,
        expr: &Rc<Expr>,
        scope: Rc<Scope>,
        continuations: &mut Vec<Continuation>,
    ) -> Result<State, EvalError> {
        match &expr.node {
            ExprNode::Num { digit } => {
                return Ok(State::Return(Value::Int(BigInt::from(*digit))));
            }

            ExprNode::Var { var_name } => match scope.lookup(var_name) {
                Some(value) => {
                    return Ok(State::Return(value.clone()));
                }
                None => {
                    return Err(make_error(
                        EvalErrorKind::UnboundName(var_name.clone()),
                        expr.span,
                        &scope,
                    ));
                }
            },

            ExprNode::FnDef {
                formal_param,
                fn_body,
            } => {
                return Ok(State::Return(Value::Closure(Rc::new(Closure {
                    formal_param: formal_param.clone(),
                    fn_body: Rc::clone(fn_body),
                    scope,
                }))));
            }

            ExprNode::FnApp { function, argument } => {
                self.steps += 1;

                if self.steps > self.config.step_limit {
                    return Err(make_error(
                        EvalErrorKind::TimeLimitExceeded(self.config.step_limit),
                        expr.span,
                        &scope,
                    ));
                }

                if self.config.verbose {
                    eprintln!("Step {}: evaluating {}", self.steps, expr);
                }

                continuations.push(Continuation::EvalArgument {
                    argument: Rc::clone(argument),
                    scope: Rc::clone(&scope),
                    span: expr.span,
                });

                return Ok(State::Eval {
                    expr: Rc::clone(function),
                    scope,
                });
            }
        }
    }

    // Calls `function` with `argument`. A closure continues with its body in
    // the captured scope extended by the parameter; the extended scope lives
    // only as long as the machine state (and any closure created inside it)
    // holds it. A built-in either finishes or, for `cond`, hands back the
    // chosen branch, which is then applied to `false` without counting a step.
    fn apply(
        &mut self,
        mut function: Value,
        mut argument: Value,
        span: Span,
        scope: &Rc<Scope>,
    ) -> Result<State, EvalError> {
        loop {
            if self.config.verbose {
                eprintln!("Applying {} to {}", function, argument);
            }

            match function {
                Value::Closure(closure) => {
                    let body_scope = closure.scope.bind(&closure.formal_param, argument);

                    return Ok(State::Eval {
                        expr: Rc::clone(&closure.fn_body),
                        scope: body_scope,
                    });
                }

                Value::Builtin(call) => match apply_builtin(&call, argument) {
                    Ok(BuiltinOutcome::Value(value)) => {
                        return Ok(State::Return(value));
                    }
                    Ok(BuiltinOutcome::ApplyBranch(branch)) => {
                        function = branch;
                        argument = Value::Bool(false);
                    }
                    Err(kind) => {
                        return Err(make_error(kind, span, scope));
                    }
                },

                other => {
                    return Err(make_error(
                        EvalErrorKind::NotAFunction(other.to_string()),
                        span,
                        scope,
                    ));
                }
            }
        }
    }
}

// Attaches location and the visible bindings to an error.
fn make_error(kind: EvalErrorKind, span: Span, scope: &Scope) -> EvalError {
    return EvalError {
        kind,
        span,
        bound: scope.local_bindings(),
    };
}

/// Evaluates `expr` in a fresh session with the default configuration.
pub fn evaluate(expr: &Rc<Expr>) -> Result<Value, EvalError> {
    return Evaluator::new(EvaluatorConfig::default()).evaluate(expr);
}

#[cfg(test)]
mod tests {
    use crate::ast::Position;
    use crate::recursive_descent_parsing::parse;

    use super::*;

    // Parses and evaluates program_str in a fresh session.
    fn run(program_str: &str) -> Result<Value, EvalError> {
        let expr = parse(program_str).expect("Unable to parse program string.");
        return evaluate(&expr);
    }

    fn int(value: i64) -> Value {
        return Value::Int(BigInt::from(value));
    }

    fn error_kind(program_str: &str) -> EvalErrorKind {
        return run(program_str).expect_err("evaluation should fail").kind;
    }

    // Test if every digit evaluates to its integer.
    #[test]
    fn test_digits() {
        for digit in 0..=9 {
            assert_eq!(run(digit.to_string().as_str()), Ok(int(digit)));
        }
    }

    // Test if simple applications reduce to the expected values.
    #[test]
    fn test_simple_programs() {
        let programs_and_expected_outputs = vec![
            (r"(\x.x 5)", int(5)),
            ("((add 2) 3)", int(5)),
            ("((sub 2) 3)", int(-1)),
            ("((mul 9) 9)", int(81)),
            ("((div 9) 2)", int(4)),
            ("((less 1) 2)", Value::Bool(true)),
            ("true", Value::Bool(true)),
            (r"((\x.\y.x 1) 2)", int(1)),
            (r"((\x.\y.y 1) 2)", int(2)),
            (r"(\x.(\x.x 7) 3)", int(7)),
        ];

        for (program_str, expected_output) in programs_and_expected_outputs {
            assert_eq!(run(program_str), Ok(expected_output), "program {}", program_str);
        }
    }

    // Test if closures keep the bindings of the scope they were created in.
    #[test]
    fn test_lexical_scoping() {
        // k is built while x is bound, then called after that call returned.
        let program_str = r"(\k.((add (k 8)) (k 9)) (\x.\y.x 1))";
        assert_eq!(run(program_str), Ok(int(2)));

        // A returned adder still sees its own n after another adder exists.
        let program_str = r"(\mk.(\a.(\b.((add (a 1)) (b 1)) (mk 5)) (mk 3)) \n.\m.((add n) m))";
        assert_eq!(run(program_str), Ok(int(10)));
    }

    // Test if an unbound name fails with its span.
    #[test]
    fn test_unbound_name() {
        let eval_error = run("(\\y.\n  x 4)").expect_err("evaluation should fail");

        assert_eq!(eval_error.kind, EvalErrorKind::UnboundName(String::from("x")));
        assert_eq!(eval_error.span.start, Position { line: 1, column: 2 });
        assert_eq!(eval_error.bound, vec![(String::from("y"), int(4))]);
        assert_eq!(eval_error.to_string(), "[1:2] Unbound name 'x'");
    }

    // Test if applying a number fails before the argument is evaluated.
    #[test]
    fn test_not_a_function() {
        assert_eq!(error_kind("(5 5)"), EvalErrorKind::NotAFunction(String::from("5")));
        assert_eq!(error_kind("(5 x)"), EvalErrorKind::NotAFunction(String::from("5")));
        assert_eq!(
            error_kind("(true 1)"),
            EvalErrorKind::NotAFunction(String::from("true"))
        );
    }

    // Test if the argument is evaluated even when the body ignores it.
    #[test]
    fn test_call_by_value() {
        assert_eq!(
            error_kind(r"(\x.1 ((div 1) 0))"),
            EvalErrorKind::DivisionByZero
        );
    }

    // Test if cond picks a branch and never forces the other one.
    #[test]
    fn test_cond_is_lazy() {
        assert_eq!(run(r"(((cond true) \z.1) \z.2)"), Ok(int(1)));
        assert_eq!(run(r"(((cond false) \z.1) \z.2)"), Ok(int(2)));
        assert_eq!(run(r"(((cond true) \z.1) \z.((div 1) 0))"), Ok(int(1)));
        assert_eq!(run(r"(((cond false) \z.((div 1) 0)) \z.2)"), Ok(int(2)));
        assert_eq!(run(r"(((cond 0) \z.1) \z.2)"), Ok(int(1)));
    }

    // Test if the branch receives false as its argument.
    #[test]
    fn test_cond_branch_argument() {
        assert_eq!(run(r"(((cond true) \z.z) \z.1)"), Ok(Value::Bool(false)));
    }

    // Test if a branch that is not a function is reported.
    #[test]
    fn test_cond_branch_not_a_function() {
        assert_eq!(
            error_kind(r"(((cond true) 1) \z.2)"),
            EvalErrorKind::NotAFunction(String::from("1"))
        );
    }

    // Test if arithmetic on booleans is a type mismatch.
    #[test]
    fn test_type_mismatch() {
        assert_eq!(
            error_kind("((add true) 1)"),
            EvalErrorKind::TypeMismatch {
                operation: "add",
                expected: "integer",
                found: String::from("true"),
            }
        );
    }

    // Test if recursion through a fixed-point combinator computes factorial.
    #[test]
    fn test_recursive_factorial() {
        let program_str = r"
            ((\f.(\x.(f \v.((x x) v)) \x.(f \v.((x x) v)))
              \fact.\n.(((cond ((less n) 1)) \z.1) \z.((mul n) (fact ((sub n) 1)))))
             9)";

        let expr = parse(program_str).expect("Unable to parse program string.");
        let mut evaluator = Evaluator::new(EvaluatorConfig::default());

        assert_eq!(evaluator.evaluate(&expr), Ok(int(362_880)));
        assert!(evaluator.steps() > 0);
    }

    // Test if a result nested once per recursion level prints and drops.
    #[test]
    fn test_deeply_nested_result() {
        // Builds (cond (cond ... (cond 0))) with 30000 levels.
        let program_str = r"
            ((\f.(\x.(f \v.((x x) v)) \x.(f \v.((x x) v)))
              \g.\n.(((cond ((less n) 1)) \z.0) \z.(cond (g ((sub n) 1)))))
             ((mul ((mul 6) 5)) ((mul ((mul 8) 5)) ((mul 5) 5))))";

        let expr = parse(program_str).expect("Unable to parse program string.");
        let mut evaluator = Evaluator::new(EvaluatorConfig::default());

        let value = evaluator.evaluate(&expr).expect("evaluation failed");
        assert!(evaluator.steps() < DEFAULT_STEP_LIMIT);

        let rendered = value.to_string();
        assert_eq!(rendered.len(), 30_000 * "(cond )".len() + 1);
        assert!(rendered.starts_with("(cond (cond (cond"));
        assert!(rendered.ends_with("(cond 0)))"));

        drop(value);
    }

    // Test if self-application stops at the step limit.
    #[test]
    fn test_time_limit_exceeded() {
        let expr = parse(r"(\x.(x x) \x.(x x))").expect("Unable to parse program string.");
        let mut evaluator = Evaluator::new(EvaluatorConfig::default());

        let eval_error = evaluator.evaluate(&expr).expect_err("evaluation should fail");

        assert_eq!(
            eval_error.kind,
            EvalErrorKind::TimeLimitExceeded(DEFAULT_STEP_LIMIT)
        );
        // The application that crossed the limit is counted too.
        assert_eq!(evaluator.steps(), DEFAULT_STEP_LIMIT + 1);
    }

    // Test if a smaller configured limit is honoured exactly.
    #[test]
    fn test_configured_step_limit() {
        let expr = parse("((add 1) 2)").expect("Unable to parse program string.");

        let mut evaluator = Evaluator::new(EvaluatorConfig {
            step_limit: 2,
            verbose: false,
        });
        assert_eq!(evaluator.evaluate(&expr), Ok(int(3)));
        assert_eq!(evaluator.steps(), 2);

        let mut evaluator = Evaluator::new(EvaluatorConfig {
            step_limit: 1,
            verbose: false,
        });
        assert_eq!(
            evaluator.evaluate(&expr).map_err(|eval_error| eval_error.kind),
            Err(EvalErrorKind::TimeLimitExceeded(1))
        );
    }

    // Test if every evaluate call starts counting from zero.
    #[test]
    fn test_sessions_do_not_share_steps() {
        let expr = parse(r"(\x.x 1)").expect("Unable to parse program string.");
        let mut evaluator = Evaluator::new(EvaluatorConfig::default());

        evaluator.evaluate(&expr).expect("evaluation failed");
        evaluator.evaluate(&expr).expect("evaluation failed");

        assert_eq!(evaluator.steps(), 1);
    }

    // Test if functions are returned as values and print as source.
    #[test]
    fn test_function_values() {
        assert_eq!(
            run(r"(\x.\y.((add x) y) 1)")
                .expect("evaluation failed")
                .to_string(),
            r"\y.((add x) y)"
        );
        assert_eq!(
            run("(add 1)").expect("evaluation failed").to_string(),
            "(add 1)"
        );
    }
}
