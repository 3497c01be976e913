//! Turns the first parse or evaluation failure of a program into a ranged
//! diagnostic an editor can underline.

use crate::ast::{Position, Span};
use crate::execution::{Evaluator, EvaluatorConfig};
use crate::recursive_descent_parsing::parse;

/// A problem found in a program, with the source range to highlight.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Diagnostic {
    pub from: Position,
    pub to: Position,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "{}-{} {}", self.from, self.to, self.message);
    }
}

/// Parses and evaluates `source` in a fresh session. Returns `None` when it
/// evaluates to a value.
///
/// Parse errors cover the single offending character. Evaluation errors cover
/// the failing node and list the parameters bound at that point.
pub fn check_source(source: &str, config: EvaluatorConfig) -> Option<Diagnostic> {
    let expr = match parse(source) {
        Ok(expr) => expr,
        Err(parse_error) => {
            let position = parse_error.position();

            return Some(Diagnostic {
                from: position,
                to: Position {
                    line: position.line,
                    column: position.column + 1,
                },
                message: parse_error.message(),
            });
        }
    };

    let eval_error = match Evaluator::new(config).evaluate(&expr) {
        Ok(_) => return None,
        Err(eval_error) => eval_error,
    };

    let mut message = format!("{}\nBound values:", eval_error.kind);

    for (name, value) in eval_error.bound.iter() {
        message.push_str(format!("\n{} = {}", name, value).as_str());
    }

    let Span { start, end } = eval_error.span;

    return Some(Diagnostic {
        from: start,
        to: end,
        message,
    });
}
