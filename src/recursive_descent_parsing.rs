//! Recursive descent parser that builds an `Expr` tree from elambda source
//! text.

use std::fmt::Display;
use std::rc::Rc;

use crate::ast::{Expr, ExprNode, Position, Span};
use crate::lexical_analysis::{run_lexical_analysis, Token, TokenClass};

/// How many applications and lambdas an expression may be nested inside.
/// The parser recurses once per level.
pub const MAX_NESTING_DEPTH: usize = 500;

/// Represents a parsing error. Every variant knows where in the source it
/// happened.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ParseError {
    UnexpectedEndOfInput {
        position: Position,
    },
    UnexpectedToken {
        expected_token_class: TokenClass,
        found_token_string: String,
        position: Position,
    },
    UnrecognizedCharacter {
        found_token_string: String,
        position: Position,
    },
    TrailingInput {
        found_token_string: String,
        position: Position,
    },
    NestingTooDeep {
        position: Position,
    },
}

impl ParseError {
    /// Where the offending character (or the end of input) is.
    pub fn position(&self) -> Position {
        match self {
            Self::UnexpectedEndOfInput { position }
            | Self::UnexpectedToken { position, .. }
            | Self::UnrecognizedCharacter { position, .. }
            | Self::TrailingInput { position, .. }
            | Self::NestingTooDeep { position } => {
                return *position;
            }
        }
    }

    /// The error text without its position prefix.
    pub fn message(&self) -> String {
        match self {
            Self::UnexpectedEndOfInput { .. } => {
                return String::from("Unexpected end of input");
            }
            Self::UnexpectedToken {
                expected_token_class,
                found_token_string,
                ..
            } => {
                return format!(
                    "Expected {}, found {:?}",
                    expected_token_class, found_token_string
                );
            }
            Self::UnrecognizedCharacter {
                found_token_string,
                ..
            } => {
                return format!("Unexpected {:?} at start of expression", found_token_string);
            }
            Self::TrailingInput {
                found_token_string,
                ..
            } => {
                return format!("Expecting end of input, found {:?}", found_token_string);
            }
            Self::NestingTooDeep { .. } => {
                return format!(
                    "Expression nested more than {} levels deep",
                    MAX_NESTING_DEPTH
                );
            }
        }
    }
}

/// Display trait implementation for ParseError.
impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "{} {}", self.position(), self.message());
    }
}

impl std::error::Error for ParseError {}

/// Tries to consume a token of the requested class at tokens[start_idx].
fn try_token_class(
    tokens: &[Token],
    start_idx: usize,
    token_class: TokenClass,
) -> Result<(&Token, usize), ParseError> {
    let token = &tokens[start_idx];

    if token.token_class == token_class {
        return Ok((token, start_idx + 1));
    }

    if token.token_class == TokenClass::EndOfInput {
        return Err(ParseError::UnexpectedEndOfInput {
            position: token.position,
        });
    }

    return Err(ParseError::UnexpectedToken {
        expected_token_class: token_class,
        found_token_string: token.token_text.clone(),
        position: token.position,
    });
}

/// Tries to parse an expression that looks like `([EXPR] [EXPR])`.
fn try_application_rule(
    tokens: &[Token],
    start_idx: usize,
    depth: usize,
) -> Result<(Rc<Expr>, usize), ParseError> {
    let (open_paren, start_idx) = try_token_class(tokens, start_idx, TokenClass::OpenParen)?;
    let (function, start_idx) = try_expr_rule(tokens, start_idx, depth + 1)?;
    let (argument, start_idx) = try_expr_rule(tokens, start_idx, depth + 1)?;
    let (close_paren, start_idx) = try_token_class(tokens, start_idx, TokenClass::CloseParen)?;

    let span = Span {
        start: open_paren.position,
        end: close_paren.end_position(),
    };

    return Ok((
        Rc::new(Expr::new(ExprNode::FnApp { function, argument }, span)),
        start_idx,
    ));
}

/// Tries to parse an expression that looks like `\[IDENTIFIER].[EXPR]`.
fn try_lambda_rule(
    tokens: &[Token],
    start_idx: usize,
    depth: usize,
) -> Result<(Rc<Expr>, usize), ParseError> {
    let (lambda_token, start_idx) = try_token_class(tokens, start_idx, TokenClass::Lambda)?;
    let (formal_param_token, start_idx) =
        try_token_class(tokens, start_idx, TokenClass::Identifier)?;
    let (_, start_idx) = try_token_class(tokens, start_idx, TokenClass::Dot)?;
    let (fn_body, start_idx) = try_expr_rule(tokens, start_idx, depth + 1)?;

    let span = Span {
        start: lambda_token.position,
        end: fn_body.span.end,
    };

    return Ok((
        Rc::new(Expr::new(
            ExprNode::FnDef {
                formal_param: formal_param_token.token_text.clone(),
                fn_body,
            },
            span,
        )),
        start_idx,
    ));
}

/// Tries to parse a single-digit number literal.
fn try_num_rule(tokens: &[Token], start_idx: usize) -> Result<(Rc<Expr>, usize), ParseError> {
    let (digit_token, start_idx) = try_token_class(tokens, start_idx, TokenClass::Digit)?;

    // The Digit rule only ever matches one ASCII digit.
    let digit = digit_token.token_text.as_bytes()[0] - b'0';

    let span = Span {
        start: digit_token.position,
        end: digit_token.end_position(),
    };

    return Ok((Rc::new(Expr::new(ExprNode::Num { digit }, span)), start_idx));
}

/// Tries to parse an expression that looks like `[IDENTIFIER]`.
fn try_var_rule(tokens: &[Token], start_idx: usize) -> Result<(Rc<Expr>, usize), ParseError> {
    let (var_token, start_idx) = try_token_class(tokens, start_idx, TokenClass::Identifier)?;

    let span = Span {
        start: var_token.position,
        end: var_token.end_position(),
    };

    return Ok((
        Rc::new(Expr::new(
            ExprNode::Var {
                var_name: var_token.token_text.clone(),
            },
            span,
        )),
        start_idx,
    ));
}

/// Parses one expression starting at tokens[start_idx], `depth` levels
/// inside enclosing applications and lambdas. The class of the first token
/// decides the production, so no backtracking is needed.
fn try_expr_rule(
    tokens: &[Token],
    start_idx: usize,
    depth: usize,
) -> Result<(Rc<Expr>, usize), ParseError> {
    let token = &tokens[start_idx];

    if depth > MAX_NESTING_DEPTH {
        return Err(ParseError::NestingTooDeep {
            position: token.position,
        });
    }

    match token.token_class {
        TokenClass::OpenParen => {
            return try_application_rule(tokens, start_idx, depth);
        }
        TokenClass::Lambda => {
            return try_lambda_rule(tokens, start_idx, depth);
        }
        TokenClass::Digit => {
            return try_num_rule(tokens, start_idx);
        }
        TokenClass::Identifier => {
            return try_var_rule(tokens, start_idx);
        }
        TokenClass::EndOfInput => {
            return Err(ParseError::UnexpectedEndOfInput {
                position: token.position,
            });
        }
        _ => {
            return Err(ParseError::UnrecognizedCharacter {
                found_token_string: token.token_text.clone(),
                position: token.position,
            });
        }
    }
}

/// Uses recursive descent to parse the given token vector into a single
/// expression. The vector must come from `run_lexical_analysis` with
/// `discard_uninteresting = true`, so it ends with an `EndOfInput` token.
pub fn parse_recursive_descent(tokens: &[Token]) -> Result<Rc<Expr>, ParseError> {
    let (expr, start_idx) = try_expr_rule(tokens, 0, 0)?;

    let next_token = &tokens[start_idx];

    if next_token.token_class != TokenClass::EndOfInput {
        return Err(ParseError::TrailingInput {
            found_token_string: next_token.token_text.clone(),
            position: next_token.position,
        });
    }

    return Ok(expr);
}

/// Parses elambda source text into an expression tree.
pub fn parse(source: &str) -> Result<Rc<Expr>, ParseError> {
    let tokens = run_lexical_analysis(source, true);
    return parse_recursive_descent(&tokens);
}
