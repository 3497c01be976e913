//! Data structures to represent elambda expressions, and some utility
//! functions to display and compare them.

use std::rc::Rc;

/// A 0-based line/column location in the source text. Columns count
/// characters from the start of the line.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "[{}:{}]", self.line, self.column);
    }
}

/// The source range an expression was parsed from. `end` is exclusive.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// Represents an elambda expression.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ExprNode {
    FnApp {
        function: Rc<Expr>,
        argument: Rc<Expr>,
    },
    FnDef {
        formal_param: String,
        fn_body: Rc<Expr>,
    },
    Num {
        digit: u8,
    },
    Var {
        var_name: String,
    },
}

/// An expression together with where it came from. Children are shared so
/// closures can hold on to function bodies without copying them.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Expr {
    pub node: ExprNode,
    pub span: Span,
}

impl Expr {
    pub fn new(node: ExprNode, span: Span) -> Expr {
        return Expr { node, span };
    }

    /// Returns whether two expressions have the same structure, ignoring
    /// source spans.
    pub fn same_shape(&self, other: &Expr) -> bool {
        match (&self.node, &other.node) {
            (
                ExprNode::FnApp { function, argument },
                ExprNode::FnApp {
                    function: other_function,
                    argument: other_argument,
                },
            ) => {
                return function.same_shape(other_function) && argument.same_shape(other_argument);
            }
            (
                ExprNode::FnDef {
                    formal_param,
                    fn_body,
                },
                ExprNode::FnDef {
                    formal_param: other_formal_param,
                    fn_body: other_fn_body,
                },
            ) => {
                return formal_param == other_formal_param && fn_body.same_shape(other_fn_body);
            }
            (ExprNode::Num { digit }, ExprNode::Num { digit: other_digit }) => {
                return digit == other_digit;
            }
            (ExprNode::Var { var_name }, ExprNode::Var { var_name: other_var_name }) => {
                return var_name == other_var_name;
            }
            _ => {
                return false;
            }
        }
    }
}

// Helper function to produce a string representation of an Expr.
fn expr_to_string_helper(expr: &Expr, string_so_far: &mut String) {
    match &expr.node {
        ExprNode::FnApp { function, argument } => {
            string_so_far.push('(');
            expr_to_string_helper(function, string_so_far);
            string_so_far.push(' ');
            expr_to_string_helper(argument, string_so_far);
            string_so_far.push(')');
        }
        ExprNode::FnDef {
            formal_param,
            fn_body,
        } => {
            string_so_far.push('\\');
            string_so_far.push_str(formal_param.as_str());
            string_so_far.push('.');
            expr_to_string_helper(fn_body, string_so_far);
        }
        ExprNode::Num { digit } => {
            string_so_far.push_str(digit.to_string().as_str());
        }
        ExprNode::Var { var_name } => {
            string_so_far.push_str(var_name.as_str());
        }
    };
}

/// Converts an expression to the minimal source text that parses back to it.
pub fn expr_to_string(expr: &Expr) -> String {
    let mut out_string = String::new();
    expr_to_string_helper(expr, &mut out_string);
    return out_string;
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "{}", expr_to_string(self).as_str());
    }
}
