//! Splits elambda source text into position-tagged tokens.

use lazy_static::lazy_static;
use regex::Regex;

use crate::ast::Position;

/// The different classes of tokens that compose the language.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum TokenClass {
    Lambda,
    Dot,
    OpenParen,
    CloseParen,
    Digit,
    Identifier,
    Whitespace,
    Newline,
    Error,
    EndOfInput,
}

impl std::fmt::Display for TokenClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let description = match self {
            Self::Lambda => "'\\'",
            Self::Dot => "'.'",
            Self::OpenParen => "'('",
            Self::CloseParen => "')'",
            Self::Digit => "digit",
            Self::Identifier => "name",
            Self::Whitespace => "whitespace",
            Self::Newline => "newline",
            Self::Error => "unrecognized character",
            Self::EndOfInput => "end of input",
        };

        return write!(f, "{}", description);
    }
}

/// Represents a single token of the language.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Token {
    pub token_class: TokenClass,
    pub token_text: String,
    pub position: Position,
}

impl Token {
    /// Position of the character just past the end of this token. Only
    /// meaningful for tokens that do not span a line break.
    pub fn end_position(&self) -> Position {
        return Position {
            line: self.position.line,
            column: self.position.column + self.token_text.chars().count(),
        };
    }
}

// Represents how to recognize a token class.
#[derive(Debug)]
struct TokenRule {
    token_class: TokenClass,
    regex: Regex,
}

// Regex patterns that correspond to each token class. Every pattern is
// anchored at the start of the remaining input.
lazy_static! {
    static ref TOKEN_RULES: Vec<TokenRule> = vec![
        TokenRule {
            token_class: TokenClass::Lambda,
            regex: Regex::new(r"^\\").expect("Unable to compile Lambda rule regex."),
        },
        TokenRule {
            token_class: TokenClass::Dot,
            regex: Regex::new(r"^\.").expect("Unable to compile Dot rule regex."),
        },
        TokenRule {
            token_class: TokenClass::OpenParen,
            regex: Regex::new(r"^\(").expect("Unable to compile OpenParen rule regex."),
        },
        TokenRule {
            token_class: TokenClass::CloseParen,
            regex: Regex::new(r"^\)").expect("Unable to compile CloseParen rule regex."),
        },
        TokenRule {
            token_class: TokenClass::Digit,
            regex: Regex::new(r"^[0-9]").expect("Unable to compile Digit rule regex."),
        },
        TokenRule {
            token_class: TokenClass::Identifier,
            regex: Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*")
                .expect("Unable to compile Identifier rule regex."),
        },
        TokenRule {
            token_class: TokenClass::Whitespace,
            regex: Regex::new(r"^[ \t\x0B\x0C]+").expect("Unable to compile Whitespace rule regex."),
        },
        TokenRule {
            token_class: TokenClass::Newline,
            regex: Regex::new(r"^(\r\n|\r|\n)").expect("Unable to compile Newline rule regex."),
        },
        TokenRule {
            token_class: TokenClass::Error,
            regex: Regex::new(r"(?s)^.").expect("Unable to compile Error rule regex."),
        },
    ];
}

// Gets the rule for a specific token class.
fn get_rule_for_token_class(token_class: TokenClass) -> Option<&'static TokenRule> {
    return TOKEN_RULES
        .iter()
        .find(|token_rule| token_rule.token_class == token_class);
}

// Finds the rule that matches the most characters from the start of the input
// string. Ties go to the rule listed first.
fn get_longest_matching_rule(input_str: &str) -> (&'static TokenRule, usize) {
    let mut longest_match_len: usize = 0;
    let mut longest_token_rule = get_rule_for_token_class(TokenClass::Error)
        .expect("Unable to find token rule for Error token class.");

    for token_rule in TOKEN_RULES.iter() {
        match token_rule.regex.find(input_str) {
            None => continue,
            Some(match_obj) => {
                if match_obj.len() > longest_match_len {
                    longest_match_len = match_obj.len();
                    longest_token_rule = token_rule;
                }
            }
        };
    }

    return (longest_token_rule, longest_match_len);
}

// Given a string, returns a vector of every token that composes it, ending
// with an EndOfInput token.
fn make_token_stream(program_str: &str) -> Vec<Token> {
    let mut curr_idx: usize = 0;
    let mut line: usize = 0;
    let mut column: usize = 0;
    let mut out = Vec::new();

    while curr_idx < program_str.len() {
        let (token_rule, match_len) = get_longest_matching_rule(&program_str[curr_idx..]);
        let token_text = &program_str[curr_idx..curr_idx + match_len];

        out.push(Token {
            token_class: token_rule.token_class,
            token_text: String::from(token_text),
            position: Position { line, column },
        });

        // A newline moves to the start of the next line; anything else just
        // advances the column.
        if token_rule.token_class == TokenClass::Newline {
            line += 1;
            column = 0;
        } else {
            column += token_text.chars().count();
        }

        curr_idx += match_len;
    }

    out.push(Token {
        token_class: TokenClass::EndOfInput,
        token_text: String::new(),
        position: Position { line, column },
    });

    return out;
}

/// Returns whether a token class carries no meaning for the parser.
fn is_uninteresting(token_class: TokenClass) -> bool {
    return token_class == TokenClass::Whitespace || token_class == TokenClass::Newline;
}

/// Runs the lexer over `program_str`. The returned vector always ends with an
/// `EndOfInput` token positioned just past the last character. With
/// `discard_uninteresting`, whitespace and newline tokens are dropped.
pub fn run_lexical_analysis(program_str: &str, discard_uninteresting: bool) -> Vec<Token> {
    let token_stream = make_token_stream(program_str);

    if !discard_uninteresting {
        return token_stream;
    }

    return token_stream
        .into_iter()
        .filter(|token| !is_uninteresting(token.token_class))
        .collect();
}
