//! Code to configure and run the interpreter on a source file or an inline
//! expression.

use std::fs;

use clap::Parser;

use crate::diagnostics::check_source;
use crate::execution::{EvalError, Evaluator, EvaluatorConfig, DEFAULT_STEP_LIMIT};
use crate::recursive_descent_parsing::{parse, ParseError};

/// Config for the interpreter. Instantiate via `InterpreterConfig::parse()`.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct InterpreterConfig {
    /// The input filepath to run on.
    #[arg(short, long, conflicts_with = "expr")]
    pub src_filepath: Option<String>,

    /// Program text to run instead of a file.
    #[arg(short, long)]
    pub expr: Option<String>,

    /// Maximum number of applications before evaluation is aborted.
    #[arg(long, default_value_t = DEFAULT_STEP_LIMIT)]
    pub step_limit: usize,

    /// Print the number of applications performed after the result.
    #[arg(long)]
    pub show_steps: bool,

    /// Report the first problem as an editor diagnostic instead of running.
    #[arg(long)]
    pub lint: bool,

    /// Trace every application to standard error.
    #[arg(short, long)]
    pub verbose: bool,
}

impl InterpreterConfig {
    /// The evaluator settings selected on the command line.
    pub fn evaluator_config(&self) -> EvaluatorConfig {
        return EvaluatorConfig {
            step_limit: self.step_limit,
            verbose: self.verbose,
        };
    }
}

/// Errors that may be thrown when running the interpreter.
#[derive(Debug)]
pub enum RunError {
    ConfigError(String),
    InputFileError(std::io::Error),
    ParseError(ParseError),
    EvalError(EvalError),
}

/// Display trait implementation for RunError.
impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConfigError(config_err_string) => {
                return write!(f, "Interpreter configuration error: {}", config_err_string);
            }

            Self::InputFileError(io_err) => {
                return write!(f, "Input file error: {}", io_err);
            }

            Self::ParseError(parse_error) => {
                return write!(f, "Parse error: {}", parse_error);
            }

            Self::EvalError(eval_error) => {
                return write!(f, "Evaluation error: {}", eval_error);
            }
        }
    }
}

impl std::error::Error for RunError {}

/// Type conversions for errors.
impl From<std::io::Error> for RunError {
    fn from(value: std::io::Error) -> Self {
        return Self::InputFileError(value);
    }
}

impl From<ParseError> for RunError {
    fn from(value: ParseError) -> Self {
        return Self::ParseError(value);
    }
}

impl From<EvalError> for RunError {
    fn from(value: EvalError) -> Self {
        return Self::EvalError(value);
    }
}

/// Gets the program text named by the config.
pub fn read_program(config: &InterpreterConfig) -> Result<String, RunError> {
    match (&config.src_filepath, &config.expr) {
        (Some(src_filepath), None) => {
            return Ok(fs::read_to_string(src_filepath)?);
        }

        (None, Some(expr)) => {
            return Ok(expr.clone());
        }

        _ => {
            return Err(RunError::ConfigError(String::from(
                "Exactly one of --src-filepath and --expr must be given",
            )));
        }
    }
}

/// Parses and evaluates `program_string`, returning the printed value.
pub fn run_program(program_string: &str, config: &InterpreterConfig) -> Result<String, RunError> {
    // Run parser.
    let expr = parse(program_string)?;

    if config.verbose {
        eprintln!("Parsed {}", expr);
    }

    // Evaluate in a fresh session.
    let mut evaluator = Evaluator::new(config.evaluator_config());
    let value = evaluator.evaluate(&expr)?;

    // Return the result.
    if config.show_steps {
        return Ok(format!("{}\nsteps: {}", value, evaluator.steps()));
    }

    return Ok(value.to_string());
}

/// Run the interpreter (i.e. the lexer, parser, and evaluator) given an
/// interpreter config.
pub fn run_interpreter(config: &InterpreterConfig) -> Result<String, RunError> {
    let program_string = read_program(config)?;

    if config.lint {
        return match check_source(program_string.as_str(), config.evaluator_config()) {
            Some(diagnostic) => Ok(diagnostic.to_string()),
            None => Ok(String::from("No problems found")),
        };
    }

    return run_program(program_string.as_str(), config);
}

#[cfg(test)]
mod tests {
    use super::*;

    // Builds a config for an inline expression with the given extra flags.
    fn config_for(args: &[&str]) -> InterpreterConfig {
        let mut argv = vec!["elambda"];
        argv.extend_from_slice(args);

        return InterpreterConfig::try_parse_from(argv).expect("Unable to parse arguments.");
    }

    // Test if an inline expression runs end to end.
    #[test]
    fn test_run_inline_expression() {
        let config = config_for(&["--expr", "((mul 6) 7)"]);

        assert_eq!(run_interpreter(&config).expect("run failed"), "42");
    }

    // Test if the step count is reported on request.
    #[test]
    fn test_show_steps() {
        let config = config_for(&["--expr", r"(\x.((add x) x) 4)", "--show-steps"]);

        assert_eq!(run_interpreter(&config).expect("run failed"), "8\nsteps: 3");
    }

    // Test if the step limit flag reaches the evaluator.
    #[test]
    fn test_step_limit_flag() {
        let config = config_for(&["--expr", "((add 1) 2)", "--step-limit", "1"]);

        match run_interpreter(&config) {
            Err(RunError::EvalError(eval_error)) => {
                assert_eq!(
                    eval_error.kind,
                    crate::execution::EvalErrorKind::TimeLimitExceeded(1)
                );
            }
            other => panic!("expected a time limit error, got {:?}", other),
        }
    }

    // Test if lint mode reports a diagnostic instead of failing.
    #[test]
    fn test_lint_mode() {
        let config = config_for(&["--expr", "(5 5)", "--lint"]);

        assert_eq!(
            run_interpreter(&config).expect("run failed"),
            "[0:0]-[0:5] Trying to call non-function 5\nBound values:"
        );
    }

    // Test if parse errors surface through RunError.
    #[test]
    fn test_parse_error_surfaces() {
        let config = config_for(&["--expr", "(add 2 3)"]);

        let run_error = run_interpreter(&config).expect_err("run should fail");

        assert_eq!(
            run_error.to_string(),
            "Parse error: [0:7] Expected ')', found \"3\""
        );
    }

    // Test if an overly nested program is a parse error rather than a crash.
    #[test]
    fn test_deep_nesting_surfaces() {
        let program_str = format!("{}1{}", r"(\x.x ".repeat(20_000), ")".repeat(20_000));
        let config = config_for(&["--expr", program_str.as_str()]);

        assert!(matches!(
            run_interpreter(&config),
            Err(RunError::ParseError(ParseError::NestingTooDeep { .. }))
        ));
    }

    // Test if a missing source is a configuration error.
    #[test]
    fn test_missing_source() {
        let config = config_for(&[]);

        assert!(matches!(
            run_interpreter(&config),
            Err(RunError::ConfigError(_))
        ));
    }

    // Test if a missing file is an input file error.
    #[test]
    fn test_missing_file() {
        let config = config_for(&["--src-filepath", "does/not/exist.lc"]);

        assert!(matches!(
            run_interpreter(&config),
            Err(RunError::InputFileError(_))
        ));
    }

    // Test if a program file is read and run.
    #[test]
    fn test_run_file() {
        let src_filepath = std::env::temp_dir().join(format!(
            "elambda_end_to_end_test_{}.lc",
            std::process::id()
        ));
        fs::write(&src_filepath, "(((cond ((less 1) 2))\n  \\z.7)\n  \\z.8)\n")
            .expect("Unable to write test program.");

        let config = config_for(&[
            "--src-filepath",
            src_filepath.to_str().expect("temp path is not UTF-8"),
        ]);

        assert_eq!(run_interpreter(&config).expect("run failed"), "7");

        fs::remove_file(&src_filepath).expect("Unable to remove test program.");
    }
}
