//! The template expression language.
//!
//! Expressions appear in parameter defaults, validations, file conditions,
//! dependency parameter maps and (inside `${…}`) in file paths. The language
//! is deliberately small: literals, variables, member access, built-in string
//! methods, arithmetic, comparison, boolean logic and a conditional.
//!
//! Evaluation fails closed: an unbound name, a missing member, a type
//! mismatch or an unknown method is an error, never a silent `null`.
//!
//! ```
//! use trellis_core::domain::{VariableEnvironment, Value, expression};
//!
//! let env = VariableEnvironment::empty().with("name", "my-app");
//! assert_eq!(
//!     expression::eval("name.pascalCase() + 'Test'", &env).unwrap(),
//!     Value::from("MyAppTest")
//! );
//! assert_eq!(
//!     expression::eval_in_string("src/${name.snakeCase()}/lib.rs", &env).unwrap(),
//!     "src/my_app/lib.rs"
//! );
//! ```

mod evaluator;
mod lexer;
mod parser;

use thiserror::Error;

use super::{environment::VariableEnvironment, value::Value};
use evaluator::Evaluator;
use parser::{Expr, Parser};

/// Everything that can go wrong while parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("syntax error at offset {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("unbound variable '{name}'")]
    UnboundVariable { name: String },

    #[error("unknown member '{name}'")]
    UnknownMember { name: String },

    #[error("type mismatch: {message}")]
    TypeMismatch { message: String },

    #[error("unknown method '{method}' on {type_name}")]
    UnknownMethod {
        method: String,
        type_name: &'static str,
    },

    #[error("method '{method}' takes {expected} argument(s) but {found} were supplied")]
    ArgumentCount {
        method: String,
        expected: usize,
        found: usize,
    },

    #[error("index {index} is out of bounds for length {length}")]
    IndexOutOfBounds { index: i64, length: usize },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    Overflow,

    #[error("invalid regular expression '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },
}

impl ExpressionError {
    pub(crate) fn mismatch(message: impl Into<String>) -> Self {
        Self::TypeMismatch {
            message: message.into(),
        }
    }

    fn shifted(self, offset: usize) -> Self {
        match self {
            Self::Syntax { position, message } => Self::Syntax {
                position: position + offset,
                message,
            },
            other => other,
        }
    }
}

fn parse(expr: &str) -> Result<Expr, ExpressionError> {
    Parser::new(lexer::tokenize(expr)?).parse()
}

/// Evaluate `expr` against `env`.
pub fn eval(expr: &str, env: &VariableEnvironment) -> Result<Value, ExpressionError> {
    let ast = parse(expr)?;
    Evaluator::new(env).eval(&ast)
}

/// Evaluate `expr` and require a boolean result.
pub fn eval_bool(expr: &str, env: &VariableEnvironment) -> Result<bool, ExpressionError> {
    match eval(expr, env)? {
        Value::Bool(b) => Ok(b),
        other => Err(ExpressionError::mismatch(format!(
            "expected the expression to yield bool, got {}",
            other.type_name()
        ))),
    }
}

/// Check that `expr` parses, without evaluating it.
pub fn check_syntax(expr: &str) -> Result<(), ExpressionError> {
    parse(expr).map(|_| ())
}

/// Replace every `${expr}` in `text` with the display form of its value.
///
/// `$${` produces a literal `${`. Text outside placeholders is copied as-is.
/// Syntax error offsets are relative to the start of `text`.
pub fn eval_in_string(text: &str, env: &VariableEnvironment) -> Result<String, ExpressionError> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut offset = 0;

    while let Some(idx) = rest.find('$') {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx..];

        if tail.starts_with("$${") {
            out.push_str("${");
            rest = &tail[3..];
            offset += idx + 3;
        } else if tail.starts_with("${") {
            let start = offset + idx;
            let body = &tail[2..];
            let end = placeholder_end(body).ok_or_else(|| ExpressionError::Syntax {
                position: start,
                message: "unterminated '${' placeholder".into(),
            })?;
            let value = eval(&body[..end], env).map_err(|e| e.shifted(start + 2))?;
            out.push_str(&value.to_string());
            rest = &body[end + 1..];
            offset = start + 2 + end + 1;
        } else {
            out.push('$');
            rest = &tail[1..];
            offset += idx + 1;
        }
    }

    out.push_str(rest);
    Ok(out)
}

/// Byte index of the `}` closing a placeholder body, skipping quoted strings.
fn placeholder_end(body: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in body.char_indices() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => quote = Some(c),
                '}' => return Some(i),
                _ => {}
            },
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env() -> VariableEnvironment {
        VariableEnvironment::with_roots(
            Value::from(json!({ "isLibrary": true, "group": "org.acme" })),
            Value::from(json!({})),
        )
        .with("name", "my-app")
        .with("count", 3)
        .with("kind", "lib")
    }

    #[test]
    fn arithmetic_and_precedence() {
        assert_eq!(eval("1 + 2 * 3", &env()).unwrap(), Value::Int(7));
        assert_eq!(eval("(1 + 2) * 3", &env()).unwrap(), Value::Int(9));
        assert_eq!(eval("count % 2 == 1", &env()).unwrap(), Value::Bool(true));
        assert_eq!(eval("-count + 1", &env()).unwrap(), Value::Int(-2));
    }

    #[test]
    fn string_concatenation_requires_strings() {
        assert_eq!(
            eval("name + '-core'", &env()).unwrap(),
            Value::from("my-app-core")
        );
        assert!(matches!(
            eval("name + 1", &env()),
            Err(ExpressionError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn equality_is_structural() {
        assert_eq!(eval("kind == 'lib'", &env()).unwrap(), Value::Bool(true));
        assert_eq!(eval("count == '3'", &env()).unwrap(), Value::Bool(false));
        assert_eq!(eval("null == null", &env()).unwrap(), Value::Bool(true));
        assert_eq!(eval("kind != 'app'", &env()).unwrap(), Value::Bool(true));
    }

    #[test]
    fn member_access_on_roots() {
        assert_eq!(
            eval("project.isLibrary && kind == 'lib'", &env()).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            eval("project.group", &env()).unwrap(),
            Value::from("org.acme")
        );
        assert_eq!(
            eval("project.missing", &env()),
            Err(ExpressionError::UnknownMember {
                name: "missing".into()
            })
        );
    }

    #[test]
    fn unbound_variables_fail_closed() {
        assert_eq!(
            eval("nope == 1", &env()),
            Err(ExpressionError::UnboundVariable {
                name: "nope".into()
            })
        );
    }

    #[test]
    fn short_circuit_skips_unbound_operands() {
        assert_eq!(
            eval("false && nope", &env()).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(eval("true or nope", &env()).unwrap(), Value::Bool(true));
    }

    #[test]
    fn boolean_operators_reject_non_bools() {
        assert!(matches!(
            eval("count && true", &env()),
            Err(ExpressionError::TypeMismatch { .. })
        ));
        assert!(matches!(
            eval("!name", &env()),
            Err(ExpressionError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn conditional_expression() {
        assert_eq!(
            eval("kind == 'lib' ? 'library' : 'application'", &env()).unwrap(),
            Value::from("library")
        );
    }

    #[test]
    fn division_by_zero_and_overflow() {
        assert_eq!(eval("1 / 0", &env()), Err(ExpressionError::DivisionByZero));
        assert_eq!(eval("1 % 0", &env()), Err(ExpressionError::DivisionByZero));
        assert_eq!(
            eval("9223372036854775807 + 1", &env()),
            Err(ExpressionError::Overflow)
        );
    }

    #[test]
    fn eval_bool_requires_bool() {
        assert!(eval_bool("count > 2", &env()).unwrap());
        assert!(matches!(
            eval_bool("count", &env()),
            Err(ExpressionError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn interpolation() {
        assert_eq!(
            eval_in_string("src/${name.snakeCase()}/mod_${count}.rs", &env()).unwrap(),
            "src/my_app/mod_3.rs"
        );
        assert_eq!(eval_in_string("README.md", &env()).unwrap(), "README.md");
        assert_eq!(eval_in_string("cost: $5", &env()).unwrap(), "cost: $5");
    }

    #[test]
    fn interpolation_escape_and_braces_in_strings() {
        assert_eq!(
            eval_in_string("$${name} is ${name}", &env()).unwrap(),
            "${name} is my-app"
        );
        assert_eq!(
            eval_in_string("${kind == '}' ? 'x' : 'y'}", &env()).unwrap(),
            "y"
        );
    }

    #[test]
    fn interpolation_errors_report_absolute_offsets() {
        assert_eq!(
            eval_in_string("ab${name", &env()),
            Err(ExpressionError::Syntax {
                position: 2,
                message: "unterminated '${' placeholder".into()
            })
        );
        assert!(matches!(
            eval_in_string("ab${name +}", &env()),
            Err(ExpressionError::Syntax { position: 10, .. })
        ));
    }

    #[test]
    fn null_renders_empty_in_strings() {
        let env = env().with("suffix", Value::Null);
        assert_eq!(eval_in_string("a${suffix}b", &env).unwrap(), "ab");
    }

    #[test]
    fn check_syntax_does_not_evaluate() {
        assert!(check_syntax("unbound.member.trim()").is_ok());
        assert!(check_syntax("a ==").is_err());
    }
}
