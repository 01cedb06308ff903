use regex::Regex;

use super::{
    ExpressionError,
    parser::{BinaryOp, Expr, UnaryOp},
};
use crate::domain::{casing, environment::VariableEnvironment, value::Value};

type EvalResult = Result<Value, ExpressionError>;

pub(crate) struct Evaluator<'a> {
    env: &'a VariableEnvironment,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(env: &'a VariableEnvironment) -> Self {
        Self { env }
    }

    pub(crate) fn eval(&self, expr: &Expr) -> EvalResult {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Variable(name) => {
                self.env
                    .get(name)
                    .cloned()
                    .ok_or_else(|| ExpressionError::UnboundVariable { name: name.clone() })
            }
            Expr::Member { target, name } => member(self.eval(target)?, name),
            Expr::Index { target, index } => {
                let target = self.eval(target)?;
                let index = self.eval(index)?;
                index_into(target, index)
            }
            Expr::Call {
                target,
                method,
                args,
            } => {
                let receiver = self.eval(target)?;
                let args = args
                    .iter()
                    .map(|a| self.eval(a))
                    .collect::<Result<Vec<_>, _>>()?;
                call(receiver, method, args)
            }
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                unary(*op, value)
            }
            Expr::Binary { op, left, right } => match op {
                BinaryOp::And => {
                    if !self.condition(left, "&&")? {
                        return Ok(Value::Bool(false));
                    }
                    Ok(Value::Bool(self.condition(right, "&&")?))
                }
                BinaryOp::Or => {
                    if self.condition(left, "||")? {
                        return Ok(Value::Bool(true));
                    }
                    Ok(Value::Bool(self.condition(right, "||")?))
                }
                _ => {
                    let l = self.eval(left)?;
                    let r = self.eval(right)?;
                    binary(*op, l, r)
                }
            },
            Expr::Conditional {
                condition,
                then,
                otherwise,
            } => {
                if self.condition(condition, "?:")? {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
        }
    }

    fn condition(&self, expr: &Expr, operator: &str) -> Result<bool, ExpressionError> {
        match self.eval(expr)? {
            Value::Bool(b) => Ok(b),
            other => Err(ExpressionError::mismatch(format!(
                "'{operator}' requires bool operands, got {}",
                other.type_name()
            ))),
        }
    }
}

fn member(target: Value, name: &str) -> EvalResult {
    match target {
        Value::Map(mut map) => match map.remove(name) {
            Some(value) => Ok(value),
            None if name == "length" => Ok(Value::Int(map.len() as i64)),
            None => Err(ExpressionError::UnknownMember {
                name: name.to_string(),
            }),
        },
        Value::Str(s) if name == "length" => Ok(Value::Int(s.chars().count() as i64)),
        Value::List(items) if name == "length" => Ok(Value::Int(items.len() as i64)),
        other => Err(ExpressionError::mismatch(format!(
            "cannot access member '{name}' on {}",
            other.type_name()
        ))),
    }
}

fn index_into(target: Value, index: Value) -> EvalResult {
    match (target, index) {
        (Value::List(mut items), Value::Int(i)) => {
            let length = items.len();
            usize::try_from(i)
                .ok()
                .filter(|&idx| idx < length)
                .map(|idx| items.swap_remove(idx))
                .ok_or(ExpressionError::IndexOutOfBounds { index: i, length })
        }
        (Value::Map(map), Value::Str(key)) => member(Value::Map(map), &key),
        (target, index) => Err(ExpressionError::mismatch(format!(
            "cannot index {} with {}",
            target.type_name(),
            index.type_name()
        ))),
    }
}

fn unary(op: UnaryOp, value: Value) -> EvalResult {
    match (op, value) {
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Negate, Value::Int(i)) => {
            i.checked_neg().map(Value::Int).ok_or(ExpressionError::Overflow)
        }
        (UnaryOp::Not, other) => Err(ExpressionError::mismatch(format!(
            "'!' requires a bool operand, got {}",
            other.type_name()
        ))),
        (UnaryOp::Negate, other) => Err(ExpressionError::mismatch(format!(
            "'-' requires an int operand, got {}",
            other.type_name()
        ))),
    }
}

fn binary(op: BinaryOp, left: Value, right: Value) -> EvalResult {
    use BinaryOp::*;

    match op {
        Eq => return Ok(Value::Bool(left == right)),
        Ne => return Ok(Value::Bool(left != right)),
        _ => {}
    }

    match (op, left, right) {
        (Add, Value::Str(mut a), Value::Str(b)) => {
            a.push_str(&b);
            Ok(Value::Str(a))
        }
        (Add | Sub | Mul | Div | Rem, Value::Int(a), Value::Int(b)) => {
            let result = match op {
                Add => a.checked_add(b),
                Sub => a.checked_sub(b),
                Mul => a.checked_mul(b),
                Div | Rem if b == 0 => return Err(ExpressionError::DivisionByZero),
                Div => a.checked_div(b),
                _ => a.checked_rem(b),
            };
            result.map(Value::Int).ok_or(ExpressionError::Overflow)
        }
        (Lt | Le | Gt | Ge, Value::Int(a), Value::Int(b)) => Ok(Value::Bool(compare(op, a, b))),
        (Lt | Le | Gt | Ge, Value::Str(a), Value::Str(b)) => Ok(Value::Bool(compare(op, a, b))),
        (op, left, right) => Err(ExpressionError::mismatch(format!(
            "'{}' is not defined for {} and {}",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn compare<T: Ord>(op: BinaryOp, a: T, b: T) -> bool {
    match op {
        BinaryOp::Lt => a < b,
        BinaryOp::Le => a <= b,
        BinaryOp::Gt => a > b,
        _ => a >= b,
    }
}

// ── built-in methods ─────────────────────────────────────────────────────

fn call(receiver: Value, method: &str, args: Vec<Value>) -> EvalResult {
    match receiver {
        Value::Str(s) => string_method(&s, method, args),
        Value::List(items) => list_method(items, method, args),
        Value::Map(map) if method == "length" => {
            arity(method, &args, 0)?;
            Ok(Value::Int(map.len() as i64))
        }
        other => Err(ExpressionError::UnknownMethod {
            method: method.to_string(),
            type_name: other.type_name(),
        }),
    }
}

fn string_method(s: &str, method: &str, args: Vec<Value>) -> EvalResult {
    let value = match method {
        "length" => {
            arity(method, &args, 0)?;
            Value::Int(s.chars().count() as i64)
        }
        "isEmpty" => {
            arity(method, &args, 0)?;
            Value::Bool(s.is_empty())
        }
        "isBlank" => {
            arity(method, &args, 0)?;
            Value::Bool(s.trim().is_empty())
        }
        "lowercase" => {
            arity(method, &args, 0)?;
            Value::Str(s.to_lowercase())
        }
        "uppercase" => {
            arity(method, &args, 0)?;
            Value::Str(s.to_uppercase())
        }
        "trim" => {
            arity(method, &args, 0)?;
            Value::Str(s.trim().to_string())
        }
        "snakeCase" => {
            arity(method, &args, 0)?;
            Value::Str(casing::to_snake_case(s))
        }
        "kebabCase" => {
            arity(method, &args, 0)?;
            Value::Str(casing::to_kebab_case(s))
        }
        "pascalCase" => {
            arity(method, &args, 0)?;
            Value::Str(casing::to_pascal_case(s))
        }
        "camelCase" => {
            arity(method, &args, 0)?;
            Value::Str(casing::to_camel_case(s))
        }
        "startsWith" => {
            let [prefix] = str_args::<1>(method, args)?;
            Value::Bool(s.starts_with(prefix.as_str()))
        }
        "endsWith" => {
            let [suffix] = str_args::<1>(method, args)?;
            Value::Bool(s.ends_with(suffix.as_str()))
        }
        "contains" => {
            let [needle] = str_args::<1>(method, args)?;
            Value::Bool(s.contains(needle.as_str()))
        }
        "replace" => {
            let [from, to] = str_args::<2>(method, args)?;
            Value::Str(s.replace(from.as_str(), &to))
        }
        "matches" => {
            let [pattern] = str_args::<1>(method, args)?;
            // Whole-string match.
            let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|e| {
                ExpressionError::InvalidRegex {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                }
            })?;
            Value::Bool(regex.is_match(s))
        }
        _ => {
            return Err(ExpressionError::UnknownMethod {
                method: method.to_string(),
                type_name: "string",
            });
        }
    };
    Ok(value)
}

fn list_method(items: Vec<Value>, method: &str, args: Vec<Value>) -> EvalResult {
    match method {
        "length" => {
            arity(method, &args, 0)?;
            Ok(Value::Int(items.len() as i64))
        }
        "isEmpty" => {
            arity(method, &args, 0)?;
            Ok(Value::Bool(items.is_empty()))
        }
        "contains" => {
            arity(method, &args, 1)?;
            Ok(Value::Bool(items.contains(&args[0])))
        }
        _ => Err(ExpressionError::UnknownMethod {
            method: method.to_string(),
            type_name: "list",
        }),
    }
}

fn arity(method: &str, args: &[Value], expected: usize) -> Result<(), ExpressionError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(ExpressionError::ArgumentCount {
            method: method.to_string(),
            expected,
            found: args.len(),
        })
    }
}

fn str_args<const N: usize>(method: &str, args: Vec<Value>) -> Result<[String; N], ExpressionError> {
    arity(method, &args, N)?;
    let strings = args
        .into_iter()
        .map(|arg| match arg {
            Value::Str(s) => Ok(s),
            other => Err(ExpressionError::mismatch(format!(
                "'{method}' expects string arguments, got {}",
                other.type_name()
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;
    strings.try_into().map_err(|_| ExpressionError::ArgumentCount {
        method: method.to_string(),
        expected: N,
        found: 0,
    })
}
