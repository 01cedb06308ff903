//! Fills a template's parameters into the variable environment.
//!
//! Parameters are handled in declaration order. For each one:
//!
//! 1. Already bound (external `-p` value, dependency parameter map or an
//!    enclosing template): coerce to the parameter's kind and keep it.
//! 2. Otherwise compute the default against the environment built so far.
//! 3. Interactive: prompt until a valid answer is given.
//!    Non-interactive: use the default, fail if required, or leave unset.

use tracing::{debug, instrument, warn};

use crate::{
    application::{
        ApplicationError,
        ports::{PromptRequest, Prompter},
    },
    domain::{
        DomainError, Parameter, ParameterKind, Template, Value, VariableEnvironment, expression,
    },
    error::TrellisResult,
};

/// Name the candidate value is bound to inside validation expressions.
pub const CANDIDATE: &str = "it";

pub struct ParameterResolver<'a> {
    prompter: &'a dyn Prompter,
}

enum Answer {
    Accepted(Value),
    Absent,
    Retry(String),
}

impl<'a> ParameterResolver<'a> {
    pub fn new(prompter: &'a dyn Prompter) -> Self {
        Self { prompter }
    }

    /// Resolve every parameter of `template`, returning the extended environment.
    #[instrument(skip_all, fields(template = %template.name()))]
    pub fn resolve(
        &self,
        template: &Template,
        mut env: VariableEnvironment,
    ) -> TrellisResult<VariableEnvironment> {
        let interactive = self.prompter.is_interactive();

        for parameter in template.config().parameters() {
            if let Some(bound) = env.get(&parameter.id) {
                let value = coerce(template, parameter, bound.clone())?;
                debug!(parameter = %parameter.id, "Using supplied value");
                env = env.with(parameter.id.clone(), value);
                continue;
            }

            let default = self.default_value(template, parameter, &env)?;

            let resolved = if interactive {
                self.ask(template, parameter, default, &env)?
            } else {
                self.unattended(template, parameter, default, &env)?
            };

            match resolved {
                Some(value) => {
                    debug!(parameter = %parameter.id, value = %value, "Parameter resolved");
                    env = env.with(parameter.id.clone(), value);
                }
                None => debug!(parameter = %parameter.id, "Optional parameter left unset"),
            }
        }

        Ok(env)
    }

    fn default_value(
        &self,
        template: &Template,
        parameter: &Parameter,
        env: &VariableEnvironment,
    ) -> TrellisResult<Option<Value>> {
        let Some(expr) = parameter.default.as_deref() else {
            return Ok(None);
        };
        let value = expression::eval(expr, env).map_err(|source| ApplicationError::Expression {
            template: template.name().to_string(),
            expression: expr.to_string(),
            source,
        })?;
        if value.is_null() {
            return Ok(None);
        }
        coerce(template, parameter, value).map(Some)
    }

    fn unattended(
        &self,
        template: &Template,
        parameter: &Parameter,
        default: Option<Value>,
        env: &VariableEnvironment,
    ) -> TrellisResult<Option<Value>> {
        match default {
            Some(value) => {
                if let Some(reason) = self.validate(template, parameter, &value, env)? {
                    return Err(ApplicationError::InvalidParameterValue {
                        template: template.name().to_string(),
                        parameter: parameter.id.clone(),
                        reason,
                    }
                    .into());
                }
                Ok(Some(value))
            }
            None if parameter.required => Err(ApplicationError::MissingParameter {
                template: template.name().to_string(),
                parameter: parameter.id.clone(),
            }
            .into()),
            None => Ok(None),
        }
    }

    fn ask(
        &self,
        template: &Template,
        parameter: &Parameter,
        default: Option<Value>,
        env: &VariableEnvironment,
    ) -> TrellisResult<Option<Value>> {
        let request = PromptRequest {
            label: parameter.display_name.clone(),
            help: parameter.help.clone(),
            default: default.as_ref().map(Value::to_string),
            choices: parameter.kind.allowed_values().to_vec(),
            required: parameter.required,
        };

        loop {
            let input = self.prompter.prompt(&request)?;
            match self.interpret(template, parameter, &input, default.as_ref(), env)? {
                Answer::Accepted(value) => return Ok(Some(value)),
                Answer::Absent => return Ok(None),
                Answer::Retry(reason) => {
                    warn!(parameter = %parameter.id, "{reason}");
                }
            }
        }
    }

    fn interpret(
        &self,
        template: &Template,
        parameter: &Parameter,
        input: &str,
        default: Option<&Value>,
        env: &VariableEnvironment,
    ) -> TrellisResult<Answer> {
        let candidate = if input.trim().is_empty() {
            match default {
                Some(value) => value.clone(),
                None if parameter.required => {
                    return Ok(Answer::Retry(format!("'{}' is required", parameter.id)));
                }
                None => return Ok(Answer::Absent),
            }
        } else {
            let raw = match parameter.kind {
                ParameterKind::String => input.to_string(),
                _ => input.trim().to_string(),
            };
            // Enum membership is checked here, before any validation expression.
            match parameter.coerce(Value::Str(raw)) {
                Ok(value) => value,
                Err(DomainError::InvalidParameterValue { reason, .. }) => {
                    return Ok(Answer::Retry(reason));
                }
                Err(other) => return Err(other.into()),
            }
        };

        Ok(match self.validate(template, parameter, &candidate, env)? {
            Some(reason) => Answer::Retry(reason),
            None => Answer::Accepted(candidate),
        })
    }

    /// Run the validation expression. `Some(reason)` when it rejects `candidate`.
    fn validate(
        &self,
        template: &Template,
        parameter: &Parameter,
        candidate: &Value,
        env: &VariableEnvironment,
    ) -> TrellisResult<Option<String>> {
        let Some(rule) = parameter.validation.as_deref() else {
            return Ok(None);
        };
        let scope = env.clone().with(CANDIDATE, candidate.clone());
        let accepted =
            expression::eval_bool(rule, &scope).map_err(|source| ApplicationError::Expression {
                template: template.name().to_string(),
                expression: rule.to_string(),
                source,
            })?;

        Ok((!accepted).then(|| format!("'{candidate}' does not satisfy `{rule}`")))
    }
}

fn coerce(template: &Template, parameter: &Parameter, value: Value) -> TrellisResult<Value> {
    parameter.coerce(value).map_err(|e| match e {
        DomainError::InvalidParameterValue { parameter, reason } => {
            ApplicationError::InvalidParameterValue {
                template: template.name().to_string(),
                parameter,
                reason,
            }
            .into()
        }
        other => other.into(),
    })
}
