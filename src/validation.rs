//! Tool argument validation.
//!
//! Each tool's arguments are checked against the same `schemars` schema that
//! `tools/list` advertises, compiled once with `jsonschema`. Every failed
//! keyword becomes one [`Violation`], so a caller sees all bad fields in one
//! error. Arguments that pass are then deserialized with serde, which fills
//! in defaults.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, Validator};
use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// One rejected field. `path` is empty when the problem is not tied to a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid arguments: {}", join_violations(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub fn paths(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.path.as_str()).collect()
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A generated schema `jsonschema` refused to compile
#[derive(Debug, Error)]
#[error("invalid argument schema for {type_name}: {message}")]
pub struct SchemaError {
    pub type_name: String,
    pub message: String,
}

/// Compiled argument schema for the request type `T`
pub struct ArgumentSchema<T> {
    schema: Arc<JsonObject>,
    validator: Validator,
    _request: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for ArgumentSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentSchema").field("schema", &self.schema).finish()
    }
}

impl<T> ArgumentSchema<T>
where
    T: JsonSchema + DeserializeOwned,
{
    pub fn compile() -> Result<Self, SchemaError> {
        let schema = schemars::schema_for!(T).to_value();
        let validator = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(&schema)
            .map_err(|err| SchemaError {
                type_name: T::schema_name().into_owned(),
                message: err.to_string(),
            })?;

        let schema = match schema {
            Value::Object(object) => object,
            _ => JsonObject::new(),
        };
        Ok(Self {
            schema: Arc::new(schema),
            validator,
            _request: PhantomData,
        })
    }

    /// The schema as advertised in a tool definition
    pub fn schema(&self) -> Arc<JsonObject> {
        Arc::clone(&self.schema)
    }

    /// Validates `args` and deserializes them into `T`.
    pub fn parse(&self, args: &JsonObject) -> Result<T, ValidationError> {
        let instance = Value::Object(args.clone());

        let mut violations: Vec<Violation> =
            self.validator.iter_errors(&instance).map(violation).collect();
        if !violations.is_empty() {
            violations.sort_by(|a, b| a.path.cmp(&b.path));
            return Err(ValidationError { violations });
        }

        serde_json::from_value(instance).map_err(|err| ValidationError {
            violations: vec![Violation {
                path: String::new(),
                message: err.to_string(),
            }],
        })
    }
}

/// Names the offending field: the missing property for `required`, the
/// instance location otherwise.
fn violation(error: jsonschema::ValidationError<'_>) -> Violation {
    let path = match &error.kind {
        ValidationErrorKind::Required { property } => match property {
            Value::String(name) => name.clone(),
            other => other.to_string(),
        },
        _ => {
            let pointer = error.instance_path.to_string();
            pointer.trim_start_matches('/').replace('/', ".")
        }
    };

    Violation {
        path,
        message: error.to_string(),
    }
}
