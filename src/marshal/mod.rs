//! Request-argument marshaling
//!
//! Turns the raw path, query, header, cookie and body values of a request
//! into the argument slots of a declared operation. Scalars are coerced by
//! their declared OpenAPI type; serde then deserializes each slot into the
//! method's typed argument.

mod coerce;
mod sources;

pub use coerce::{CoercionError, coerce, coerce_items};
pub use sources::{RequestSources, parse_cookies};

use crate::error::ApiError;
use crate::metadata::{ArgumentSpec, OperationSpec, ParameterSpec, ScalarType};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

/// Marshaled argument values, one slot per declared method argument.
#[derive(Debug, Default)]
pub struct Arguments {
    slots: Vec<(String, Option<Value>)>,
}

impl Arguments {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, name: impl Into<String>, value: Option<Value>) {
        self.slots.push((name.into(), value));
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.slots.get(index).and_then(|(_, v)| v.as_ref())
    }

    /// Move slot `index` out and deserialize it.
    ///
    /// An absent value deserializes from `null`, so `Option<T>` arguments
    /// receive `None`.
    pub fn take<T: DeserializeOwned>(&mut self, index: usize) -> Result<T, ApiError> {
        let (name, value) = match self.slots.get_mut(index) {
            Some((name, value)) => (name.clone(), value.take().unwrap_or(Value::Null)),
            None => (format!("#{}", index), Value::Null),
        };
        serde_json::from_value(value).map_err(|e| {
            ApiError::bad_request(format!("Invalid value for argument '{}'", name))
                .with_error(json!({ "name": name, "message": e.to_string() }))
        })
    }
}

fn issue(location: &str, name: &str, message: impl Into<String>) -> Value {
    json!({
        "location": location,
        "name": name,
        "message": message.into(),
    })
}

fn coerce_parameter(param: &ParameterSpec, raws: &[&str]) -> Result<Value, CoercionError> {
    match &param.scalar {
        // Repeated keys and comma separated values both contribute items.
        ScalarType::Array(items) => coerce_items(raws.iter().flat_map(|raw| raw.split(',')), items),
        scalar => coerce(raws[0], scalar),
    }
}

/// Build the argument list for `spec` from `sources`.
///
/// Every missing required value and every coercion failure is reported in
/// one 400 error rather than stopping at the first.
pub fn marshal(spec: &OperationSpec, sources: &RequestSources) -> Result<Arguments, ApiError> {
    let mut args = Arguments::with_capacity(spec.argument_count());
    let mut errors = Vec::new();

    for argument in &spec.arguments {
        match argument {
            ArgumentSpec::Parameter(param) => {
                let location = param.location.as_str();
                let raws = sources.lookup(param.location, &param.name);
                if raws.is_empty() {
                    if param.required {
                        errors.push(issue(location, &param.name, "is required"));
                    }
                    args.push(&param.name, None);
                    continue;
                }
                match coerce_parameter(param, &raws) {
                    Ok(value) => args.push(&param.name, Some(value)),
                    Err(e) => {
                        errors.push(issue(location, &param.name, e.to_string()));
                        args.push(&param.name, None);
                    }
                }
            }
            ArgumentSpec::Body(body) => {
                let raw = sources.body();
                if raw.iter().all(u8::is_ascii_whitespace) {
                    if body.required {
                        errors.push(issue("body", &body.name, "is required"));
                    }
                    args.push(&body.name, None);
                    continue;
                }
                match serde_json::from_slice::<Value>(raw) {
                    Ok(value) => args.push(&body.name, Some(value)),
                    Err(e) => {
                        errors.push(issue("body", &body.name, format!("invalid JSON: {}", e)));
                        args.push(&body.name, None);
                    }
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(args)
    } else {
        tracing::debug!(
            operation = %spec.operation_id,
            issues = errors.len(),
            "Request arguments rejected"
        );
        Err(ApiError::bad_request("Request validation failed").with_errors(errors))
    }
}
