use crate::metadata::ScalarType;
use serde_json::{Number, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    #[error("expected an integer, got '{0}'")]
    Integer(String),

    #[error("expected a number, got '{0}'")]
    Number(String),

    #[error("expected a boolean, got '{0}'")]
    Boolean(String),
}

/// Coerce a raw parameter string into the JSON value of its declared type.
///
/// Arrays are read as comma separated items, each coerced by the item type.
pub fn coerce(raw: &str, scalar: &ScalarType) -> Result<Value, CoercionError> {
    match scalar {
        ScalarType::String => Ok(Value::String(raw.to_string())),
        ScalarType::Integer => {
            let trimmed = raw.trim();
            if let Ok(v) = trimmed.parse::<i64>() {
                Ok(Value::from(v))
            } else if let Ok(v) = trimmed.parse::<u64>() {
                Ok(Value::from(v))
            } else {
                Err(CoercionError::Integer(raw.to_string()))
            }
        }
        ScalarType::Number => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| CoercionError::Number(raw.to_string())),
        ScalarType::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(CoercionError::Boolean(raw.to_string())),
        },
        ScalarType::Array(items) => coerce_items(raw.split(','), items),
    }
}

/// Coerce each raw item by `items` and collect them into a JSON array.
/// Empty items are skipped.
pub fn coerce_items<'a>(
    raws: impl IntoIterator<Item = &'a str>,
    items: &ScalarType,
) -> Result<Value, CoercionError> {
    raws.into_iter()
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| coerce(raw, items))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integer() {
        assert_eq!(coerce("42", &ScalarType::Integer), Ok(json!(42)));
        assert_eq!(coerce(" -7 ", &ScalarType::Integer), Ok(json!(-7)));
        assert_eq!(
            coerce("18446744073709551615", &ScalarType::Integer),
            Ok(json!(u64::MAX))
        );
        assert_eq!(
            coerce("4.2", &ScalarType::Integer),
            Err(CoercionError::Integer("4.2".to_string()))
        );
        assert!(coerce("", &ScalarType::Integer).is_err());
    }

    #[test]
    fn test_number() {
        assert_eq!(coerce("1.5", &ScalarType::Number), Ok(json!(1.5)));
        assert_eq!(coerce("3", &ScalarType::Number), Ok(json!(3.0)));
        assert!(coerce("NaN", &ScalarType::Number).is_err());
        assert!(coerce("inf", &ScalarType::Number).is_err());
        assert!(coerce("abc", &ScalarType::Number).is_err());
    }

    #[test]
    fn test_boolean() {
        assert_eq!(coerce("true", &ScalarType::Boolean), Ok(json!(true)));
        assert_eq!(coerce("TRUE", &ScalarType::Boolean), Ok(json!(true)));
        assert_eq!(coerce("1", &ScalarType::Boolean), Ok(json!(true)));
        assert_eq!(coerce("false", &ScalarType::Boolean), Ok(json!(false)));
        assert_eq!(coerce("0", &ScalarType::Boolean), Ok(json!(false)));
        assert_eq!(
            coerce("yes", &ScalarType::Boolean),
            Err(CoercionError::Boolean("yes".to_string()))
        );
    }

    #[test]
    fn test_string_is_verbatim() {
        assert_eq!(coerce(" 42 ", &ScalarType::String), Ok(json!(" 42 ")));
    }

    #[test]
    fn test_array_splits_on_commas() {
        let ints = ScalarType::array(ScalarType::Integer);
        assert_eq!(coerce("1,2,3", &ints), Ok(json!([1, 2, 3])));
        assert_eq!(coerce("", &ints), Ok(json!([])));
        assert_eq!(
            coerce("1,x", &ints),
            Err(CoercionError::Integer("x".to_string()))
        );

        let strings = ScalarType::array(ScalarType::String);
        assert_eq!(coerce("a,,b", &strings), Ok(json!(["a", "b"])));
    }

    #[test]
    fn test_coerce_items_keeps_each_item_whole() {
        let value = coerce_items(["a,b", "c"], &ScalarType::String).unwrap();
        assert_eq!(value, json!(["a,b", "c"]));
    }
}
