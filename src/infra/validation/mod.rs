//! Runtime shape guards for payloads produced outside the process.
//!
//! Top-level guards are closed: required fields must be present with the
//! right JSON kind and unknown fields reject the payload. Nested analyzer
//! records are open, so only their declared fields are checked. Validated
//! payloads are then decoded into domain types; nothing is coerced.

mod rule_set;
mod solution;

pub use rule_set::{is_rule_set, parse_rule_sets, validate_rule_set, validate_rule_sets};
pub use solution::{
    is_solution_response, parse_solution_response, validate_solution_change,
    validate_solution_response,
};

use crate::domain::ShapeError;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    String,
    Number,
    Array,
    Object,
}

impl Kind {
    fn matches(self, value: &Value) -> bool {
        match self {
            Kind::String => value.is_string(),
            Kind::Number => value.is_number(),
            Kind::Array => value.is_array(),
            Kind::Object => value.is_object(),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Kind::String => "a string",
            Kind::Number => "a number",
            Kind::Array => "an array",
            Kind::Object => "an object",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Field {
    pub name: &'static str,
    pub kind: Kind,
    pub required: bool,
}

pub(crate) const fn required(name: &'static str, kind: Kind) -> Field {
    Field {
        name,
        kind,
        required: true,
    }
}

pub(crate) const fn optional(name: &'static str, kind: Kind) -> Field {
    Field {
        name,
        kind,
        required: false,
    }
}

/// Checks `value` is an object holding exactly the declared fields with the
/// declared kinds.
pub(crate) fn closed_object<'a>(
    value: &'a Value,
    fields: &[Field],
) -> Result<&'a Map<String, Value>, ShapeError> {
    let object = value.as_object().ok_or(ShapeError::NotAnObject)?;

    if let Some(extra) = object
        .keys()
        .find(|key| !fields.iter().any(|field| field.name == key.as_str()))
    {
        return Err(ShapeError::UnexpectedField(extra.clone()));
    }

    check_fields(object, fields)?;
    Ok(object)
}

/// Like [`closed_object`] but tolerates undeclared fields.
pub(crate) fn open_object<'a>(
    value: &'a Value,
    fields: &[Field],
) -> Result<&'a Map<String, Value>, ShapeError> {
    let object = value.as_object().ok_or(ShapeError::NotAnObject)?;
    check_fields(object, fields)?;
    Ok(object)
}

fn check_fields(object: &Map<String, Value>, fields: &[Field]) -> Result<(), ShapeError> {
    for field in fields {
        match object.get(field.name) {
            Some(found) if !field.kind.matches(found) => {
                return Err(ShapeError::WrongKind {
                    field: field.name.to_string(),
                    expected: field.kind.describe(),
                });
            }
            None if field.required => {
                return Err(ShapeError::MissingField(field.name.to_string()));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Validates every element of the array at `field` with `check`.
pub(crate) fn each_element(
    object: &Map<String, Value>,
    field: &str,
    check: impl Fn(&Value) -> Result<(), ShapeError>,
) -> Result<(), ShapeError> {
    let Some(items) = object.get(field).and_then(Value::as_array) else {
        return Ok(());
    };
    for (index, item) in items.iter().enumerate() {
        check(item).map_err(|source| ShapeError::InvalidElement {
            field: field.to_string(),
            index,
            source: Box::new(source),
        })?;
    }
    Ok(())
}

/// Validates every value of the map at `field` with `check`.
pub(crate) fn each_entry(
    object: &Map<String, Value>,
    field: &str,
    check: impl Fn(&Value) -> Result<(), ShapeError>,
) -> Result<(), ShapeError> {
    let Some(entries) = object.get(field).and_then(Value::as_object) else {
        return Ok(());
    };
    for (key, entry) in entries {
        check(entry).map_err(|source| ShapeError::InvalidEntry {
            field: field.to_string(),
            key: key.clone(),
            source: Box::new(source),
        })?;
    }
    Ok(())
}

pub(crate) fn string_value(value: &Value) -> Result<(), ShapeError> {
    if value.is_string() {
        Ok(())
    } else {
        Err(ShapeError::WrongKind {
            field: "element".to_string(),
            expected: Kind::String.describe(),
        })
    }
}
