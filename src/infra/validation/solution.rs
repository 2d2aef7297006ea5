use super::{Field, Kind, closed_object, each_element, required, string_value};
use crate::domain::{ShapeError, SolutionResponse};
use serde_json::Value;

const SOLUTION_FIELDS: &[Field] = &[
    required("encountered_errors", Kind::Array),
    required("changes", Kind::Array),
    required("scope", Kind::Object),
    required("clientId", Kind::String),
];

const CHANGE_FIELDS: &[Field] = &[
    required("diff", Kind::String),
    required("original", Kind::String),
    required("modified", Kind::String),
];

pub fn validate_solution_change(value: &Value) -> Result<(), ShapeError> {
    closed_object(value, CHANGE_FIELDS).map(|_| ())
}

pub fn validate_solution_response(value: &Value) -> Result<(), ShapeError> {
    let object = closed_object(value, SOLUTION_FIELDS)?;
    each_element(object, "encountered_errors", string_value)?;
    each_element(object, "changes", validate_solution_change)?;
    Ok(())
}

pub fn is_solution_response(value: &Value) -> bool {
    validate_solution_response(value).is_ok()
}

/// Validates, then decodes. A payload that fails validation is never decoded.
pub fn parse_solution_response(value: &Value) -> Result<SolutionResponse, ShapeError> {
    validate_solution_response(value)?;
    serde_json::from_value(value.clone()).map_err(|err| ShapeError::Decode(err.to_string()))
}
