use super::{
    Field, Kind, closed_object, each_element, each_entry, open_object, optional, required,
    string_value,
};
use crate::domain::{RuleSet, ShapeError};
use serde_json::Value;

const RULE_SET_FIELDS: &[Field] = &[
    required("name", Kind::String),
    optional("description", Kind::String),
    optional("tags", Kind::Array),
    optional("violations", Kind::Object),
    optional("insights", Kind::Object),
    optional("errors", Kind::Object),
    optional("unmatched", Kind::Array),
    optional("skipped", Kind::Array),
];

const VIOLATION_FIELDS: &[Field] = &[
    required("description", Kind::String),
    optional("category", Kind::String),
    optional("labels", Kind::Array),
    optional("incidents", Kind::Array),
    optional("links", Kind::Array),
    optional("extras", Kind::Object),
    optional("effort", Kind::Number),
];

const INCIDENT_FIELDS: &[Field] = &[
    required("uri", Kind::String),
    required("message", Kind::String),
    optional("lineNumber", Kind::Number),
    optional("codeSnip", Kind::String),
    optional("variables", Kind::Object),
];

fn validate_incident(value: &Value) -> Result<(), ShapeError> {
    open_object(value, INCIDENT_FIELDS).map(|_| ())
}

fn validate_violation(value: &Value) -> Result<(), ShapeError> {
    let object = open_object(value, VIOLATION_FIELDS)?;
    each_element(object, "labels", string_value)?;
    each_element(object, "incidents", validate_incident)
}

pub fn validate_rule_set(value: &Value) -> Result<(), ShapeError> {
    let object = closed_object(value, RULE_SET_FIELDS)?;
    each_element(object, "tags", string_value)?;
    each_element(object, "unmatched", string_value)?;
    each_element(object, "skipped", string_value)?;
    each_entry(object, "violations", validate_violation)?;
    each_entry(object, "insights", validate_violation)?;
    each_entry(object, "errors", string_value)?;
    Ok(())
}

pub fn is_rule_set(value: &Value) -> bool {
    validate_rule_set(value).is_ok()
}

/// Validates an analyzer response: an array of rule sets.
pub fn validate_rule_sets(value: &Value) -> Result<(), ShapeError> {
    let items = value.as_array().ok_or(ShapeError::NotAnArray)?;
    for (index, item) in items.iter().enumerate() {
        validate_rule_set(item).map_err(|source| ShapeError::InvalidElement {
            field: "ruleSets".to_string(),
            index,
            source: Box::new(source),
        })?;
    }
    Ok(())
}

pub fn parse_rule_sets(value: &Value) -> Result<Vec<RuleSet>, ShapeError> {
    validate_rule_sets(value)?;
    serde_json::from_value(value.clone()).map_err(|err| ShapeError::Decode(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule_set() -> Value {
        json!({
            "name": "cloud-readiness",
            "description": "Cloud readiness rules",
            "tags": ["Java EE"],
            "violations": {
                "local-storage-00001": {
                    "description": "File system usage",
                    "category": "mandatory",
                    "labels": ["konveyor.io/target=cloud-readiness"],
                    "incidents": [
                        {"uri": "file:///src/App.java", "message": "Avoid local storage", "lineNumber": 12}
                    ],
                    "effort": 1
                }
            },
            "insights": {},
            "errors": {"rule-x": "failed to evaluate"},
            "unmatched": ["rule-y"],
            "skipped": []
        })
    }

    #[test]
    fn test_full_rule_set_validates_and_decodes() {
        assert!(is_rule_set(&rule_set()));
        let parsed = parse_rule_sets(&json!([rule_set()])).unwrap();
        assert_eq!(parsed[0].incident_count(), 1);
        assert_eq!(parsed[0].errors["rule-x"], "failed to evaluate");
    }

    #[test]
    fn test_minimal_rule_set() {
        assert!(is_rule_set(&json!({"name": "empty"})));
        assert!(!is_rule_set(&json!({"description": "no name"})));
    }

    #[test]
    fn test_unknown_top_level_key_rejected() {
        let mut value = rule_set();
        value["score"] = json!(3);
        assert_eq!(
            validate_rule_set(&value).unwrap_err(),
            ShapeError::UnexpectedField("score".into())
        );
    }

    #[test]
    fn test_nested_incident_checked() {
        let mut value = rule_set();
        value["violations"]["local-storage-00001"]["incidents"][0]["uri"] = json!(7);
        let err = validate_rule_set(&value).unwrap_err();
        assert!(matches!(err, ShapeError::InvalidEntry { ref key, .. } if key == "local-storage-00001"));
    }

    #[test]
    fn test_incident_and_violation_carry_extra_keys() {
        let mut value = rule_set();
        let violation = &mut value["violations"]["local-storage-00001"];
        violation["ruleID"] = json!("local-storage-00001");
        violation["incidents"][0]["codeLocation"] = json!({"startPosition": {"line": 11}});
        violation["incidents"][0]["isDependencyIncident"] = json!(false);
        let parsed = parse_rule_sets(&json!([value])).unwrap();
        assert_eq!(parsed[0].incident_count(), 1);

        let mut value = rule_set();
        value["violations"]["local-storage-00001"]["incidents"][0]["lineNumber"] = json!("12");
        assert!(validate_rule_set(&value).is_err());
    }

    #[test]
    fn test_response_must_be_array() {
        assert_eq!(
            validate_rule_sets(&rule_set()).unwrap_err(),
            ShapeError::NotAnArray
        );
        assert!(validate_rule_sets(&json!([rule_set(), {"name": 1}])).is_err());
    }
}
