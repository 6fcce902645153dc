use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::types::TestStatus;

/// Create-test form. Numeric fields come from text inputs, so both JSON
/// numbers and numeric strings are accepted; anything else reads as absent
/// and is reported by validation.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct TestCreate {
    #[serde(default, alias = "testName")]
    pub(crate) test_name: String,
    #[serde(default, alias = "classLevel")]
    pub(crate) class_level: String,
    #[serde(default)]
    pub(crate) subject: String,
    #[serde(default, deserialize_with = "loose_integer")]
    pub(crate) duration: Option<i64>,
    #[serde(default, alias = "marksPerQuestion", deserialize_with = "loose_integer")]
    pub(crate) marks_per_question: Option<i64>,
}

fn loose_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number.as_i64(),
        Some(Value::String(text)) => text.trim().parse().ok(),
        _ => None,
    })
}

#[derive(Debug, Serialize)]
pub(crate) struct TestCreatedResponse {
    pub(crate) id: String,
    pub(crate) status: TestStatus,
    pub(crate) message: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct TestStatusResponse {
    pub(crate) id: String,
    pub(crate) status: TestStatus,
    pub(crate) message: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_fields_accept_strings_and_numbers() {
        let form: TestCreate = serde_json::from_value(serde_json::json!({
            "testName": "Unit 1",
            "classLevel": "11th",
            "subject": "Physics",
            "duration": " 45 ",
            "marksPerQuestion": 2
        }))
        .expect("form");

        assert_eq!(form.duration, Some(45));
        assert_eq!(form.marks_per_question, Some(2));
    }

    #[test]
    fn malformed_numbers_read_as_absent() {
        let form: TestCreate = serde_json::from_value(serde_json::json!({
            "duration": "soon",
            "marks_per_question": 1.5
        }))
        .expect("form");

        assert_eq!(form.duration, None);
        assert_eq!(form.marks_per_question, None);
        assert!(form.test_name.is_empty());
    }
}
