use serde_json::{Map, Value};

use super::{ValidationError, ValidationResult, FIELD_EDAD, FIELD_NOMBRE, FIELD_RAZA, FIELD_TIPO};

/// Text fields that must be present and not blank on creation
pub const REQUIRED_TEXT_FIELDS: [&str; 3] = [FIELD_NOMBRE, FIELD_TIPO, FIELD_RAZA];

/// Validate the fields of a pet about to be created.
///
/// `nombre`, `tipo` and `raza` must be present and not blank. `edad` only has
/// to be present and non-null, so an age of zero is accepted.
pub fn validate_new_pet(fields: &Map<String, Value>) -> ValidationResult<()> {
    for field in REQUIRED_TEXT_FIELDS {
        validate_required(fields, field)?;
    }
    validate_present(fields, FIELD_EDAD)
}

/// Reject a body that is not a JSON object
pub fn require_object(body: Value) -> ValidationResult<Map<String, Value>> {
    match body {
        Value::Object(fields) => Ok(fields),
        _ => Err(ValidationError::InvalidFormat {
            field: "body".to_string(),
            expected: "JSON object".to_string(),
        }),
    }
}

fn validate_required(fields: &Map<String, Value>, field: &str) -> ValidationResult<()> {
    match fields.get(field) {
        Some(value) if !is_blank(value) => Ok(()),
        _ => Err(ValidationError::RequiredField {
            field: field.to_string(),
        }),
    }
}

fn validate_present(fields: &Map<String, Value>, field: &str) -> ValidationResult<()> {
    match fields.get(field) {
        Some(Value::Null) | None => Err(ValidationError::RequiredField {
            field: field.to_string(),
        }),
        Some(_) => Ok(()),
    }
}

/// Null, `false`, empty strings and zero count as blank
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Array(_) | Value::Object(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        require_object(value).unwrap()
    }

    #[test]
    fn test_validate_new_pet_valid() {
        let body = fields(json!({
            "nombre": "Rex",
            "tipo": "Perro",
            "raza": "Labrador",
            "edad": 3
        }));
        assert!(validate_new_pet(&body).is_ok());
    }

    #[test]
    fn test_validate_new_pet_zero_age() {
        let body = fields(json!({
            "nombre": "Rex",
            "tipo": "Perro",
            "raza": "Labrador",
            "edad": 0
        }));
        assert!(validate_new_pet(&body).is_ok());
    }

    #[test]
    fn test_validate_new_pet_missing_edad() {
        let body = fields(json!({
            "nombre": "Rex",
            "tipo": "Perro",
            "raza": "Labrador"
        }));
        assert_eq!(
            validate_new_pet(&body),
            Err(ValidationError::RequiredField {
                field: "edad".to_string()
            })
        );
    }

    #[test]
    fn test_validate_new_pet_null_edad() {
        let body = fields(json!({
            "nombre": "Rex",
            "tipo": "Perro",
            "raza": "Labrador",
            "edad": null
        }));
        assert!(validate_new_pet(&body).is_err());
    }

    #[test]
    fn test_validate_new_pet_blank_text() {
        for blank in [json!(""), json!(null), json!(false), json!(0)] {
            let body = fields(json!({
                "nombre": blank,
                "tipo": "Perro",
                "raza": "Labrador",
                "edad": 1
            }));
            assert_eq!(
                validate_new_pet(&body),
                Err(ValidationError::RequiredField {
                    field: "nombre".to_string()
                })
            );
        }
    }

    #[test]
    fn test_validate_new_pet_reports_first_missing() {
        let body = fields(json!({ "nombre": "Rex", "edad": 1 }));
        assert_eq!(
            validate_new_pet(&body),
            Err(ValidationError::RequiredField {
                field: "tipo".to_string()
            })
        );
    }

    #[test]
    fn test_require_object_rejects_arrays() {
        assert!(require_object(json!([1, 2])).is_err());
        assert!(require_object(json!("Rex")).is_err());
    }
}
