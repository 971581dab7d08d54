use validator::{Validate, ValidationError, ValidationErrors};

/// Flattens validator output into one line, e.g. `name: [blank: must not be blank]`.
pub fn describe(err: &ValidationErrors) -> String {
    let mut fields = err
        .field_errors()
        .iter()
        .map(|(field, errs)| {
            let errors = errs
                .iter()
                .map(|e| format!("{}: {}", e.code, e.message.as_deref().unwrap_or("")))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{}: [{}]", field, errors)
        })
        .collect::<Vec<_>>();
    fields.sort();
    fields.join("; ")
}

pub fn validate_payload<T: Validate>(payload: &T) -> Result<(), String> {
    payload
        .validate()
        .map_err(|err| format!("Validation failed: {}", describe(&err)))
}

pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Form {
        #[validate(custom = "not_blank")]
        name: String,
    }

    #[test]
    fn blank_values_are_reported_by_field() {
        let err = validate_payload(&Form { name: "  ".to_string() }).unwrap_err();
        assert_eq!(err, "Validation failed: name: [blank: must not be blank]");
        assert!(validate_payload(&Form { name: "Asha".to_string() }).is_ok());
    }
}
