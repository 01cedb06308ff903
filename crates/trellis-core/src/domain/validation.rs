use crate::domain::error::DomainError;

/// Centralized domain validation.
pub struct DomainValidator;

impl DomainValidator {
    /// A template name is a single directory name: non-blank, no path
    /// separators, not `.` or `..`.
    pub fn validate_template_name(name: &str) -> Result<(), DomainError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidTemplate(
                "template name cannot be blank".into(),
            ));
        }
        if trimmed != name
            || name == "."
            || name == ".."
            || name.contains(['/', '\\'])
            || name.contains("..")
        {
            return Err(DomainError::InvalidTemplate(format!(
                "'{name}' is not a valid template name"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_names() {
        assert!(DomainValidator::validate_template_name("kotlin-lib").is_ok());
        assert!(DomainValidator::validate_template_name("gitignore").is_ok());
        assert!(DomainValidator::validate_template_name("").is_err());
        assert!(DomainValidator::validate_template_name("..").is_err());
        assert!(DomainValidator::validate_template_name("a/b").is_err());
        assert!(DomainValidator::validate_template_name("..\\x").is_err());
        assert!(DomainValidator::validate_template_name(" padded").is_err());
    }
}
