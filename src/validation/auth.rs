use crate::error::{AppError, Result};

/// Validates a registration payload, collecting every violated field.
///
/// # Arguments
///
/// * `name` - The user's full name.
/// * `email` - The user's email address.
/// * `password` - The plaintext password.
///
/// # Returns
///
/// A `Result<()>` indicating whether the payload is valid.
pub fn validate_registration(name: &str, email: &str, password: &str) -> Result<()> {
    let mut errors = Vec::new();

    if name.trim().is_empty() {
        errors.push("Name is required".to_string());
    } else if name.len() > 100 {
        errors.push("Name cannot be more than 100 characters".to_string());
    }

    if !is_valid_email(email) {
        errors.push("Please enter a valid email address".to_string());
    }

    if password.len() < 8 {
        errors.push("Password must be at least 8 characters long".to_string());
    } else if password.len() > 128 {
        errors.push("Password must be at most 128 characters".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// A minimal structural email check: one `@` with a dotted domain after it.
fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.len() > 255 || email.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && tld.len() >= 2,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_reasonable_registration() {
        assert!(validate_registration("Ada Lovelace", "ada@example.com", "correct horse").is_ok());
    }

    #[test]
    fn rejects_bad_emails() {
        for email in ["", "no-at-sign", "@example.com", "a@", "a@nodot", "a b@example.com", "a@.com"] {
            assert!(!is_valid_email(email), "accepted {:?}", email);
        }
    }

    #[test]
    fn accepts_plain_emails() {
        for email in ["ada@example.com", "a.b+c@sub.example.org"] {
            assert!(is_valid_email(email), "rejected {:?}", email);
        }
    }

    #[test]
    fn enumerates_every_violation() {
        let err = validate_registration("", "nope", "short").unwrap_err();
        match err {
            AppError::Validation(details) => assert_eq!(details.len(), 3),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn rejects_short_password() {
        assert!(validate_registration("Ada", "ada@example.com", "1234567").is_err());
        assert!(validate_registration("Ada", "ada@example.com", "12345678").is_ok());
    }
}
