use super::error::AuthError;

const MIN_KEY_LENGTH: usize = 12;

/// Checks the format of an issued secret key before it is stored.
pub trait KeyValidator: Send + Sync {
    fn validate(&self, key: &str) -> Result<(), AuthError>;
}

/// Accepts secret (`sk_`) and restricted (`rk_`) keys of the form
/// `<kind>_<mode>_<body>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecretKeyValidator;

impl KeyValidator for SecretKeyValidator {
    fn validate(&self, key: &str) -> Result<(), AuthError> {
        if key.is_empty() {
            return Err(AuthError::Validation(
                "no API key was issued".to_string(),
            ));
        }
        if key.chars().any(char::is_whitespace) {
            return Err(AuthError::Validation(
                "the API key contains whitespace".to_string(),
            ));
        }
        if key.len() < MIN_KEY_LENGTH {
            return Err(AuthError::Validation(format!(
                "the API key provided is too short, it must be at least {MIN_KEY_LENGTH} characters long"
            )));
        }
        let parts: Vec<&str> = key.split('_').collect();
        if parts.len() < 3 {
            return Err(AuthError::Validation(
                "legacy-style API keys are not supported".to_string(),
            ));
        }
        if parts[0] != "sk" && parts[0] != "rk" {
            return Err(AuthError::Validation(
                "only secret or restricted keys are supported".to_string(),
            ));
        }
        Ok(())
    }
}
