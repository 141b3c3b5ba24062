use crate::error::{AppError, AppResult};
use crate::models::ReflectionAnswers;

// =============================================================================
// Validation Constants
// =============================================================================

/// Maximum length for an email address.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Minimum password length, in bytes.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length, in bytes.
///
/// bcrypt ignores everything past 72 bytes.
pub const MAX_PASSWORD_LENGTH: usize = 72;

/// Maximum length for a display name.
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum length for a dream title, in characters.
pub const MAX_DREAM_TITLE_LENGTH: usize = 200;

/// Maximum length for a dream description, in characters.
pub const MAX_DREAM_DESCRIPTION_LENGTH: usize = 2000;

/// Maximum length for a single reflection answer, in characters.
pub const MAX_ANSWER_LENGTH: usize = 4000;

/// Validate an email address.
///
/// Rules:
/// - Must not be empty or exceed 254 characters
/// - Must contain exactly one `@` with a non-empty local part
/// - The domain must contain a dot and must not start or end with one
/// - No whitespace or control characters
pub fn validate_email(email: &str) -> AppResult<()> {
    if email.is_empty() {
        return Err(AppError::BadRequest("Email cannot be empty".to_string()));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Email cannot exceed {MAX_EMAIL_LENGTH} characters"
        )));
    }

    if email.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(AppError::BadRequest(
            "Email cannot contain whitespace".to_string(),
        ));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(AppError::BadRequest("Email must contain '@'".to_string()));
    };

    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(AppError::BadRequest(format!(
            "'{email}' is not a valid email address"
        )));
    }

    Ok(())
}

/// Validate a password's length.
pub fn validate_password(password: &str) -> AppResult<()> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Password cannot exceed {MAX_PASSWORD_LENGTH} bytes"
        )));
    }

    Ok(())
}

/// Validate a display name.
pub fn validate_name(name: &str) -> AppResult<()> {
    validate_text("Name", name, MAX_NAME_LENGTH)
}

pub fn validate_dream_title(title: &str) -> AppResult<()> {
    validate_text("Dream title", title, MAX_DREAM_TITLE_LENGTH)
}

/// Validate an optional dream description. Empty is allowed.
pub fn validate_dream_description(description: &str) -> AppResult<()> {
    let len = description.chars().count();
    if len > MAX_DREAM_DESCRIPTION_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Dream description cannot exceed {MAX_DREAM_DESCRIPTION_LENGTH} characters (got {len})"
        )));
    }
    Ok(())
}

/// Validate all four reflection answers.
///
/// Each answer must be non-blank and at most 4000 characters.
pub fn validate_reflection_answers(answers: &ReflectionAnswers) -> AppResult<()> {
    for (field, value) in answers.fields() {
        validate_text(field, value, MAX_ANSWER_LENGTH)?;
    }
    Ok(())
}

/// Non-blank text of at most `max` characters, free of control characters
/// other than newlines and tabs.
fn validate_text(label: &str, value: &str, max: usize) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{label} cannot be empty")));
    }

    let len = value.chars().count();
    if len > max {
        return Err(AppError::BadRequest(format!(
            "{label} cannot exceed {max} characters (got {len})"
        )));
    }

    if let Some(pos) = value
        .chars()
        .position(|c| c.is_control() && c != '\n' && c != '\r' && c != '\t')
    {
        return Err(AppError::BadRequest(format!(
            "{label} contains invalid control character at position {pos}"
        )));
    }

    Ok(())
}
