//! Login and password format checks.
//!
//! Client and server apply the same rules: a login of at most 25
//! characters and a password of at most 255 characters, each made
//! entirely of ASCII letters, digits and the symbols `_ - / * ( ) \`.
//!
//! File names in an update are checked too: they are used verbatim as
//! client-local names, so anything that could leave the target directory
//! or collide with the end-of-list marker is refused.

use crate::error::ValidationError;
use crate::messages::limits::{MAX_LOGIN_LEN, MAX_PASSWORD_LEN};
use crate::messages::STOP_SENTINEL;

/// Whether `c` may appear in a login or password.
pub fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '/' | '*' | '(' | ')' | '\\')
}

/// Validate a login.
pub fn validate_login(login: &str) -> Result<(), ValidationError> {
    if login.is_empty() {
        return Err(ValidationError::EmptyLogin);
    }
    let len = login.chars().count();
    if len > MAX_LOGIN_LEN {
        return Err(ValidationError::LoginTooLong {
            len,
            max: MAX_LOGIN_LEN,
        });
    }
    if let Some(c) = login.chars().find(|c| !is_allowed_char(*c)) {
        return Err(ValidationError::LoginCharacter(c));
    }
    Ok(())
}

/// Validate a password.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyPassword);
    }
    let len = password.chars().count();
    if len > MAX_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooLong {
            len,
            max: MAX_PASSWORD_LEN,
        });
    }
    if let Some(c) = password.chars().find(|c| !is_allowed_char(*c)) {
        return Err(ValidationError::PasswordCharacter(c));
    }
    Ok(())
}

/// Validate a login/password pair for registration.
pub fn validate_credentials(login: &str, password: &str) -> Result<(), ValidationError> {
    validate_login(login)?;
    validate_password(password)
}

/// Validate a file name carried by an update.
pub fn validate_file_name(name: &str) -> Result<(), ValidationError> {
    let reserved = matches!(name, "" | "." | ".." | STOP_SENTINEL);
    if reserved || name.contains(['/', '\\', '\0']) {
        return Err(ValidationError::FileName(name.to_string()));
    }
    Ok(())
}
