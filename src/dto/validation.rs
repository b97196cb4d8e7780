//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest display name accepted, in characters.
pub const MAX_NAME_CHARS: usize = 20;
/// Length of a room code.
pub const ROOM_CODE_LEN: usize = 6;

/// Validates that a display name holds 1 to [`MAX_NAME_CHARS`] characters once trimmed.
///
/// # Examples
///
/// ```ignore
/// validate_player_name("  Aki ")      // Ok
/// validate_player_name("   ")         // Err - blank
/// validate_player_name(&"x".repeat(21)) // Err - too long
/// ```
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    let count = name.trim().chars().count();
    if count == 0 {
        let mut err = ValidationError::new("name_blank");
        err.message = Some("Name must not be blank".into());
        return Err(err);
    }

    if count > MAX_NAME_CHARS {
        let mut err = ValidationError::new("name_length");
        err.message = Some(
            format!("Name must be at most {MAX_NAME_CHARS} characters (got {count})").into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Validates that a room code is [`ROOM_CODE_LEN`] ASCII alphanumerics once trimmed.
///
/// Case is not checked; codes are upper-cased before lookup.
pub fn validate_room_code(code: &str) -> Result<(), ValidationError> {
    let code = code.trim();
    if code.len() != ROOM_CODE_LEN || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        let mut err = ValidationError::new("room_code_format");
        err.message =
            Some(format!("Room code must be {ROOM_CODE_LEN} letters or digits").into());
        return Err(err);
    }

    Ok(())
}

/// Trim and upper-case a room code taken from a path or a body.
pub fn normalize_room_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
