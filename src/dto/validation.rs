//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::state::room_code::RoomCode;

const MIN_PIN_LEN: usize = 4;
const MAX_PIN_LEN: usize = 12;

/// Validates that a director PIN is 4 to 12 ASCII digits.
///
/// # Examples
///
/// ```ignore
/// validate_director_pin("1234")   // Ok
/// validate_director_pin("12a4")   // Err - not a digit
/// validate_director_pin("123")    // Err - too short
/// ```
pub fn validate_director_pin(pin: &str) -> Result<(), ValidationError> {
    if !(MIN_PIN_LEN..=MAX_PIN_LEN).contains(&pin.len()) {
        let mut err = ValidationError::new("director_pin_length");
        err.message = Some(
            format!(
                "Director PIN must be {MIN_PIN_LEN} to {MAX_PIN_LEN} digits (got {})",
                pin.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !pin.chars().all(|c| c.is_ascii_digit()) {
        let mut err = ValidationError::new("director_pin_format");
        err.message = Some("Director PIN must contain only digits".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a room code chosen by the director.
pub fn validate_room_code(code: &str) -> Result<(), ValidationError> {
    RoomCode::parse(code).map(|_| ()).map_err(|source| {
        let mut err = ValidationError::new("room_code");
        err.message = Some(source.to_string().into());
        err
    })
}

/// Rejects names made only of whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        return Err(err);
    }
    Ok(())
}
