use std::fmt;

use rand::Rng;
use thiserror::Error;

/// Characters used for generated codes; omits look-alikes (0/O, 1/I).
pub const ROOM_CODE_ALPHABET: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
/// Shortest accepted room code.
pub const MIN_ROOM_CODE_LEN: usize = 3;
/// Longest accepted room code.
pub const MAX_ROOM_CODE_LEN: usize = 12;

/// Short human-typed identifier of a tournament room, normalised to upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomCode(String);

impl RoomCode {
    /// Parse a user-typed code. Surrounding whitespace is ignored and letters are upper-cased.
    pub fn parse(value: &str) -> Result<Self, RoomCodeError> {
        let trimmed = value.trim();
        let len = trimmed.chars().count();
        if !(MIN_ROOM_CODE_LEN..=MAX_ROOM_CODE_LEN).contains(&len) {
            return Err(RoomCodeError::InvalidLength {
                min: MIN_ROOM_CODE_LEN,
                max: MAX_ROOM_CODE_LEN,
                found: len,
            });
        }
        for (index, ch) in trimmed.chars().enumerate() {
            if !ch.is_ascii_alphanumeric() {
                return Err(RoomCodeError::InvalidCharacter { ch, index });
            }
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Draw a random code of `len` characters from [`ROOM_CODE_ALPHABET`].
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Self {
        let alphabet = ROOM_CODE_ALPHABET.as_bytes();
        let len = len.clamp(MIN_ROOM_CODE_LEN, MAX_ROOM_CODE_LEN);
        let code = (0..len)
            .map(|_| char::from(alphabet[rng.random_range(0..alphabet.len())]))
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for RoomCode {
    type Err = RoomCodeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

/// Reasons a room code is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomCodeError {
    #[error("room code must be {min} to {max} characters, got {found}")]
    InvalidLength { min: usize, max: usize, found: usize },
    #[error("invalid character '{ch}' at position {index} in room code")]
    InvalidCharacter { ch: char, index: usize },
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn parse_normalises_case_and_whitespace() {
        let code = RoomCode::parse("  ab3de ").unwrap();
        assert_eq!(code.as_str(), "AB3DE");
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(matches!(
            RoomCode::parse("AB"),
            Err(RoomCodeError::InvalidLength { found: 2, .. })
        ));
        assert!(matches!(
            RoomCode::parse("AB-CD"),
            Err(RoomCodeError::InvalidCharacter { ch: '-', index: 2 })
        ));
        assert!(RoomCode::parse("ABCDEFGHIJKLM").is_err());
    }

    #[test]
    fn generated_codes_use_the_unambiguous_alphabet() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let code = RoomCode::generate(&mut rng, 5);
            assert_eq!(code.as_str().len(), 5);
            assert!(code.as_str().chars().all(|ch| ROOM_CODE_ALPHABET.contains(ch)));
            assert_eq!(RoomCode::parse(code.as_str()).unwrap(), code);
        }
    }
}
