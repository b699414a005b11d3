//! Client-side fast-fail checks. The server repeats these and has the final say.

use crate::types::{MAX_NAME_CHARS, PARTY_ID_LEN};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("Please enter a four digit party id")]
    PartyIdLength,

    #[error("No party selected")]
    NoParty,

    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Name must be at most 10 characters")]
    NameTooLong,
}

/// Trim and check a party id typed by the user
pub fn party_id(raw: &str) -> Result<String, InputError> {
    let code = raw.trim();
    if code.chars().count() != PARTY_ID_LEN {
        return Err(InputError::PartyIdLength);
    }
    Ok(code.to_string())
}

/// Trim and check a display name
pub fn player_name(raw: &str) -> Result<String, InputError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(InputError::EmptyName);
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(InputError::NameTooLong);
    }
    Ok(name.to_string())
}
