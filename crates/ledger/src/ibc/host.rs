use crate::error::LedgerError;

const CHANNEL_PREFIX: &str = "channel-";
const MAX_SEQUENCE_DIGITS: usize = 20;

fn invalid(id: &str, reason: impl Into<String>) -> LedgerError {
    LedgerError::InvalidIdentifier { id: id.to_string(), reason: reason.into() }
}

fn validate_identifier(id: &str, min: usize, max: usize) -> Result<(), LedgerError> {
    if id.trim().is_empty() {
        return Err(invalid(id, "identifier cannot be blank"));
    }
    if id.contains('/') {
        return Err(invalid(id, "identifier cannot contain separator '/'"));
    }
    if id.len() < min || id.len() > max {
        return Err(invalid(
            id,
            format!(
                "identifier has invalid length: {}, must be between {min}-{max} characters",
                id.len()
            ),
        ));
    }
    let allowed = |c: char| {
        c.is_ascii_alphanumeric()
            || matches!(c, '.' | '_' | '+' | '-' | '#' | '[' | ']' | '<' | '>')
    };
    if !id.chars().all(allowed) {
        return Err(invalid(
            id,
            concat!(
                "identifier must contain only alphanumeric or the following characters: ",
                "'.', '_', '+', '-', '#', '[', ']', '<', '>'"
            ),
        ));
    }
    Ok(())
}

pub fn validate_port_identifier(id: &str) -> Result<(), LedgerError> {
    validate_identifier(id, 2, 128)
}

pub fn validate_channel_identifier(id: &str) -> Result<(), LedgerError> {
    validate_identifier(id, 8, 64)
}

pub fn validate_client_identifier(id: &str) -> Result<(), LedgerError> {
    validate_identifier(id, 9, 64)
}

/// Whether `id` has the v1 `channel-{N}` shape.
pub fn is_channel_id_format(id: &str) -> bool {
    id.strip_prefix(CHANNEL_PREFIX).is_some_and(|sequence| {
        !sequence.is_empty()
            && sequence.len() <= MAX_SEQUENCE_DIGITS
            && sequence.bytes().all(|b| b.is_ascii_digit())
    })
}
