//! UUID validation helpers.
//!
//! The legacy database stores identifiers as free text, so anything read from it
//! has to pass through [`parse_valid_uuid`] before it can be used as a target key.
use uuid::Uuid;

/// Returns `true` when `value` is a well-formed, non-nil UUID.
///
/// Surrounding whitespace is tolerated, braces and URN prefixes are not.
pub fn is_valid_uuid(value: &str) -> bool {
    parse_valid_uuid(value).is_some()
}

/// Parses `value` as a hyphenated or simple UUID, rejecting the nil UUID.
pub fn parse_valid_uuid(value: &str) -> Option<Uuid> {
    let trimmed = value.trim();
    // Uuid::parse_str also accepts braced and urn forms, which the legacy data never uses
    if trimmed.len() != 36 && trimmed.len() != 32 {
        return None;
    }
    Uuid::parse_str(trimmed).ok().filter(|uuid| !uuid.is_nil())
}
