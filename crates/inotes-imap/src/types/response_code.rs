//! Response codes.

use super::Capability;

/// Bracketed response code carried by status responses, e.g. `[READ-ONLY]`.
///
/// Codes the client does not act on are kept by name only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    /// ALERT: Human-readable message that MUST be shown to user.
    Alert,
    /// CAPABILITY response.
    Capability(Vec<Capability>),
    /// READ-ONLY: Mailbox selected as read-only.
    ReadOnly,
    /// READ-WRITE: Mailbox selected as read-write.
    ReadWrite,
    /// TRYCREATE: Mailbox doesn't exist, but can be created.
    TryCreate,
    /// NONEXISTENT: the referenced mailbox does not exist (RFC 5530).
    Nonexistent,
    /// AUTHENTICATIONFAILED: credentials rejected (RFC 5530).
    AuthenticationFailed,
    /// Any other response code.
    Unknown(String),
}

impl ResponseCode {
    /// Maps a code atom without arguments to its variant.
    #[must_use]
    pub fn from_atom(atom: &str) -> Self {
        match atom.to_ascii_uppercase().as_str() {
            "ALERT" => Self::Alert,
            "READ-ONLY" => Self::ReadOnly,
            "READ-WRITE" => Self::ReadWrite,
            "TRYCREATE" => Self::TryCreate,
            "NONEXISTENT" => Self::Nonexistent,
            "AUTHENTICATIONFAILED" => Self::AuthenticationFailed,
            _ => Self::Unknown(atom.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_atom_known_and_unknown() {
        assert_eq!(ResponseCode::from_atom("read-only"), ResponseCode::ReadOnly);
        assert_eq!(
            ResponseCode::from_atom("AUTHENTICATIONFAILED"),
            ResponseCode::AuthenticationFailed
        );
        assert_eq!(
            ResponseCode::from_atom("UIDVALIDITY"),
            ResponseCode::Unknown("UIDVALIDITY".to_string())
        );
    }
}
