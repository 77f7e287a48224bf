use std::fmt;

use super::DomainError;

/// Client-supplied display name. Not verified by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    pub const MAX_LEN: usize = 64;

    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(DomainError::EmptyUsername);
        }

        let len = trimmed.chars().count();
        if len > Self::MAX_LEN {
            return Err(DomainError::InvalidUsernameLength(len));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_is_trimmed() {
        let name = Username::new("  alice ").expect("valid username");

        assert_eq!(name.as_str(), "alice");
    }

    #[test]
    fn blank_username_is_rejected() {
        assert_eq!(Username::new("   "), Err(DomainError::EmptyUsername));
    }

    #[test]
    fn overlong_username_is_rejected() {
        let err = Username::new("x".repeat(65)).expect_err("65 chars is too long");

        assert_eq!(
            err.to_string(),
            "invalid username length: 65. username must be at most 64 characters"
        );
    }
}
