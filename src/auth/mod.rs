//! Credentials and the security blob carried by SESSION_SETUP

pub mod ntlm;

use std::fmt;

/// User credentials supplied at connect time
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub domain: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            domain: String::new(),
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Security blob for the SESSION_SETUP request
    pub fn security_blob(&self) -> Vec<u8> {
        ntlm::authenticate_blob(&self.username, &self.domain)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("domain", &self.domain)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_password() {
        let creds = Credentials::new("alice", "hunter2").with_domain("WORKGROUP");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("alice"));
        assert!(printed.contains("WORKGROUP"));
        assert!(!printed.contains("hunter2"));
    }
}
