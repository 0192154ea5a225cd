//! Shared-secret gate for the admin endpoints.

use secrecy::{ExposeSecret, SecretString};

use crate::config::AdminConfig;

/// Header carrying the admin secret on protected requests.
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

#[derive(Clone, Debug)]
pub struct AdminGuard {
    key: SecretString,
}

impl AdminGuard {
    pub fn new(config: &AdminConfig) -> Self {
        Self { key: config.key.clone() }
    }

    /// Exact, case-sensitive comparison. A missing key never matches.
    pub fn authorize(&self, supplied: Option<&str>) -> bool {
        match supplied {
            Some(supplied) => supplied == self.key.expose_secret(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::AdminConfig;

    use super::AdminGuard;

    fn guard(key: &str) -> AdminGuard {
        AdminGuard::new(&AdminConfig { key: key.to_string().into() })
    }

    #[test]
    fn matching_key_is_authorized() {
        assert!(guard("s3cret").authorize(Some("s3cret")));
    }

    #[test]
    fn comparison_is_case_sensitive_and_exact() {
        let guard = guard("s3cret");
        assert!(!guard.authorize(Some("S3CRET")));
        assert!(!guard.authorize(Some("s3cret ")));
        assert!(!guard.authorize(Some("")));
    }

    #[test]
    fn missing_key_is_rejected() {
        assert!(!guard("s3cret").authorize(None));
    }
}
