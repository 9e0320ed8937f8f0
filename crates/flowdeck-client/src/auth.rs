//! Token handling for the pipeline service.
//!
//! The client asks a provider for the current token on every request, so
//! rotating credentials do not require rebuilding the client.

use std::fmt::Debug;

/// Source of bearer tokens for the pipeline service
pub trait TokenProvider: Send + Sync + Debug {
    /// The token to attach to the next request, if any
    fn token(&self) -> Option<String>;
}

/// Provider that always hands out the same token
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    /// Provider for a fixed token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// Provider for unauthenticated access, used against local dev
    /// services
    pub fn anonymous() -> Self {
        Self { token: None }
    }
}

impl TokenProvider for StaticTokenProvider {
    fn token(&self) -> Option<String> {
        self.token.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_provider() {
        let provider = StaticTokenProvider::new("secret");
        assert_eq!(provider.token(), Some("secret".to_string()));

        let provider = StaticTokenProvider::anonymous();
        assert_eq!(provider.token(), None);
    }
}
