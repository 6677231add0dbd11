//! Credential providers.

use std::collections::HashMap;

use super::CredentialProvider;

/// Credential holding the YouTube Data API key
pub const API_KEY_VAR: &str = "YOUTUBE_API_KEY";

/// Reads credentials from the process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialProvider for EnvCredentials {
    fn credential(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.trim().is_empty())
    }
}

/// Fixed in-memory credentials (embedding hosts, tests)
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    values: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl CredentialProvider for StaticCredentials {
    fn credential(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}
