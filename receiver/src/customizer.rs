//! Per-request resource customization.

use axum::http::HeaderMap;
use shared::hec::{HEC_TOKEN_HEADER, HEC_TOKEN_LABEL};
use shared::models::Resource;

/// Adds the sender's HEC token to every resource of a batch.
///
/// Built fresh for each request from its headers. Without a token it does
/// nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceCustomizer {
    token: Option<String>,
}

impl ResourceCustomizer {
    /// Builds the customizer for one request.
    ///
    /// The token is only captured when `passthrough` is enabled and the
    /// `Authorization` header is present and non-empty.
    #[must_use]
    pub fn from_headers(passthrough: bool, headers: &HeaderMap) -> Self {
        if !passthrough {
            return Self::default();
        }

        let token = headers
            .get(HEC_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        Self { token }
    }

    /// The captured token, if any.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Applies the customization to one resource.
    pub fn apply(&self, resource: &mut Resource) {
        if let Some(token) = &self.token {
            resource.insert_str(HEC_TOKEN_LABEL, token.as_str());
        }
    }
}
