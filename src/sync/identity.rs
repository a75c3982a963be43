//! Resolution of charge-session identity tokens to display names

use crate::api::CloudApi;
use crate::logging::get_logger;
use std::sync::Arc;

/// Resolves an opaque identity token to something readable, degrading to
/// the raw token on any failure.
///
/// Exactly one lookup is attempted per token and never retried: the
/// upstream is known to answer certain well-formed tokens with a
/// deterministic server error, and retrying those only burns rate budget.
#[derive(Clone)]
pub struct IdentityResolver {
    api: Arc<dyn CloudApi>,
    logger: crate::logging::StructuredLogger,
}

impl IdentityResolver {
    pub fn new(api: Arc<dyn CloudApi>) -> Self {
        Self {
            api,
            logger: get_logger("identity"),
        }
    }

    /// Resolve a token to a display name, or return the token unchanged
    pub async fn resolve(&self, token: &str) -> String {
        if token.trim().is_empty() {
            return token.to_string();
        }
        match self.api.user_by_token(token).await {
            Ok(Some(user)) => user
                .display_name()
                .unwrap_or_else(|| token.to_string()),
            Ok(None) => token.to_string(),
            Err(e) => {
                self.logger
                    .debug(&format!("identity lookup failed, keeping raw token: {}", e));
                token.to_string()
            }
        }
    }
}
