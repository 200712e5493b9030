use axum::{extract::FromRequestParts, http::request::Parts};

use crate::config::Config;
use crate::error::AppError;
use crate::security::{form_token, verify_form_token};
use crate::AppState;

/// Identity of the user behind a request
///
/// Authentication happens upstream: the fronting proxy passes the
/// authenticated user id in the configured identity header. The owner
/// identifier is only ever taken from here, never from form input.
#[derive(Debug, Clone)]
pub struct Session {
    pub owner_id: String,
    /// Anti-forgery token to embed in forms rendered for this user
    pub form_token: String,
}

impl Session {
    /// Reject a write whose anti-forgery token was not issued to this user
    pub fn verify_form(&self, config: &Config, token: &str) -> Result<(), AppError> {
        if !verify_form_token(&self.owner_id, token, &config.app_secret_key) {
            tracing::warn!("Rejected form with invalid anti-forgery token");
            return Err(AppError::InvalidFormToken);
        }
        Ok(())
    }
}

impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let owner_id = parts
            .headers
            .get(state.config.identity_header.as_str())
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                tracing::debug!("Request without identity header");
                AppError::Unauthenticated
            })?
            .to_string();

        let form_token = form_token(&owner_id, &state.config.app_secret_key)
            .ok_or(AppError::FormTokenUnavailable)?;
        Ok(Session {
            owner_id,
            form_token,
        })
    }
}
