use super::model::{AuthenticatedUser, SessionClaims};
use crate::core::error::AppError;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use std::time::Duration;

/// Verifies HS256 session tokens signed with the shared session secret.
pub struct SessionValidator {
    decoding_key: DecodingKey,
    leeway: u64,
}

impl SessionValidator {
    pub fn new(secret: &str, leeway: Duration) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            leeway: leeway.as_secs(),
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let header =
            decode_header(token).map_err(|e| AppError::Unauthorized(format!("Invalid session: {}", e)))?;

        if header.alg != Algorithm::HS256 {
            return Err(AppError::Unauthorized(format!(
                "Unsupported algorithm: {:?}. Only HS256 is allowed",
                header.alg
            )));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway;

        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::Unauthorized(format!("Invalid session: {}", e)))?;

        let claims = token_data.claims;
        if claims.sub.trim().is_empty() {
            return Err(AppError::Unauthorized(
                "User not authenticated.".to_string(),
            ));
        }

        Ok(claims.into())
    }
}
