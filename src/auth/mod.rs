use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{Claims, Inviter};

/// JWT Authentication Service
#[derive(Clone)]
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_seconds: u64,
}

impl AuthService {
    pub fn new(config: &Config) -> Self {
        Self::from_secret(&config.jwt_secret, config.jwt_expiry_seconds)
    }

    pub fn from_secret(secret: &str, expiry_seconds: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_seconds,
        }
    }

    /// Generate a JWT token for a signed-in member
    pub fn generate_token(&self, user_id: &str, name: &str, email: &str) -> Result<String> {
        let now = Utc::now().timestamp();
        let exp = now + self.expiry_seconds as i64;

        let claims = Claims {
            sub: user_id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            iat: now,
            exp,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Validate a JWT token and return the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }

    /// Resolve the bearer of `token` as an inviter
    pub fn inviter(&self, token: &str) -> Result<Inviter> {
        self.validate_token(token).map(Inviter::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> AuthService {
        AuthService::from_secret("test-secret-key", 900)
    }

    #[test]
    fn test_generate_and_validate_token() {
        let auth = auth();

        let token = auth
            .generate_token("user-123", "Alice", "alice@x.com")
            .expect("Should generate token");

        let claims = auth.validate_token(&token).expect("Should validate token");

        assert_eq!(claims.sub, "user-123");
        assert_eq!(claims.name, "Alice");
        assert_eq!(claims.email, "alice@x.com");
    }

    #[test]
    fn test_inviter_from_token() {
        let auth = auth();
        let token = auth.generate_token("user-9", "Bo", "bo@x.com").unwrap();

        let inviter = auth.inviter(&token).expect("Should resolve inviter");
        assert_eq!(inviter.user_id, "user-9");
        assert_eq!(inviter.email, "bo@x.com");
    }

    #[test]
    fn test_invalid_token() {
        let result = auth().validate_token("invalid-token");
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_token_from_other_secret() {
        let token = AuthService::from_secret("other", 900)
            .generate_token("u", "n", "e@x.com")
            .unwrap();
        assert!(auth().validate_token(&token).is_err());
    }
}
