//! JWT token service implementation.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quill_core::ports::{AuthError, TokenClaims, TokenService};

/// JWT token service configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expires_in_seconds: i64,
}

/// Wire form of the claims. `iat` and `exp` are optional so tokens minted
/// elsewhere with the same secret still decode.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<i64>,
}

/// HS256 token service.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        // Signature only. Expiry is checked by the caller so an expired token
        // can be told apart from a forged one.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Self {
            encoding_key,
            decoding_key,
            validation,
            config,
        }
    }
}

impl TokenService for JwtTokenService {
    fn generate_token(&self, user_id: Uuid, email: &str) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: Some(now),
            exp: Some(now + self.config.expires_in_seconds),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let claims = token_data.claims;
        Ok(TokenClaims {
            sub: claims.sub,
            email: claims.email,
            iat: claims.iat,
            exp: claims.exp,
        })
    }

    fn expiration_seconds(&self) -> i64 {
        self.config.expires_in_seconds
    }
}
