//! JWT issuing and verification
//!
//! HS256 tokens with issuer/audience pinning. The subject claim
//! carries the member id; `name` and `role` ride along so handlers
//! can authorize without a database read.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::{Rng, distributions::Alphanumeric};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::utils::{AppError, AppResult};

/// 签名密钥最短长度
pub const MIN_SECRET_LEN: usize = 32;

const ISSUER: &str = "ramen-road";
const AUDIENCE: &str = "ramen-road-clients";
const DEFAULT_EXPIRATION_MINUTES: i64 = 600;

/// Token signing configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_minutes: i64,
    pub issuer: String,
    pub audience: String,
}

impl JwtConfig {
    /// Read `JWT_SECRET` / `JWT_EXPIRATION_MINUTES` from the environment
    ///
    /// Production requires an explicit secret of at least
    /// [`MIN_SECRET_LEN`] bytes. Development falls back to a random
    /// secret, which invalidates all sessions on restart.
    pub fn from_env(production: bool) -> AppResult<Self> {
        let secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if secret.len() >= MIN_SECRET_LEN => secret,
            Ok(_) => {
                return Err(AppError::internal(format!(
                    "JWT_SECRET must be at least {MIN_SECRET_LEN} characters"
                )));
            }
            Err(_) if production => {
                return Err(AppError::internal(
                    "JWT_SECRET is required when ENVIRONMENT=production",
                ));
            }
            Err(_) => {
                warn!("JWT_SECRET not set, generated a one-off secret; logins will not survive a restart");
                generate_secret()
            }
        };

        let expiration_minutes = std::env::var("JWT_EXPIRATION_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_EXPIRATION_MINUTES);

        Ok(Self {
            secret,
            expiration_minutes,
            issuer: ISSUER.to_string(),
            audience: AUDIENCE.to_string(),
        })
    }

    pub fn for_testing() -> Self {
        Self {
            secret: "unit-test-secret-0123456789abcdef0123456789abcdef".to_string(),
            expiration_minutes: DEFAULT_EXPIRATION_MINUTES,
            issuer: ISSUER.to_string(),
            audience: AUDIENCE.to_string(),
        }
    }
}

fn generate_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

/// Token payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Member id, stringified
    pub sub: String,
    /// Display name
    pub name: String,
    /// `user` or `admin`
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub aud: String,
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("token expired")]
    ExpiredToken,
    #[error("invalid token: {0}")]
    InvalidToken(String),
}

/// Stateless token service, shared behind an `Arc`
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    expiration_minutes: i64,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&config.audience]);
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss", "aud"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            expiration_minutes: config.expiration_minutes,
        }
    }

    /// Issue a token for a logged-in member
    pub fn issue(&self, member_id: i64, name: &str, role: &str) -> Result<String, JwtError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: member_id.to_string(),
            name: name.to_string(),
            role: role.to_string(),
            exp: now + self.expiration_minutes * 60,
            iat: now,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))
    }

    /// Verify signature, expiry, issuer and audience
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                _ => JwtError::InvalidToken(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new(&JwtConfig::for_testing())
    }

    #[test]
    fn test_issue_verify_round_trip() {
        let svc = service();
        let token = svc.issue(42, "yuki", "admin").unwrap();
        let claims = svc.verify(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.name, "yuki");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.aud, AUDIENCE);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let svc = service();
        // two hours in the past, outside the default 60s leeway
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "1".to_string(),
            name: "old".to_string(),
            role: "user".to_string(),
            exp: now - 7200,
            iat: now - 10800,
            iss: ISSUER.to_string(),
            aud: AUDIENCE.to_string(),
        };
        let config = JwtConfig::for_testing();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        assert!(matches!(svc.verify(&token), Err(JwtError::ExpiredToken)));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let svc = service();
        let other = JwtService::new(&JwtConfig {
            secret: "another-secret-another-secret-another-secret".to_string(),
            ..JwtConfig::for_testing()
        });
        let token = other.issue(7, "mei", "user").unwrap();
        assert!(matches!(svc.verify(&token), Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let svc = service();
        assert!(svc.verify("not.a.token").is_err());
        assert!(svc.verify("").is_err());
    }
}
