use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::core::config::AuthConfig;
use crate::core::error::{AppError, Result};
use crate::features::auth::model::{AuthenticatedDinas, DinasClaims};

/// HS256 sign/verify for dinas session tokens. Issuance flows live in
/// the provisioning tooling; this service verifies, and signing is kept
/// for that tooling and for tests.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.jwt_leeway.as_secs();

        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    pub fn sign(&self, claims: &DinasClaims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    pub fn verify(&self, token: &str) -> Result<AuthenticatedDinas> {
        let data = decode::<DinasClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;
        Ok(data.claims.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::tickets::models::Category;
    use std::time::Duration;

    fn service() -> TokenService {
        TokenService::new(&AuthConfig {
            jwt_secret: "test-secret".to_string(),
            jwt_leeway: Duration::from_secs(0),
        })
    }

    fn claims(exp_offset: i64) -> DinasClaims {
        let now = chrono::Utc::now().timestamp();
        DinasClaims {
            sub: "dpu-bandung".to_string(),
            name: "Dinas Pekerjaan Umum".to_string(),
            categories: vec![Category::Infrastructure],
            scope: None,
            iat: now,
            exp: now + exp_offset,
        }
    }

    #[test]
    fn sign_then_verify_round_trips() {
        let svc = service();
        let token = svc.sign(&claims(3600)).unwrap();
        let verified = svc.verify(&token).unwrap();
        assert_eq!(verified.sub, "dpu-bandung");
        assert!(!verified.is_all_agencies());
    }

    #[test]
    fn expired_and_tampered_tokens_fail() {
        let svc = service();
        let expired = svc.sign(&claims(-3600)).unwrap();
        assert!(svc.verify(&expired).is_err());

        let other = TokenService::new(&AuthConfig {
            jwt_secret: "different-secret".to_string(),
            jwt_leeway: Duration::from_secs(0),
        });
        let foreign = other.sign(&claims(3600)).unwrap();
        assert!(svc.verify(&foreign).is_err());
    }
}
