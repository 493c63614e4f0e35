//! Bearer token verification.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use crate::claims::{JwtClaims, TokenValidationError, validate_claims};

/// Verifies a raw bearer token and returns its claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError>;
}

/// HS256 shared-secret validator.
///
/// The signature is checked by `jsonwebtoken`; the time window is checked by
/// [`validate_claims`] because the claims carry RFC 3339 timestamps rather than
/// the registered numeric `exp`.
pub struct Hs256JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: Vec<u8>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        Self {
            key: DecodingKey::from_secret(&secret),
            validation,
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation)
            .map_err(|e| TokenValidationError::Malformed(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carshop_core::Login;
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn mint(secret: &str, claims: &JwtClaims) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims() -> JwtClaims {
        let now = Utc::now();
        JwtClaims {
            sub: Login::parse("alice").unwrap(),
            issued_at: now,
            expires_at: now + Duration::minutes(5),
        }
    }

    #[test]
    fn validates_signed_tokens() {
        let validator = Hs256JwtValidator::new(b"secret".to_vec());
        let c = claims();
        let token = mint("secret", &c);
        assert_eq!(validator.validate(&token, Utc::now()).unwrap(), c);
    }

    #[test]
    fn rejects_wrong_secret_and_garbage() {
        let validator = Hs256JwtValidator::new(b"secret".to_vec());
        let token = mint("other", &claims());
        assert!(matches!(
            validator.validate(&token, Utc::now()),
            Err(TokenValidationError::Malformed(_))
        ));
        assert!(validator.validate("not.a.token", Utc::now()).is_err());
    }

    #[test]
    fn rejects_expired_tokens() {
        let validator = Hs256JwtValidator::new(b"secret".to_vec());
        let token = mint("secret", &claims());
        assert_eq!(
            validator.validate(&token, Utc::now() + Duration::hours(1)),
            Err(TokenValidationError::Expired)
        );
    }
}
