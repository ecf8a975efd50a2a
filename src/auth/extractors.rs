use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{decode, DecodingKey, Validation};
use tracing::warn;

use super::claims::Claims;
use super::normalize_email;
use crate::{config::JwtConfig, error::ApiError, state::AppState};

/// Extracts and validates the bearer token, yielding the verified caller
/// email (lowercase).
pub struct AuthUser(pub String);

pub(crate) fn verify_token(token: &str, cfg: &JwtConfig) -> Result<Claims, ApiError> {
    let mut validation = Validation::default();
    validation.set_audience(std::slice::from_ref(&cfg.audience));
    validation.set_issuer(std::slice::from_ref(&cfg.issuer));
    let decoding = DecodingKey::from_secret(cfg.secret.as_bytes());

    let data = decode::<Claims>(token, &decoding, &validation).map_err(|e| {
        warn!(error = %e, "invalid or expired token");
        ApiError::Unauthenticated
    })?;
    Ok(data.claims)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(ApiError::Unauthenticated)?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or(ApiError::Unauthenticated)?;

        let claims = verify_token(token, &state.config.jwt)?;
        Ok(AuthUser(normalize_email(&claims.email)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn cfg(secret: &str, issuer: &str, audience: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }

    fn sign(cfg: &JwtConfig, email: &str, ttl_secs: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: "uid-1".into(),
            email: email.into(),
            iat: now as usize,
            exp: (now + ttl_secs) as usize,
            iss: cfg.issuer.clone(),
            aud: cfg.audience.clone(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(cfg.secret.as_bytes()),
        )
        .expect("sign")
    }

    #[test]
    fn verifies_a_valid_token() {
        let cfg = cfg("dev-secret", "iss", "aud");
        let token = sign(&cfg, "a@x.com", 300);
        let claims = verify_token(&token, &cfg).expect("verify");
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.sub, "uid-1");
    }

    #[test]
    fn rejects_wrong_issuer_or_audience() {
        let good = cfg("same-secret", "good-iss", "good-aud");
        let bad = cfg("same-secret", "bad-iss", "bad-aud");
        let token = sign(&good, "a@x.com", 300);
        let err = verify_token(&token, &bad).unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated));
    }

    #[test]
    fn rejects_wrong_secret() {
        let good = cfg("secret-one", "iss", "aud");
        let bad = cfg("secret-two", "iss", "aud");
        let token = sign(&good, "a@x.com", 300);
        assert!(verify_token(&token, &bad).is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let cfg = cfg("dev-secret", "iss", "aud");
        let token = sign(&cfg, "a@x.com", -300);
        assert!(verify_token(&token, &cfg).is_err());
    }
}
