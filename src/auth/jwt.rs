use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{auth::claims::{Claims, Role}, config::JwtConfig};

#[derive(Debug, Error)]
#[error("invalid token: {0}")]
pub struct InvalidToken(#[from] jsonwebtoken::errors::Error);

/// Signing and verification keys built once from [`JwtConfig`] at startup.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

/// An access/refresh pair handed out at login and registration.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(std::slice::from_ref(&cfg.issuer));
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);
        validation.validate_nbf = true;
        // `now > exp` fails, `now == exp` passes.
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            validation,
            issuer: cfg.issuer.clone(),
            access_ttl: Duration::minutes(cfg.ttl_minutes),
            refresh_ttl: Duration::minutes(cfg.refresh_ttl_minutes),
        }
    }

    pub(crate) fn sign_at(
        &self,
        user_id: Uuid,
        email: &str,
        role: Role,
        ttl: Duration,
        now: OffsetDateTime,
    ) -> anyhow::Result<String> {
        let exp = now + ttl;
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            role,
            iat: now.unix_timestamp(),
            nbf: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
            iss: self.issuer.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %user_id, %role, exp = claims.exp, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, user_id: Uuid, email: &str, role: Role) -> anyhow::Result<String> {
        self.sign_at(user_id, email, role, self.access_ttl, OffsetDateTime::now_utc())
    }

    pub fn sign_refresh(&self, user_id: Uuid, email: &str, role: Role) -> anyhow::Result<String> {
        self.sign_at(user_id, email, role, self.refresh_ttl, OffsetDateTime::now_utc())
    }

    pub fn issue_pair(&self, user_id: Uuid, email: &str, role: Role) -> anyhow::Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.sign_access(user_id, email, role)?,
            refresh_token: self.sign_refresh(user_id, email, role)?,
        })
    }

    /// Checks signature, issuer, `nbf` and `exp`. Access and refresh tokens are
    /// accepted alike.
    pub fn verify(&self, token: &str) -> Result<Claims, InvalidToken> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        debug!(user_id = %data.claims.sub, role = %data.claims.role, "jwt verified");
        Ok(data.claims)
    }
}
