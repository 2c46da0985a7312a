use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::models::{Account, AccountStatus, Role};

/// How long an issued session token stays valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenExpiry {
    /// No `exp` claim is written.
    Never,
    After(Duration),
}

impl FromStr for TokenExpiry {
    type Err = String;

    /// Accepts `never`, `<n>s`, `<n>m`, `<n>h`, `<n>d` or bare seconds.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("never") {
            return Ok(TokenExpiry::Never);
        }

        let (digits, unit) = match s.char_indices().last() {
            Some((idx, c)) if c.is_ascii_alphabetic() => (&s[..idx], Some(c)),
            Some(_) => (s, None),
            None => return Err("Token expiration must not be empty".to_string()),
        };

        let amount: i64 = digits
            .parse()
            .map_err(|_| format!("Invalid token expiration: {}", s))?;
        if amount <= 0 {
            return Err(format!("Token expiration must be positive: {}", s));
        }

        let duration = match unit {
            None | Some('s') => Duration::try_seconds(amount),
            Some('m') => Duration::try_minutes(amount),
            Some('h') => Duration::try_hours(amount),
            Some('d') => Duration::try_days(amount),
            Some(other) => return Err(format!("Unknown token expiration unit '{}'", other)),
        }
        // Every issued `exp` must stay representable.
        .filter(|d| Utc::now().checked_add_signed(*d).is_some())
        .ok_or_else(|| format!("Token expiration is out of range: {}", s))?;

        Ok(TokenExpiry::After(duration))
    }
}

/// Identity carried by a session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Account id
    pub sub: Uuid,
    pub role: Role,
    pub email: String,
    pub organization_id: Option<Uuid>,
    pub status: AccountStatus,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp); absent when tokens never expire
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

#[derive(Debug, Error, PartialEq)]
pub enum TokenError {
    #[error("Invalid token")]
    Invalid,

    #[error("Token expired")]
    Expired,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// HS256 session token issuer and verifier.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry: TokenExpiry,
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();

        tracing::info!(expiry = ?config.expiration, "Token service initialized with HS256");

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            expiry: config.expiration,
        }
    }

    pub fn expiry(&self) -> TokenExpiry {
        self.expiry
    }

    pub fn issue(&self, account: &Account) -> Result<String, TokenError> {
        let now = Utc::now();
        let exp = match self.expiry {
            TokenExpiry::Never => None,
            TokenExpiry::After(duration) => Some(
                now.checked_add_signed(duration)
                    .ok_or_else(|| TokenError::Signing("expiration out of range".to_string()))?
                    .timestamp(),
            ),
        };

        let claims = Claims {
            sub: account.id,
            role: account.role,
            email: account.email.clone(),
            organization_id: account.organization_id,
            status: account.status,
            iat: now.timestamp(),
            exp,
        };

        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Checks signature and, when present, `exp` with zero leeway.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.required_spec_claims = HashSet::new();

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}
