use chrono::{Months, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Key under which the authenticated username travels in the claims data.
pub const ACTIVE_USER_CLAIM: &str = "activeUser";

const ALGORITHM: Algorithm = Algorithm::HS256;

pub type ClaimsData = Map<String, Value>;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    data: ClaimsData,
    iss: String,
    exp: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    /// Bad signature, wrong algorithm, wrong issuer, expired or malformed. Deliberately
    /// one variant so callers cannot tell the cases apart.
    #[error("invalid token")]
    Invalid,

    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Issues and verifies self-contained HS256 bearer tokens.
///
/// The secret is injected at construction; building a service with another secret is
/// key rotation, and every token issued under the old one stops parsing.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    lifetime_months: u32,
}

impl TokenService {
    pub fn new(secret: &[u8], issuer: impl Into<String>, lifetime_months: u32) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer: issuer.into(),
            lifetime_months,
        }
    }

    /// Expiry for a token issued now: the configured number of calendar months ahead.
    pub fn default_expiry(&self) -> i64 {
        let now = Utc::now();
        now.checked_add_months(Months::new(self.lifetime_months))
            .unwrap_or(now)
            .timestamp()
    }

    pub fn issue(&self, data: &ClaimsData, expires_at: i64) -> Result<String, TokenError> {
        let claims = Claims {
            data: data.clone(),
            iss: self.issuer.clone(),
            exp: expires_at,
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Convenience for the login flow: a token carrying only the active username.
    pub fn issue_for_user(&self, username: &str) -> Result<String, TokenError> {
        let mut data = ClaimsData::new();
        data.insert(ACTIVE_USER_CLAIM.to_string(), Value::String(username.to_string()));
        self.issue(&data, self.default_expiry())
    }

    pub fn parse(&self, token: &str) -> Result<ClaimsData, TokenError> {
        // Only the algorithm we sign with is accepted, whatever the header claims.
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!("Token rejected: {}", e);
            TokenError::Invalid
        })?;

        // The library accepts exp == now; a token is already dead at its expiry second.
        if token_data.claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Invalid);
        }

        Ok(token_data.claims.data)
    }
}

/// Reads the active username out of parsed claims, type-checking the open map.
pub fn active_user(claims: &ClaimsData) -> Option<&str> {
    claims.get(ACTIVE_USER_CLAIM).and_then(Value::as_str)
}
