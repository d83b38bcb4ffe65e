// OAuth 2.0 JWT bearer grant for service accounts
// Reference: https://developers.google.com/identity/protocols/oauth2/service-account#httprest

use super::service_account::ServiceAccount;
use crate::types::{ProbeError, ProbeResult};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, Header};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
// The emulator accepts this fixed token and grants admin rights.
const EMULATOR_TOKEN: &str = "owner";

#[derive(Debug, Serialize, Deserialize)]
struct AssertionClaims {
    iss: String,
    sub: String,
    aud: String,
    scope: String,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Bearer token for the document store.
#[derive(Clone)]
pub struct AccessToken {
    secret: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(secret: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            secret: secret.into(),
            expires_at,
        }
    }

    pub fn emulator() -> Self {
        Self::new(EMULATOR_TOKEN, None)
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Build the signed RS256 assertion presented to the token endpoint
pub fn sign_assertion(account: &ServiceAccount, now: DateTime<Utc>) -> ProbeResult<String> {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(account.private_key_id.clone());

    let iat = now.timestamp();
    let claims = AssertionClaims {
        iss: account.client_email.clone(),
        sub: account.client_email.clone(),
        aud: account.token_uri.clone(),
        scope: DATASTORE_SCOPE.to_string(),
        iat,
        exp: iat + ASSERTION_LIFETIME_SECS,
    };

    encode(&header, &claims, account.signing_key())
        .map_err(|e| ProbeError::Credential(format!("failed to sign assertion: {}", e)))
}

/// Exchange a signed assertion for an access token.
///
/// A rejection by the token endpoint means the credential itself is not
/// authorized and is reported as a credential failure; anything else
/// (transport errors, server errors, unreadable bodies) is an
/// initialization failure.
pub async fn fetch_access_token(client: &Client, account: &ServiceAccount) -> ProbeResult<AccessToken> {
    let now = Utc::now();
    let assertion = sign_assertion(account, now)?;

    info!("Requesting access token for {}", account.client_email);

    let response = client
        .post(&account.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await
        .map_err(|e| ProbeError::Initialization(format!("token request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let detail = match serde_json::from_str::<TokenErrorResponse>(&body) {
            Ok(err) => match err.error_description {
                Some(desc) => format!("{}: {}", err.error, desc),
                None => err.error,
            },
            Err(_) => body,
        };

        return Err(match status {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ProbeError::Credential(format!("token endpoint rejected credential ({}): {}", status, detail))
            }
            _ => ProbeError::Initialization(format!("token endpoint returned {}: {}", status, detail)),
        });
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| ProbeError::Initialization(format!("invalid token response: {}", e)))?;

    // Out-of-range lifetimes leave the expiry unknown.
    let expires_at = token
        .expires_in
        .and_then(Duration::try_seconds)
        .and_then(|lifetime| now.checked_add_signed(lifetime));
    debug!("Access token acquired, expires at {:?}", expires_at);

    Ok(AccessToken::new(token.access_token, expires_at))
}
