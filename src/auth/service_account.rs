//! Service-account credential loading
//!
//! Reads the JSON key file issued by the Google Cloud console and parses the
//! embedded RSA private key into a signing key. Everything here happens
//! locally: a bad file fails before any network call is made.

use crate::types::{ProbeError, ProbeResult};
use jsonwebtoken::EncodingKey;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use tokio::fs;
use tracing::debug;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const SERVICE_ACCOUNT_TYPE: &str = "service_account";

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Raw key file layout. Extra fields (`client_id`, `auth_uri`, ...) are ignored.
#[derive(Deserialize)]
struct KeyFile {
    #[serde(rename = "type")]
    account_type: String,
    project_id: String,
    private_key_id: String,
    private_key: String,
    client_email: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

/// A loaded service-account identity with a ready-to-use signing key.
#[derive(Clone)]
pub struct ServiceAccount {
    pub project_id: String,
    pub client_email: String,
    pub private_key_id: String,
    pub token_uri: String,
    signing_key: EncodingKey,
}

impl ServiceAccount {
    /// Load and validate a key file from disk
    pub async fn from_file(path: impl AsRef<Path>) -> ProbeResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await.map_err(|e| {
            ProbeError::Credential(format!("cannot read {}: {}", path.display(), e))
        })?;

        let account = Self::from_json(&content)?;
        debug!(
            "Loaded service account {} for project {}",
            account.client_email, account.project_id
        );
        Ok(account)
    }

    /// Parse a key file already in memory
    pub fn from_json(content: &str) -> ProbeResult<Self> {
        let key: KeyFile = serde_json::from_str(content)
            .map_err(|e| ProbeError::Credential(format!("malformed key file: {}", e)))?;

        if key.account_type != SERVICE_ACCOUNT_TYPE {
            return Err(ProbeError::Credential(format!(
                "expected a {} key, found type {:?}",
                SERVICE_ACCOUNT_TYPE, key.account_type
            )));
        }

        for (name, value) in [
            ("project_id", &key.project_id),
            ("private_key_id", &key.private_key_id),
            ("client_email", &key.client_email),
            ("token_uri", &key.token_uri),
        ] {
            if value.trim().is_empty() {
                return Err(ProbeError::Credential(format!("{} is empty", name)));
            }
        }

        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| ProbeError::Credential(format!("invalid private key: {}", e)))?;

        Ok(Self {
            project_id: key.project_id,
            client_email: key.client_email,
            private_key_id: key.private_key_id,
            token_uri: key.token_uri,
            signing_key,
        })
    }

    pub(crate) fn signing_key(&self) -> &EncodingKey {
        &self.signing_key
    }
}

// Key material stays out of logs.
impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}
