// Firestore REST v1 document store
// API Reference: https://cloud.google.com/firestore/docs/reference/rest/v1/projects.databases.documents
//
// Only two calls are used:
// - PATCH .../documents/{collection}/{document} without an update mask: full overwrite, upserts
// - GET   .../documents/{collection}/{document}: 404 when the document does not exist

use crate::auth::{fetch_access_token, AccessToken, ServiceAccount};
use crate::config::Config;
use crate::store::provider::{DocumentPath, DocumentStore};
use crate::store::value::Fields;
use crate::types::{ProbeError, ProbeResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const USER_AGENT: &str = concat!("firestore-probe/", env!("CARGO_PKG_VERSION"));

// Request/response body for a single document
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default)]
    fields: Fields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    create_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    update_time: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct GoogleErrorResponse {
    error: GoogleError,
}

#[derive(Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

pub struct FirestoreClient {
    client: Client,
    base_url: String,
    project_id: String,
    database: String,
    token: AccessToken,
}

impl FirestoreClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        database: impl Into<String>,
        token: AccessToken,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            database: database.into(),
            token,
        }
    }

    /// Build an authenticated client for the configured project.
    ///
    /// Against the emulator no token is requested; otherwise the service
    /// account's assertion is exchanged for an access token first.
    pub async fn connect(config: &Config, account: &ServiceAccount) -> ProbeResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProbeError::Initialization(format!("failed to build HTTP client: {}", e)))?;

        let token = if config.uses_emulator() {
            info!("Using Firestore emulator at {}", config.base_url());
            AccessToken::emulator()
        } else {
            fetch_access_token(&client, account).await?
        };

        let project_id = config
            .project_id
            .clone()
            .unwrap_or_else(|| account.project_id.clone());

        info!(
            "Firestore client ready for project {} database {}",
            project_id, config.database
        );

        Ok(Self::new(client, config.base_url(), project_id, &config.database, token))
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Resource name of a document, as the API reports it in `name`.
    pub fn document_name(&self, path: &DocumentPath) -> String {
        format!(
            "projects/{}/databases/{}/documents/{}/{}",
            self.project_id, self.database, path.collection, path.document
        )
    }

    pub fn document_url(&self, path: &DocumentPath) -> String {
        format!("{}/v1/{}", self.base_url, self.document_name(path))
    }
}

/// Turn a non-success response into a readable message,
/// preferring the structured Google error body when present.
async fn describe_failure(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    match serde_json::from_str::<GoogleErrorResponse>(&body) {
        Ok(parsed) => match parsed.error.status {
            Some(code) => format!("{} ({}): {}", code, status, parsed.error.message),
            None => format!("{}: {}", status, parsed.error.message),
        },
        Err(_) if body.is_empty() => status.to_string(),
        Err(_) => format!("{}: {}", status, body),
    }
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn set_document(&self, path: &DocumentPath, fields: &Fields) -> ProbeResult<()> {
        let url = self.document_url(path);
        debug!("PATCH {}", url);

        let body = Document {
            name: None,
            fields: fields.clone(),
            create_time: None,
            update_time: None,
        };

        let response = self
            .client
            .patch(&url)
            .bearer_auth(self.token.secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| ProbeError::Write(format!("request to {} failed: {}", path, e)))?;

        if !response.status().is_success() {
            return Err(ProbeError::Write(describe_failure(response).await));
        }

        let stored: Document = response
            .json()
            .await
            .map_err(|e| ProbeError::Write(format!("invalid response body: {}", e)))?;
        debug!("Stored {} at {:?}", path, stored.update_time);

        Ok(())
    }

    async fn get_document(&self, path: &DocumentPath) -> ProbeResult<Option<Fields>> {
        let url = self.document_url(path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.token.secret())
            .send()
            .await
            .map_err(|e| ProbeError::Read(format!("request to {} failed: {}", path, e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("{}", describe_failure(response).await);
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ProbeError::Read(describe_failure(response).await));
        }

        let document: Document = response
            .json()
            .await
            .map_err(|e| ProbeError::Read(format!("invalid response body: {}", e)))?;

        Ok(Some(document.fields))
    }
}
