use anyhow::{bail, Result};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_CREDENTIALS_PATH: &str = "./serviceAccountKey.json";
pub const DEFAULT_DATABASE: &str = "(default)";
pub const DEFAULT_API_URL: &str = "https://firestore.googleapis.com";

#[derive(Debug, Clone)]
pub struct Config {
    /// Service-account key file. Never versioned.
    pub credentials_path: PathBuf,
    /// Overrides the `project_id` from the credential file.
    pub project_id: Option<String>,
    pub database: String,
    /// `host:port` of a local Firestore emulator. Disables the token exchange.
    pub emulator_host: Option<String>,
    pub api_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            credentials_path: lookup("GOOGLE_APPLICATION_CREDENTIALS")
                .unwrap_or_else(|| DEFAULT_CREDENTIALS_PATH.to_string())
                .into(),
            project_id: lookup("FIRESTORE_PROJECT_ID"),
            database: lookup("FIRESTORE_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            emulator_host: lookup("FIRESTORE_EMULATOR_HOST").filter(|h| !h.trim().is_empty()),
            api_url: lookup("FIRESTORE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.credentials_path.as_os_str().is_empty() {
            bail!("credential path must not be empty");
        }
        if let Some(project) = &self.project_id {
            if project.trim().is_empty() {
                bail!("project id must not be empty when set");
            }
        }
        if let Some(host) = &self.emulator_host {
            if host.trim().is_empty() {
                bail!("emulator host must not be empty when set");
            }
        }
        if self.database.trim().is_empty() {
            bail!("database id must not be empty");
        }
        if self.api_url.trim().is_empty() {
            bail!("API base URL must not be empty");
        }
        Ok(())
    }

    /// Root of the REST API, without the `/v1` suffix.
    pub fn base_url(&self) -> String {
        match &self.emulator_host {
            Some(host) => format!("http://{}", host.trim().trim_end_matches('/')),
            None => self.api_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn uses_emulator(&self) -> bool {
        self.emulator_host.is_some()
    }
}
