//! Nomad HTTP client.
//!
//! API Documentation: <https://developer.hashicorp.com/nomad/api-docs>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::NomadApi;
use crate::error::NomadError;
use crate::models::{Allocation, Evaluation, Job};

/// Default Nomad agent address.
pub const DEFAULT_NOMAD_URL: &str = "http://localhost:4646";

/// Header carrying the ACL token.
const TOKEN_HEADER: &str = "X-Nomad-Token";

/// Configuration for the Nomad client
#[derive(Debug, Clone)]
pub struct NomadConfig {
    /// Base URL of a Nomad agent
    pub base_url: String,
    /// Optional ACL token
    pub token: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for NomadConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("NOMAD_ADDR").unwrap_or_else(|_| DEFAULT_NOMAD_URL.to_string()),
            token: std::env::var("NOMAD_TOKEN").ok().filter(|t| !t.is_empty()),
            timeout_secs: 10,
        }
    }
}

/// Nomad client backed by reqwest.
#[derive(Debug, Clone)]
pub struct NomadClient {
    config: NomadConfig,
    client: Client,
}

impl NomadClient {
    /// Create a new Nomad client with the given configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: NomadConfig) -> Result<Self, NomadError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// GET `path` and decode the JSON body.
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, NomadError> {
        let url = format!("{}{path}", self.config.base_url.trim_end_matches('/'));
        debug!(url = %url, "GET request");

        let mut request = self.client.get(&url);
        if let Some(token) = &self.config.token {
            request = request.header(TOKEN_HEADER, token);
        }

        let response = request.send().await.map_err(|source| NomadError::Connect {
            endpoint: path.to_string(),
            source,
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|source| NomadError::Connect {
            endpoint: path.to_string(),
            source,
        })?;

        if !status.is_success() {
            warn!(endpoint = %path, status = %status, body = %text, "Nomad request failed");
            return Err(NomadError::Api {
                endpoint: path.to_string(),
                status: status.as_u16(),
                body: text.trim().to_string(),
            });
        }

        serde_json::from_str(&text).map_err(|source| {
            warn!(endpoint = %path, error = %source, "Failed to parse Nomad response");
            NomadError::Decode {
                endpoint: path.to_string(),
                source,
            }
        })
    }
}

#[async_trait]
impl NomadApi for NomadClient {
    async fn list_jobs(&self) -> Result<Vec<Job>, NomadError> {
        self.get("/v1/jobs").await
    }

    async fn list_evaluations(&self, job_id: &str) -> Result<Vec<Evaluation>, NomadError> {
        self.get(&format!("/v1/job/{}/evaluations", urlencoding::encode(job_id)))
            .await
    }

    async fn list_allocations(&self, job_id: &str) -> Result<Vec<Allocation>, NomadError> {
        self.get(&format!("/v1/job/{}/allocations", urlencoding::encode(job_id)))
            .await
    }

    async fn leader(&self) -> Result<String, NomadError> {
        // The body is a bare JSON string such as "10.0.0.5:4647".
        self.get("/v1/status/leader").await
    }
}
