use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use crate::resume::scope::KnowledgeScope;
use crate::upstream::{http_client, status_error, UpstreamError};

#[derive(Debug, Serialize)]
struct CraftRequest<'a> {
    job_description: &'a str,
    knowledge_scope: Vec<&'static str>,
}

/// Client for the résumé-crafting service. Its response is the ingestion payload.
#[derive(Clone)]
pub struct CraftClient {
    client: Client,
    base_url: String,
}

impl CraftClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, UpstreamError> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/craft", self.base_url)
    }

    /// Returns the raw payload; decoding its loose shape is the ingestion pipeline's job.
    pub async fn craft(
        &self,
        job_description: &str,
        scope: KnowledgeScope,
    ) -> Result<serde_json::Value, UpstreamError> {
        let body = CraftRequest {
            job_description,
            knowledge_scope: scope.tags(),
        };
        let response = self.client.post(self.endpoint()).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!("Craft service returned {status}");
            return Err(status_error(status, text));
        }
        let text = response.text().await?;
        debug!("Craft service returned {} bytes", text.len());
        Ok(serde_json::from_str(&text)?)
    }
}
