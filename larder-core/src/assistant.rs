//! Generative-AI assistant port.
//!
//! Receipt parsing and natural-language food search are consumed as
//! opaque request/response calls against an external service; nothing in
//! this crate inspects or depends on the model behind the endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// A receipt as extracted from raw text by the assistant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedReceipt {
    pub store_name: String,
    /// ISO date string when the assistant could find one.
    pub purchased_at: Option<String>,
    pub total: Option<f64>,
    pub items: Vec<ParsedLine>,
}

/// One extracted line item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedLine {
    pub name: String,
    pub quantity: f64,
    pub price: Option<f64>,
}

/// External AI service consumed as an opaque collaborator.
#[async_trait]
pub trait Assistant: Send + Sync {
    /// Extract structured purchase data from raw receipt text.
    async fn parse_receipt(&self, text: &str) -> ApiResult<ParsedReceipt>;

    /// Rank the given food names against a natural-language query,
    /// best matches first.
    async fn search(&self, query: &str, names: &[String]) -> ApiResult<Vec<String>>;
}

/// HTTP implementation posting JSON to a configured endpoint.
#[derive(Debug, Clone)]
pub struct HttpAssistant {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpAssistant {
    pub fn new(endpoint: &str, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    async fn post<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let url = format!("{}{}", self.endpoint, path);
        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Assistant(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Assistant(format!(
                "status {}: {}",
                status, message
            )));
        }
        response
            .json()
            .await
            .map_err(|e| ApiError::Assistant(e.to_string()))
    }
}

#[async_trait]
impl Assistant for HttpAssistant {
    async fn parse_receipt(&self, text: &str) -> ApiResult<ParsedReceipt> {
        #[derive(Serialize)]
        struct Body<'a> {
            text: &'a str,
        }
        self.post("/parse-receipt", &Body { text }).await
    }

    async fn search(&self, query: &str, names: &[String]) -> ApiResult<Vec<String>> {
        #[derive(Serialize)]
        struct Body<'a> {
            query: &'a str,
            names: &'a [String],
        }
        #[derive(Deserialize)]
        struct Ranked {
            matches: Vec<String>,
        }
        let ranked: Ranked = self.post("/search", &Body { query, names }).await?;
        Ok(ranked.matches)
    }
}
