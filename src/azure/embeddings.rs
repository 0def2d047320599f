use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingSettings;
use crate::error::EmbeddingError;
use crate::pipeline::Embedder;

/// Azure OpenAI embeddings client.
///
/// One deployment-scoped endpoint, `api-key` header auth. The requested
/// dimensionality is pinned at construction and every response vector is
/// checked against it, since classifier and index were built for exactly
/// that width.
pub struct AzureEmbeddingClient {
    client: reqwest::Client,
    endpoint: String,
    deployment: String,
    api_version: String,
    api_key: String,
    dimensions: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl AzureEmbeddingClient {
    pub fn new(settings: &EmbeddingSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            deployment: settings.deployment.clone(),
            api_version: settings.api_version.clone(),
            api_key: settings.api_key.clone(),
            dimensions: settings.dimensions,
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/embeddings?api-version={}",
            self.endpoint, self.deployment, self.api_version
        )
    }

    async fn request(&self, input: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let response = self
            .client
            .post(self.url())
            .header("api-key", &self.api_key)
            .json(&EmbeddingRequest {
                input,
                dimensions: self.dimensions,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbeddingResponse = response.json().await?;
        let mut vectors = Vec::with_capacity(parsed.data.len());
        for item in parsed.data {
            if item.embedding.len() != self.dimensions {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: self.dimensions,
                    got: item.embedding.len(),
                });
            }
            vectors.push(item.embedding);
        }
        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for AzureEmbeddingClient {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let input = [text.to_string()];
        let mut vectors = self.request(&input).await?;
        vectors.pop().ok_or(EmbeddingError::EmptyResponse)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let vectors = self.request(texts).await?;
        if vectors.len() != texts.len() {
            return Err(EmbeddingError::EmptyResponse);
        }
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> AzureEmbeddingClient {
        AzureEmbeddingClient::new(&EmbeddingSettings {
            endpoint: "https://example.openai.azure.com/".into(),
            api_key: "test-key".into(),
            api_version: "2024-02-01".into(),
            deployment: "text-embedding-3-small".into(),
            dimensions: 4,
        })
    }

    #[test]
    fn url_is_deployment_scoped() {
        assert_eq!(
            client().url(),
            "https://example.openai.azure.com/openai/deployments/text-embedding-3-small/embeddings?api-version=2024-02-01"
        );
    }

    #[test]
    fn response_vectors_deserialize() {
        let raw = r#"{
            "data": [
                {"embedding": [0.1, 0.2, 0.3, 0.4], "index": 0},
                {"embedding": [0.5, 0.6, 0.7, 0.8], "index": 1}
            ],
            "model": "text-embedding-3-small",
            "usage": {"prompt_tokens": 8, "total_tokens": 8}
        }"#;
        let parsed: EmbeddingResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.data.len(), 2);
        assert_eq!(parsed.data[1].embedding, vec![0.5, 0.6, 0.7, 0.8]);
    }
}
