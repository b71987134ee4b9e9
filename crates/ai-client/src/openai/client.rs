use serde::{Deserialize, Serialize};

use crate::error::AiError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Wraps an OpenAI-compatible embeddings endpoint. Pointed at Voyage AI's
/// OpenAI-compatible surface in production, same as the teacher's embedder.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    embedding_model: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("reqwest client builds"),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, AiError> {
        let mut batch = self.embed_batch(std::slice::from_ref(&text.to_string())).await?;
        batch.pop().ok_or(AiError::EmptyResponse)
    }

    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AiError> {
        #[derive(Serialize)]
        struct Request<'a> {
            model: &'a str,
            input: &'a [String],
        }

        #[derive(Deserialize)]
        struct EmbeddingDatum {
            embedding: Vec<f32>,
            index: usize,
        }

        #[derive(Deserialize)]
        struct Response {
            data: Vec<EmbeddingDatum>,
        }

        let url = format!("{}/embeddings", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&Request {
                model: &self.embedding_model,
                input: texts,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Api { status, body });
        }

        let mut parsed: Response = response.json().await?;
        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}
