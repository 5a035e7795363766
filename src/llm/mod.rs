pub mod ollama;

use async_trait::async_trait;
use serde::Deserialize;
use std::error::Error as StdError;
use std::sync::Arc;

use self::ollama::OllamaClient;

#[derive(Deserialize, Debug, Clone)]
pub struct CompletionResponse {
    pub response: String,
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        prompt: &str
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>>;
}

pub fn new_client(
    base_url: Option<String>,
    completion_model: Option<String>
) -> Arc<dyn CompletionClient> {
    Arc::new(OllamaClient::new(base_url, completion_model))
}
