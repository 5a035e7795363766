pub mod firestore;
pub mod memory;

use async_trait::async_trait;
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

use crate::auth::AuthUser;
use crate::cli::Args;
use crate::models::chat::ChatDocument;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("store request returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Per-user persistence for one chat document.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// A user with no saved document gets an empty one.
    async fn load(&self, user: &AuthUser) -> Result<ChatDocument, StoreError>;

    async fn save(&self, user: &AuthUser, document: &ChatDocument) -> Result<(), StoreError>;

    async fn clear(&self, user: &AuthUser) -> Result<(), StoreError>;
}

pub fn create_chat_store(
    args: &Args
) -> Result<Arc<dyn ChatStore>, Box<dyn StdError + Send + Sync>> {
    match args.store_type.to_lowercase().as_str() {
        "firestore" => {
            let project_id = args.store_project_id
                .clone()
                .ok_or("STORE_PROJECT_ID is required for the firestore store")?;
            let store = firestore::FirestoreChatStore::new(
                Some(args.store_base_url.clone()),
                project_id
            );
            Ok(Arc::new(store))
        }
        "memory" => Ok(Arc::new(memory::MemoryChatStore::new())),
        _ =>
            Err(
                Box::new(
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("Unsupported chat store type: {}", args.store_type)
                    )
                )
            ),
    }
}
