use std::collections::HashMap;
use std::sync::Mutex;
use async_trait::async_trait;
use chrono::Utc;

use crate::auth::AuthUser;
use crate::models::chat::ChatDocument;
use super::{ ChatStore, StoreError };

/// Process-local store for offline runs and tests.
#[derive(Default)]
pub struct MemoryChatStore {
    documents: Mutex<HashMap<String, ChatDocument>>,
}

impl MemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatStore for MemoryChatStore {
    async fn load(&self, user: &AuthUser) -> Result<ChatDocument, StoreError> {
        let documents = self.documents.lock().unwrap();
        Ok(documents.get(&user.uid).cloned().unwrap_or_default())
    }

    async fn save(&self, user: &AuthUser, document: &ChatDocument) -> Result<(), StoreError> {
        let mut documents = self.documents.lock().unwrap();
        let entry = documents.entry(user.uid.clone()).or_default();
        entry.messages = document.messages.clone();
        entry.user_email = Some(user.email.clone());
        entry.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn clear(&self, user: &AuthUser) -> Result<(), StoreError> {
        self.documents.lock().unwrap().remove(&user.uid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::Message;

    fn user(uid: &str) -> AuthUser {
        AuthUser {
            uid: uid.into(),
            email: format!("{}@example.com", uid),
            id_token: "token".into(),
        }
    }

    #[tokio::test]
    async fn documents_are_kept_per_user() {
        let store = MemoryChatStore::new();
        let alice = user("alice");
        let bob = user("bob");

        let doc = ChatDocument {
            messages: vec![Message::user("hi")],
            ..Default::default()
        };
        store.save(&alice, &doc).await.unwrap();

        let loaded = store.load(&alice).await.unwrap();
        assert_eq!(loaded.messages.len(), 1);
        assert_eq!(loaded.user_email.as_deref(), Some("alice@example.com"));
        assert!(loaded.updated_at.is_some());

        assert!(store.load(&bob).await.unwrap().messages.is_empty());
    }

    #[tokio::test]
    async fn clear_removes_the_document() {
        let store = MemoryChatStore::new();
        let alice = user("alice");

        let doc = ChatDocument {
            messages: vec![Message::user("hi")],
            ..Default::default()
        };
        store.save(&alice, &doc).await.unwrap();
        store.clear(&alice).await.unwrap();

        assert!(store.load(&alice).await.unwrap().messages.is_empty());
    }

    #[tokio::test]
    async fn clearing_an_absent_document_succeeds() {
        let store = MemoryChatStore::new();
        let alice = user("alice");

        store.clear(&alice).await.unwrap();
        assert!(store.load(&alice).await.unwrap().messages.is_empty());
    }
}
