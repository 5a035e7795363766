use reqwest::{ Client as HttpClient, StatusCode };
use serde_json::{ json, Value as JsonValue };
use chrono::{ DateTime, Utc };
use async_trait::async_trait;
use log::warn;

use crate::auth::AuthUser;
use crate::models::chat::{ ChatDocument, Message, Sender };
use super::{ ChatStore, StoreError };

/// Chat document store backed by the Firestore REST API. Each user owns one
/// document at `chats/{uid}`, authorized with the user's ID token.
pub struct FirestoreChatStore {
    http: HttpClient,
    base_url: String,
    project_id: String,
}

impl FirestoreChatStore {
    pub fn new(base_url: Option<String>, project_id: String) -> Self {
        let url = base_url.unwrap_or_else(|| "https://firestore.googleapis.com".into());

        Self {
            http: HttpClient::new(),
            base_url: url,
            project_id,
        }
    }

    fn document_name(&self, uid: &str) -> String {
        format!(
            "projects/{}/databases/(default)/documents/chats/{}",
            self.project_id,
            uid
        )
    }

    fn document_url(&self, uid: &str) -> String {
        format!("{}/v1/{}", self.base_url, self.document_name(uid))
    }

    fn commit_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents:commit",
            self.base_url,
            self.project_id
        )
    }
}

#[async_trait]
impl ChatStore for FirestoreChatStore {
    async fn load(&self, user: &AuthUser) -> Result<ChatDocument, StoreError> {
        let resp = self.http
            .get(&self.document_url(&user.uid))
            .bearer_auth(&user.id_token)
            .send().await?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(ChatDocument::default()),
            StatusCode::OK => {
                let root = resp.json::<JsonValue>().await?;
                Ok(decode_document(&root))
            }
            status => {
                let body = resp.text().await.unwrap_or_default();
                Err(StoreError::Status { status, body })
            }
        }
    }

    async fn save(&self, user: &AuthUser, document: &ChatDocument) -> Result<(), StoreError> {
        // A masked commit only touches the listed fields, and the transform
        // stamps `updatedAt` with the server's clock.
        let body = json!({
            "writes": [{
                "update": {
                    "name": self.document_name(&user.uid),
                    "fields": {
                        "messages": encode_messages(&document.messages),
                        "userEmail": string_value(&user.email),
                    },
                },
                "updateMask": { "fieldPaths": ["messages", "userEmail"] },
                "updateTransforms": [{
                    "fieldPath": "updatedAt",
                    "setToServerValue": "REQUEST_TIME",
                }],
            }],
        });

        let resp = self.http
            .post(&self.commit_url())
            .bearer_auth(&user.id_token)
            .json(&body)
            .send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Status { status, body });
        }
        Ok(())
    }

    async fn clear(&self, user: &AuthUser) -> Result<(), StoreError> {
        let resp = self.http
            .delete(&self.document_url(&user.uid))
            .bearer_auth(&user.id_token)
            .send().await?;

        match resp.status() {
            status if status.is_success() || status == StatusCode::NOT_FOUND => Ok(()),
            status => {
                let body = resp.text().await.unwrap_or_default();
                Err(StoreError::Status { status, body })
            }
        }
    }
}

fn string_value(s: &str) -> JsonValue {
    json!({ "stringValue": s })
}

fn encode_message(message: &Message) -> JsonValue {
    json!({
        "mapValue": {
            "fields": {
                "id": string_value(&message.id),
                "text": string_value(&message.text),
                "from": string_value(message.from.as_str()),
                "time": string_value(&message.time),
            },
        },
    })
}

fn encode_messages(messages: &[Message]) -> JsonValue {
    let values: Vec<JsonValue> = messages.iter().map(encode_message).collect();
    json!({ "arrayValue": { "values": values } })
}

fn field_str<'a>(fields: &'a JsonValue, name: &str) -> Option<&'a str> {
    fields.get(name)?.get("stringValue")?.as_str()
}

fn decode_message(value: &JsonValue) -> Option<Message> {
    let fields = value.get("mapValue")?.get("fields")?;
    let from = match field_str(fields, "from")? {
        "user" => Sender::User,
        "bot" => Sender::Bot,
        _ => {
            return None;
        }
    };

    Some(Message {
        id: field_str(fields, "id")?.to_string(),
        text: field_str(fields, "text")?.to_string(),
        from,
        time: field_str(fields, "time")?.to_string(),
    })
}

fn decode_document(root: &JsonValue) -> ChatDocument {
    let fields = match root.get("fields") {
        Some(fields) => fields,
        None => {
            return ChatDocument::default();
        }
    };

    let mut messages = Vec::new();
    if let Some(values) = fields
        .get("messages")
        .and_then(|m| m.get("arrayValue"))
        .and_then(|a| a.get("values"))
        .and_then(|v| v.as_array())
    {
        for value in values {
            match decode_message(value) {
                Some(message) => messages.push(message),
                None => warn!("Skipping malformed message entry in chat document"),
            }
        }
    }

    let user_email = fields
        .get("userEmail")
        .and_then(|v| v.get("stringValue"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    let updated_at = fields
        .get("updatedAt")
        .and_then(|v| v.get("timestampValue"))
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc));

    ChatDocument { messages, user_email, updated_at }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{ body_json, header, method, path };
    use wiremock::{ Mock, MockServer, ResponseTemplate };

    fn store(server: &MockServer) -> FirestoreChatStore {
        FirestoreChatStore::new(Some(server.uri()), "test-proj".into())
    }

    fn user() -> AuthUser {
        AuthUser {
            uid: "uid-1".into(),
            email: "a@b.c".into(),
            id_token: "jwt-1".into(),
        }
    }

    fn message(id: &str, text: &str, from: &str, time: &str) -> JsonValue {
        json!({
            "mapValue": {
                "fields": {
                    "id": { "stringValue": id },
                    "text": { "stringValue": text },
                    "from": { "stringValue": from },
                    "time": { "stringValue": time },
                },
            },
        })
    }

    #[tokio::test]
    async fn load_decodes_messages_and_skips_malformed_entries() {
        let server = MockServer::start().await;
        let broken = json!({
            "mapValue": { "fields": { "id": { "stringValue": "2" } } },
        });
        Mock::given(method("GET"))
            .and(path("/v1/projects/test-proj/databases/(default)/documents/chats/uid-1"))
            .and(header("authorization", "Bearer jwt-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "projects/test-proj/databases/(default)/documents/chats/uid-1",
                "fields": {
                    "messages": {
                        "arrayValue": {
                            "values": [
                                message("1", "Hello", "user", "12:00"),
                                broken,
                                message("3", "Hi!", "bot", "12:01"),
                            ],
                        },
                    },
                    "userEmail": { "stringValue": "a@b.c" },
                    "updatedAt": { "timestampValue": "2025-04-01T12:01:30.000Z" },
                },
                "createTime": "2025-04-01T11:00:00.000Z",
                "updateTime": "2025-04-01T12:01:30.000Z",
            })))
            .mount(&server)
            .await;

        let doc = store(&server).load(&user()).await.unwrap();
        assert_eq!(doc.messages.len(), 2);
        assert_eq!(doc.messages[0].text, "Hello");
        assert_eq!(doc.messages[1].from, Sender::Bot);
        assert_eq!(doc.user_email.as_deref(), Some("a@b.c"));
        assert!(doc.updated_at.is_some());
    }

    #[tokio::test]
    async fn absent_document_loads_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/projects/test-proj/databases/(default)/documents/chats/uid-1"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": { "code": 404, "message": "Document not found", "status": "NOT_FOUND" },
            })))
            .mount(&server)
            .await;

        let doc = store(&server).load(&user()).await.unwrap();
        assert!(doc.messages.is_empty());
        assert_eq!(doc, ChatDocument::default());
    }

    #[tokio::test]
    async fn save_commits_masked_fields_with_a_server_timestamp() {
        let server = MockServer::start().await;
        let expected = json!({
            "writes": [{
                "update": {
                    "name": "projects/test-proj/databases/(default)/documents/chats/uid-1",
                    "fields": {
                        "messages": {
                            "arrayValue": {
                                "values": [message("1", "Hello", "user", "12:00")],
                            },
                        },
                        "userEmail": { "stringValue": "a@b.c" },
                    },
                },
                "updateMask": { "fieldPaths": ["messages", "userEmail"] },
                "updateTransforms": [{
                    "fieldPath": "updatedAt",
                    "setToServerValue": "REQUEST_TIME",
                }],
            }],
        });
        Mock::given(method("POST"))
            .and(path("/v1/projects/test-proj/databases/(default)/documents:commit"))
            .and(header("authorization", "Bearer jwt-1"))
            .and(body_json(expected))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "writeResults": [{ "updateTime": "2025-04-01T12:02:00.000Z" }],
                "commitTime": "2025-04-01T12:02:00.000Z",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let doc = ChatDocument {
            messages: vec![Message {
                id: "1".into(),
                text: "Hello".into(),
                from: Sender::User,
                time: "12:00".into(),
            }],
            ..Default::default()
        };
        store(&server).save(&user(), &doc).await.unwrap();
    }

    #[tokio::test]
    async fn clear_deletes_the_document() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/projects/test-proj/databases/(default)/documents/chats/uid-1"))
            .and(header("authorization", "Bearer jwt-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        store(&server).clear(&user()).await.unwrap();
    }

    #[tokio::test]
    async fn clearing_an_absent_document_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/projects/test-proj/databases/(default)/documents/chats/uid-1"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": { "code": 404, "message": "Document not found", "status": "NOT_FOUND" },
            })))
            .mount(&server)
            .await;

        store(&server).clear(&user()).await.unwrap();
    }

    #[tokio::test]
    async fn denied_write_surfaces_the_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/projects/test-proj/databases/(default)/documents:commit"))
            .respond_with(ResponseTemplate::new(403).set_body_string("permission denied"))
            .mount(&server)
            .await;

        let err = store(&server).save(&user(), &ChatDocument::default()).await.unwrap_err();
        match err {
            StoreError::Status { status, body } => {
                assert_eq!(status, StatusCode::FORBIDDEN);
                assert_eq!(body, "permission denied");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
