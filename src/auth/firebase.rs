use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };
use async_trait::async_trait;
use super::{ AuthError, AuthUser, IdentityProvider };

const SIGN_IN: &str = "signInWithPassword";
const SIGN_UP: &str = "signUp";

/// Email/password client for the Firebase Identity Toolkit REST API.
#[derive(Debug)]
pub struct FirebaseAuthClient {
    http: HttpClient,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsRequest {
    email: String,
    password: String,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsResponse {
    local_id: String,
    email: String,
    id_token: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl FirebaseAuthClient {
    pub fn new(base_url: Option<String>, api_key: String) -> Self {
        let url = base_url.unwrap_or_else(|| "https://identitytoolkit.googleapis.com".into());

        Self {
            http: HttpClient::new(),
            base_url: url,
            api_key,
        }
    }

    async fn credentials_call(
        &self,
        action: &str,
        email: &str,
        password: &str
    ) -> Result<AuthUser, AuthError> {
        let url = format!("{}/v1/accounts:{}", self.base_url, action);
        let req = CredentialsRequest {
            email: email.to_string(),
            password: password.to_string(),
            return_secure_token: true,
        };
        let resp = self.http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&req)
            .send().await?;

        let status = resp.status();
        if status.is_success() {
            let data = resp.json::<CredentialsResponse>().await?;
            return Ok(AuthUser {
                uid: data.local_id,
                email: data.email,
                id_token: data.id_token,
            });
        }

        // Rejections carry a JSON body with a terse reason code; surface it
        // verbatim so the login screen can show it.
        let body = resp.text().await?;
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|parsed| parsed.error.message)
            .unwrap_or_else(|_| status.to_string());
        Err(AuthError::Provider(message))
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuthClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        self.credentials_call(SIGN_IN, email, password).await
    }

    async fn register(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        self.credentials_call(SIGN_UP, email, password).await
    }
}
