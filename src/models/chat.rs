use chrono::{ DateTime, Local, Utc };
use serde::{ Serialize, Deserialize };

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub from: Sender,
    pub time: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Message {
            id: Utc::now().timestamp_millis().to_string(),
            text: text.into(),
            from: Sender::User,
            time: current_time(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        // Reply ids sit one millisecond after the id of the message that
        // triggered them.
        Message {
            id: (Utc::now().timestamp_millis() + 1).to_string(),
            text: text.into(),
            from: Sender::Bot,
            time: current_time(),
        }
    }
}

pub fn current_time() -> String {
    Local::now().format("%H:%M").to_string()
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatDocument {
    pub messages: Vec<Message>,
    #[serde(rename = "userEmail", skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}
