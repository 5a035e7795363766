pub mod indicator;

use std::sync::{ Arc, Mutex };
use log::error;

use crate::auth::AuthUser;
use crate::llm::CompletionClient;
use crate::models::chat::{ ChatDocument, Message, Sender };
use crate::store::ChatStore;
use self::indicator::TypingIndicator;

pub const TRANSPORT_FALLBACK: &str = "Failed to get response from AI.";
pub const EMPTY_REPLY_FALLBACK: &str = "Something went wrong.";
pub const TYPING_ENTRY_ID: &str = "loading";

#[derive(Debug)]
pub enum SendOutcome {
    Sent(Message),
    /// Blank input, or a send already in flight. No side effects.
    Ignored,
}

struct SessionState {
    history: Vec<Message>,
    in_flight: bool,
    indicator: Option<TypingIndicator>,
}

#[derive(Clone)]
pub struct ChatSession {
    user: AuthUser,
    store: Arc<dyn ChatStore>,
    llm: Arc<dyn CompletionClient>,
    state: Arc<Mutex<SessionState>>,
}

impl ChatSession {
    pub fn new(
        user: AuthUser,
        store: Arc<dyn ChatStore>,
        llm: Arc<dyn CompletionClient>
    ) -> Self {
        Self {
            user,
            store,
            llm,
            state: Arc::new(Mutex::new(SessionState {
                history: Vec::new(),
                in_flight: false,
                indicator: None,
            })),
        }
    }

    pub async fn load_history(&self) {
        match self.store.load(&self.user).await {
            Ok(document) => {
                let mut state = self.state.lock().unwrap();
                state.history = document.messages;
            }
            Err(e) => error!("Error loading chat: {}", e),
        }
    }

    /// One exchange: append the user's message, fetch a single completion,
    /// append the reply, then persist the whole list.
    pub async fn send(&self, text: &str) -> SendOutcome {
        if text.trim().is_empty() {
            return SendOutcome::Ignored;
        }

        {
            let mut state = self.state.lock().unwrap();
            if state.in_flight {
                return SendOutcome::Ignored;
            }
            state.in_flight = true;
            state.indicator = Some(TypingIndicator::start());
            // The stored text and the forwarded prompt stay raw as typed;
            // only the emptiness check trims.
            state.history.push(Message::user(text));
        }

        let reply_text = match self.llm.complete(text).await {
            Ok(completion) => {
                let reply = completion.response.trim();
                if reply.is_empty() {
                    EMPTY_REPLY_FALLBACK.to_string()
                } else {
                    reply.to_string()
                }
            }
            Err(e) => {
                error!("Inference request failed: {}", e);
                TRANSPORT_FALLBACK.to_string()
            }
        };

        let reply = Message::bot(reply_text);
        let snapshot = {
            let mut state = self.state.lock().unwrap();
            state.history.push(reply.clone());
            state.in_flight = false;
            state.indicator = None;
            state.history.clone()
        };

        // Fallback replies are persisted like any other; a failed write only
        // leaves the remote copy one exchange behind.
        let document = ChatDocument { messages: snapshot, ..Default::default() };
        if let Err(e) = self.store.save(&self.user, &document).await {
            error!("Error saving chat: {}", e);
        }

        SendOutcome::Sent(reply)
    }

    pub async fn clear_history(&self) {
        match self.store.clear(&self.user).await {
            Ok(()) => {
                let mut state = self.state.lock().unwrap();
                state.history.clear();
            }
            Err(e) => error!("Error clearing chat: {}", e),
        }
    }

    pub fn history(&self) -> Vec<Message> {
        self.state.lock().unwrap().history.clone()
    }

    pub fn in_flight(&self) -> bool {
        self.state.lock().unwrap().in_flight
    }

    pub fn indicator_frame(&self) -> Option<String> {
        let state = self.state.lock().unwrap();
        state.indicator.as_ref().map(|i| i.frame())
    }

    /// The list as rendered: history plus, while a reply is pending, a
    /// trailing typing entry that is never persisted.
    pub fn visible_messages(&self) -> Vec<Message> {
        let state = self.state.lock().unwrap();
        let mut messages = state.history.clone();
        if let Some(indicator) = &state.indicator {
            messages.push(Message {
                id: TYPING_ENTRY_ID.to_string(),
                text: indicator.frame(),
                from: Sender::Bot,
                time: String::new(),
            });
        }
        messages
    }
}
