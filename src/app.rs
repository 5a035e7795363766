use std::error::Error;
use std::io::{ self, Write };
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use log::info;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::auth::{ AuthError, AuthGateway };
use crate::llm::CompletionClient;
use crate::models::chat::{ Message, Sender };
use crate::session::{ ChatSession, SendOutcome };
use crate::store::ChatStore;

const REDRAW_CYCLE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy)]
enum Screen {
    Login,
    Chat,
}

pub struct App {
    gateway: AuthGateway,
    store: Arc<dyn ChatStore>,
    llm: Arc<dyn CompletionClient>,
}

impl App {
    pub fn new(
        gateway: AuthGateway,
        store: Arc<dyn ChatStore>,
        llm: Arc<dyn CompletionClient>
    ) -> Self {
        Self { gateway, store, llm }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut editor = DefaultEditor::new()?;
        loop {
            let keep_going = match self.route() {
                Screen::Login => self.login_screen(&mut editor).await?,
                Screen::Chat => self.chat_screen(&mut editor).await?,
            };
            if !keep_going {
                return Ok(());
            }
        }
    }

    fn route(&self) -> Screen {
        if self.gateway.current_user().is_some() {
            Screen::Chat
        } else {
            Screen::Login
        }
    }

    /// Prompts for credentials until a user is signed in; false means quit.
    async fn login_screen(
        &self,
        editor: &mut DefaultEditor
    ) -> Result<bool, Box<dyn Error + Send + Sync>> {
        let subscription = self.gateway.subscribe();
        println!("{}", "Welcome Back".bold());
        println!("Sign in with your email, /register to create an account, /quit to exit.");

        while subscription.current().user().is_none() {
            let line = match editor.readline("email> ") {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(false),
                Err(e) => return Err(Box::new(e)),
            };
            let input = line.trim().to_string();
            if input == "/quit" {
                return Ok(false);
            }

            let register = input == "/register";
            let email = if register {
                let line = match editor.readline("new email> ") {
                    Ok(line) => line,
                    Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(false),
                    Err(e) => return Err(Box::new(e)),
                };
                line.trim().to_string()
            } else {
                input
            };

            let password = rpassword::prompt_password("password> ")?;

            let result = if register {
                self.gateway.register(&email, &password).await
            } else {
                self.gateway.sign_in(&email, &password).await
            };

            match result {
                Ok(user) => {
                    let _ = editor.add_history_entry(&email);
                    println!("{}", format!("Signed in as {}", user.email).green());
                }
                Err(AuthError::MissingCredentials) => {
                    println!("{}", AuthError::MissingCredentials.to_string().yellow());
                }
                Err(e) => println!("{}", format!("Login failed: {}", e).red()),
            }
        }
        Ok(true)
    }

    /// The signed-in conversation loop; false means quit, true re-routes.
    async fn chat_screen(
        &self,
        editor: &mut DefaultEditor
    ) -> Result<bool, Box<dyn Error + Send + Sync>> {
        let subscription = self.gateway.subscribe();
        let Some(user) = self.gateway.current_user() else {
            return Ok(true);
        };

        let session = ChatSession::new(user.clone(), self.store.clone(), self.llm.clone());
        session.load_history().await;

        println!("{}", "AI Chatbot".bold());
        println!(
            "Signed in as {}. /clear wipes the conversation, /signout returns to login, /quit exits.",
            user.email
        );
        for message in session.history() {
            print_message(&message);
        }

        while subscription.current().user().is_some() {
            let line = match editor.readline("you> ") {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(false),
                Err(e) => return Err(Box::new(e)),
            };
            // Commands match on the trimmed line; the message itself is
            // forwarded raw.
            match line.trim() {
                "" => {
                    continue;
                }
                "/quit" => {
                    return Ok(false);
                }
                "/signout" => {
                    self.gateway.sign_out();
                    info!("Signed out");
                    return Ok(true);
                }
                "/clear" => {
                    session.clear_history().await;
                    println!("(conversation cleared)");
                    continue;
                }
                _ => {}
            }
            let _ = editor.add_history_entry(line.trim());

            let send_session = session.clone();
            let text = line;
            let mut send_task = tokio::spawn(async move { send_session.send(&text).await });

            // Animate the typing indicator until the reply lands.
            let mut redraw = tokio::time::interval(REDRAW_CYCLE);
            let outcome = loop {
                tokio::select! {
                    joined = &mut send_task => break joined?,
                    _ = redraw.tick() => {
                        if let Some(frame) = session.indicator_frame() {
                            print!("\r{:<8}", frame);
                            let _ = io::stdout().flush();
                        }
                    }
                }
            };
            print!("\r{:<8}\r", "");
            let _ = io::stdout().flush();

            if let SendOutcome::Sent(reply) = outcome {
                print_message(&reply);
            }
        }
        Ok(true)
    }
}

fn print_message(message: &Message) {
    let line = format!("[{}] {}", message.time, message.text);
    match message.from {
        Sender::User => println!("{}", line.cyan()),
        Sender::Bot => println!("{}", line.green()),
    }
}
