pub mod app;
pub mod auth;
pub mod cli;
pub mod llm;
pub mod models;
pub mod session;
pub mod store;

use cli::Args;
use log::info;
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Identity Service URL: {}", args.auth_base_url);
    info!("Document Store Type: {}", args.store_type);
    info!("Document Store URL: {}", args.store_base_url);
    info!("Completion Endpoint: {}", args.chat_base_url.as_deref().unwrap_or("(default)"));
    info!("Completion Model: {}", args.chat_model.as_deref().unwrap_or("(default)"));
    info!("-------------------------");

    let gateway = auth::create_gateway(&args);
    let store = store::create_chat_store(&args)?;
    let llm = llm::new_client(args.chat_base_url.clone(), args.chat_model.clone());

    let app = app::App::new(gateway, store, llm);
    app.run().await
}
