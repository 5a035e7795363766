use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Identity Service Args ---
    /// Base URL for the identity service REST API
    #[arg(
        long,
        env = "AUTH_BASE_URL",
        default_value = "https://identitytoolkit.googleapis.com"
    )]
    pub auth_base_url: String,

    /// Web API key sent with every identity request
    #[arg(long, env = "AUTH_API_KEY", default_value = "")]
    pub auth_api_key: String,

    // --- Chat Document Store Args ---
    /// Chat document store type (firestore, memory)
    #[arg(long, env = "STORE_TYPE", default_value = "firestore")]
    pub store_type: String,

    /// Base URL for the document store REST API
    #[arg(long, env = "STORE_BASE_URL", default_value = "https://firestore.googleapis.com")]
    pub store_base_url: String,

    /// Project id owning the chat documents (required for firestore)
    #[arg(long, env = "STORE_PROJECT_ID")]
    pub store_project_id: Option<String>,

    // --- Inference Endpoint Args ---
    /// Base URL for the completion endpoint (e.g., http://localhost:11434 for Ollama)
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let the client fall back
    pub chat_base_url: Option<String>,

    /// Model name for chat completion (e.g., llama3.2)
    #[arg(long, env = "CHAT_MODEL")] // No default, rely on the client default
    pub chat_model: Option<String>,
}
