//! Application constants and configuration

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default Ollama endpoint; can be overridden in settings.json
pub const OLLAMA_BASE_URL: &str = "http://127.0.0.1:11434";
pub const DEFAULT_MODEL: &str = "llama3:8b";

/// Cloud identity provider (Identity Toolkit REST API)
pub const IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";
/// Cloud document store (Firestore REST API)
pub const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Fixed id of the single local profile row
pub const PROFILE_ID: i64 = 1;

/// Seconds the splash screen stays up before navigating
pub const SPLASH_SECS: f32 = 2.0;

/// Instruction prepended to every prompt before it is sent to the model
pub const ROLE_PROMPT: &str = "Você é um assistente pessoal prestativo. \
Responda sempre em português, de forma clara e objetiva.";

pub const WELCOME_PART_ONE: &str = "Olá";
pub const WELCOME_PART_TWO: &str = "Como posso ajudar você hoje?";

/// Terminal control garbage some model runners leak into responses.
/// Everything up to the last occurrence is stripped before display.
pub const CHAT_INVALID_RESPONSE_CHARS: &str = "[?25h";
