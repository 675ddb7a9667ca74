//! Common types and data structures

use crate::cloud::PromptRecord;

/// Which screen the app is currently showing
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Screen {
    Splash,
    Register,
    PasswordSetup,
    Login,
    Chat,
    History,
}

/// Authenticated cloud session (uid + bearer token), held in memory only
#[derive(Clone)]
pub struct Session {
    pub uid: String,
    pub id_token: String,
}

/// Outcome of a background auth flow (login, sign-up, password reset)
pub struct AuthOutcome {
    pub ok: bool,
    pub message: String,
    pub session: Option<Session>,
}

/// Shared state for background auth flows, polled by the update loop
#[derive(Default)]
pub struct AuthFlow {
    pub running: bool,
    pub outcome: Option<AuthOutcome>,
}

/// Shared state for an in-flight generation, streamed into by a runtime task
pub struct ChatState {
    pub generating: bool,
    pub response: String,
    pub error: Option<String>,
    pub save_result: Option<Result<String, String>>, // doc id or error message
}

impl Default for ChatState {
    fn default() -> Self {
        Self {
            generating: false,
            response: String::new(),
            error: None,
            save_result: None,
        }
    }
}

/// Shared state for the transcript history screen
#[derive(Default)]
pub struct HistoryState {
    pub loading: bool,
    pub loaded: bool,
    pub records: Vec<PromptRecord>,
    pub error: Option<String>,
}

/// Inference endpoint health, shown as a dot in the chat header
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum EndpointHealth {
    Unknown,
    Checking,
    Up,
    Down,
}

/// Model list fetched from the endpoint for the drawer picker
#[derive(Default)]
pub struct ModelsState {
    pub loading: bool,
    pub names: Vec<String>,
    pub error: Option<String>,
}
