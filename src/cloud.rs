//! Cloud identity and transcript store clients
//!
//! REST wrappers over the managed identity provider (Identity Toolkit) and
//! the per-user transcript document store (Firestore). The app only supplies
//! configuration and glue; sessions are kept in memory with no token refresh.

use crate::constants::{FIRESTORE_BASE_URL, IDENTITY_BASE_URL};
use crate::types::Session;
use chrono::{DateTime, Utc};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum CloudError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Vendor auth error code, e.g. EMAIL_NOT_FOUND or INVALID_PASSWORD
    #[error("auth error: {0}")]
    Auth(String),

    #[error("API error: {0}")]
    Api(String),
}

/// Map a cloud failure to the user-facing message shown in toasts.
pub fn user_message(err: &CloudError) -> String {
    match err {
        CloudError::Auth(code) => {
            let code = code.as_str();
            if code.starts_with("INVALID_PASSWORD") {
                "Senha incorreta".to_string()
            } else if code.starts_with("INVALID_LOGIN_CREDENTIALS") {
                "Credenciais inválidas".to_string()
            } else if code.starts_with("EMAIL_NOT_FOUND") || code.starts_with("USER_DISABLED") {
                "Usuário não encontrado ou desabilitado".to_string()
            } else if code.starts_with("EMAIL_EXISTS") {
                "Email já está em uso".to_string()
            } else if code.starts_with("WEAK_PASSWORD") {
                "Senha fraca".to_string()
            } else {
                format!("Erro de autenticação: {}", code)
            }
        }
        other => other.to_string(),
    }
}

/// One persisted prompt/response exchange
#[derive(Debug, Clone)]
pub struct PromptRecord {
    pub id: String,
    pub user_id: String,
    pub prompt: String,
    pub response: String,
    pub created_at: Option<DateTime<Utc>>,
}

// ============================================================================
// IDENTITY PROVIDER
// ============================================================================

/// Client for the managed identity provider (sign-in, sign-up, reset)
pub struct CloudAuth {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(serde::Deserialize)]
struct AuthResponse {
    #[serde(rename = "localId")]
    local_id: String,
    #[serde(rename = "idToken")]
    id_token: String,
}

impl CloudAuth {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(IDENTITY_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, CloudError> {
        let body = json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });
        let response = self.post_account("signInWithPassword", &body).await?;
        let auth: AuthResponse = serde_json::from_value(response)?;
        debug!(uid = %auth.local_id, "Cloud sign-in ok");
        Ok(Session {
            uid: auth.local_id,
            id_token: auth.id_token,
        })
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session, CloudError> {
        let body = json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });
        let response = self.post_account("signUp", &body).await?;
        let auth: AuthResponse = serde_json::from_value(response)?;
        debug!(uid = %auth.local_id, "Cloud sign-up ok");
        Ok(Session {
            uid: auth.local_id,
            id_token: auth.id_token,
        })
    }

    pub async fn send_password_reset(&self, email: &str) -> Result<(), CloudError> {
        let body = json!({
            "requestType": "PASSWORD_RESET",
            "email": email,
        });
        self.post_account("sendOobCode", &body).await?;
        Ok(())
    }

    async fn post_account(
        &self,
        operation: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, CloudError> {
        let url = format!(
            "{}/accounts:{}?key={}",
            self.base_url, operation, self.api_key
        );
        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let code = extract_error_code(&text).unwrap_or_else(|| format!("HTTP {}", status));
            warn!(operation = operation, code = %code, "Identity request failed");
            return Err(CloudError::Auth(code));
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Pull the vendor error code out of an identity error body:
/// `{"error": {"code": 400, "message": "EMAIL_NOT_FOUND"}}`
fn extract_error_code(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

// ============================================================================
// TRANSCRIPT STORE
// ============================================================================

/// Client for the per-user transcript collection (`users/{uid}/prompts`)
pub struct PromptStore {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
}

impl PromptStore {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self::with_base_url(FIRESTORE_BASE_URL, project_id)
    }

    pub fn with_base_url(base_url: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            project_id: project_id.into(),
        }
    }

    fn prompts_url(&self, uid: &str) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/users/{}/prompts",
            self.base_url, self.project_id, uid
        )
    }

    /// Save one exchange for the session user. Returns the created document id.
    pub async fn save_prompt(
        &self,
        session: &Session,
        record: &PromptRecord,
    ) -> Result<String, CloudError> {
        if record.user_id.trim().is_empty() {
            return Err(CloudError::Api("userId required".to_string()));
        }
        let response = self
            .client
            .post(self.prompts_url(&record.user_id))
            .bearer_auth(&session.id_token)
            .json(&encode_fields(record))
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            warn!(status = %status, "save_prompt failed");
            return Err(CloudError::Api(format!("HTTP {}", status)));
        }
        let value: serde_json::Value = serde_json::from_str(&text)?;
        let id = document_id(&value).unwrap_or_default();
        debug!(doc_id = %id, "Saved prompt");
        Ok(id)
    }

    /// Fetch the session user's transcript, newest first.
    pub async fn list_prompts(&self, session: &Session) -> Result<Vec<PromptRecord>, CloudError> {
        let response = self
            .client
            .get(self.prompts_url(&session.uid))
            .bearer_auth(&session.id_token)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(CloudError::Api(format!("HTTP {}", status)));
        }
        let value: serde_json::Value = serde_json::from_str(&text)?;
        let mut records: Vec<PromptRecord> = value
            .get("documents")
            .and_then(|d| d.as_array())
            .map(|docs| docs.iter().filter_map(decode_document).collect())
            .unwrap_or_default();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}

/// Encode a record as a document-store write body
fn encode_fields(record: &PromptRecord) -> serde_json::Value {
    let created_at = record.created_at.unwrap_or_else(Utc::now);
    json!({
        "fields": {
            "userId": { "stringValue": record.user_id },
            "prompt": { "stringValue": record.prompt },
            "response": { "stringValue": record.response },
            "createdAt": { "timestampValue": created_at.to_rfc3339() },
        }
    })
}

/// Decode one document-store document into a record
fn decode_document(doc: &serde_json::Value) -> Option<PromptRecord> {
    let fields = doc.get("fields")?;
    let string_field = |name: &str| -> String {
        fields
            .get(name)
            .and_then(|f| f.get("stringValue"))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };
    let created_at = fields
        .get("createdAt")
        .and_then(|f| f.get("timestampValue"))
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));
    Some(PromptRecord {
        id: document_id(doc).unwrap_or_default(),
        user_id: string_field("userId"),
        prompt: string_field("prompt"),
        response: string_field("response"),
        created_at,
    })
}

/// Last path segment of the document resource name
fn document_id(doc: &serde_json::Value) -> Option<String> {
    doc.get("name")?
        .as_str()?
        .rsplit('/')
        .next()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn auth_error_codes_map_to_user_messages() {
        assert_eq!(
            user_message(&CloudError::Auth("INVALID_PASSWORD".into())),
            "Senha incorreta"
        );
        assert_eq!(
            user_message(&CloudError::Auth("INVALID_LOGIN_CREDENTIALS".into())),
            "Credenciais inválidas"
        );
        assert_eq!(
            user_message(&CloudError::Auth("EMAIL_NOT_FOUND".into())),
            "Usuário não encontrado ou desabilitado"
        );
        assert_eq!(
            user_message(&CloudError::Auth("EMAIL_EXISTS".into())),
            "Email já está em uso"
        );
        // vendor appends detail after a colon for some codes
        assert_eq!(
            user_message(&CloudError::Auth(
                "WEAK_PASSWORD : Password should be at least 6 characters".into()
            )),
            "Senha fraca"
        );
        assert_eq!(
            user_message(&CloudError::Auth("TOKEN_EXPIRED".into())),
            "Erro de autenticação: TOKEN_EXPIRED"
        );
    }

    #[test]
    fn error_code_extraction() {
        let body = r#"{"error":{"code":400,"message":"EMAIL_NOT_FOUND","errors":[]}}"#;
        assert_eq!(extract_error_code(body).as_deref(), Some("EMAIL_NOT_FOUND"));
        assert_eq!(extract_error_code("not json"), None);
        assert_eq!(extract_error_code("{}"), None);
    }

    #[test]
    fn record_encode_decode_roundtrip() {
        let created = Utc.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap();
        let record = PromptRecord {
            id: String::new(),
            user_id: "uid-123".into(),
            prompt: "Qual a capital do Brasil?".into(),
            response: "Brasília.".into(),
            created_at: Some(created),
        };

        let mut doc = encode_fields(&record);
        doc["name"] = json!("projects/p/databases/(default)/documents/users/uid-123/prompts/abc42");

        let decoded = decode_document(&doc).unwrap();
        assert_eq!(decoded.id, "abc42");
        assert_eq!(decoded.user_id, "uid-123");
        assert_eq!(decoded.prompt, "Qual a capital do Brasil?");
        assert_eq!(decoded.response, "Brasília.");
        assert_eq!(decoded.created_at, Some(created));
    }

    #[test]
    fn decode_tolerates_missing_fields() {
        let doc = json!({
            "name": "projects/p/databases/(default)/documents/users/u/prompts/x1",
            "fields": { "prompt": { "stringValue": "oi" } }
        });
        let decoded = decode_document(&doc).unwrap();
        assert_eq!(decoded.id, "x1");
        assert_eq!(decoded.prompt, "oi");
        assert_eq!(decoded.response, "");
        assert_eq!(decoded.created_at, None);
    }

    #[test]
    fn newest_first_ordering() {
        let at = |h| Utc.with_ymd_and_hms(2025, 3, 14, h, 0, 0).unwrap();
        let mut records = vec![
            PromptRecord {
                id: "a".into(),
                user_id: "u".into(),
                prompt: String::new(),
                response: String::new(),
                created_at: Some(at(8)),
            },
            PromptRecord {
                id: "b".into(),
                user_id: "u".into(),
                prompt: String::new(),
                response: String::new(),
                created_at: Some(at(12)),
            },
            PromptRecord {
                id: "c".into(),
                user_id: "u".into(),
                prompt: String::new(),
                response: String::new(),
                created_at: None,
            },
        ];
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }
}
