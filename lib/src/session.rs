use crate::error::ExportError::{AuthError, NotAuthenticated};
use crate::error::Result;
use crate::http::{HttpTransport, Request};

pub const TOKEN_HEADER: &str = "X-Wiz-Token";
pub const LOGIN_PATH: &str = "/as/user/login";

/// Credentials and routing values handed out by a successful login.
///
/// A `Session` never changes after login, every authenticated call
/// receives it by reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: String,
    storage_base_url: String,
    workspace_id: String,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    #[serde(rename = "userId")]
    user_id: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResult {
    token: Option<String>,
    #[serde(rename = "kbServer")]
    kb_server: Option<String>,
    #[serde(rename = "kbGuid")]
    kb_guid: Option<String>,
}

impl Session {
    /// Fails with `AuthError` unless all three values are non-empty
    pub fn new(token: &str, storage_base_url: &str, workspace_id: &str) -> Result<Session> {
        let storage_base_url = storage_base_url.trim_end_matches('/');
        if token.is_empty() || storage_base_url.is_empty() || workspace_id.is_empty() {
            return Err(AuthError("token, kbServer and kbGuid must all be present".to_string()));
        }
        Ok(Session {
            token: token.to_string(),
            storage_base_url: storage_base_url.to_string(),
            workspace_id: workspace_id.to_string(),
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn storage_base_url(&self) -> &str {
        &self.storage_base_url
    }

    pub fn workspace_id(&self) -> &str {
        &self.workspace_id
    }

    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty() && !self.storage_base_url.is_empty() && !self.workspace_id.is_empty()
    }

    pub fn ensure_authenticated(&self) -> Result<&Session> {
        if self.is_authenticated() {
            Ok(self)
        } else {
            Err(NotAuthenticated)
        }
    }

    /// `{kbServer}{prefix}/{kbGuid}`
    pub fn workspace_url(&self, prefix: &str) -> String {
        format!("{}{}/{}", self.storage_base_url, prefix, self.workspace_id)
    }

    pub fn authorize(&self, request: Request) -> Request {
        request.with_header(TOKEN_HEADER, &self.token)
    }
}

pub fn login(transport: &dyn HttpTransport, user_id: &str, password: &str, api_base_url: &str) -> Result<Session> {
    info!("Logging in as {}...", user_id);
    let url = format!("{}{}", api_base_url.trim_end_matches('/'), LOGIN_PATH);

    let request = Request::post_json(&url, &LoginRequest { user_id, password })
        .map_err(|e| AuthError(e.to_string()))?;

    let result: LoginResult = transport.send(&request)
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.result())
        .map_err(|e| AuthError(e.to_string()))?;

    match (result.token, result.kb_server, result.kb_guid) {
        (Some(token), Some(kb_server), Some(kb_guid)) => {
            let session = Session::new(&token, &kb_server, &kb_guid)?;
            info!("Login successful, storage server {}", session.storage_base_url());
            Ok(session)
        }
        _ => Err(AuthError("response is missing token, kbServer or kbGuid".to_string())),
    }
}
