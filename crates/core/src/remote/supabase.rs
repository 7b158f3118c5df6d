//! Hosted backend client
//!
//! Talks to a Supabase project: GoTrue for auth under `/auth/v1` and
//! PostgREST for tables under `/rest/v1`. Row-level security is enforced by
//! the project, keyed on the bearer token each request carries.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::{
    Identity, RecordFilter, RecordOrder, RemoteConnector, RemoteDataService, SignUpOutcome,
};
use crate::error::{AuthError, Error, ServiceError};
use crate::task::{NewTask, TaskId, TaskPatch, TaskRow};
use crate::Result;

/// Connection settings for a Supabase project
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Public anon key sent as `apikey` on every request
    pub anon_key: String,
    pub timeout: Duration,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.url, path)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, urlencoding::encode(table))
    }

    /// `GET` URL for a filtered, ordered select of every column
    fn list_url(&self, table: &str, filter: Option<&RecordFilter>, order: &RecordOrder) -> String {
        let mut url = format!("{}?select=*", self.table_url(table));
        if let Some(filter) = filter {
            url.push_str(&format!(
                "&{}=eq.{}",
                urlencoding::encode(&filter.column),
                urlencoding::encode(&filter.value)
            ));
        }
        url.push_str(&format!(
            "&order={}.{}",
            urlencoding::encode(&order.column),
            order.direction.as_str()
        ));
        url
    }

    fn row_url(&self, table: &str, id: TaskId) -> String {
        format!("{}?id=eq.{}", self.table_url(table), id)
    }
}

/// Shares one HTTP connection pool between all sessions
#[derive(Clone)]
pub struct SupabaseConnector {
    http: reqwest::Client,
    config: Arc<SupabaseConfig>,
}

impl SupabaseConnector {
    pub fn new(config: SupabaseConfig) -> Result<Self> {
        if config.url.is_empty() || config.anon_key.is_empty() {
            return Err(Error::Config(
                "Supabase URL and anon key must both be set".into(),
            ));
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }
}

impl RemoteConnector for SupabaseConnector {
    fn connect(&self) -> Arc<dyn RemoteDataService> {
        Arc::new(SupabaseService {
            http: self.http.clone(),
            config: Arc::clone(&self.config),
            session: RwLock::new(None),
        })
    }
}

#[derive(Debug, Clone)]
struct AuthSession {
    access_token: String,
    user: Identity,
}

/// GoTrue token / sign-up response; sign-up without auto-confirm has no token
#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<Identity>,
    /// Bare user object returned by sign-up when confirmation is pending
    #[serde(default)]
    id: Option<String>,
}

/// Error body shared by GoTrue versions (old: `error`/`error_description`,
/// new: `error_code`/`msg`)
#[derive(Debug, Default, Deserialize)]
struct AuthErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// PostgREST error body
#[derive(Debug, Default, Deserialize)]
struct RestErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn classify_auth_error(status: StatusCode, body: &str) -> AuthError {
    let parsed: AuthErrorBody = serde_json::from_str(body).unwrap_or_default();
    let code = parsed
        .error_code
        .as_deref()
        .or(parsed.error.as_deref())
        .unwrap_or_default();
    let message = parsed
        .msg
        .or(parsed.error_description)
        .or(parsed.message)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    match code {
        "invalid_credentials" | "invalid_grant" => AuthError::InvalidCredentials,
        "user_already_exists" | "email_exists" => AuthError::UserAlreadyExists,
        _ if message.contains("already registered") => AuthError::UserAlreadyExists,
        "validation_failed" | "weak_password" | "email_address_invalid" => {
            AuthError::InvalidInput(message)
        }
        _ => AuthError::Rejected {
            status: status.as_u16(),
            message,
        },
    }
}

fn classify_service_error(status: StatusCode, body: &str) -> ServiceError {
    let parsed: RestErrorBody = serde_json::from_str(body).unwrap_or_default();
    let code = parsed.code.unwrap_or_default();
    let message = parsed
        .message
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    if code == "42501" || status == StatusCode::FORBIDDEN {
        ServiceError::PermissionDenied(message)
    } else if code.starts_with("23") {
        ServiceError::Constraint(message)
    } else {
        ServiceError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}

/// One browser session's client
pub struct SupabaseService {
    http: reqwest::Client,
    config: Arc<SupabaseConfig>,
    session: RwLock<Option<AuthSession>>,
}

impl SupabaseService {
    fn base_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&self.config.anon_key) {
            headers.insert("apikey", value);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    /// Headers for table calls: the user's token, or the anon key when signed out
    async fn data_headers(&self) -> HeaderMap {
        let token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.config.anon_key.clone());

        let mut headers = self.base_headers();
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }

    async fn check_rest(resp: Response) -> std::result::Result<Response, ServiceError> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Err(classify_service_error(status, &body))
    }

    async fn post_auth(
        &self,
        path: &str,
        email: &str,
        password: &str,
    ) -> std::result::Result<AuthResponse, AuthError> {
        let resp = self
            .http
            .post(self.config.auth_url(path))
            .headers(self.base_headers())
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_auth_error(status, &body));
        }

        resp.json::<AuthResponse>()
            .await
            .map_err(|e| AuthError::Transport(format!("Failed to parse auth response: {}", e)))
    }
}

#[async_trait]
impl RemoteDataService for SupabaseService {
    async fn current_identity(&self) -> Option<Identity> {
        let token = self.session.read().await.as_ref()?.access_token.clone();

        let mut headers = self.base_headers();
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
            headers.insert(AUTHORIZATION, value);
        }

        let resp = match self
            .http
            .get(self.config.auth_url("user"))
            .headers(headers)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!("Failed to fetch current user: {}", e);
                return None;
            }
        };

        match resp.status() {
            status if status.is_success() => match resp.json::<Identity>().await {
                Ok(identity) => Some(identity),
                Err(e) => {
                    warn!("Failed to parse current user: {}", e);
                    None
                }
            },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!("Session token rejected; dropping session");
                *self.session.write().await = None;
                None
            }
            status => {
                warn!("Unexpected status fetching current user: {}", status);
                None
            }
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> std::result::Result<Identity, AuthError> {
        let resp = self
            .post_auth("token?grant_type=password", email, password)
            .await?;

        match (resp.access_token, resp.user) {
            (Some(access_token), Some(user)) => {
                *self.session.write().await = Some(AuthSession {
                    access_token,
                    user: user.clone(),
                });
                Ok(user)
            }
            _ => Err(AuthError::Transport(
                "Token response is missing the session".into(),
            )),
        }
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> std::result::Result<SignUpOutcome, AuthError> {
        let resp = self.post_auth("signup", email, password).await?;

        match (resp.access_token, resp.user) {
            (Some(access_token), Some(user)) => {
                *self.session.write().await = Some(AuthSession {
                    access_token,
                    user: user.clone(),
                });
                Ok(SignUpOutcome::SignedIn(user))
            }
            _ => {
                debug!("Sign-up pending confirmation for user {:?}", resp.id);
                Ok(SignUpOutcome::ConfirmationRequired)
            }
        }
    }

    async fn sign_out(&self) {
        let Some(session) = self.session.write().await.take() else {
            return;
        };

        let mut headers = self.base_headers();
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", session.access_token)) {
            headers.insert(AUTHORIZATION, value);
        }

        match self
            .http
            .post(self.config.auth_url("logout"))
            .headers(headers)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => {
                debug!("Signed out {}", session.user.id);
            }
            Ok(resp) => warn!("Sign-out returned HTTP {}", resp.status()),
            Err(e) => warn!("Sign-out request failed: {}", e),
        }
    }

    async fn list_records(
        &self,
        table: &str,
        filter: Option<&RecordFilter>,
        order: &RecordOrder,
    ) -> std::result::Result<Vec<TaskRow>, ServiceError> {
        let resp = self
            .http
            .get(self.config.list_url(table, filter, order))
            .headers(self.data_headers().await)
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        Self::check_rest(resp)
            .await?
            .json::<Vec<TaskRow>>()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))
    }

    async fn insert_record(
        &self,
        table: &str,
        record: &NewTask,
    ) -> std::result::Result<TaskRow, ServiceError> {
        let resp = self
            .http
            .post(self.config.table_url(table))
            .headers(self.data_headers().await)
            .header("Prefer", "return=representation")
            .header(ACCEPT, "application/vnd.pgrst.object+json")
            .json(&[record])
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        Self::check_rest(resp)
            .await?
            .json::<TaskRow>()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))
    }

    async fn update_record(
        &self,
        table: &str,
        id: TaskId,
        patch: &TaskPatch,
    ) -> std::result::Result<(), ServiceError> {
        let resp = self
            .http
            .patch(self.config.row_url(table, id))
            .headers(self.data_headers().await)
            .header("Prefer", "return=minimal")
            .json(patch)
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        Self::check_rest(resp).await.map(|_| ())
    }

    async fn delete_record(&self, table: &str, id: TaskId) -> std::result::Result<(), ServiceError> {
        let resp = self
            .http
            .delete(self.config.row_url(table, id))
            .headers(self.data_headers().await)
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        Self::check_rest(resp).await.map(|_| ())
    }
}
