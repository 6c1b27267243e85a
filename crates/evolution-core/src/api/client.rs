//! API client for communicating with the evolution REST API.
//!
//! Requests to protected endpoints carry the credential held by the shared
//! `SessionManager`. A 401 on such a request ends the session, and a response that
//! arrives after the credential changed is discarded.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::auth::{Credential, SessionManager};
use crate::models::{
    Event, EventDraft, Habit, HabitDraft, HabitTracker, JournalDraft, JournalEntry, LoginResponse,
    ProfileUpdate, RegisterRequest, TaskCard, TaskDraft, TaskPatch, UserBadge, UserProfile,
};

use super::error::is_not_found;
use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Image uploads are sent as a single multipart part
#[derive(Clone)]
struct ImageUpload {
    file_name: String,
    bytes: Vec<u8>,
}

impl ImageUpload {
    fn read(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read image {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "profile_image".to_string());
        Ok(Self { file_name, bytes })
    }

    fn part(&self) -> Part {
        Part::bytes(self.bytes.clone()).file_name(self.file_name.clone())
    }
}

fn multipart_form(fields: &[(&'static str, String)], image: Option<&ImageUpload>) -> Form {
    let mut form = Form::new();
    for (name, value) in fields {
        form = form.text(*name, value.clone());
    }
    if let Some(image) = image {
        form = form.part("profile_image", image.part());
    }
    form
}

/// API client for the evolution backend.
/// Clone is cheap - reqwest::Client and the session are both shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<SessionManager>,
}

impl ApiClient {
    pub fn new(base_url: &str, session: Arc<SessionManager>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    /// Endpoint URL; paths keep the backend's trailing slash
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth_headers(credential: Option<&Credential>) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(credential) = credential {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&credential.header_value())
                    .context("Credential is not a valid header value")?,
            );
        }
        Ok(headers)
    }

    // ===== Public Endpoints =====

    /// Exchange username and password for a token.
    ///
    /// The token is returned, not stored; hand it to `SessionManager::set_credential`.
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let url = self.url("login/");
        let body = serde_json::json!({ "username": username, "password": password });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::NetworkError)
            .context("Failed to send login request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(if status.is_client_error() {
                ApiError::login_failed(&body)
            } else {
                ApiError::from_status(status, &body)
            }
            .into());
        }

        let parsed: LoginResponse = response
            .json()
            .await
            .context("Failed to parse login response")?;
        info!(username = username, "Login accepted");
        Ok(parsed.token)
    }

    /// Create an account. Does not start a session.
    pub async fn register(&self, request: &RegisterRequest) -> Result<LoginResponse> {
        let url = self.url("register/");
        let image = request
            .profile_image
            .as_deref()
            .map(ImageUpload::read)
            .transpose()?;
        let fields = [
            ("username", request.username.clone()),
            ("password", request.password.clone()),
            ("email", request.email.clone()),
            ("name", request.name.clone()),
            ("country", request.country.clone()),
            ("bio", request.bio.clone()),
        ];

        let response = self
            .client
            .post(&url)
            .multipart(multipart_form(&fields, image.as_ref()))
            .send()
            .await
            .map_err(ApiError::NetworkError)
            .context("Failed to send registration request")?;

        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .context("Failed to parse registration response")
    }

    // ===== Request Plumbing =====

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Send an authenticated request built by `build`, retrying on 429.
    ///
    /// `build` is called once per attempt so bodies that cannot be cloned (multipart)
    /// are rebuilt.
    async fn send<F>(&self, build: F) -> Result<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let credential = self.session.credential();
            let request = build(&self.client).headers(Self::auth_headers(credential.as_ref())?);

            let response = request.send().await.map_err(ApiError::NetworkError)?;

            if self.session.credential() != credential {
                debug!(status = %response.status(), "Discarding response from a previous session");
                return Err(ApiError::SessionChanged.into());
            }

            match response.status() {
                status if status.is_success() => return Ok(response),
                StatusCode::TOO_MANY_REQUESTS => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
                StatusCode::UNAUTHORIZED => {
                    if credential.is_some() {
                        warn!(url = %response.url(), "Credential rejected, ending session");
                        self.session.logout();
                    }
                    return Err(ApiError::Unauthorized.into());
                }
                _ => return Self::check_response(response).await,
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let response = self
            .send(|client| client.get(&url))
            .await
            .with_context(|| format!("GET {}", url))?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    async fn send_json<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.url(path);
        let response = self
            .send(|client| client.request(method.clone(), &url).json(body))
            .await
            .with_context(|| format!("{} {}", method, url))?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let url = self.url(path);
        self.send(|client| client.delete(&url))
            .await
            .with_context(|| format!("DELETE {}", url))?;
        Ok(())
    }

    // ===== Profile =====

    pub async fn fetch_profile(&self) -> Result<UserProfile> {
        self.get("user/profile/").await
    }

    /// Update the signed-in user's profile. Requires the current password.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile> {
        if !update.has_current_password() {
            anyhow::bail!("Current password is required for any profile update");
        }
        let url = self.url("user/profile/");
        let image = update
            .profile_image
            .as_deref()
            .map(ImageUpload::read)
            .transpose()?;
        let fields = update.text_fields();

        let response = self
            .send(|client| {
                client
                    .patch(&url)
                    .multipart(multipart_form(&fields, image.as_ref()))
            })
            .await
            .context("Failed to update profile")?;
        response
            .json()
            .await
            .context("Failed to parse profile response")
    }

    pub async fn fetch_badges(&self) -> Result<Vec<UserBadge>> {
        self.get("users/badges/").await
    }

    // ===== Tasks =====

    pub async fn fetch_tasks(&self) -> Result<Vec<TaskCard>> {
        self.get("tasks/").await
    }

    pub async fn create_task(&self, draft: &TaskDraft) -> Result<TaskCard> {
        self.send_json(Method::POST, "tasks/", draft).await
    }

    pub async fn update_task(&self, task_id: i64, patch: &TaskPatch) -> Result<TaskCard> {
        self.send_json(Method::PATCH, &format!("tasks/{}/", task_id), patch)
            .await
    }

    pub async fn delete_task(&self, task_id: i64) -> Result<()> {
        self.delete(&format!("tasks/{}/", task_id)).await
    }

    // ===== Habits =====

    pub async fn fetch_habits(&self) -> Result<Vec<Habit>> {
        self.get("habits/").await
    }

    pub async fn create_habit(&self, draft: &HabitDraft) -> Result<Habit> {
        self.send_json(Method::POST, "habits/", draft).await
    }

    pub async fn update_habit(&self, habit_id: i64, draft: &HabitDraft) -> Result<Habit> {
        self.send_json(Method::PUT, &format!("habits/{}/", habit_id), draft)
            .await
    }

    pub async fn delete_habit(&self, habit_id: i64) -> Result<()> {
        self.delete(&format!("habits/{}/", habit_id)).await
    }

    /// Today's tracker entries; the backend creates them on the first login of the day
    pub async fn fetch_habit_trackers(&self) -> Result<Vec<HabitTracker>> {
        self.get("habittrackers/").await
    }

    pub async fn set_habit_completed(
        &self,
        tracker_id: i64,
        completed: bool,
    ) -> Result<HabitTracker> {
        let body = serde_json::json!({ "is_completed": completed });
        self.send_json(Method::PUT, &format!("habittrackers/{}/", tracker_id), &body)
            .await
    }

    // ===== Events =====

    pub async fn fetch_events(&self) -> Result<Vec<Event>> {
        self.get("events/").await
    }

    pub async fn create_event(&self, draft: &EventDraft) -> Result<Event> {
        self.send_json(Method::POST, "events/", draft).await
    }

    pub async fn update_event(&self, event_id: i64, draft: &EventDraft) -> Result<Event> {
        self.send_json(Method::PUT, &format!("events/{}/", event_id), draft)
            .await
    }

    pub async fn delete_event(&self, event_id: i64) -> Result<()> {
        self.delete(&format!("events/{}/", event_id)).await
    }

    // ===== Journal =====

    pub async fn fetch_journal_entries(&self) -> Result<Vec<JournalEntry>> {
        self.get("journalentries/").await
    }

    /// Today's entry, or `None` if nothing has been written yet
    pub async fn fetch_today_journal(&self) -> Result<Option<JournalEntry>> {
        match self.get("journalentries/today/").await {
            Ok(entry) => Ok(Some(entry)),
            Err(e) if is_not_found(&e) => {
                debug!("No journal entry for today");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn create_journal_entry(&self, draft: &JournalDraft) -> Result<JournalEntry> {
        self.send_json(Method::POST, "journalentries/", draft).await
    }

    pub async fn update_journal_entry(
        &self,
        entry_id: i64,
        draft: &JournalDraft,
    ) -> Result<JournalEntry> {
        self.send_json(Method::PUT, &format!("journalentries/{}/", entry_id), draft)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    fn reply(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\
             Connection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    }

    async fn read_head(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        String::from_utf8_lossy(&buf).to_lowercase()
    }

    /// Accept one connection per canned reply, running `before_reply` after each request
    /// arrives. Yields the lowercased request heads.
    async fn serve_with<F>(
        replies: Vec<String>,
        before_reply: F,
    ) -> (String, JoinHandle<Vec<String>>)
    where
        F: Fn() + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/api", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let mut heads = Vec::new();
            for reply in replies {
                let (mut socket, _) = listener.accept().await.unwrap();
                heads.push(read_head(&mut socket).await);
                before_reply();
                socket.write_all(reply.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
            heads
        });
        (base, handle)
    }

    async fn serve(replies: Vec<String>) -> (String, JoinHandle<Vec<String>>) {
        serve_with(replies, || {}).await
    }

    fn api_error(err: &anyhow::Error) -> Option<&ApiError> {
        err.downcast_ref::<ApiError>()
    }

    fn client(base: &str, token: Option<&str>) -> ApiClient {
        let store = token.map(MemoryTokenStore::with_token).unwrap_or_default();
        let session = Arc::new(SessionManager::new(store));
        session.initialize();
        ApiClient::new(base, session).unwrap()
    }

    #[test]
    fn test_url_joins_paths() {
        let api = client("http://127.0.0.1:8000/api/", None);
        assert_eq!(api.url("tasks/"), "http://127.0.0.1:8000/api/tasks/");
        assert_eq!(api.url("/login/"), "http://127.0.0.1:8000/api/login/");
    }

    #[test]
    fn test_auth_headers_use_token_scheme() {
        let credential = Credential::new("abc123").unwrap();
        let headers = ApiClient::auth_headers(Some(&credential)).unwrap();
        assert_eq!(headers[header::AUTHORIZATION], "Token abc123");
    }

    #[test]
    fn test_auth_headers_omitted_without_credential() {
        let headers = ApiClient::auth_headers(None).unwrap();
        assert!(headers.get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_auth_headers_reject_invalid_token() {
        let credential = Credential::new("bad\ntoken").unwrap();
        assert!(ApiClient::auth_headers(Some(&credential)).is_err());
    }

    #[test]
    fn test_multipart_form_includes_image_part() {
        let image = ImageUpload {
            file_name: "me.png".to_string(),
            bytes: vec![1, 2, 3],
        };
        let form = multipart_form(&[("name", "Sam".to_string())], Some(&image));
        assert!(!form.boundary().is_empty());
    }

    #[tokio::test]
    async fn test_network_failure_keeps_session() {
        // Nothing listens on port 9 locally; the request fails before any status
        let api = client("http://127.0.0.1:9/api", Some("abc123"));
        assert!(api.fetch_tasks().await.is_err());
        assert!(api.session.is_authenticated());
    }

    #[tokio::test]
    async fn test_unauthorized_with_credential_logs_out() {
        let body = r#"{"detail": "Invalid token."}"#;
        let (base, server) = serve(vec![reply("401 Unauthorized", body)]).await;
        let api = client(&base, Some("abc123"));

        let err = api.fetch_tasks().await.unwrap_err();
        assert!(matches!(api_error(&err), Some(ApiError::Unauthorized)));
        assert!(!api.session.is_authenticated());

        let heads = server.await.unwrap();
        assert!(heads[0].starts_with("get /api/tasks/"));
        assert!(heads[0].contains("authorization: token abc123"));
    }

    #[tokio::test]
    async fn test_unauthorized_without_credential_sends_no_header() {
        let (base, server) = serve(vec![reply("401 Unauthorized", "{}")]).await;
        let api = client(&base, None);
        let notified = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&notified);
        let _sub = api.session.subscribe(move |_| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });

        let err = api.fetch_habits().await.unwrap_err();
        assert!(matches!(api_error(&err), Some(ApiError::Unauthorized)));
        assert!(!api.session.is_authenticated());
        assert_eq!(notified.load(std::sync::atomic::Ordering::SeqCst), 0);

        let heads = server.await.unwrap();
        assert!(!heads[0].contains("authorization:"));
    }

    #[tokio::test]
    async fn test_response_after_credential_change_is_discarded() {
        let session = Arc::new(SessionManager::new(MemoryTokenStore::with_token("abc123")));
        session.initialize();

        let relogin = Arc::clone(&session);
        let (base, server) = serve_with(vec![reply("401 Unauthorized", "{}")], move || {
            relogin.set_credential(Some("other"));
        })
        .await;
        let api = ApiClient::new(&base, Arc::clone(&session)).unwrap();

        let err = api.fetch_tasks().await.unwrap_err();
        assert!(matches!(api_error(&err), Some(ApiError::SessionChanged)));
        assert_eq!(session.credential().unwrap().as_str(), "other");

        let heads = server.await.unwrap();
        assert!(heads[0].contains("authorization: token abc123"));
    }

    #[tokio::test]
    async fn test_success_after_logout_is_discarded() {
        let session = Arc::new(SessionManager::new(MemoryTokenStore::with_token("abc123")));
        session.initialize();

        let logout = Arc::clone(&session);
        let (base, server) = serve_with(vec![reply("200 OK", "[]")], move || logout.logout()).await;
        let api = ApiClient::new(&base, Arc::clone(&session)).unwrap();

        let err = api.fetch_tasks().await.unwrap_err();
        assert!(matches!(api_error(&err), Some(ApiError::SessionChanged)));
        assert!(!session.is_authenticated());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_rate_limited_request_is_retried() {
        let (base, server) = serve(vec![
            reply("429 Too Many Requests", "{}"),
            reply("200 OK", "[]"),
        ])
        .await;
        let api = client(&base, Some("abc123"));

        let tasks = api.fetch_tasks().await.unwrap();
        assert!(tasks.is_empty());
        assert!(api.session.is_authenticated());

        let heads = server.await.unwrap();
        assert_eq!(heads.len(), 2);
        assert!(heads[1].contains("authorization: token abc123"));
    }

    #[tokio::test]
    async fn test_update_profile_requires_current_password() {
        // Rejected before any request is made; nothing listens on port 9
        let api = client("http://127.0.0.1:9/api", Some("abc123"));
        let update = ProfileUpdate {
            name: Some("Sam".to_string()),
            ..Default::default()
        };
        let err = api.update_profile(&update).await.unwrap_err();
        assert!(err.to_string().contains("Current password is required"));
        assert!(api_error(&err).is_none());
    }
}
