//! Lumifi HTTP client
//!
//! [`LumifiClient`] is the authenticated request pipeline. Before a request
//! leaves, an expired access token is renewed once through the configured
//! [`TokenRefresher`]; the session and caller headers are then attached.
//! Successful responses are reduced to their body and every failure goes
//! through the [`ErrorClassifier`] exactly once.

pub mod auth;
pub mod error;
pub mod patients;
pub mod practice;
pub mod refresh;
pub mod session;
pub mod source_ip;
pub mod users;

use error::{
    ApiErrorClassifier, ApiFailure, ClientError, ErrorClassifier, SessionExpired,
    SessionExpiryReason,
};
use lumifi_core::DEFAULT_USER_AGENT;
use refresh::{HttpTokenRefresher, TokenRefresher};
use reqwest::{Client, ClientBuilder, RequestBuilder};
use serde::de::DeserializeOwned;
use session::{Session, SessionAction, SessionStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::types::RefreshTokenRequest;

pub const PRACTICE_ID_HEADER: &str = "Practice-Id";
pub const USER_ID_HEADER: &str = "User-Id";
pub const LOGIN_ID_HEADER: &str = "Login-Id";
pub const SOURCE_IP_HEADER: &str = "Source-Ip";

/// Callback fired when the session had to be dropped
pub type SessionExpiredHook = Arc<dyn Fn(&SessionExpired) + Send + Sync>;

/// Lumifi API client
#[derive(Clone)]
pub struct LumifiClient {
    client: Client,
    base_url: String,
    session: SessionStore,
    refresher: Arc<dyn TokenRefresher>,
    classifier: Arc<dyn ErrorClassifier>,
    source_ip: Option<String>,
    on_session_expired: Option<SessionExpiredHook>,
    refresh_lock: Arc<Mutex<()>>,
}

impl LumifiClient {
    /// Create a new client with default configuration
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> LumifiClientBuilder {
        LumifiClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Shared session this client reads and updates
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn source_ip(&self) -> Option<&str> {
        self.source_ip.as_deref()
    }

    /// Create a request builder for `path`
    ///
    /// Credentials are attached by [`execute`](Self::execute), after any
    /// token refresh.
    pub fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, url)
    }

    /// Execute a request and return the decoded body
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let body = self.send(request).await?;
        serde_json::from_str(&body).map_err(|e| self.fail(ApiFailure::Decode(e)))
    }

    /// Execute a request whose body is not needed
    pub async fn execute_empty(&self, request: RequestBuilder) -> Result<(), ClientError> {
        self.send(request).await.map(|_| ())
    }

    /// Execute a request and return the body as untyped JSON
    ///
    /// An empty body is returned as `null`.
    pub async fn execute_value(
        &self,
        request: RequestBuilder,
    ) -> Result<serde_json::Value, ClientError> {
        let body = self.send(request).await?;
        if body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| self.fail(ApiFailure::Decode(e)))
    }

    async fn send(&self, request: RequestBuilder) -> Result<String, ClientError> {
        let request = self
            .authorize(request)
            .await?
            .build()
            .map_err(|e| self.fail(ApiFailure::Transport(e)))?;

        let method = request.method().clone();
        let path = request.url().path().to_string();
        debug!(%method, %path, "Sending request");

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| self.fail(ApiFailure::Transport(e)))?;
        let status = response.status();
        debug!(%method, %path, status = status.as_u16(), "Received response");

        let body = response
            .text()
            .await
            .map_err(|e| self.fail(ApiFailure::Transport(e)))?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(self.fail(ApiFailure::Status { status, body }))
        }
    }

    /// Refresh if needed, then attach session and caller headers
    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let mut session = self.session.snapshot();
        if session.is_expired_at(now()) {
            session = self.refresh_session().await?;
        }

        let mut request = request;
        if let Some(token) = &session.access_token {
            request = request
                .bearer_auth(token)
                .header(
                    PRACTICE_ID_HEADER,
                    session.practice_account_id.as_deref().unwrap_or_default(),
                )
                .header(USER_ID_HEADER, session.user_id.as_deref().unwrap_or_default())
                .header(LOGIN_ID_HEADER, session.login_id.as_deref().unwrap_or_default());
        }

        Ok(request.header(SOURCE_IP_HEADER, self.source_ip().unwrap_or_default()))
    }

    /// Renew the access token, one refresh at a time
    async fn refresh_session(&self) -> Result<Session, ClientError> {
        let _guard = self.refresh_lock.lock().await;

        // another request may have refreshed or dropped the session meanwhile
        let session = self.session.snapshot();
        if session.access_token.is_none() {
            return Err(ClientError::SessionExpired(SessionExpired::new(
                SessionExpiryReason::MissingCredentials,
            )));
        }
        if !session.is_expired_at(now()) {
            return Ok(session);
        }

        let (Some(refresh_token), Some(login_id), Some(user_id)) = (
            non_empty(session.refresh_token.as_deref()),
            non_empty(session.login_id.as_deref()),
            non_empty(session.user_id.as_deref()),
        ) else {
            return Err(self.expire(SessionExpiryReason::MissingCredentials));
        };

        info!(login_id, user_id, "Access token expired, refreshing");
        let request = RefreshTokenRequest {
            login_id: login_id.to_string(),
            user_id: user_id.to_string(),
            refresh_token: refresh_token.to_string(),
        };

        match self.refresher.refresh(request).await {
            Ok(response) => match response.into_grant() {
                Some((access_token, expires_at)) => {
                    info!(expires_at, "Access token refreshed");
                    Ok(self.session.dispatch(SessionAction::Refreshed {
                        access_token,
                        expires_at,
                    }))
                }
                None => Err(self.expire(SessionExpiryReason::RefreshRejected)),
            },
            Err(e) => {
                warn!("Token refresh failed: {e}");
                Err(self.expire(SessionExpiryReason::RefreshFailed))
            }
        }
    }

    /// Drop the session and notify the hook
    fn expire(&self, reason: SessionExpiryReason) -> ClientError {
        let expired = SessionExpired::new(reason);
        warn!(%reason, redirect_to = expired.redirect_to, "Session expired");
        self.session.clear();
        if let Some(hook) = &self.on_session_expired {
            hook(&expired);
        }
        ClientError::SessionExpired(expired)
    }

    /// Route a failure through the classifier
    fn fail(&self, failure: ApiFailure) -> ClientError {
        let err = self.classifier.handle(failure);
        if matches!(err, ClientError::AuthenticationFailed(_))
            && self.session.snapshot().is_authenticated()
        {
            // caller still receives the classified error
            let _ = self.expire(SessionExpiryReason::Unauthorized);
        }
        err
    }
}

impl std::fmt::Debug for LumifiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LumifiClient")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .field("source_ip", &self.source_ip)
            .finish_non_exhaustive()
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Builder for LumifiClient
#[derive(Default)]
pub struct LumifiClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    session: Option<SessionStore>,
    refresher: Option<Arc<dyn TokenRefresher>>,
    classifier: Option<Arc<dyn ErrorClassifier>>,
    source_ip: Option<String>,
    on_session_expired: Option<SessionExpiredHook>,
}

impl LumifiClientBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Share an existing session store
    pub fn session(mut self, session: SessionStore) -> Self {
        self.session = Some(session);
        self
    }

    /// Replace the HTTP refresh caller
    pub fn refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Replace the default error classifier
    pub fn classifier(mut self, classifier: Arc<dyn ErrorClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Address sent in the `Source-Ip` header
    pub fn source_ip(mut self, ip: Option<String>) -> Self {
        self.source_ip = ip.filter(|ip| !ip.is_empty());
        self
    }

    /// Called after the session is dropped, with the route to navigate to
    pub fn on_session_expired(
        mut self,
        hook: impl Fn(&SessionExpired) + Send + Sync + 'static,
    ) -> Self {
        self.on_session_expired = Some(Arc::new(hook));
        self
    }

    /// Build the client
    pub fn build(self) -> Result<LumifiClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::Configuration("base_url cannot be empty".into()));
        }

        let mut client_builder = ClientBuilder::new();
        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }
        client_builder = client_builder.user_agent(
            self.user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        );
        let client = client_builder.build()?;

        let refresher = self
            .refresher
            .unwrap_or_else(|| Arc::new(HttpTokenRefresher::new(client.clone(), &base_url)));

        Ok(LumifiClient {
            client,
            base_url,
            session: self.session.unwrap_or_default(),
            refresher,
            classifier: self
                .classifier
                .unwrap_or_else(|| Arc::new(ApiErrorClassifier)),
            source_ip: self.source_ip,
            on_session_expired: self.on_session_expired,
            refresh_lock: Arc::new(Mutex::new(())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RefreshTokenResponse;
    use refresh::mock::MockTokenRefresher;
    use serde_json::json;
    use session::AuthGrant;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session_expiring_at(expires_at: i64) -> SessionStore {
        let store = SessionStore::new();
        store.dispatch(SessionAction::LoginStarted {
            login_id: "L1".to_string(),
            email_id: "owner@practice.com".to_string(),
            practice_accounts: vec![],
        });
        store.dispatch(SessionAction::PracticeSelected {
            user_id: "U1".to_string(),
            practice_account_id: "PA1".to_string(),
            has_2fa: false,
        });
        store.dispatch(SessionAction::Authenticated(AuthGrant {
            access_token: "T1".to_string(),
            refresh_token: "R1".to_string(),
            expires_at,
            user_details: None,
        }));
        store
    }

    fn granted(token: &str) -> RefreshTokenResponse {
        RefreshTokenResponse {
            status: "success".to_string(),
            auth_token: Some(token.to_string()),
            exp: Some(now() + 3600),
            ..RefreshTokenResponse::default()
        }
    }

    #[test]
    fn test_builder_requires_base_url() {
        let result = LumifiClient::builder().build();
        assert!(matches!(result, Err(ClientError::Configuration(_))));
    }

    #[test]
    fn test_builder_trims_trailing_slash() {
        let client = LumifiClient::new("http://localhost:3000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
    }

    #[tokio::test]
    async fn test_concurrent_expired_requests_refresh_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/role"))
            .and(header("authorization", "Bearer T2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(4)
            .mount(&server)
            .await;

        let mut refresher = MockTokenRefresher::new();
        refresher
            .expect_refresh()
            .times(1)
            .returning(|_| Ok(granted("T2")));

        let client = LumifiClient::builder()
            .base_url(server.uri())
            .session(session_expiring_at(now() - 60))
            .refresher(Arc::new(refresher))
            .build()
            .unwrap();

        let calls = (0..4).map(|_| {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .execute::<serde_json::Value>(client.request(reqwest::Method::GET, "/user/role"))
                    .await
            })
        });
        for call in calls.collect::<Vec<_>>() {
            call.await.unwrap().unwrap();
        }
        assert_eq!(client.session().snapshot().access_token.as_deref(), Some("T2"));
    }

    #[tokio::test]
    async fn test_rejected_refresh_never_sends_guarded_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let mut refresher = MockTokenRefresher::new();
        refresher.expect_refresh().times(1).returning(|_| {
            Ok(RefreshTokenResponse {
                status: "failure".to_string(),
                ..RefreshTokenResponse::default()
            })
        });

        let redirects = Arc::new(AtomicUsize::new(0));
        let seen = redirects.clone();
        let client = LumifiClient::builder()
            .base_url(server.uri())
            .session(session_expiring_at(now() - 1))
            .refresher(Arc::new(refresher))
            .on_session_expired(move |expired| {
                assert_eq!(expired.redirect_to, error::LOGIN_ROUTE);
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .unwrap();

        let err = client
            .execute_empty(client.request(reqwest::Method::GET, "/auth/me"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::SessionExpired(SessionExpired {
                reason: SessionExpiryReason::RefreshRejected,
                ..
            })
        ));
        assert_eq!(redirects.load(Ordering::SeqCst), 1);
        assert_eq!(client.session().snapshot(), Session::default());
    }

    #[tokio::test]
    async fn test_refresh_not_attempted_before_expiry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("authorization", "Bearer T1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"foo": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let mut refresher = MockTokenRefresher::new();
        refresher.expect_refresh().never();

        let client = LumifiClient::builder()
            .base_url(server.uri())
            .session(session_expiring_at(now() + 600))
            .refresher(Arc::new(refresher))
            .build()
            .unwrap();

        let value = client
            .execute_value(client.request(reqwest::Method::GET, "/practice"))
            .await
            .unwrap();
        assert_eq!(value, json!({"foo": 1}));
    }

    struct CountingClassifier(Arc<AtomicUsize>);

    impl ErrorClassifier for CountingClassifier {
        fn handle(&self, failure: ApiFailure) -> ClientError {
            self.0.fetch_add(1, Ordering::SeqCst);
            ApiErrorClassifier.handle(failure)
        }
    }

    #[tokio::test]
    async fn test_decode_failure_goes_through_classifier_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let count = Arc::new(AtomicUsize::new(0));
        let client = LumifiClient::builder()
            .base_url(server.uri())
            .classifier(Arc::new(CountingClassifier(count.clone())))
            .build()
            .unwrap();

        let err = client
            .execute::<serde_json::Value>(client.request(reqwest::Method::GET, "/state/list"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Serialization(_)));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
