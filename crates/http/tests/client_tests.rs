//! Integration tests for the Lumifi HTTP client

use lumifi_http::client::error::{
    ApiErrorClassifier, ApiFailure, ClientError, ErrorClassifier, LOGIN_ROUTE, SessionExpired,
    SessionExpiryReason,
};
use lumifi_http::client::session::{AuthGrant, Session, SessionAction, SessionStore};
use lumifi_http::client::{
    LOGIN_ID_HEADER, LumifiClient, PRACTICE_ID_HEADER, SOURCE_IP_HEADER, USER_ID_HEADER,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn signed_in(expires_at: i64) -> SessionStore {
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

/// Records every redirect the client asks for
fn redirect_log() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&SessionExpired) + Send + Sync) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    (log, move |expired: &SessionExpired| {
        sink.lock().unwrap().push(expired.redirect_to);
    })
}

async fn mount_refresh(server: &MockServer, response: ResponseTemplate, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/auth/refreshToken"))
        .and(body_json(json!({
            "loginId": "L1",
            "userId": "U1",
            "refreshToken": "R1"
        })))
        .respond_with(response)
        .expect(calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_expired_token_is_refreshed_before_request() {
    let server = MockServer::start().await;
    let exp = now() + 3600;
    mount_refresh(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "message": "Token refreshed",
            "statusCode": 200,
            "authToken": "T2",
            "exp": exp
        })),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/user/role"))
        .and(header("authorization", "Bearer T2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let session = signed_in(now() - 1);
    let client = LumifiClient::builder()
        .base_url(server.uri())
        .session(session.clone())
        .build()
        .unwrap();

    let roles = client.list_roles().await.unwrap();
    assert!(roles.is_empty());

    let after = session.snapshot();
    assert_eq!(after.access_token.as_deref(), Some("T2"));
    assert_eq!(after.access_token_expiry, Some(exp));
    assert_eq!(after.refresh_token.as_deref(), Some("R1"));
}

#[tokio::test]
async fn test_live_token_skips_refresh() {
    let server = MockServer::start().await;
    mount_refresh(&server, ResponseTemplate::new(200), 0).await;
    Mock::given(method("GET"))
        .and(path("/state/list"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = LumifiClient::builder()
        .base_url(server.uri())
        .session(signed_in(now() + 30))
        .build()
        .unwrap();

    client.list_states().await.unwrap();
}

#[tokio::test]
async fn test_failed_refresh_clears_session_and_redirects() {
    let server = MockServer::start().await;
    mount_refresh(
        &server,
        ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/practice/software"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let (redirects, hook) = redirect_log();
    let session = signed_in(now() - 1);
    let client = LumifiClient::builder()
        .base_url(server.uri())
        .session(session.clone())
        .on_session_expired(hook)
        .build()
        .unwrap();

    let err = client.list_practice_software().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::SessionExpired(SessionExpired {
            reason: SessionExpiryReason::RefreshFailed,
            redirect_to: LOGIN_ROUTE,
        })
    ));
    assert_eq!(*redirects.lock().unwrap(), vec![LOGIN_ROUTE]);

    let cleared = session.snapshot();
    assert!(cleared.access_token.is_none());
    assert!(cleared.refresh_token.is_none());
    assert!(cleared.login_id.is_none());
    assert!(cleared.user_id.is_none());
    assert!(cleared.practice_account_id.is_none());
}

#[tokio::test]
async fn test_refresh_without_refresh_token_short_circuits() {
    let server = MockServer::start().await;
    mount_refresh(&server, ResponseTemplate::new(200), 0).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let session = SessionStore::with_session(Session {
        access_token: Some("T1".to_string()),
        access_token_expiry: Some(now() - 1),
        login_id: Some("L1".to_string()),
        user_id: Some("U1".to_string()),
        ..Session::default()
    });
    let (redirects, hook) = redirect_log();
    let client = LumifiClient::builder()
        .base_url(server.uri())
        .session(session.clone())
        .on_session_expired(hook)
        .build()
        .unwrap();

    let err = client.get_practice("PA1").await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::SessionExpired(SessionExpired {
            reason: SessionExpiryReason::MissingCredentials,
            ..
        })
    ));
    assert_eq!(redirects.lock().unwrap().len(), 1);
    assert_eq!(session.snapshot(), Session::default());
}

#[tokio::test]
async fn test_session_and_source_headers_attached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/detail"))
        .and(query_param("userId", "U7"))
        .and(header("authorization", "Bearer T1"))
        .and(header(PRACTICE_ID_HEADER, "PA1"))
        .and(header(USER_ID_HEADER, "U1"))
        .and(header(LOGIN_ID_HEADER, "L1"))
        .and(header(SOURCE_IP_HEADER, "1.2.3.4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "U7",
            "first_name": "Grace",
            "role": "Doctor"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = LumifiClient::builder()
        .base_url(server.uri())
        .session(signed_in(now() + 600))
        .source_ip(Some("1.2.3.4".to_string()))
        .build()
        .unwrap();

    let user = client.get_user("U7").await.unwrap();
    assert_eq!(user.first_name, "Grace");
}

#[tokio::test]
async fn test_anonymous_request_sends_empty_source_ip_only() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/forgotPassword"))
        .and(query_param("emailId", "a@b.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Reset link sent",
            "status": "success"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = LumifiClient::new(server.uri()).unwrap();
    let response = client.forgot_password("a@b.com").await.unwrap();
    assert!(response.is_success());

    let requests = server.received_requests().await.unwrap();
    let headers = &requests[0].headers;
    assert_eq!(
        headers.get(SOURCE_IP_HEADER).map(|v| v.as_bytes()),
        Some(&b""[..])
    );
    assert!(headers.get("authorization").is_none());
    assert!(headers.get(PRACTICE_ID_HEADER).is_none());
}

#[tokio::test]
async fn test_success_body_is_returned_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/practice/register"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"foo": 1})))
        .mount(&server)
        .await;

    let client = LumifiClient::new(server.uri()).unwrap();
    let value = client
        .register_practice(&Default::default())
        .await
        .unwrap();
    assert_eq!(value, json!({"foo": 1}));
}

struct TaggingClassifier(Arc<AtomicUsize>);

impl ErrorClassifier for TaggingClassifier {
    fn handle(&self, failure: ApiFailure) -> ClientError {
        self.0.fetch_add(1, Ordering::SeqCst);
        match ApiErrorClassifier.handle(failure) {
            ClientError::NotFound(message) => ClientError::Validation(format!("tagged: {message}")),
            other => other,
        }
    }
}

#[tokio::test]
async fn test_every_failure_goes_through_classifier_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/patient/detail"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "no patient"})))
        .mount(&server)
        .await;

    let count = Arc::new(AtomicUsize::new(0));
    let client = LumifiClient::builder()
        .base_url(server.uri())
        .session(signed_in(now() + 600))
        .classifier(Arc::new(TaggingClassifier(count.clone())))
        .build()
        .unwrap();

    let err = client.get_patient("P1").await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(ref m) if m == "tagged: no patient"));
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unauthorized_response_ends_session() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/security/update"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "jwt expired"})))
        .mount(&server)
        .await;

    let (redirects, hook) = redirect_log();
    let session = signed_in(now() + 600);
    let client = LumifiClient::builder()
        .base_url(server.uri())
        .session(session.clone())
        .on_session_expired(hook)
        .build()
        .unwrap();

    let err = client
        .update_security(&lumifi_http::types::SecurityUpdateRequest {
            email_id: "a@b.com".to_string(),
            phone_number: "5550100".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::AuthenticationFailed(ref m) if m == "jwt expired"));
    assert!(err.is_auth_expired());
    assert!(!session.snapshot().is_authenticated());
    assert_eq!(redirects.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_network_failure_is_a_request_error() {
    let client = LumifiClient::builder()
        .base_url("http://127.0.0.1:9")
        .timeout(std::time::Duration::from_secs(2))
        .build()
        .unwrap();

    let err = client.list_roles().await.unwrap_err();
    assert!(matches!(err, ClientError::Request(_)));
    assert_eq!(err.user_message(), "An unexpected error occurred.");
}

#[tokio::test]
async fn test_default_user_agent_matches_config_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/state/list"))
        .and(header("user-agent", lumifi_core::DEFAULT_USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = LumifiClient::new(server.uri()).unwrap();
    assert!(client.list_states().await.unwrap().is_empty());
}
