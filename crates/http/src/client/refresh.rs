//! Token refresh endpoint caller

use super::error::{ApiErrorClassifier, ClientError};
use crate::types::{RefreshTokenRequest, RefreshTokenResponse};
use async_trait::async_trait;
use reqwest::Client;

/// Path of the refresh endpoint, relative to the API base URL
pub const REFRESH_PATH: &str = "/auth/refreshToken";

/// Exchanges a refresh token for a new access token
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(
        &self,
        request: RefreshTokenRequest,
    ) -> Result<RefreshTokenResponse, ClientError>;
}

/// Calls the refresh endpoint on a bare HTTP client
///
/// No credentials are attached and failures skip the error classifier, so a
/// refresh can never recurse into another refresh.
#[derive(Debug, Clone)]
pub struct HttpTokenRefresher {
    http: Client,
    url: String,
}

impl HttpTokenRefresher {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            url: format!("{}{REFRESH_PATH}", base_url.trim_end_matches('/')),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(
        &self,
        request: RefreshTokenRequest,
    ) -> Result<RefreshTokenResponse, ClientError> {
        let response = self.http.post(&self.url).json(&request).send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ClientError::from_status(
                status,
                ApiErrorClassifier::extract_message(status, &body),
            ))
        }
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use mockall::mock;

    mock! {
        pub TokenRefresher {}

        #[async_trait]
        impl TokenRefresher for TokenRefresher {
            async fn refresh(
                &self,
                request: RefreshTokenRequest,
            ) -> Result<RefreshTokenResponse, ClientError>;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> RefreshTokenRequest {
        RefreshTokenRequest {
            login_id: "L1".to_string(),
            user_id: "U1".to_string(),
            refresh_token: "R1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_refresh_posts_camel_case_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .and(body_json(json!({
                "loginId": "L1",
                "userId": "U1",
                "refreshToken": "R1"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "message": "Token refreshed",
                "statusCode": 200,
                "authToken": "T2",
                "exp": 1_900_000_000
            })))
            .expect(1)
            .mount(&server)
            .await;

        let refresher = HttpTokenRefresher::new(Client::new(), &format!("{}/", server.uri()));
        let response = refresher.refresh(request()).await.unwrap();
        assert_eq!(response.into_grant(), Some(("T2".to_string(), 1_900_000_000)));
    }

    #[tokio::test]
    async fn test_refresh_error_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"message": "Refresh token revoked"})),
            )
            .mount(&server)
            .await;

        let refresher = HttpTokenRefresher::new(Client::new(), &server.uri());
        let err = refresher.refresh(request()).await.unwrap_err();
        assert!(matches!(err, ClientError::AuthenticationFailed(ref m) if m == "Refresh token revoked"));
    }
}
