//! Sign-in sequence: credentials, practice, two-factor code, completion

use crate::client::LumifiClient;
use crate::client::error::ClientError;
use crate::client::session::{AuthGrant, Session, SessionAction};
use crate::types::{
    AuthCompletionRequest, AuthCompletionResponse, LoginRequest, LoginResponse, MeRequest,
    ResendOtpRequest, ResendOtpResponse, STATUS_SUCCESS, SelectPracticeRequest,
    SelectPracticeResponse, StatusResponse, UserDetails, VerifyOtpRequest,
};
use lumifi_core::is_valid_email;
use tracing::{debug, info};

/// Outcome of choosing a practice
#[derive(Debug, Clone)]
pub struct PracticeSelection {
    /// A two-factor code must be verified before completion
    pub otp_required: bool,
    pub response: SelectPracticeResponse,
}

/// Drives the sign-in steps against a shared session
#[derive(Debug, Clone)]
pub struct LoginFlow {
    client: LumifiClient,
}

impl LoginFlow {
    pub const fn new(client: LumifiClient) -> Self {
        Self { client }
    }

    /// Submit email and password
    pub async fn login(&self, email_id: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let email_id = email_id.trim();
        if !is_valid_email(email_id) {
            return Err(ClientError::Validation(format!(
                "'{email_id}' is not a valid email address"
            )));
        }
        if password.is_empty() {
            return Err(ClientError::Validation("password is required".into()));
        }

        let response = self
            .client
            .login(&LoginRequest {
                email_id: email_id.to_string(),
                password: password.to_string(),
            })
            .await?;

        info!(
            login_id = %response.login_id,
            practices = response.practice_account_list.len(),
            "Login accepted"
        );
        self.client.session().dispatch(SessionAction::LoginStarted {
            login_id: response.login_id.clone(),
            email_id: response
                .email_id
                .clone()
                .unwrap_or_else(|| email_id.to_string()),
            practice_accounts: response.practice_account_list.clone(),
        });
        Ok(response)
    }

    /// Choose the practice account to sign in to
    pub async fn select_practice(
        &self,
        practice_account_id: &str,
    ) -> Result<PracticeSelection, ClientError> {
        let session = self.client.session().snapshot();
        let login_id = required(session.login_id.as_deref(), "login id")?;
        let email_id = required(session.email_id.as_deref(), "email id")?;

        let response = self
            .client
            .select_login_practice_account(&SelectPracticeRequest {
                login_id: login_id.to_string(),
                email_id: email_id.to_string(),
                practice_account_id: practice_account_id.to_string(),
            })
            .await?;

        debug!(practice_account_id, has_2fa = response.has2fa, "Practice selected");
        self.client
            .session()
            .dispatch(SessionAction::PracticeSelected {
                user_id: response.user_id.clone(),
                practice_account_id: practice_account_id.to_string(),
                has_2fa: response.has2fa,
            });
        Ok(PracticeSelection {
            otp_required: response.has2fa,
            response,
        })
    }

    pub async fn verify_otp(&self, otp: &str) -> Result<StatusResponse, ClientError> {
        let session = self.client.session().snapshot();
        let otp = otp.trim();
        if otp.is_empty() {
            return Err(ClientError::Validation("verification code is required".into()));
        }
        self.client
            .verify_otp(&VerifyOtpRequest {
                login_id: required(session.login_id.as_deref(), "login id")?.to_string(),
                email_id: required(session.email_id.as_deref(), "email id")?.to_string(),
                otp: otp.to_string(),
            })
            .await
    }

    pub async fn resend_otp(&self) -> Result<ResendOtpResponse, ClientError> {
        let session = self.client.session().snapshot();
        self.client
            .resend_otp(&ResendOtpRequest {
                login_id: required(session.login_id.as_deref(), "login id")?.to_string(),
                email_id: required(session.email_id.as_deref(), "email id")?.to_string(),
            })
            .await
    }

    /// Finish sign-in; the session is authenticated only on success
    pub async fn complete(&self) -> Result<AuthCompletionResponse, ClientError> {
        let session = self.client.session().snapshot();
        let request = completion_request(&session)?;
        let response = self.client.complete_auth(&request).await?;

        if response.status != STATUS_SUCCESS {
            debug!(status = %response.status, "Completion did not succeed");
            return Ok(response);
        }

        let (Some(access_token), Some(refresh_token), Some(expires_at)) = (
            response.auth_token.clone(),
            response.refresh_token.clone(),
            response.exp,
        ) else {
            return Err(ClientError::Validation(
                "sign-in completed without issuing credentials".into(),
            ));
        };

        self.client
            .session()
            .dispatch(SessionAction::Authenticated(AuthGrant {
                access_token,
                refresh_token,
                expires_at,
                user_details: response.user_details.clone(),
            }));
        info!(user_id = %request.user_id, "Signed in");
        Ok(response)
    }

    /// Current user's profile
    pub async fn fetch_profile(&self) -> Result<UserDetails, ClientError> {
        let session = self.client.session().snapshot();
        let response = self
            .client
            .me(&MeRequest {
                user_id: required(session.user_id.as_deref(), "user id")?.to_string(),
                practice_account_id: required(
                    session.practice_account_id.as_deref(),
                    "practice account id",
                )?
                .to_string(),
            })
            .await?;
        Ok(response.user_details)
    }

    /// Forget the local session
    pub fn logout(&self) {
        self.client.session().dispatch(SessionAction::Clear);
        info!("Signed out");
    }
}

fn completion_request(session: &Session) -> Result<AuthCompletionRequest, ClientError> {
    Ok(AuthCompletionRequest {
        login_id: required(session.login_id.as_deref(), "login id")?.to_string(),
        user_id: required(session.user_id.as_deref(), "user id")?.to_string(),
        practice_account_id: required(
            session.practice_account_id.as_deref(),
            "practice account id",
        )?
        .to_string(),
        email_id: required(session.email_id.as_deref(), "email id")?.to_string(),
    })
}

fn required<'a>(value: Option<&'a str>, what: &str) -> Result<&'a str, ClientError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ClientError::Validation(format!("{what} missing from session, sign in first")))
}
