//! Authentication API client methods

use super::{ClientError, LumifiClient};
use crate::types::{
    AuthCompletionRequest, AuthCompletionResponse, LoginRequest, LoginResponse, MeRequest,
    MeResponse, PasswordRequest, ResendOtpRequest, ResendOtpResponse, SelectPracticeRequest,
    SelectPracticeResponse, StatusResponse, VerifyOtpRequest,
};
use reqwest::Method;

impl LumifiClient {
    /// Check email and password, returning the practices of this login
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ClientError> {
        let req = self.request(Method::POST, "/auth/login").json(request);
        self.execute(req).await
    }

    /// Choose which practice account to sign in to
    pub async fn select_login_practice_account(
        &self,
        request: &SelectPracticeRequest,
    ) -> Result<SelectPracticeResponse, ClientError> {
        let req = self
            .request(Method::POST, "/auth/selectLoginPracticeAccount")
            .json(request);
        self.execute(req).await
    }

    /// Verify a two-factor code
    pub async fn verify_otp(
        &self,
        request: &VerifyOtpRequest,
    ) -> Result<StatusResponse, ClientError> {
        let req = self.request(Method::POST, "/auth/verifyOtp").json(request);
        self.execute(req).await
    }

    /// Send a new two-factor code
    pub async fn resend_otp(
        &self,
        request: &ResendOtpRequest,
    ) -> Result<ResendOtpResponse, ClientError> {
        let req = self.request(Method::POST, "/auth/resendOtp").json(request);
        self.execute(req).await
    }

    /// Finish sign-in and obtain tokens
    pub async fn complete_auth(
        &self,
        request: &AuthCompletionRequest,
    ) -> Result<AuthCompletionResponse, ClientError> {
        let req = self.request(Method::POST, "/auth/completion").json(request);
        self.execute(req).await
    }

    /// Profile of the signed-in user
    pub async fn me(&self, request: &MeRequest) -> Result<MeResponse, ClientError> {
        let req = self.request(Method::POST, "/auth/me").json(request);
        self.execute(req).await
    }

    /// Email a password reset link
    pub async fn forgot_password(&self, email_id: &str) -> Result<StatusResponse, ClientError> {
        let req = self
            .request(Method::GET, "/auth/forgotPassword")
            .query(&[("emailId", email_id)]);
        self.execute(req).await
    }

    pub async fn reset_password(
        &self,
        request: &PasswordRequest,
    ) -> Result<StatusResponse, ClientError> {
        let req = self.request(Method::POST, "/auth/resetPassword").json(request);
        self.execute(req).await
    }

    /// Set the first password of a newly invited user
    pub async fn set_password(
        &self,
        request: &PasswordRequest,
    ) -> Result<StatusResponse, ClientError> {
        let req = self.request(Method::POST, "/auth/setPassword").json(request);
        self.execute(req).await
    }
}
