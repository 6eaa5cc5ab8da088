//! Wire types shared by the endpoint wrappers
//!
//! Request payloads are camelCase JSON. Rows returned by listing and detail
//! endpoints are snake_case database records.

use serde::{Deserialize, Serialize};

/// Status value the backend uses for successful envelopes
pub const STATUS_SUCCESS: &str = "success";

/// Role name of practice account owners
pub const ROLE_ACCOUNT_OWNER: &str = "Account Owner";

/// Role name used to filter doctors out of the user listing
pub const ROLE_DOCTOR: &str = "Doctor";

/// Generic `{message, status}` acknowledgement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

impl StatusResponse {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

// Authentication

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email_id: String,
    pub password: String,
}

/// A practice the login is attached to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeAccount {
    pub id: String,
    pub practice_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub login_id: String,
    #[serde(default)]
    pub email_id: Option<String>,
    #[serde(default)]
    pub practice_account_list: Vec<PracticeAccount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    pub login_id: String,
    pub email_id: String,
    pub otp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResendOtpRequest {
    pub login_id: String,
    pub email_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResendOtpResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub otp: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectPracticeRequest {
    pub login_id: String,
    pub email_id: String,
    pub practice_account_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectPracticeResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub login_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub email_id: String,
    #[serde(default)]
    pub has2fa: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthCompletionRequest {
    pub login_id: String,
    pub user_id: String,
    pub practice_account_id: String,
    pub email_id: String,
}

/// Profile of the signed-in user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserDetails {
    pub id: String,
    pub readable_id: String,
    pub practice_account_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email_id: String,
    pub phone_number: String,
    pub role_id: String,
    pub role: String,
    pub dea: String,
    pub license_number: String,
    pub state_of_issue: String,
    pub has_2fa: bool,
    pub active_status: bool,
    pub account_verified: bool,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub doctor_email_id: Option<String>,
}

/// Result of `/auth/completion`: the credential grant on success
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthCompletionResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub user_details: Option<UserDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub login_id: String,
    pub user_id: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
}

impl RefreshTokenResponse {
    /// The new token and expiry, only when the refresh fully succeeded
    pub fn into_grant(self) -> Option<(String, i64)> {
        if self.status != STATUS_SUCCESS {
            return None;
        }
        match (self.auth_token, self.exp) {
            (Some(token), Some(exp)) if !token.is_empty() && exp > 0 => Some((token, exp)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeRequest {
    pub user_id: String,
    pub practice_account_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub user_details: UserDetails,
}

/// Body of both `/auth/setPassword` and `/auth/resetPassword`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordRequest {
    /// One-time credential from the emailed link
    pub credential: String,
    pub password: String,
}

// Users and doctors

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(rename = "currentPage")]
    pub current_page: u32,
    #[serde(rename = "rowsPerPage")]
    pub rows_per_page: u32,
    #[serde(rename = "totalItems")]
    pub total_items: u32,
    #[serde(rename = "totalPages")]
    pub total_pages: u32,
    #[serde(rename = "hasNextPage")]
    pub has_next_page: bool,
    #[serde(rename = "hasPreviousPage")]
    pub has_previous_page: bool,
    #[serde(rename = "nextPage", default)]
    pub next_page: Option<u32>,
    #[serde(rename = "previousPage", default)]
    pub previous_page: Option<u32>,
}

/// Page sizes offered by listing screens
pub const PAGE_LIMITS: [u32; 3] = [5, 10, 25];

/// First page index of listings
pub const DEFAULT_PAGE: u32 = 1;

/// Rows per page when none is requested
pub const DEFAULT_PAGE_LIMIT: u32 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListRequest {
    pub practice_account_id: String,
    pub page: u32,
    pub limit: u32,
    /// Role filter, empty for every role
    pub role: String,
}

/// A row of the user (or doctor) listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: String,
    pub readable_id: String,
    pub practice_account_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email_id: String,
    pub phone_number: String,
    pub role_id: String,
    pub role: String,
    pub dea: String,
    pub license_number: String,
    pub state_id: Option<String>,
    pub state_of_issue: String,
    pub has_2fa: bool,
    pub active_status: bool,
    pub doctor_email_id: Option<String>,
    pub account_verified: bool,
}

impl User {
    /// Account owners cannot be edited or removed from the listing
    pub fn is_manageable(&self) -> bool {
        self.role != ROLE_ACCOUNT_OWNER
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserListResponse {
    pub pagination: Pagination,
    #[serde(default)]
    pub list: Vec<User>,
}

/// Detail record from `/user/detail`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserDetail {
    pub id: String,
    pub readable_id: String,
    pub practice_account_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email_id: String,
    pub phone_number: String,
    pub role_id: String,
    pub role: String,
    pub dea: String,
    pub license_number: String,
    pub state_of_issue: String,
    pub has_2fa: bool,
    pub active_status: bool,
    pub is_password_active: bool,
    pub password_reset_at: Option<String>,
    pub is_password_reset: bool,
    pub doctor_email_id: Option<String>,
    pub account_verified: bool,
}

/// Create payload for users and doctors
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email_id: String,
    pub has2fa: bool,
    pub phone_number: String,
    pub role_id: String,
    pub role: String,
    pub dea: String,
    pub license_number: String,
    pub state_of_issue: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub id: String,
    #[serde(flatten)]
    pub user: CreateUserRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub role_name: String,
}

// Patients

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSearchRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub dob: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Patient {
    pub id: String,
    pub readable_id: String,
    pub first_name: String,
    pub last_name: String,
    pub dob: String,
    pub email_id: String,
    pub phone_number: String,
    pub active_status: bool,
    pub implants: Vec<serde_json::Value>,
}

/// Detail record from `/patient/detail`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientDetail {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub dob: String,
    pub email_id: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePatientRequest {
    pub first_name: String,
    pub last_name: String,
    pub dob: String,
    pub email_id: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePatientRequest {
    pub id: String,
    #[serde(flatten)]
    pub patient: CreatePatientRequest,
}

// Practice

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PracticeInfo {
    pub id: String,
    pub readable_id: String,
    pub practice_name: String,
    pub address1: String,
    pub address2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub office_email: String,
    pub office_phone: String,
    pub website_address: String,
    pub speciality_id: String,
    pub speciality_name: String,
    pub practice_software_id: String,
    pub practice_software_name: String,
    pub has_accepted_terms: bool,
    pub active_status: bool,
    pub account_verified: bool,
    pub country_id: String,
    pub country: String,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePracticeInfoRequest {
    pub id: String,
    pub practice_name: String,
    pub address1: String,
    pub address2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub office_email: String,
    pub office_phone: String,
    pub website_address: String,
    pub speciality_id: String,
    pub speciality_name: String,
    pub practice_software_id: String,
    pub practice_software_name: String,
    pub has_accepted_terms: bool,
}

/// Start an edit from the stored details
impl From<PracticeInfo> for UpdatePracticeInfoRequest {
    fn from(info: PracticeInfo) -> Self {
        Self {
            id: info.id,
            practice_name: info.practice_name,
            address1: info.address1,
            address2: info.address2,
            city: info.city,
            state: info.state,
            zip: info.zip,
            office_email: info.office_email,
            office_phone: info.office_phone,
            website_address: info.website_address,
            speciality_id: info.speciality_id,
            speciality_name: info.speciality_name,
            practice_software_id: info.practice_software_id,
            practice_software_name: info.practice_software_name,
            has_accepted_terms: info.has_accepted_terms,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePracticeInfoResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeInformation {
    pub practice_name: String,
    pub address1: String,
    pub address2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub office_email: String,
    pub office_phone: String,
    pub website_address: String,
    pub speciality_id: String,
    pub speciality_name: String,
    pub practice_software_id: String,
    pub practice_software_name: String,
    pub has_accepted_terms: bool,
    pub country_id: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInformation {
    pub first_name: String,
    pub last_name: String,
    pub email_id: String,
    pub has2fa: bool,
    pub phone_number: String,
    pub role_id: String,
    pub role: String,
    pub dea: String,
    pub license_number: String,
    pub state_of_issue: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorInformation {
    #[serde(flatten)]
    pub user: UserInformation,
    pub doctor_email_id: String,
}

/// Body of `/practice/register`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePracticeRequest {
    pub practice_info: PracticeInformation,
    pub doctor_info: DoctorInformation,
    pub user_info: Vec<UserInformation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeSoftware {
    pub id: String,
    pub software_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specialty {
    pub id: String,
    pub speciality_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsState {
    pub id: String,
    pub dial_code: String,
    pub state_name: String,
    pub state_abbr: String,
}

// Security

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityUpdateRequest {
    pub email_id: String,
    pub phone_number: String,
}
