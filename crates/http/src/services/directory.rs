//! Users, doctors, patients and details of the signed-in practice

use super::account::AccountSetup;
use crate::client::LumifiClient;
use crate::client::error::ClientError;
use crate::types::{
    CreatePatientRequest, CreateUserRequest, DEFAULT_PAGE, DEFAULT_PAGE_LIMIT, PAGE_LIMITS,
    Pagination, Patient, PatientSearchRequest, ROLE_DOCTOR, StatusResponse,
    UpdatePatientRequest, UpdatePracticeInfoRequest, UpdatePracticeInfoResponse,
    UpdateUserRequest, User, UserListRequest,
};
use lumifi_core::{is_valid_dea_number, is_valid_email};
use tracing::info;

/// A listing row with the actions offered for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub user: User,
    /// Account owners get no edit or delete menu
    pub has_action_menu: bool,
}

impl From<User> for UserRow {
    fn from(user: User) -> Self {
        Self {
            has_action_menu: user.is_manageable(),
            user,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserPage {
    pub rows: Vec<UserRow>,
    pub pagination: Pagination,
}

/// Page request for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    /// Clamp to a valid page and one of the offered page sizes
    pub fn normalized(self) -> Self {
        let limit = if PAGE_LIMITS.contains(&self.limit) {
            self.limit
        } else {
            DEFAULT_PAGE_LIMIT
        };
        Self {
            page: self.page.max(DEFAULT_PAGE),
            limit,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PracticeDirectory {
    client: LumifiClient,
}

impl PracticeDirectory {
    pub const fn new(client: LumifiClient) -> Self {
        Self { client }
    }

    /// Users of every role
    pub async fn users(&self, page: PageRequest) -> Result<UserPage, ClientError> {
        self.list("", page).await
    }

    pub async fn doctors(&self, page: PageRequest) -> Result<UserPage, ClientError> {
        self.list(ROLE_DOCTOR, page).await
    }

    async fn list(&self, role: &str, page: PageRequest) -> Result<UserPage, ClientError> {
        let practice_account_id = self
            .client
            .session()
            .snapshot()
            .practice_account_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                ClientError::Validation("no practice selected, sign in first".into())
            })?;
        let page = page.normalized();

        let response = self
            .client
            .list_users(&UserListRequest {
                practice_account_id,
                page: page.page,
                limit: page.limit,
                role: role.to_string(),
            })
            .await?;

        Ok(UserPage {
            rows: response.list.into_iter().map(UserRow::from).collect(),
            pagination: response.pagination,
        })
    }

    pub async fn create_user(
        &self,
        user: &CreateUserRequest,
    ) -> Result<StatusResponse, ClientError> {
        validate_user(user)?;
        let response = self.client.create_user(user).await?;
        info!(role = %user.role, "User created");
        Ok(response)
    }

    /// Create a user with the practice's `Doctor` role
    pub async fn create_doctor(
        &self,
        doctor: CreateUserRequest,
    ) -> Result<StatusResponse, ClientError> {
        let roles = self.client.list_roles().await?;
        let role = AccountSetup::doctor_role(&roles)
            .ok_or_else(|| ClientError::Validation("no Doctor role is offered".into()))?;
        let doctor = CreateUserRequest {
            role_id: role.id.clone(),
            role: role.role_name.clone(),
            ..doctor
        };
        self.create_user(&doctor).await
    }

    pub async fn update_user(
        &self,
        user: &UpdateUserRequest,
    ) -> Result<StatusResponse, ClientError> {
        if user.id.is_empty() {
            return Err(ClientError::Validation("user id is required".into()));
        }
        validate_user(&user.user)?;
        self.client.update_user(user).await
    }

    /// Save edited practice details
    pub async fn update_practice(
        &self,
        practice: &UpdatePracticeInfoRequest,
    ) -> Result<UpdatePracticeInfoResponse, ClientError> {
        if practice.id.is_empty() {
            return Err(ClientError::Validation("practice id is required".into()));
        }
        if practice.practice_name.trim().is_empty() {
            return Err(ClientError::Validation("practice name is required".into()));
        }
        if !practice.office_email.is_empty() && !is_valid_email(&practice.office_email) {
            return Err(ClientError::Validation(format!(
                "'{}' is not a valid email address",
                practice.office_email
            )));
        }
        self.client.update_practice(practice).await
    }

    /// Search patients; at least one criterion is required
    pub async fn search_patients(
        &self,
        search: &PatientSearchRequest,
    ) -> Result<Vec<Patient>, ClientError> {
        let given = [&search.first_name, &search.last_name, &search.dob]
            .iter()
            .any(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()));
        if !given {
            return Err(ClientError::Validation(
                "give a first name, last name or date of birth".into(),
            ));
        }
        self.client.search_patients(search).await
    }

    pub async fn create_patient(
        &self,
        patient: &CreatePatientRequest,
    ) -> Result<StatusResponse, ClientError> {
        validate_patient(patient)?;
        self.client.create_patient(patient).await
    }

    pub async fn update_patient(
        &self,
        patient: &UpdatePatientRequest,
    ) -> Result<StatusResponse, ClientError> {
        if patient.id.is_empty() {
            return Err(ClientError::Validation("patient id is required".into()));
        }
        validate_patient(&patient.patient)?;
        self.client.update_patient(patient).await
    }
}

fn validate_user(user: &CreateUserRequest) -> Result<(), ClientError> {
    if user.first_name.trim().is_empty() || user.last_name.trim().is_empty() {
        return Err(ClientError::Validation("first and last name are required".into()));
    }
    if !is_valid_email(&user.email_id) {
        return Err(ClientError::Validation(format!(
            "'{}' is not a valid email address",
            user.email_id
        )));
    }
    if user.role_id.is_empty() {
        return Err(ClientError::Validation("a role is required".into()));
    }
    if user.role == ROLE_DOCTOR
        && !user.dea.trim().is_empty()
        && !is_valid_dea_number(&user.dea, &user.last_name)
    {
        return Err(ClientError::Validation(format!(
            "DEA number {} does not match doctor {}",
            user.dea, user.last_name
        )));
    }
    Ok(())
}

fn validate_patient(patient: &CreatePatientRequest) -> Result<(), ClientError> {
    if patient.first_name.trim().is_empty() || patient.last_name.trim().is_empty() {
        return Err(ClientError::Validation("first and last name are required".into()));
    }
    if patient.dob.trim().is_empty() {
        return Err(ClientError::Validation("date of birth is required".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ROLE_ACCOUNT_OWNER;

    #[test]
    fn test_owner_rows_have_no_action_menu() {
        let owner = UserRow::from(User {
            role: ROLE_ACCOUNT_OWNER.to_string(),
            ..User::default()
        });
        let doctor = UserRow::from(User {
            role: ROLE_DOCTOR.to_string(),
            ..User::default()
        });
        assert!(!owner.has_action_menu);
        assert!(doctor.has_action_menu);
    }

    #[test]
    fn test_page_request_normalization() {
        assert_eq!(
            PageRequest { page: 0, limit: 7 }.normalized(),
            PageRequest::default()
        );
        assert_eq!(
            PageRequest { page: 3, limit: 25 }.normalized(),
            PageRequest { page: 3, limit: 25 }
        );
    }

    #[test]
    fn test_patient_requires_names_and_dob() {
        let patient = CreatePatientRequest {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            ..CreatePatientRequest::default()
        };
        assert!(validate_patient(&patient).is_err());
        let patient = CreatePatientRequest {
            dob: "1990-01-01".to_string(),
            ..patient
        };
        assert!(validate_patient(&patient).is_ok());
    }

    #[test]
    fn test_user_requires_role_and_valid_doctor_dea() {
        let user = CreateUserRequest {
            first_name: "Grace".to_string(),
            last_name: "Smith".to_string(),
            email_id: "grace@practice.com".to_string(),
            role: ROLE_DOCTOR.to_string(),
            dea: "AS1234563".to_string(),
            ..CreateUserRequest::default()
        };
        assert!(validate_user(&user).is_err());

        let user = CreateUserRequest {
            role_id: "2".to_string(),
            ..user
        };
        assert!(validate_user(&user).is_ok());

        let wrong_dea = CreateUserRequest {
            dea: "AS1234564".to_string(),
            ..user.clone()
        };
        assert!(validate_user(&wrong_dea).is_err());

        let bad_email = CreateUserRequest {
            email_id: "grace".to_string(),
            ..user
        };
        assert!(validate_user(&bad_email).is_err());
    }
}
