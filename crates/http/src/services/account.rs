//! Practice account creation

use crate::client::LumifiClient;
use crate::client::error::ClientError;
use crate::types::{
    CreatePracticeRequest, PracticeSoftware, ROLE_DOCTOR, Role, Specialty, UsState,
};
use lumifi_core::{is_valid_dea_number, is_valid_email};
use serde::Serialize;
use tracing::{debug, info};

/// Lookup lists the account wizard is built from
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReferenceData {
    pub software: Vec<PracticeSoftware>,
    pub specialties: Vec<Specialty>,
    pub states: Vec<UsState>,
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone)]
pub struct AccountSetup {
    client: LumifiClient,
}

impl AccountSetup {
    pub const fn new(client: LumifiClient) -> Self {
        Self { client }
    }

    /// Fetch every lookup list at once
    pub async fn reference_data(&self) -> Result<ReferenceData, ClientError> {
        let (software, specialties, states, roles) = tokio::try_join!(
            self.client.list_practice_software(),
            self.client.list_specialties(),
            self.client.list_states(),
            self.client.list_roles(),
        )?;
        debug!(
            software = software.len(),
            specialties = specialties.len(),
            states = states.len(),
            roles = roles.len(),
            "Loaded reference data"
        );
        Ok(ReferenceData {
            software,
            specialties,
            states,
            roles,
        })
    }

    /// Whether `email_id` is free to become the account admin
    pub async fn check_admin_availability(&self, email_id: &str) -> Result<bool, ClientError> {
        if !is_valid_email(email_id) {
            return Err(ClientError::Validation(format!(
                "'{email_id}' is not a valid email address"
            )));
        }
        let response = self.client.account_admin_availability(email_id).await?;
        Ok(response.is_success())
    }

    /// Register the practice after checking the doctor's DEA number
    pub async fn register(
        &self,
        request: &CreatePracticeRequest,
    ) -> Result<serde_json::Value, ClientError> {
        validate_registration(request)?;
        let response = self.client.register_practice(request).await?;
        info!(
            practice = %request.practice_info.practice_name,
            staff = request.user_info.len(),
            "Practice registered"
        );
        Ok(response)
    }

    /// The role doctors are created with
    pub fn doctor_role(roles: &[Role]) -> Option<&Role> {
        roles.iter().find(|role| role.role_name == ROLE_DOCTOR)
    }
}

fn validate_registration(request: &CreatePracticeRequest) -> Result<(), ClientError> {
    if request.practice_info.practice_name.trim().is_empty() {
        return Err(ClientError::Validation("practice name is required".into()));
    }

    let doctor = &request.doctor_info.user;
    if !doctor.dea.trim().is_empty() && !is_valid_dea_number(&doctor.dea, &doctor.last_name) {
        return Err(ClientError::Validation(format!(
            "DEA number {} does not match doctor {}",
            doctor.dea, doctor.last_name
        )));
    }
    Ok(())
}
