//! Practice, reference data and security API client methods

use super::{ClientError, LumifiClient};
use crate::types::{
    CreatePracticeRequest, PracticeInfo, PracticeSoftware, SecurityUpdateRequest, Specialty,
    StatusResponse, UpdatePracticeInfoRequest, UpdatePracticeInfoResponse, UsState,
};
use reqwest::Method;

impl LumifiClient {
    pub async fn get_practice(&self, practice_id: &str) -> Result<PracticeInfo, ClientError> {
        let req = self
            .request(Method::GET, "/practice")
            .query(&[("id", practice_id)]);
        self.execute(req).await
    }

    pub async fn update_practice(
        &self,
        request: &UpdatePracticeInfoRequest,
    ) -> Result<UpdatePracticeInfoResponse, ClientError> {
        let req = self.request(Method::PUT, "/practice/update").json(request);
        self.execute(req).await
    }

    /// Create a practice with its doctor and staff
    ///
    /// The response shape is not fixed, so it is returned untouched.
    pub async fn register_practice(
        &self,
        request: &CreatePracticeRequest,
    ) -> Result<serde_json::Value, ClientError> {
        let req = self.request(Method::POST, "/practice/register").json(request);
        self.execute_value(req).await
    }

    /// Whether `email_id` can still become an account admin
    pub async fn account_admin_availability(
        &self,
        email_id: &str,
    ) -> Result<StatusResponse, ClientError> {
        let req = self
            .request(Method::GET, "/practice/accountAdminAvailability")
            .query(&[("emailId", email_id)]);
        self.execute(req).await
    }

    pub async fn list_practice_software(&self) -> Result<Vec<PracticeSoftware>, ClientError> {
        self.execute(self.request(Method::GET, "/practice/software"))
            .await
    }

    pub async fn list_specialties(&self) -> Result<Vec<Specialty>, ClientError> {
        self.execute(self.request(Method::GET, "/practice/speciality"))
            .await
    }

    pub async fn list_states(&self) -> Result<Vec<UsState>, ClientError> {
        self.execute(self.request(Method::GET, "/state/list")).await
    }

    /// Change the contact details used for two-factor codes
    pub async fn update_security(
        &self,
        request: &SecurityUpdateRequest,
    ) -> Result<StatusResponse, ClientError> {
        let req = self.request(Method::PUT, "/security/update").json(request);
        self.execute(req).await
    }
}
