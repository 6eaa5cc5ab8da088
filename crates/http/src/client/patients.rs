//! Patient API client methods

use super::{ClientError, LumifiClient};
use crate::types::{
    CreatePatientRequest, Patient, PatientDetail, PatientSearchRequest, StatusResponse,
    UpdatePatientRequest,
};
use reqwest::Method;

impl LumifiClient {
    pub async fn search_patients(
        &self,
        request: &PatientSearchRequest,
    ) -> Result<Vec<Patient>, ClientError> {
        let req = self.request(Method::POST, "/patient/search").json(request);
        self.execute(req).await
    }

    pub async fn get_patient(&self, patient_id: &str) -> Result<PatientDetail, ClientError> {
        let req = self
            .request(Method::GET, "/patient/detail")
            .query(&[("id", patient_id)]);
        self.execute(req).await
    }

    pub async fn create_patient(
        &self,
        request: &CreatePatientRequest,
    ) -> Result<StatusResponse, ClientError> {
        let req = self.request(Method::POST, "/patient/create").json(request);
        self.execute(req).await
    }

    pub async fn update_patient(
        &self,
        request: &UpdatePatientRequest,
    ) -> Result<StatusResponse, ClientError> {
        let req = self.request(Method::PUT, "/patient/update").json(request);
        self.execute(req).await
    }
}
