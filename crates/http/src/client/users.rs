//! User and doctor API client methods

use super::{ClientError, LumifiClient};
use crate::types::{
    CreateUserRequest, Role, StatusResponse, UpdateUserRequest, UserDetail, UserListRequest,
    UserListResponse,
};
use reqwest::Method;

impl LumifiClient {
    /// One page of the practice's users, optionally filtered by role
    pub async fn list_users(
        &self,
        request: &UserListRequest,
    ) -> Result<UserListResponse, ClientError> {
        let req = self.request(Method::POST, "/user/list").json(request);
        self.execute(req).await
    }

    pub async fn get_user(&self, user_id: &str) -> Result<UserDetail, ClientError> {
        let req = self
            .request(Method::GET, "/user/detail")
            .query(&[("userId", user_id)]);
        self.execute(req).await
    }

    pub async fn create_user(
        &self,
        request: &CreateUserRequest,
    ) -> Result<StatusResponse, ClientError> {
        let req = self.request(Method::POST, "/user/create").json(request);
        self.execute(req).await
    }

    pub async fn update_user(
        &self,
        request: &UpdateUserRequest,
    ) -> Result<StatusResponse, ClientError> {
        let req = self.request(Method::PUT, "/user/update").json(request);
        self.execute(req).await
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<StatusResponse, ClientError> {
        let req = self
            .request(Method::DELETE, "/user/delete")
            .query(&[("userId", user_id)]);
        self.execute(req).await
    }

    /// Roles a user can be given
    pub async fn list_roles(&self) -> Result<Vec<Role>, ClientError> {
        let req = self.request(Method::GET, "/user/role");
        self.execute(req).await
    }
}
