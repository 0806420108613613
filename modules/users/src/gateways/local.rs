use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::contract::{
    client::UsersApi,
    error::UsersError,
    model::{NewUser, User, UserPatch},
};
use crate::domain::{error::DomainError, service::Service};

/// In-process `UsersApi` that delegates to the domain service.
pub struct UsersLocalClient {
    service: Arc<Service>,
}

impl UsersLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl UsersApi for UsersLocalClient {
    async fn get_user(&self, id: Uuid) -> anyhow::Result<User> {
        self.service.get_user(id).await.map_err(map_domain_error)
    }

    async fn create_user(&self, new_user: NewUser) -> anyhow::Result<User> {
        self.service
            .create_user(new_user)
            .await
            .map_err(map_domain_error)
    }

    async fn create_superuser(&self, email: &str, password: &str) -> anyhow::Result<User> {
        self.service
            .create_superuser(email, password)
            .await
            .map_err(map_domain_error)
    }

    async fn authenticate(&self, email: &str, password: &str) -> anyhow::Result<User> {
        self.service
            .authenticate(email, password)
            .await
            .map_err(map_domain_error)
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> anyhow::Result<User> {
        self.service
            .update_user(id, patch)
            .await
            .map_err(map_domain_error)
    }
}

fn map_domain_error(domain_error: DomainError) -> anyhow::Error {
    let contract_error = match domain_error {
        DomainError::UserNotFound { id } => UsersError::NotFound { id },
        DomainError::EmailAlreadyExists { email } => UsersError::Conflict { email },
        DomainError::InvalidCredentials => UsersError::InvalidCredentials,
        e @ (DomainError::EmptyEmail
        | DomainError::InvalidEmail { .. }
        | DomainError::PasswordTooShort { .. }
        | DomainError::NameTooLong { .. }) => UsersError::Validation {
            message: e.to_string(),
        },
        DomainError::Hashing { .. } | DomainError::Database { .. } => UsersError::Internal,
    };

    anyhow::Error::new(contract_error)
}
