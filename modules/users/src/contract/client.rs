use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::model::{NewUser, User, UserPatch};

/// Public API of the users module for other modules and the CLI.
#[async_trait]
pub trait UsersApi: Send + Sync {
    async fn get_user(&self, id: Uuid) -> anyhow::Result<User>;

    async fn create_user(&self, new_user: NewUser) -> anyhow::Result<User>;

    /// Same as `create_user` with `is_staff` and `is_superuser` set.
    async fn create_superuser(&self, email: &str, password: &str) -> anyhow::Result<User>;

    async fn authenticate(&self, email: &str, password: &str) -> anyhow::Result<User>;

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> anyhow::Result<User>;
}
