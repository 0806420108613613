use chrono::Utc;
use sea_orm::{DatabaseConnection, SqlErr};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::UsersConfig;
use crate::contract::model::{NewUser, User, UserPatch};
use crate::domain::error::DomainError;
use crate::infra::storage::{entity, mapper};
use modkit_auth::password;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub min_password_length: usize,
    pub max_name_length: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        UsersConfig::default().into()
    }
}

impl From<UsersConfig> for ServiceConfig {
    fn from(cfg: UsersConfig) -> Self {
        Self {
            min_password_length: cfg.min_password_length,
            max_name_length: cfg.max_name_length,
        }
    }
}

/// Lower-cases the domain part of an address, keeping the local part as typed.
pub fn normalize_email(email: &str) -> Result<String, DomainError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(DomainError::EmptyEmail);
    }
    let (local, domain) = email
        .rsplit_once('@')
        .ok_or_else(|| DomainError::invalid_email(email))?;
    if local.is_empty() || domain.is_empty() || local.contains('@') || email.contains(' ') {
        return Err(DomainError::invalid_email(email));
    }
    Ok(format!("{local}@{}", domain.to_lowercase()))
}

/// Account rules on top of the `users` table.
pub struct Service {
    db: DatabaseConnection,
    config: ServiceConfig,
}

impl Service {
    pub fn new(db: DatabaseConnection, config: ServiceConfig) -> Self {
        Self { db, config }
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
        entity::find_by_id(&self.db, id)
            .await?
            .map(mapper::entity_to_contract)
            .ok_or_else(|| DomainError::user_not_found(id))
    }

    #[instrument(skip(self, new_user), fields(email = %new_user.email))]
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, DomainError> {
        self.insert(new_user, false).await
    }

    #[instrument(skip(self, password))]
    pub async fn create_superuser(&self, email: &str, password: &str) -> Result<User, DomainError> {
        let new_user = NewUser {
            email: email.to_owned(),
            password: password.to_owned(),
            name: String::new(),
        };
        self.insert(new_user, true).await
    }

    async fn insert(&self, new_user: NewUser, superuser: bool) -> Result<User, DomainError> {
        let email = normalize_email(&new_user.email)?;
        self.validate_password(&new_user.password)?;
        let name = self.validate_name(&new_user.name)?;

        if entity::email_exists(&self.db, &email).await? {
            return Err(DomainError::email_already_exists(email));
        }

        let password_hash = hash_blocking(new_user.password).await?;

        let now = Utc::now();
        let row = entity::NewUserEntity {
            id: Uuid::new_v4(),
            email: email.clone(),
            name,
            password_hash,
            is_active: true,
            is_staff: superuser,
            is_superuser: superuser,
            created_at: now,
            updated_at: now,
        };
        let model = entity::create(&self.db, row)
            .await
            .map_err(|e| unique_violation_or(e, &email))?;

        info!(user_id = %model.id, superuser, "Created user");
        Ok(mapper::entity_to_contract(model))
    }

    /// Active user with a matching password, else `InvalidCredentials`.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, DomainError> {
        let email = normalize_email(email).map_err(|_| DomainError::InvalidCredentials)?;
        let Some(model) = entity::find_by_email(&self.db, &email).await? else {
            debug!("authentication failed: unknown email");
            return Err(DomainError::InvalidCredentials);
        };
        if !model.is_active
            || !verify_blocking(password.to_owned(), model.password_hash.clone()).await?
        {
            debug!(user_id = %model.id, "authentication failed");
            return Err(DomainError::InvalidCredentials);
        }
        Ok(mapper::entity_to_contract(model))
    }

    pub async fn check_password(&self, id: Uuid, password: &str) -> Result<bool, DomainError> {
        let model = entity::find_by_id(&self.db, id)
            .await?
            .ok_or_else(|| DomainError::user_not_found(id))?;
        verify_blocking(password.to_owned(), model.password_hash).await
    }

    #[instrument(skip(self, patch))]
    pub async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<User, DomainError> {
        let current = entity::find_by_id(&self.db, id)
            .await?
            .ok_or_else(|| DomainError::user_not_found(id))?;

        let email = match patch.email {
            Some(raw) => {
                let email = normalize_email(&raw)?;
                if email != current.email && entity::email_exists(&self.db, &email).await? {
                    return Err(DomainError::email_already_exists(email));
                }
                Some(email)
            }
            None => None,
        };
        let name = patch
            .name
            .as_deref()
            .map(|n| self.validate_name(n))
            .transpose()?;
        let password_hash = match patch.password {
            Some(pw) => {
                self.validate_password(&pw)?;
                Some(hash_blocking(pw).await?)
            }
            None => None,
        };

        let conflict_email = email.clone().unwrap_or_else(|| current.email.clone());
        let update = entity::UpdateUserEntity {
            email,
            name,
            password_hash,
            updated_at: Some(Utc::now()),
        };
        let model = entity::update(&self.db, id, update)
            .await
            .map_err(|e| unique_violation_or(e, &conflict_email))?;

        info!(user_id = %id, "Updated user");
        Ok(mapper::entity_to_contract(model))
    }

    fn validate_password(&self, password: &str) -> Result<(), DomainError> {
        if password.chars().count() < self.config.min_password_length {
            return Err(DomainError::PasswordTooShort {
                min: self.config.min_password_length,
            });
        }
        Ok(())
    }

    fn validate_name(&self, name: &str) -> Result<String, DomainError> {
        let name = name.trim();
        let len = name.chars().count();
        if len > self.config.max_name_length {
            return Err(DomainError::NameTooLong {
                len,
                max: self.config.max_name_length,
            });
        }
        Ok(name.to_owned())
    }
}

// Two concurrent signups can both pass the existence check; the unique index decides.
/// Argon2 is CPU-bound; keep it off the async workers.
async fn hash_blocking(password: String) -> Result<String, DomainError> {
    tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| DomainError::Hashing {
            message: format!("hashing task failed: {e}"),
        })?
        .map_err(|e| DomainError::Hashing {
            message: e.to_string(),
        })
}

async fn verify_blocking(password: String, hash: String) -> Result<bool, DomainError> {
    tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
        .await
        .map_err(|e| DomainError::Hashing {
            message: format!("verification task failed: {e}"),
        })
}

fn unique_violation_or(e: sea_orm::DbErr, email: &str) -> DomainError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            DomainError::email_already_exists(email.to_owned())
        }
        _ => e.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_domain_is_lowercased() {
        assert_eq!(normalize_email("test@TEST.com").unwrap(), "test@test.com");
        assert_eq!(normalize_email("  Mixed@Example.ORG ").unwrap(), "Mixed@example.org");
    }

    #[test]
    fn empty_email_is_rejected() {
        assert!(matches!(normalize_email(""), Err(DomainError::EmptyEmail)));
        assert!(matches!(normalize_email("   "), Err(DomainError::EmptyEmail)));
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for bad in ["plain", "@example.com", "user@", "a b@example.com", "a@b@example.com"] {
            assert!(
                matches!(normalize_email(bad), Err(DomainError::InvalidEmail { .. })),
                "{bad}"
            );
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn hashing_runs_on_blocking_pool() {
        let hash = hash_blocking("testpass123".to_owned()).await.unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_blocking("testpass123".to_owned(), hash.clone()).await.unwrap());
        assert!(!verify_blocking("wrong".to_owned(), hash).await.unwrap());
    }
}
