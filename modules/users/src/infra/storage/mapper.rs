use crate::contract::model::User;
use crate::infra::storage::entity::Model as UserEntity;

pub fn entity_to_contract(entity: UserEntity) -> User {
    User {
        id: entity.id,
        email: entity.email,
        name: entity.name,
        is_active: entity.is_active,
        is_staff: entity.is_staff,
        is_superuser: entity.is_superuser,
        created_at: entity.created_at,
        updated_at: entity.updated_at,
    }
}
