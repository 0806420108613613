use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::contract::{
    client::RecipesApi,
    error::RecipesError,
    model::{Ingredient, NewIngredient, NewRecipe, NewTag, Recipe, RecipeFilter, RecipePatch, Tag},
};
use crate::domain::{error::DomainError, service::Service};

/// In-process `RecipesApi` backed by the domain service.
pub struct RecipesLocalClient {
    service: Arc<Service>,
}

impl RecipesLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl RecipesApi for RecipesLocalClient {
    async fn list_tags(&self, owner: Uuid, assigned_only: bool) -> anyhow::Result<Vec<Tag>> {
        self.service
            .list_tags(owner, assigned_only)
            .await
            .map_err(map_domain_error)
    }

    async fn create_tag(&self, owner: Uuid, new_tag: NewTag) -> anyhow::Result<Tag> {
        self.service
            .create_tag(owner, new_tag)
            .await
            .map_err(map_domain_error)
    }

    async fn list_ingredients(
        &self,
        owner: Uuid,
        assigned_only: bool,
    ) -> anyhow::Result<Vec<Ingredient>> {
        self.service
            .list_ingredients(owner, assigned_only)
            .await
            .map_err(map_domain_error)
    }

    async fn create_ingredient(
        &self,
        owner: Uuid,
        new_ingredient: NewIngredient,
    ) -> anyhow::Result<Ingredient> {
        self.service
            .create_ingredient(owner, new_ingredient)
            .await
            .map_err(map_domain_error)
    }

    async fn list_recipes(&self, owner: Uuid, filter: RecipeFilter) -> anyhow::Result<Vec<Recipe>> {
        self.service
            .list_recipes(owner, filter)
            .await
            .map_err(map_domain_error)
    }

    async fn create_recipe(&self, owner: Uuid, new_recipe: NewRecipe) -> anyhow::Result<Recipe> {
        self.service
            .create_recipe(owner, new_recipe)
            .await
            .map_err(map_domain_error)
    }

    async fn get_recipe(&self, owner: Uuid, id: Uuid) -> anyhow::Result<Recipe> {
        self.service
            .get_recipe(owner, id)
            .await
            .map_err(map_domain_error)
    }

    async fn update_recipe(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: RecipePatch,
    ) -> anyhow::Result<Recipe> {
        self.service
            .update_recipe(owner, id, patch)
            .await
            .map_err(map_domain_error)
    }

    async fn replace_recipe(
        &self,
        owner: Uuid,
        id: Uuid,
        recipe: NewRecipe,
    ) -> anyhow::Result<Recipe> {
        self.service
            .replace_recipe(owner, id, recipe)
            .await
            .map_err(map_domain_error)
    }

    async fn delete_recipe(&self, owner: Uuid, id: Uuid) -> anyhow::Result<()> {
        self.service
            .delete_recipe(owner, id)
            .await
            .map_err(map_domain_error)
    }
}

fn map_domain_error(domain_error: DomainError) -> anyhow::Error {
    let contract_error = match domain_error {
        DomainError::RecipeNotFound { id } => RecipesError::NotFound { id },
        e @ (DomainError::Validation { .. }
        | DomainError::UnknownTags { .. }
        | DomainError::UnknownIngredients { .. }
        | DomainError::InvalidImage { .. }
        | DomainError::ImageTooLarge { .. }) => RecipesError::Validation {
            message: e.to_string(),
        },
        DomainError::Storage { .. } | DomainError::Database { .. } => RecipesError::Internal,
    };

    anyhow::Error::new(contract_error)
}
