use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::model::{
    Ingredient, NewIngredient, NewRecipe, NewTag, Recipe, RecipeFilter, RecipePatch, Tag,
};

/// Public API of the recipes module. Every call is scoped to `owner`.
#[async_trait]
pub trait RecipesApi: Send + Sync {
    async fn list_tags(&self, owner: Uuid, assigned_only: bool) -> anyhow::Result<Vec<Tag>>;

    async fn create_tag(&self, owner: Uuid, new_tag: NewTag) -> anyhow::Result<Tag>;

    async fn list_ingredients(
        &self,
        owner: Uuid,
        assigned_only: bool,
    ) -> anyhow::Result<Vec<Ingredient>>;

    async fn create_ingredient(
        &self,
        owner: Uuid,
        new_ingredient: NewIngredient,
    ) -> anyhow::Result<Ingredient>;

    async fn list_recipes(&self, owner: Uuid, filter: RecipeFilter) -> anyhow::Result<Vec<Recipe>>;

    async fn create_recipe(&self, owner: Uuid, new_recipe: NewRecipe) -> anyhow::Result<Recipe>;

    async fn get_recipe(&self, owner: Uuid, id: Uuid) -> anyhow::Result<Recipe>;

    async fn update_recipe(&self, owner: Uuid, id: Uuid, patch: RecipePatch)
        -> anyhow::Result<Recipe>;

    async fn replace_recipe(&self, owner: Uuid, id: Uuid, recipe: NewRecipe)
        -> anyhow::Result<Recipe>;

    async fn delete_recipe(&self, owner: Uuid, id: Uuid) -> anyhow::Result<()>;
}
