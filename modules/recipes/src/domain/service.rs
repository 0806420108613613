use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveValue::Set, DatabaseConnection, DbErr, IntoActiveModel, TransactionTrait,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::RecipesConfig;
use crate::contract::model::{
    Ingredient, NewIngredient, NewRecipe, NewTag, Recipe, RecipeFilter, RecipePatch, Tag,
};
use crate::domain::{error::DomainError, image, ports::ImageStore, validation};
use crate::infra::storage::{
    entity::{ingredient, recipe, tag},
    mapper, repo,
};

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub max_name_length: usize,
    pub max_image_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        RecipesConfig::default().into()
    }
}

impl From<RecipesConfig> for ServiceConfig {
    fn from(cfg: RecipesConfig) -> Self {
        Self {
            max_name_length: cfg.max_name_length,
            max_image_bytes: cfg.max_image_bytes,
        }
    }
}

/// Scalar changes that passed validation; `None` leaves the column as is.
#[derive(Default)]
struct Changes {
    title: Option<String>,
    time_in_minutes: Option<i32>,
    price_cents: Option<i64>,
    link: Option<String>,
    tags: Option<Vec<Uuid>>,
    ingredients: Option<Vec<Uuid>>,
}

/// Owner-scoped catalog of tags, ingredients and recipes.
pub struct Service {
    db: DatabaseConnection,
    images: Arc<dyn ImageStore>,
    config: ServiceConfig,
}

impl Service {
    pub fn new(db: DatabaseConnection, images: Arc<dyn ImageStore>, config: ServiceConfig) -> Self {
        Self { db, images, config }
    }

    // ---- tags & ingredients ----

    #[instrument(skip(self))]
    pub async fn list_tags(&self, owner: Uuid, assigned_only: bool) -> Result<Vec<Tag>, DomainError> {
        let rows = repo::list_tags(&self.db, owner, assigned_only).await?;
        Ok(rows.into_iter().map(mapper::tag_to_contract).collect())
    }

    #[instrument(skip(self, new_tag))]
    pub async fn create_tag(&self, owner: Uuid, new_tag: NewTag) -> Result<Tag, DomainError> {
        let name = validation::name("name", &new_tag.name, self.config.max_name_length)?;
        let row = repo::insert_tag(&self.db, owner, name).await?;
        info!(tag_id = %row.id, "Created tag");
        Ok(mapper::tag_to_contract(row))
    }

    #[instrument(skip(self))]
    pub async fn list_ingredients(
        &self,
        owner: Uuid,
        assigned_only: bool,
    ) -> Result<Vec<Ingredient>, DomainError> {
        let rows = repo::list_ingredients(&self.db, owner, assigned_only).await?;
        Ok(rows.into_iter().map(mapper::ingredient_to_contract).collect())
    }

    #[instrument(skip(self, new_ingredient))]
    pub async fn create_ingredient(
        &self,
        owner: Uuid,
        new_ingredient: NewIngredient,
    ) -> Result<Ingredient, DomainError> {
        let name = validation::name("name", &new_ingredient.name, self.config.max_name_length)?;
        let row = repo::insert_ingredient(&self.db, owner, name).await?;
        info!(ingredient_id = %row.id, "Created ingredient");
        Ok(mapper::ingredient_to_contract(row))
    }

    // ---- recipes ----

    #[instrument(skip(self))]
    pub async fn list_recipes(
        &self,
        owner: Uuid,
        filter: RecipeFilter,
    ) -> Result<Vec<Recipe>, DomainError> {
        let rows = repo::list_recipes(&self.db, owner, &filter).await?;
        self.hydrate(rows).await
    }

    #[instrument(skip(self))]
    pub async fn get_recipe(&self, owner: Uuid, id: Uuid) -> Result<Recipe, DomainError> {
        let row = repo::find_recipe(&self.db, owner, id)
            .await?
            .ok_or_else(|| DomainError::recipe_not_found(id))?;
        self.hydrate_one(row).await
    }

    #[instrument(skip(self, new_recipe), fields(title = %new_recipe.title))]
    pub async fn create_recipe(
        &self,
        owner: Uuid,
        new_recipe: NewRecipe,
    ) -> Result<Recipe, DomainError> {
        let title = validation::name("title", &new_recipe.title, self.config.max_name_length)?;
        let time_in_minutes = validation::time_in_minutes(new_recipe.time_in_minutes)?;
        let price_cents = validation::price_cents(new_recipe.price)?;
        let link = validation::link(&new_recipe.link)?;
        let tag_ids = validation::dedup_ids(&new_recipe.tags);
        let ingredient_ids = validation::dedup_ids(&new_recipe.ingredients);

        let txn = self.db.begin().await?;
        let tags = self.resolve_tags(&txn, owner, &tag_ids).await?;
        let ingredients = self.resolve_ingredients(&txn, owner, &ingredient_ids).await?;

        let now = Utc::now();
        let row = repo::insert_recipe(
            &txn,
            recipe::ActiveModel {
                id: Set(Uuid::new_v4()),
                owner_id: Set(owner),
                title: Set(title),
                time_in_minutes: Set(time_in_minutes),
                price_cents: Set(price_cents),
                link: Set(link),
                image: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
            },
        )
        .await?;
        repo::replace_recipe_tags(&txn, row.id, &tag_ids).await?;
        repo::replace_recipe_ingredients(&txn, row.id, &ingredient_ids).await?;
        txn.commit().await?;

        info!(recipe_id = %row.id, "Created recipe");
        Ok(mapper::recipe_to_contract(row, tags, ingredients, None))
    }

    /// Partial update; supplied association lists replace the current ones.
    #[instrument(skip(self, patch))]
    pub async fn update_recipe(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: RecipePatch,
    ) -> Result<Recipe, DomainError> {
        let changes = Changes {
            title: patch
                .title
                .map(|t| validation::name("title", &t, self.config.max_name_length))
                .transpose()?,
            time_in_minutes: patch
                .time_in_minutes
                .map(validation::time_in_minutes)
                .transpose()?,
            price_cents: patch.price.map(validation::price_cents).transpose()?,
            link: patch.link.map(|l| validation::link(&l)).transpose()?,
            tags: patch.tags.map(|ids| validation::dedup_ids(&ids)),
            ingredients: patch.ingredients.map(|ids| validation::dedup_ids(&ids)),
        };
        self.apply(owner, id, changes).await
    }

    /// Full update: every scalar is replaced and omitted associations are cleared.
    #[instrument(skip(self, full))]
    pub async fn replace_recipe(
        &self,
        owner: Uuid,
        id: Uuid,
        full: NewRecipe,
    ) -> Result<Recipe, DomainError> {
        let changes = Changes {
            title: Some(validation::name(
                "title",
                &full.title,
                self.config.max_name_length,
            )?),
            time_in_minutes: Some(validation::time_in_minutes(full.time_in_minutes)?),
            price_cents: Some(validation::price_cents(full.price)?),
            link: Some(validation::link(&full.link)?),
            tags: Some(validation::dedup_ids(&full.tags)),
            ingredients: Some(validation::dedup_ids(&full.ingredients)),
        };
        self.apply(owner, id, changes).await
    }

    async fn apply(&self, owner: Uuid, id: Uuid, changes: Changes) -> Result<Recipe, DomainError> {
        let txn = self.db.begin().await?;
        let current = repo::find_recipe(&txn, owner, id)
            .await?
            .ok_or_else(|| DomainError::recipe_not_found(id))?;

        if let Some(ids) = &changes.tags {
            self.resolve_tags(&txn, owner, ids).await?;
        }
        if let Some(ids) = &changes.ingredients {
            self.resolve_ingredients(&txn, owner, ids).await?;
        }

        let mut am = current.into_active_model();
        if let Some(title) = changes.title {
            am.title = Set(title);
        }
        if let Some(minutes) = changes.time_in_minutes {
            am.time_in_minutes = Set(minutes);
        }
        if let Some(cents) = changes.price_cents {
            am.price_cents = Set(cents);
        }
        if let Some(link) = changes.link {
            am.link = Set(link);
        }
        am.updated_at = Set(Utc::now());
        let row = repo::update_recipe(&txn, am).await?;

        if let Some(ids) = &changes.tags {
            repo::replace_recipe_tags(&txn, id, ids).await?;
        }
        if let Some(ids) = &changes.ingredients {
            repo::replace_recipe_ingredients(&txn, id, ids).await?;
        }
        txn.commit().await?;

        info!(recipe_id = %id, "Updated recipe");
        self.hydrate_one(row).await
    }

    /// Removes the recipe, its links and its image file.
    #[instrument(skip(self))]
    pub async fn delete_recipe(&self, owner: Uuid, id: Uuid) -> Result<(), DomainError> {
        let txn = self.db.begin().await?;
        let current = repo::find_recipe(&txn, owner, id)
            .await?
            .ok_or_else(|| DomainError::recipe_not_found(id))?;
        repo::delete_recipe(&txn, id).await?;
        txn.commit().await?;

        if let Some(path) = current.image {
            self.remove_image(&path).await;
        }
        info!(recipe_id = %id, "Deleted recipe");
        Ok(())
    }

    /// Validates `bytes` as a real image, stores it and points the recipe at it.
    /// A previously stored image is removed.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload_image(
        &self,
        owner: Uuid,
        id: Uuid,
        bytes: Vec<u8>,
    ) -> Result<Recipe, DomainError> {
        let current = repo::find_recipe(&self.db, owner, id)
            .await?
            .ok_or_else(|| DomainError::recipe_not_found(id))?;

        if bytes.len() > self.config.max_image_bytes {
            return Err(DomainError::ImageTooLarge {
                size: bytes.len(),
                max: self.config.max_image_bytes,
            });
        }

        // Full decode is CPU-bound.
        let (bytes, extension) = tokio::task::spawn_blocking(move || {
            image::inspect(&bytes).map(|ext| (bytes, ext))
        })
        .await
        .map_err(|e| DomainError::storage(format!("image validation task failed: {e}")))??;

        let path = self
            .images
            .save(bytes, extension)
            .await
            .map_err(|e| DomainError::storage(format!("{e:#}")))?;

        let previous = current.image.clone();
        let mut am = current.into_active_model();
        am.image = Set(Some(path.clone()));
        am.updated_at = Set(Utc::now());
        let row = match repo::update_recipe(&self.db, am).await {
            Ok(row) => row,
            Err(e) => {
                self.remove_image(&path).await;
                return Err(match e {
                    DbErr::RecordNotUpdated => DomainError::recipe_not_found(id),
                    other => other.into(),
                });
            }
        };

        if let Some(old) = previous.filter(|old| *old != path) {
            self.remove_image(&old).await;
        }
        info!(recipe_id = %id, image = %path, "Stored recipe image");
        self.hydrate_one(row).await
    }

    pub fn image_url(&self, path: &str) -> String {
        self.images.url(path)
    }

    // ---- helpers ----

    async fn remove_image(&self, path: &str) {
        if let Err(e) = self.images.delete(path).await {
            warn!(error = %e, path, "failed to remove recipe image");
        }
    }

    async fn resolve_tags<C: sea_orm::ConnectionTrait>(
        &self,
        db: &C,
        owner: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<tag::Model>, DomainError> {
        let found = repo::owned_tags(db, owner, ids).await?;
        let missing = missing_ids(ids, found.iter().map(|t| t.id));
        if !missing.is_empty() {
            return Err(DomainError::UnknownTags { ids: missing });
        }
        Ok(found)
    }

    async fn resolve_ingredients<C: sea_orm::ConnectionTrait>(
        &self,
        db: &C,
        owner: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<ingredient::Model>, DomainError> {
        let found = repo::owned_ingredients(db, owner, ids).await?;
        let missing = missing_ids(ids, found.iter().map(|i| i.id));
        if !missing.is_empty() {
            return Err(DomainError::UnknownIngredients { ids: missing });
        }
        Ok(found)
    }

    async fn hydrate_one(&self, row: recipe::Model) -> Result<Recipe, DomainError> {
        let mut out = self.hydrate(vec![row]).await?;
        out.pop()
            .ok_or_else(|| DomainError::database("recipe vanished while loading associations"))
    }

    /// Attaches tags, ingredients and the image URL, keeping input order.
    async fn hydrate(&self, rows: Vec<recipe::Model>) -> Result<Vec<Recipe>, DomainError> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut tags = repo::tags_by_recipe(&self.db, &ids).await?;
        let mut ingredients = repo::ingredients_by_recipe(&self.db, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let image_url = row.image.as_deref().map(|p| self.images.url(p));
                let t = tags.remove(&row.id).unwrap_or_default();
                let i = ingredients.remove(&row.id).unwrap_or_default();
                mapper::recipe_to_contract(row, t, i, image_url)
            })
            .collect())
    }
}

fn missing_ids(wanted: &[Uuid], found: impl Iterator<Item = Uuid>) -> Vec<Uuid> {
    let found: std::collections::HashSet<Uuid> = found.collect();
    wanted
        .iter()
        .copied()
        .filter(|id| !found.contains(id))
        .collect()
}
