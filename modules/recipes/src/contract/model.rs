use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTag {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIngredient {
    pub name: String,
}

/// A recipe with its associations resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub time_in_minutes: i32,
    pub price: Decimal,
    pub link: String,
    /// Sorted by name.
    pub tags: Vec<Tag>,
    /// Sorted by name.
    pub ingredients: Vec<Ingredient>,
    /// Public URL of the stored image.
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    pub fn tag_ids(&self) -> Vec<Uuid> {
        self.tags.iter().map(|t| t.id).collect()
    }

    pub fn ingredient_ids(&self) -> Vec<Uuid> {
        self.ingredients.iter().map(|i| i.id).collect()
    }
}

/// Create and full-update payload. Omitted associations mean "none".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecipe {
    pub title: String,
    pub time_in_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<Uuid>,
}

/// Partial update; `Some` fields are applied, a supplied association list replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecipePatch {
    pub title: Option<String>,
    pub time_in_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub tags: Option<Vec<Uuid>>,
    pub ingredients: Option<Vec<Uuid>>,
}

/// Recipe list filter. Empty lists do not filter; non-empty lists match any id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecipeFilter {
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<Uuid>,
}
