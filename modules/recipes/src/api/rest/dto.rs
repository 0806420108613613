use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::contract::model::{
    Ingredient, NewIngredient, NewRecipe, NewTag, Recipe, RecipeFilter, RecipePatch, Tag,
};
use crate::domain::error::DomainError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagDto {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientDto {
    pub id: Uuid,
    pub name: String,
}

/// Body of `POST /tags` and `POST /ingredients`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameReq {
    pub name: String,
}

/// List projection; associations are ids only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDto {
    pub id: Uuid,
    pub title: String,
    pub time_in_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<Uuid>,
}

/// Detail projection with nested associations and the image URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDetailDto {
    pub id: Uuid,
    pub title: String,
    pub time_in_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<TagDto>,
    pub ingredients: Vec<IngredientDto>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeImageDto {
    pub id: Uuid,
    pub image: Option<String>,
}

/// Body of `POST /recipes` and `PUT /recipes/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeReq {
    pub title: String,
    pub time_in_minutes: i32,
    pub price: Decimal,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub tags: Vec<Uuid>,
    #[serde(default)]
    pub ingredients: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PatchRecipeReq {
    pub title: Option<String>,
    pub time_in_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub tags: Option<Vec<Uuid>>,
    pub ingredients: Option<Vec<Uuid>>,
}

/// `?assigned_only=` on the tag and ingredient lists.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AssignedOnlyQuery {
    pub assigned_only: Option<String>,
}

impl AssignedOnlyQuery {
    pub fn parse(&self) -> Result<bool, DomainError> {
        match self.assigned_only.as_deref().map(str::trim) {
            None | Some("") => Ok(false),
            Some("1") | Some("true") | Some("True") => Ok(true),
            Some("0") | Some("false") | Some("False") => Ok(false),
            Some(other) => Err(DomainError::validation(
                "assigned_only",
                format!("Expected 0 or 1, got '{other}'."),
            )),
        }
    }
}

/// `?tags=<id>,<id>&ingredients=<id>` on the recipe list.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RecipeListQuery {
    pub tags: Option<String>,
    pub ingredients: Option<String>,
}

impl RecipeListQuery {
    pub fn parse(&self) -> Result<RecipeFilter, DomainError> {
        Ok(RecipeFilter {
            tags: parse_id_list("tags", self.tags.as_deref())?,
            ingredients: parse_id_list("ingredients", self.ingredients.as_deref())?,
        })
    }
}

fn parse_id_list(field: &str, raw: Option<&str>) -> Result<Vec<Uuid>, DomainError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Uuid::parse_str(s)
                .map_err(|_| DomainError::validation(field, format!("'{s}' is not a valid id.")))
        })
        .collect()
}

impl From<Tag> for TagDto {
    fn from(t: Tag) -> Self {
        Self {
            id: t.id,
            name: t.name,
        }
    }
}

impl From<Ingredient> for IngredientDto {
    fn from(i: Ingredient) -> Self {
        Self {
            id: i.id,
            name: i.name,
        }
    }
}

impl From<NameReq> for NewTag {
    fn from(req: NameReq) -> Self {
        Self { name: req.name }
    }
}

impl From<NameReq> for NewIngredient {
    fn from(req: NameReq) -> Self {
        Self { name: req.name }
    }
}

impl From<Recipe> for RecipeDto {
    fn from(r: Recipe) -> Self {
        Self {
            tags: r.tag_ids(),
            ingredients: r.ingredient_ids(),
            id: r.id,
            title: r.title,
            time_in_minutes: r.time_in_minutes,
            price: r.price,
            link: r.link,
        }
    }
}

impl From<Recipe> for RecipeDetailDto {
    fn from(r: Recipe) -> Self {
        Self {
            id: r.id,
            title: r.title,
            time_in_minutes: r.time_in_minutes,
            price: r.price,
            link: r.link,
            tags: r.tags.into_iter().map(TagDto::from).collect(),
            ingredients: r.ingredients.into_iter().map(IngredientDto::from).collect(),
            image: r.image,
        }
    }
}

impl From<Recipe> for RecipeImageDto {
    fn from(r: Recipe) -> Self {
        Self {
            id: r.id,
            image: r.image,
        }
    }
}

impl From<RecipeReq> for NewRecipe {
    fn from(req: RecipeReq) -> Self {
        Self {
            title: req.title,
            time_in_minutes: req.time_in_minutes,
            price: req.price,
            link: req.link,
            tags: req.tags,
            ingredients: req.ingredients,
        }
    }
}

impl From<PatchRecipeReq> for RecipePatch {
    fn from(req: PatchRecipeReq) -> Self {
        Self {
            title: req.title,
            time_in_minutes: req.time_in_minutes,
            price: req.price,
            link: req.link,
            tags: req.tags,
            ingredients: req.ingredients,
        }
    }
}
