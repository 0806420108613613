pub mod client;
pub mod error;
pub mod model;

pub use client::RecipesApi;
pub use error::RecipesError;
pub use model::{
    Ingredient, NewIngredient, NewRecipe, NewTag, Recipe, RecipeFilter, RecipePatch, Tag,
};
