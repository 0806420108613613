use crate::contract::model::{Ingredient, Recipe, Tag};
use crate::domain::validation::price_from_cents;
use crate::infra::storage::entity::{ingredient, recipe, tag};

pub fn tag_to_contract(m: tag::Model) -> Tag {
    Tag {
        id: m.id,
        name: m.name,
        owner_id: m.owner_id,
    }
}

pub fn ingredient_to_contract(m: ingredient::Model) -> Ingredient {
    Ingredient {
        id: m.id,
        name: m.name,
        owner_id: m.owner_id,
    }
}

/// `image_url` is the public address of `m.image`, resolved by the caller.
pub fn recipe_to_contract(
    m: recipe::Model,
    tags: Vec<tag::Model>,
    ingredients: Vec<ingredient::Model>,
    image_url: Option<String>,
) -> Recipe {
    let mut tags: Vec<Tag> = tags.into_iter().map(tag_to_contract).collect();
    tags.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    let mut ingredients: Vec<Ingredient> =
        ingredients.into_iter().map(ingredient_to_contract).collect();
    ingredients.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

    Recipe {
        id: m.id,
        owner_id: m.owner_id,
        title: m.title,
        time_in_minutes: m.time_in_minutes,
        price: price_from_cents(m.price_cents),
        link: m.link,
        tags,
        ingredients,
        image: image_url,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}
