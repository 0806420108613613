//! Owner-scoped queries. Every function takes any `ConnectionTrait` so the
//! service can run them on the pool or inside a transaction.

use std::collections::HashMap;

use sea_orm::{
    sea_query::Query, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::contract::model::RecipeFilter;
use crate::infra::storage::entity::{ingredient, recipe, recipe_ingredient, recipe_tag, tag};

// ---- tags ----

pub async fn list_tags<C: ConnectionTrait>(
    db: &C,
    owner: Uuid,
    assigned_only: bool,
) -> Result<Vec<tag::Model>, DbErr> {
    let mut q = tag::Entity::find().filter(tag::Column::OwnerId.eq(owner));
    if assigned_only {
        q = q.filter(
            tag::Column::Id.in_subquery(
                Query::select()
                    .column(recipe_tag::Column::TagId)
                    .from(recipe_tag::Entity)
                    .to_owned(),
            ),
        );
    }
    q.order_by_desc(tag::Column::Name)
        .order_by_desc(tag::Column::Id)
        .all(db)
        .await
}

pub async fn insert_tag<C: ConnectionTrait>(
    db: &C,
    owner: Uuid,
    name: String,
) -> Result<tag::Model, DbErr> {
    tag::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(owner),
        name: Set(name),
    }
    .insert(db)
    .await
}

/// The subset of `ids` that exists and belongs to `owner`.
pub async fn owned_tags<C: ConnectionTrait>(
    db: &C,
    owner: Uuid,
    ids: &[Uuid],
) -> Result<Vec<tag::Model>, DbErr> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    tag::Entity::find()
        .filter(tag::Column::OwnerId.eq(owner))
        .filter(tag::Column::Id.is_in(ids.iter().copied()))
        .all(db)
        .await
}

// ---- ingredients ----

pub async fn list_ingredients<C: ConnectionTrait>(
    db: &C,
    owner: Uuid,
    assigned_only: bool,
) -> Result<Vec<ingredient::Model>, DbErr> {
    let mut q = ingredient::Entity::find().filter(ingredient::Column::OwnerId.eq(owner));
    if assigned_only {
        q = q.filter(
            ingredient::Column::Id.in_subquery(
                Query::select()
                    .column(recipe_ingredient::Column::IngredientId)
                    .from(recipe_ingredient::Entity)
                    .to_owned(),
            ),
        );
    }
    q.order_by_desc(ingredient::Column::Name)
        .order_by_desc(ingredient::Column::Id)
        .all(db)
        .await
}

pub async fn insert_ingredient<C: ConnectionTrait>(
    db: &C,
    owner: Uuid,
    name: String,
) -> Result<ingredient::Model, DbErr> {
    ingredient::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(owner),
        name: Set(name),
    }
    .insert(db)
    .await
}

pub async fn owned_ingredients<C: ConnectionTrait>(
    db: &C,
    owner: Uuid,
    ids: &[Uuid],
) -> Result<Vec<ingredient::Model>, DbErr> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    ingredient::Entity::find()
        .filter(ingredient::Column::OwnerId.eq(owner))
        .filter(ingredient::Column::Id.is_in(ids.iter().copied()))
        .all(db)
        .await
}

// ---- recipes ----

pub async fn list_recipes<C: ConnectionTrait>(
    db: &C,
    owner: Uuid,
    filter: &RecipeFilter,
) -> Result<Vec<recipe::Model>, DbErr> {
    let mut q = recipe::Entity::find().filter(recipe::Column::OwnerId.eq(owner));
    if !filter.tags.is_empty() {
        q = q.filter(
            recipe::Column::Id.in_subquery(
                Query::select()
                    .column(recipe_tag::Column::RecipeId)
                    .from(recipe_tag::Entity)
                    .and_where(recipe_tag::Column::TagId.is_in(filter.tags.iter().copied()))
                    .to_owned(),
            ),
        );
    }
    if !filter.ingredients.is_empty() {
        q = q.filter(
            recipe::Column::Id.in_subquery(
                Query::select()
                    .column(recipe_ingredient::Column::RecipeId)
                    .from(recipe_ingredient::Entity)
                    .and_where(
                        recipe_ingredient::Column::IngredientId
                            .is_in(filter.ingredients.iter().copied()),
                    )
                    .to_owned(),
            ),
        );
    }
    q.order_by_desc(recipe::Column::Title)
        .order_by_desc(recipe::Column::Id)
        .all(db)
        .await
}

/// `None` when missing or owned by someone else.
pub async fn find_recipe<C: ConnectionTrait>(
    db: &C,
    owner: Uuid,
    id: Uuid,
) -> Result<Option<recipe::Model>, DbErr> {
    recipe::Entity::find_by_id(id)
        .filter(recipe::Column::OwnerId.eq(owner))
        .one(db)
        .await
}

pub async fn insert_recipe<C: ConnectionTrait>(
    db: &C,
    model: recipe::ActiveModel,
) -> Result<recipe::Model, DbErr> {
    model.insert(db).await
}

pub async fn update_recipe<C: ConnectionTrait>(
    db: &C,
    model: recipe::ActiveModel,
) -> Result<recipe::Model, DbErr> {
    model.update(db).await
}

pub async fn delete_recipe<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<bool, DbErr> {
    recipe_tag::Entity::delete_many()
        .filter(recipe_tag::Column::RecipeId.eq(id))
        .exec(db)
        .await?;
    recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::RecipeId.eq(id))
        .exec(db)
        .await?;
    let res = recipe::Entity::delete_by_id(id).exec(db).await?;
    Ok(res.rows_affected > 0)
}

/// Replaces the recipe's tag links with `tag_ids` (already deduplicated).
pub async fn replace_recipe_tags<C: ConnectionTrait>(
    db: &C,
    recipe_id: Uuid,
    tag_ids: &[Uuid],
) -> Result<(), DbErr> {
    recipe_tag::Entity::delete_many()
        .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;
    if tag_ids.is_empty() {
        return Ok(());
    }
    let links = tag_ids.iter().map(|tag_id| recipe_tag::ActiveModel {
        recipe_id: Set(recipe_id),
        tag_id: Set(*tag_id),
    });
    recipe_tag::Entity::insert_many(links)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

pub async fn replace_recipe_ingredients<C: ConnectionTrait>(
    db: &C,
    recipe_id: Uuid,
    ingredient_ids: &[Uuid],
) -> Result<(), DbErr> {
    recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;
    if ingredient_ids.is_empty() {
        return Ok(());
    }
    let links = ingredient_ids
        .iter()
        .map(|ingredient_id| recipe_ingredient::ActiveModel {
            recipe_id: Set(recipe_id),
            ingredient_id: Set(*ingredient_id),
        });
    recipe_ingredient::Entity::insert_many(links)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Tags of each recipe in `recipe_ids`.
pub async fn tags_by_recipe<C: ConnectionTrait>(
    db: &C,
    recipe_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<tag::Model>>, DbErr> {
    let mut out: HashMap<Uuid, Vec<tag::Model>> = HashMap::new();
    if recipe_ids.is_empty() {
        return Ok(out);
    }
    let rows = recipe_tag::Entity::find()
        .filter(recipe_tag::Column::RecipeId.is_in(recipe_ids.iter().copied()))
        .find_also_related(tag::Entity)
        .all(db)
        .await?;
    for (link, tag) in rows {
        if let Some(tag) = tag {
            out.entry(link.recipe_id).or_default().push(tag);
        }
    }
    Ok(out)
}

pub async fn ingredients_by_recipe<C: ConnectionTrait>(
    db: &C,
    recipe_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<ingredient::Model>>, DbErr> {
    let mut out: HashMap<Uuid, Vec<ingredient::Model>> = HashMap::new();
    if recipe_ids.is_empty() {
        return Ok(out);
    }
    let rows = recipe_ingredient::Entity::find()
        .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids.iter().copied()))
        .find_also_related(ingredient::Entity)
        .all(db)
        .await?;
    for (link, ingredient) in rows {
        if let Some(ingredient) = ingredient {
            out.entry(link.recipe_id).or_default().push(ingredient);
        }
    }
    Ok(out)
}
