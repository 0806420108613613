use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(named_item_table(Tags::Table, Tags::Id, Tags::OwnerId, Tags::Name))
            .await?;
        manager
            .create_table(named_item_table(
                Ingredients::Table,
                Ingredients::Id,
                Ingredients::OwnerId,
                Ingredients::Name,
            ))
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Recipes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Recipes::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Recipes::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(Recipes::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Recipes::TimeInMinutes).integer().not_null())
                    .col(ColumnDef::new(Recipes::PriceCents).big_integer().not_null())
                    .col(
                        ColumnDef::new(Recipes::Link)
                            .string_len(255)
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Recipes::Image).string().null())
                    .col(
                        ColumnDef::new(Recipes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Recipes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RecipeTags::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RecipeTags::RecipeId).uuid().not_null())
                    .col(ColumnDef::new(RecipeTags::TagId).uuid().not_null())
                    .primary_key(
                        Index::create()
                            .col(RecipeTags::RecipeId)
                            .col(RecipeTags::TagId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(RecipeTags::Table, RecipeTags::RecipeId)
                            .to(Recipes::Table, Recipes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(RecipeTags::Table, RecipeTags::TagId)
                            .to(Tags::Table, Tags::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RecipeIngredients::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RecipeIngredients::RecipeId).uuid().not_null())
                    .col(
                        ColumnDef::new(RecipeIngredients::IngredientId)
                            .uuid()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(RecipeIngredients::RecipeId)
                            .col(RecipeIngredients::IngredientId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(RecipeIngredients::Table, RecipeIngredients::RecipeId)
                            .to(Recipes::Table, Recipes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(RecipeIngredients::Table, RecipeIngredients::IngredientId)
                            .to(Ingredients::Table, Ingredients::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tags_owner")
                    .table(Tags::Table)
                    .col(Tags::OwnerId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ingredients_owner")
                    .table(Ingredients::Table)
                    .col(Ingredients::OwnerId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_recipes_owner")
                    .table(Recipes::Table)
                    .col(Recipes::OwnerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RecipeIngredients::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RecipeTags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Recipes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Ingredients::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tags::Table).to_owned())
            .await
    }
}

/// `id`, `owner_id`, `name` table shared by tags and ingredients.
fn named_item_table<T: IntoIden + Copy + 'static>(
    table: T,
    id: T,
    owner: T,
    name: T,
) -> TableCreateStatement {
    Table::create()
        .table(table)
        .if_not_exists()
        .col(ColumnDef::new(id).uuid().not_null().primary_key())
        .col(ColumnDef::new(owner).uuid().not_null())
        .col(ColumnDef::new(name).string_len(255).not_null())
        .to_owned()
}

#[derive(DeriveIden, Clone, Copy)]
enum Tags {
    Table,
    Id,
    OwnerId,
    Name,
}

#[derive(DeriveIden, Clone, Copy)]
enum Ingredients {
    Table,
    Id,
    OwnerId,
    Name,
}

#[derive(DeriveIden)]
enum Recipes {
    Table,
    Id,
    OwnerId,
    Title,
    TimeInMinutes,
    PriceCents,
    Link,
    Image,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum RecipeTags {
    Table,
    RecipeId,
    TagId,
}

#[derive(DeriveIden)]
enum RecipeIngredients {
    Table,
    RecipeId,
    IngredientId,
}
