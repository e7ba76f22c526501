use std::collections::HashSet;

use sqlx::{Pool, Postgres, QueryBuilder, Transaction};

use crate::{
    authentication::permissions::ActionType,
    constants::Limits,
    error::{Error, QueryError},
    form::{IngredientItem, RecipePayload},
    jwt::SessionData,
    pagination::PageContext,
    schema::{Id, IngredientAmount, Recipe, RecipeDetails, RecipeListRow, RelationKind, Tag},
};

use super::relations::has_relation;

pub async fn get_recipe(id: Id, pool: &Pool<Postgres>) -> Result<Option<Recipe>, Error> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(row)
}

/// Loads a recipe for mutation: the session must own it or hold the
/// manage-all permission.
pub async fn get_recipe_mut(
    id: Id,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, Error> {
    let recipe = get_recipe(id, pool).await?;
    session.authenticate(ActionType::ManageOwnRecipes)?;

    match recipe {
        Some(recipe) => match session.authenticate(ActionType::ManageAllRecipes) {
            Ok(_) => Ok(recipe),
            Err(_) => {
                if recipe.author_id != session.user_id {
                    Err(Error::Unauthorized(String::from(
                        "Only the author can modify this recipe",
                    )))
                } else {
                    Ok(recipe)
                }
            }
        },
        None => Err(Error::not_found("Recipe")),
    }
}

/// Validates the payload in full, then persists the recipe together with its
/// tag and ingredient sets in one transaction.
pub async fn create_recipe(
    author_id: Id,
    payload: RecipePayload,
    limits: &Limits,
    pool: &Pool<Postgres>,
) -> Result<Recipe, Error> {
    let valid = payload.validate(limits, true)?;
    let image = valid.image.clone().unwrap_or_default();

    let mut tx = pool.begin().await.map_err(|e| Error::from(QueryError::from(e)))?;

    check_tags_exist(&valid.tag_ids, &mut tx).await?;
    check_ingredients_exist(&valid.ingredients, &mut tx).await?;

    let recipe: Recipe = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, text, image, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
    ",
    )
    .bind(author_id)
    .bind(&valid.name)
    .bind(&valid.text)
    .bind(&image)
    .bind(valid.cooking_time)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| Error::from(QueryError::from(e)))?;

    insert_tag_links(recipe.id, &valid.tag_ids, &mut tx).await?;
    insert_ingredient_rows(recipe.id, &valid.ingredients, &mut tx).await?;

    tx.commit().await.map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(recipe)
}

/// Updates a recipe wholesale: scalar fields, then both relation sets are
/// replaced (delete + bulk insert) inside one transaction, so a failure
/// anywhere leaves the previous state intact.
pub async fn update_recipe(
    recipe: &Recipe,
    payload: RecipePayload,
    limits: &Limits,
    pool: &Pool<Postgres>,
) -> Result<Recipe, Error> {
    let valid = payload.validate(limits, false)?;
    let image = valid.image.clone().unwrap_or_else(|| recipe.image.clone());

    let mut tx = pool.begin().await.map_err(|e| Error::from(QueryError::from(e)))?;

    check_tags_exist(&valid.tag_ids, &mut tx).await?;
    check_ingredients_exist(&valid.ingredients, &mut tx).await?;

    let updated: Recipe = sqlx::query_as(
        "
        UPDATE recipes SET name = $1, text = $2, image = $3, cooking_time = $4
        WHERE id = $5
        RETURNING *
    ",
    )
    .bind(&valid.name)
    .bind(&valid.text)
    .bind(&image)
    .bind(valid.cooking_time)
    .bind(recipe.id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| Error::from(QueryError::from(e)))?;

    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;
    insert_tag_links(recipe.id, &valid.tag_ids, &mut tx).await?;

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;
    insert_ingredient_rows(recipe.id, &valid.ingredients, &mut tx).await?;

    tx.commit().await.map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(updated)
}

pub async fn delete_recipe(id: Id, pool: &Pool<Postgres>) -> Result<(), Error> {
    // Ingredient rows, relations and the short link cascade via FK.
    let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("Recipe"));
    }

    Ok(())
}

/// Full representation with the viewer-dependent membership flags.
pub async fn get_recipe_details(
    id: Id,
    viewer: Option<Id>,
    pool: &Pool<Postgres>,
) -> Result<Option<RecipeDetails>, Error> {
    let recipe = match get_recipe(id, pool).await? {
        Some(recipe) => recipe,
        None => return Ok(None),
    };

    let author: (String,) = sqlx::query_as("SELECT username FROM users WHERE id = $1")
        .bind(recipe.author_id)
        .fetch_one(pool)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    let tags: Vec<Tag> = sqlx::query_as(
        "
        SELECT t.* FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = $1
        ORDER BY t.name
    ",
    )
    .bind(id)
    .fetch_all(pool)
    .await
    .map_err(|e| Error::from(QueryError::from(e)))?;

    let ingredients: Vec<IngredientAmount> = sqlx::query_as(
        "
        SELECT i.id AS id, i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = $1
        ORDER BY i.name
    ",
    )
    .bind(id)
    .fetch_all(pool)
    .await
    .map_err(|e| Error::from(QueryError::from(e)))?;

    let (is_favorited, is_in_shopping_cart) = match viewer {
        Some(user_id) => (
            has_relation(RelationKind::Favorite, user_id, id, pool).await?,
            has_relation(RelationKind::ShoppingCart, user_id, id, pool).await?,
        ),
        None => (false, false),
    };

    Ok(Some(RecipeDetails {
        recipe,
        author: author.0,
        tags,
        ingredients,
        is_favorited,
        is_in_shopping_cart,
    }))
}

/// Paginated listing, newest first, optionally narrowed to an author and/or
/// a tag slug.
pub async fn fetch_recipes(
    author: Option<Id>,
    tag_slug: Option<&str>,
    offset: i64,
    limits: &Limits,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeListRow>, Error> {
    let rows: Vec<RecipeListRow> = match (author, tag_slug) {
        (Some(author), Some(slug)) => {
            sqlx::query_as(
                "
                SELECT r.id, r.name, r.image, r.cooking_time, COUNT(*) OVER() AS count
                FROM recipes r
                INNER JOIN recipe_tags rt ON rt.recipe_id = r.id
                INNER JOIN tags t ON t.id = rt.tag_id
                WHERE r.author_id = $1 AND t.slug = $2
                ORDER BY r.id DESC LIMIT $3 OFFSET $4
            ",
            )
            .bind(author)
            .bind(slug)
            .bind(limits.page_size)
            .bind(offset)
            .fetch_all(pool)
            .await
            .map_err(|e| Error::from(QueryError::from(e)))?
        }
        (Some(author), None) => {
            sqlx::query_as(
                "
                SELECT r.id, r.name, r.image, r.cooking_time, COUNT(*) OVER() AS count
                FROM recipes r
                WHERE r.author_id = $1
                ORDER BY r.id DESC LIMIT $2 OFFSET $3
            ",
            )
            .bind(author)
            .bind(limits.page_size)
            .bind(offset)
            .fetch_all(pool)
            .await
            .map_err(|e| Error::from(QueryError::from(e)))?
        }
        (None, Some(slug)) => {
            sqlx::query_as(
                "
                SELECT r.id, r.name, r.image, r.cooking_time, COUNT(*) OVER() AS count
                FROM recipes r
                INNER JOIN recipe_tags rt ON rt.recipe_id = r.id
                INNER JOIN tags t ON t.id = rt.tag_id
                WHERE t.slug = $1
                ORDER BY r.id DESC LIMIT $2 OFFSET $3
            ",
            )
            .bind(slug)
            .bind(limits.page_size)
            .bind(offset)
            .fetch_all(pool)
            .await
            .map_err(|e| Error::from(QueryError::from(e)))?
        }
        (None, None) => {
            sqlx::query_as(
                "
                SELECT r.id, r.name, r.image, r.cooking_time, COUNT(*) OVER() AS count
                FROM recipes r
                ORDER BY r.id DESC LIMIT $1 OFFSET $2
            ",
            )
            .bind(limits.page_size)
            .bind(offset)
            .fetch_all(pool)
            .await
            .map_err(|e| Error::from(QueryError::from(e)))?
        }
    };

    let total_count = rows.first().map(|r| r.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, limits.page_size, offset);
    Ok(page)
}

async fn check_tags_exist(
    tag_ids: &[Id],
    tx: &mut Transaction<'_, Postgres>,
) -> Result<(), Error> {
    let found: Vec<(Id,)> = sqlx::query_as("SELECT id FROM tags WHERE id = ANY($1)")
        .bind(tag_ids)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    let found: HashSet<Id> = found.into_iter().map(|r| r.0).collect();
    if tag_ids.iter().any(|id| !found.contains(id)) {
        return Err(Error::not_found("Tag"));
    }

    Ok(())
}

async fn check_ingredients_exist(
    items: &[IngredientItem],
    tx: &mut Transaction<'_, Postgres>,
) -> Result<(), Error> {
    let ids: Vec<Id> = items.iter().map(|item| item.id).collect();
    let found: Vec<(Id,)> = sqlx::query_as("SELECT id FROM ingredients WHERE id = ANY($1)")
        .bind(&ids)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    let found: HashSet<Id> = found.into_iter().map(|r| r.0).collect();
    if ids.iter().any(|id| !found.contains(id)) {
        return Err(Error::not_found("Ingredient"));
    }

    Ok(())
}

async fn insert_tag_links(
    recipe_id: Id,
    tag_ids: &[Id],
    tx: &mut Transaction<'_, Postgres>,
) -> Result<(), Error> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");
    builder.push_values(tag_ids, |mut b, tag_id| {
        b.push_bind(recipe_id).push_bind(*tag_id);
    });
    builder
        .build()
        .execute(&mut **tx)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(())
}

async fn insert_ingredient_rows(
    recipe_id: Id,
    items: &[IngredientItem],
    tx: &mut Transaction<'_, Postgres>,
) -> Result<(), Error> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");
    builder.push_values(items, |mut b, item| {
        b.push_bind(recipe_id)
            .push_bind(item.id)
            .push_bind(item.amount);
    });
    builder
        .build()
        .execute(&mut **tx)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(())
}
