use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::TypeError;

pub type Id = i32;

#[derive(
    Clone, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Eq, Ord, Hash, Deserialize,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

/// The two user↔recipe membership relations. Both share one uniqueness and
/// idempotency contract, so the toggle actions are generic over this tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Favorite,
    ShoppingCart,
}

impl RelationKind {
    pub fn table(self) -> &'static str {
        match self {
            RelationKind::Favorite => "favorites",
            RelationKind::ShoppingCart => "shopping_cart",
        }
    }

    pub fn already_exists_message(self) -> &'static str {
        match self {
            RelationKind::Favorite => "Recipe is already in favorites",
            RelationKind::ShoppingCart => "Recipe is already in the shopping cart",
        }
    }

    pub fn not_found_message(self) -> &'static str {
        match self {
            RelationKind::Favorite => "Recipe is not in favorites",
            RelationKind::ShoppingCart => "Recipe is not in the shopping cart",
        }
    }
}

impl TryFrom<Value> for RelationKind {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value.as_str() {
            Some(value) => match value {
                "favorite" => Ok(Self::Favorite),
                "shopping_cart" => Ok(Self::ShoppingCart),
                _ => Err(TypeError::new("Invalid variant")),
            },
            None => Err(TypeError::new("Failed to parse value as string")),
        }
    }
}

#[derive(Clone, Debug, sqlx::FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub avatar: Option<String>,
    pub role: UserRole,
}

#[derive(Clone, Debug, sqlx::FromRow, Serialize, Deserialize)]
pub struct Tag {
    pub id: Id,
    pub name: String,
    pub slug: String,
}

#[derive(Clone, Debug, sqlx::FromRow, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: Id,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Clone, Debug, sqlx::FromRow, Serialize, Deserialize)]
pub struct Recipe {
    pub id: Id,
    pub author_id: Id,
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
}

/// One ingredient line of a recipe, joined with the ingredient catalog.
#[derive(Clone, Debug, sqlx::FromRow, Serialize)]
pub struct IngredientAmount {
    pub id: Id,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Compact recipe row for paginated listings. `count` carries the window
/// total used to build the page envelope.
#[derive(Clone, Debug, sqlx::FromRow, Serialize)]
pub struct RecipeListRow {
    pub id: Id,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
    #[serde(skip_serializing)]
    pub count: i64,
}

/// Full recipe representation: scalar fields plus both relation sets and the
/// viewer-dependent membership flags.
#[derive(Clone, Debug, Serialize)]
pub struct RecipeDetails {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub author: String,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<IngredientAmount>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

/// Followed author with their published-recipe count.
#[derive(Clone, Debug, sqlx::FromRow, Serialize)]
pub struct AuthorRow {
    pub id: Id,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
    pub recipes_count: i64,
    #[serde(skip_serializing)]
    pub count: i64,
}

/// Raw input row of the shopping-list aggregation: one RecipeIngredient of
/// one cart recipe, joined with the ingredient name and unit.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct CartIngredientRow {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// One aggregated line of the downloadable shopping list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

#[derive(Clone, Debug, sqlx::FromRow, Serialize)]
pub struct ShortLink {
    pub recipe_id: Id,
    pub short_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn relation_kind_parses_from_value() {
        let kind = RelationKind::try_from(json!("shopping_cart")).unwrap();
        assert_eq!(kind, RelationKind::ShoppingCart);
        assert!(RelationKind::try_from(json!("cart")).is_err());
        assert!(RelationKind::try_from(json!(7)).is_err());
    }

    #[test]
    fn relation_kind_tables_differ() {
        assert_ne!(
            RelationKind::Favorite.table(),
            RelationKind::ShoppingCart.table()
        );
    }
}
