use std::collections::HashMap;

use sqlx::{Pool, Postgres};

use crate::{
    error::{Error, QueryError},
    schema::{CartIngredientRow, Id, ShoppingListItem},
};

/// Collects every ingredient row of the user's cart recipes and merges them
/// by (name, measurement unit) — two catalog entries with the same name and
/// unit end up on one line. The query orders by (name, unit), so the
/// first-seen merge order below yields a name-sorted, deterministic list.
/// An empty cart yields an empty list.
pub async fn aggregate_shopping_list(
    user_id: Id,
    pool: &Pool<Postgres>,
) -> Result<Vec<ShoppingListItem>, Error> {
    let rows: Vec<CartIngredientRow> = sqlx::query_as(
        "
        SELECT i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM shopping_cart c
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = c.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE c.user_id = $1
        ORDER BY i.name, i.measurement_unit
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(merge_cart_rows(rows))
}

/// Pure merge step: sums amounts per (name, unit) key, preserving the order
/// in which keys first appear.
pub fn merge_cart_rows(rows: Vec<CartIngredientRow>) -> Vec<ShoppingListItem> {
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut items: Vec<ShoppingListItem> = vec![];

    for row in rows {
        let key = (row.name.clone(), row.measurement_unit.clone());
        match index.get(&key) {
            Some(&i) => items[i].amount += i64::from(row.amount),
            None => {
                index.insert(key, items.len());
                items.push(ShoppingListItem {
                    name: row.name,
                    measurement_unit: row.measurement_unit,
                    amount: i64::from(row.amount),
                });
            }
        }
    }

    items
}

/// Renders the text/plain attachment body, one aggregated ingredient per
/// line.
pub fn render_shopping_list(items: &[ShoppingListItem]) -> String {
    items
        .iter()
        .map(|item| {
            format!(
                "{} ({}) — {}",
                item.name, item.measurement_unit, item.amount
            )
        })
        .collect::<Vec<String>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, unit: &str, amount: i32) -> CartIngredientRow {
        CartIngredientRow {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    fn item(name: &str, unit: &str, amount: i64) -> ShoppingListItem {
        ShoppingListItem {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn sums_amounts_across_recipes_by_name_and_unit() {
        // Recipe A: flour 200 g, salt 5 g. Recipe B: flour 100 g.
        let items = merge_cart_rows(vec![
            row("Flour", "g", 200),
            row("Flour", "g", 100),
            row("Salt", "g", 5),
        ]);
        assert_eq!(items, vec![item("Flour", "g", 300), item("Salt", "g", 5)]);
    }

    #[test]
    fn same_name_different_unit_stays_separate() {
        let items = merge_cart_rows(vec![row("Milk", "ml", 200), row("Milk", "g", 50)]);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn empty_cart_yields_empty_list() {
        assert!(merge_cart_rows(vec![]).is_empty());
    }

    #[test]
    fn merge_is_associative_over_cart_contents() {
        let recipe_a = vec![row("Flour", "g", 200), row("Salt", "g", 5)];
        let recipe_b = vec![row("Flour", "g", 100), row("Sugar", "g", 30)];

        let mut combined = recipe_a.clone();
        combined.extend(recipe_b.clone());
        // The query delivers rows ordered by (name, unit).
        combined.sort_by(|a, b| {
            (&a.name, &a.measurement_unit).cmp(&(&b.name, &b.measurement_unit))
        });
        let merged_once = merge_cart_rows(combined);

        // Merging the per-recipe aggregates must give the same totals.
        let separately: Vec<CartIngredientRow> = merge_cart_rows(recipe_a)
            .into_iter()
            .chain(merge_cart_rows(recipe_b))
            .map(|i| CartIngredientRow {
                name: i.name,
                measurement_unit: i.measurement_unit,
                amount: i.amount as i32,
            })
            .collect();
        let mut merged_twice = merge_cart_rows(separately);
        merged_twice.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(merged_once, merged_twice);
    }

    #[test]
    fn renders_one_line_per_ingredient() {
        let text = render_shopping_list(&[item("Flour", "g", 300), item("Salt", "g", 5)]);
        assert_eq!(text, "Flour (g) — 300\nSalt (g) — 5");
    }

    #[test]
    fn renders_empty_list_as_empty_string() {
        assert_eq!(render_shopping_list(&[]), "");
    }
}
