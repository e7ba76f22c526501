use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;

use super::error::{FieldError, TypeError, ValidationError};
use super::schema::Id;
use crate::constants::{
    Limits, EMAIL_MAX_LENGTH, NAME_MAX_LENGTH, PASSWORD_MIN_LENGTH, USERNAME_EXTRA_CHARS,
    USERNAME_MAX_LENGTH,
};

#[derive(Clone, Debug, Deserialize)]
pub struct IngredientItem {
    pub id: Id,
    pub amount: i32,
}

/// Write payload of `POST/PUT /recipes`. `tags` and `ingredients` stay
/// optional at the parsing layer so a missing field can be reported as a
/// validation error instead of a deserialization failure.
#[derive(Clone, Debug, Deserialize)]
pub struct RecipePayload {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<Id>>,
    #[serde(default)]
    pub ingredients: Option<Vec<IngredientItem>>,
}

/// A payload that passed every rule. Relation sets are guaranteed non-empty
/// and duplicate-free.
#[derive(Clone, Debug)]
pub struct ValidRecipe {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: Option<String>,
    pub tag_ids: Vec<Id>,
    pub ingredients: Vec<IngredientItem>,
}

impl RecipePayload {
    pub fn from_value(value: Value) -> Result<Self, TypeError> {
        serde_json::from_value(value).map_err(|e| TypeError::new(&format!("{e}")))
    }

    /// Runs every rule before any write happens. `require_image` is set on
    /// create; on update an absent image keeps the stored one. Both `tags`
    /// and `ingredients` are mandatory on create and update alike.
    pub fn validate(self, limits: &Limits, require_image: bool) -> Result<ValidRecipe, ValidationError> {
        let mut errors: Vec<FieldError> = vec![];

        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "Name must not be empty"));
        } else if self.name.chars().count() > limits.recipe_name_max {
            errors.push(FieldError::new(
                "name",
                format!("Name must be at most {} characters", limits.recipe_name_max),
            ));
        }

        if self.text.trim().is_empty() {
            errors.push(FieldError::new("text", "Description must not be empty"));
        }

        if self.cooking_time < limits.cooking_time_min || self.cooking_time > limits.cooking_time_max
        {
            errors.push(FieldError::new(
                "cooking_time",
                format!(
                    "Cooking time must be between {} and {} minutes",
                    limits.cooking_time_min, limits.cooking_time_max
                ),
            ));
        }

        if require_image && self.image.as_deref().map_or(true, |i| i.is_empty()) {
            errors.push(FieldError::new("image", "An image is required"));
        }

        match &self.tags {
            None => errors.push(FieldError::new("tags", "The tags field is required")),
            Some(tags) if tags.is_empty() => {
                errors.push(FieldError::new("tags", "Specify at least one tag"));
            }
            Some(tags) => {
                let unique: HashSet<Id> = tags.iter().copied().collect();
                if unique.len() != tags.len() {
                    errors.push(FieldError::new("tags", "Tags must not repeat"));
                }
            }
        }

        match &self.ingredients {
            None => errors.push(FieldError::new(
                "ingredients",
                "The ingredients field is required",
            )),
            Some(items) if items.is_empty() => {
                errors.push(FieldError::new(
                    "ingredients",
                    "Specify at least one ingredient",
                ));
            }
            Some(items) => {
                let mut seen: HashSet<Id> = HashSet::new();
                if items.iter().any(|item| !seen.insert(item.id)) {
                    errors.push(FieldError::new(
                        "ingredients",
                        "Ingredients must not repeat",
                    ));
                }
                if items
                    .iter()
                    .any(|item| item.amount < limits.amount_min || item.amount > limits.amount_max)
                {
                    errors.push(FieldError::new(
                        "ingredients",
                        format!(
                            "Ingredient amount must be between {} and {}",
                            limits.amount_min, limits.amount_max
                        ),
                    ));
                }
            }
        }

        if !errors.is_empty() {
            return Err(ValidationError::new(errors));
        }

        Ok(ValidRecipe {
            name: self.name,
            text: self.text,
            cooking_time: self.cooking_time,
            image: self.image,
            tag_ids: self.tags.unwrap_or_default(),
            ingredients: self.ingredients.unwrap_or_default(),
        })
    }
}

/// Registration payload of the user collaborator surface.
#[derive(Clone, Debug, Deserialize)]
pub struct RegisterPayload {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

fn valid_username(username: &str) -> bool {
    !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_alphanumeric() || USERNAME_EXTRA_CHARS.contains(c))
}

impl RegisterPayload {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors: Vec<FieldError> = vec![];

        if self.email.is_empty() || !self.email.contains('@') {
            errors.push(FieldError::new("email", "Enter a valid email address"));
        } else if self.email.chars().count() > EMAIL_MAX_LENGTH {
            errors.push(FieldError::new(
                "email",
                format!("Email must be at most {EMAIL_MAX_LENGTH} characters"),
            ));
        }

        if !valid_username(&self.username) {
            errors.push(FieldError::new(
                "username",
                "Username may contain only letters, digits and @/./+/-/_",
            ));
        } else if self.username.chars().count() > USERNAME_MAX_LENGTH {
            errors.push(FieldError::new(
                "username",
                format!("Username must be at most {USERNAME_MAX_LENGTH} characters"),
            ));
        }

        for (field, value) in [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
        ] {
            if value.trim().is_empty() {
                errors.push(FieldError::new(field, "This field must not be empty"));
            } else if value.chars().count() > NAME_MAX_LENGTH {
                errors.push(FieldError::new(
                    field,
                    format!("Must be at most {NAME_MAX_LENGTH} characters"),
                ));
            }
        }

        if self.password.chars().count() < PASSWORD_MIN_LENGTH {
            errors.push(FieldError::new(
                "password",
                format!("Password must be at least {PASSWORD_MIN_LENGTH} characters"),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> RecipePayload {
        RecipePayload::from_value(json!({
            "name": "Pancakes",
            "text": "Mix and fry.",
            "cooking_time": 20,
            "image": "recipes/images/pancakes.png",
            "tags": [1, 2],
            "ingredients": [
                {"id": 10, "amount": 200},
                {"id": 11, "amount": 2},
            ],
        }))
        .unwrap()
    }

    #[test]
    fn valid_payload_passes_and_keeps_the_sets() {
        let valid = payload().validate(&Limits::default(), true).unwrap();
        assert_eq!(valid.tag_ids, vec![1, 2]);
        assert_eq!(valid.ingredients.len(), 2);
        assert_eq!(valid.ingredients[0].amount, 200);
    }

    #[test]
    fn cooking_time_below_minimum_is_rejected() {
        let mut p = payload();
        p.cooking_time = 0;
        let error = p.validate(&Limits::default(), true).unwrap_err();
        assert!(error.has_field("cooking_time"));
    }

    #[test]
    fn duplicate_ingredient_ids_are_rejected() {
        let mut p = payload();
        p.ingredients = Some(vec![
            IngredientItem { id: 10, amount: 100 },
            IngredientItem { id: 10, amount: 50 },
        ]);
        let error = p.validate(&Limits::default(), true).unwrap_err();
        assert!(error.has_field("ingredients"));
    }

    #[test]
    fn duplicate_tags_are_rejected() {
        let mut p = payload();
        p.tags = Some(vec![3, 3]);
        let error = p.validate(&Limits::default(), true).unwrap_err();
        assert!(error.has_field("tags"));
    }

    #[test]
    fn update_without_relation_fields_is_rejected() {
        let mut p = payload();
        p.tags = None;
        p.ingredients = None;
        let error = p.validate(&Limits::default(), false).unwrap_err();
        assert!(error.has_field("tags"));
        assert!(error.has_field("ingredients"));
    }

    #[test]
    fn missing_image_fails_only_on_create() {
        let mut p = payload();
        p.image = None;
        assert!(p.clone().validate(&Limits::default(), false).is_ok());
        let error = p.validate(&Limits::default(), true).unwrap_err();
        assert!(error.has_field("image"));
    }

    #[test]
    fn every_violated_field_is_reported() {
        let p = RecipePayload::from_value(json!({
            "name": "",
            "text": "",
            "cooking_time": 0,
        }))
        .unwrap();
        let error = p.validate(&Limits::default(), true).unwrap_err();
        for field in ["name", "text", "cooking_time", "image", "tags", "ingredients"] {
            assert!(error.has_field(field), "missing error for {field}");
        }
    }

    #[test]
    fn amount_out_of_bounds_is_rejected() {
        let mut p = payload();
        p.ingredients = Some(vec![IngredientItem { id: 10, amount: 0 }]);
        let error = p.validate(&Limits::default(), true).unwrap_err();
        assert!(error.has_field("ingredients"));
    }

    #[test]
    fn register_payload_checks_username_pattern() {
        let p = RegisterPayload {
            email: String::from("cook@example.com"),
            username: String::from("bad name!"),
            first_name: String::from("A"),
            last_name: String::from("B"),
            password: String::from("longenough"),
        };
        let error = p.validate().unwrap_err();
        assert!(error.has_field("username"));
    }
}
