use crate::{jwt::SessionData, schema::UserRole};

const ACTION_TABLE: &[(UserRole, &[ActionType])] = &[
    (
        UserRole::User,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnCart,
            ActionType::Subscribe,
        ],
    ),
    (
        UserRole::Admin,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnCart,
            ActionType::Subscribe,
            ActionType::ManageAllRecipes,
            ActionType::ManageUsers,
        ],
    ),
];

#[derive(Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActionType {
    CreateRecipes,

    ManageOwnRecipes,
    ManageOwnFavorites,
    ManageOwnCart,
    Subscribe,

    ManageUsers,
    ManageAllRecipes,
}

impl ActionType {
    pub fn authenticate(self, session: &SessionData) -> bool {
        let role = &session.role;

        ACTION_TABLE
            .iter()
            .find_map(|(table_role, actions)| {
                if role != table_role {
                    return None;
                }

                Some(actions.contains(&self))
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(role: UserRole) -> SessionData {
        SessionData {
            user_id: 1,
            username: String::from("cook"),
            is_admin: role == UserRole::Admin,
            role,
        }
    }

    #[test]
    fn users_cannot_manage_all_recipes() {
        assert!(!ActionType::ManageAllRecipes.authenticate(&session(UserRole::User)));
        assert!(ActionType::ManageOwnRecipes.authenticate(&session(UserRole::User)));
    }

    #[test]
    fn admins_can_manage_everything() {
        assert!(ActionType::ManageAllRecipes.authenticate(&session(UserRole::Admin)));
        assert!(ActionType::ManageUsers.authenticate(&session(UserRole::Admin)));
    }
}
