pub mod ingredients;
pub mod recipes;
pub mod relations;
pub mod shopping_list;
pub mod short_links;
pub mod subscriptions;
pub mod tags;
pub mod users;
