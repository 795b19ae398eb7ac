pub use super::alerts::Entity as Alerts;
pub use super::search_results::Entity as SearchResults;
pub use super::sites::Entity as Sites;
pub use super::users::Entity as Users;
