pub mod alert;
pub mod search_result;
pub mod site;
pub mod user;
