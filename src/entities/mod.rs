pub mod prelude;

pub mod alerts;
pub mod search_results;
pub mod sites;
pub mod users;
