pub mod alert;
pub mod result;
pub mod site;
pub mod user;

pub use alert::Alert;
pub use result::SearchHit;
pub use site::{CrawledPage, SiteKind};
pub use user::{ActivityEntry, UserProfile};
