pub mod alerts;
pub mod analytics;
pub mod crawler;
pub mod search;
pub mod users;

pub use alerts::AlertService;
pub use analytics::AnalyticsService;
pub use crawler::CrawlerService;
pub use search::SearchService;
pub use users::{TrackError, UserTracker};
