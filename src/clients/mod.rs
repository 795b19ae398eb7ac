pub mod fetcher;

pub use fetcher::{FetchedPage, PageFetcher, ProxiedClient};
