use chrono::Utc;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{error, info};

use crate::analysis::patterns::jaccard_similarity;
use crate::db::Store;
use crate::models::{ActivityEntry, UserProfile};

/// Errors specific to user tracking.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error("Storage rejected user record: {0}")]
    Storage(String),
}

/// Records user identities and links accounts by username similarity.
pub struct UserTracker {
    store: Store,
}

impl UserTracker {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Persists an identity record for `username`, synthesizing any missing
    /// fields with clearly simulated placeholders.
    pub async fn track_user(
        &self,
        username: &str,
        pgp_key: Option<&str>,
        email: Option<&str>,
    ) -> Result<UserProfile, TrackError> {
        info!("Tracking user: {username}");

        let profile = simulated_profile(username, pgp_key, email);

        match self.store.store_user(&profile).await {
            Ok(()) => {
                info!("User {username} tracked and stored");
                Ok(profile)
            }
            Err(e) => {
                error!("Failed to track user {username}: {e}");
                Err(TrackError::Storage(e.to_string()))
            }
        }
    }

    /// Usernames whose character-set Jaccard similarity to `username` meets
    /// `threshold`. Comparison is case-insensitive; the queried name itself
    /// is excluded. Storage failure degrades to an empty list.
    pub async fn find_similar_users(&self, username: &str, threshold: f64) -> Vec<String> {
        let all_users = match self.store.all_usernames().await {
            Ok(users) => users,
            Err(e) => {
                error!("Failed to load usernames: {e}");
                return Vec::new();
            }
        };

        all_users
            .into_iter()
            .filter(|candidate| !candidate.eq_ignore_ascii_case(username))
            .filter(|candidate| jaccard_similarity(username, candidate) >= threshold)
            .collect()
    }

    /// Simulated activity timeline over the past `days` days.
    ///
    /// Deterministic per (username, day offset); a stand-in for observed
    /// telemetry, not real data.
    #[must_use]
    pub fn user_activity(username: &str, days: u32) -> Vec<ActivityEntry> {
        let now = Utc::now();
        let mut activity = Vec::new();

        for offset in 0..days {
            if activity_hash(username, offset) % 5 != 0 {
                continue;
            }

            let date = (now - chrono::Duration::days(i64::from(offset)))
                .format("%Y-%m-%d")
                .to_string();

            let (action, location) = if offset % 2 == 0 {
                ("Posted listing", "Example Market")
            } else {
                ("Commented on forum", "Dark Forum")
            };

            activity.push(ActivityEntry {
                date,
                action: action.to_string(),
                location: location.to_string(),
            });
        }

        activity
    }
}

fn simulated_profile(username: &str, pgp_key: Option<&str>, email: Option<&str>) -> UserProfile {
    UserProfile {
        username: username.to_string(),
        pgp_key: Some(
            pgp_key.map_or_else(|| format!("simulated-pgp-key-{username}"), str::to_string),
        ),
        email: Some(email.map_or_else(|| format!("{username}@example.mail"), str::to_string)),
        marketplaces: vec!["Example Market".to_string(), "Dark Marketplace".to_string()],
        products: vec!["Product A".to_string(), "Product B".to_string()],
        last_active: Utc::now().format("%Y-%m-%d").to_string(),
        geo_location: "Unknown".to_string(),
        risk_level: 7,
    }
}

fn activity_hash(username: &str, offset: u32) -> u64 {
    let digest = Sha256::digest(format!("{username}{offset}").as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}
