use std::collections::HashMap;

use anyhow::Result;
use chrono::{Duration, Utc};
use serde::Serialize;

use crate::constants::risk::HIGH_RISK_FLOOR;
use crate::db::Store;

/// Aggregate breakdown of stored site records.
#[derive(Debug, Default, Serialize)]
pub struct SiteReport {
    pub by_kind: Vec<(String, i64)>,
    pub by_risk_level: Vec<(i32, i64)>,
    /// First-seen counts per day over the last 30 days.
    pub recent_first_seen: Vec<(String, i64)>,
}

#[derive(Debug, Default, Serialize)]
pub struct UserReport {
    /// Active-user counts for the most recent 6 months.
    pub active_by_month: Vec<(String, i64)>,
    pub by_risk_level: Vec<(i32, i64)>,
    /// Marketplace name -> tracked users seen there, most popular first.
    pub marketplace_distribution: Vec<(String, i64)>,
}

#[derive(Debug, Default, Serialize)]
pub struct AlertReport {
    pub by_severity: Vec<(i32, i64)>,
    pub by_kind: Vec<(String, i64)>,
    /// Alert counts per day over the last 7 days.
    pub recent: Vec<(String, i64)>,
}

#[derive(Debug, Default, Serialize)]
pub struct Summary {
    pub total_sites: u64,
    pub total_users: u64,
    pub total_alerts: i64,
    pub high_risk_sites: i64,
    pub high_risk_users: i64,
    pub high_severity_alerts: i64,
    pub most_common_site_kind: Option<String>,
    pub most_active_marketplace: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IntelReport {
    pub generated_at: String,
    pub sites: SiteReport,
    pub users: UserReport,
    pub alerts: AlertReport,
    pub summary: Summary,
}

/// Read-only aggregation over everything the other services collected.
pub struct AnalyticsService {
    store: Store,
}

impl AnalyticsService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn site_report(&self) -> Result<SiteReport> {
        let since = (Utc::now() - Duration::days(30)).format("%Y-%m-%d").to_string();

        Ok(SiteReport {
            by_kind: self.store.site_kind_counts().await?,
            by_risk_level: self.store.site_risk_counts().await?,
            recent_first_seen: self.store.sites_first_seen_per_day(&since).await?,
        })
    }

    pub async fn user_report(&self) -> Result<UserReport> {
        let mut distribution: HashMap<String, i64> = HashMap::new();

        // Undecodable marketplace lists are skipped, not fatal.
        for column in self.store.user_marketplace_columns().await? {
            let Some(raw) = column else { continue };
            let Ok(marketplaces) = serde_json::from_str::<Vec<String>>(&raw) else {
                continue;
            };
            for marketplace in marketplaces {
                *distribution.entry(marketplace).or_insert(0) += 1;
            }
        }

        let mut marketplace_distribution: Vec<(String, i64)> = distribution.into_iter().collect();
        marketplace_distribution.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Ok(UserReport {
            active_by_month: self.store.users_active_per_month(6).await?,
            by_risk_level: self.store.user_risk_counts().await?,
            marketplace_distribution,
        })
    }

    pub async fn alert_report(&self) -> Result<AlertReport> {
        let since = (Utc::now() - Duration::days(7)).format("%Y-%m-%d").to_string();

        Ok(AlertReport {
            by_severity: self.store.alert_severity_counts().await?,
            by_kind: self.store.alert_kind_counts().await?,
            recent: self.store.alerts_created_per_day(&since).await?,
        })
    }

    /// Full report with a summary block over all three breakdowns.
    pub async fn report(&self) -> Result<IntelReport> {
        let sites = self.site_report().await?;
        let users = self.user_report().await?;
        let alerts = self.alert_report().await?;

        let summary = Summary {
            total_sites: self.store.site_count().await?,
            total_users: self.store.user_count().await?,
            total_alerts: alerts.by_severity.iter().map(|(_, n)| n).sum(),
            high_risk_sites: high_band(&sites.by_risk_level),
            high_risk_users: high_band(&users.by_risk_level),
            high_severity_alerts: high_band(&alerts.by_severity),
            most_common_site_kind: top_entry(&sites.by_kind),
            most_active_marketplace: users
                .marketplace_distribution
                .first()
                .map(|(name, _)| name.clone()),
        };

        Ok(IntelReport {
            generated_at: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            sites,
            users,
            alerts,
            summary,
        })
    }
}

/// Sum of counts in the high band (level >= 8) of a grouped breakdown.
fn high_band(rows: &[(i32, i64)]) -> i64 {
    rows.iter()
        .filter(|(level, _)| *level >= HIGH_RISK_FLOOR)
        .map(|(_, count)| count)
        .sum()
}

fn top_entry(rows: &[(String, i64)]) -> Option<String> {
    rows.iter()
        .max_by_key(|(_, count)| *count)
        .map(|(name, _)| name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_high_band_sums_levels_eight_and_up() {
        let rows = vec![(3, 10), (8, 2), (9, 1), (10, 4)];
        assert_eq!(high_band(&rows), 7);
    }

    #[test]
    fn test_top_entry_picks_largest_count() {
        let rows = vec![
            ("forum".to_string(), 2),
            ("marketplace".to_string(), 5),
            ("blog".to_string(), 1),
        ];
        assert_eq!(top_entry(&rows), Some("marketplace".to_string()));
        assert_eq!(top_entry(&[]), None);
    }
}
