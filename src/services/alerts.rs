use tracing::{error, warn};

use crate::analysis::patterns::contains_sensitive_pattern;
use crate::config::AlertConfig;
use crate::db::Store;
use crate::entities::alerts;
use crate::models::{Alert, SearchHit};

/// Rule-based alert engine. Evaluates keywords and collected results
/// against the configured risk rules and records alerts through the store.
///
/// Storage failures never escape: writes report a boolean, reads degrade to
/// an empty list.
#[derive(Clone)]
pub struct AlertService {
    store: Store,
    config: AlertConfig,
}

impl AlertService {
    #[must_use]
    pub const fn new(store: Store, config: AlertConfig) -> Self {
        Self { store, config }
    }

    /// Runs both alert rules for one searched keyword and its results.
    ///
    /// The two checks are independent: a call can emit zero, one, or many
    /// alerts. The keyword rule fires at most once per call; the content
    /// rule fires once per offending result.
    pub async fn check_keyword_alerts(&self, keyword: &str, results: &[SearchHit]) {
        let keyword_lower = keyword.to_lowercase();

        if self
            .config
            .high_risk_keywords
            .iter()
            .any(|risk_word| keyword_lower.contains(&risk_word.to_lowercase()))
        {
            let content = format!("Keyword '{keyword}' found in {} results", results.len());
            self.create_alert(
                "High-risk keyword detected",
                &content,
                self.config.severity_for("high"),
            )
            .await;
        }

        for result in results {
            if contains_sensitive_pattern(&result.snippet) {
                let content = format!("Suspicious pattern found in result: {}", result.result_url);
                self.create_alert(
                    "Suspicious content detected",
                    &content,
                    self.config.severity_for("medium"),
                )
                .await;
            }
        }
    }

    /// Inserts an alert with status "new". Returns whether the write stuck.
    pub async fn create_alert(&self, kind: &str, content: &str, severity: i32) -> bool {
        match self.store.insert_alert(kind, content, severity).await {
            Ok(()) => {
                warn!("ALERT: {kind} | Severity: {severity}/10 | {content}");
                true
            }
            Err(e) => {
                error!("Failed to create alert: {e}");
                false
            }
        }
    }

    /// Alerts at or above `min_severity`, optionally filtered by status,
    /// most urgent first, capped at `limit`.
    pub async fn get_alerts(
        &self,
        status: Option<&str>,
        min_severity: i32,
        limit: u64,
    ) -> Vec<Alert> {
        match self.store.query_alerts(status, min_severity, limit).await {
            Ok(rows) => rows.into_iter().map(to_alert).collect(),
            Err(e) => {
                error!("Failed to retrieve alerts: {e}");
                Vec::new()
            }
        }
    }

    /// Sets one alert's status. The target value is taken as-is and updates
    /// matching zero rows still count as success.
    pub async fn update_alert_status(&self, id: i64, status: &str) -> bool {
        match self.store.update_alert_status(id, status).await {
            Ok(_) => true,
            Err(e) => {
                error!("Failed to update alert {id}: {e}");
                false
            }
        }
    }

    pub async fn bulk_update_alerts(&self, ids: &[i64], status: &str) -> bool {
        match self.store.bulk_update_alert_status(ids, status).await {
            Ok(updated) => {
                warn!("Bulk updated {updated} alert(s) to '{status}'");
                true
            }
            Err(e) => {
                error!("Failed to bulk update alerts: {e}");
                false
            }
        }
    }
}

fn to_alert(model: alerts::Model) -> Alert {
    Alert {
        id: model.id,
        kind: model.kind,
        content: model.content,
        severity: model.severity,
        created_at: model.created_at,
        status: model.status,
    }
}
