use serde::{Deserialize, Serialize};

/// Identity record for a tracked account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub pgp_key: Option<String>,
    pub email: Option<String>,
    pub marketplaces: Vec<String>,
    pub products: Vec<String>,
    pub last_active: String,
    pub geo_location: String,
    pub risk_level: i32,
}

/// One entry of a simulated activity timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub date: String,
    pub action: String,
    pub location: String,
}
