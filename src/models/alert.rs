use serde::{Deserialize, Serialize};

/// A raised alert as read back from storage.
///
/// `status` is free-form: "new" on insert, anything an operator sets later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    pub kind: String,
    pub content: String,
    pub severity: i32,
    pub created_at: String,
    pub status: String,
}
