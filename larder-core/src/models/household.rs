use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A household that users and shopping lists belong to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Household {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Profile record for an authenticated user. Fetched once per session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub household_id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}
