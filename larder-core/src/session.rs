//! Session context: the authenticated user and their household.
//!
//! Leaf dependency for the hooks; fetched once and passed by reference.

use crate::api::DataApi;
use crate::error::ApiResult;
use crate::models::{Household, UserProfile};

/// Loaded session state.
#[derive(Debug, Clone)]
pub struct Session {
    user: UserProfile,
    household: Household,
}

impl Session {
    /// Fetch the current user's profile and household membership.
    pub async fn load(api: &dyn DataApi) -> ApiResult<Self> {
        let user = api.profile().await?;
        let household = api.household(&user.household_id).await?;
        Ok(Self { user, household })
    }

    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    pub fn household(&self) -> &Household {
        &self.household
    }

    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    pub fn household_id(&self) -> &str {
        &self.household.id
    }
}
