//! Storage addons: OAuth-style external accounts and per-provider settings.

pub mod dataverse;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::AccountId;

/// Credentials a user connected for a storage provider.
///
/// Dataverse keeps the installation host in `oauth_key` and `display_name`,
/// and the API token in both `provider_id` and `oauth_secret`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalAccount {
    pub id: AccountId,
    pub provider: String,
    #[serde(skip_serializing)]
    pub provider_id: String,
    pub display_name: Option<String>,
    pub oauth_key: String,
    #[serde(skip_serializing)]
    pub oauth_secret: String,
    pub created: DateTime<Utc>,
}

impl ExternalAccount {
    pub fn new(
        provider: impl Into<String>,
        provider_id: impl Into<String>,
        oauth_key: impl Into<String>,
        oauth_secret: impl Into<String>,
    ) -> Self {
        Self {
            id: AccountId::generate(),
            provider: provider.into(),
            provider_id: provider_id.into(),
            display_name: None,
            oauth_key: oauth_key.into(),
            oauth_secret: oauth_secret.into(),
            created: Utc::now(),
        }
    }
}
