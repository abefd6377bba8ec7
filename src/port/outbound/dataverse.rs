//! Dataverse native API port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A dataset listed in a dataverse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    /// Persistent identifier such as `doi:10.5072/FK2/ABCDEF`.
    pub doi: String,
}

/// Client for a Dataverse installation.
///
/// # Errors
///
/// Methods return [`Error::Unauthorized`](crate::error::Error::Unauthorized)
/// when the installation rejects the token.
#[async_trait]
pub trait DataverseApi: Send + Sync {
    /// Return the provider name for logging.
    fn name(&self) -> &'static str;

    /// Datasets contained in the dataverse `alias` on `host`.
    async fn datasets(&self, host: &str, token: &str, alias: &str) -> Result<Vec<Dataset>>;

    /// The dataset in `alias` whose persistent identifier is `doi`.
    async fn dataset_by_doi(
        &self,
        host: &str,
        token: &str,
        alias: &str,
        doi: &str,
    ) -> Result<Option<Dataset>> {
        Ok(self
            .datasets(host, token, alias)
            .await?
            .into_iter()
            .find(|d| d.doi == doi))
    }
}
