//! Dataverse native API client.
//!
//! Provides an implementation of the [`DataverseApi`] trait over the
//! installation's REST API, authenticated with a per-user API token.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::port::outbound::dataverse::{DataverseApi, Dataset};

/// Header carrying the user's API token.
const TOKEN_HEADER: &str = "X-Dataverse-key";

/// Dataverse REST API client.
#[derive(Debug, Clone)]
pub struct DataverseClient {
    /// HTTP client for API requests.
    client: Client,
    /// `https` unless pointed at a local test installation.
    scheme: String,
}

impl DataverseClient {
    /// Create a client with a request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            scheme: "https".into(),
        })
    }

    /// Use `scheme` instead of `https` when building URLs.
    #[must_use]
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    fn contents_url(&self, host: &str, alias: &str) -> Result<url::Url> {
        let base = url::Url::parse(&format!("{}://{}/", self.scheme, host.trim_end_matches('/')))?;
        let mut url = base.join("api/dataverses/")?;
        url.path_segments_mut()
            .map_err(|()| Error::Parse(format!("cannot build URL for host {host}")))?
            .pop_if_empty()
            .push(alias)
            .push("contents");
        Ok(url)
    }
}

#[derive(Deserialize)]
struct Response {
    data: Vec<Item>,
}

#[derive(Deserialize)]
struct Item {
    #[serde(rename = "type")]
    kind: String,
    id: serde_json::Value,
    #[serde(default)]
    protocol: Option<String>,
    #[serde(default)]
    authority: Option<String>,
    #[serde(default)]
    identifier: Option<String>,
}

impl Item {
    fn into_dataset(self) -> Option<Dataset> {
        if self.kind != "dataset" {
            return None;
        }
        let doi = format!(
            "{}:{}/{}",
            self.protocol?,
            self.authority?,
            self.identifier?
        );
        let id = match self.id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        Some(Dataset { id, doi })
    }
}

#[async_trait]
impl DataverseApi for DataverseClient {
    fn name(&self) -> &'static str {
        "dataverse"
    }

    async fn datasets(&self, host: &str, token: &str, alias: &str) -> Result<Vec<Dataset>> {
        let url = self.contents_url(host, alias)?;
        debug!(%url, "listing dataverse contents");

        let response = self
            .client
            .get(url)
            .header(TOKEN_HEADER, token)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(Error::Unauthorized(format!(
                    "Dataverse at {host} rejected the API token"
                )));
            }
            StatusCode::NOT_FOUND => return Err(Error::not_found("dataverse", alias)),
            _ => {}
        }

        let response = response
            .error_for_status()
            .map_err(|e| Error::Connection(e.to_string()))?
            .json::<Response>()
            .await?;

        Ok(response
            .data
            .into_iter()
            .filter_map(Item::into_dataset)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contents_url_escapes_alias() {
        let client = DataverseClient::new(Duration::from_secs(5)).unwrap();
        let url = client.contents_url("demo.dataverse.org", "my alias").unwrap();
        assert_eq!(
            url.as_str(),
            "https://demo.dataverse.org/api/dataverses/my%20alias/contents"
        );

        let local = client.with_scheme("http");
        assert_eq!(
            local.contents_url("localhost:8080/", "root").unwrap().as_str(),
            "http://localhost:8080/api/dataverses/root/contents"
        );
    }

    #[test]
    fn response_keeps_only_datasets() {
        let json = r#"{
            "status": "OK",
            "data": [
                {
                    "id": 42,
                    "identifier": "FK2/ABCDEF",
                    "persistentUrl": "https://doi.org/10.5072/FK2/ABCDEF",
                    "protocol": "doi",
                    "authority": "10.5072",
                    "publisher": "Demo",
                    "storageIdentifier": "file://10.5072/FK2/ABCDEF",
                    "type": "dataset"
                },
                {"type": "dataverse", "id": 7, "title": "Nested"}
            ]
        }"#;

        let response: Response = serde_json::from_str(json).unwrap();
        let datasets: Vec<Dataset> = response.data.into_iter().filter_map(Item::into_dataset).collect();
        assert_eq!(
            datasets,
            vec![Dataset {
                id: "42".into(),
                doi: "doi:10.5072/FK2/ABCDEF".into()
            }]
        );
    }

    #[test]
    fn dataset_without_identifier_is_skipped() {
        let item: Item = serde_json::from_str(r#"{"type": "dataset", "id": 1}"#).unwrap();
        assert!(item.into_dataset().is_none());
    }
}

/// Tests against a live Dataverse installation.
/// Run with: `cargo test --features integration-tests -- --ignored`
#[cfg(all(test, feature = "integration-tests"))]
mod integration_tests {
    use super::*;

    /// Reads `DATAVERSE_HOST`, `DATAVERSE_TOKEN` and `DATAVERSE_ALIAS`.
    fn live_target() -> Option<(String, String, String)> {
        let var = |name: &str| match std::env::var(name) {
            Ok(value) => Some(value),
            Err(_) => {
                eprintln!("Skipping Dataverse integration test: {name} not set");
                None
            }
        };
        Some((var("DATAVERSE_HOST")?, var("DATAVERSE_TOKEN")?, var("DATAVERSE_ALIAS")?))
    }

    #[tokio::test]
    #[ignore = "requires a Dataverse API token and network access"]
    async fn lists_datasets_of_a_live_dataverse() {
        let Some((host, token, alias)) = live_target() else {
            return;
        };
        let client = DataverseClient::new(Duration::from_secs(30)).unwrap();
        let datasets = client.datasets(&host, &token, &alias).await.unwrap();
        assert!(datasets.iter().all(|d| d.doi.contains(':')));
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn bad_token_is_unauthorized() {
        let Some((host, _, alias)) = live_target() else {
            return;
        };
        let client = DataverseClient::new(Duration::from_secs(30)).unwrap();
        let err = client.datasets(&host, "not-a-token", &alias).await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_) | Error::NotFound { .. }));
    }
}
