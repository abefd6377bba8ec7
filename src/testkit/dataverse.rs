//! Scripted [`DataverseApi`] implementation.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::port::outbound::dataverse::{DataverseApi, Dataset};

/// Returns a fixed dataset listing and counts calls.
///
/// With [`rejecting`](Self::rejecting) every call fails as unauthorized.
#[derive(Default)]
pub struct ScriptedDataverse {
    datasets: Mutex<Vec<Dataset>>,
    reject: bool,
    calls: Arc<AtomicU32>,
}

impl ScriptedDataverse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(self, id: &str, doi: &str) -> Self {
        self.datasets.lock().push(Dataset {
            id: id.to_string(),
            doi: doi.to_string(),
        });
        self
    }

    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    /// Shared counter of `datasets` calls.
    pub fn calls(&self) -> Arc<AtomicU32> {
        self.calls.clone()
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataverseApi for ScriptedDataverse {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn datasets(&self, host: &str, _token: &str, _alias: &str) -> Result<Vec<Dataset>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.reject {
            return Err(Error::Unauthorized(format!(
                "Dataverse at {host} rejected the API token"
            )));
        }
        Ok(self.datasets.lock().clone())
    }
}
