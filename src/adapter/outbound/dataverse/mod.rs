//! Dataverse native API adapter.

mod client;

pub use client::DataverseClient;
