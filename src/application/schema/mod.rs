//! Registration and file-metadata schema services.

mod service;

pub use service::{ImportedSchema, SchemaDocument, SchemaService};
