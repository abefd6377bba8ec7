//! Storage-addon services.

mod dataverse;

pub use dataverse::DataverseService;
