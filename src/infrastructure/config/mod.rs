//! Infrastructure configuration modules.

pub mod database;
pub mod dataverse;
pub mod logging;
pub mod paths;
pub mod settings;
pub mod site;
