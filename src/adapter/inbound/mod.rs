//! Inbound adapters (driving side): entry points that call into the
//! application services.

pub mod cli;
