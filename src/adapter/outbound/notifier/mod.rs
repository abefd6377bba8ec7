//! Notification adapters.
//!
//! Implements the `port::Notifier` trait for the available backends.

mod log;

pub use log::LogNotifier;

#[cfg(test)]
mod tests;
