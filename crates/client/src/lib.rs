//! Lead console client library.
//!
//! Talks to the lead backend over HTTP and holds the per-session state of
//! the lead list (filters, visible page, loading flag) plus the allocation,
//! transfer, import and status-update actions. Domain rules live in
//! `leadconsole_core`; this crate adds I/O, session state and error
//! translation for the UI.

pub mod allocation;
pub mod auth;
pub mod backend;
pub mod config;
pub mod console;
pub mod coordinator;
pub mod error;
pub mod guard;
pub mod http;
pub mod import;
pub mod models;
pub mod options;
pub mod status;
pub mod transfer;

#[cfg(test)]
pub(crate) mod testing;
