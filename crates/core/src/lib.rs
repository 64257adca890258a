//! Lead console domain logic.
//!
//! Everything in this crate is pure: no network, no async, no global state.
//! The HTTP client and the stateful list session live in
//! `leadconsole-client` and call into the functions here.

pub mod allocation;
pub mod error;
pub mod filter;
pub mod import;
pub mod lead;
pub mod listing;
pub mod options;
pub mod pagination;
pub mod status_update;
pub mod transfer;
pub mod types;
pub mod wire;
