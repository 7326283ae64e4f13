//! # Providers
//!
//! Clients for the remote services this crate talks to.

pub mod store;
