//! Core modules for lifeledger's storage, identity and audit plumbing.
//!
//! Nothing here knows about member records. Plugins build on these pieces.

pub mod audit;
pub mod broker;
pub mod config;
pub mod db;
pub mod envelope;
pub mod error;
pub mod identity;
pub mod schemas;
pub mod store;
