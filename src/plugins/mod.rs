//! Member record lifecycle built on the core ledger.

pub mod fields;
pub mod index;
pub mod lifecycle;
pub mod member;
pub mod operations;
pub mod repository;
