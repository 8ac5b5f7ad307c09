//! Persistent link cache

pub mod error;
pub(crate) mod schema;
pub mod store;
