//! Unified type mapping between Rust values and PostgreSQL routine arguments
//! This crate provides the parameter value type used when binding stored routine calls

pub mod serialize;
pub mod sql;
pub mod types;

pub use serialize::value_from_json;
pub use sql::placeholder;
pub use types::{Parameters, PostgresValue};
