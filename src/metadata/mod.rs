//! Metadata store backends.

pub mod dynamodb;
pub mod memory;
pub mod store;
