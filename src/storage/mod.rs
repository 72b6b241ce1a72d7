//! Object storage backends.

pub mod local;
pub mod memory;
pub mod object;
pub mod s3;
