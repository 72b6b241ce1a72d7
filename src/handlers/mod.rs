//! HTTP request handlers.

pub mod photos;
