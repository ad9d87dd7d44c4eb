pub mod cache;
pub mod common;
